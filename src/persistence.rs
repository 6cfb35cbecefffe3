//! Layout of the serialized markup document.
//!
//! The wire keys are fixed for compatibility with existing documents; every
//! entry below the root is decoded on its own so one bad entry never rejects
//! the whole document.

use serde::Serialize;
use serde_json::Value;

use crate::error::DocumentError;

/// Version written into new documents
pub const DOCUMENT_VERSION: u32 = 1;

pub mod keys {
    pub const VERSION: &str = "version";
    pub const DRAW_VIEW: &str = "drawView";
    pub const LABELS: &str = "labels";
    pub const DATE: &str = "date";

    pub const OBJECTS: &str = "objects";
    pub const UNDO_ARRAY: &str = "undoArray";
    pub const BATCH_SIZES: &str = "batchSizes";
}

/// How many entries of one section were decoded and how many were skipped
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

impl LoadSummary {
    pub(crate) fn record<T, E: std::fmt::Display>(
        &mut self,
        what: &str,
        index: usize,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => {
                self.loaded += 1;
                Some(value)
            }
            Err(err) => {
                log::warn!("skipping {what} #{index}: {err}");
                self.skipped += 1;
                None
            }
        }
    }
}

/// Result of loading a whole document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentSummary {
    pub drawing: LoadSummary,
    pub labels: LoadSummary,
}

/// `drawView` section as written
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DrawViewRecord {
    /// Every committed object, oldest first
    pub objects: Vec<Value>,
    /// Undone batches, the next one to redo last
    pub undo_array: Vec<Value>,
    /// Number of objects in each committed batch
    pub batch_sizes: Vec<usize>,
}

impl DrawViewRecord {
    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Document root as written
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub version: u32,
    pub draw_view: Value,
    pub labels: Vec<Value>,
    /// Seconds since the UNIX epoch; informational only
    pub date: f64,
}

impl DocumentRecord {
    pub fn new(draw_view: Value, labels: Vec<Value>) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            draw_view,
            labels,
            date: now_secs(),
        }
    }

    pub fn into_value(self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn now_secs() -> f64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}

/// Borrowed view of a document root as read.
///
/// Missing sections read as empty; sections of the wrong shape are ignored
/// with a warning.
#[derive(Debug, Clone, Copy)]
pub struct DocumentView<'a> {
    pub version: Option<u64>,
    pub draw_view: Option<&'a Value>,
    pub labels: &'a [Value],
}

impl<'a> DocumentView<'a> {
    pub fn parse(root: &'a Value) -> Result<Self, DocumentError> {
        let map = root.as_object().ok_or(DocumentError::NotAnObject)?;

        let version = map.get(keys::VERSION).and_then(Value::as_u64);
        if let Some(version) = version {
            if version > u64::from(DOCUMENT_VERSION) {
                log::warn!("document version {version} is newer than {DOCUMENT_VERSION}");
            }
        }

        let draw_view = map.get(keys::DRAW_VIEW).filter(|v| {
            let ok = v.is_object();
            if !ok {
                log::warn!("ignoring `{}` section that is not an object", keys::DRAW_VIEW);
            }
            ok
        });

        let labels = match map.get(keys::LABELS) {
            Some(Value::Array(labels)) => labels.as_slice(),
            Some(_) => {
                log::warn!("ignoring `{}` section that is not a list", keys::LABELS);
                &[]
            }
            None => &[],
        };

        Ok(Self {
            version,
            draw_view,
            labels,
        })
    }
}

/// Parse document text into its JSON tree
pub fn parse_str(json: &str) -> Result<Value, DocumentError> {
    Ok(serde_json::from_str(json)?)
}
