use thiserror::Error;

/// Errors raised by the stroke smoothing engine when touch calls arrive out of order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StrokeError {
    /// A move or end arrived without a preceding begin
    #[error("no stroke in progress")]
    NotStarted,
    /// A begin arrived while another stroke was still active
    #[error("a stroke is already in progress")]
    AlreadyStarted,
}

/// Errors that can occur while decoding a single serialized entry.
///
/// These never abort a whole document: the offending entry is skipped.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("malformed entry: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("unknown object type `{0}`")]
    UnknownType(String),

    #[error("invalid value for `{field}`: {reason}")]
    InvalidValue {
        field: &'static str,
        reason: String,
    },
}

/// Errors that reject a serialized document as a whole
#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to parse document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document root must be an object")]
    NotAnObject,
}

/// Errors that can occur while rasterizing
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("cannot allocate a {width}x{height} render target")]
    AllocationFailed { width: u32, height: u32 },

    #[error("rendered pixels do not fit a {width}x{height} image buffer")]
    ImageBuffer { width: u32, height: u32 },
}

/// Errors that can occur while loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type RenderResult<T> = Result<T, RenderError>;
