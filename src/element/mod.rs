use egui::Rect;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::Value;

mod bezier;
pub(crate) mod common;
mod line;

pub use bezier::{BezierRecord, StrokeSegment};
pub use common::{MIN_STROKE_WIDTH, StrokeStyle};
pub use line::{LineRecord, LineSegment};

use crate::error::DecodeError;
use crate::geometry::NormalizationRatio;
use crate::render::Canvas;

/// Capability shared by every object that can live in a drawing
pub trait Drawable: Sized {
    /// Serialized, reference-frame form of the object
    type Record: Serialize + DeserializeOwned;

    /// Value of the `type` key in serialized documents
    const TYPE_TAG: &'static str;

    /// Smallest rectangle enclosing everything the object paints
    fn bounding_rect(&self) -> Rect;

    /// Paint the object; `with_scaling` applies the object's own output scale factor
    fn draw(&self, canvas: &mut Canvas, with_scaling: bool);

    /// Convert to the reference frame (view coordinates divided by `ratio`)
    fn to_record(&self, ratio: NormalizationRatio) -> Self::Record;

    /// Rebuild from the reference frame (multiplied back by `ratio`)
    fn from_record(record: Self::Record, ratio: NormalizationRatio) -> Result<Self, DecodeError>;
}

/// Enumeration of all object types a batch can hold
#[derive(Debug, Clone, PartialEq)]
pub enum DrawableObject {
    Bezier(StrokeSegment),
    Line(LineSegment),
}

impl From<StrokeSegment> for DrawableObject {
    fn from(segment: StrokeSegment) -> Self {
        Self::Bezier(segment)
    }
}

impl From<LineSegment> for DrawableObject {
    fn from(line: LineSegment) -> Self {
        Self::Line(line)
    }
}

impl DrawableObject {
    pub fn type_tag(&self) -> &'static str {
        match self {
            Self::Bezier(_) => StrokeSegment::TYPE_TAG,
            Self::Line(_) => LineSegment::TYPE_TAG,
        }
    }

    pub fn bounding_rect(&self) -> Rect {
        match self {
            Self::Bezier(s) => s.bounding_rect(),
            Self::Line(l) => l.bounding_rect(),
        }
    }

    pub fn draw(&self, canvas: &mut Canvas, with_scaling: bool) {
        match self {
            Self::Bezier(s) => s.draw(canvas, with_scaling),
            Self::Line(l) => l.draw(canvas, with_scaling),
        }
    }

    /// Serialize to a dictionary carrying a `type` tag plus the object's fields
    pub fn serialize(&self, ratio: NormalizationRatio) -> Value {
        match self {
            Self::Bezier(s) => tagged(StrokeSegment::TYPE_TAG, &s.to_record(ratio)),
            Self::Line(l) => tagged(LineSegment::TYPE_TAG, &l.to_record(ratio)),
        }
    }

    /// Decode one dictionary; nothing is built unless every required field is valid
    pub fn deserialize(value: &Value, ratio: NormalizationRatio) -> Result<Self, DecodeError> {
        let tag = value
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DecodeError::InvalidValue {
                field: "type",
                reason: "missing or not a string".to_owned(),
            })?;

        match tag {
            StrokeSegment::TYPE_TAG => decode::<StrokeSegment>(value, ratio).map(Self::Bezier),
            LineSegment::TYPE_TAG => decode::<LineSegment>(value, ratio).map(Self::Line),
            other => Err(DecodeError::UnknownType(other.to_owned())),
        }
    }
}

fn tagged<R: Serialize>(tag: &str, record: &R) -> Value {
    let mut value = serde_json::to_value(record).unwrap_or(Value::Null);
    if let Value::Object(map) = &mut value {
        map.insert("type".to_owned(), Value::String(tag.to_owned()));
    }
    value
}

fn decode<D: Drawable>(value: &Value, ratio: NormalizationRatio) -> Result<D, DecodeError> {
    let record = D::Record::deserialize(value)?;
    D::from_record(record, ratio)
}
