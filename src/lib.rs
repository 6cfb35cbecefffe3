#![warn(clippy::all, rust_2018_idioms)]

pub mod config;
pub mod controller;
pub mod element;
pub mod error;
pub mod event;
pub mod geometry;
pub mod label;
pub mod persistence;
pub mod render;
pub mod stroke;
pub mod surface;

pub use config::{DrawingConfig, MarkupConfig, SmoothingConfig, TextConfig};
pub use controller::{MarkupController, MarkupMode};
pub use element::{Drawable, DrawableObject, LineSegment, StrokeSegment, StrokeStyle};
pub use error::{ConfigError, DecodeError, DocumentError, RenderError, StrokeError};
pub use event::{DrawingEvent, EventBus, EventHandler, LabelEvent, MarkupEvent};
pub use geometry::{ImageFrame, NormalizationRatio, REFERENCE_SIZE, compute_ratio};
pub use label::{LabelOverlay, TextAlignment, TextLabel};
pub use persistence::{DocumentSummary, LoadSummary};
pub use render::{Canvas, FontBook};
pub use stroke::{ClosedStroke, StrokeSmoother};
pub use surface::{Batch, DiscreteGrid, DrawingSurface, PointSnapper};
