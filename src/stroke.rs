//! Turns a raw touch stream into smoothed cubic bezier segments.
//!
//! The smoother keeps the last four accepted points. Every accepted point
//! after the third emits the segment between the middle two points of the
//! window, with Catmull-Rom style control points, so consecutive segments
//! share their endpoints. Moves closer than the configured minimum distance
//! to the previous accepted point are dropped.
//!
//! No window has the first point in its middle, so the span from the first to
//! the second point is only known once the stroke is closed. It comes back as
//! the head of a [`ClosedStroke`] and goes in front of the moving segments.

use egui::Pos2;
use log::{debug, trace};

use crate::config::SmoothingConfig;
use crate::element::{StrokeSegment, StrokeStyle};
use crate::error::StrokeError;
use crate::geometry::is_finite_point;

const WINDOW: usize = 4;

/// Segments produced when a stroke is closed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ClosedStroke {
    /// Span from the first to the second point, placed before every other segment
    pub head: Option<StrokeSegment>,
    /// Segments following those emitted while moving
    pub tail: Vec<StrokeSegment>,
}

impl ClosedStroke {
    pub fn len(&self) -> usize {
        self.head.iter().count() + self.tail.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone)]
pub struct StrokeSmoother {
    config: SmoothingConfig,
    style: StrokeStyle,
    window: Vec<Pos2>,
    /// The first three accepted points
    leading: Vec<Pos2>,
    accepted: usize,
    last_velocity: f32,
    last_width: f32,
}

impl StrokeSmoother {
    pub fn new(config: SmoothingConfig) -> Self {
        Self {
            config,
            style: StrokeStyle::default(),
            window: Vec::with_capacity(WINDOW + 1),
            leading: Vec::with_capacity(WINDOW - 1),
            accepted: 0,
            last_velocity: 0.0,
            last_width: 0.0,
        }
    }

    pub fn config(&self) -> &SmoothingConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: SmoothingConfig) {
        self.config = config;
    }

    pub fn is_active(&self) -> bool {
        !self.leading.is_empty()
    }

    /// Points accepted since the stroke began, including the first one
    pub fn accepted_points(&self) -> usize {
        self.accepted
    }

    pub fn begin(&mut self, point: Pos2, style: StrokeStyle) -> Result<(), StrokeError> {
        if self.is_active() {
            return Err(StrokeError::AlreadyStarted);
        }
        self.style = style;
        self.window.clear();
        self.window.push(point);
        self.leading.clear();
        self.leading.push(point);
        self.accepted = 1;
        self.last_velocity = self.config.reference_velocity;
        self.last_width = style.width;
        debug!("stroke began at {point:?}");
        Ok(())
    }

    /// Feed one move; returns the segment completed by it, if any
    pub fn move_to(&mut self, point: Pos2) -> Result<Option<StrokeSegment>, StrokeError> {
        if !self.is_active() {
            return Err(StrokeError::NotStarted);
        }
        Ok(self.accept(point))
    }

    /// Feed the final point and close the stroke.
    ///
    /// A stroke of fewer than four points collapses into a single dot at its
    /// first point. Longer strokes get the head span up to the second point
    /// and one closing segment up to the last point.
    pub fn end(&mut self, point: Pos2) -> Result<ClosedStroke, StrokeError> {
        if !self.is_active() {
            return Err(StrokeError::NotStarted);
        }
        let last = self.accept(point);
        let mut closed = self.close();
        if let Some(segment) = last {
            closed.tail.insert(0, segment);
        }
        Ok(closed)
    }

    /// Close the stroke without a final point (input stream interrupted)
    pub fn finish(&mut self) -> Result<ClosedStroke, StrokeError> {
        if !self.is_active() {
            return Err(StrokeError::NotStarted);
        }
        Ok(self.close())
    }

    fn accept(&mut self, point: Pos2) -> Option<StrokeSegment> {
        if !is_finite_point(point) {
            debug!("dropping non-finite point {point:?}");
            return None;
        }
        let previous = *self.window.last()?;
        if previous.distance(point) < self.config.min_point_distance {
            trace!("dropping jitter point {point:?}");
            return None;
        }

        self.window.push(point);
        if self.window.len() > WINDOW {
            self.window.remove(0);
        }
        self.accepted += 1;
        if self.leading.len() < WINDOW - 1 {
            self.leading.push(point);
        }

        if self.window.len() == WINDOW {
            let [p0, p1, p2, p3] = [self.window[0], self.window[1], self.window[2], self.window[3]];
            Some(self.segment(p0, p1, p2, p3))
        } else {
            None
        }
    }

    fn close(&mut self) -> ClosedStroke {
        let closed = if self.accepted < WINDOW {
            let point = self.leading.first().copied().unwrap_or_default();
            ClosedStroke {
                head: None,
                tail: vec![StrokeSegment::dot(point, self.style.width, &self.style)],
            }
        } else {
            let [_, p0, p1, p2] = [self.window[0], self.window[1], self.window[2], self.window[3]];
            ClosedStroke {
                head: self.head(),
                tail: vec![self.segment(p0, p1, p2, p2)],
            }
        };

        debug!("stroke ended after {} points", self.accepted);
        self.window.clear();
        self.leading.clear();
        self.accepted = 0;
        closed
    }

    /// Segment from the first to the second point, with the first point doubled
    /// as its own neighbour. Drawn at the base width, where the next segment starts.
    fn head(&self) -> Option<StrokeSegment> {
        let [p0, p1, p2] = <[Pos2; 3]>::try_from(self.leading.as_slice()).ok()?;
        let k = self.config.smoothing_factor;
        let control1 = p0 + (p1 - p0) * k;
        let control2 = p1 - (p2 - p0) * k;
        let width = self.style.width;
        Some(StrokeSegment::new(p0, control1, control2, p1, width, width, &self.style))
    }

    /// Segment from `p1` to `p2`, shaped by the neighbours `p0` and `p3`
    fn segment(&mut self, p0: Pos2, p1: Pos2, p2: Pos2, p3: Pos2) -> StrokeSegment {
        let k = self.config.smoothing_factor;
        let control1 = p1 + (p2 - p0) * k;
        let control2 = p2 - (p3 - p1) * k;
        let (start_width, end_width) = self.widths(p1, p2);
        StrokeSegment::new(p1, control1, control2, p2, start_width, end_width, &self.style)
    }

    fn widths(&mut self, from: Pos2, to: Pos2) -> (f32, f32) {
        let base = self.style.width;
        if self.style.constant_width {
            return (base, base);
        }

        let config = &self.config;
        let sample_velocity = from.distance(to) / config.sample_interval.max(f32::EPSILON);
        let weight = config.velocity_filter_weight.clamp(0.0, 1.0);
        let velocity = weight * sample_velocity + (1.0 - weight) * self.last_velocity;

        let relative = if velocity > 0.0 {
            (config.reference_velocity / velocity).clamp(config.min_relative_width, 1.0)
        } else {
            1.0
        };
        let target = base * relative;
        let blend = config.width_blend.clamp(0.0, 1.0);
        let end_width = self.last_width * blend + target * (1.0 - blend);

        let start_width = self.last_width;
        self.last_velocity = velocity;
        self.last_width = end_width;
        (start_width, end_width)
    }
}
