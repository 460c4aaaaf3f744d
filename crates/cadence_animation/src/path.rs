//! Motion paths
//!
//! A [`MotionPath`] lets a target follow a path element: its `x`, `y` and
//! `angle` values become animatable property values whose progress is a
//! distance along the path. Positions are mapped from the path's viewBox
//! into rendered pixels unless the animated target lives inside the same SVG.

use crate::value::{round_to, Value};
use cadence_core::{Host, PropertyKind, RawValue, TargetId};

/// Which coordinate of the path a value follows
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathProperty {
    X,
    Y,
    /// Tangent angle in degrees
    Angle,
}

/// One coordinate of a motion path, usable as a property value
#[derive(Clone, Debug, PartialEq)]
pub struct PathMotion {
    pub element: TargetId,
    pub property: PathProperty,
    /// Length of the path to travel
    pub total_length: f64,
    /// Set when the animated target is itself an SVG element, which skips
    /// the viewBox-to-pixels scaling.
    pub target_inside_svg: bool,
}

/// A path element sampled for motion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionPath {
    element: TargetId,
    total_length: f64,
}

impl MotionPath {
    /// Follow the full length of `element`
    pub fn new(host: &dyn Host, element: TargetId) -> Self {
        Self::with_percent(host, element, 100.0)
    }

    /// Follow the first `percent` of `element`; zero means the full length
    pub fn with_percent(host: &dyn Host, element: TargetId, percent: f64) -> Self {
        let percent = if percent == 0.0 { 100.0 } else { percent };
        Self {
            element,
            total_length: host.total_length(element) * (percent / 100.0),
        }
    }

    pub fn element(&self) -> TargetId {
        self.element
    }

    pub fn total_length(&self) -> f64 {
        self.total_length
    }

    fn motion(&self, property: PathProperty) -> Value {
        Value::Path(PathMotion {
            element: self.element,
            property,
            total_length: self.total_length,
            target_inside_svg: false,
        })
    }

    pub fn x(&self) -> Value {
        self.motion(PathProperty::X)
    }

    pub fn y(&self) -> Value {
        self.motion(PathProperty::Y)
    }

    pub fn angle(&self) -> Value {
        self.motion(PathProperty::Angle)
    }
}

fn point_near(host: &dyn Host, element: TargetId, length: f64, offset: f64) -> cadence_core::Point {
    let at = if length + offset >= 1.0 {
        length + offset
    } else {
        0.0
    };
    host.point_at_length(element, at)
}

/// Position or angle of `motion` after travelling `length` along its path
pub fn path_progress(host: &dyn Host, motion: &PathMotion, length: f64, round: f64) -> f64 {
    let viewport = host.viewport(motion.element);
    let p = point_near(host, motion.element, length, 0.0);
    let (scale_x, scale_y) = if motion.target_inside_svg {
        (1.0, 1.0)
    } else {
        (viewport.scale_x(), viewport.scale_y())
    };
    let value = match motion.property {
        PathProperty::X => (p.x - viewport.x) * scale_x,
        PathProperty::Y => (p.y - viewport.y) * scale_y,
        PathProperty::Angle => {
            let p0 = point_near(host, motion.element, length, -1.0);
            let p1 = point_near(host, motion.element, length, 1.0);
            (p1.y - p0.y).atan2(p1.x - p0.x) * 180.0 / std::f64::consts::PI
        }
    };
    if round == 0.0 {
        value
    } else {
        round_to(value, round)
    }
}

/// Prepare a line-drawing animation: sets `stroke-dasharray` to the path's
/// length and returns that length as the starting dash offset.
pub fn set_dashoffset(host: &mut dyn Host, element: TargetId) -> f64 {
    let length = host.total_length(element);
    host.write(
        element,
        "stroke-dasharray",
        PropertyKind::Attribute,
        RawValue::Number(length),
    );
    length
}
