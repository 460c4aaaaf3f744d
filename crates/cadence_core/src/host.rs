//! Host collaborator contract
//!
//! The engine never touches a rendering tree directly. Target lookup, property
//! classification, value I/O, geometry, unit conversion and the frame clock
//! all go through [`Host`].

use crate::error::TargetError;
use std::fmt;

/// CSS transform functions that are animated individually and serialized
/// together into one `transform` value per target.
pub const TRANSFORM_FUNCTIONS: [&str; 17] = [
    "translateX",
    "translateY",
    "translateZ",
    "rotate",
    "rotateX",
    "rotateY",
    "rotateZ",
    "scale",
    "scaleX",
    "scaleY",
    "scaleZ",
    "skew",
    "skewX",
    "skewY",
    "perspective",
    "matrix",
    "matrix3d",
];

/// Whether `name` is one of [`TRANSFORM_FUNCTIONS`]
pub fn is_transform_function(name: &str) -> bool {
    TRANSFORM_FUNCTIONS.contains(&name)
}

/// Opaque handle to an externally-owned animation target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TargetId(pub u64);

impl fmt::Display for TargetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a property value is written back to its target
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyKind {
    /// Plain object field
    Field,
    /// DOM / SVG attribute
    Attribute,
    /// Inline style property
    Style,
    /// One function of the target's transform list
    Transform,
}

/// A value as exchanged with the host
#[derive(Clone, Debug, PartialEq)]
pub enum RawValue {
    Number(f64),
    Text(String),
}

impl RawValue {
    /// Numeric view of the value, parsing text the way a loose numeric cast
    /// would (surrounding whitespace ignored, empty text is zero).
    pub fn as_number(&self) -> Option<f64> {
        match self {
            RawValue::Number(n) => Some(*n),
            RawValue::Text(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    Some(0.0)
                } else {
                    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
                }
            }
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            RawValue::Text(s) => Some(s),
            RawValue::Number(_) => None,
        }
    }
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Number(n) => f.write_str(&format_number(*n)),
            RawValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<f64> for RawValue {
    fn from(value: f64) -> Self {
        RawValue::Number(value)
    }
}

impl From<i32> for RawValue {
    fn from(value: i32) -> Self {
        RawValue::Number(value as f64)
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        RawValue::Text(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        RawValue::Text(value)
    }
}

/// Render a number the way it is written into style strings: shortest
/// round-trip form, no trailing `.0`, and no negative zero.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    format!("{}", value)
}

/// A point in user space
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

/// On-screen rectangle of an SVG root plus its `viewBox`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
    /// viewBox origin x
    pub x: f64,
    /// viewBox origin y
    pub y: f64,
    /// Rendered width
    pub width: f64,
    /// Rendered height
    pub height: f64,
    /// viewBox width
    pub view_width: f64,
    /// viewBox height
    pub view_height: f64,
}

impl Viewport {
    /// A viewport whose viewBox matches its rendered size
    pub const fn identity(width: f64, height: f64) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width,
            height,
            view_width: width,
            view_height: height,
        }
    }

    /// Horizontal scale from viewBox units to rendered pixels
    pub fn scale_x(&self) -> f64 {
        if self.view_width == 0.0 {
            1.0
        } else {
            self.width / self.view_width
        }
    }

    /// Vertical scale from viewBox units to rendered pixels
    pub fn scale_y(&self) -> f64 {
        if self.view_height == 0.0 {
            1.0
        } else {
            self.height / self.view_height
        }
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::identity(1.0, 1.0)
    }
}

/// Handle returned by [`Host::request_frame`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FrameHandle(pub u64);

/// The environment an animation engine runs inside
///
/// Transform-kind properties are exchanged as one serialized string: `read`
/// and `write` with [`PropertyKind::Transform`] always address the target's
/// whole transform list, regardless of the property name passed.
pub trait Host {
    /// Resolve a selector to targets, in document order
    fn query(&self, _selector: &str) -> Vec<TargetId> {
        Vec::new()
    }

    /// Whether the target is a rendered element (and so carries a transform list)
    fn is_element(&self, _target: TargetId) -> bool {
        false
    }

    /// Whether the target is an SVG element
    fn is_svg(&self, _target: TargetId) -> bool {
        false
    }

    /// Whether `property` names a style property of `target`, even when the
    /// target exposes it as an attribute
    fn is_style_property(&self, _target: TargetId, _property: &str) -> bool {
        false
    }

    /// Decide how `property` is written back to `target`
    fn classify(&self, target: TargetId, property: &str) -> Result<PropertyKind, TargetError>;

    /// Current value of a property, if the target has one
    fn read(&self, target: TargetId, property: &str, kind: PropertyKind) -> Option<RawValue>;

    /// Write a property value
    fn write(&mut self, target: TargetId, property: &str, kind: PropertyKind, value: RawValue);

    /// Total length of a path-like element
    fn total_length(&self, _element: TargetId) -> f64 {
        0.0
    }

    /// Point at a distance along a path-like element
    fn point_at_length(&self, _element: TargetId, _length: f64) -> Point {
        Point::default()
    }

    /// Viewport of the SVG root containing `element`
    fn viewport(&self, _element: TargetId) -> Viewport {
        Viewport::default()
    }

    /// Convert `value` expressed in `from_unit` into `to_unit` for this target
    fn to_pixel_equivalent(
        &self,
        _target: TargetId,
        value: f64,
        _from_unit: &str,
        _to_unit: &str,
    ) -> f64 {
        value
    }

    /// Ask for one frame callback; the host later calls the scheduler's
    /// `frame` with a monotonically increasing timestamp in milliseconds.
    fn request_frame(&mut self) -> FrameHandle;

    /// Cancel a pending frame request
    fn cancel_frame(&mut self, handle: FrameHandle);

    /// Whether the host is currently hidden (e.g. a background tab)
    fn is_hidden(&self) -> bool {
        false
    }
}
