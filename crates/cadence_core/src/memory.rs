//! In-memory host
//!
//! [`MemoryHost`] keeps plain data objects and lightweight element records in
//! memory. It is the host used for animating application data directly, and
//! the reference host the engine's tests run against.

use crate::error::TargetError;
use crate::host::{
    is_transform_function, FrameHandle, Host, Point, PropertyKind, RawValue, TargetId, Viewport,
};
use indexmap::IndexMap;
use rustc_hash::FxHashMap;

/// Style properties every element accepts even before they are set
const KNOWN_STYLES: &[&str] = &[
    "opacity",
    "width",
    "height",
    "top",
    "left",
    "right",
    "bottom",
    "color",
    "background-color",
    "border-radius",
    "border-width",
    "font-size",
    "line-height",
    "margin",
    "padding",
    "stroke-dashoffset",
    "fill",
    "stroke",
    "filter",
];

/// Convert a lowerCamelCase property name to kebab-case
pub fn kebab_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_ascii_uppercase() && prev_lower {
            out.push('-');
        }
        prev_lower = ch.is_ascii_lowercase();
        out.push(ch.to_ascii_lowercase());
    }
    out
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum TargetKind {
    Object,
    Element,
    Svg,
}

#[derive(Clone, Debug)]
struct MemoryTarget {
    kind: TargetKind,
    id: Option<String>,
    classes: Vec<String>,
    fields: IndexMap<String, RawValue>,
    attributes: IndexMap<String, RawValue>,
    styles: IndexMap<String, String>,
    transform: String,
    points: Vec<Point>,
    viewport: Viewport,
}

impl MemoryTarget {
    fn new(kind: TargetKind) -> Self {
        Self {
            kind,
            id: None,
            classes: Vec::new(),
            fields: IndexMap::new(),
            attributes: IndexMap::new(),
            styles: IndexMap::new(),
            transform: String::new(),
            points: Vec::new(),
            viewport: Viewport::default(),
        }
    }

    fn matches(&self, selector: &str) -> bool {
        if selector == "*" {
            return self.kind != TargetKind::Object;
        }
        if let Some(id) = selector.strip_prefix('#') {
            return self.id.as_deref() == Some(id);
        }
        if let Some(class) = selector.strip_prefix('.') {
            return self.classes.iter().any(|c| c == class);
        }
        false
    }
}

/// An in-memory [`Host`] for plain objects and simulated elements
///
/// Frame requests are recorded rather than scheduled; a driver loop pops them
/// with [`MemoryHost::take_frame_request`] and calls the scheduler's `frame`.
#[derive(Clone, Debug)]
pub struct MemoryHost {
    targets: IndexMap<TargetId, MemoryTarget>,
    next_target: u64,
    next_frame: u64,
    pending_frame: Option<FrameHandle>,
    frame_requests: usize,
    hidden: bool,
    /// Pixels per unit, used for unit conversion
    unit_sizes: FxHashMap<String, f64>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        let mut unit_sizes = FxHashMap::default();
        for (unit, px) in [
            ("px", 1.0),
            ("%", 1.0),
            ("em", 16.0),
            ("rem", 16.0),
            ("in", 96.0),
            ("cm", 96.0 / 2.54),
            ("mm", 96.0 / 25.4),
            ("pt", 96.0 / 72.0),
            ("pc", 16.0),
        ] {
            unit_sizes.insert(unit.to_string(), px);
        }
        Self {
            targets: IndexMap::new(),
            next_target: 1,
            next_frame: 1,
            pending_frame: None,
            frame_requests: 0,
            hidden: false,
            unit_sizes,
        }
    }

    fn insert(&mut self, target: MemoryTarget) -> TargetId {
        let id = TargetId(self.next_target);
        self.next_target += 1;
        self.targets.insert(id, target);
        id
    }

    // =========================================================================
    // Target construction
    // =========================================================================

    /// Add a plain data object with initial fields
    pub fn add_object<I, K, V>(&mut self, fields: I) -> TargetId
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<RawValue>,
    {
        let mut target = MemoryTarget::new(TargetKind::Object);
        for (name, value) in fields {
            target.fields.insert(name.into(), value.into());
        }
        self.insert(target)
    }

    /// Add an element with no attributes or styles
    pub fn add_element(&mut self) -> TargetId {
        self.insert(MemoryTarget::new(TargetKind::Element))
    }

    /// Add an SVG element
    pub fn add_svg_element(&mut self) -> TargetId {
        self.insert(MemoryTarget::new(TargetKind::Svg))
    }

    pub fn set_element_id(&mut self, target: TargetId, id: &str) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.id = Some(id.to_string());
        }
    }

    pub fn add_class(&mut self, target: TargetId, class: &str) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.classes.push(class.to_string());
        }
    }

    pub fn set_field(&mut self, target: TargetId, name: &str, value: impl Into<RawValue>) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.fields.insert(name.to_string(), value.into());
        }
    }

    pub fn set_attribute(&mut self, target: TargetId, name: &str, value: impl Into<RawValue>) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.attributes.insert(name.to_string(), value.into());
        }
    }

    /// Set an inline style; camelCase names are stored in kebab-case
    pub fn set_style(&mut self, target: TargetId, name: &str, value: &str) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.styles.insert(kebab_case(name), value.to_string());
        }
    }

    pub fn set_transform(&mut self, target: TargetId, value: &str) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.transform = value.to_string();
        }
    }

    /// Give an element polyline geometry for path measurements
    pub fn set_path_points(&mut self, target: TargetId, points: Vec<Point>) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.points = points;
        }
    }

    pub fn set_viewport(&mut self, target: TargetId, viewport: Viewport) {
        if let Some(t) = self.targets.get_mut(&target) {
            t.viewport = viewport;
        }
    }

    /// Set how many pixels one `unit` measures
    pub fn set_unit_size(&mut self, unit: &str, px: f64) {
        self.unit_sizes.insert(unit.to_string(), px);
    }

    pub fn set_hidden(&mut self, hidden: bool) {
        self.hidden = hidden;
    }

    // =========================================================================
    // Inspection
    // =========================================================================

    pub fn field(&self, target: TargetId, name: &str) -> Option<&RawValue> {
        self.targets.get(&target)?.fields.get(name)
    }

    pub fn attribute(&self, target: TargetId, name: &str) -> Option<&RawValue> {
        self.targets.get(&target)?.attributes.get(name)
    }

    pub fn style(&self, target: TargetId, name: &str) -> Option<&str> {
        self.targets
            .get(&target)?
            .styles
            .get(&kebab_case(name))
            .map(String::as_str)
    }

    pub fn transform(&self, target: TargetId) -> Option<&str> {
        self.targets.get(&target).map(|t| t.transform.as_str())
    }

    /// Take the pending frame request, if any
    pub fn take_frame_request(&mut self) -> Option<FrameHandle> {
        self.pending_frame.take()
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    /// Total number of frames requested so far
    pub fn frame_requests(&self) -> usize {
        self.frame_requests
    }

    fn segment_lengths(points: &[Point]) -> impl Iterator<Item = (Point, Point, f64)> + '_ {
        points
            .windows(2)
            .map(|pair| (pair[0], pair[1], pair[0].distance(&pair[1])))
    }
}

impl Host for MemoryHost {
    fn query(&self, selector: &str) -> Vec<TargetId> {
        self.targets
            .iter()
            .filter(|(_, t)| t.matches(selector))
            .map(|(id, _)| *id)
            .collect()
    }

    fn is_element(&self, target: TargetId) -> bool {
        self.targets
            .get(&target)
            .is_some_and(|t| t.kind != TargetKind::Object)
    }

    fn is_svg(&self, target: TargetId) -> bool {
        self.targets
            .get(&target)
            .is_some_and(|t| t.kind == TargetKind::Svg)
    }

    fn is_style_property(&self, target: TargetId, property: &str) -> bool {
        let kebab = kebab_case(property);
        self.targets.get(&target).is_some_and(|t| {
            t.kind != TargetKind::Object
                && (t.styles.contains_key(&kebab) || KNOWN_STYLES.contains(&kebab.as_str()))
        })
    }

    fn classify(&self, target: TargetId, property: &str) -> Result<PropertyKind, TargetError> {
        let t = self
            .targets
            .get(&target)
            .ok_or(TargetError::NotAnimatable(target))?;

        if t.kind == TargetKind::Object {
            return Ok(PropertyKind::Field);
        }
        if t.attributes.contains_key(property) {
            return Ok(PropertyKind::Attribute);
        }
        if is_transform_function(property) {
            return Ok(PropertyKind::Transform);
        }
        let kebab = kebab_case(property);
        if t.styles.contains_key(&kebab) || KNOWN_STYLES.contains(&kebab.as_str()) {
            return Ok(PropertyKind::Style);
        }
        if t.fields.contains_key(property) {
            return Ok(PropertyKind::Field);
        }
        Err(TargetError::UnknownProperty {
            target,
            property: property.to_string(),
        })
    }

    fn read(&self, target: TargetId, property: &str, kind: PropertyKind) -> Option<RawValue> {
        let t = self.targets.get(&target)?;
        match kind {
            PropertyKind::Field => t.fields.get(property).cloned(),
            PropertyKind::Attribute => t.attributes.get(property).cloned(),
            PropertyKind::Style => t
                .styles
                .get(&kebab_case(property))
                .map(|s| RawValue::Text(s.clone())),
            PropertyKind::Transform => Some(RawValue::Text(t.transform.clone())),
        }
    }

    fn write(&mut self, target: TargetId, property: &str, kind: PropertyKind, value: RawValue) {
        let Some(t) = self.targets.get_mut(&target) else {
            return;
        };
        match kind {
            PropertyKind::Field => {
                t.fields.insert(property.to_string(), value);
            }
            PropertyKind::Attribute => {
                t.attributes.insert(property.to_string(), value);
            }
            PropertyKind::Style => {
                t.styles.insert(kebab_case(property), value.to_string());
            }
            PropertyKind::Transform => {
                t.transform = value.to_string();
            }
        }
    }

    fn total_length(&self, element: TargetId) -> f64 {
        self.targets
            .get(&element)
            .map(|t| Self::segment_lengths(&t.points).map(|(_, _, len)| len).sum::<f64>())
            .unwrap_or(0.0)
    }

    fn point_at_length(&self, element: TargetId, length: f64) -> Point {
        let Some(t) = self.targets.get(&element) else {
            return Point::default();
        };
        let Some(first) = t.points.first() else {
            return Point::default();
        };
        let mut remaining = length.max(0.0);
        let mut last = *first;
        for (a, b, len) in Self::segment_lengths(&t.points) {
            if remaining <= len && len > 0.0 {
                let f = remaining / len;
                return Point::new(a.x + (b.x - a.x) * f, a.y + (b.y - a.y) * f);
            }
            remaining -= len;
            last = b;
        }
        last
    }

    fn viewport(&self, element: TargetId) -> Viewport {
        self.targets
            .get(&element)
            .map(|t| t.viewport)
            .unwrap_or_default()
    }

    fn to_pixel_equivalent(
        &self,
        _target: TargetId,
        value: f64,
        from_unit: &str,
        to_unit: &str,
    ) -> f64 {
        match (self.unit_sizes.get(from_unit), self.unit_sizes.get(to_unit)) {
            (Some(from), Some(to)) if *to != 0.0 => value * from / to,
            _ => value,
        }
    }

    fn request_frame(&mut self) -> FrameHandle {
        let handle = FrameHandle(self.next_frame);
        self.next_frame += 1;
        self.frame_requests += 1;
        self.pending_frame = Some(handle);
        handle
    }

    fn cancel_frame(&mut self, handle: FrameHandle) {
        if self.pending_frame == Some(handle) {
            self.pending_frame = None;
        }
    }

    fn is_hidden(&self) -> bool {
        self.hidden
    }
}
