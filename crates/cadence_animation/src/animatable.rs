//! Animatable targets
//!
//! [`Targets`] name what an animation acts on; the [`Registry`] resolves them
//! against the host and keeps the per-target state the engine needs between
//! frames: each element's individually animated transform functions, plus
//! memoized property names and unit conversions.

use crate::value::{DecomposedValue, Value};
use cadence_core::{kebab_case, Host, PropertyKind, RawValue, TargetId};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use rustc_hash::FxHashMap;
use std::sync::OnceLock;

/// Units that are never converted
const NON_CONVERTIBLE_UNITS: [&str; 4] = ["", "deg", "rad", "turn"];

fn transform_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(\w+)\(([^)]*)\)").expect("Invalid regex pattern"))
}

/// What an animation targets
#[derive(Clone, Debug, PartialEq)]
pub enum Targets {
    /// Selector resolved by the host
    Selector(String),
    Target(TargetId),
    List(Vec<Targets>),
}

impl Targets {
    /// Flatten into distinct targets, keeping first occurrences in order
    pub fn resolve(&self, host: &dyn Host) -> Vec<TargetId> {
        let mut out = IndexSet::new();
        self.collect(host, &mut out);
        out.into_iter().collect()
    }

    fn collect(&self, host: &dyn Host, out: &mut IndexSet<TargetId>) {
        match self {
            Targets::Selector(selector) => out.extend(host.query(selector)),
            Targets::Target(id) => {
                out.insert(*id);
            }
            Targets::List(list) => {
                for targets in list {
                    targets.collect(host, out);
                }
            }
        }
    }
}

impl From<TargetId> for Targets {
    fn from(value: TargetId) -> Self {
        Targets::Target(value)
    }
}

impl From<&str> for Targets {
    fn from(value: &str) -> Self {
        Targets::Selector(value.to_string())
    }
}

impl From<String> for Targets {
    fn from(value: String) -> Self {
        Targets::Selector(value)
    }
}

impl From<Vec<TargetId>> for Targets {
    fn from(value: Vec<TargetId>) -> Self {
        Targets::List(value.into_iter().map(Targets::Target).collect())
    }
}

impl From<&[TargetId]> for Targets {
    fn from(value: &[TargetId]) -> Self {
        Targets::List(value.iter().copied().map(Targets::Target).collect())
    }
}

impl<const N: usize> From<[TargetId; N]> for Targets {
    fn from(value: [TargetId; N]) -> Self {
        Targets::List(value.into_iter().map(Targets::Target).collect())
    }
}

impl From<Vec<Targets>> for Targets {
    fn from(value: Vec<Targets>) -> Self {
        Targets::List(value)
    }
}

/// A resolved target with its position among the animation's targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Animatable {
    pub target: TargetId,
    pub index: usize,
    pub total: usize,
}

#[derive(Clone, Debug, Default)]
struct TargetState {
    /// Transform function name -> value, in first-animated order
    transforms: IndexMap<String, String>,
    transform_string: String,
}

/// Per-target engine state shared by every instance
#[derive(Debug, Default)]
pub struct Registry {
    targets: FxHashMap<TargetId, TargetState>,
    property_names: FxHashMap<String, String>,
    unit_conversions: FxHashMap<String, f64>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve targets and register elements
    pub fn animatables(&mut self, host: &dyn Host, targets: &Targets) -> Vec<Animatable> {
        let resolved = targets.resolve(host);
        let total = resolved.len();
        resolved
            .into_iter()
            .enumerate()
            .map(|(index, target)| {
                if host.is_element(target) {
                    self.targets.entry(target).or_default();
                }
                Animatable {
                    target,
                    index,
                    total,
                }
            })
            .collect()
    }

    /// Name under which `property` is read and written: style properties
    /// (and style-like attributes of SVG elements) use kebab-case.
    pub fn sanitize_property_name(
        &mut self,
        host: &dyn Host,
        target: TargetId,
        property: &str,
        kind: PropertyKind,
    ) -> String {
        let styled = kind == PropertyKind::Style
            || (kind == PropertyKind::Attribute
                && host.is_svg(target)
                && host.is_style_property(target, property));
        if !styled {
            return property.to_string();
        }
        self.property_names
            .entry(property.to_string())
            .or_insert_with(|| kebab_case(property))
            .clone()
    }

    /// Current value of a property before any animation touches it
    pub fn original_value(
        &mut self,
        host: &dyn Host,
        target: TargetId,
        property: &str,
        kind: PropertyKind,
    ) -> Value {
        if kind == PropertyKind::Transform {
            return self.transform_value(host, target, property);
        }
        match host.read(target, property, kind) {
            Some(RawValue::Text(text)) if text.is_empty() => Value::Number(0.0),
            Some(raw) => Value::from(raw),
            None => Value::Number(0.0),
        }
    }

    /// Value of one transform function, re-reading the target's transform
    /// list first. Functions that were never set default to `1` for scales,
    /// `0deg` for rotations and skews, and `0px` otherwise.
    pub fn transform_value(&mut self, host: &dyn Host, target: TargetId, property: &str) -> Value {
        let state = self.targets.entry(target).or_default();
        state.transforms.clear();
        if let Some(RawValue::Text(list)) = host.read(target, "transform", PropertyKind::Transform) {
            for caps in transform_regex().captures_iter(&list) {
                state.transforms.insert(caps[1].to_string(), caps[2].to_string());
            }
        }
        match state.transforms.get(property) {
            Some(value) => Value::Text(value.clone()),
            None => default_transform_value(property),
        }
    }

    /// The last transform string rendered for `target`
    pub fn transform_string(&self, target: TargetId) -> Option<&str> {
        self.targets
            .get(&target)
            .map(|state| state.transform_string.as_str())
    }

    /// Write an animated value back to its target. Transform functions are
    /// collected per target and only serialized when `render_transforms` is
    /// set.
    pub fn write_value(
        &mut self,
        host: &mut dyn Host,
        target: TargetId,
        property: &str,
        kind: PropertyKind,
        value: RawValue,
        render_transforms: bool,
    ) {
        if kind != PropertyKind::Transform {
            host.write(target, property, kind, value);
            return;
        }
        let state = self.targets.entry(target).or_default();
        state.transforms.insert(property.to_string(), value.to_string());
        if render_transforms {
            state.transform_string = state
                .transforms
                .iter()
                .map(|(name, value)| format!("{name}({value})"))
                .collect::<Vec<_>>()
                .join(" ");
            tracing::trace!(%target, transform = %state.transform_string, "render transforms");
            host.write(
                target,
                "transform",
                PropertyKind::Transform,
                RawValue::Text(state.transform_string.clone()),
            );
        }
    }

    /// Convert a unit-bearing value into `unit`. Unitless and angle values are
    /// left alone. Conversions are memoized by value, source and target unit.
    pub fn convert_unit(
        &mut self,
        host: &dyn Host,
        target: TargetId,
        value: &mut DecomposedValue,
        unit: &str,
    ) {
        let from_unit = value.unit().unwrap_or_default().to_string();
        if value.kind() == crate::value::ValueType::Unit
            && (from_unit == unit || NON_CONVERTIBLE_UNITS.contains(&from_unit.as_str()))
        {
            return;
        }
        let number = value.number();
        let key = format!("{number}{from_unit}{unit}");
        let converted = *self
            .unit_conversions
            .entry(key)
            .or_insert_with(|| host.to_pixel_equivalent(target, number, &from_unit, unit));
        match value {
            DecomposedValue::Unit {
                number, unit: u, ..
            } => {
                *number = converted;
                *u = unit.to_string();
            }
            DecomposedValue::Path { unit: u, .. } => *u = unit.to_string(),
            DecomposedValue::Number(_) => {
                *value = DecomposedValue::Unit {
                    number: converted,
                    unit: unit.to_string(),
                }
            }
            DecomposedValue::Color(_) | DecomposedValue::Complex { .. } => {}
        }
    }

    /// Number of memoized unit conversions
    pub fn cached_unit_conversions(&self) -> usize {
        self.unit_conversions.len()
    }
}

fn default_transform_value(property: &str) -> Value {
    if property.contains("scale") {
        Value::Number(1.0)
    } else if property.contains("rotate") || property.contains("skew") {
        Value::Text("0deg".to_string())
    } else {
        Value::Text("0px".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::MemoryHost;

    #[test]
    fn test_targets_dedupe_in_order() {
        let mut host = MemoryHost::new();
        let a = host.add_element();
        let b = host.add_element();
        host.add_class(a, "box");
        host.add_class(b, "box");

        let targets = Targets::List(vec![Targets::from(b), Targets::from(".box"), Targets::from(b)]);
        assert_eq!(targets.resolve(&host), vec![b, a]);
    }

    #[test]
    fn test_large_target_lists_dedupe() {
        let host = MemoryHost::new();
        let ids: Vec<TargetId> = (0..2000).map(TargetId).collect();
        let mut reversed = ids.clone();
        reversed.reverse();
        let targets = Targets::List(vec![Targets::from(ids.clone()), Targets::from(reversed)]);
        assert_eq!(targets.resolve(&host), ids);
    }

    #[test]
    fn test_animatables_carry_index_and_total() {
        let mut host = MemoryHost::new();
        let a = host.add_object([("x", 0.0)]);
        let b = host.add_object([("x", 0.0)]);
        let mut registry = Registry::new();
        let animatables = registry.animatables(&host, &Targets::from(vec![a, b]));
        assert_eq!(animatables[1], Animatable { target: b, index: 1, total: 2 });
    }

    #[test]
    fn test_transform_defaults_and_cache_refresh() {
        let mut host = MemoryHost::new();
        let el = host.add_element();
        let mut registry = Registry::new();

        assert_eq!(registry.transform_value(&host, el, "scaleX"), Value::Number(1.0));
        assert_eq!(registry.transform_value(&host, el, "rotate"), Value::from("0deg"));
        assert_eq!(registry.transform_value(&host, el, "translateX"), Value::from("0px"));

        host.set_transform(el, "translateX(20px) rotate(45deg)");
        assert_eq!(registry.transform_value(&host, el, "rotate"), Value::from("45deg"));
    }

    #[test]
    fn test_transforms_serialize_together() {
        let mut host = MemoryHost::new();
        let el = host.add_element();
        let mut registry = Registry::new();

        registry.write_value(
            &mut host,
            el,
            "translateX",
            PropertyKind::Transform,
            "250px".into(),
            false,
        );
        assert_eq!(host.transform(el), Some(""));

        registry.write_value(
            &mut host,
            el,
            "rotate",
            PropertyKind::Transform,
            "90deg".into(),
            true,
        );
        assert_eq!(host.transform(el), Some("translateX(250px) rotate(90deg)"));
        assert_eq!(registry.transform_string(el), Some("translateX(250px) rotate(90deg)"));
    }

    #[test]
    fn test_sanitize_property_name() {
        let mut host = MemoryHost::new();
        let el = host.add_element();
        let svg = host.add_svg_element();
        host.set_attribute(svg, "strokeDashoffset", 0.0);
        host.set_attribute(svg, "baseFrequency", 0.0);
        let mut registry = Registry::new();

        assert_eq!(
            registry.sanitize_property_name(&host, el, "backgroundColor", PropertyKind::Style),
            "background-color"
        );
        assert_eq!(
            registry.sanitize_property_name(&host, svg, "strokeDashoffset", PropertyKind::Attribute),
            "stroke-dashoffset"
        );
        assert_eq!(
            registry.sanitize_property_name(&host, svg, "baseFrequency", PropertyKind::Attribute),
            "baseFrequency"
        );
    }

    #[test]
    fn test_original_values_fall_back_to_zero() {
        let mut host = MemoryHost::new();
        let el = host.add_element();
        let mut registry = Registry::new();
        assert_eq!(
            registry.original_value(&host, el, "opacity", PropertyKind::Style),
            Value::Number(0.0)
        );
        host.set_style(el, "opacity", "0.5");
        assert_eq!(
            registry.original_value(&host, el, "opacity", PropertyKind::Style),
            Value::from("0.5")
        );
    }

    #[test]
    fn test_convert_unit_is_memoized() {
        let mut host = MemoryHost::new();
        let el = host.add_element();
        let mut registry = Registry::new();

        let mut value = DecomposedValue::Unit {
            number: 2.0,
            unit: "em".to_string(),
        };
        registry.convert_unit(&host, el, &mut value, "px");
        assert_eq!(value.number(), 32.0);
        assert_eq!(value.unit(), Some("px"));
        assert_eq!(registry.cached_unit_conversions(), 1);

        // Angles stay as they are
        let mut angle = DecomposedValue::Unit {
            number: 90.0,
            unit: "deg".to_string(),
        };
        registry.convert_unit(&host, el, &mut angle, "px");
        assert_eq!(angle.unit(), Some("deg"));
        assert_eq!(registry.cached_unit_conversions(), 1);
    }
}
