//! Keyframes and tween parameters
//!
//! A property is animated either to a single [`Keyframe`] (a target value or
//! an explicit `[from, to]` pair) or through a list of keyframes. Timing
//! parameters can be fixed or computed per target, and cascade from the
//! engine defaults through the animation's parameters down to each keyframe.

use crate::easing::{is_spring_expression, Easing};
use crate::spring::{settle_duration, SpringConfig};
use crate::value::Value;
use cadence_core::{TargetId, TweenDefaults};
use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;

/// A function evaluated once per target: `(target, index, total) -> T`
pub type TargetFn<T> = Rc<dyn Fn(TargetId, usize, usize) -> T>;

// =============================================================================
// Parameter values
// =============================================================================

/// A property value, fixed or computed per target
#[derive(Clone)]
pub enum KeyValue {
    Fixed(Value),
    PerTarget(TargetFn<Value>),
    /// The length of the target's path, after setting its `stroke-dasharray`
    /// to that length. Used to animate line drawing.
    DashOffset,
}

impl KeyValue {
    pub fn per_target(f: impl Fn(TargetId, usize, usize) -> Value + 'static) -> Self {
        KeyValue::PerTarget(Rc::new(f))
    }
}

impl fmt::Debug for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Fixed(value) => f.debug_tuple("Fixed").field(value).finish(),
            KeyValue::PerTarget(_) => f.write_str("PerTarget(..)"),
            KeyValue::DashOffset => f.write_str("DashOffset"),
        }
    }
}

impl From<f64> for KeyValue {
    fn from(value: f64) -> Self {
        KeyValue::Fixed(value.into())
    }
}

impl From<i32> for KeyValue {
    fn from(value: i32) -> Self {
        KeyValue::Fixed(value.into())
    }
}

impl From<&str> for KeyValue {
    fn from(value: &str) -> Self {
        KeyValue::Fixed(value.into())
    }
}

impl From<String> for KeyValue {
    fn from(value: String) -> Self {
        KeyValue::Fixed(value.into())
    }
}

impl From<Value> for KeyValue {
    fn from(value: Value) -> Self {
        KeyValue::Fixed(value)
    }
}

/// A numeric tween parameter, fixed or computed per target
#[derive(Clone)]
pub enum Param {
    Fixed(f64),
    PerTarget(TargetFn<f64>),
}

impl Param {
    pub fn per_target(f: impl Fn(TargetId, usize, usize) -> f64 + 'static) -> Self {
        Param::PerTarget(Rc::new(f))
    }

    /// Evaluate for one target; non-finite results read as zero
    pub fn resolve(&self, target: TargetId, index: usize, total: usize) -> f64 {
        let value = match self {
            Param::Fixed(v) => *v,
            Param::PerTarget(f) => f(target, index, total),
        };
        if value.is_finite() {
            value
        } else {
            0.0
        }
    }

    pub fn fixed(&self) -> Option<f64> {
        match self {
            Param::Fixed(v) => Some(*v),
            Param::PerTarget(_) => None,
        }
    }
}

impl fmt::Debug for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Param::Fixed(v) => f.debug_tuple("Fixed").field(v).finish(),
            Param::PerTarget(_) => f.write_str("PerTarget(..)"),
        }
    }
}

impl From<f64> for Param {
    fn from(value: f64) -> Self {
        Param::Fixed(value)
    }
}

impl From<i32> for Param {
    fn from(value: i32) -> Self {
        Param::Fixed(value as f64)
    }
}

impl From<u32> for Param {
    fn from(value: u32) -> Self {
        Param::Fixed(value as f64)
    }
}

/// An easing given by expression or directly
#[derive(Clone, Debug)]
pub enum EasingParam {
    Expr(String),
    Easing(Easing),
}

impl EasingParam {
    /// Settle duration when this names a spring
    pub fn spring_duration(&self) -> Option<f64> {
        match self {
            EasingParam::Expr(expr) if is_spring_expression(expr) => {
                match Easing::parse(expr) {
                    Ok(Easing::Spring { config, .. }) => Some(settle_duration(expr, &config)),
                    _ => None,
                }
            }
            EasingParam::Easing(Easing::Spring { config, .. }) => {
                Some(settle_duration(&spring_key(config), config))
            }
            _ => None,
        }
    }

    /// Build the easing for a tween lasting `duration` milliseconds
    pub fn to_easing(&self, duration: f64) -> Easing {
        match self {
            EasingParam::Expr(expr) => Easing::parse_with_duration(expr, Some(duration))
                .unwrap_or_else(|err| {
                    tracing::warn!(%err, "falling back to linear easing");
                    Easing::Linear
                }),
            EasingParam::Easing(Easing::Spring { config, duration: None }) => Easing::Spring {
                config: *config,
                duration: Some(duration),
            },
            EasingParam::Easing(easing) => easing.clone(),
        }
    }
}

fn spring_key(config: &SpringConfig) -> String {
    format!(
        "spring({}, {}, {}, {})",
        config.mass, config.stiffness, config.damping, config.velocity
    )
}

impl From<&str> for EasingParam {
    fn from(value: &str) -> Self {
        EasingParam::Expr(value.to_string())
    }
}

impl From<String> for EasingParam {
    fn from(value: String) -> Self {
        EasingParam::Expr(value)
    }
}

impl From<Easing> for EasingParam {
    fn from(value: Easing) -> Self {
        EasingParam::Easing(value)
    }
}

// =============================================================================
// Tween settings
// =============================================================================

/// Optional tween parameter overrides
#[derive(Clone, Debug, Default)]
pub struct TweenSettings {
    pub duration: Option<Param>,
    pub delay: Option<Param>,
    pub end_delay: Option<Param>,
    pub easing: Option<EasingParam>,
    pub round: Option<Param>,
}

impl TweenSettings {
    /// Fill unset fields from `fallback`
    pub fn or(mut self, fallback: &TweenSettings) -> Self {
        self.duration = self.duration.or_else(|| fallback.duration.clone());
        self.delay = self.delay.or_else(|| fallback.delay.clone());
        self.end_delay = self.end_delay.or_else(|| fallback.end_delay.clone());
        self.easing = self.easing.or_else(|| fallback.easing.clone());
        self.round = self.round.or_else(|| fallback.round.clone());
        self
    }

    /// Resolve against the engine defaults
    pub fn resolve(&self, defaults: &TweenDefaults) -> TweenTiming {
        TweenTiming {
            duration: self.duration.clone().unwrap_or(Param::Fixed(defaults.duration)),
            delay: self.delay.clone().unwrap_or(Param::Fixed(defaults.delay)),
            end_delay: self.end_delay.clone().unwrap_or(Param::Fixed(defaults.end_delay)),
            easing: self
                .easing
                .clone()
                .unwrap_or_else(|| EasingParam::Expr(defaults.easing.clone())),
            round: self.round.clone().unwrap_or(Param::Fixed(defaults.round)),
        }
    }
}

/// Fully specified tween parameters
#[derive(Clone, Debug)]
pub struct TweenTiming {
    pub duration: Param,
    pub delay: Param,
    pub end_delay: Param,
    pub easing: EasingParam,
    pub round: Param,
}

// =============================================================================
// Keyframes
// =============================================================================

/// The value half of a keyframe
#[derive(Clone, Debug)]
pub enum KeyframeValue {
    /// Animate to this value from wherever the previous keyframe ended
    To(KeyValue),
    /// Animate between two explicit values
    FromTo(KeyValue, KeyValue),
}

/// One step of a property animation
#[derive(Clone, Debug, Default)]
pub struct Keyframe {
    /// `None` holds the previous keyframe's end value
    pub value: Option<KeyframeValue>,
    pub settings: TweenSettings,
}

impl Keyframe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keyframe animating to `value`
    pub fn to(value: impl Into<KeyValue>) -> Self {
        Self {
            value: Some(KeyframeValue::To(value.into())),
            settings: TweenSettings::default(),
        }
    }

    /// Keyframe animating from `from` to `to`
    pub fn from_to(from: impl Into<KeyValue>, to: impl Into<KeyValue>) -> Self {
        Self {
            value: Some(KeyframeValue::FromTo(from.into(), to.into())),
            settings: TweenSettings::default(),
        }
    }

    pub fn duration(mut self, duration: impl Into<Param>) -> Self {
        self.settings.duration = Some(duration.into());
        self
    }

    pub fn delay(mut self, delay: impl Into<Param>) -> Self {
        self.settings.delay = Some(delay.into());
        self
    }

    pub fn end_delay(mut self, end_delay: impl Into<Param>) -> Self {
        self.settings.end_delay = Some(end_delay.into());
        self
    }

    pub fn easing(mut self, easing: impl Into<EasingParam>) -> Self {
        self.settings.easing = Some(easing.into());
        self
    }

    pub fn round(mut self, round: impl Into<Param>) -> Self {
        self.settings.round = Some(round.into());
        self
    }
}

/// What a property animates to: one keyframe or a sequence of them
#[derive(Clone, Debug)]
pub enum PropertyValue {
    Keyframe(Keyframe),
    Keyframes(Vec<Keyframe>),
}

impl From<Keyframe> for PropertyValue {
    fn from(value: Keyframe) -> Self {
        PropertyValue::Keyframe(value)
    }
}

impl From<Vec<Keyframe>> for PropertyValue {
    fn from(value: Vec<Keyframe>) -> Self {
        PropertyValue::Keyframes(value)
    }
}

impl From<KeyValue> for PropertyValue {
    fn from(value: KeyValue) -> Self {
        PropertyValue::Keyframe(Keyframe::to(value))
    }
}

impl From<f64> for PropertyValue {
    fn from(value: f64) -> Self {
        PropertyValue::Keyframe(Keyframe::to(value))
    }
}

impl From<i32> for PropertyValue {
    fn from(value: i32) -> Self {
        PropertyValue::Keyframe(Keyframe::to(value))
    }
}

impl From<&str> for PropertyValue {
    fn from(value: &str) -> Self {
        PropertyValue::Keyframe(Keyframe::to(value))
    }
}

impl From<String> for PropertyValue {
    fn from(value: String) -> Self {
        PropertyValue::Keyframe(Keyframe::to(value))
    }
}

impl From<Value> for PropertyValue {
    fn from(value: Value) -> Self {
        PropertyValue::Keyframe(Keyframe::to(value))
    }
}

/// Two values are a `[from, to]` pair; any other list becomes evenly split
/// keyframes
impl From<Vec<f64>> for PropertyValue {
    fn from(values: Vec<f64>) -> Self {
        if values.len() == 2 {
            return PropertyValue::Keyframe(Keyframe::from_to(values[0], values[1]));
        }
        PropertyValue::Keyframes(values.into_iter().map(Keyframe::to).collect())
    }
}

/// A keyframe setting several properties at once
#[derive(Clone, Debug, Default)]
pub struct MultiKeyframe {
    pub properties: IndexMap<String, KeyframeValue>,
    pub settings: TweenSettings,
}

impl MultiKeyframe {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: animate `property` to `value` at this step
    pub fn set(mut self, property: &str, value: impl Into<KeyValue>) -> Self {
        self.properties
            .insert(property.to_string(), KeyframeValue::To(value.into()));
        self
    }

    /// Builder: animate `property` between explicit values at this step
    pub fn set_from_to(
        mut self,
        property: &str,
        from: impl Into<KeyValue>,
        to: impl Into<KeyValue>,
    ) -> Self {
        self.properties.insert(
            property.to_string(),
            KeyframeValue::FromTo(from.into(), to.into()),
        );
        self
    }

    pub fn duration(mut self, duration: impl Into<Param>) -> Self {
        self.settings.duration = Some(duration.into());
        self
    }

    pub fn delay(mut self, delay: impl Into<Param>) -> Self {
        self.settings.delay = Some(delay.into());
        self
    }

    pub fn end_delay(mut self, end_delay: impl Into<Param>) -> Self {
        self.settings.end_delay = Some(end_delay.into());
        self
    }

    pub fn easing(mut self, easing: impl Into<EasingParam>) -> Self {
        self.settings.easing = Some(easing.into());
        self
    }
}

/// Split multi-property keyframes into one keyframe list per property, in
/// order of first appearance. A step that does not mention a property holds
/// that property's previous value.
pub fn flatten_keyframes(steps: &[MultiKeyframe]) -> Vec<(String, PropertyValue)> {
    let mut names: Vec<&str> = Vec::new();
    for step in steps {
        for name in step.properties.keys() {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let frames = steps
                .iter()
                .map(|step| Keyframe {
                    value: step.properties.get(name).cloned(),
                    settings: step.settings.clone(),
                })
                .collect();
            (name.to_string(), PropertyValue::Keyframes(frames))
        })
        .collect()
}

/// A keyframe with every tween parameter decided
#[derive(Clone, Debug)]
pub struct KeyframeSpec {
    pub value: Option<KeyframeValue>,
    pub duration: Param,
    pub delay: Param,
    pub end_delay: Param,
    pub easing: EasingParam,
    pub round: Param,
}

/// Expand a property value into keyframes with inherited parameters.
///
/// A spring easing stretches the default duration to the spring's settle
/// time. A keyframe list shares the total duration evenly among keyframes
/// that do not set their own. Only the first keyframe inherits the delay and
/// only the last inherits the end delay.
pub fn normalize(value: &PropertyValue, timing: &TweenTiming) -> Vec<KeyframeSpec> {
    let mut base = timing.clone();
    if let Some(duration) = timing.easing.spring_duration() {
        base.duration = Param::Fixed(duration);
    }

    let frames: &[Keyframe] = match value {
        PropertyValue::Keyframe(keyframe) => std::slice::from_ref(keyframe),
        PropertyValue::Keyframes(list) => {
            if let (Some(total), false) = (timing.duration.fixed(), list.is_empty()) {
                base.duration = Param::Fixed(total / list.len() as f64);
            }
            list
        }
    };

    let last = frames.len().saturating_sub(1);
    frames
        .iter()
        .enumerate()
        .map(|(i, frame)| {
            let settings = &frame.settings;
            KeyframeSpec {
                value: frame.value.clone(),
                duration: settings.duration.clone().unwrap_or_else(|| base.duration.clone()),
                delay: settings.delay.clone().unwrap_or_else(|| {
                    if i == 0 {
                        base.delay.clone()
                    } else {
                        Param::Fixed(0.0)
                    }
                }),
                end_delay: settings.end_delay.clone().unwrap_or_else(|| {
                    if i == last {
                        base.end_delay.clone()
                    } else {
                        Param::Fixed(0.0)
                    }
                }),
                easing: settings.easing.clone().unwrap_or_else(|| base.easing.clone()),
                round: settings.round.clone().unwrap_or_else(|| base.round.clone()),
            }
        })
        .collect()
}
