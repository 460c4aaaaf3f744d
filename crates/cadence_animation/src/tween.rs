//! Tweens
//!
//! A tween interpolates one property of one target between two decomposed
//! values over a slice of the animation's local time. Consecutive keyframes
//! become consecutive tweens, each starting where the previous one ended.

use crate::animatable::{Animatable, Registry};
use crate::easing::Easing;
use crate::keyframe::{KeyValue, KeyframeSpec, KeyframeValue, Param};
use crate::path::set_dashoffset;
use crate::value::{
    decompose, pad_parts, recompose, reconcile, DecomposedValue, Value, MIN_DURATION,
};
use cadence_core::{Host, RawValue};
use smallvec::SmallVec;

/// Tweens of one animation; most properties have a single keyframe
pub type Tweens = SmallVec<[Tween; 2]>;

/// One interpolation segment
#[derive(Clone, Debug)]
pub struct Tween {
    pub property: String,
    pub from: DecomposedValue,
    pub to: DecomposedValue,
    /// Local time at which this tween's delay begins
    pub start: f64,
    pub delay: f64,
    pub duration: f64,
    pub end_delay: f64,
    /// `start + delay + duration + end_delay`
    pub end: f64,
    pub easing: Easing,
    pub round: f64,
}

impl Tween {
    /// Eased progress at animation-local `time`
    pub fn progress_at(&self, time: f64) -> f64 {
        let elapsed = (time - self.start - self.delay).max(0.0).min(self.duration);
        self.easing.apply(elapsed / self.duration)
    }

    /// Rendered value at eased `progress`
    pub fn value_at(&self, progress: f64, host: &dyn Host) -> RawValue {
        recompose(&self.from, &self.to, progress, self.round, host)
    }
}

/// What a tween sequence is built against
pub(crate) struct TweenContext<'a> {
    pub host: &'a mut dyn Host,
    pub registry: &'a mut Registry,
    pub animatable: Animatable,
    /// Sanitized property name
    pub property: &'a str,
    /// Decomposed value of the property before animating
    pub original: DecomposedValue,
}

impl TweenContext<'_> {
    fn resolve(&mut self, value: &KeyValue) -> Value {
        let Animatable {
            target,
            index,
            total,
        } = self.animatable;
        match value {
            KeyValue::Fixed(value) => value.clone(),
            KeyValue::PerTarget(f) => match f(target, index, total) {
                Value::Number(n) if !n.is_finite() => Value::Number(0.0),
                value => value,
            },
            KeyValue::DashOffset => Value::Number(set_dashoffset(self.host, target)),
        }
    }

    fn param(&self, param: &Param) -> f64 {
        let Animatable {
            target,
            index,
            total,
        } = self.animatable;
        param.resolve(target, index, total)
    }
}

/// Build the tween sequence for one property of one target
pub(crate) fn build_tweens(specs: &[KeyframeSpec], cx: &mut TweenContext<'_>) -> Tweens {
    let mut tweens = Tweens::new();

    for spec in specs {
        let prev_to = tweens.last().map(|t: &Tween| t.to.clone());
        let base = prev_to.as_ref().unwrap_or(&cx.original).clone();

        let (mut from, from_op, mut to, to_op) = match &spec.value {
            Some(KeyframeValue::FromTo(a, b)) => {
                let (mut from, from_op) = decompose(&cx.resolve(a));
                let (to, to_op) = decompose(&cx.resolve(b));
                if let (DecomposedValue::Number(number), DecomposedValue::Unit { unit, .. }) =
                    (&from, &base)
                {
                    from = DecomposedValue::Unit {
                        number: *number,
                        unit: unit.clone(),
                    };
                }
                (from, from_op, to, to_op)
            }
            Some(KeyframeValue::To(value)) => {
                let (to, to_op) = decompose(&cx.resolve(value));
                (base.clone(), None, to, to_op)
            }
            None => (base.clone(), None, base.clone(), None),
        };

        if let Some(op) = from_op {
            from.set_number(op.apply(base.number(), from.number()));
        }
        if let Some(op) = to_op {
            to.set_number(op.apply(from.number(), to.number()));
        }

        reconcile(&mut from, &mut to);
        convert_units(cx, &mut from, &mut to);
        pad_parts(&mut from, &to);

        if let DecomposedValue::Path { path, .. } = &mut to {
            path.target_inside_svg = cx.host.is_svg(cx.animatable.target);
        }

        let duration = match cx.param(&spec.duration) {
            d if d > 0.0 => d,
            _ => MIN_DURATION,
        };
        let delay = cx.param(&spec.delay);
        let end_delay = cx.param(&spec.end_delay);
        let start = tweens.last().map_or(0.0, |t| t.end);

        tweens.push(Tween {
            property: cx.property.to_string(),
            from,
            to,
            start,
            delay,
            duration,
            end_delay,
            end: start + delay + duration + end_delay,
            easing: spec.easing.to_easing(duration),
            round: cx.param(&spec.round),
        });
    }

    tweens
}

fn convert_units(cx: &mut TweenContext<'_>, from: &mut DecomposedValue, to: &mut DecomposedValue) {
    let (Some(from_unit), Some(to_unit)) = (from.unit(), to.unit()) else {
        return;
    };
    if from_unit == to_unit {
        return;
    }
    let target = cx.animatable.target;
    if to_unit.is_empty() {
        let unit = from_unit.to_string();
        cx.registry.convert_unit(cx.host, target, to, &unit);
    } else {
        let unit = to_unit.to_string();
        cx.registry.convert_unit(cx.host, target, from, &unit);
    }
}
