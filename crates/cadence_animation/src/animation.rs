//! Animations
//!
//! An animation drives one property of one target through its tweens. For
//! every target, every requested property that the host can classify becomes
//! one animation; properties it cannot are logged and skipped.

use crate::animatable::{Animatable, Registry};
use crate::keyframe::{normalize, PropertyValue, TweenTiming};
use crate::timing::Timed;
use crate::tween::{build_tweens, Tween, TweenContext, Tweens};
use crate::value::decompose;
use cadence_core::{Host, PropertyKind, RawValue, TargetId};

/// One property of one target, animated through a tween sequence
#[derive(Clone, Debug)]
pub struct Animation {
    pub target: TargetId,
    /// Property name as written to the target
    pub property: String,
    pub kind: PropertyKind,
    pub tweens: Tweens,
    /// Delay of the first tween
    pub delay: f64,
    /// End of the last tween
    pub duration: f64,
    /// End delay of the last tween
    pub end_delay: f64,
    /// Set on the last transform animation of each target, which serializes
    /// the target's whole transform list when it renders.
    pub render_transforms: bool,
    /// The value most recently written
    pub current_value: Option<RawValue>,
}

impl Animation {
    /// The tween active at local `time`: the first that has not ended, or the
    /// last one.
    pub fn tween_at(&self, time: f64) -> Option<&Tween> {
        if self.tweens.len() > 1 {
            if let Some(tween) = self.tweens.iter().find(|t| time < t.end) {
                return Some(tween);
            }
        }
        self.tweens.last()
    }

    /// Render this animation at local `time` and write the value back
    pub(crate) fn render(&mut self, time: f64, host: &mut dyn Host, registry: &mut Registry) {
        let Some(tween) = self.tween_at(time) else {
            return;
        };
        let value = tween.value_at(tween.progress_at(time), host);
        registry.write_value(
            host,
            self.target,
            &self.property,
            self.kind,
            value.clone(),
            self.render_transforms,
        );
        self.current_value = Some(value);
    }
}

impl Timed for Animation {
    fn delay(&self) -> f64 {
        self.delay
    }

    fn duration(&self) -> f64 {
        self.duration
    }

    fn end_delay(&self) -> f64 {
        self.end_delay
    }
}

/// Build animations for every target and property, targets first
pub(crate) fn build_animations(
    host: &mut dyn Host,
    registry: &mut Registry,
    animatables: &[Animatable],
    properties: &[(String, PropertyValue)],
    timing: &TweenTiming,
) -> Vec<Animation> {
    let mut animations = Vec::new();

    for animatable in animatables {
        let target = animatable.target;
        let mut last_transform = None;

        for (name, value) in properties {
            let kind = match host.classify(target, name) {
                Ok(kind) => kind,
                Err(err) => {
                    tracing::warn!(%err, "skipping property");
                    continue;
                }
            };
            let property = registry.sanitize_property_name(host, target, name, kind);
            let specs = normalize(value, timing);
            if specs.is_empty() {
                tracing::warn!(%target, property = %name, "no keyframes; skipping property");
                continue;
            }

            let original = registry.original_value(host, target, &property, kind);
            let mut cx = TweenContext {
                host: &mut *host,
                registry: &mut *registry,
                animatable: *animatable,
                property: &property,
                original: decompose(&original).0,
            };
            let tweens = build_tweens(&specs, &mut cx);
            let (Some(first), Some(last)) = (tweens.first(), tweens.last()) else {
                continue;
            };

            if kind == PropertyKind::Transform {
                last_transform = Some(animations.len());
            }
            tracing::debug!(
                %target,
                property = %property,
                tweens = tweens.len(),
                duration = last.end,
                "built animation"
            );
            animations.push(Animation {
                target,
                delay: first.delay,
                duration: last.end,
                end_delay: last.end_delay,
                property,
                kind,
                tweens,
                render_transforms: false,
                current_value: None,
            });
        }

        if let Some(index) = last_transform {
            animations[index].render_transforms = true;
        }
    }

    animations
}
