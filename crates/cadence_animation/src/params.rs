//! Animation parameters
//!
//! [`AnimationParams`] collects everything needed to build an instance:
//! targets, animated properties, tween settings, playback settings and
//! lifecycle hooks.
//!
//! ```rust
//! use cadence_animation::{AnimationParams, Keyframe, PlayDirection};
//!
//! let params = AnimationParams::new()
//!     .targets(".square")
//!     .prop("translateX", 250)
//!     .prop("opacity", Keyframe::from_to(0, 1).duration(400))
//!     .duration(800)
//!     .easing("easeInOutQuad")
//!     .direction(PlayDirection::Alternate)
//!     .loop_count(3)
//!     .on_complete(|instance| assert!(instance.is_completed()));
//! ```

use crate::animatable::Targets;
use crate::instance::{Hook, Hooks, Instance};
use crate::keyframe::{
    flatten_keyframes, EasingParam, MultiKeyframe, Param, PropertyValue, TweenSettings,
};
use cadence_core::{LoopCount, PlayDirection};
use indexmap::IndexMap;

/// Parameters for one animation instance
#[derive(Debug, Default)]
pub struct AnimationParams {
    pub targets: Option<Targets>,
    /// Animated properties, in declaration order
    pub properties: IndexMap<String, PropertyValue>,
    /// Keyframes that each set several properties
    pub keyframes: Vec<MultiKeyframe>,
    pub tween: TweenSettings,
    pub loop_count: Option<LoopCount>,
    pub direction: Option<PlayDirection>,
    pub autoplay: Option<bool>,
    pub hooks: Hooks,
}

impl AnimationParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn targets(mut self, targets: impl Into<Targets>) -> Self {
        self.targets = Some(targets.into());
        self
    }

    /// Animate `name` through `value`
    pub fn prop(mut self, name: &str, value: impl Into<PropertyValue>) -> Self {
        self.properties.insert(name.to_string(), value.into());
        self
    }

    pub fn keyframes(mut self, keyframes: Vec<MultiKeyframe>) -> Self {
        self.keyframes = keyframes;
        self
    }

    pub fn duration(mut self, duration: impl Into<Param>) -> Self {
        self.tween.duration = Some(duration.into());
        self
    }

    pub fn delay(mut self, delay: impl Into<Param>) -> Self {
        self.tween.delay = Some(delay.into());
        self
    }

    pub fn end_delay(mut self, end_delay: impl Into<Param>) -> Self {
        self.tween.end_delay = Some(end_delay.into());
        self
    }

    pub fn easing(mut self, easing: impl Into<EasingParam>) -> Self {
        self.tween.easing = Some(easing.into());
        self
    }

    pub fn round(mut self, round: impl Into<Param>) -> Self {
        self.tween.round = Some(round.into());
        self
    }

    pub fn loop_count(mut self, loop_count: impl Into<LoopCount>) -> Self {
        self.loop_count = Some(loop_count.into());
        self
    }

    pub fn direction(mut self, direction: PlayDirection) -> Self {
        self.direction = Some(direction);
        self
    }

    pub fn autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = Some(autoplay);
        self
    }

    /// Register a lifecycle hook
    pub fn on(mut self, hook: Hook, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.hooks.set(hook, f);
        self
    }

    pub fn on_begin(self, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.on(Hook::Begin, f)
    }

    pub fn on_update(self, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.on(Hook::Update, f)
    }

    pub fn on_loop_begin(self, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.on(Hook::LoopBegin, f)
    }

    pub fn on_loop_complete(self, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.on(Hook::LoopComplete, f)
    }

    pub fn on_change_begin(self, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.on(Hook::ChangeBegin, f)
    }

    pub fn on_change(self, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.on(Hook::Change, f)
    }

    pub fn on_change_complete(self, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.on(Hook::ChangeComplete, f)
    }

    pub fn on_complete(self, f: impl FnMut(&mut Instance) + 'static) -> Self {
        self.on(Hook::Complete, f)
    }

    /// Properties to animate: those from `keyframes` first, then the
    /// directly declared ones not already covered.
    pub(crate) fn property_list(&self) -> Vec<(String, PropertyValue)> {
        let mut list = flatten_keyframes(&self.keyframes);
        for (name, value) in &self.properties {
            if !list.iter().any(|(n, _)| n == name) {
                list.push((name.clone(), value.clone()));
            }
        }
        list
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keyframe::Keyframe;

    #[test]
    fn test_keyframes_come_first() {
        let params = AnimationParams::new()
            .prop("opacity", 1)
            .prop("x", 5)
            .keyframes(vec![
                MultiKeyframe::new().set("x", 10),
                MultiKeyframe::new().set("y", 20),
            ]);
        let names: Vec<_> = params
            .property_list()
            .into_iter()
            .map(|(name, _)| name)
            .collect();
        assert_eq!(names, vec!["x", "y", "opacity"]);
    }

    #[test]
    fn test_builder_sets_fields() {
        let params = AnimationParams::new()
            .targets(".box")
            .prop("x", Keyframe::to(10))
            .duration(500)
            .loop_count(true)
            .direction(PlayDirection::Reverse)
            .autoplay(false)
            .on_begin(|_| {});
        assert_eq!(params.targets, Some(Targets::Selector(".box".to_string())));
        assert_eq!(params.tween.duration.as_ref().and_then(Param::fixed), Some(500.0));
        assert_eq!(params.loop_count, Some(LoopCount::Infinite));
        assert_eq!(params.direction, Some(PlayDirection::Reverse));
        assert_eq!(params.autoplay, Some(false));
        assert!(params.hooks.is_set(Hook::Begin));
        assert!(!params.hooks.is_set(Hook::Complete));
    }
}
