//! Animation scheduler
//!
//! Owns the host, every instance, and the list of playing instances, and
//! advances the playing ones once per host frame.
//!
//! The host drives the loop: after the scheduler asks for a frame with
//! [`Host::request_frame`], the host calls [`AnimationScheduler::frame`] with
//! a timestamp in milliseconds. The scheduler keeps asking for frames while
//! anything is playing and goes dormant otherwise.

use crate::animatable::{Registry, Targets};
use crate::instance::{Finished, Instance, RenderContext};
use crate::params::AnimationParams;
use crate::value::{decompose, Value, ValueType, MIN_DURATION};
use cadence_core::{
    format_number, FrameHandle, Host, RawValue, Settings, SettingsError, TargetId,
};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct InstanceId;
}

/// Drives every instance from the host's frame clock
pub struct AnimationScheduler<H: Host> {
    pub(crate) host: H,
    pub(crate) settings: Settings,
    pub(crate) registry: Registry,
    pub(crate) instances: SlotMap<InstanceId, Instance>,
    /// Playing instances, in the order they started
    pub(crate) active: Vec<InstanceId>,
    frame: Option<FrameHandle>,
}

impl<H: Host> AnimationScheduler<H> {
    pub fn new(host: H) -> Self {
        Self::with_settings(host, Settings::default())
    }

    pub fn with_settings(host: H, settings: Settings) -> Self {
        Self {
            host,
            settings,
            registry: Registry::new(),
            instances: SlotMap::with_key(),
            active: Vec::new(),
            frame: None,
        }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Change the global playback rate. Rates that are not positive and
    /// finite are rejected and leave every instance untouched.
    pub fn set_speed(&mut self, speed: f64) -> Result<(), SettingsError> {
        if let Err(err) = Settings::validate_speed(speed) {
            tracing::warn!(%err, "ignoring playback speed");
            return Err(err);
        }
        self.settings.speed = speed;
        for (_, instance) in self.instances.iter_mut() {
            instance.set_speed(speed);
        }
        Ok(())
    }

    pub fn set_suspend_when_hidden(&mut self, suspend: bool) {
        self.settings.suspend_when_hidden = suspend;
    }

    pub fn instance(&self, id: InstanceId) -> Option<&Instance> {
        self.instances.get(id)
    }

    pub fn instance_mut(&mut self, id: InstanceId) -> Option<&mut Instance> {
        self.instances.get_mut(id)
    }

    /// Drop an instance entirely
    pub fn remove_instance(&mut self, id: InstanceId) -> Option<Instance> {
        self.active.retain(|active| *active != id);
        self.instances.remove(id)
    }

    /// Playing instances, in the order they are advanced
    pub fn running(&self) -> &[InstanceId] {
        &self.active
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }

    /// Whether a frame has been requested and not yet delivered
    pub fn is_armed(&self) -> bool {
        self.frame.is_some()
    }

    pub fn finished(&self, id: InstanceId) -> Option<Finished> {
        self.instances.get(id).map(Instance::finished)
    }

    // =========================================================================
    // Creation
    // =========================================================================

    /// Build an instance and start it unless `autoplay` is off
    pub fn animate(&mut self, params: AnimationParams) -> InstanceId {
        let mut cx = RenderContext {
            host: &mut self.host,
            registry: &mut self.registry,
        };
        let mut instance = Instance::build(params, &self.settings, 0.0, &mut cx);
        instance.reset(&mut cx);
        tracing::debug!(
            animations = instance.animations().len(),
            duration = instance.duration(),
            "instance created"
        );
        let id = self.instances.insert(instance);
        self.launch(id);
        id
    }

    /// Apply end values of `params` to `targets` immediately
    pub fn set(&mut self, targets: impl Into<Targets>, params: AnimationParams) -> InstanceId {
        self.animate(params.targets(targets).duration(0))
    }

    /// Current value of `property` on the first of `targets`, optionally
    /// converted to `unit`
    pub fn get(
        &mut self,
        targets: impl Into<Targets>,
        property: &str,
        unit: Option<&str>,
    ) -> Option<RawValue> {
        let target = *targets.into().resolve(&self.host).first()?;
        let kind = match self.host.classify(target, property) {
            Ok(kind) => kind,
            Err(err) => {
                tracing::warn!(%err, "can't read property");
                return None;
            }
        };
        let name = self
            .registry
            .sanitize_property_name(&self.host, target, property, kind);
        let value = self.registry.original_value(&self.host, target, &name, kind);

        if let Some(unit) = unit {
            let (mut decomposed, _) = decompose(&value);
            if matches!(decomposed.kind(), ValueType::Number | ValueType::Unit) {
                self.registry
                    .convert_unit(&self.host, target, &mut decomposed, unit);
                return Some(RawValue::Text(format!(
                    "{}{}",
                    format_number(decomposed.number()),
                    decomposed.unit().unwrap_or_default()
                )));
            }
        }
        Some(match value {
            Value::Number(n) => RawValue::Number(n),
            Value::Text(text) => RawValue::Text(text),
            Value::Path(path) => RawValue::Number(path.total_length),
        })
    }

    pub(crate) fn launch(&mut self, id: InstanceId) {
        let Some(instance) = self.instances.get(id) else {
            return;
        };
        if !instance.autoplay() {
            return;
        }
        if instance.duration() == MIN_DURATION {
            self.seek(id, MIN_DURATION);
        } else {
            self.play(id);
        }
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Start or resume an instance; a completed one restarts from the top
    pub fn play(&mut self, id: InstanceId) {
        let mut cx = RenderContext {
            host: &mut self.host,
            registry: &mut self.registry,
        };
        let Some(instance) = self.instances.get_mut(id) else {
            return;
        };
        if !instance.resume(&mut cx) {
            return;
        }
        if !self.active.contains(&id) {
            self.active.push(id);
        }
        self.start_engine();
    }

    pub fn pause(&mut self, id: InstanceId) {
        if let Some(instance) = self.instances.get_mut(id) {
            instance.pause();
        }
    }

    pub fn reverse(&mut self, id: InstanceId) {
        if let Some(instance) = self.instances.get_mut(id) {
            instance.reverse();
        }
    }

    /// Rewind without playing
    pub fn reset(&mut self, id: InstanceId) {
        let mut cx = RenderContext {
            host: &mut self.host,
            registry: &mut self.registry,
        };
        if let Some(instance) = self.instances.get_mut(id) {
            instance.reset(&mut cx);
        }
    }

    pub fn restart(&mut self, id: InstanceId) {
        self.reset(id);
        self.play(id);
    }

    /// Jump to local `time`, firing hooks
    pub fn seek(&mut self, id: InstanceId, time: f64) {
        let mut cx = RenderContext {
            host: &mut self.host,
            registry: &mut self.registry,
        };
        if let Some(instance) = self.instances.get_mut(id) {
            instance.seek(&mut cx, time);
        }
    }

    /// Stop animating `targets` in every playing instance
    pub fn remove(&mut self, targets: impl Into<Targets>) {
        let targets = targets.into().resolve(&self.host);
        for id in self.active.iter().rev() {
            if let Some(instance) = self.instances.get_mut(*id) {
                instance.remove_targets(&targets);
            }
        }
    }

    /// Stop animating `targets` in one instance
    pub fn remove_from(&mut self, id: InstanceId, targets: impl Into<Targets>) {
        let targets: Vec<TargetId> = targets.into().resolve(&self.host);
        if let Some(instance) = self.instances.get_mut(id) {
            instance.remove_targets(&targets);
        }
    }

    // =========================================================================
    // Engine
    // =========================================================================

    fn start_engine(&mut self) {
        let suspended = self.settings.suspend_when_hidden && self.host.is_hidden();
        if self.frame.is_none() && !suspended && !self.active.is_empty() {
            self.frame = Some(self.host.request_frame());
            tracing::debug!(active = self.active.len(), "engine armed");
        }
    }

    /// Advance every playing instance to timestamp `now` (milliseconds).
    ///
    /// Instances found paused are dropped from the playing list as the pass
    /// reaches them, including ones paused by a hook earlier in the same pass.
    pub fn frame(&mut self, now: f64) {
        self.frame = None;
        let mut cx = RenderContext {
            host: &mut self.host,
            registry: &mut self.registry,
        };

        let mut len = self.active.len();
        let mut i = 0;
        while i < len {
            match self.instances.get_mut(self.active[i]) {
                Some(instance) if !instance.is_paused() => {
                    instance.tick(&mut cx, now);
                    i += 1;
                }
                _ => {
                    self.active.remove(i);
                    len -= 1;
                }
            }
        }
        tracing::trace!(now, advanced = i, "frame");

        if i > 0 {
            self.frame = Some(self.host.request_frame());
        } else {
            tracing::debug!("engine dormant");
        }
    }

    /// Call when the host's visibility changes. Hiding suspends the frame
    /// loop; showing rebases every playing instance's clock so the hidden
    /// period is skipped, then resumes.
    pub fn visibility_changed(&mut self) {
        if self.host.is_hidden() {
            if !self.settings.suspend_when_hidden {
                return;
            }
            if let Some(handle) = self.frame.take() {
                self.host.cancel_frame(handle);
                tracing::debug!("engine suspended while hidden");
            }
        } else {
            for id in &self.active {
                if let Some(instance) = self.instances.get_mut(*id) {
                    instance.reset_time();
                }
            }
            tracing::debug!(active = self.active.len(), "engine resumed");
            self.start_engine();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_core::MemoryHost;

    fn scheduler() -> (AnimationScheduler<MemoryHost>, TargetId) {
        let mut host = MemoryHost::new();
        let obj = host.add_object([("x", 0.0)]);
        (AnimationScheduler::new(host), obj)
    }

    fn linear(target: TargetId) -> AnimationParams {
        AnimationParams::new()
            .targets(target)
            .prop("x", 100)
            .duration(100)
            .easing("linear")
    }

    #[test]
    fn test_autoplay_arms_engine() {
        let (mut scheduler, obj) = scheduler();
        let id = scheduler.animate(linear(obj));
        assert_eq!(scheduler.running(), &[id]);
        assert!(scheduler.is_armed());
        assert!(scheduler.host().has_pending_frame());
    }

    #[test]
    fn test_engine_goes_dormant() {
        let (mut scheduler, obj) = scheduler();
        let id = scheduler.animate(linear(obj));
        scheduler.frame(0.0);
        scheduler.frame(100.0);
        assert!(scheduler.instance(id).unwrap().is_completed());
        // still listed until the next pass sees it paused
        assert!(scheduler.is_armed());
        scheduler.frame(116.0);
        assert!(scheduler.running().is_empty());
        assert!(!scheduler.is_armed());
    }

    #[test]
    fn test_play_twice_registers_once() {
        let (mut scheduler, obj) = scheduler();
        let id = scheduler.animate(linear(obj).autoplay(false));
        assert!(scheduler.running().is_empty());
        scheduler.play(id);
        scheduler.pause(id);
        scheduler.play(id);
        assert_eq!(scheduler.running(), &[id]);
    }

    #[test]
    fn test_zero_duration_applies_immediately() {
        let (mut scheduler, obj) = scheduler();
        let id = scheduler.set(obj, AnimationParams::new().prop("x", 42));
        assert_eq!(scheduler.host().field(obj, "x"), Some(&RawValue::Number(42.0)));
        assert!(scheduler.running().is_empty());
        assert!(scheduler.instance(id).unwrap().is_completed());
    }

    #[test]
    fn test_get_with_unit() {
        let mut host = MemoryHost::new();
        let el = host.add_element();
        host.set_style(el, "width", "32px");
        let mut scheduler = AnimationScheduler::new(host);
        assert_eq!(
            scheduler.get(el, "width", None),
            Some(RawValue::Text("32px".to_string()))
        );
        assert_eq!(
            scheduler.get(el, "width", Some("rem")),
            Some(RawValue::Text("2rem".to_string()))
        );
        assert_eq!(scheduler.get(el, "nonsense", None), None);
    }

    #[test]
    fn test_speed_scales_time() {
        let (mut scheduler, obj) = scheduler();
        scheduler.set_speed(0.5).unwrap();
        let id = scheduler.animate(linear(obj));
        scheduler.frame(0.0);
        scheduler.frame(100.0);
        assert_eq!(scheduler.instance(id).unwrap().current_time(), 50.0);
    }

    #[test]
    fn test_invalid_speed_is_rejected() {
        let (mut scheduler, _) = scheduler();
        for speed in [0.0, -2.0, f64::NAN] {
            assert!(scheduler.set_speed(speed).is_err());
        }
        assert_eq!(scheduler.settings().speed, 1.0);
    }
}
