//! Timeline orchestration for multiple animations
//!
//! A timeline is an instance whose children are instances placed at time
//! offsets. Children inherit the timeline's targets and tween settings unless
//! they set their own, and always play in the timeline's direction.
//!
//! ```rust
//! use cadence_animation::{AnimationParams, AnimationScheduler};
//! use cadence_core::MemoryHost;
//!
//! let mut host = MemoryHost::new();
//! let ball = host.add_object([("x", 0.0), ("y", 0.0)]);
//! let mut scheduler = AnimationScheduler::new(host);
//!
//! let tl = scheduler.timeline(AnimationParams::new().targets(ball).duration(500));
//! scheduler
//!     .add(tl, AnimationParams::new().prop("x", 100), ())
//!     .add(tl, AnimationParams::new().prop("y", 50), "-=250");
//!
//! let timeline = scheduler.instance(tl).unwrap();
//! assert_eq!(timeline.children()[1].timeline_offset(), 250.0);
//! assert_eq!(timeline.duration(), 750.0);
//! ```

use crate::instance::{ChildDefaults, Instance, RenderContext};
use crate::params::AnimationParams;
use crate::scheduler::{AnimationScheduler, InstanceId};
use crate::timing::Timings;
use crate::value::{parse_float, RelativeOperator};
use cadence_core::Host;

/// Where a child starts on its timeline
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub enum TimelineOffset {
    /// Right after the current end of the timeline
    #[default]
    After,
    /// At an absolute time
    At(f64),
    /// Relative to the current end of the timeline
    Relative(RelativeOperator, f64),
}

impl TimelineOffset {
    /// Offset in milliseconds on a timeline currently `duration` long
    pub fn resolve(&self, duration: f64) -> f64 {
        match self {
            TimelineOffset::After => duration,
            TimelineOffset::At(time) => *time,
            TimelineOffset::Relative(op, operand) => op.apply(duration, *operand),
        }
    }
}

impl From<()> for TimelineOffset {
    fn from(_: ()) -> Self {
        TimelineOffset::After
    }
}

impl From<f64> for TimelineOffset {
    fn from(time: f64) -> Self {
        TimelineOffset::At(time)
    }
}

impl From<i32> for TimelineOffset {
    fn from(time: i32) -> Self {
        TimelineOffset::At(time as f64)
    }
}

impl From<Option<f64>> for TimelineOffset {
    fn from(time: Option<f64>) -> Self {
        time.map_or(TimelineOffset::After, TimelineOffset::At)
    }
}

/// `"+=20"`, `"-=50"` and `"*=2"` are relative; plain numbers are absolute.
/// Anything else places the child after the current end.
impl From<&str> for TimelineOffset {
    fn from(text: &str) -> Self {
        let (op, rest) = RelativeOperator::strip(text.trim());
        match (op, parse_float(rest)) {
            (Some(op), Some(operand)) => TimelineOffset::Relative(op, operand),
            (None, Some(time)) => TimelineOffset::At(time),
            _ => {
                tracing::warn!(offset = text, "unparseable timeline offset; appending");
                TimelineOffset::After
            }
        }
    }
}

impl<H: Host> AnimationScheduler<H> {
    /// Create an empty timeline. `params` provides the playback settings and
    /// the defaults its children inherit.
    pub fn timeline(&mut self, params: AnimationParams) -> InstanceId {
        let defaults = ChildDefaults {
            tween: params.tween.clone(),
            targets: params.targets.clone(),
        };
        let mut cx = RenderContext {
            host: &mut self.host,
            registry: &mut self.registry,
        };
        let mut timeline = Instance::build(params, &self.settings, 0.0, &mut cx);
        timeline.duration = 0.0;
        timeline.child_defaults = Some(defaults);
        timeline.reset(&mut cx);
        let id = self.instances.insert(timeline);
        self.launch(id);
        id
    }

    /// Append a child built from `params` at `offset`, then rewind the
    /// timeline and restart it if it autoplays.
    pub fn add(
        &mut self,
        timeline: InstanceId,
        mut params: AnimationParams,
        offset: impl Into<TimelineOffset>,
    ) -> &mut Self {
        self.active.retain(|id| *id != timeline);
        let Some(tl) = self.instances.get_mut(timeline) else {
            tracing::warn!(?timeline, "no such timeline");
            return self;
        };
        let mut cx = RenderContext {
            host: &mut self.host,
            registry: &mut self.registry,
        };

        let defaults = tl.child_defaults.clone().unwrap_or_default();
        params.tween = params.tween.or(&defaults.tween);
        if params.targets.is_none() {
            params.targets = defaults.targets;
        }
        params.autoplay = Some(false);
        params.direction = Some(tl.direction);

        let offset = offset.into().resolve(tl.duration);
        tl.seek_silently(&mut cx, offset);
        let mut child = Instance::build(params, &self.settings, offset, &mut cx);
        child.reset(&mut cx);
        tl.children.push(child);

        if let Some(timings) = Timings::aggregate(&tl.children) {
            tl.delay = timings.delay;
            tl.duration = timings.duration;
            tl.end_delay = timings.end_delay;
        }
        tracing::debug!(
            offset,
            children = tl.children.len(),
            duration = tl.duration,
            "timeline child added"
        );
        tl.seek_silently(&mut cx, 0.0);
        tl.reset(&mut cx);

        if tl.autoplay {
            self.play(timeline);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_parsing() {
        assert_eq!(TimelineOffset::from(()), TimelineOffset::After);
        assert_eq!(TimelineOffset::from(50), TimelineOffset::At(50.0));
        assert_eq!(TimelineOffset::from("120"), TimelineOffset::At(120.0));
        assert_eq!(
            TimelineOffset::from("+=20"),
            TimelineOffset::Relative(RelativeOperator::Add, 20.0)
        );
        assert_eq!(
            TimelineOffset::from("*=2"),
            TimelineOffset::Relative(RelativeOperator::Multiply, 2.0)
        );
        assert_eq!(TimelineOffset::from("soon"), TimelineOffset::After);
    }

    #[test]
    fn test_offset_resolution() {
        assert_eq!(TimelineOffset::After.resolve(30.0), 30.0);
        assert_eq!(TimelineOffset::At(5.0).resolve(30.0), 5.0);
        assert_eq!(TimelineOffset::from("+=20").resolve(0.0), 20.0);
        assert_eq!(TimelineOffset::from("*=2").resolve(30.0), 60.0);
        assert_eq!(TimelineOffset::from("-=50").resolve(70.0), 20.0);
    }
}
