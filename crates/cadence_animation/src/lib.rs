//! Cadence Animation Engine
//!
//! Property interpolation, tween sequencing, and timeline orchestration,
//! driven by a host-supplied frame clock.
//!
//! # Features
//!
//! - **Value Model**: numbers, unit values, colors, motion paths and mixed
//!   text decomposed into interpolatable parts
//! - **Keyframes**: per-property or multi-property keyframes with inherited
//!   timing and relative values (`+=`, `-=`, `*=`)
//! - **Easing**: Penner curves, cubic Bézier, steps, and physical springs
//! - **Instances**: play, pause, seek, reverse, loop and alternate, with
//!   lifecycle hooks and a completion future
//! - **Timelines**: children placed at absolute, chained or relative offsets
//! - **Stagger**: values fanned out across targets by index or grid distance
//!
//! # Example
//!
//! ```rust
//! use cadence_animation::{AnimationParams, AnimationScheduler};
//! use cadence_core::{MemoryHost, RawValue};
//!
//! let mut host = MemoryHost::new();
//! let ball = host.add_object([("x", 0.0)]);
//! let mut scheduler = AnimationScheduler::new(host);
//!
//! let id = scheduler.animate(
//!     AnimationParams::new()
//!         .targets(ball)
//!         .prop("x", 100)
//!         .duration(1000)
//!         .easing("linear"),
//! );
//!
//! scheduler.frame(0.0);
//! scheduler.frame(250.0);
//! assert_eq!(scheduler.host().field(ball, "x"), Some(&RawValue::Number(25.0)));
//! assert_eq!(scheduler.instance(id).map(|i| i.progress()), Some(0.25));
//! ```

pub mod animatable;
pub mod animation;
pub mod color;
pub mod easing;
pub mod instance;
pub mod keyframe;
pub mod params;
pub mod path;
pub mod scheduler;
pub mod spring;
pub mod stagger;
pub mod timeline;
pub mod timing;
pub mod tween;
pub mod value;

pub use animatable::{Animatable, Registry, Targets};
pub use animation::Animation;
pub use easing::{Curve, Easing, EasingError};
pub use instance::{Finished, Hook, HookFn, Hooks, Instance};
pub use keyframe::{
    EasingParam, KeyValue, Keyframe, KeyframeValue, MultiKeyframe, Param, PropertyValue,
    TweenSettings,
};
pub use params::AnimationParams;
pub use path::{set_dashoffset, MotionPath, PathMotion, PathProperty};
pub use scheduler::{AnimationScheduler, InstanceId};
pub use spring::SpringConfig;
pub use stagger::{Axis, Stagger, StaggerFrom, StaggerValue};
pub use timeline::TimelineOffset;
pub use timing::{Timed, Timings};
pub use tween::Tween;
pub use value::{decompose, DecomposedValue, RelativeOperator, Value, ValueType, MIN_DURATION};

pub use cadence_core::{LoopCount, PlayDirection, Settings};
