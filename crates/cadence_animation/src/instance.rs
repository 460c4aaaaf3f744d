//! Animation instances
//!
//! An [`Instance`] is the playable unit. It owns either animations (built from
//! [`AnimationParams`]) or child instances (when it is a timeline), keeps the
//! playback clock, and fires lifecycle hooks as local time moves through its
//! delay, change and end-delay phases.
//!
//! Instances are driven by the [`AnimationScheduler`](crate::AnimationScheduler);
//! the operations here that write property values take a [`RenderContext`]
//! borrowing the host and the target registry.

use crate::animatable::{Registry, Targets};
use crate::animation::{build_animations, Animation};
use crate::keyframe::TweenSettings;
use crate::params::AnimationParams;
use crate::timing::{Timed, Timings};
use cadence_core::{Host, LoopCount, PlayDirection, Settings, TargetId};
use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

// =============================================================================
// Hooks
// =============================================================================

/// Lifecycle points at which an instance calls back
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Hook {
    /// Local time first moves past zero
    Begin,
    /// Every progress update after `Begin`
    Update,
    /// Each loop pass starts
    LoopBegin,
    /// Each loop pass ends
    LoopComplete,
    /// Local time enters the change phase
    ChangeBegin,
    /// Every progress update inside the change phase
    Change,
    /// Local time leaves the change phase
    ChangeComplete,
    /// The last loop pass ends
    Complete,
}

impl Hook {
    pub const ALL: [Hook; 8] = [
        Hook::Begin,
        Hook::Update,
        Hook::LoopBegin,
        Hook::LoopComplete,
        Hook::ChangeBegin,
        Hook::Change,
        Hook::ChangeComplete,
        Hook::Complete,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Hook::Begin => "begin",
            Hook::Update => "update",
            Hook::LoopBegin => "loop_begin",
            Hook::LoopComplete => "loop_complete",
            Hook::ChangeBegin => "change_begin",
            Hook::Change => "change",
            Hook::ChangeComplete => "change_complete",
            Hook::Complete => "complete",
        }
    }
}

/// Hook callback; receives the instance so it can inspect or steer playback
pub type HookFn = Box<dyn FnMut(&mut Instance)>;

/// One optional callback per [`Hook`]
#[derive(Default)]
pub struct Hooks {
    slots: [Option<HookFn>; 8],
}

impl Hooks {
    pub fn set(&mut self, hook: Hook, f: impl FnMut(&mut Instance) + 'static) {
        self.slots[hook as usize] = Some(Box::new(f));
    }

    pub fn clear(&mut self, hook: Hook) {
        self.slots[hook as usize] = None;
    }

    pub fn is_set(&self, hook: Hook) -> bool {
        self.slots[hook as usize].is_some()
    }
}

impl fmt::Debug for Hooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set()
            .entries(Hook::ALL.iter().filter(|h| self.is_set(**h)).map(Hook::name))
            .finish()
    }
}

// =============================================================================
// Completion
// =============================================================================

#[derive(Debug, Default)]
struct Signal {
    done: bool,
    waker: Option<Waker>,
}

/// Future resolved when an instance completes its last loop
///
/// Each completion resolves the current future and arms a fresh one, so a
/// future taken after completion waits for the next one.
#[derive(Clone, Debug, Default)]
pub struct Finished {
    signal: Rc<RefCell<Signal>>,
}

impl Finished {
    pub fn is_done(&self) -> bool {
        self.signal.borrow().done
    }

    fn resolve(&self) {
        let mut signal = self.signal.borrow_mut();
        signal.done = true;
        if let Some(waker) = signal.waker.take() {
            waker.wake();
        }
    }
}

impl Future for Finished {
    type Output = ();

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
        let mut signal = self.signal.borrow_mut();
        if signal.done {
            Poll::Ready(())
        } else {
            signal.waker = Some(cx.waker().clone());
            Poll::Pending
        }
    }
}

// =============================================================================
// Instance
// =============================================================================

/// Host and registry borrowed while values are written
pub(crate) struct RenderContext<'a> {
    pub host: &'a mut dyn Host,
    pub registry: &'a mut Registry,
}

/// What a timeline passes on to the children added to it
#[derive(Clone, Debug, Default)]
pub(crate) struct ChildDefaults {
    pub tween: TweenSettings,
    pub targets: Option<Targets>,
}

/// A playable set of animations or child instances
pub struct Instance {
    animations: Vec<Animation>,
    pub(crate) children: Vec<Instance>,
    pub(crate) child_defaults: Option<ChildDefaults>,

    loop_count: LoopCount,
    pub(crate) direction: PlayDirection,
    pub(crate) autoplay: bool,

    pub(crate) delay: f64,
    pub(crate) duration: f64,
    pub(crate) end_delay: f64,
    pub(crate) timeline_offset: f64,

    current_time: f64,
    progress: f64,
    remaining: LoopCount,
    paused: bool,
    began: bool,
    loop_began: bool,
    change_began: bool,
    change_completed: bool,
    completed: bool,
    reversed: bool,
    reverse_playback: bool,

    start_time: Option<f64>,
    last_time: f64,
    now: f64,
    speed: f64,

    hooks: Hooks,
    finished: Finished,
}

impl fmt::Debug for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Instance")
            .field("animations", &self.animations.len())
            .field("children", &self.children.len())
            .field("duration", &self.duration)
            .field("current_time", &self.current_time)
            .field("paused", &self.paused)
            .field("completed", &self.completed)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl Instance {
    /// Build an instance from `params`. The result is not reset yet.
    pub(crate) fn build(
        params: AnimationParams,
        settings: &Settings,
        timeline_offset: f64,
        cx: &mut RenderContext<'_>,
    ) -> Self {
        let timing = params.tween.resolve(&settings.tween);
        let properties = params.property_list();
        let animatables = match &params.targets {
            Some(targets) => cx.registry.animatables(&*cx.host, targets),
            None => Vec::new(),
        };
        let animations =
            build_animations(cx.host, cx.registry, &animatables, &properties, &timing);
        let timings = Timings::aggregate(&animations).unwrap_or_else(|| Timings {
            delay: timing.delay.fixed().unwrap_or(0.0),
            duration: timing.duration.fixed().unwrap_or(0.0),
            end_delay: timing.end_delay.fixed().unwrap_or(0.0),
        });
        let loop_count = params.loop_count.unwrap_or(settings.instance.loop_count);

        Self {
            animations,
            children: Vec::new(),
            child_defaults: None,
            loop_count,
            direction: params.direction.unwrap_or(settings.instance.direction),
            autoplay: params.autoplay.unwrap_or(settings.instance.autoplay),
            delay: timings.delay,
            duration: timings.duration,
            end_delay: timings.end_delay,
            timeline_offset,
            current_time: 0.0,
            progress: 0.0,
            remaining: loop_count,
            paused: true,
            began: false,
            loop_began: false,
            change_began: false,
            change_completed: false,
            completed: false,
            reversed: false,
            reverse_playback: false,
            start_time: None,
            last_time: 0.0,
            now: 0.0,
            speed: settings.speed,
            hooks: params.hooks,
            finished: Finished::default(),
        }
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn animations(&self) -> &[Animation] {
        &self.animations
    }

    pub fn children(&self) -> &[Instance] {
        &self.children
    }

    pub fn loop_count(&self) -> LoopCount {
        self.loop_count
    }

    /// Loop passes left, including the current one
    pub fn remaining_loops(&self) -> LoopCount {
        self.remaining
    }

    pub fn direction(&self) -> PlayDirection {
        self.direction
    }

    pub fn autoplay(&self) -> bool {
        self.autoplay
    }

    pub fn delay(&self) -> f64 {
        self.delay
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn end_delay(&self) -> f64 {
        self.end_delay
    }

    pub fn timeline_offset(&self) -> f64 {
        self.timeline_offset
    }

    /// Local time, in `[0, duration]`
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// Local time as a fraction of the duration
    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    pub fn began(&self) -> bool {
        self.began
    }

    pub fn change_began(&self) -> bool {
        self.change_began
    }

    pub fn change_completed(&self) -> bool {
        self.change_completed
    }

    /// Future resolved at the next completion
    pub fn finished(&self) -> Finished {
        self.finished.clone()
    }

    pub fn hooks_mut(&mut self) -> &mut Hooks {
        &mut self.hooks
    }

    // =========================================================================
    // Playback
    // =========================================================================

    /// Stop advancing. A later play resumes from the current position.
    pub fn pause(&mut self) {
        self.paused = true;
        self.reset_time();
    }

    /// Flip the playback direction, keeping the current position
    pub fn reverse(&mut self) {
        self.toggle_direction();
        self.completed = !self.reversed;
        self.reset_time();
    }

    /// Rewind to the start (or the end when reversed) with all flags cleared
    pub(crate) fn reset(&mut self, cx: &mut RenderContext<'_>) {
        let direction = self.direction;
        self.current_time = 0.0;
        self.progress = 0.0;
        self.paused = true;
        self.began = false;
        self.loop_began = false;
        self.change_began = false;
        self.completed = false;
        self.change_completed = false;
        self.reverse_playback = false;
        self.reversed = direction == PlayDirection::Reverse;
        self.remaining = self.loop_count;
        for child in self.children.iter_mut().rev() {
            child.reset(cx);
        }
        if (self.reversed && self.loop_count != LoopCount::Infinite)
            || (direction == PlayDirection::Alternate && self.loop_count == LoopCount::Finite(1))
        {
            if let LoopCount::Finite(n) = &mut self.remaining {
                *n += 1;
            }
        }
        let time = if self.reversed { self.duration } else { 0.0 };
        self.render_animations(cx, time);
    }

    /// Prepare to resume: mark playing and rebase the clock. Returns whether
    /// the instance was paused.
    pub(crate) fn resume(&mut self, cx: &mut RenderContext<'_>) -> bool {
        if !self.paused {
            return false;
        }
        if self.completed {
            self.reset(cx);
        }
        self.paused = false;
        self.reset_time();
        true
    }

    /// Advance to engine timestamp `now`
    pub(crate) fn tick(&mut self, cx: &mut RenderContext<'_>, now: f64) {
        self.now = now;
        let start = *self.start_time.get_or_insert(now);
        self.set_progress(cx, (now + (self.last_time - start)) * self.speed);
    }

    /// Jump to local `time`, firing hooks along the way
    pub(crate) fn seek(&mut self, cx: &mut RenderContext<'_>, time: f64) {
        let engine_time = self.adjust_time(time);
        self.set_progress(cx, engine_time);
    }

    /// Jump to local `time` without firing hooks
    pub(crate) fn seek_silently(&mut self, cx: &mut RenderContext<'_>, time: f64) {
        self.sync_children(cx, time, true);
        self.render_animations(cx, time);
    }

    /// Rebase the clock after a pause or a hidden period
    pub(crate) fn reset_time(&mut self) {
        self.start_time = None;
        self.last_time = self.adjust_time(self.current_time) / self.speed;
    }

    pub(crate) fn set_speed(&mut self, speed: f64) {
        self.speed = speed;
        for child in &mut self.children {
            child.set_speed(speed);
        }
    }

    /// Drop animations of `targets`, and children left with nothing to
    /// animate. Pauses the instance if it ends up empty; an instance that
    /// never had animations is left alone.
    pub(crate) fn remove_targets(&mut self, targets: &[TargetId]) {
        for i in (0..self.children.len()).rev() {
            let child = &mut self.children[i];
            child.animations.retain(|a| !targets.contains(&a.target));
            if child.animations.is_empty() && child.children.is_empty() {
                self.children.remove(i);
            }
        }
        if self.animations.is_empty() {
            return;
        }
        self.animations.retain(|a| !targets.contains(&a.target));
        if self.animations.is_empty() && self.children.is_empty() {
            self.pause();
        }
    }

    // =========================================================================
    // Progress
    // =========================================================================

    fn adjust_time(&self, time: f64) -> f64 {
        if self.reversed {
            self.duration - time
        } else {
            time
        }
    }

    fn toggle_direction(&mut self) {
        if self.direction != PlayDirection::Alternate {
            self.direction = if self.direction != PlayDirection::Forward {
                PlayDirection::Forward
            } else {
                PlayDirection::Reverse
            };
        }
        self.reversed = !self.reversed;
        for child in &mut self.children {
            child.reversed = self.reversed;
        }
    }

    fn fire(&mut self, hook: Hook) {
        let slot = hook as usize;
        if let Some(mut f) = self.hooks.slots[slot].take() {
            f(self);
            if self.hooks.slots[slot].is_none() {
                self.hooks.slots[slot] = Some(f);
            }
        }
    }

    fn sync_children(&mut self, cx: &mut RenderContext<'_>, time: f64, silent: bool) {
        let len = self.children.len();
        for n in 0..len {
            let i = if self.reverse_playback { len - 1 - n } else { n };
            let child = &mut self.children[i];
            let child_time = time - child.timeline_offset;
            if silent {
                child.seek_silently(cx, child_time);
            } else {
                child.seek(cx, child_time);
            }
        }
    }

    fn render_animations(&mut self, cx: &mut RenderContext<'_>, time: f64) {
        for animation in &mut self.animations {
            animation.render(time, cx.host, cx.registry);
        }
    }

    fn count_iteration(&mut self) {
        if let LoopCount::Finite(n) = &mut self.remaining {
            *n = n.saturating_sub(1);
        }
    }

    fn set_progress(&mut self, cx: &mut RenderContext<'_>, engine_time: f64) {
        let duration = self.duration;
        let delay = self.delay;
        let change_end = duration - self.end_delay;
        let time = self.adjust_time(engine_time);

        self.progress = (time / duration).clamp(0.0, 1.0);
        self.reverse_playback = time < self.current_time;
        self.sync_children(cx, time, false);

        if !self.began && self.current_time > 0.0 {
            self.began = true;
            self.fire(Hook::Begin);
        }
        if !self.loop_began && self.current_time > 0.0 {
            self.loop_began = true;
            self.fire(Hook::LoopBegin);
        }
        if time <= delay && self.current_time != 0.0 {
            self.render_animations(cx, 0.0);
        }
        if (time >= change_end && self.current_time != duration) || duration == 0.0 {
            self.render_animations(cx, duration);
        }
        if time > delay && time < change_end {
            if !self.change_began {
                self.change_began = true;
                self.change_completed = false;
                self.fire(Hook::ChangeBegin);
            }
            self.fire(Hook::Change);
            self.render_animations(cx, time);
        } else if self.change_began {
            self.change_completed = true;
            self.change_began = false;
            self.fire(Hook::ChangeComplete);
        }
        self.current_time = time.max(0.0).min(duration);
        if self.began {
            self.fire(Hook::Update);
        }

        if engine_time >= duration {
            self.last_time = 0.0;
            self.count_iteration();
            if self.remaining == LoopCount::Finite(0) {
                self.paused = true;
                if !self.completed {
                    self.completed = true;
                    self.fire(Hook::LoopComplete);
                    self.fire(Hook::Complete);
                    tracing::debug!(duration, "instance completed");
                    let finished = std::mem::take(&mut self.finished);
                    finished.resolve();
                }
            } else {
                self.start_time = Some(self.now);
                self.fire(Hook::LoopComplete);
                self.loop_began = false;
                if self.direction == PlayDirection::Alternate {
                    self.toggle_direction();
                }
            }
        }
    }
}

impl Timed for Instance {
    fn timeline_offset(&self) -> f64 {
        self.timeline_offset
    }

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
