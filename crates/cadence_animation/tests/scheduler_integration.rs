//! Integration tests for the scheduler, instances, and timelines
//!
//! These tests verify that:
//! - Frames drive instances through their values and lifecycle
//! - The engine arms itself while anything plays and goes dormant otherwise
//! - Timelines place children at chained, absolute and relative offsets
//! - Removing targets, reversing and looping behave across frames
//! - The completion future resolves when an instance finishes

use cadence_animation::{
    spring, AnimationParams, AnimationScheduler, InstanceId, Keyframe, MultiKeyframe,
    PlayDirection, Stagger, StaggerFrom,
};
use cadence_core::{MemoryHost, RawValue, TargetId};
use std::cell::RefCell;
use std::rc::Rc;
use tracing_subscriber::EnvFilter;

/// Route engine logs to the test harness; `RUST_LOG=cadence_animation=trace`
/// shows every frame.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn object_scheduler(count: usize) -> (AnimationScheduler<MemoryHost>, Vec<TargetId>) {
    let mut host = MemoryHost::new();
    let targets = (0..count)
        .map(|_| host.add_object([("x", 0.0), ("y", 0.0)]))
        .collect();
    (AnimationScheduler::new(host), targets)
}

fn element_scheduler() -> (AnimationScheduler<MemoryHost>, TargetId) {
    let mut host = MemoryHost::new();
    let el = host.add_element();
    host.set_element_id(el, "target-id");
    (AnimationScheduler::new(host), el)
}

fn linear(target: TargetId) -> AnimationParams {
    AnimationParams::new()
        .targets(target)
        .duration(100)
        .easing("linear")
}

fn x(scheduler: &AnimationScheduler<MemoryHost>, target: TargetId) -> Option<f64> {
    scheduler.host().field(target, "x").and_then(RawValue::as_number)
}

/// Deliver frames every `step` ms while the scheduler keeps asking for them
fn run_frames(scheduler: &mut AnimationScheduler<MemoryHost>, start: f64, end: f64, step: f64) {
    let mut now = start;
    while now <= end && scheduler.host_mut().take_frame_request().is_some() {
        scheduler.frame(now);
        now += step;
    }
}

// =============================================================================
// Playback
// =============================================================================

/// Test that frames interpolate values and the engine sleeps afterwards
#[test]
fn test_frames_drive_values_until_dormant() {
    init_tracing();
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(linear(obj).prop("x", 100));

    scheduler.host_mut().take_frame_request();
    scheduler.frame(1000.0);
    scheduler.frame(1040.0);
    assert_eq!(x(&scheduler, obj), Some(40.0));

    run_frames(&mut scheduler, 1056.0, 2000.0, 16.0);
    assert_eq!(x(&scheduler, obj), Some(100.0));
    assert!(scheduler.instance(id).unwrap().is_completed());
    assert!(scheduler.running().is_empty());
    assert!(!scheduler.is_armed());
    assert!(!scheduler.host().has_pending_frame());
}

/// Test that restarting a finished instance re-arms the engine
#[test]
fn test_restart_rearms_engine() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(linear(obj).prop("x", 100));
    run_frames(&mut scheduler, 0.0, 500.0, 10.0);
    assert!(!scheduler.is_armed());

    let requests = scheduler.host().frame_requests();
    scheduler.restart(id);
    assert!(scheduler.is_armed());
    assert_eq!(scheduler.host().frame_requests(), requests + 1);
    assert_eq!(x(&scheduler, obj), Some(0.0));
}

/// Test that pausing keeps the position and play resumes from it
#[test]
fn test_pause_and_resume() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(linear(obj).prop("x", 100));
    scheduler.frame(0.0);
    scheduler.frame(30.0);
    scheduler.pause(id);
    scheduler.frame(46.0);
    assert!(scheduler.running().is_empty());

    scheduler.play(id);
    scheduler.frame(500.0);
    scheduler.frame(520.0);
    assert_eq!(scheduler.instance(id).unwrap().current_time(), 50.0);
    assert_eq!(x(&scheduler, obj), Some(50.0));
}

/// Test that a hook pausing its own instance mid-pass does not disturb the
/// other instances in the same pass
#[test]
fn test_hook_pause_during_pass() {
    let (mut scheduler, targets) = object_scheduler(2);
    let first = scheduler.animate(
        linear(targets[0])
            .prop("x", 100)
            .on_change(|instance| instance.pause()),
    );
    let second = scheduler.animate(linear(targets[1]).prop("x", 100));

    scheduler.frame(0.0);
    scheduler.frame(20.0);
    assert!(scheduler.instance(first).unwrap().is_paused());
    assert_eq!(scheduler.instance(second).unwrap().current_time(), 20.0);

    scheduler.frame(40.0);
    assert_eq!(scheduler.running(), &[second]);
    assert_eq!(x(&scheduler, targets[0]), Some(20.0));
    assert_eq!(x(&scheduler, targets[1]), Some(40.0));
}

/// Test that the completion future resolves once the instance finishes
#[test]
fn test_finished_future() {
    let (mut scheduler, targets) = object_scheduler(1);
    let id = scheduler.animate(linear(targets[0]).prop("x", 10));
    let finished = scheduler.finished(id).unwrap();
    assert!(!finished.is_done());

    run_frames(&mut scheduler, 0.0, 1000.0, 16.0);
    pollster::block_on(finished);

    // a fresh future waits for the next completion
    assert!(!scheduler.finished(id).unwrap().is_done());
    scheduler.restart(id);
    let again = scheduler.finished(id).unwrap();
    run_frames(&mut scheduler, 2000.0, 3000.0, 16.0);
    pollster::block_on(again);
}

/// Test that hiding suspends the loop and showing skips the hidden period
#[test]
fn test_visibility_suspends_and_rebases() {
    init_tracing();
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(linear(obj).prop("x", 100).duration(1000));
    scheduler.frame(0.0);
    scheduler.frame(100.0);

    scheduler.host_mut().set_hidden(true);
    scheduler.visibility_changed();
    assert!(!scheduler.is_armed());
    assert!(!scheduler.host().has_pending_frame());

    scheduler.host_mut().set_hidden(false);
    scheduler.visibility_changed();
    assert!(scheduler.is_armed());
    scheduler.frame(5000.0);
    assert_eq!(scheduler.instance(id).unwrap().current_time(), 100.0);
    scheduler.frame(5100.0);
    assert_eq!(scheduler.instance(id).unwrap().current_time(), 200.0);
}

/// Test that a hidden host keeps ticking when suspension is disabled
#[test]
fn test_visibility_without_suspension() {
    let (mut scheduler, targets) = object_scheduler(1);
    scheduler.set_suspend_when_hidden(false);
    scheduler.host_mut().set_hidden(true);
    scheduler.animate(linear(targets[0]).prop("x", 100));
    assert!(scheduler.is_armed());

    scheduler.visibility_changed();
    assert!(scheduler.is_armed());
}

// =============================================================================
// Directions and loops
// =============================================================================

/// Test that a reversed instance starts from its end values, while seeking
/// still addresses local time
#[test]
fn test_reverse_direction_starts_at_end() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(
        linear(obj)
            .prop("x", 100)
            .direction(PlayDirection::Reverse)
            .autoplay(false),
    );
    assert_eq!(x(&scheduler, obj), Some(100.0));
    scheduler.seek(id, 25.0);
    assert_eq!(x(&scheduler, obj), Some(25.0));
}

/// Test that alternating loops play forward then backward
#[test]
fn test_alternate_loop() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let loops = Rc::new(RefCell::new(0));
    let counter = loops.clone();
    let id = scheduler.animate(
        linear(obj)
            .prop("x", 100)
            .direction(PlayDirection::Alternate)
            .loop_count(2)
            .on_loop_complete(move |_| *counter.borrow_mut() += 1),
    );

    scheduler.frame(0.0);
    scheduler.frame(100.0);
    assert_eq!(x(&scheduler, obj), Some(100.0));
    assert!(scheduler.instance(id).unwrap().is_reversed());

    scheduler.frame(150.0);
    assert_eq!(x(&scheduler, obj), Some(50.0));
    scheduler.frame(200.0);
    assert_eq!(x(&scheduler, obj), Some(0.0));
    assert!(scheduler.instance(id).unwrap().is_completed());
    assert_eq!(*loops.borrow(), 2);
}

/// Test that reversing mid-flight returns to the start values
#[test]
fn test_reverse_mid_flight() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(linear(obj).prop("x", 100));
    scheduler.frame(0.0);
    scheduler.frame(40.0);
    scheduler.reverse(id);
    run_frames(&mut scheduler, 50.0, 1000.0, 16.0);

    let instance = scheduler.instance(id).unwrap();
    assert!(instance.is_completed());
    assert_eq!(instance.progress(), 0.0);
    assert_eq!(x(&scheduler, obj), Some(0.0));
}

// =============================================================================
// Keyframes and values
// =============================================================================

/// Test that keyframes share the duration and chain their values
#[test]
fn test_property_keyframes() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(
        AnimationParams::new()
            .targets(obj)
            .prop("x", vec![Keyframe::to(100), Keyframe::to(50)])
            .duration(1000)
            .easing("linear")
            .autoplay(false),
    );

    scheduler.seek(id, 250.0);
    assert_eq!(x(&scheduler, obj), Some(50.0));
    scheduler.seek(id, 750.0);
    assert_eq!(x(&scheduler, obj), Some(75.0));
    scheduler.seek(id, 1000.0);
    assert_eq!(x(&scheduler, obj), Some(50.0));
}

/// Test that multi-property keyframes hold unmentioned properties
#[test]
fn test_multi_property_keyframes() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(
        AnimationParams::new()
            .targets(obj)
            .keyframes(vec![
                MultiKeyframe::new().set("x", 100).set("y", 10),
                MultiKeyframe::new().set("x", 0),
            ])
            .duration(1000)
            .easing("linear")
            .autoplay(false),
    );

    scheduler.seek(id, 750.0);
    assert_eq!(x(&scheduler, obj), Some(50.0));
    assert_eq!(
        scheduler.host().field(obj, "y"),
        Some(&RawValue::Number(10.0))
    );
}

/// Test that transform functions are serialized together
#[test]
fn test_transforms_render_together() {
    let (mut scheduler, el) = element_scheduler();
    let id = scheduler.animate(
        AnimationParams::new()
            .targets("#target-id")
            .prop("translateX", 100)
            .prop("rotate", "1turn")
            .duration(100)
            .easing("linear")
            .autoplay(false),
    );
    scheduler.seek(id, 50.0);
    assert_eq!(
        scheduler.host().transform(el),
        Some("translateX(50px) rotate(0.5turn)")
    );
}

/// Test that colors interpolate channel-wise into rgba
#[test]
fn test_color_interpolation() {
    let (mut scheduler, el) = element_scheduler();
    scheduler.host_mut().set_style(el, "color", "#000");
    let id = scheduler.animate(
        linear(el)
            .prop("color", "#FF0000")
            .autoplay(false),
    );
    scheduler.seek(id, 50.0);
    assert_eq!(scheduler.host().style(el, "color"), Some("rgba(128,0,0,1)"));
    scheduler.seek(id, 100.0);
    assert_eq!(scheduler.host().style(el, "color"), Some("rgba(255,0,0,1)"));
}

/// Test that `set` writes end values at once and `get` reads them back
#[test]
fn test_set_and_get() {
    let (mut scheduler, el) = element_scheduler();
    scheduler.set(el, AnimationParams::new().prop("width", "48px"));
    assert_eq!(scheduler.host().style(el, "width"), Some("48px"));
    assert_eq!(
        scheduler.get(el, "width", Some("rem")),
        Some(RawValue::Text("3rem".to_string()))
    );
}

/// Test that identical spring easings share one settle-duration search
#[test]
fn test_spring_duration_is_memoized() {
    let (mut scheduler, targets) = object_scheduler(2);
    let easing = "spring(2, 60, 12, 0)";
    let before = spring::cached_settle_durations();

    let a = scheduler.animate(AnimationParams::new().targets(targets[0]).prop("x", 10).easing(easing));
    assert_eq!(spring::cached_settle_durations(), before + 1);
    let b = scheduler.animate(AnimationParams::new().targets(targets[1]).prop("x", 10).easing(easing));
    assert_eq!(spring::cached_settle_durations(), before + 1);

    let duration_a = scheduler.instance(a).unwrap().duration();
    let duration_b = scheduler.instance(b).unwrap().duration();
    assert_eq!(duration_a, duration_b);
    assert!(duration_a > 0.0);
}

// =============================================================================
// Stagger and remove
// =============================================================================

/// Test that staggered delays fan out by index
#[test]
fn test_staggered_delays() {
    let (mut scheduler, targets) = object_scheduler(4);
    let id = scheduler.animate(
        AnimationParams::new()
            .targets(targets.clone())
            .prop("x", 10)
            .delay(Stagger::new(10))
            .autoplay(false),
    );
    let delays: Vec<f64> = scheduler
        .instance(id)
        .unwrap()
        .animations()
        .iter()
        .map(|a| a.delay)
        .collect();
    assert_eq!(delays, vec![0.0, 10.0, 20.0, 30.0]);
}

/// Test that staggering from the center mirrors around the middle target
#[test]
fn test_staggered_from_center() {
    let (mut scheduler, targets) = object_scheduler(5);
    let id = scheduler.animate(
        AnimationParams::new()
            .targets(targets.clone())
            .prop("x", 10)
            .delay(Stagger::new(10).from(StaggerFrom::Center))
            .autoplay(false),
    );
    let instance = scheduler.instance(id).unwrap();
    let delays: Vec<f64> = instance.animations().iter().map(|a| a.delay).collect();
    assert_eq!(delays, vec![20.0, 10.0, 0.0, 10.0, 20.0]);
    assert_eq!(instance.delay(), 0.0);
}

/// Test that removing targets drops their animations and idles empty
/// instances
#[test]
fn test_remove_targets() {
    let (mut scheduler, targets) = object_scheduler(2);
    let both = scheduler.animate(linear(targets[0]).targets(targets.clone()).prop("x", 100));
    let empty = scheduler.animate(AnimationParams::new().duration(100));
    scheduler.frame(0.0);

    scheduler.remove(targets[0]);
    assert_eq!(scheduler.instance(both).unwrap().animations().len(), 1);
    scheduler.frame(50.0);
    assert_eq!(x(&scheduler, targets[0]), Some(0.0));
    assert_eq!(x(&scheduler, targets[1]), Some(50.0));

    scheduler.remove(targets[1]);
    assert!(scheduler.instance(both).unwrap().is_paused());
    // an instance that never had targets keeps playing
    assert!(!scheduler.instance(empty).unwrap().is_paused());

    scheduler.frame(60.0);
    assert_eq!(scheduler.running(), &[empty]);
}

// =============================================================================
// Timelines
// =============================================================================

fn child_offsets(scheduler: &AnimationScheduler<MemoryHost>, tl: InstanceId) -> Vec<f64> {
    scheduler
        .instance(tl)
        .unwrap()
        .children()
        .iter()
        .map(|c| c.timeline_offset())
        .collect()
}

fn timeline(scheduler: &mut AnimationScheduler<MemoryHost>, target: TargetId) -> InstanceId {
    scheduler.timeline(AnimationParams::new().targets(target).duration(10))
}

fn translate(x: i32) -> AnimationParams {
    AnimationParams::new().prop("translateX", x)
}

/// Test that children without an offset are chained
#[test]
fn test_timeline_chained_offsets() {
    let (mut scheduler, el) = element_scheduler();
    let tl = timeline(&mut scheduler, el);
    scheduler
        .add(tl, translate(100), ())
        .add(tl, translate(200), ())
        .add(tl, translate(300), ());
    assert_eq!(child_offsets(&scheduler, tl), vec![0.0, 10.0, 20.0]);
    assert_eq!(scheduler.instance(tl).unwrap().duration(), 30.0);
}

/// Test absolute offsets
#[test]
fn test_timeline_absolute_offsets() {
    let (mut scheduler, el) = element_scheduler();
    let tl = timeline(&mut scheduler, el);
    scheduler
        .add(tl, translate(100), 50)
        .add(tl, translate(200), 25)
        .add(tl, translate(300), 100);
    assert_eq!(child_offsets(&scheduler, tl), vec![50.0, 25.0, 100.0]);
    assert_eq!(scheduler.instance(tl).unwrap().duration(), 110.0);
}

/// Test relative offsets against the running duration
#[test]
fn test_timeline_relative_offsets() {
    let (mut scheduler, el) = element_scheduler();
    let tl = timeline(&mut scheduler, el);
    scheduler
        .add(tl, translate(100), "+=20")
        .add(tl, translate(200), "*=2")
        .add(tl, translate(300), "-=50");
    assert_eq!(child_offsets(&scheduler, tl), vec![20.0, 60.0, 20.0]);
    assert_eq!(scheduler.instance(tl).unwrap().duration(), 70.0);
}

/// Test mixed offset kinds
#[test]
fn test_timeline_mixed_offsets() {
    let (mut scheduler, el) = element_scheduler();
    let tl = timeline(&mut scheduler, el);
    scheduler
        .add(tl, translate(100), 50)
        .add(tl, translate(200), "-=20")
        .add(tl, translate(300), 0);
    assert_eq!(child_offsets(&scheduler, tl), vec![50.0, 40.0, 0.0]);
    assert_eq!(scheduler.instance(tl).unwrap().duration(), 60.0);
}

/// Test that overlapping children pick up each other's values
#[test]
fn test_timeline_values() {
    init_tracing();
    let (mut scheduler, el) = element_scheduler();
    let tl = scheduler.timeline(
        AnimationParams::new()
            .targets(el)
            .duration(10)
            .easing("linear"),
    );
    scheduler
        .add(tl, translate(100), ())
        .add(tl, translate(200), "-=5")
        .add(tl, translate(300), "-=5");

    let current = |scheduler: &AnimationScheduler<MemoryHost>, child: usize| {
        scheduler.instance(tl).unwrap().children()[child].animations()[0]
            .current_value
            .clone()
    };
    let px = |s: &str| Some(RawValue::Text(s.to_string()));

    scheduler.seek(tl, 10.0);
    assert_eq!(current(&scheduler, 0), px("100px"));
    assert_eq!(current(&scheduler, 1), px("125px"));
    assert_eq!(current(&scheduler, 2), px("125px"));
    assert_eq!(scheduler.host().transform(el), Some("translateX(125px)"));

    scheduler.seek(tl, 15.0);
    assert_eq!(current(&scheduler, 0), px("100px"));
    assert_eq!(current(&scheduler, 1), px("200px"));
    assert_eq!(current(&scheduler, 2), px("212.5px"));
    assert_eq!(scheduler.host().transform(el), Some("translateX(212.5px)"));

    scheduler.seek(tl, 20.0);
    assert_eq!(scheduler.host().transform(el), Some("translateX(300px)"));
}

/// Test that children inherit tween settings but not playback settings
#[test]
fn test_timeline_inheritance() {
    let (mut scheduler, el) = element_scheduler();
    let tl = scheduler.timeline(
        AnimationParams::new()
            .targets(el)
            .duration(50)
            .end_delay(10)
            .direction(PlayDirection::Alternate)
            .loop_count(true),
    );
    scheduler
        .add(tl, translate(250), ())
        .add(tl, AnimationParams::new().prop("opacity", 0.5).duration(20), ());

    let timeline = scheduler.instance(tl).unwrap();
    let children = timeline.children();
    assert_eq!(children[0].duration(), 60.0);
    assert_eq!(children[1].timeline_offset(), 60.0);
    assert_eq!(children[1].duration(), 30.0);
    assert_eq!(children[1].direction(), PlayDirection::Alternate);
    assert_eq!(children[1].loop_count(), cadence_animation::LoopCount::Finite(1));
    assert_eq!(timeline.duration(), 90.0);
    assert_eq!(timeline.end_delay(), 10.0);
}

// =============================================================================
// Degenerate timing
// =============================================================================

/// Test that a child pulled before the timeline's start still plays out
#[test]
fn test_timeline_offset_before_start() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let tl = scheduler.timeline(
        AnimationParams::new()
            .targets(obj)
            .duration(10)
            .easing("linear"),
    );
    scheduler.add(tl, AnimationParams::new().prop("x", 100), "-=50");

    run_frames(&mut scheduler, 0.0, 100.0, 16.0);
    assert!(scheduler.instance(tl).unwrap().is_completed());
    assert_eq!(x(&scheduler, obj), Some(100.0));
    assert!(!scheduler.is_armed());
}

/// Test that a delay longer than the tween finishes on the first frame
#[test]
fn test_negative_delay_completes() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    let id = scheduler.animate(linear(obj).prop("x", 100).delay(-200));

    run_frames(&mut scheduler, 0.0, 100.0, 16.0);
    assert!(scheduler.instance(id).unwrap().is_completed());
    assert_eq!(x(&scheduler, obj), Some(100.0));
    assert!(!scheduler.is_armed());
}

/// Test that an unusable global speed is refused and playback keeps its rate
#[test]
fn test_invalid_speed_keeps_clock_finite() {
    let (mut scheduler, targets) = object_scheduler(1);
    let obj = targets[0];
    assert!(scheduler.set_speed(0.0).is_err());
    assert!(scheduler.set_speed(f64::INFINITY).is_err());

    let id = scheduler.animate(linear(obj).prop("x", 100));
    run_frames(&mut scheduler, 0.0, 200.0, 16.0);

    let instance = scheduler.instance(id).unwrap();
    assert!(instance.is_completed());
    assert_eq!(instance.current_time(), 100.0);
    assert_eq!(x(&scheduler, obj), Some(100.0));
    assert!(!scheduler.is_armed());
}
