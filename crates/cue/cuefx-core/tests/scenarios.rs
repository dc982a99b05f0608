mod common;

use common::Rig;
use cuefx_core::{Config, SceneHost, SceneOp, TickEvent};

/// it should fire exactly at the trigger frame and create one instance
#[test]
fn fires_exactly_at_trigger_frame() {
    let mut rig = Rig::new(Config::default());
    let id = rig.prefab_event("Jump", "Dust", 10);

    let mut fired_at = Vec::new();
    for frame in [5, 9, 10, 11] {
        let out = rig.tick_frame(frame);
        assert_eq!(out.frame.as_ref().unwrap().frame, frame);
        if out.fired().any(|e| e == id) {
            fired_at.push(frame);
        }
    }
    assert_eq!(fired_at, vec![10]);
    assert!(rig.engine.event(id).unwrap().is_fired());
    assert_eq!(rig.scene.live_instances(), 1);
}

/// it should re-arm on scrubbing back without destroying the instance
#[test]
fn rearm_keeps_live_instance() {
    let mut rig = Rig::new(Config::default());
    let id = rig.prefab_event("Jump", "Dust", 10);
    rig.tick_frame(10);
    let instance = rig.live(id).unwrap();

    let out = rig.tick_frame(3);
    assert!(out.events.contains(&TickEvent::Rearmed { event: id }));
    assert!(!rig.engine.event(id).unwrap().is_fired());
    assert_eq!(rig.live(id), Some(instance));
    assert!(rig.scene.contains(instance));
}

/// it should destroy the previous instance before creating the next on re-fire
#[test]
fn refire_replaces_instance_in_order() {
    let mut rig = Rig::new(Config::default());
    let id = rig.prefab_event("Jump", "Dust", 10);
    rig.tick_frame(10);
    let first = rig.live(id).unwrap();
    rig.tick_frame(3);
    rig.scene.clear_ops();

    let out = rig.tick_frame(10);
    let second = rig.live(id).unwrap();
    assert_ne!(first, second);
    assert!(!rig.scene.contains(first));
    assert_eq!(rig.scene.live_instances(), 1);

    let ops = rig.scene.ops();
    assert_eq!(ops.len(), 2);
    assert_eq!(ops[0], SceneOp::Destroyed { node: first });
    assert!(matches!(ops[1], SceneOp::Instantiated { node, .. } if node == second));
    assert_eq!(out.fired().count(), 1);
    assert!(out.events.contains(&TickEvent::Destroyed {
        event: id,
        instance: first
    }));
}

/// it should destroy on disable and not respawn on re-enable without a crossing
#[test]
fn disable_destroys_and_reenable_does_not_respawn() {
    let mut rig = Rig::new(Config::default());
    let id = rig.prefab_event("Jump", "Dust", 10);
    rig.tick_frame(12);
    let instance = rig.live(id).unwrap();

    rig.engine.set_enabled(id, false, &mut rig.scene).unwrap();
    assert!(!rig.scene.contains(instance));
    assert_eq!(rig.live(id), None);

    rig.engine.set_enabled(id, true, &mut rig.scene).unwrap();
    rig.tick_frame(13);
    rig.tick_frame(20);
    assert_eq!(rig.live(id), None);
    assert_eq!(rig.scene.live_instances(), 0);
}

/// it should run callbacks when there is no prefab, without creating anything
#[test]
fn callbacks_without_prefab() {
    let mut rig = Rig::new(Config::default());
    let id = rig.callback_event("Jump", &["Footstep", "Shake"], 4);

    let out = rig.tick_frame(4);
    assert_eq!(rig.callbacks.history(), &["Footstep", "Shake"]);
    assert_eq!(rig.scene.live_instances(), 0);
    assert!(out.events.contains(&TickEvent::Fired {
        event: id,
        frame: 4,
        instance: None
    }));
}

/// it should spawn the prefab and run its callbacks in the same tick
#[test]
fn prefab_and_callbacks_fire_together() {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    let mut rig = Rig::new(Config::default());
    let id = rig.prefab_event("Jump", "Dust", 2);
    rig.engine
        .set_callbacks(id, cuefx_core::CallbackSet::new(["Check"]))
        .unwrap();

    let calls = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&calls);
    rig.callbacks.register("Check", move || {
        sink.fetch_add(1, Ordering::SeqCst);
    });
    rig.tick_frame(1);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    rig.tick_frame(2);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert!(rig.live(id).is_some());
    rig.tick_frame(3);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// it should hold: fired iff the frame stayed at or past the trigger since the last frame before it
#[test]
fn fired_flag_tracks_frame_history() {
    let mut rig = Rig::new(Config::default());
    let id = rig.prefab_event("Jump", "Dust", 20);
    let trigger = 20;

    let frames = [
        0, 5, 19, 20, 25, 59, 59, 3, 21, 2, 2, 40, 19, 20, 20, 0, 59, 18, 22, 21,
    ];
    for frame in frames {
        rig.tick_frame(frame);
        let expected = frame >= trigger;
        assert_eq!(
            rig.engine.event(id).unwrap().is_fired(),
            expected,
            "frame {frame}"
        );
        assert!(rig.scene.live_instances() <= 1, "frame {frame}");
    }
}

/// it should keep at most one instance per event across many refires
#[test]
fn at_most_one_instance_per_event() {
    let mut rig = Rig::new(Config::default());
    let a = rig.prefab_event("Jump", "Dust", 5);
    let b = rig.prefab_event("Jump", "Sparks", 30);

    for lap in 0..6 {
        for frame in [0, 6, 31, 45] {
            rig.tick_frame(frame);
            let live: Vec<_> = [a, b].iter().filter_map(|id| rig.live(*id)).collect();
            assert!(live.len() <= 2);
            assert_eq!(rig.scene.live_instances(), live.len(), "lap {lap} frame {frame}");
        }
    }
}

/// it should leave events on other clips untouched
#[test]
fn inactive_clip_events_keep_state() {
    let mut rig = Rig::new(Config::default());
    let jump = rig.prefab_event("Jump", "Dust", 5);
    let walk = rig.prefab_event("Walk", "Dust", 5);

    rig.tick_frame(10);
    assert!(rig.engine.event(jump).unwrap().is_fired());
    assert!(!rig.engine.event(walk).unwrap().is_fired());

    rig.clock.play("Walk");
    rig.tick_frame(1);
    assert!(rig.engine.event(jump).unwrap().is_fired());
    rig.tick_frame(6);
    assert!(rig.engine.event(walk).unwrap().is_fired());
}

/// it should skip evaluation while the clock is disabled
#[test]
fn disabled_clock_is_not_ready() {
    let mut rig = Rig::new(Config::default());
    let id = rig.prefab_event("Jump", "Dust", 0);
    rig.clock.enabled = false;
    let out = rig.tick();
    assert!(!out.is_ready());
    assert!(!rig.engine.event(id).unwrap().is_fired());
}
