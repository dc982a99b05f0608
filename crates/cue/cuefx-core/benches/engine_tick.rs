//! Benchmarks for the per-tick event evaluation path
//!
//! Run with: cargo bench --bench engine_tick -p cuefx-core

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use cuefx_core::{
    CallbackRegistry, CallbackSet, ClipId, ClipInfo, ClipLibrary, Config, Engine, Host,
    ManualClock, ModeRegistry, Pose, PrefabRef, SceneGraph,
};
use std::hint::black_box;

fn setup(events: usize) -> (ClipLibrary, SceneGraph, Engine) {
    let clips = ClipLibrary::new().with_clip("Walk", ClipInfo::new(4.0, 60.0, true));
    let mut scene = SceneGraph::new();
    scene.register_prefab(PrefabRef::new("Dust"), Pose::IDENTITY);

    let mut engine = Engine::new(Config::default());
    for i in 0..events {
        let id = engine.add_event(Some(ClipId::new("Walk")));
        if i % 2 == 0 {
            // The scene is only needed for prefab pose lookup here.
            engine
                .set_prefab(id, Some(PrefabRef::new("Dust")), &scene)
                .unwrap();
        } else {
            engine.set_callbacks(id, CallbackSet::new(["Step"])).unwrap();
        }
        engine
            .set_trigger_frame(id, (i * 7 % 240) as i64, &clips)
            .unwrap();
    }
    (clips, scene, engine)
}

fn bench_play_loop(c: &mut Criterion) {
    let mut group = c.benchmark_group("play_loop");

    for events in [8usize, 64, 512].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(events), events, |b, &events| {
            let (clips, mut scene, mut engine) = setup(events);
            let mut clock = ManualClock::playing("Walk");
            let mut callbacks = CallbackRegistry::new();
            let mut modes = ModeRegistry::new();
            engine.activate(&mut modes);
            let info = ClipInfo::new(4.0, 60.0, true);

            b.iter(|| {
                // One full lap at 60 ticks per second.
                for _ in 0..240 {
                    clock.advance(&info, 1.0 / 60.0, 1.0);
                    let mut host = Host::new(&mut clock, &clips, &mut scene, &mut callbacks);
                    black_box(engine.update(&mut host, &mut modes).events.len());
                }
                callbacks.clear_history();
                scene.clear_ops();
            });
        });
    }

    group.finish();
}

fn bench_authoring_scrub(c: &mut Criterion) {
    let mut group = c.benchmark_group("authoring_scrub");

    for events in [8usize, 64, 512].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(events), events, |b, &events| {
            let (clips, mut scene, mut engine) = setup(events);
            engine.set_authoring(true);
            let mut clock = ManualClock::playing("Walk");
            let mut callbacks = CallbackRegistry::new();
            let mut modes = ModeRegistry::new();

            b.iter(|| {
                // Back and forth across the whole clip.
                for frame in (0..240).chain((0..240).rev()) {
                    engine.scrub_to(frame);
                    let mut host = Host::new(&mut clock, &clips, &mut scene, &mut callbacks);
                    black_box(engine.update(&mut host, &mut modes).frame.is_some());
                }
                callbacks.clear_history();
                scene.clear_ops();
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_play_loop, bench_authoring_scrub);
criterion_main!(benches);
