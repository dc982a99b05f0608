use bevy::prelude::*;
use bevy_cuefx::{
    entity_to_node, restore_engines, save_engines, ClipPlayback, CueAsset, CueCallback,
    CueEmitter, CueEngines, CueFired, CueInstance, CueModes, CuefxPlugin, CuefxPluginConfig,
    PrefabLibrary,
    WorldScene,
};
use cuefx_core::{
    CallbackSet, ClipId, ClipLibrary, Config as CueConfig, CueError, Engine, EventId,
    MemoryStore, Pose, PrefabRef,
};

fn app() -> App {
    app_with(CuefxPluginConfig::default())
}

fn app_with(config: CuefxPluginConfig) -> App {
    let clips: ClipLibrary = cuefx_test_fixtures::clips::load("locomotion").unwrap();
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(CuefxPlugin { clips, config });
    app.world_mut()
        .resource_mut::<PrefabLibrary>()
        .register("Dust", Transform::IDENTITY);
    app
}

/// Engine with one Walk event at frame 0 spawning Dust and calling Footstep.
fn dust_engine(app: &mut App) -> (Engine, EventId) {
    let mut engine = Engine::new(CueConfig::default());
    let id = engine.add_event(Some(ClipId::new("Walk")));
    {
        let scene = WorldScene::new(app.world_mut(), engine.id());
        engine
            .set_prefab(id, Some(PrefabRef::new("Dust")), &scene)
            .unwrap();
    }
    engine
        .set_callbacks(id, CallbackSet::new(["Footstep"]))
        .unwrap();
    (engine, id)
}

fn tick(app: &mut App) {
    app.world_mut().run_schedule(Update);
}

fn instance_count(app: &mut App) -> usize {
    let world = app.world_mut();
    let mut q = world.query::<&CueInstance>();
    q.iter(world).count()
}

#[test]
fn plugin_inserts_resources() {
    let app = app();
    // it should insert the engine list, mode registry and prefab library
    assert!(app.world().get_resource::<CueEngines>().is_some());
    assert!(app.world().get_resource::<CueModes>().is_some());
    assert!(app.world().get_resource::<PrefabLibrary>().is_some());
}

/// it should spawn the prefab and send the callback when the trigger frame is crossed
#[test]
fn cue_fires_spawns_and_calls_back() {
    let mut app = app();
    let (engine, id) = dust_engine(&mut app);
    app.world_mut()
        .resource_mut::<CueEngines>()
        .add(CueEmitter::new(engine, Some(ClipPlayback::playing("Walk"))));

    tick(&mut app);
    assert_eq!(instance_count(&mut app), 1);

    let callbacks = app.world().resource::<Events<CueCallback>>();
    let mut reader = callbacks.get_reader();
    let names: Vec<String> = reader.read(callbacks).map(|c| c.name.clone()).collect();
    assert_eq!(names, vec!["Footstep".to_string()]);

    let fired = app.world().resource::<Events<CueFired>>();
    let mut reader = fired.get_reader();
    let fired: Vec<&CueFired> = reader.read(fired).collect();
    assert_eq!(fired.len(), 1);
    assert_eq!(fired[0].event, id);
    assert!(fired[0].instance.is_some());

    // Still at frame 0: no second spawn.
    tick(&mut app);
    assert_eq!(instance_count(&mut app), 1);
}

/// it should run one neutral warm-up tick, then apply the edit-mode rate
#[test]
fn governing_authoring_engine_sets_virtual_speed() {
    let mut app = app();
    let mut engine = Engine::new(CueConfig::default());
    engine.set_authoring(true);
    app.world_mut()
        .resource_mut::<CueEngines>()
        .add(CueEmitter::new(engine, Some(ClipPlayback::playing("Walk"))));

    tick(&mut app);
    assert_eq!(app.world().resource::<Time<Virtual>>().relative_speed(), 1.0);
    tick(&mut app);
    assert_eq!(app.world().resource::<Time<Virtual>>().relative_speed(), 0.0);
}

/// it should leave the time scale alone when the plugin is told to
#[test]
fn time_scale_can_be_disabled() {
    let mut app = app_with(CuefxPluginConfig {
        apply_time_scale: false,
        engine: CueConfig::default().with_warmup_ticks(0),
    });
    let mut engine = app.world().resource::<CuefxPluginConfig>().new_engine();
    engine.set_authoring(true);
    app.world_mut()
        .resource_mut::<CueEngines>()
        .add(CueEmitter::new(engine, Some(ClipPlayback::playing("Walk"))));

    tick(&mut app);
    tick(&mut app);
    assert_eq!(app.world().resource::<Time<Virtual>>().relative_speed(), 1.0);
}

/// it should idle without a clip player and leave the time scale alone
#[test]
fn emitter_without_playback_is_not_ready() {
    let mut app = app();
    let (engine, _) = dust_engine(&mut app);
    app.world_mut()
        .resource_mut::<CueEngines>()
        .add(CueEmitter::new(engine, None));

    tick(&mut app);
    assert_eq!(instance_count(&mut app), 0);
    assert_eq!(app.world().resource::<Time<Virtual>>().relative_speed(), 1.0);
}

/// it should parent a relative instance under its anchor with the stored local pose
#[test]
fn anchored_instance_is_parented() {
    let mut app = app();
    let hand = app
        .world_mut()
        .spawn(SpatialBundle::from_transform(Transform::from_xyz(5.0, 0.0, 0.0)))
        .id();
    let (mut engine, id) = dust_engine(&mut app);
    {
        let mut scene = WorldScene::new(app.world_mut(), engine.id());
        engine
            .set_anchor(id, Some(entity_to_node(hand)), &mut scene)
            .unwrap();
        engine
            .set_pose(id, Pose::from_position([0.0, 1.0, 0.0]), &mut scene)
            .unwrap();
    }
    assert!(engine.event(id).unwrap().keep_anchor_relative());
    app.world_mut()
        .resource_mut::<CueEngines>()
        .add(CueEmitter::new(engine, Some(ClipPlayback::playing("Walk"))));

    tick(&mut app);

    let world = app.world_mut();
    let mut q = world.query_filtered::<(&Parent, &Transform), With<CueInstance>>();
    let (parent, transform) = q.single(world);
    assert_eq!(parent.get(), hand);
    assert!((transform.translation - Vec3::new(0.0, 1.0, 0.0)).length() < 1e-5);
}

/// it should refuse asset entities as anchors
#[test]
fn asset_anchor_is_rejected() {
    let mut app = app();
    let asset = app.world_mut().spawn(CueAsset).id();
    let (mut engine, id) = dust_engine(&mut app);
    let mut scene = WorldScene::new(app.world_mut(), engine.id());
    let err = engine
        .set_anchor(id, Some(entity_to_node(asset)), &mut scene)
        .unwrap_err();
    assert_eq!(
        err,
        CueError::AnchorIsAsset {
            anchor: entity_to_node(asset)
        }
    );
    assert_eq!(engine.event(id).unwrap().anchor(), None);
}

/// it should round-trip the event list through a snapshot store
#[test]
fn save_and_restore_through_world() {
    let mut app = app();
    let (engine, id) = dust_engine(&mut app);
    let engine_id = app
        .world_mut()
        .resource_mut::<CueEngines>()
        .add(CueEmitter::new(engine, Some(ClipPlayback::playing("Walk"))));

    let mut store = MemoryStore::new();
    assert_eq!(save_engines(app.world(), &mut store).unwrap(), 1);

    {
        let world = app.world_mut();
        world.resource_scope(|world, mut engines: Mut<CueEngines>| {
            let emitter = engines.get_mut(engine_id).unwrap();
            let mut scene = WorldScene::new(world, engine_id);
            emitter.engine.remove_event(id, &mut scene).unwrap();
        });
    }
    assert!(app.world().resource::<CueEngines>().get(engine_id).unwrap().engine.events().is_empty());

    assert_eq!(restore_engines(app.world_mut(), &mut store).unwrap(), 1);
    assert!(store.is_empty());
    let engines = app.world().resource::<CueEngines>();
    let restored = &engines.get(engine_id).unwrap().engine;
    assert_eq!(restored.events().len(), 1);
    assert_eq!(restored.events()[0].name(), "Dust");
}
