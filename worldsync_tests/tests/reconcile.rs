//! World-level reconciliation and interpolation scenarios.

use std::time::{Duration, Instant};

use worldsync_client::{
    notify::EffectEvent,
    object::GameObject,
    objects::Player,
    settings::{FrameContext, FrameSettings},
    world::GameWorld,
};
use worldsync_shared::{
    math::Vec2,
    protocol::{EmoteData, ObjectId, WorldDelta},
    render::RecordingScene,
};
use worldsync_tests::{init_tracing, loot_full, player_full, player_partial};

fn world() -> (GameWorld, RecordingScene) {
    init_tracing();
    let scene = RecordingScene::default();
    (GameWorld::new(Box::new(scene.clone())), scene)
}

fn apply(world: &mut GameWorld, delta: WorldDelta, now: Instant) {
    world.apply_delta(&delta, FrameSettings::default(), now);
}

fn frame(now: Instant, tick_interval: Duration) -> FrameContext {
    FrameContext {
        now,
        tick_interval,
        settings: FrameSettings::default(),
    }
}

fn address_of(world: &GameWorld, id: u16) -> *const () {
    world
        .pool()
        .get(ObjectId(id))
        .map(|o| o as *const dyn GameObject as *const ())
        .unwrap_or(std::ptr::null())
}

fn close(a: Vec2, b: Vec2) -> bool {
    (a.x - b.x).abs() < 1e-3 && (a.y - b.y).abs() < 1e-3
}

#[test]
fn create_update_delete_keeps_identity_and_destroys_once() {
    let (mut world, scene) = world();
    let now = Instant::now();

    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![player_full(1, Vec2::ZERO, 100.0)],
            ..Default::default()
        },
        now,
    );
    let player = world.pool().get_as::<Player>(ObjectId(1)).expect("player created");
    assert_eq!(player.hp(), 100.0);
    let created_at = address_of(&world, 1);

    apply(
        &mut world,
        WorldDelta {
            partial_dirty_objects: vec![player_partial(1, |d| d.hp = Some(80.0))],
            ..Default::default()
        },
        now,
    );
    assert_eq!(world.pool().get_as::<Player>(ObjectId(1)).map(Player::hp), Some(80.0));
    assert_eq!(address_of(&world, 1), created_at);

    // A full resync of a live object updates in place too.
    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![player_full(1, Vec2::new(2.0, 2.0), 75.0)],
            ..Default::default()
        },
        now,
    );
    assert_eq!(address_of(&world, 1), created_at);

    apply(
        &mut world,
        WorldDelta {
            deleted_objects: vec![ObjectId(1)],
            ..Default::default()
        },
        now,
    );
    assert!(world.pool().get(ObjectId(1)).is_none());
    let log = scene.log();
    assert_eq!(log.additions(ObjectId(1)), 1);
    assert_eq!(log.removals(ObjectId(1)), 1);
}

#[test]
fn unknown_ids_are_skipped() {
    let (mut world, scene) = world();
    let now = Instant::now();
    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![loot_full(2, "bandage", Vec2::new(1.0, 1.0))],
            ..Default::default()
        },
        now,
    );

    apply(
        &mut world,
        WorldDelta {
            partial_dirty_objects: vec![player_partial(40, |d| d.hp = Some(1.0))],
            deleted_objects: vec![ObjectId(41)],
            ..Default::default()
        },
        now,
    );
    assert_eq!(world.pool().len(), 1);
    assert!(world.pool().get(ObjectId(2)).is_some());
    assert_eq!(scene.log().removals(ObjectId(41)), 0);
}

#[test]
fn partial_with_wrong_payload_is_skipped() {
    let (mut world, _) = world();
    let now = Instant::now();
    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![loot_full(2, "bandage", Vec2::ZERO)],
            partial_dirty_objects: vec![player_partial(2, |d| d.hp = Some(5.0))],
            ..Default::default()
        },
        now,
    );
    assert!(world.pool().get(ObjectId(2)).is_some());
}

#[test]
fn emote_sees_post_update_position() {
    let (mut world, _) = world();
    let now = Instant::now();
    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![player_full(3, Vec2::ZERO, 100.0)],
            ..Default::default()
        },
        now,
    );
    world.notifications_mut().clear();

    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![player_full(3, Vec2::new(10.0, 5.0), 100.0)],
            emotes: vec![EmoteData {
                player_id: ObjectId(3),
                emote: "happy_face".into(),
            }],
            ..Default::default()
        },
        now,
    );
    let effects = world.notifications_mut().drain::<EffectEvent>();
    assert_eq!(
        effects,
        vec![EffectEvent::Emote {
            player: ObjectId(3),
            emote: "happy_face".into(),
            position: Vec2::new(10.0, 5.0),
        }]
    );
}

#[test]
fn emote_for_player_created_in_same_delta() {
    let (mut world, _) = world();
    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![player_full(8, Vec2::new(4.0, 4.0), 100.0)],
            emotes: vec![EmoteData {
                player_id: ObjectId(8),
                emote: "wave".into(),
            }],
            ..Default::default()
        },
        Instant::now(),
    );
    assert_eq!(
        world.pool().get_as::<Player>(ObjectId(8)).and_then(Player::emote),
        Some("wave")
    );
}

#[test]
fn position_interpolates_over_measured_tick() {
    let (mut world, scene) = world();
    let start = Instant::now();
    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![player_full(1, Vec2::ZERO, 100.0)],
            ..Default::default()
        },
        start,
    );

    let t0 = start + Duration::from_millis(100);
    apply(
        &mut world,
        WorldDelta {
            partial_dirty_objects: vec![player_partial(1, |d| d.position = Some(Vec2::new(10.0, 0.0)))],
            ..Default::default()
        },
        t0,
    );

    let tick = Duration::from_millis(100);
    world.render_frame(&frame(t0 + Duration::from_millis(50), tick));
    let (half, _) = scene.log().transforms[&ObjectId(1)];
    assert!(close(half, Vec2::new(5.0, 0.0)), "got {half:?}");

    world.render_frame(&frame(t0 + Duration::from_millis(150), tick));
    let (late, _) = scene.log().transforms[&ObjectId(1)];
    assert!(close(late, Vec2::new(10.0, 0.0)), "got {late:?}");
}

#[test]
fn first_sample_renders_without_lerp() {
    let (mut world, scene) = world();
    let now = Instant::now();
    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![player_full(1, Vec2::new(7.0, -3.0), 100.0)],
            ..Default::default()
        },
        now,
    );
    let player = world.pool().get(ObjectId(1)).expect("created");
    assert_eq!(player.base().render_position(), Vec2::new(7.0, -3.0));

    world.render_frame(&frame(now, Duration::from_millis(25)));
    assert_eq!(scene.log().transforms[&ObjectId(1)].0, Vec2::new(7.0, -3.0));
}

#[test]
fn rotation_takes_the_short_arc() {
    let (mut world, scene) = world();
    let t0 = Instant::now();
    let mut spawn = player_full(1, Vec2::ZERO, 100.0);
    if let worldsync_shared::protocol::ObjectData::Player(data) = &mut spawn.data {
        data.rotation = Some(170f32.to_radians());
    }
    apply(
        &mut world,
        WorldDelta {
            full_dirty_objects: vec![spawn],
            ..Default::default()
        },
        t0,
    );
    apply(
        &mut world,
        WorldDelta {
            partial_dirty_objects: vec![player_partial(1, |d| d.rotation = Some((-170f32).to_radians()))],
            ..Default::default()
        },
        t0,
    );

    world.render_frame(&frame(t0 + Duration::from_millis(50), Duration::from_millis(100)));
    let (_, rotation) = scene.log().transforms[&ObjectId(1)];
    assert!(
        (rotation.abs() - std::f32::consts::PI).abs() < 1e-3,
        "rotation {rotation} went the long way"
    );
}

#[test]
fn smoothing_off_snaps_to_latest() {
    let (mut world, scene) = world();
    let t0 = Instant::now();
    let settings = FrameSettings {
        movement_smoothing: false,
        draw_hitboxes: false,
    };
    world.apply_delta(
        &WorldDelta {
            full_dirty_objects: vec![player_full(1, Vec2::ZERO, 100.0)],
            ..Default::default()
        },
        settings,
        t0,
    );
    world.apply_delta(
        &WorldDelta {
            partial_dirty_objects: vec![player_partial(1, |d| d.position = Some(Vec2::new(10.0, 0.0)))],
            ..Default::default()
        },
        settings,
        t0,
    );
    world.render_frame(&FrameContext {
        now: t0 + Duration::from_millis(10),
        tick_interval: Duration::from_millis(100),
        settings,
    });
    assert_eq!(scene.log().transforms[&ObjectId(1)].0, Vec2::new(10.0, 0.0));
}
