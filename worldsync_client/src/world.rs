//! Client world state and the update reconciliation loop.
//!
//! `GameWorld::apply_delta` walks one server tick in a fixed order and leaves
//! the pool as the server intends. Anomalies inside the delta (unknown IDs,
//! bad payloads) are logged and skipped; nothing escapes into the frame loop.
//!
//! Order within a delta:
//! 1. player names added
//! 2. local player status
//! 3. player names removed
//! 4. full object entries (create or resync)
//! 5. partial object entries
//! 6. deletions
//! 7. ancillary events (bullets, explosions, emotes, pings, planes)
//! 8. gas zone
//! 9. tick hook

use std::time::Instant;

use tracing::{debug, warn};
use worldsync_shared::{
    event::Notifications,
    protocol::{FullObject, ObjectCategory, ObjectId, PlayerStatus, WorldDelta},
    render::Scene,
};

use crate::{
    ancillary::{ActivePing, Bullet, GasZone, Plane, PlayerNames},
    notify::{EffectEvent, SoundCue, UiEvent},
    object::{GameObject, SyncContext},
    objects::{construct, Player},
    pool::ObjectPool,
    settings::{FrameContext, FrameSettings},
    timer::TimerQueue,
};

/// How close the local player must be to interact with loot or a door.
pub const INTERACT_RANGE: f32 = 6.0;

/// Collaborators shared by every object.
pub struct WorldServices {
    pub scene: Box<dyn Scene>,
    pub timers: TimerQueue,
    pub notify: Notifications,
    pub names: PlayerNames,
}

impl WorldServices {
    pub fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            timers: TimerQueue::default(),
            notify: Notifications::default(),
            names: PlayerNames::default(),
        }
    }

    pub fn ctx(&mut self, now: Instant, settings: FrameSettings) -> SyncContext<'_> {
        SyncContext {
            now,
            settings,
            scene: &mut *self.scene,
            timers: &mut self.timers,
            notify: &mut self.notify,
            names: &self.names,
        }
    }
}

/// How a full entry is applied to the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FullAction {
    Create,
    Resync,
    /// A stale instance holds the ID; destroy it and build a fresh one.
    Replace,
}

pub struct GameWorld {
    pool: ObjectPool,
    services: WorldServices,
    bullets: Vec<Bullet>,
    planes: Vec<Plane>,
    pings: Vec<ActivePing>,
    gas: GasZone,
    status: PlayerStatus,
    alive_count: Option<u32>,
    active_player: Option<ObjectId>,
    interactable: Option<ObjectId>,
}

impl GameWorld {
    pub fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            pool: ObjectPool::new(),
            services: WorldServices::new(scene),
            bullets: Vec::new(),
            planes: Vec::new(),
            pings: Vec::new(),
            gas: GasZone::default(),
            status: PlayerStatus::default(),
            alive_count: None,
            active_player: None,
            interactable: None,
        }
    }

    pub fn pool(&self) -> &ObjectPool {
        &self.pool
    }

    pub fn names(&self) -> &PlayerNames {
        &self.services.names
    }

    pub fn notifications(&self) -> &Notifications {
        &self.services.notify
    }

    pub fn notifications_mut(&mut self) -> &mut Notifications {
        &mut self.services.notify
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.services.timers
    }

    pub fn bullets(&self) -> &[Bullet] {
        &self.bullets
    }

    pub fn planes(&self) -> &[Plane] {
        &self.planes
    }

    pub fn pings(&self) -> &[ActivePing] {
        &self.pings
    }

    pub fn gas(&self) -> &GasZone {
        &self.gas
    }

    pub fn status(&self) -> &PlayerStatus {
        &self.status
    }

    pub fn alive_count(&self) -> Option<u32> {
        self.alive_count
    }

    pub fn active_player(&self) -> Option<ObjectId> {
        self.active_player
    }

    /// Nearest object the local player can interact with, as of the last tick.
    pub fn interactable(&self) -> Option<ObjectId> {
        self.interactable
    }

    /// Applies one server tick.
    pub fn apply_delta(&mut self, delta: &WorldDelta, settings: FrameSettings, now: Instant) {
        for record in &delta.new_players {
            debug!(id = ?record.id, name = %record.name, "Player joined");
            self.services.names.insert(record);
        }

        if let Some(status) = &delta.player_data {
            self.merge_status(status);
        }

        for id in &delta.deleted_players {
            if !self.services.names.remove(*id) {
                debug!(id = ?id, "Removal of unknown player name");
            }
        }

        for entry in &delta.full_dirty_objects {
            self.apply_full(entry, settings, now);
        }

        {
            let mut ctx = self.services.ctx(now, settings);
            for entry in &delta.partial_dirty_objects {
                let Some(object) = self.pool.get_mut(entry.id) else {
                    warn!(id = ?entry.id, "Partial update for unknown object");
                    continue;
                };
                if let Err(e) = object.update_from_data(&entry.data, false, &mut ctx) {
                    warn!(id = ?entry.id, error = %e, "Skipping malformed partial update");
                }
            }

            for id in &delta.deleted_objects {
                let Some(object) = self.pool.get_mut(*id) else {
                    warn!(id = ?id, "Delete for unknown object");
                    continue;
                };
                object.destroy(&mut ctx);
                self.pool.delete(*id);
            }
        }

        self.apply_ancillary(delta, settings, now);

        if delta.gas.is_some() || delta.gas_progress.is_some() {
            if let Err(e) = self.gas.merge(delta.gas.as_ref(), delta.gas_progress) {
                warn!(error = %e, "Skipping malformed gas state");
            }
        }

        self.tick();
    }

    fn merge_status(&mut self, update: &PlayerStatus) {
        if let Some(id) = update.id {
            if self.active_player != Some(id) {
                debug!(id = ?id, "Active player changed");
            }
            self.status.id = Some(id);
            self.active_player = Some(id);
        }
        if let Some(health) = update.health {
            self.status.health = Some(health);
        }
        if let Some(adrenaline) = update.adrenaline {
            self.status.adrenaline = Some(adrenaline);
        }
        if let Some(zoom) = update.zoom {
            self.status.zoom = Some(zoom);
        }
        if let Some(spectating) = update.spectating {
            self.status.spectating = Some(spectating);
        }
        self.services.notify.emit(UiEvent::Status(self.status.clone()));
    }

    fn full_action(&self, entry: &FullObject) -> FullAction {
        match self.pool.get(entry.id) {
            None => FullAction::Create,
            Some(object) if object.base().destroyed || object.category() != entry.category => FullAction::Replace,
            Some(_) => FullAction::Resync,
        }
    }

    fn apply_full(&mut self, entry: &FullObject, settings: FrameSettings, now: Instant) {
        if entry.data.category() != entry.category {
            warn!(
                id = ?entry.id,
                category = ?entry.category,
                payload = ?entry.data.category(),
                "Full entry payload does not match its category"
            );
            return;
        }

        let action = self.full_action(entry);
        let mut ctx = self.services.ctx(now, settings);

        if action == FullAction::Resync {
            if let Some(object) = self.pool.get_mut(entry.id) {
                if let Err(e) = object.update_from_data(&entry.data, false, &mut ctx) {
                    warn!(id = ?entry.id, error = %e, "Skipping malformed full update");
                }
            }
            return;
        }

        if action == FullAction::Replace {
            if let Some(mut stale) = self.pool.delete(entry.id) {
                debug!(id = ?entry.id, old = ?stale.category(), new = ?entry.category, "Replacing stale object");
                if !stale.base().destroyed {
                    stale.destroy(&mut ctx);
                }
            }
        }

        let mut object = construct(entry.category, entry.id);
        if let Err(e) = object.update_from_data(&entry.data, true, &mut ctx) {
            warn!(id = ?entry.id, category = ?entry.category, error = %e, "Dropping object with malformed initial state");
            object.base_mut().kill_timers();
            return;
        }
        ctx.scene.add_object(entry.id, entry.category, object.base().layer);
        self.pool.add(object);
    }

    fn apply_ancillary(&mut self, delta: &WorldDelta, settings: FrameSettings, now: Instant) {
        for data in &delta.bullets {
            match Bullet::spawn(data, now) {
                Ok(bullet) => self.bullets.push(bullet),
                Err(e) => warn!(shooter = ?data.shooter, error = %e, "Skipping malformed bullet"),
            }
        }

        let mut ctx = self.services.ctx(now, settings);

        for explosion in &delta.explosions {
            ctx.notify.emit(EffectEvent::Explosion {
                definition: explosion.definition.clone(),
                position: explosion.position,
                layer: explosion.layer,
            });
            ctx.notify.emit(SoundCue::at(
                format!("{}_explosion", explosion.definition),
                explosion.position,
                explosion.layer,
            ));
        }

        for emote in &delta.emotes {
            match self.pool.get_as_mut::<Player>(emote.player_id) {
                Some(player) if !player.base().dead => player.show_emote(&emote.emote, &mut ctx),
                Some(_) => debug!(player = ?emote.player_id, "Emote from dead player"),
                None => debug!(player = ?emote.player_id, "Emote for unknown player"),
            }
        }

        for ping in &delta.map_pings {
            ctx.notify.emit(EffectEvent::MapPing {
                definition: ping.definition.clone(),
                position: ping.position,
                player: ping.player_id,
            });
            self.pings.push(ActivePing::new(ping, now));
        }

        for plane in &delta.planes {
            match Plane::spawn(plane, now) {
                Ok(spawned) => self.planes.push(spawned),
                Err(e) => {
                    warn!(error = %e, "Skipping malformed plane");
                    continue;
                }
            }
            ctx.notify.emit(EffectEvent::PlaneFlyover {
                position: plane.position,
                direction: plane.direction,
            });
            ctx.notify.emit(SoundCue::global("airdrop_plane"));
        }

        if let Some(count) = delta.alive_count {
            self.alive_count = Some(count);
            ctx.notify.emit(UiEvent::AliveCount(count));
        }
    }

    /// Per-tick hook, run once after every mutation of a delta is visible.
    fn tick(&mut self) {
        let nearest = self.nearest_interactable();
        if nearest != self.interactable {
            self.interactable = nearest;
            self.services.notify.emit(UiEvent::Interactable(nearest));
        }
    }

    fn nearest_interactable(&self) -> Option<ObjectId> {
        let player = self.pool.get(self.active_player?)?;
        if player.base().dead {
            return None;
        }
        let origin = player.base().position();
        let layer = player.base().layer;

        [ObjectCategory::Loot, ObjectCategory::Obstacle]
            .into_iter()
            .flat_map(|category| self.pool.category(category))
            .filter(|object| object.is_interactable() && object.base().layer == layer)
            .map(|object| (object.id(), object.base().position().distance_sq(origin)))
            .filter(|(_, dist_sq)| *dist_sq <= INTERACT_RANGE * INTERACT_RANGE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(id, _)| id)
    }

    /// One render pass: timers, per-object logic, interpolation, overlay,
    /// client-simulated ancillary objects.
    pub fn render_frame(&mut self, frame: &FrameContext) {
        let fired = self.services.timers.due(frame.now);
        if !fired.is_empty() {
            let mut ctx = self.services.ctx(frame.now, frame.settings);
            for timer in fired {
                match self.pool.get_mut(timer.owner) {
                    Some(object) if !object.base().destroyed => object.on_timer(timer.kind, &mut ctx),
                    _ => debug!(owner = ?timer.owner, kind = ?timer.kind, "Timer for missing owner"),
                }
            }
        }

        let scene = &mut *self.services.scene;
        for object in self.pool.iter_mut() {
            object.update(frame.now);
            object.update_interpolation(frame);
            let base = object.base();
            scene.set_transform(base.id, base.render_position(), base.render_rotation());
            if frame.settings.draw_hitboxes {
                object.update_debug_graphics(scene);
            }
        }

        self.bullets.retain_mut(|bullet| bullet.update(frame.now));
        self.planes.retain_mut(|plane| plane.update(frame.now));
        self.pings.retain(|ping| !ping.expired(frame.now));
    }

    /// Destroys everything and resets per-game state. Safe to call repeatedly.
    /// Queued UI notifications survive so the last messages can still be read;
    /// sounds and effects belong to the torn-down world and are dropped.
    pub fn clear(&mut self) {
        let live = self.pool.len();
        {
            let mut ctx = self.services.ctx(Instant::now(), FrameSettings::default());
            for object in self.pool.iter_mut() {
                if !object.base().destroyed {
                    object.destroy(&mut ctx);
                }
            }
        }
        self.pool.clear();
        self.services.timers.clear();
        self.services.names.clear();
        self.services.notify.drain::<SoundCue>();
        self.services.notify.drain::<EffectEvent>();
        self.bullets.clear();
        self.planes.clear();
        self.pings.clear();
        self.gas.reset();
        self.status = PlayerStatus::default();
        self.alive_count = None;
        self.active_player = None;
        self.interactable = None;
        if live > 0 {
            debug!(objects = live, "World cleared");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use worldsync_shared::{
        math::Vec2,
        protocol::{
            EmoteData, Layer, LootData, ObjectData, ObstacleData, PartialObject, PlaneData, PlayerData,
        },
        render::{RecordingScene, SceneOp},
    };

    use super::*;
    use crate::objects::{Loot, EMOTE_DURATION};

    fn world() -> (GameWorld, RecordingScene) {
        let scene = RecordingScene::default();
        (GameWorld::new(Box::new(scene.clone())), scene)
    }

    fn player_at(id: u16, x: f32, y: f32) -> FullObject {
        FullObject::new(
            id,
            ObjectData::Player(PlayerData {
                position: Some(Vec2::new(x, y)),
                hp: Some(100.0),
                dead: Some(false),
                ..Default::default()
            }),
        )
    }

    fn loot_at(id: u16, x: f32, y: f32) -> FullObject {
        FullObject::new(
            id,
            ObjectData::Loot(LootData {
                definition: Some("medikit".into()),
                position: Some(Vec2::new(x, y)),
                ..Default::default()
            }),
        )
    }

    fn apply(world: &mut GameWorld, delta: WorldDelta, now: Instant) {
        world.apply_delta(&delta, FrameSettings::default(), now);
    }

    #[test]
    fn category_change_replaces_instance() {
        let (mut world, scene) = world();
        let now = Instant::now();
        apply(
            &mut world,
            WorldDelta {
                full_dirty_objects: vec![player_at(5, 0.0, 0.0)],
                ..Default::default()
            },
            now,
        );
        apply(
            &mut world,
            WorldDelta {
                full_dirty_objects: vec![loot_at(5, 1.0, 1.0)],
                ..Default::default()
            },
            now,
        );

        assert!(world.pool().get_as::<Loot>(ObjectId(5)).is_some());
        assert_eq!(world.pool().len(), 1);
        let log = scene.log();
        assert_eq!(log.additions(ObjectId(5)), 2);
        assert_eq!(log.removals(ObjectId(5)), 1);
    }

    #[test]
    fn mismatched_full_entry_is_skipped() {
        let (mut world, _) = world();
        let mut entry = player_at(5, 0.0, 0.0);
        entry.category = ObjectCategory::Loot;
        apply(
            &mut world,
            WorldDelta {
                full_dirty_objects: vec![entry],
                ..Default::default()
            },
            Instant::now(),
        );
        assert!(world.pool().is_empty());
    }

    #[test]
    fn malformed_initial_state_is_not_inserted() {
        let (mut world, scene) = world();
        let mut entry = player_at(5, 0.0, 0.0);
        entry.data = ObjectData::Player(PlayerData {
            position: Some(Vec2::new(f32::NAN, 0.0)),
            ..Default::default()
        });
        apply(
            &mut world,
            WorldDelta {
                full_dirty_objects: vec![entry, loot_at(6, 0.0, 0.0)],
                ..Default::default()
            },
            Instant::now(),
        );
        assert!(world.pool().get(ObjectId(5)).is_none());
        assert!(world.pool().get(ObjectId(6)).is_some());
        assert_eq!(scene.log().additions(ObjectId(5)), 0);
    }

    #[test]
    fn interactable_tracks_nearest_on_same_layer() {
        let (mut world, _) = world();
        let now = Instant::now();
        let mut upstairs_loot = loot_at(11, 1.0, 0.0);
        if let ObjectData::Loot(data) = &mut upstairs_loot.data {
            data.layer = Some(Layer::UPSTAIRS);
        }
        apply(
            &mut world,
            WorldDelta {
                player_data: Some(PlayerStatus {
                    id: Some(ObjectId(1)),
                    ..Default::default()
                }),
                full_dirty_objects: vec![
                    player_at(1, 0.0, 0.0),
                    upstairs_loot,
                    loot_at(12, 4.0, 0.0),
                    loot_at(13, 30.0, 0.0),
                ],
                ..Default::default()
            },
            now,
        );
        assert_eq!(world.interactable(), Some(ObjectId(12)));

        // A second tick with nothing new must not re-notify.
        apply(&mut world, WorldDelta::default(), now);
        let events = world.notifications_mut().drain::<UiEvent>();
        let changes = events
            .iter()
            .filter(|e| matches!(e, UiEvent::Interactable(_)))
            .count();
        assert_eq!(changes, 1);

        apply(
            &mut world,
            WorldDelta {
                deleted_objects: vec![ObjectId(12)],
                ..Default::default()
            },
            now,
        );
        assert_eq!(world.interactable(), None);
    }

    #[test]
    fn broken_door_is_not_interactable() {
        let (mut world, _) = world();
        let now = Instant::now();
        let door = FullObject::new(
            20,
            ObjectData::Obstacle(ObstacleData {
                definition: Some("door".into()),
                position: Some(Vec2::new(2.0, 0.0)),
                door_open: Some(false),
                dead: Some(false),
                ..Default::default()
            }),
        );
        apply(
            &mut world,
            WorldDelta {
                player_data: Some(PlayerStatus {
                    id: Some(ObjectId(1)),
                    ..Default::default()
                }),
                full_dirty_objects: vec![player_at(1, 0.0, 0.0), door],
                ..Default::default()
            },
            now,
        );
        assert_eq!(world.interactable(), Some(ObjectId(20)));

        apply(
            &mut world,
            WorldDelta {
                partial_dirty_objects: vec![PartialObject::new(
                    20,
                    ObjectData::Obstacle(ObstacleData {
                        dead: Some(true),
                        ..Default::default()
                    }),
                )],
                ..Default::default()
            },
            now,
        );
        assert_eq!(world.interactable(), None);
    }

    #[test]
    fn emote_timer_dies_with_its_player() {
        let (mut world, _) = world();
        let now = Instant::now();
        apply(
            &mut world,
            WorldDelta {
                full_dirty_objects: vec![player_at(3, 0.0, 0.0)],
                emotes: vec![EmoteData {
                    player_id: ObjectId(3),
                    emote: "wave".into(),
                }],
                ..Default::default()
            },
            now,
        );
        assert_eq!(world.timers().len(), 1);

        // Player deleted, then the ID is reused by a new player.
        apply(
            &mut world,
            WorldDelta {
                deleted_objects: vec![ObjectId(3)],
                ..Default::default()
            },
            now,
        );
        apply(
            &mut world,
            WorldDelta {
                full_dirty_objects: vec![player_at(3, 9.0, 9.0)],
                ..Default::default()
            },
            now,
        );
        world.notifications_mut().clear();

        let frame = FrameContext {
            now: now + EMOTE_DURATION + Duration::from_millis(1),
            tick_interval: Duration::from_millis(25),
            settings: FrameSettings::default(),
        };
        world.render_frame(&frame);
        assert!(world.notifications().pending::<EffectEvent>().is_empty());
        assert!(world.timers().is_empty());
    }

    #[test]
    fn debug_overlay_follows_setting() {
        let (mut world, scene) = world();
        let now = Instant::now();
        apply(
            &mut world,
            WorldDelta {
                full_dirty_objects: vec![player_at(1, 0.0, 0.0), loot_at(2, 1.0, 0.0)],
                ..Default::default()
            },
            now,
        );
        let mut frame = FrameContext {
            now,
            tick_interval: Duration::from_millis(25),
            settings: FrameSettings::default(),
        };
        world.render_frame(&frame);
        assert_eq!(scene.log().debug_circles, 0);

        frame.settings.draw_hitboxes = true;
        world.render_frame(&frame);
        assert_eq!(scene.log().debug_circles, 2);
        assert_eq!(scene.log().transforms.len(), 2);
    }

    #[test]
    fn malformed_plane_is_skipped_without_flyover() {
        let (mut world, _) = world();
        apply(
            &mut world,
            WorldDelta {
                planes: vec![
                    PlaneData {
                        position: Vec2::new(f32::NAN, 0.0),
                        direction: 0.0,
                    },
                    PlaneData {
                        position: Vec2::new(10.0, 10.0),
                        direction: 1.0,
                    },
                ],
                ..Default::default()
            },
            Instant::now(),
        );
        assert_eq!(world.planes().len(), 1);
        assert_eq!(world.planes()[0].position(), Vec2::new(10.0, 10.0));
        assert_eq!(world.notifications().pending::<EffectEvent>().len(), 1);
        assert_eq!(world.notifications().pending::<SoundCue>().len(), 1);
    }

    #[test]
    fn clear_destroys_everything_once() {
        let (mut world, scene) = world();
        let now = Instant::now();
        apply(
            &mut world,
            WorldDelta {
                full_dirty_objects: vec![player_at(1, 0.0, 0.0), loot_at(2, 1.0, 0.0)],
                emotes: vec![EmoteData {
                    player_id: ObjectId(1),
                    emote: "wave".into(),
                }],
                ..Default::default()
            },
            now,
        );
        world.clear();
        world.clear();

        assert!(world.pool().is_empty());
        assert!(world.timers().is_empty());
        let log = scene.log();
        assert_eq!(log.removals(ObjectId(1)), 1);
        assert_eq!(log.removals(ObjectId(2)), 1);
        assert!(log.ops.contains(&SceneOp::Remove(ObjectId(1))));
        drop(log);
        assert!(world.notifications().pending::<EffectEvent>().is_empty());
        assert!(world.notifications().pending::<SoundCue>().is_empty());
    }
}
