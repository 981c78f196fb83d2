//! Per-tick state that rides alongside the object pool.
//!
//! Bullets, planes and map pings are client-simulated from a single spawn
//! event. The gas zone and the player name registry are merged from deltas.

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use anyhow::ensure;
use worldsync_shared::{
    math::Vec2,
    protocol::{BulletData, GasData, GasPhase, Layer, MapPingData, ObjectId, PlaneData, PlayerNameRecord},
};

/// How far a plane flies per second.
pub const PLANE_SPEED: f32 = 48.0;
/// How long a plane stays on the map.
pub const PLANE_LIFETIME: Duration = Duration::from_secs(30);
/// How long a map ping stays visible.
pub const PING_LIFETIME: Duration = Duration::from_secs(8);

/// Names of players known this game.
#[derive(Debug, Default)]
pub struct PlayerNames {
    records: HashMap<ObjectId, PlayerNameRecord>,
}

impl PlayerNames {
    pub fn insert(&mut self, record: &PlayerNameRecord) {
        self.records.insert(record.id, record.clone());
    }

    /// Returns false if the player was not registered.
    pub fn remove(&mut self, id: ObjectId) -> bool {
        self.records.remove(&id).is_some()
    }

    pub fn name(&self, id: ObjectId) -> Option<&str> {
        self.records.get(&id).map(|r| r.name.as_str())
    }

    pub fn color(&self, id: ObjectId) -> Option<u32> {
        self.records.get(&id).and_then(|r| r.color)
    }

    /// Name or a placeholder for players we never heard of.
    pub fn display(&self, id: ObjectId) -> String {
        self.name(id).map_or_else(|| format!("Player {}", id.0), str::to_string)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn clear(&mut self) {
        self.records.clear();
    }
}

/// A bullet simulated locally from its spawn event.
#[derive(Debug, Clone)]
pub struct Bullet {
    pub definition: String,
    pub shooter: ObjectId,
    pub layer: Layer,
    origin: Vec2,
    direction: Vec2,
    /// Units per second.
    speed: f32,
    max_distance: f32,
    spawned_at: Instant,
    position: Vec2,
}

impl Bullet {
    pub fn spawn(data: &BulletData, now: Instant) -> anyhow::Result<Self> {
        ensure!(
            data.speed.is_finite() && data.speed > 0.0,
            "bullet speed out of range: {}",
            data.speed
        );
        ensure!(
            data.max_distance.is_finite() && data.max_distance > 0.0,
            "bullet range out of range: {}",
            data.max_distance
        );
        ensure!(data.rotation.is_finite(), "bullet rotation not finite");
        Ok(Self {
            definition: data.definition.clone(),
            shooter: data.shooter,
            layer: data.layer,
            origin: data.position,
            direction: Vec2::from_angle(data.rotation),
            speed: data.speed,
            max_distance: data.max_distance,
            spawned_at: now,
            position: data.position,
        })
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Advances to `now`. Returns false once the bullet has reached its range.
    pub fn update(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.spawned_at).as_secs_f32();
        let traveled = (self.speed * elapsed).min(self.max_distance);
        self.position = self.origin + self.direction.scale(traveled);
        traveled < self.max_distance
    }
}

/// An airdrop plane crossing the map.
#[derive(Debug, Clone)]
pub struct Plane {
    origin: Vec2,
    pub direction: f32,
    spawned_at: Instant,
    position: Vec2,
}

impl Plane {
    pub fn spawn(data: &PlaneData, now: Instant) -> anyhow::Result<Self> {
        ensure!(
            data.position.x.is_finite() && data.position.y.is_finite(),
            "plane position not finite: {:?}",
            data.position
        );
        ensure!(data.direction.is_finite(), "plane direction not finite");
        Ok(Self {
            origin: data.position,
            direction: data.direction,
            spawned_at: now,
            position: data.position,
        })
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    /// Returns false once the plane's lifetime is over.
    pub fn update(&mut self, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.spawned_at);
        self.position = self.origin + Vec2::from_angle(self.direction).scale(PLANE_SPEED * elapsed.as_secs_f32());
        elapsed < PLANE_LIFETIME
    }
}

/// A ping marker on the minimap.
#[derive(Debug, Clone)]
pub struct ActivePing {
    pub definition: String,
    pub position: Vec2,
    pub player: Option<ObjectId>,
    expires_at: Instant,
}

impl ActivePing {
    pub fn new(data: &MapPingData, now: Instant) -> Self {
        Self {
            definition: data.definition.clone(),
            position: data.position,
            player: data.player_id,
            expires_at: now + PING_LIFETIME,
        }
    }

    pub fn expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// Local copy of the shrinking hazard zone.
#[derive(Debug, Clone)]
pub struct GasZone {
    state: GasData,
    progress: f32,
}

impl Default for GasZone {
    fn default() -> Self {
        Self {
            state: GasData {
                phase: GasPhase::Inactive,
                duration: 0,
                old_position: Vec2::ZERO,
                new_position: Vec2::ZERO,
                old_radius: 0.0,
                new_radius: 0.0,
            },
            progress: 0.0,
        }
    }
}

impl GasZone {
    /// Merges the gas fields of one delta. `full` replaces the whole state and
    /// restarts progress; `progress` alone only moves the shrink forward.
    pub fn merge(&mut self, full: Option<&GasData>, progress: Option<f32>) -> anyhow::Result<()> {
        if let Some(p) = progress {
            ensure!((0.0..=1.0).contains(&p), "gas progress out of range: {}", p);
        }
        if let Some(state) = full {
            ensure!(
                state.old_radius.is_finite() && state.new_radius.is_finite() && state.new_radius >= 0.0,
                "gas radius out of range"
            );
            self.state = state.clone();
            self.progress = 0.0;
        }
        if let Some(p) = progress {
            self.progress = p;
        }
        Ok(())
    }

    pub fn phase(&self) -> GasPhase {
        self.state.phase
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn state(&self) -> &GasData {
        &self.state
    }

    /// Time left in the current phase, from its length and the last progress.
    pub fn time_remaining(&self) -> Duration {
        Duration::from_secs(u64::from(self.state.duration)).mul_f32(1.0 - self.progress)
    }

    /// Radius to render now.
    pub fn current_radius(&self) -> f32 {
        match self.state.phase {
            GasPhase::Advancing => {
                let (from, to) = (self.state.old_radius, self.state.new_radius);
                from + (to - from) * self.progress
            }
            _ => self.state.old_radius,
        }
    }

    /// Center to render now.
    pub fn current_position(&self) -> Vec2 {
        match self.state.phase {
            GasPhase::Advancing => self.state.old_position.lerp(self.state.new_position, self.progress),
            _ => self.state.old_position,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bullet_stops_at_max_distance() {
        let now = Instant::now();
        let mut bullet = Bullet::spawn(
            &BulletData {
                definition: "9mm".into(),
                shooter: ObjectId(1),
                position: Vec2::ZERO,
                rotation: 0.0,
                layer: Layer::GROUND,
                speed: 100.0,
                max_distance: 50.0,
            },
            now,
        )
        .unwrap();
        assert!(bullet.update(now + Duration::from_millis(250)));
        assert!((bullet.position().x - 25.0).abs() < 1e-3);
        assert!(!bullet.update(now + Duration::from_secs(1)));
        assert!((bullet.position().x - 50.0).abs() < 1e-3);
    }

    #[test]
    fn bullet_with_bad_speed_is_rejected() {
        let data = BulletData {
            definition: "9mm".into(),
            shooter: ObjectId(1),
            position: Vec2::ZERO,
            rotation: 0.0,
            layer: Layer::GROUND,
            speed: f32::INFINITY,
            max_distance: 50.0,
        };
        assert!(Bullet::spawn(&data, Instant::now()).is_err());
    }

    #[test]
    fn gas_lerps_by_progress() {
        let mut gas = GasZone::default();
        gas.merge(
            Some(&GasData {
                phase: GasPhase::Advancing,
                duration: 30,
                old_position: Vec2::new(0.0, 0.0),
                new_position: Vec2::new(100.0, 0.0),
                old_radius: 200.0,
                new_radius: 100.0,
            }),
            None,
        )
        .unwrap();
        assert_eq!(gas.current_radius(), 200.0);

        gas.merge(None, Some(0.5)).unwrap();
        assert_eq!(gas.current_radius(), 150.0);
        assert_eq!(gas.current_position(), Vec2::new(50.0, 0.0));

        assert_eq!(gas.time_remaining(), Duration::from_secs(15));

        assert!(gas.merge(None, Some(1.5)).is_err());
        assert_eq!(gas.progress(), 0.5);
    }

    #[test]
    fn inactive_gas_has_no_time_left() {
        assert_eq!(GasZone::default().time_remaining(), Duration::ZERO);
    }

    #[test]
    fn plane_with_non_finite_spawn_is_rejected() {
        let now = Instant::now();
        let bad_position = PlaneData {
            position: Vec2::new(f32::NAN, 0.0),
            direction: 0.0,
        };
        assert!(Plane::spawn(&bad_position, now).is_err());
        let bad_direction = PlaneData {
            position: Vec2::ZERO,
            direction: f32::INFINITY,
        };
        assert!(Plane::spawn(&bad_direction, now).is_err());

        let mut plane = Plane::spawn(
            &PlaneData {
                position: Vec2::ZERO,
                direction: 0.0,
            },
            now,
        )
        .unwrap();
        assert!(plane.update(now + Duration::from_secs(1)));
        assert!((plane.position().x - PLANE_SPEED).abs() < 1e-3);
        assert!(!plane.update(now + PLANE_LIFETIME));
    }

    #[test]
    fn ping_expires() {
        let now = Instant::now();
        let ping = ActivePing::new(
            &MapPingData {
                definition: "warning".into(),
                position: Vec2::new(4.0, 4.0),
                player_id: None,
            },
            now,
        );
        assert!(!ping.expired(now));
        assert!(ping.expired(now + PING_LIFETIME));
    }

    #[test]
    fn name_registry_round_trip() {
        let mut names = PlayerNames::default();
        names.insert(&PlayerNameRecord {
            id: ObjectId(2),
            name: "ace".into(),
            color: Some(0xff0000),
        });
        assert_eq!(names.name(ObjectId(2)), Some("ace"));
        assert_eq!(names.color(ObjectId(2)), Some(0xff0000));
        assert_eq!(names.display(ObjectId(9)), "Player 9");
        assert!(names.remove(ObjectId(2)));
        assert!(!names.remove(ObjectId(2)));
    }
}
