//! Synchronized object payloads and the per-tick world delta.
//!
//! Every payload field is optional. A full update carries every field; a
//! partial update carries only the fields that changed since the last tick.
//! Absent fields mean "unchanged", never "reset to default".

use serde::{Deserialize, Serialize};

use crate::math::Vec2;

/// Server-assigned slot key for a live object. Reused after the object dies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId(pub u16);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Vertical plane an object lives on (ground, bunker, upstairs).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Layer(pub i8);

impl Layer {
    pub const GROUND: Self = Layer(0);
    pub const BASEMENT: Self = Layer(-1);
    pub const UPSTAIRS: Self = Layer(1);
}

/// Static type tag of a synchronized object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectCategory {
    Player,
    Obstacle,
    DeathMarker,
    Loot,
    Building,
    Decal,
    Parachute,
    ThrowableProjectile,
    SyncedParticle,
    Projectile,
}

impl ObjectCategory {
    pub const ALL: [ObjectCategory; 10] = [
        ObjectCategory::Player,
        ObjectCategory::Obstacle,
        ObjectCategory::DeathMarker,
        ObjectCategory::Loot,
        ObjectCategory::Building,
        ObjectCategory::Decal,
        ObjectCategory::Parachute,
        ObjectCategory::ThrowableProjectile,
        ObjectCategory::SyncedParticle,
        ObjectCategory::Projectile,
    ];
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerData {
    pub position: Option<Vec2>,
    pub rotation: Option<f32>,
    pub layer: Option<Layer>,
    pub hp: Option<f32>,
    pub dead: Option<bool>,
    pub invulnerable: Option<bool>,
    pub team_id: Option<u8>,
    pub active_item: Option<String>,
    pub skin: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleData {
    pub definition: Option<String>,
    pub position: Option<Vec2>,
    pub rotation: Option<f32>,
    pub layer: Option<Layer>,
    pub scale: Option<f32>,
    pub dead: Option<bool>,
    /// Only meaningful for door obstacles.
    pub door_open: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeathMarkerData {
    pub position: Option<Vec2>,
    pub layer: Option<Layer>,
    pub player_id: Option<ObjectId>,
    /// Set on the tick the marker appears, so the client plays the drop-in.
    pub fresh: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LootData {
    pub definition: Option<String>,
    pub position: Option<Vec2>,
    pub layer: Option<Layer>,
    pub count: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildingData {
    pub definition: Option<String>,
    pub position: Option<Vec2>,
    pub rotation: Option<f32>,
    pub layer: Option<Layer>,
    /// Ceiling collapsed.
    pub dead: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecalData {
    pub definition: Option<String>,
    pub position: Option<Vec2>,
    pub rotation: Option<f32>,
    pub layer: Option<Layer>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParachuteData {
    pub position: Option<Vec2>,
    /// 1.0 at spawn, 0.0 on landing.
    pub height: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThrowableData {
    pub definition: Option<String>,
    pub position: Option<Vec2>,
    pub rotation: Option<f32>,
    pub layer: Option<Layer>,
    pub airborne: Option<bool>,
    pub activated: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncedParticleData {
    pub definition: Option<String>,
    pub position: Option<Vec2>,
    pub rotation: Option<f32>,
    pub layer: Option<Layer>,
    pub scale: Option<f32>,
    pub alpha: Option<f32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectileData {
    pub definition: Option<String>,
    pub position: Option<Vec2>,
    pub rotation: Option<f32>,
    pub layer: Option<Layer>,
    pub owner: Option<ObjectId>,
}

/// Per-category payload of one object entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ObjectData {
    Player(PlayerData),
    Obstacle(ObstacleData),
    DeathMarker(DeathMarkerData),
    Loot(LootData),
    Building(BuildingData),
    Decal(DecalData),
    Parachute(ParachuteData),
    ThrowableProjectile(ThrowableData),
    SyncedParticle(SyncedParticleData),
    Projectile(ProjectileData),
}

impl ObjectData {
    /// The category this payload shape belongs to.
    pub fn category(&self) -> ObjectCategory {
        match self {
            ObjectData::Player(_) => ObjectCategory::Player,
            ObjectData::Obstacle(_) => ObjectCategory::Obstacle,
            ObjectData::DeathMarker(_) => ObjectCategory::DeathMarker,
            ObjectData::Loot(_) => ObjectCategory::Loot,
            ObjectData::Building(_) => ObjectCategory::Building,
            ObjectData::Decal(_) => ObjectCategory::Decal,
            ObjectData::Parachute(_) => ObjectCategory::Parachute,
            ObjectData::ThrowableProjectile(_) => ObjectCategory::ThrowableProjectile,
            ObjectData::SyncedParticle(_) => ObjectCategory::SyncedParticle,
            ObjectData::Projectile(_) => ObjectCategory::Projectile,
        }
    }
}

/// Object whose entire state must be (re)applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullObject {
    pub id: ObjectId,
    pub category: ObjectCategory,
    pub data: ObjectData,
}

/// Incremental update for an object the client already knows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartialObject {
    pub id: ObjectId,
    pub data: ObjectData,
}

/// Name record for a player that entered the game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerNameRecord {
    pub id: ObjectId,
    pub name: String,
    #[serde(default)]
    pub color: Option<u32>,
}

/// Local player's own status summary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerStatus {
    pub id: Option<ObjectId>,
    pub health: Option<f32>,
    pub adrenaline: Option<f32>,
    pub zoom: Option<u8>,
    pub spectating: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BulletData {
    pub definition: String,
    pub shooter: ObjectId,
    pub position: Vec2,
    pub rotation: f32,
    pub layer: Layer,
    pub speed: f32,
    pub max_distance: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplosionData {
    pub definition: String,
    pub position: Vec2,
    pub layer: Layer,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmoteData {
    pub player_id: ObjectId,
    pub emote: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapPingData {
    pub definition: String,
    pub position: Vec2,
    #[serde(default)]
    pub player_id: Option<ObjectId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaneData {
    pub position: Vec2,
    pub direction: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum GasPhase {
    #[default]
    Inactive,
    Waiting,
    Advancing,
}

/// Full gas/hazard-zone state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GasData {
    pub phase: GasPhase,
    /// Phase length in seconds.
    pub duration: u32,
    pub old_position: Vec2,
    pub new_position: Vec2,
    pub old_radius: f32,
    pub new_radius: f32,
}

/// One server tick's world delta plus the events riding with it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldDelta {
    pub player_data: Option<PlayerStatus>,
    pub new_players: Vec<PlayerNameRecord>,
    pub deleted_players: Vec<ObjectId>,
    pub full_dirty_objects: Vec<FullObject>,
    pub partial_dirty_objects: Vec<PartialObject>,
    pub deleted_objects: Vec<ObjectId>,
    pub bullets: Vec<BulletData>,
    pub explosions: Vec<ExplosionData>,
    pub emotes: Vec<EmoteData>,
    pub map_pings: Vec<MapPingData>,
    pub planes: Vec<PlaneData>,
    pub gas: Option<GasData>,
    pub gas_progress: Option<f32>,
    pub alive_count: Option<u32>,
}

impl FullObject {
    pub fn new(id: u16, data: ObjectData) -> Self {
        Self {
            id: ObjectId(id),
            category: data.category(),
            data,
        }
    }
}

impl PartialObject {
    pub fn new(id: u16, data: ObjectData) -> Self {
        Self {
            id: ObjectId(id),
            data,
        }
    }
}
