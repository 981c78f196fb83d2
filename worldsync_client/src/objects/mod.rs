//! Concrete synchronized object types.

mod building;
mod decor;
mod loot;
mod marker;
mod obstacle;
mod player;
mod projectile;

pub use building::Building;
pub use decor::{Decal, Parachute, SyncedParticle};
pub use loot::Loot;
pub use marker::{DeathMarker, MARKER_SETTLE_DELAY};
pub use obstacle::Obstacle;
pub use player::{Player, EMOTE_DURATION};
pub use projectile::{Projectile, ThrowableProjectile};

use worldsync_shared::protocol::{ObjectCategory, ObjectId};

use crate::object::GameObject;

/// Builds an empty object of the given category.
///
/// The match is exhaustive: adding a category without a constructor does not
/// compile.
pub fn construct(category: ObjectCategory, id: ObjectId) -> Box<dyn GameObject> {
    match category {
        ObjectCategory::Player => Box::new(Player::new(id)),
        ObjectCategory::Obstacle => Box::new(Obstacle::new(id)),
        ObjectCategory::DeathMarker => Box::new(DeathMarker::new(id)),
        ObjectCategory::Loot => Box::new(Loot::new(id)),
        ObjectCategory::Building => Box::new(Building::new(id)),
        ObjectCategory::Decal => Box::new(Decal::new(id)),
        ObjectCategory::Parachute => Box::new(Parachute::new(id)),
        ObjectCategory::ThrowableProjectile => Box::new(ThrowableProjectile::new(id)),
        ObjectCategory::SyncedParticle => Box::new(SyncedParticle::new(id)),
        ObjectCategory::Projectile => Box::new(Projectile::new(id)),
    }
}
