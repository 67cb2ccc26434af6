//! Core state value types: ids, positions, fleets, realms, missions,
//! routes, and the positional fleet index.
mod common;
mod fleet;
mod mission;
mod realm;
mod route;
mod world;

pub use common::{FleetId, Position, RealmId};
pub use fleet::{Commander, Fleet, FleetArena};
pub use mission::{Mission, MissionKind, MissionPhase};
pub use realm::{DiplomaticOffer, DiplomaticStance, OfferKind, Realm, TurnMessage};
pub use route::{PathSearch, Route};
pub use world::{FleetTileIndex, Planet, TileOccupant};
