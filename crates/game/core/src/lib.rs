//! Deterministic turn-processing core for a turn-based space-strategy
//! simulation.
//!
//! The crate advances a shared universe one discrete turn per cycle:
//! a cooperative scheduler processes at most one automated fleet per
//! tick, missions advance through per-kind phase graphs, path search
//! runs a deterministic A*, and movement conflicts escalate into war
//! declarations or combat hand-offs. All state mutation flows through
//! [`engine::Game`]; presentation, audio, and combat math live behind
//! the interfaces in [`env`] and [`engine::StateObserver`].
pub mod config;
pub mod conflict;
pub mod engine;
pub mod env;
pub mod error;
pub mod mission;
pub mod path;
pub mod state;

pub use config::GameConfig;
pub use conflict::{CombatTicket, ContactFlags, MoveOutcome, MoveProbe};
pub use engine::{
    Game, GameScreen, GameStateMachine, NullObserver, PresentationHint, StateObserver, TickError,
    TickOutcome, TransitionPayload, TurnScheduler,
};
pub use env::{
    AttritionCombat, CombatOracle, CombatOutcome, CombatSide, Env, GameEnv, GridMap, MapDimensions,
    MapOracle, OracleError,
};
pub use error::ErrorSeverity;
pub use path::{PathResult, SearchDepth, find_path};
pub use state::{
    Commander, DiplomaticOffer, DiplomaticStance, Fleet, FleetArena, FleetId, FleetTileIndex,
    Mission, MissionKind, MissionPhase, OfferKind, PathSearch, Planet, Position, Realm, RealmId,
    Route, TileOccupant, TurnMessage, WorldContext,
};
