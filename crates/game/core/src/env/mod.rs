//! Traits describing the engine's external collaborators.
//!
//! Oracles expose static map geometry and the opaque combat resolver.
//! The [`Env`] aggregate bundles them so the turn engine can reach
//! everything it needs without hard coupling to concrete implementations.
mod combat;
mod error;
mod map;

pub use combat::{AttritionCombat, CombatOracle, CombatOutcome, CombatSide};
pub use error::OracleError;
pub use map::{GridMap, MapDimensions, MapOracle};

/// Aggregates the read-only collaborators required by the turn pipeline.
#[derive(Clone, Copy, Debug)]
pub struct Env<'a, M, C>
where
    M: MapOracle + ?Sized,
    C: CombatOracle + ?Sized,
{
    map: Option<&'a M>,
    combat: Option<&'a C>,
}

pub type GameEnv<'a> = Env<'a, dyn MapOracle + 'a, dyn CombatOracle + 'a>;

impl<'a, M, C> Env<'a, M, C>
where
    M: MapOracle + ?Sized,
    C: CombatOracle + ?Sized,
{
    pub fn new(map: Option<&'a M>, combat: Option<&'a C>) -> Self {
        Self { map, combat }
    }

    pub fn with_all(map: &'a M, combat: &'a C) -> Self {
        Self::new(Some(map), Some(combat))
    }

    pub fn empty() -> Self {
        Self {
            map: None,
            combat: None,
        }
    }

    /// Returns the MapOracle, or an error if not available.
    pub fn map(&self) -> Result<&'a M, OracleError> {
        self.map.ok_or(OracleError::MapNotAvailable)
    }

    /// Returns the CombatOracle, or an error if not available.
    pub fn combat(&self) -> Result<&'a C, OracleError> {
        self.combat.ok_or(OracleError::CombatNotAvailable)
    }
}

impl<'a, M, C> Env<'a, M, C>
where
    M: MapOracle + 'a,
    C: CombatOracle + 'a,
{
    /// Converts this environment into a trait-object based [`GameEnv`].
    pub fn as_game_env(&self) -> GameEnv<'a> {
        let map: Option<&'a dyn MapOracle> = self.map.map(|map| map as _);
        let combat: Option<&'a dyn CombatOracle> = self.combat.map(|combat| combat as _);
        Env::new(map, combat)
    }
}
