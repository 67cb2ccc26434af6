/// Tuning constants for the turn engine.
///
/// Kept on one struct and passed explicitly so tests can tighten or relax
/// individual knobs without touching global state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GameConfig {
    /// Chebyshev radius revealed around a fleet after it relocates.
    pub scan_radius: u32,
    /// Depth bound (in steps) for the cheap local detour search.
    pub detour_depth: u32,
    /// Movement allowance granted to fleets at the start of each turn
    /// when the fleet itself does not specify one.
    pub default_moves_per_turn: u32,
    /// Default race patience for Explore missions, in executing ticks.
    pub exploration_patience: u32,
    /// Executing ticks between Defend mission refresh passes.
    pub defend_refresh_interval: u32,
    /// Loading ticks a Trade mission spends taking on cargo.
    pub trade_load_ticks: u32,
    /// Colonists transferred per Loading tick.
    pub loading_rate: u32,
    /// Reputation cost of declaring war.
    pub war_reputation_penalty: i32,
    /// Commander experience granted for a wormhole transit.
    pub wormhole_xp_bonus: u32,
    /// Production points contributed by each unit of population.
    pub production_per_pop: u32,
    /// Extra production from an intact starbase.
    pub starbase_production_bonus: u32,
    /// Effective ship strength of a starbase garrison in fast combat.
    pub starbase_strength: u32,
}

impl GameConfig {
    /// Upper bound on fleets transiently sharing one tile (merge window).
    pub const MAX_OCCUPANTS_PER_TILE: usize = 4;
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            scan_radius: 2,
            detour_depth: 6,
            default_moves_per_turn: 2,
            exploration_patience: 4,
            defend_refresh_interval: 8,
            trade_load_ticks: 2,
            loading_rate: 1,
            war_reputation_penalty: 10,
            wormhole_xp_bonus: 1,
            production_per_pop: 2,
            starbase_production_bonus: 5,
            starbase_strength: 3,
        }
    }
}
