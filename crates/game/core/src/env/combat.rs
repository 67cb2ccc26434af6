use crate::state::Fleet;

/// Which side of an encounter prevailed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CombatSide {
    Attacker,
    Defender,
}

/// Outcome of an opaque combat resolution, merged back into map state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatOutcome {
    pub winner: CombatSide,
    pub attacker_losses: u32,
    pub defender_losses: u32,
    pub orbital_destroyed: bool,
}

/// External combat engine. The turn core treats combat math as opaque:
/// automated-vs-automated encounters call the synchronous fast path here,
/// human-involved encounters hand off to the interactive combat state.
pub trait CombatOracle: Send + Sync {
    fn fast_resolve(&self, attacker: &Fleet, defender: &Fleet) -> CombatOutcome;
}

/// Deterministic ship-count attrition resolver for tools and tests: the
/// larger fleet wins and loses as many ships as the smaller one had.
#[derive(Clone, Copy, Debug, Default)]
pub struct AttritionCombat;

impl CombatOracle for AttritionCombat {
    fn fast_resolve(&self, attacker: &Fleet, defender: &Fleet) -> CombatOutcome {
        if attacker.ships > defender.ships {
            CombatOutcome {
                winner: CombatSide::Attacker,
                attacker_losses: defender.ships,
                defender_losses: defender.ships,
                orbital_destroyed: false,
            }
        } else {
            CombatOutcome {
                winner: CombatSide::Defender,
                attacker_losses: attacker.ships,
                defender_losses: attacker.ships.saturating_sub(1),
                orbital_destroyed: false,
            }
        }
    }
}
