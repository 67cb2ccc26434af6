use super::{FleetId, Position};

/// Goal-directed behavior categories an automated realm can assign.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissionKind {
    Explore,
    Colonize,
    Defend,
    Trade,
}

/// Phase within a mission's per-kind state graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MissionPhase {
    /// No fleet bound yet, or a refresh pass is pending.
    Planning,
    /// Cargo/colonist transfer at the origin planet.
    Loading,
    /// Moving toward the target coordinate.
    Trekking,
    /// Acting at the destination (scan, colonize, hold, unload).
    Executing,
}

/// A goal bound to at most one fleet, owned by the realm's mission list.
///
/// The fleet handle is weak: the fleet can disappear mid-mission (combat,
/// merge) and the scheduler reaps the orphaned mission on its next pass.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Mission {
    pub kind: MissionKind,
    pub phase: MissionPhase,
    pub target: Position,
    /// Far endpoint of a two-leg cycle (Trade), or the loading planet.
    pub origin: Option<Position>,
    /// Ticks spent in the current phase.
    pub elapsed: u32,
    pub fleet: Option<FleetId>,
}

impl Mission {
    pub fn new(kind: MissionKind, target: Position) -> Self {
        let phase = match kind {
            MissionKind::Colonize => MissionPhase::Planning,
            MissionKind::Trade => MissionPhase::Loading,
            MissionKind::Explore | MissionKind::Defend => MissionPhase::Trekking,
        };
        Self {
            kind,
            phase,
            target,
            origin: None,
            elapsed: 0,
            fleet: None,
        }
    }

    pub fn bound_to(mut self, fleet: FleetId) -> Self {
        self.fleet = Some(fleet);
        self
    }

    /// Re-enter a phase, resetting the elapsed counter.
    pub fn enter_phase(&mut self, phase: MissionPhase) {
        self.phase = phase;
        self.elapsed = 0;
    }
}
