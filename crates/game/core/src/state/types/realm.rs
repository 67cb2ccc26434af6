use std::collections::{BTreeMap, BTreeSet};

use super::{FleetId, Mission, Position, RealmId};

/// Diplomatic relation between two realms. Stored per realm, keyed by the
/// other realm's index; kept symmetric by the world-level helpers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DiplomaticStance {
    Peace,
    War,
    Alliance,
    DefensivePact,
    NonAggression,
}

/// Category of an automatically generated diplomatic offer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum OfferKind {
    War,
    Peace,
    Trade,
}

/// An equal-value exchange proposal recorded on both participating realms.
/// War declarations generate one of kind `War` with zero value either way.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DiplomaticOffer {
    pub kind: OfferKind,
    pub with: RealmId,
    pub give: u32,
    pub take: u32,
}

/// Turn-scoped notification for the realm's message queue. Drained by the
/// presentation layer after each completed turn.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TurnMessage {
    FleetIdle { fleet: FleetId },
    FleetBlocked { fleet: FleetId, at: Position },
    FleetArrived { fleet: FleetId, at: Position },
    WarDeclared { with: RealmId },
    PactActivated { defender: RealmId, against: RealmId },
    PlanetColonized { at: Position },
    ExplorationComplete { at: Position },
    ContactSighted { at: Position },
}

/// One competing faction. Owned exclusively by the world; realms address
/// each other only by [`RealmId`].
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Realm {
    pub id: RealmId,
    pub is_human: bool,
    /// Owned fleets in processing order. The scheduler visits this list by
    /// ascending index; the order is a documented determinism contract.
    pub fleets: Vec<FleetId>,
    pub missions: Vec<Mission>,
    relations: BTreeMap<RealmId, DiplomaticStance>,
    pub messages: Vec<TurnMessage>,
    pub offers: Vec<DiplomaticOffer>,
    /// Sectors this realm has scanned at least once.
    pub explored: BTreeSet<Position>,
    /// Race-specific limit on how long an Explore mission lingers at one
    /// system before retargeting.
    pub exploration_patience: u32,
    pub reputation: i32,
}

impl Realm {
    pub fn new(id: RealmId, is_human: bool, exploration_patience: u32) -> Self {
        Self {
            id,
            is_human,
            fleets: Vec::new(),
            missions: Vec::new(),
            relations: BTreeMap::new(),
            messages: Vec::new(),
            offers: Vec::new(),
            explored: BTreeSet::new(),
            exploration_patience,
            reputation: 0,
        }
    }

    /// Relation toward another realm. Unknown realms default to peace.
    pub fn stance(&self, other: RealmId) -> DiplomaticStance {
        self.relations
            .get(&other)
            .copied()
            .unwrap_or(DiplomaticStance::Peace)
    }

    pub fn set_stance(&mut self, other: RealmId, stance: DiplomaticStance) {
        self.relations.insert(other, stance);
    }

    /// Whether this realm has established diplomatic contact with another.
    pub fn recognizes(&self, other: RealmId) -> bool {
        self.relations.contains_key(&other)
    }

    /// Realms holding a defensive pact with this one, in index order.
    pub fn defensive_allies(&self) -> impl Iterator<Item = RealmId> + '_ {
        self.relations
            .iter()
            .filter(|(_, stance)| **stance == DiplomaticStance::DefensivePact)
            .map(|(id, _)| *id)
    }

    pub fn push_message(&mut self, message: TurnMessage) {
        self.messages.push(message);
    }

    /// Find the mission bound to a fleet, if any.
    pub fn mission_for(&self, fleet: FleetId) -> Option<usize> {
        self.missions
            .iter()
            .position(|mission| mission.fleet == Some(fleet))
    }

    /// Whether any mission already targets the given coordinate. Used to
    /// keep colonizable-planet discovery idempotent.
    pub fn has_mission_targeting(&self, target: Position) -> bool {
        self.missions.iter().any(|mission| mission.target == target)
    }
}
