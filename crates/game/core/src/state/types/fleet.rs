use std::collections::BTreeMap;

use super::{FleetId, PathSearch, Position, RealmId, Route};

/// Officer attached to a fleet. Gains experience from notable transits.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Commander {
    pub name: String,
    pub experience: u32,
}

impl Commander {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            experience: 0,
        }
    }
}

/// A movable group of ships owned by a realm.
///
/// Mutated every tick it is processed; destroyed on loss of all ships or
/// by a combat outcome.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Fleet {
    /// Unique within the owning realm. Split fleets share a name prefix
    /// and are merged back together when co-located.
    pub name: String,
    pub owner: RealmId,
    pub position: Position,
    pub moves_left: u32,
    pub moves_per_turn: u32,
    pub ships: u32,
    /// Colonists carried in the colony module. Zero capacity means the
    /// fleet has no colony module.
    pub colonists: u32,
    pub colony_capacity: u32,
    pub commander: Option<Commander>,
    pub route: Option<Route>,
    pub search: Option<PathSearch>,
    /// Rogue fleets never trigger diplomatic conflict.
    pub privateer: bool,
    pub cloaked: bool,
    /// Set when a bounded detour search was discarded exhausted; the next
    /// obstruction escalates to an unbounded search.
    pub detour_spent: bool,
}

impl Fleet {
    pub fn new(name: impl Into<String>, owner: RealmId, position: Position, ships: u32) -> Self {
        Self {
            name: name.into(),
            owner,
            position,
            moves_left: 0,
            moves_per_turn: 0,
            ships,
            colonists: 0,
            colony_capacity: 0,
            commander: None,
            route: None,
            search: None,
            privateer: false,
            cloaked: false,
            detour_spent: false,
        }
    }

    pub fn with_moves(mut self, moves_per_turn: u32) -> Self {
        self.moves_per_turn = moves_per_turn;
        self.moves_left = moves_per_turn;
        self
    }

    pub fn with_colony_module(mut self, capacity: u32) -> Self {
        self.colony_capacity = capacity;
        self
    }

    pub fn with_commander(mut self, commander: Commander) -> Self {
        self.commander = Some(commander);
        self
    }

    pub fn as_privateer(mut self) -> Self {
        self.privateer = true;
        self
    }

    pub fn has_colony_module(&self) -> bool {
        self.colony_capacity > 0
    }

    /// Drop any in-flight navigation state (route and search).
    pub fn clear_navigation(&mut self) {
        self.route = None;
        self.search = None;
    }

    /// Fleets produced by splitting share the base name up to a `-` or
    /// trailing digits; two fleets merge when their prefixes match.
    pub fn name_prefix(&self) -> &str {
        match self.name.split_once('-') {
            Some((prefix, _)) => prefix,
            None => self.name.trim_end_matches(|c: char| c.is_ascii_digit()),
        }
    }
}

/// Arena of fleets with stable, never-reused integer handles.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetArena {
    slots: BTreeMap<FleetId, Fleet>,
    next_id: u32,
}

impl FleetArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, fleet: Fleet) -> FleetId {
        let id = FleetId(self.next_id);
        self.next_id = self.next_id.checked_add(1).expect("FleetId overflow");
        self.slots.insert(id, fleet);
        id
    }

    pub fn get(&self, id: FleetId) -> Option<&Fleet> {
        self.slots.get(&id)
    }

    pub fn get_mut(&mut self, id: FleetId) -> Option<&mut Fleet> {
        self.slots.get_mut(&id)
    }

    pub fn remove(&mut self, id: FleetId) -> Option<Fleet> {
        self.slots.remove(&id)
    }

    pub fn contains(&self, id: FleetId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (FleetId, &Fleet)> {
        self.slots.iter().map(|(id, fleet)| (*id, fleet))
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arena_handles_are_never_reused() {
        let mut arena = FleetArena::new();
        let a = arena.insert(Fleet::new("Scout", RealmId(0), Position::ORIGIN, 1));
        arena.remove(a);
        let b = arena.insert(Fleet::new("Scout", RealmId(0), Position::ORIGIN, 1));
        assert_ne!(a, b);
        assert!(!arena.contains(a));
        assert!(arena.contains(b));
    }

    #[test]
    fn name_prefix_strips_split_suffix() {
        let a = Fleet::new("Armada-2", RealmId(0), Position::ORIGIN, 3);
        let b = Fleet::new("Armada", RealmId(0), Position::ORIGIN, 3);
        assert_eq!(a.name_prefix(), "Armada");
        assert_eq!(b.name_prefix(), "Armada");
    }
}
