use std::collections::BTreeMap;

use arrayvec::ArrayVec;

use crate::config::GameConfig;

use super::{FleetArena, FleetId, Position, RealmId};

type OccupantSlots = ArrayVec<TileOccupant, { GameConfig::MAX_OCCUPANTS_PER_TILE }>;

/// A planet site layered on top of the static map geometry.
///
/// Planets are mutable world state: colonization grants ownership and the
/// end-of-turn pass recomputes production, so they cannot live behind the
/// read-only map oracle.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Planet {
    pub owner: Option<RealmId>,
    pub population: u32,
    pub gas_giant: bool,
    pub production: u32,
    /// Accumulated cultural decay, reset at the end of every turn.
    pub culture_decay: u32,
    /// Orbital defense installation.
    pub starbase: bool,
}

impl Planet {
    pub fn unowned() -> Self {
        Self {
            owner: None,
            population: 0,
            gas_giant: false,
            production: 0,
            culture_decay: 0,
            starbase: false,
        }
    }

    pub fn owned_by(owner: RealmId, population: u32) -> Self {
        Self {
            owner: Some(owner),
            population,
            ..Self::unowned()
        }
    }

    pub fn gas_giant() -> Self {
        Self {
            gas_giant: true,
            ..Self::unowned()
        }
    }

    pub fn with_starbase(mut self) -> Self {
        self.starbase = true;
        self
    }

    pub fn is_colonizable(&self) -> bool {
        self.owner.is_none() && !self.gas_giant
    }
}

/// A fleet standing on a tile, as recorded by the fleet-tile index.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TileOccupant {
    pub realm: RealmId,
    pub fleet: FleetId,
}

/// Positional index of every fleet on the map.
///
/// Rebuilt wholesale from the fleet arena whenever any fleet relocates;
/// incremental patching is forbidden to avoid stale-cache bugs.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FleetTileIndex {
    occupancy: BTreeMap<Position, OccupantSlots>,
}

impl FleetTileIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard and re-derive the whole index from the arena.
    pub fn rebuild(&mut self, fleets: &FleetArena) {
        self.occupancy.clear();
        for (id, fleet) in fleets.iter() {
            let slot = self.occupancy.entry(fleet.position).or_default();
            let occupant = TileOccupant {
                realm: fleet.owner,
                fleet: id,
            };
            // Overflow beyond the slot capacity drops the extra entry; the
            // scheduler merges co-located fleets before it can persist.
            let _ = slot.try_push(occupant);
        }
    }

    pub fn occupants(&self, position: Position) -> &[TileOccupant] {
        self.occupancy
            .get(&position)
            .map(|slot| slot.as_slice())
            .unwrap_or(&[])
    }

    /// The first recorded occupant, which is the canonical claim holder
    /// for ownership checks.
    pub fn claim_holder(&self, position: Position) -> Option<TileOccupant> {
        self.occupants(position).first().copied()
    }

    /// First occupant belonging to a different realm than `realm`.
    pub fn foreign_occupant(&self, position: Position, realm: RealmId) -> Option<TileOccupant> {
        self.occupants(position)
            .iter()
            .find(|occupant| occupant.realm != realm)
            .copied()
    }

    pub fn is_occupied(&self, position: Position) -> bool {
        !self.occupants(position).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::Fleet;

    #[test]
    fn rebuild_reflects_arena_exactly() {
        let mut arena = FleetArena::new();
        let a = arena.insert(Fleet::new("A", RealmId(0), Position::new(1, 1), 2));
        let _ = arena.insert(Fleet::new("B", RealmId(1), Position::new(2, 2), 2));

        let mut index = FleetTileIndex::new();
        index.rebuild(&arena);
        assert_eq!(index.occupants(Position::new(1, 1)).len(), 1);
        assert_eq!(index.claim_holder(Position::new(1, 1)).unwrap().fleet, a);

        arena.get_mut(a).unwrap().position = Position::new(3, 3);
        index.rebuild(&arena);
        assert!(!index.is_occupied(Position::new(1, 1)));
        assert!(index.is_occupied(Position::new(3, 3)));
    }

    #[test]
    fn foreign_occupant_skips_own_fleets() {
        let mut arena = FleetArena::new();
        let _ = arena.insert(Fleet::new("A", RealmId(0), Position::new(1, 1), 2));
        let b = arena.insert(Fleet::new("B", RealmId(1), Position::new(1, 1), 2));
        let mut index = FleetTileIndex::new();
        index.rebuild(&arena);

        let foreign = index.foreign_occupant(Position::new(1, 1), RealmId(0)).unwrap();
        assert_eq!(foreign.fleet, b);
        assert!(index.foreign_occupant(Position::new(1, 1), RealmId(1)).is_some());
    }
}
