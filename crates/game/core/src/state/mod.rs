//! Authoritative world state representation.
//!
//! This module owns the data structures describing realms, fleets,
//! planets, and turn bookkeeping. Components receive the [`WorldContext`]
//! explicitly by reference; there is no global world singleton, which
//! keeps test instances independent and turn processing deterministic.
pub mod types;

use std::collections::BTreeMap;

use crate::env::MapOracle;

pub use types::{
    Commander, DiplomaticOffer, DiplomaticStance, Fleet, FleetArena, FleetId, FleetTileIndex,
    Mission, MissionKind, MissionPhase, OfferKind, PathSearch, Planet, Position, Realm, RealmId,
    Route, TileOccupant, TurnMessage,
};

/// Root of the mutable simulation state, passed into every component call.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WorldContext {
    /// Monotonic turn counter. May start negative for simulated
    /// historical head-start turns; mutated only by the scheduler.
    pub turn: i32,
    realms: Vec<Realm>,
    pub fleets: FleetArena,
    pub planets: BTreeMap<Position, Planet>,
    pub tiles: FleetTileIndex,
}

impl WorldContext {
    pub fn new(starting_turn: i32) -> Self {
        Self {
            turn: starting_turn,
            realms: Vec::new(),
            fleets: FleetArena::new(),
            planets: BTreeMap::new(),
            tiles: FleetTileIndex::new(),
        }
    }

    pub fn add_realm(&mut self, is_human: bool, exploration_patience: u32) -> RealmId {
        let id = RealmId(self.realms.len() as u32);
        self.realms.push(Realm::new(id, is_human, exploration_patience));
        id
    }

    pub fn realm(&self, id: RealmId) -> Option<&Realm> {
        self.realms.get(id.index())
    }

    pub fn realm_mut(&mut self, id: RealmId) -> Option<&mut Realm> {
        self.realms.get_mut(id.index())
    }

    pub fn realms(&self) -> impl Iterator<Item = &Realm> {
        self.realms.iter()
    }

    pub fn realm_count(&self) -> usize {
        self.realms.len()
    }

    pub fn human_realm(&self) -> Option<RealmId> {
        self.realms.iter().find(|realm| realm.is_human).map(|realm| realm.id)
    }

    /// Register a fleet with its owning realm and refresh the tile index.
    pub fn spawn_fleet(&mut self, fleet: Fleet) -> FleetId {
        let owner = fleet.owner;
        let id = self.fleets.insert(fleet);
        if let Some(realm) = self.realms.get_mut(owner.index()) {
            realm.fleets.push(id);
        }
        self.tiles.rebuild(&self.fleets);
        id
    }

    /// Remove a fleet from the arena and its owner's list. Missions bound
    /// to it become orphans and are reaped on the next scheduler pass.
    pub fn remove_fleet(&mut self, id: FleetId) {
        if let Some(fleet) = self.fleets.remove(id) {
            if let Some(realm) = self.realms.get_mut(fleet.owner.index()) {
                realm.fleets.retain(|held| *held != id);
            }
        }
        self.tiles.rebuild(&self.fleets);
    }

    pub fn add_planet(&mut self, position: Position, planet: Planet) {
        self.planets.insert(position, planet);
    }

    pub fn planet_at(&self, position: Position) -> Option<&Planet> {
        self.planets.get(&position)
    }

    pub fn planet_at_mut(&mut self, position: Position) -> Option<&mut Planet> {
        self.planets.get_mut(&position)
    }

    // ------------------------------------------------------------------
    // Diplomacy
    // ------------------------------------------------------------------

    pub fn is_war(&self, a: RealmId, b: RealmId) -> bool {
        self.realm(a)
            .map(|realm| realm.stance(b) == DiplomaticStance::War)
            .unwrap_or(false)
    }

    /// Set a symmetric stance between two realms.
    pub fn set_stance_pair(&mut self, a: RealmId, b: RealmId, stance: DiplomaticStance) {
        if a == b {
            return;
        }
        if let Some(realm) = self.realms.get_mut(a.index()) {
            realm.set_stance(b, stance);
        }
        if let Some(realm) = self.realms.get_mut(b.index()) {
            realm.set_stance(a, stance);
        }
    }

    /// Record first diplomatic contact without changing an existing stance.
    pub fn establish_contact(&mut self, a: RealmId, b: RealmId) {
        if a == b {
            return;
        }
        if let Some(realm) = self.realms.get_mut(a.index()) {
            if !realm.recognizes(b) {
                realm.set_stance(b, DiplomaticStance::Peace);
            }
        }
        if let Some(realm) = self.realms.get_mut(b.index()) {
            if !realm.recognizes(a) {
                realm.set_stance(a, DiplomaticStance::Peace);
            }
        }
    }

    // ------------------------------------------------------------------
    // Map-coupled queries
    // ------------------------------------------------------------------

    /// Mark every valid sector within `radius` (Chebyshev) of `center` as
    /// explored by the realm.
    pub fn scan_update<M>(&mut self, realm_id: RealmId, map: &M, center: Position, radius: u32)
    where
        M: MapOracle + ?Sized,
    {
        let Some(realm) = self.realms.get_mut(realm_id.index()) else {
            return;
        };
        let r = radius as i32;
        for dy in -r..=r {
            for dx in -r..=r {
                let position = Position::new(center.x + dx, center.y + dy);
                if map.contains(position) {
                    realm.explored.insert(position);
                }
            }
        }
    }

    /// Nearest sector the realm has not explored yet, with a stable
    /// (distance, position) tie-break so identical state retargets
    /// identically.
    pub fn nearest_unexplored<M>(&self, realm_id: RealmId, map: &M, origin: Position) -> Option<Position>
    where
        M: MapOracle + ?Sized,
    {
        let realm = self.realm(realm_id)?;
        let dims = map.dimensions();
        let mut best: Option<(u64, Position)> = None;
        for y in 0..dims.height as i32 {
            for x in 0..dims.width as i32 {
                let position = Position::new(x, y);
                if map.is_blocked(position) || realm.explored.contains(&position) {
                    continue;
                }
                let distance = origin.distance_sq(position);
                let candidate = (distance, position);
                let better = match best {
                    Some((held, at)) => distance < held || (distance == held && position < at),
                    None => true,
                };
                if better {
                    best = Some(candidate);
                }
            }
        }
        best.map(|(_, position)| position)
    }

    /// Drop missions whose bound fleet no longer exists.
    pub fn reap_orphan_missions(&mut self, realm_id: RealmId) {
        let fleets = &self.fleets;
        if let Some(realm) = self.realms.get_mut(realm_id.index()) {
            realm
                .missions
                .retain(|mission| mission.fleet.is_none_or(|id| fleets.contains(id)));
        }
    }
}
