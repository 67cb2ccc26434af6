//! Cooperative turn scheduler.
//!
//! `tick()` advances the world by one small increment: at most one
//! automated fleet per invocation, so the external driver can interleave
//! presentation refresh between ticks. Fleets are processed in realm-index
//! order, then fleet-index order within a realm; this ordering is a
//! documented determinism contract. Once every automated realm has been
//! exhausted the scheduler performs colonizable-planet discovery and the
//! whole-map end-of-turn mutation, then reports cycle completion.

use std::collections::VecDeque;

use crate::config::GameConfig;
use crate::conflict::{self, MoveOutcome};
use crate::env::GameEnv;
use crate::mission;
use crate::state::{FleetId, Mission, MissionKind, RealmId, TurnMessage, WorldContext};

use super::errors::TickError;

/// Result of one scheduler invocation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A unit of work was performed; more remain in this cycle.
    Working,
    /// Every automated realm has been processed and the end-of-turn
    /// mutation ran; the turn counter has advanced.
    CycleComplete,
}

/// Drives automated realms forward one fleet at a time.
#[derive(Debug, Default)]
pub struct TurnScheduler {
    cycle_active: bool,
    realm_cursor: usize,
    realm_loaded: bool,
    pending: VecDeque<FleetId>,
}

impl TurnScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an automated-turn cycle is currently in flight. State
    /// transitions requested while this holds are deferred.
    pub fn is_mid_cycle(&self) -> bool {
        self.cycle_active
    }

    /// Perform one unit of work. Never reentrant; invoked by the external
    /// driver at its own cadence.
    pub fn tick(
        &mut self,
        world: &mut WorldContext,
        env: &GameEnv<'_>,
        config: &GameConfig,
    ) -> Result<TickOutcome, TickError> {
        if !self.cycle_active {
            self.cycle_active = true;
            self.realm_cursor = 0;
            self.realm_loaded = false;
            self.pending.clear();
        }

        loop {
            if self.realm_cursor >= world.realm_count() {
                self.finish_cycle(world, env, config)?;
                self.cycle_active = false;
                return Ok(TickOutcome::CycleComplete);
            }

            let realm_id = RealmId(self.realm_cursor as u32);
            let Some(realm) = world.realm(realm_id) else {
                return Err(TickError::RealmIndexOutOfRange {
                    index: self.realm_cursor,
                    count: world.realm_count(),
                });
            };

            if realm.is_human {
                self.realm_cursor += 1;
                self.realm_loaded = false;
                continue;
            }

            if !self.realm_loaded {
                self.enter_realm(world, env, config, realm_id);
                self.realm_loaded = true;
            }

            match self.pending.pop_front() {
                Some(fleet_id) => {
                    // The fleet may have merged away or been destroyed
                    // earlier in this cycle.
                    if !world.fleets.contains(fleet_id) {
                        continue;
                    }
                    merge_colocated(world, fleet_id);
                    mission::advance_fleet(world, env, config, realm_id, fleet_id);
                    return Ok(TickOutcome::Working);
                }
                None => {
                    self.realm_cursor += 1;
                    self.realm_loaded = false;
                }
            }
        }
    }

    /// Per-realm bookkeeping before its fleets are processed: orphaned
    /// missions are reaped and unbound missions get a planning pass.
    fn enter_realm(
        &mut self,
        world: &mut WorldContext,
        env: &GameEnv<'_>,
        config: &GameConfig,
        realm_id: RealmId,
    ) {
        world.reap_orphan_missions(realm_id);

        let unbound: Vec<usize> = world
            .realm(realm_id)
            .map(|realm| {
                realm
                    .missions
                    .iter()
                    .enumerate()
                    .filter(|(_, mission)| mission.fleet.is_none())
                    .map(|(index, _)| index)
                    .collect()
            })
            .unwrap_or_default();
        for index in unbound {
            mission::advance_mission(world, env, config, realm_id, index);
        }

        self.pending = world
            .realm(realm_id)
            .map(|realm| realm.fleets.iter().copied().collect())
            .unwrap_or_default();
    }

    fn finish_cycle(
        &mut self,
        world: &mut WorldContext,
        env: &GameEnv<'_>,
        config: &GameConfig,
    ) -> Result<(), TickError> {
        discover_colonizable(world);
        end_of_turn(world, env, config)
    }
}

/// Merge a co-located fleet sharing the same name prefix into `fleet_id`:
/// ships and colonists transfer, the donor fleet is deleted.
fn merge_colocated(world: &mut WorldContext, fleet_id: FleetId) {
    let Some((position, owner, prefix)) = world
        .fleets
        .get(fleet_id)
        .map(|fleet| (fleet.position, fleet.owner, fleet.name_prefix().to_owned()))
    else {
        return;
    };

    let donor = world
        .tiles
        .occupants(position)
        .iter()
        .filter(|occupant| occupant.fleet != fleet_id && occupant.realm == owner)
        .find(|occupant| {
            world
                .fleets
                .get(occupant.fleet)
                .is_some_and(|fleet| fleet.name_prefix() == prefix)
        })
        .map(|occupant| occupant.fleet);

    let Some(donor_id) = donor else {
        return;
    };
    let Some((ships, colonists)) = world
        .fleets
        .get(donor_id)
        .map(|fleet| (fleet.ships, fleet.colonists))
    else {
        return;
    };

    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
        fleet.ships += ships;
        fleet.colonists = (fleet.colonists + colonists).min(fleet.colony_capacity);
    }
    // remove_fleet rebuilds the tile index.
    world.remove_fleet(donor_id);
}

/// Register Colonize missions for newly charted, unowned, non-gas-giant
/// planets. Idempotent: a coordinate already targeted by any mission is
/// never registered twice.
fn discover_colonizable(world: &mut WorldContext) {
    for index in 0..world.realm_count() {
        let realm_id = RealmId(index as u32);
        let is_automated = world
            .realm(realm_id)
            .is_some_and(|realm| !realm.is_human);
        if !is_automated {
            continue;
        }

        let targets: Vec<_> = world
            .realm(realm_id)
            .map(|realm| {
                realm
                    .explored
                    .iter()
                    .copied()
                    .filter(|position| {
                        world
                            .planet_at(*position)
                            .is_some_and(|planet| planet.is_colonizable())
                            && !realm.has_mission_targeting(*position)
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(realm) = world.realm_mut(realm_id) {
            for target in targets {
                realm.missions.push(Mission::new(MissionKind::Colonize, target));
            }
        }
    }
}

/// Whole-map end-of-turn mutation: cultural decay reset, route replay,
/// idle notifications, production recompute, movement refresh, and the
/// turn counter increment.
fn end_of_turn(
    world: &mut WorldContext,
    env: &GameEnv<'_>,
    config: &GameConfig,
) -> Result<(), TickError> {
    for planet in world.planets.values_mut() {
        planet.culture_decay = 0;
    }

    replay_routes(world, env, config);
    emit_idle_notifications(world);

    for planet in world.planets.values_mut() {
        planet.production = match planet.owner {
            Some(_) => {
                let base = planet.population * config.production_per_pop;
                let orbital = if planet.starbase {
                    config.starbase_production_bonus
                } else {
                    0
                };
                base + orbital
            }
            None => 0,
        };
    }

    refresh_movement(world, config);

    world.turn = world
        .turn
        .checked_add(1)
        .ok_or(TickError::TurnCounterOverflow { turn: world.turn })?;
    Ok(())
}

/// Replay each realm's active routes one step, through the same
/// move/conflict path as human moves. Realms are visited in index order,
/// fleets in list order.
fn replay_routes(world: &mut WorldContext, env: &GameEnv<'_>, config: &GameConfig) {
    for index in 0..world.realm_count() {
        let realm_id = RealmId(index as u32);
        let fleet_ids: Vec<FleetId> = world
            .realm(realm_id)
            .map(|realm| realm.fleets.clone())
            .unwrap_or_default();

        for fleet_id in fleet_ids {
            let Some(fleet) = world.fleets.get(fleet_id) else {
                continue;
            };
            // In-flight searches belong to the mission planner; hold
            // routes and spent fleets have nothing to replay.
            if fleet.search.is_some() || fleet.moves_left == 0 {
                continue;
            }
            let Some(step) = fleet.route.as_ref().and_then(|route| route.peek()) else {
                continue;
            };

            match conflict::commit_move(world, env, config, realm_id, fleet_id, step) {
                MoveOutcome::Relocated { .. } => {
                    let arrived = world
                        .fleets
                        .get_mut(fleet_id)
                        .map(|fleet| {
                            if let Some(route) = fleet.route.as_mut() {
                                route.advance();
                            }
                            fleet.route.as_ref().is_some_and(|route| route.is_exhausted())
                        })
                        .unwrap_or(false);
                    if arrived {
                        let at = world
                            .fleets
                            .get_mut(fleet_id)
                            .map(|fleet| {
                                fleet.route = None;
                                fleet.position
                            })
                            .unwrap_or_default();
                        if let Some(realm) = world.realm_mut(realm_id) {
                            realm.push_message(TurnMessage::FleetArrived { fleet: fleet_id, at });
                        }
                    }
                }
                MoveOutcome::Rejected => {
                    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                        fleet.route = None;
                    }
                    if let Some(realm) = world.realm_mut(realm_id) {
                        realm.push_message(TurnMessage::FleetBlocked {
                            fleet: fleet_id,
                            at: step,
                        });
                    }
                }
                MoveOutcome::ScanOnly
                | MoveOutcome::Combat(_)
                | MoveOutcome::FastCombat { .. } => {}
            }
        }
    }
}

fn emit_idle_notifications(world: &mut WorldContext) {
    for index in 0..world.realm_count() {
        let realm_id = RealmId(index as u32);
        let idle: Vec<FleetId> = world
            .realm(realm_id)
            .map(|realm| {
                realm
                    .fleets
                    .iter()
                    .copied()
                    .filter(|fleet_id| {
                        realm.mission_for(*fleet_id).is_none()
                            && world
                                .fleets
                                .get(*fleet_id)
                                .is_some_and(|fleet| fleet.route.is_none())
                    })
                    .collect()
            })
            .unwrap_or_default();

        if let Some(realm) = world.realm_mut(realm_id) {
            for fleet in idle {
                realm.push_message(TurnMessage::FleetIdle { fleet });
            }
        }
    }
}

/// Grant every fleet its movement allowance for the next turn.
fn refresh_movement(world: &mut WorldContext, config: &GameConfig) {
    let ids: Vec<FleetId> = world.fleets.iter().map(|(id, _)| id).collect();
    for id in ids {
        if let Some(fleet) = world.fleets.get_mut(id) {
            let allowance = if fleet.moves_per_turn == 0 {
                config.default_moves_per_turn
            } else {
                fleet.moves_per_turn
            };
            fleet.moves_left = allowance;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{AttritionCombat, Env, GridMap};
    use crate::state::{Fleet, Planet, Position};

    fn run_cycle(
        scheduler: &mut TurnScheduler,
        world: &mut WorldContext,
        env: &GameEnv<'_>,
        config: &GameConfig,
    ) -> u32 {
        let mut ticks = 0;
        loop {
            ticks += 1;
            match scheduler.tick(world, env, config).unwrap() {
                TickOutcome::Working => continue,
                TickOutcome::CycleComplete => return ticks,
            }
        }
    }

    #[test]
    fn turn_counter_advances_once_per_cycle() {
        let map = GridMap::open(10, 10);
        let combat = AttritionCombat;
        let config = GameConfig::default();
        let mut world = WorldContext::new(-3);
        let _human = world.add_realm(true, 3);
        let ai = world.add_realm(false, 3);
        let _ = world.spawn_fleet(Fleet::new("Scout", ai, Position::new(1, 1), 1).with_moves(2));

        let env = Env::with_all(&map, &combat);
        let env = env.as_game_env();
        let mut scheduler = TurnScheduler::new();

        run_cycle(&mut scheduler, &mut world, &env, &config);
        assert_eq!(world.turn, -2);
        run_cycle(&mut scheduler, &mut world, &env, &config);
        assert_eq!(world.turn, -1);
    }

    #[test]
    fn processing_order_is_deterministic() {
        let map = GridMap::open(10, 10);
        let combat = AttritionCombat;
        let config = GameConfig::default();

        let build = || {
            let mut world = WorldContext::new(1);
            let _human = world.add_realm(true, 3);
            let a = world.add_realm(false, 3);
            let b = world.add_realm(false, 3);
            let f1 = world.spawn_fleet(Fleet::new("A1", a, Position::new(1, 1), 1).with_moves(1));
            let f2 = world.spawn_fleet(Fleet::new("A2", a, Position::new(3, 3), 1).with_moves(1));
            let f3 = world.spawn_fleet(Fleet::new("B1", b, Position::new(5, 5), 1).with_moves(1));
            world
                .realm_mut(a)
                .unwrap()
                .missions
                .push(crate::state::Mission::new(MissionKind::Explore, Position::new(8, 1)).bound_to(f1));
            world
                .realm_mut(a)
                .unwrap()
                .missions
                .push(crate::state::Mission::new(MissionKind::Explore, Position::new(8, 3)).bound_to(f2));
            world
                .realm_mut(b)
                .unwrap()
                .missions
                .push(crate::state::Mission::new(MissionKind::Explore, Position::new(8, 5)).bound_to(f3));
            world
        };

        let env = Env::with_all(&map, &combat);
        let env = env.as_game_env();

        let mut first = build();
        let mut second = build();
        let mut scheduler_a = TurnScheduler::new();
        let mut scheduler_b = TurnScheduler::new();
        run_cycle(&mut scheduler_a, &mut first, &env, &config);
        run_cycle(&mut scheduler_b, &mut second, &env, &config);

        assert_eq!(first, second);
    }

    #[test]
    fn colocated_prefix_fleets_merge_before_processing() {
        let map = GridMap::open(10, 10);
        let combat = AttritionCombat;
        let config = GameConfig::default();
        let mut world = WorldContext::new(1);
        let ai = world.add_realm(false, 3);
        let keeper = world.spawn_fleet(
            Fleet::new("Armada", ai, Position::new(4, 4), 3).with_moves(1),
        );
        let donor = world.spawn_fleet(
            Fleet::new("Armada-2", ai, Position::new(4, 4), 2).with_moves(1),
        );

        let env = Env::with_all(&map, &combat);
        let env = env.as_game_env();
        let mut scheduler = TurnScheduler::new();
        run_cycle(&mut scheduler, &mut world, &env, &config);

        assert!(!world.fleets.contains(donor));
        assert_eq!(world.fleets.get(keeper).unwrap().ships, 5);
    }

    #[test]
    fn discovery_registers_colonize_missions_idempotently() {
        let map = GridMap::open(10, 10);
        let combat = AttritionCombat;
        let config = GameConfig::default();
        let mut world = WorldContext::new(1);
        let ai = world.add_realm(false, 3);
        world.add_planet(Position::new(3, 3), Planet::unowned());
        world.add_planet(Position::new(4, 4), Planet::gas_giant());
        world.scan_update(ai, &map, Position::new(3, 3), 2);

        let env = Env::with_all(&map, &combat);
        let env = env.as_game_env();
        let mut scheduler = TurnScheduler::new();
        run_cycle(&mut scheduler, &mut world, &env, &config);

        let missions: Vec<_> = world
            .realm(ai)
            .unwrap()
            .missions
            .iter()
            .filter(|mission| mission.kind == MissionKind::Colonize)
            .collect();
        assert_eq!(missions.len(), 1);
        assert_eq!(missions[0].target, Position::new(3, 3));

        // A second cycle must not duplicate the registration.
        run_cycle(&mut scheduler, &mut world, &env, &config);
        let count = world
            .realm(ai)
            .unwrap()
            .missions
            .iter()
            .filter(|mission| mission.kind == MissionKind::Colonize)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn end_of_turn_recomputes_production_and_refreshes_moves() {
        let map = GridMap::open(10, 10);
        let combat = AttritionCombat;
        let config = GameConfig::default();
        let mut world = WorldContext::new(1);
        let ai = world.add_realm(false, 3);
        world.add_planet(Position::new(2, 2), Planet::owned_by(ai, 4).with_starbase());
        let fleet = world.spawn_fleet(Fleet::new("Scout", ai, Position::new(1, 1), 1).with_moves(3));
        world.fleets.get_mut(fleet).unwrap().moves_left = 0;

        let env = Env::with_all(&map, &combat);
        let env = env.as_game_env();
        let mut scheduler = TurnScheduler::new();
        run_cycle(&mut scheduler, &mut world, &env, &config);

        let planet = world.planet_at(Position::new(2, 2)).unwrap();
        assert_eq!(
            planet.production,
            4 * config.production_per_pop + config.starbase_production_bonus
        );
        assert_eq!(world.fleets.get(fleet).unwrap().moves_left, 3);
    }
}
