//! Mission phase graphs for automated fleets.
//!
//! Each mission kind advances through its own phase graph; the common
//! Trekking phase drives movement through the conflict resolver and owns
//! the detour policy: a cleared route with no in-flight search starts a
//! bounded-depth A* first, and the next obstruction after an exhausted
//! detour escalates to an unbounded search.

use crate::config::GameConfig;
use crate::conflict::{self, MoveOutcome};
use crate::env::{GameEnv, MapOracle};
use crate::path::{self, SearchDepth};
use crate::state::{
    FleetId, Mission, MissionKind, MissionPhase, Position, RealmId, Route, TurnMessage,
    WorldContext,
};

/// Advance the mission bound to `fleet_id` by one tick, if there is one.
/// A fleet without a mission idles; the end-of-turn pass reports it.
pub fn advance_fleet(
    world: &mut WorldContext,
    env: &GameEnv<'_>,
    config: &GameConfig,
    realm_id: RealmId,
    fleet_id: FleetId,
) {
    let Some(index) = world.realm(realm_id).and_then(|realm| realm.mission_for(fleet_id)) else {
        return;
    };
    advance_mission(world, env, config, realm_id, index);
}

/// Advance one mission by one tick. Unbound missions (Colonize planning)
/// are advanced through here as well.
pub fn advance_mission(
    world: &mut WorldContext,
    env: &GameEnv<'_>,
    config: &GameConfig,
    realm_id: RealmId,
    index: usize,
) {
    let Some(mut mission) = world
        .realm(realm_id)
        .and_then(|realm| realm.missions.get(index))
        .cloned()
    else {
        return;
    };

    match (mission.kind, mission.phase) {
        (_, MissionPhase::Trekking) => {
            let arrived = trek(world, env, config, realm_id, &mut mission);
            if arrived {
                mission.enter_phase(MissionPhase::Executing);
                if mission.kind == MissionKind::Defend {
                    if let Some(fleet) = mission.fleet.and_then(|id| world.fleets.get_mut(id)) {
                        // Standing guard: the zero-length hold route.
                        fleet.route = Some(Route::hold());
                    }
                }
            }
            store(world, realm_id, index, mission);
            if arrived {
                let kind = world
                    .realm(realm_id)
                    .and_then(|realm| realm.missions.get(index))
                    .map(|mission| mission.kind);
                if kind == Some(MissionKind::Colonize) {
                    // The grant happens in the same tick the fleet arrives.
                    colonize_execute(world, env, realm_id, index);
                }
            }
        }
        (MissionKind::Explore, MissionPhase::Executing) => {
            explore_execute(world, env, config, realm_id, index, mission);
        }
        (MissionKind::Colonize, MissionPhase::Planning) => {
            colonize_plan(world, realm_id, index, mission);
        }
        (MissionKind::Colonize, MissionPhase::Loading) => {
            colonize_load(world, env, config, realm_id, index, mission);
        }
        (MissionKind::Colonize, MissionPhase::Executing) => {
            store(world, realm_id, index, mission);
            colonize_execute(world, env, realm_id, index);
        }
        (MissionKind::Defend, MissionPhase::Executing) => {
            mission.elapsed += 1;
            if mission.elapsed >= config.defend_refresh_interval {
                // Periodic defender refresh.
                mission.enter_phase(MissionPhase::Planning);
            }
            store(world, realm_id, index, mission);
        }
        (MissionKind::Defend, MissionPhase::Planning) => {
            let at_post = mission
                .fleet
                .and_then(|id| world.fleets.get(id))
                .is_some_and(|fleet| fleet.position == mission.target);
            if at_post {
                mission.enter_phase(MissionPhase::Executing);
                if let Some(fleet) = mission.fleet.and_then(|id| world.fleets.get_mut(id)) {
                    fleet.route = Some(Route::hold());
                }
            } else {
                mission.enter_phase(MissionPhase::Trekking);
                plan_full_route(world, env, realm_id, &mission);
            }
            store(world, realm_id, index, mission);
        }
        (MissionKind::Trade, MissionPhase::Loading) => {
            mission.elapsed += 1;
            if mission.elapsed >= config.trade_load_ticks {
                if mission.origin.is_none() {
                    mission.origin = mission
                        .fleet
                        .and_then(|id| world.fleets.get(id))
                        .map(|fleet| fleet.position);
                }
                mission.enter_phase(MissionPhase::Trekking);
                plan_full_route(world, env, realm_id, &mission);
            }
            store(world, realm_id, index, mission);
        }
        (MissionKind::Trade, MissionPhase::Executing) => {
            // Unload and turn the route around.
            if let Some(origin) = mission.origin {
                mission.origin = Some(mission.target);
                mission.target = origin;
            }
            mission.enter_phase(MissionPhase::Loading);
            store(world, realm_id, index, mission);
        }
        // Remaining combinations have no work to do this tick.
        _ => {
            store(world, realm_id, index, mission);
        }
    }
}

fn store(world: &mut WorldContext, realm_id: RealmId, index: usize, mission: Mission) {
    if let Some(slot) = world
        .realm_mut(realm_id)
        .and_then(|realm| realm.missions.get_mut(index))
    {
        *slot = mission;
    }
}

/// Move the bound fleet toward the mission target, spending the remaining
/// moves of this tick. Returns true once the fleet stands on the target.
fn trek(
    world: &mut WorldContext,
    env: &GameEnv<'_>,
    config: &GameConfig,
    realm_id: RealmId,
    mission: &mut Mission,
) -> bool {
    let Some(fleet_id) = mission.fleet else {
        return false;
    };
    let Ok(map) = env.map() else {
        return false;
    };

    let mut replans = 0;
    loop {
        let Some(fleet) = world.fleets.get(fleet_id) else {
            return false;
        };
        if fleet.position == mission.target {
            finish_navigation(world, realm_id, fleet_id, mission.target);
            return true;
        }
        if fleet.moves_left == 0 {
            return false;
        }

        if world.fleets.get(fleet_id).is_some_and(|fleet| fleet.route.is_none()) {
            if replans >= 2 {
                return false;
            }
            replans += 1;
            if !start_search(world, map, config, realm_id, fleet_id, mission.target) {
                return false;
            }
        }

        let Some(step) = world
            .fleets
            .get(fleet_id)
            .and_then(|fleet| fleet.route.as_ref())
            .and_then(|route| route.peek())
        else {
            // Route consumed short of the target: the search is spent.
            drop_navigation(world, fleet_id);
            continue;
        };

        // Skip administratively blocked waypoints without consuming a move.
        if map.is_blocked(step) {
            advance_navigation(world, fleet_id);
            continue;
        }

        match conflict::commit_move(world, env, config, realm_id, fleet_id, step) {
            MoveOutcome::Relocated { to } => {
                advance_navigation(world, fleet_id);
                if to != step {
                    // Wormhole relink: the rest of the route is stale.
                    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                        fleet.clear_navigation();
                    }
                }
            }
            MoveOutcome::Rejected => {
                // Obstruction: clear the route; the next pass detours.
                drop_navigation(world, fleet_id);
            }
            MoveOutcome::ScanOnly
            | MoveOutcome::Combat(_)
            | MoveOutcome::FastCombat { .. } => {
                return false;
            }
        }
    }
}

/// Start a path search for the fleet, installing both the in-flight
/// search and the derived route. Returns false when no path exists; the
/// fleet then idles with a notification and the phase does not advance.
fn start_search<M>(
    world: &mut WorldContext,
    map: &M,
    config: &GameConfig,
    realm_id: RealmId,
    fleet_id: FleetId,
    target: Position,
) -> bool
where
    M: MapOracle + ?Sized,
{
    let Some(fleet) = world.fleets.get(fleet_id) else {
        return false;
    };
    let depth = if fleet.detour_spent {
        SearchDepth::Full
    } else {
        SearchDepth::Bounded(config.detour_depth)
    };
    let origin = fleet.position;

    match path::find_path(map, origin, target, depth) {
        Some(result) => {
            let bounded = depth.is_bounded();
            if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                fleet.route = Some(result.to_route());
                fleet.search = Some(result.to_search(bounded));
            }
            true
        }
        None => {
            if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                // A failed cheap detour escalates the next attempt.
                fleet.detour_spent = true;
            }
            if let Some(realm) = world.realm_mut(realm_id) {
                realm.push_message(TurnMessage::FleetIdle { fleet: fleet_id });
            }
            false
        }
    }
}

fn advance_navigation(world: &mut WorldContext, fleet_id: FleetId) {
    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
        if let Some(route) = fleet.route.as_mut() {
            route.advance();
        }
        if let Some(search) = fleet.search.as_mut() {
            search.advance();
        }
    }
}

/// Discard the fleet's navigation state. A bounded detour discarded this
/// way escalates the next search to full depth.
fn drop_navigation(world: &mut WorldContext, fleet_id: FleetId) {
    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
        if fleet.search.as_ref().is_some_and(|search| search.bounded) {
            fleet.detour_spent = true;
        }
        fleet.clear_navigation();
    }
}

fn finish_navigation(world: &mut WorldContext, realm_id: RealmId, fleet_id: FleetId, at: Position) {
    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
        fleet.clear_navigation();
        fleet.detour_spent = false;
    }
    if let Some(realm) = world.realm_mut(realm_id) {
        realm.push_message(TurnMessage::FleetArrived { fleet: fleet_id, at });
    }
}

fn plan_full_route(world: &mut WorldContext, env: &GameEnv<'_>, realm_id: RealmId, mission: &Mission) {
    let Some(fleet_id) = mission.fleet else {
        return;
    };
    let Ok(map) = env.map() else {
        return;
    };
    let Some(origin) = world.fleets.get(fleet_id).map(|fleet| fleet.position) else {
        return;
    };

    match path::find_path(map, origin, mission.target, SearchDepth::Full) {
        Some(result) => {
            if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                fleet.route = Some(result.to_route());
                fleet.search = Some(result.to_search(false));
                fleet.detour_spent = false;
            }
        }
        None => {
            if let Some(realm) = world.realm_mut(realm_id) {
                realm.push_message(TurnMessage::FleetIdle { fleet: fleet_id });
            }
        }
    }
}

// ----------------------------------------------------------------------
// Explore
// ----------------------------------------------------------------------

fn explore_execute(
    world: &mut WorldContext,
    env: &GameEnv<'_>,
    config: &GameConfig,
    realm_id: RealmId,
    index: usize,
    mut mission: Mission,
) {
    let Ok(map) = env.map() else {
        store(world, realm_id, index, mission);
        return;
    };
    let Some(position) = mission.fleet.and_then(|id| world.fleets.get(id)).map(|f| f.position)
    else {
        store(world, realm_id, index, mission);
        return;
    };

    // Local scan around the arrival system.
    world.scan_update(realm_id, map, position, config.scan_radius);
    mission.elapsed += 1;

    let patience = world
        .realm(realm_id)
        .map(|realm| realm.exploration_patience)
        .unwrap_or(config.exploration_patience);

    if mission.elapsed >= patience {
        match world.nearest_unexplored(realm_id, map, position) {
            Some(next) => {
                mission.target = next;
                mission.enter_phase(MissionPhase::Trekking);
                if let Some(fleet) = mission.fleet.and_then(|id| world.fleets.get_mut(id)) {
                    fleet.clear_navigation();
                }
                plan_full_route(world, env, realm_id, &mission);
                store(world, realm_id, index, mission);
            }
            None => {
                // Nothing left to chart: the mission retires.
                if let Some(realm) = world.realm_mut(realm_id) {
                    realm.push_message(TurnMessage::ExplorationComplete { at: position });
                    realm.missions.remove(index);
                }
            }
        }
    } else {
        store(world, realm_id, index, mission);
    }
}

// ----------------------------------------------------------------------
// Colonize
// ----------------------------------------------------------------------

fn colonize_plan(world: &mut WorldContext, realm_id: RealmId, index: usize, mut mission: Mission) {
    let candidate = world.realm(realm_id).and_then(|realm| {
        realm
            .fleets
            .iter()
            .copied()
            .find(|id| {
                let Some(fleet) = world.fleets.get(*id) else {
                    return false;
                };
                fleet.has_colony_module()
                    && realm.mission_for(*id).is_none()
                    && world
                        .planet_at(fleet.position)
                        .is_some_and(|planet| planet.owner == Some(realm_id))
            })
    });

    if let Some(fleet_id) = candidate {
        let origin = world.fleets.get(fleet_id).map(|fleet| fleet.position);
        mission.fleet = Some(fleet_id);
        mission.origin = origin;
        mission.enter_phase(MissionPhase::Loading);
    }
    store(world, realm_id, index, mission);
}

fn colonize_load(
    world: &mut WorldContext,
    env: &GameEnv<'_>,
    config: &GameConfig,
    realm_id: RealmId,
    index: usize,
    mut mission: Mission,
) {
    let Some(fleet_id) = mission.fleet else {
        store(world, realm_id, index, mission);
        return;
    };
    let Some((position, colonists, capacity)) = world
        .fleets
        .get(fleet_id)
        .map(|fleet| (fleet.position, fleet.colonists, fleet.colony_capacity))
    else {
        store(world, realm_id, index, mission);
        return;
    };

    let origin = mission.origin.unwrap_or(position);
    let free = capacity.saturating_sub(colonists);
    let transferred = match world.planet_at_mut(origin) {
        Some(planet) if planet.owner == Some(realm_id) => {
            // Siphon while population and cargo space allow; the planet
            // always keeps at least one population point.
            let available = planet.population.saturating_sub(1);
            let amount = config.loading_rate.min(free).min(available);
            planet.population -= amount;
            amount
        }
        _ => 0,
    };
    if let Some(fleet) = world.fleets.get_mut(fleet_id) {
        fleet.colonists += transferred;
    }

    let loaded = colonists + transferred >= capacity || transferred == 0;
    if loaded {
        mission.enter_phase(MissionPhase::Trekking);
        plan_full_route(world, env, realm_id, &mission);
    }
    store(world, realm_id, index, mission);
}

fn colonize_execute(world: &mut WorldContext, env: &GameEnv<'_>, realm_id: RealmId, index: usize) {
    let Some(mission) = world
        .realm(realm_id)
        .and_then(|realm| realm.missions.get(index))
        .cloned()
    else {
        return;
    };
    let Some(fleet_id) = mission.fleet else {
        return;
    };
    let Some(fleet) = world.fleets.get(fleet_id) else {
        return;
    };
    if fleet.position != mission.target {
        return;
    }
    let colonists = fleet.colonists;

    let granted = match world.planet_at_mut(mission.target) {
        Some(planet) if planet.owner.is_none() => {
            planet.owner = Some(realm_id);
            planet.population = colonists.max(1);
            true
        }
        _ => false,
    };

    if granted {
        // The colony ship becomes the settlement.
        world.remove_fleet(fleet_id);
        if let Some(realm) = world.realm_mut(realm_id) {
            realm.push_message(TurnMessage::PlanetColonized { at: mission.target });
            realm.missions.remove(index);
        }
        return;
    }

    // Target claimed before arrival: keep the mission and look for a new
    // colonizable site among the sectors this realm has charted.
    let mut mission = mission;
    let retarget = retarget_colonizable(world, realm_id, mission.target);
    match retarget {
        Some(next) => {
            mission.target = next;
            mission.enter_phase(MissionPhase::Trekking);
            if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                fleet.clear_navigation();
            }
            plan_full_route(world, env, realm_id, &mission);
        }
        None => {
            if let Some(realm) = world.realm_mut(realm_id) {
                realm.push_message(TurnMessage::FleetBlocked {
                    fleet: fleet_id,
                    at: mission.target,
                });
            }
        }
    }
    store(world, realm_id, index, mission);
}

fn retarget_colonizable(
    world: &WorldContext,
    realm_id: RealmId,
    origin: Position,
) -> Option<Position> {
    let realm = world.realm(realm_id)?;
    let mut best: Option<(u64, Position)> = None;
    for position in realm.explored.iter().copied() {
        let colonizable = world
            .planet_at(position)
            .is_some_and(|planet| planet.is_colonizable());
        if !colonizable || realm.has_mission_targeting(position) {
            continue;
        }
        let distance = origin.distance_sq(position);
        let better = match best {
            Some((held, at)) => distance < held || (distance == held && position < at),
            None => true,
        };
        if better {
            best = Some((distance, position));
        }
    }
    best.map(|(_, position)| position)
}
