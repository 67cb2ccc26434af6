//! Movement validation, conflict classification, and diplomatic
//! escalation.
//!
//! `evaluate_move` is the pure classifier; `commit_move` performs the move
//! and every side effect it implies (war declarations, pact activation,
//! combat hand-off or fast resolution, scan updates, wormhole relinks).
//! Invalid moves are rejected silently: the caller simply observes that
//! the move did not happen.

use bitflags::bitflags;

use crate::config::GameConfig;
use crate::env::{CombatOracle, CombatSide, GameEnv, MapOracle};
use crate::state::{
    DiplomaticOffer, DiplomaticStance, Fleet, FleetId, OfferKind, Position, RealmId, TurnMessage,
    WorldContext,
};

bitflags! {
    /// Visibility and diplomatic standing of a sighted foreign presence.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ContactFlags: u8 {
        const DETECTED   = 1 << 0;
        const RECOGNIZED = 1 << 1;
        const AT_WAR     = 1 << 2;
    }
}

/// Classification of a requested fleet move against the target tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveProbe {
    /// Invalid or impassable; the move is silently rejected.
    Blocked,
    /// No conflict applies; ordinary relocation.
    Clear,
    /// A detected, diplomatically recognized foreign fleet holds the tile.
    EnemyFleet(FleetId),
    /// A foreign orbital installation guards the tile.
    EnemyOrbital(Position),
    /// Something foreign holds the tile but is not detected; the move is
    /// spent on a scan-only update instead of combat.
    HiddenContact,
}

/// Hand-off descriptor for a human-involved encounter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CombatTicket {
    pub attacker: FleetId,
    pub attacker_realm: RealmId,
    pub defender: Option<FleetId>,
    pub defender_realm: RealmId,
    pub at: Position,
}

/// What `commit_move` actually did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum MoveOutcome {
    /// Nothing happened (invalid move).
    Rejected,
    /// The fleet relocated; `to` accounts for wormhole relinking.
    Relocated { to: Position },
    /// Undetected contact: the move was consumed by a scan-only update.
    ScanOnly,
    /// Human-involved encounter handed off to the interactive combat state.
    Combat(CombatTicket),
    /// Automated-vs-automated encounter resolved synchronously.
    FastCombat { at: Position, attacker_won: bool },
}

fn contact_flags(world: &WorldContext, mover: RealmId, other: RealmId, cloaked: bool) -> ContactFlags {
    let mut flags = ContactFlags::empty();
    if !cloaked {
        flags |= ContactFlags::DETECTED;
    }
    if world.realm(mover).is_some_and(|realm| realm.recognizes(other)) {
        flags |= ContactFlags::RECOGNIZED;
    }
    if world.is_war(mover, other) {
        flags |= ContactFlags::AT_WAR;
    }
    flags
}

/// Classify a requested move without mutating anything.
///
/// Checks run in order: fleet ownership and tile control, target validity,
/// movement allowance, administrative blocks, then occupant analysis.
pub fn evaluate_move(
    world: &WorldContext,
    env: &GameEnv<'_>,
    mover: RealmId,
    fleet_id: FleetId,
    target: Position,
) -> MoveProbe {
    let Ok(map) = env.map() else {
        return MoveProbe::Blocked;
    };
    let Some(fleet) = world.fleets.get(fleet_id) else {
        return MoveProbe::Blocked;
    };
    if fleet.owner != mover {
        return MoveProbe::Blocked;
    }
    // Conflict-index check: the mover must control the fleet's tile.
    match world.tiles.claim_holder(fleet.position) {
        Some(claim) if claim.realm == mover => {}
        _ => return MoveProbe::Blocked,
    }
    if !map.contains(target) || map.is_blocked(target) {
        return MoveProbe::Blocked;
    }
    if fleet.moves_left == 0 {
        return MoveProbe::Blocked;
    }

    if let Some(occupant) = world.tiles.foreign_occupant(target, mover) {
        let Some(other) = world.fleets.get(occupant.fleet) else {
            return MoveProbe::Clear;
        };
        let flags = contact_flags(world, mover, occupant.realm, other.cloaked);
        if !flags.contains(ContactFlags::DETECTED) {
            return MoveProbe::HiddenContact;
        }
        if fleet.privateer || other.privateer {
            // Rogue encounters fight without diplomatic standing.
            return MoveProbe::EnemyFleet(occupant.fleet);
        }
        if flags.intersects(ContactFlags::RECOGNIZED | ContactFlags::AT_WAR) {
            return MoveProbe::EnemyFleet(occupant.fleet);
        }
        return MoveProbe::HiddenContact;
    }

    if let Some(planet) = world.planet_at(target) {
        if planet.starbase {
            if let Some(owner) = planet.owner {
                if owner != mover {
                    return MoveProbe::EnemyOrbital(target);
                }
            }
        }
    }

    // Unclaimed or neutral tile: fall through to ordinary relocation.
    MoveProbe::Clear
}

/// Perform the move and its side effects.
pub fn commit_move(
    world: &mut WorldContext,
    env: &GameEnv<'_>,
    config: &GameConfig,
    mover: RealmId,
    fleet_id: FleetId,
    target: Position,
) -> MoveOutcome {
    let probe = evaluate_move(world, env, mover, fleet_id, target);
    let Ok(map) = env.map() else {
        return MoveOutcome::Rejected;
    };

    match probe {
        MoveProbe::Blocked => MoveOutcome::Rejected,
        MoveProbe::Clear => relocate(world, map, config, mover, fleet_id, target),
        MoveProbe::HiddenContact => {
            if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                fleet.moves_left = fleet.moves_left.saturating_sub(1);
            }
            world.scan_update(mover, map, target, config.scan_radius);
            if let Some(realm) = world.realm_mut(mover) {
                realm.push_message(TurnMessage::ContactSighted { at: target });
            }
            MoveOutcome::ScanOnly
        }
        MoveProbe::EnemyFleet(defender_id) => {
            let Some(defender) = world.fleets.get(defender_id) else {
                return MoveOutcome::Rejected;
            };
            let defender_realm = defender.owner;
            let rogue = defender.privateer
                || world.fleets.get(fleet_id).is_some_and(|fleet| fleet.privateer);

            if !rogue {
                declare_war(world, config, mover, defender_realm);
            }

            // The attack attempt spends the move.
            if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                fleet.moves_left = fleet.moves_left.saturating_sub(1);
            }

            let human_involved = world.realm(mover).is_some_and(|realm| realm.is_human)
                || world
                    .realm(defender_realm)
                    .is_some_and(|realm| realm.is_human);

            if human_involved {
                MoveOutcome::Combat(CombatTicket {
                    attacker: fleet_id,
                    attacker_realm: mover,
                    defender: Some(defender_id),
                    defender_realm,
                    at: target,
                })
            } else {
                let Ok(combat) = env.combat() else {
                    return MoveOutcome::Rejected;
                };
                resolve_fast(
                    world,
                    map,
                    config,
                    combat,
                    mover,
                    fleet_id,
                    defender_id,
                    target,
                )
            }
        }
        MoveProbe::EnemyOrbital(at) => {
            let Some(defender_realm) = world.planet_at(at).and_then(|planet| planet.owner) else {
                return MoveOutcome::Rejected;
            };
            let rogue = world.fleets.get(fleet_id).is_some_and(|fleet| fleet.privateer);
            if !rogue {
                declare_war(world, config, mover, defender_realm);
            }

            if let Some(fleet) = world.fleets.get_mut(fleet_id) {
                fleet.moves_left = fleet.moves_left.saturating_sub(1);
            }

            let human_involved = world.realm(mover).is_some_and(|realm| realm.is_human)
                || world
                    .realm(defender_realm)
                    .is_some_and(|realm| realm.is_human);

            if human_involved {
                MoveOutcome::Combat(CombatTicket {
                    attacker: fleet_id,
                    attacker_realm: mover,
                    defender: None,
                    defender_realm,
                    at,
                })
            } else {
                let Ok(combat) = env.combat() else {
                    return MoveOutcome::Rejected;
                };
                resolve_fast_orbital(world, map, config, combat, mover, fleet_id, defender_realm, at)
            }
        }
    }
}

/// Raise a war declaration between two realms. Idempotent with respect to
/// an existing war: declaring twice has no further effect.
pub fn declare_war(world: &mut WorldContext, config: &GameConfig, aggressor: RealmId, defender: RealmId) {
    if aggressor == defender || world.is_war(aggressor, defender) {
        return;
    }

    world.set_stance_pair(aggressor, defender, DiplomaticStance::War);

    if let Some(realm) = world.realm_mut(aggressor) {
        realm.reputation -= config.war_reputation_penalty;
        realm.offers.push(DiplomaticOffer {
            kind: OfferKind::War,
            with: defender,
            give: 0,
            take: 0,
        });
    }
    if let Some(realm) = world.realm_mut(defender) {
        realm.offers.push(DiplomaticOffer {
            kind: OfferKind::War,
            with: aggressor,
            give: 0,
            take: 0,
        });
        realm.push_message(TurnMessage::WarDeclared { with: aggressor });
    }

    let allies: Vec<RealmId> = world
        .realm(defender)
        .map(|realm| {
            realm
                .defensive_allies()
                .filter(|ally| *ally != aggressor)
                .collect()
        })
        .unwrap_or_default();

    for ally in allies {
        if !world.is_war(ally, aggressor) {
            world.set_stance_pair(ally, aggressor, DiplomaticStance::War);
        }
        if let Some(realm) = world.realm_mut(ally) {
            realm.push_message(TurnMessage::PactActivated {
                defender,
                against: aggressor,
            });
        }
    }
}

fn relocate<M>(
    world: &mut WorldContext,
    map: &M,
    config: &GameConfig,
    mover: RealmId,
    fleet_id: FleetId,
    target: Position,
) -> MoveOutcome
where
    M: MapOracle + ?Sized,
{
    let Some(fleet) = world.fleets.get_mut(fleet_id) else {
        return MoveOutcome::Rejected;
    };
    fleet.moves_left = fleet.moves_left.saturating_sub(1);
    fleet.position = target;

    let mut destination = target;
    if let Some(exit) = map.wormhole_exit(target) {
        if map.contains(exit) {
            fleet.position = exit;
            destination = exit;
            if let Some(commander) = fleet.commander.as_mut() {
                commander.experience += config.wormhole_xp_bonus;
            }
        }
    }

    world.tiles.rebuild(&world.fleets);
    world.scan_update(mover, map, destination, config.scan_radius);
    MoveOutcome::Relocated { to: destination }
}

#[allow(clippy::too_many_arguments)]
fn resolve_fast<M>(
    world: &mut WorldContext,
    map: &M,
    config: &GameConfig,
    combat: &(dyn CombatOracle + '_),
    mover: RealmId,
    attacker_id: FleetId,
    defender_id: FleetId,
    at: Position,
) -> MoveOutcome
where
    M: MapOracle + ?Sized,
{
    let (Some(attacker), Some(defender)) =
        (world.fleets.get(attacker_id), world.fleets.get(defender_id))
    else {
        return MoveOutcome::Rejected;
    };
    let outcome = combat.fast_resolve(attacker, defender);

    apply_losses(world, attacker_id, outcome.attacker_losses);
    apply_losses(world, defender_id, outcome.defender_losses);
    if outcome.orbital_destroyed {
        if let Some(planet) = world.planet_at_mut(at) {
            planet.starbase = false;
        }
    }

    // A victorious attacker finishes the move onto the vacated tile.
    if !world.fleets.contains(defender_id) {
        if let Some(fleet) = world.fleets.get_mut(attacker_id) {
            fleet.position = at;
        }
    }

    world.tiles.rebuild(&world.fleets);
    world.scan_update(mover, map, at, config.scan_radius);
    MoveOutcome::FastCombat {
        at,
        attacker_won: outcome.winner == CombatSide::Attacker,
    }
}

#[allow(clippy::too_many_arguments)]
fn resolve_fast_orbital<M>(
    world: &mut WorldContext,
    map: &M,
    config: &GameConfig,
    combat: &(dyn CombatOracle + '_),
    mover: RealmId,
    attacker_id: FleetId,
    defender_realm: RealmId,
    at: Position,
) -> MoveOutcome
where
    M: MapOracle + ?Sized,
{
    let Some(attacker) = world.fleets.get(attacker_id) else {
        return MoveOutcome::Rejected;
    };
    let garrison = Fleet::new("Starbase", defender_realm, at, config.starbase_strength);
    let outcome = combat.fast_resolve(attacker, &garrison);

    apply_losses(world, attacker_id, outcome.attacker_losses);
    let attacker_won = outcome.winner == CombatSide::Attacker;
    if attacker_won || outcome.orbital_destroyed {
        if let Some(planet) = world.planet_at_mut(at) {
            planet.starbase = false;
        }
    }

    world.tiles.rebuild(&world.fleets);
    world.scan_update(mover, map, at, config.scan_radius);
    MoveOutcome::FastCombat { at, attacker_won }
}

fn apply_losses(world: &mut WorldContext, fleet_id: FleetId, losses: u32) {
    let destroyed = match world.fleets.get_mut(fleet_id) {
        Some(fleet) => {
            fleet.ships = fleet.ships.saturating_sub(losses);
            fleet.ships == 0
        }
        None => false,
    };
    if destroyed {
        world.remove_fleet(fleet_id);
    }
}
