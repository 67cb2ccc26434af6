//! End-to-end scenarios driven through the [`Game`] façade.

use farstar_core::{
    AttritionCombat, Env, Fleet, Game, GameConfig, GameEnv, GameScreen, GridMap, Mission,
    MissionKind, MissionPhase, MoveOutcome, NullObserver, Planet, Position, TickOutcome,
    TransitionPayload, WorldContext,
};

fn run_cycle(game: &mut Game, env: &GameEnv<'_>) -> u64 {
    let mut ticks = 0;
    loop {
        ticks += 1;
        match game.tick(env, &NullObserver).unwrap() {
            TickOutcome::Working => continue,
            TickOutcome::CycleComplete => return ticks,
        }
    }
}

#[test]
fn human_fleet_spends_two_moves_marching_east() {
    let map = GridMap::open(16, 16);
    let combat = AttritionCombat;
    let mut world = WorldContext::new(1);
    let human = world.add_realm(true, 3);
    let fleet = world.spawn_fleet(Fleet::new("Flag", human, Position::new(5, 5), 2).with_moves(2));

    let env = Env::with_all(&map, &combat);
    let env = env.as_game_env();
    let mut game = Game::new(world, GameConfig::default());

    assert_eq!(
        game.submit_human_move(&env, fleet, Position::new(6, 5)),
        MoveOutcome::Relocated { to: Position::new(6, 5) }
    );
    assert_eq!(
        game.submit_human_move(&env, fleet, Position::new(7, 5)),
        MoveOutcome::Relocated { to: Position::new(7, 5) }
    );

    let fleet = game.world().fleets.get(fleet).unwrap();
    assert_eq!(fleet.position, Position::new(7, 5));
    assert_eq!(fleet.moves_left, 0);
}

#[test]
fn obstructed_explorer_detours_within_one_cycle() {
    let mut map = GridMap::open(14, 5);
    map.block_column(4, 0, 4);
    let combat = AttritionCombat;
    let mut world = WorldContext::new(1);
    let ai = world.add_realm(false, 3);
    let fleet = world.spawn_fleet(Fleet::new("Surveyor", ai, Position::new(1, 2), 1).with_moves(1));
    world
        .realm_mut(ai)
        .unwrap()
        .missions
        .push(Mission::new(MissionKind::Explore, Position::new(12, 2)).bound_to(fleet));

    let env = Env::with_all(&map, &combat);
    let env = env.as_game_env();
    let mut game = Game::new(world, GameConfig::default());
    run_cycle(&mut game, &env);

    let mission = &game.missions(ai)[0];
    assert_eq!(mission.phase, MissionPhase::Trekking);
    let fleet = game.world().fleets.get(fleet).unwrap();
    let search = fleet.search.as_ref().expect("detour search in flight");
    assert!(search.bounded);
    assert!(fleet.route.is_some());
}

#[test]
fn peacetime_contact_escalates_to_war_and_combat() {
    let map = GridMap::open(10, 10);
    let combat = AttritionCombat;
    let mut world = WorldContext::new(1);
    let human = world.add_realm(true, 3);
    let ai = world.add_realm(false, 3);
    world.establish_contact(human, ai);

    let attacker = world.spawn_fleet(Fleet::new("Vanguard", human, Position::new(4, 4), 3).with_moves(2));
    let _picket = world.spawn_fleet(Fleet::new("Picket", ai, Position::new(5, 4), 2).with_moves(2));

    let env = Env::with_all(&map, &combat);
    let env = env.as_game_env();
    let mut game = Game::new(world, GameConfig::default());

    let outcome = game.submit_human_move(&env, attacker, Position::new(5, 4));
    assert!(
        matches!(outcome, MoveOutcome::Combat(ticket) if ticket.at == Position::new(5, 4)),
        "expected a combat hand-off, got {outcome:?}"
    );
    assert!(game.world().is_war(human, ai));
    // The attacker did not silently relocate onto the contested tile.
    assert_eq!(
        game.world().fleets.get(attacker).unwrap().position,
        Position::new(4, 4)
    );
}

#[test]
fn colony_mission_loads_settles_and_retires() {
    let map = GridMap::open(12, 12);
    let combat = AttritionCombat;
    let mut world = WorldContext::new(1);
    let ai = world.add_realm(false, 3);

    world.add_planet(Position::new(2, 2), Planet::owned_by(ai, 5));
    world.add_planet(Position::new(5, 2), Planet::unowned());
    world.scan_update(ai, &map, Position::new(3, 2), 3);
    let settler = world.spawn_fleet(
        Fleet::new("Settler", ai, Position::new(2, 2), 1)
            .with_moves(3)
            .with_colony_module(2),
    );

    let env = Env::with_all(&map, &combat);
    let env = env.as_game_env();
    let mut game = Game::new(world, GameConfig::default());

    // Discovery registers the mission at the end of the first cycle; the
    // following cycles bind, load, trek, and settle.
    for _ in 0..8 {
        run_cycle(&mut game, &env);
        if game.missions(ai).is_empty()
            && game.world().planet_at(Position::new(5, 2)).unwrap().owner == Some(ai)
        {
            break;
        }
    }

    let colony = game.world().planet_at(Position::new(5, 2)).unwrap();
    assert_eq!(colony.owner, Some(ai));
    assert!(colony.population >= 1);
    // The colony ship was consumed by the settlement.
    assert!(!game.world().fleets.contains(settler));
    // Loading drew colonists out of the origin planet.
    assert!(game.world().planet_at(Position::new(2, 2)).unwrap().population < 5);
    assert!(game.missions(ai).is_empty());
}

#[test]
fn colonists_board_one_per_tick_while_loading() {
    let map = GridMap::open(12, 12);
    let combat = AttritionCombat;
    let mut world = WorldContext::new(1);
    let ai = world.add_realm(false, 3);

    world.add_planet(Position::new(2, 2), Planet::owned_by(ai, 5));
    world.add_planet(Position::new(8, 8), Planet::unowned());
    let settler = world.spawn_fleet(
        Fleet::new("Settler", ai, Position::new(2, 2), 1)
            .with_moves(2)
            .with_colony_module(2),
    );
    let mut mission = Mission::new(MissionKind::Colonize, Position::new(8, 8)).bound_to(settler);
    mission.origin = Some(Position::new(2, 2));
    mission.enter_phase(MissionPhase::Loading);
    world.realm_mut(ai).unwrap().missions.push(mission);

    let env = Env::with_all(&map, &combat);
    let env = env.as_game_env();
    let mut game = Game::new(world, GameConfig::default());

    // One tick of the cycle processes the settler's Loading phase.
    run_cycle(&mut game, &env);
    assert_eq!(game.world().fleets.get(settler).unwrap().colonists, 1);

    run_cycle(&mut game, &env);
    let fleet = game.world().fleets.get(settler).unwrap();
    assert_eq!(fleet.colonists, 2);
    assert_eq!(game.missions(ai)[0].phase, MissionPhase::Trekking);
    assert!(fleet.route.is_some());
}

#[test]
fn turn_counter_advances_exactly_once_per_cycle() {
    let map = GridMap::open(8, 8);
    let combat = AttritionCombat;
    let mut world = WorldContext::new(-5);
    let _human = world.add_realm(true, 3);
    let a = world.add_realm(false, 3);
    let b = world.add_realm(false, 3);
    let _ = world.spawn_fleet(Fleet::new("A1", a, Position::new(1, 1), 1).with_moves(1));
    let _ = world.spawn_fleet(Fleet::new("B1", b, Position::new(6, 6), 1).with_moves(1));

    let env = Env::with_all(&map, &combat);
    let env = env.as_game_env();
    let mut game = Game::new(world, GameConfig::default());

    for expected in [-4, -3, -2] {
        run_cycle(&mut game, &env);
        assert_eq!(game.world().turn, expected);
    }
}

#[test]
fn transition_requested_mid_cycle_is_applied_on_completion() {
    let map = GridMap::open(8, 8);
    let combat = AttritionCombat;
    let mut world = WorldContext::new(1);
    let ai = world.add_realm(false, 3);
    let fleet = world.spawn_fleet(Fleet::new("Scout", ai, Position::new(1, 1), 1).with_moves(1));
    world
        .realm_mut(ai)
        .unwrap()
        .missions
        .push(Mission::new(MissionKind::Explore, Position::new(6, 6)).bound_to(fleet));

    let env = Env::with_all(&map, &combat);
    let env = env.as_game_env();
    let mut game = Game::new(world, GameConfig::default());

    // First tick leaves the scheduler mid-cycle.
    assert_eq!(game.tick(&env, &NullObserver).unwrap(), TickOutcome::Working);
    assert!(game.is_mid_cycle());

    game.request_transition(
        GameScreen::Research,
        None,
        TransitionPayload::None,
        &NullObserver,
    );
    // Deferred: still on the default screen while the cycle runs.
    assert_ne!(game.state_machine().current(), GameScreen::Research);

    loop {
        if game.tick(&env, &NullObserver).unwrap() == TickOutcome::CycleComplete {
            break;
        }
    }
    assert_eq!(game.state_machine().current(), GameScreen::Research);
}
