//! Turn scheduling and presentation-state orchestration.
//!
//! The [`Game`] façade is the single mutation path into the world: the
//! external driver invokes [`Game::tick`] at its own cadence, the UI layer
//! submits human moves and transition requests, and everything else flows
//! through the scheduler and the state machine owned here.

mod errors;
mod fsm;
mod scheduler;

pub use errors::TickError;
pub use fsm::{
    GameScreen, GameStateMachine, NullObserver, PresentationHint, StateObserver, TransitionPayload,
};
pub use scheduler::{TickOutcome, TurnScheduler};

use crate::config::GameConfig;
use crate::conflict::{self, MoveOutcome};
use crate::env::GameEnv;
use crate::state::{FleetId, Mission, Position, RealmId, WorldContext};

/// Top-level façade owning the world, the scheduler, and the state
/// machine.
#[derive(Debug)]
pub struct Game {
    world: WorldContext,
    config: GameConfig,
    scheduler: TurnScheduler,
    fsm: GameStateMachine,
}

impl Game {
    pub fn new(world: WorldContext, config: GameConfig) -> Self {
        Self {
            world,
            config,
            scheduler: TurnScheduler::new(),
            fsm: GameStateMachine::new(),
        }
    }

    pub fn world(&self) -> &WorldContext {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut WorldContext {
        &mut self.world
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state_machine(&self) -> &GameStateMachine {
        &self.fsm
    }

    pub fn state_machine_mut(&mut self) -> &mut GameStateMachine {
        &mut self.fsm
    }

    pub fn is_mid_cycle(&self) -> bool {
        self.scheduler.is_mid_cycle()
    }

    /// Advance the world by one scheduler increment. On cycle completion
    /// any deferred transition is applied (or the machine returns to the
    /// primary map state).
    pub fn tick(
        &mut self,
        env: &GameEnv<'_>,
        observer: &dyn StateObserver,
    ) -> Result<TickOutcome, TickError> {
        let outcome = self.scheduler.tick(&mut self.world, env, &self.config)?;
        if outcome == TickOutcome::CycleComplete {
            self.fsm.on_cycle_complete(&self.world, observer);
        }
        Ok(outcome)
    }

    /// Request a presentation-state transition (see
    /// [`GameStateMachine::request_transition`]).
    pub fn request_transition(
        &mut self,
        screen: GameScreen,
        focus: Option<RealmId>,
        payload: TransitionPayload,
        observer: &dyn StateObserver,
    ) {
        let busy = self.scheduler.is_mid_cycle();
        self.fsm
            .request_transition(&self.world, busy, screen, focus, payload, observer);
    }

    /// Perform a human move synchronously and report the resulting
    /// conflict classification for UI feedback.
    pub fn submit_human_move(
        &mut self,
        env: &GameEnv<'_>,
        fleet: FleetId,
        target: Position,
    ) -> MoveOutcome {
        let Some(mover) = self.world.human_realm() else {
            return MoveOutcome::Rejected;
        };
        conflict::commit_move(&mut self.world, env, &self.config, mover, fleet, target)
    }

    /// Read-only mission list access for UI inspection.
    pub fn missions(&self, realm: RealmId) -> &[Mission] {
        self.world
            .realm(realm)
            .map(|realm| realm.missions.as_slice())
            .unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{AttritionCombat, Env, GridMap};
    use crate::state::Fleet;

    #[test]
    fn facade_runs_a_cycle_and_returns_to_starmap() {
        let map = GridMap::open(8, 8);
        let combat = AttritionCombat;
        let mut world = WorldContext::new(1);
        let _human = world.add_realm(true, 3);
        let ai = world.add_realm(false, 3);
        let _ = world.spawn_fleet(Fleet::new("Scout", ai, Position::new(1, 1), 1).with_moves(1));

        let env = Env::with_all(&map, &combat);
        let env = env.as_game_env();
        let mut game = Game::new(world, GameConfig::default());

        loop {
            match game.tick(&env, &NullObserver).unwrap() {
                TickOutcome::Working => continue,
                TickOutcome::CycleComplete => break,
            }
        }
        assert_eq!(game.state_machine().current(), GameScreen::Starmap);
        assert_eq!(game.world().turn, 2);
    }

    #[test]
    fn human_move_reports_classification() {
        let map = GridMap::open(8, 8);
        let combat = AttritionCombat;
        let mut world = WorldContext::new(1);
        let human = world.add_realm(true, 3);
        let fleet = world.spawn_fleet(Fleet::new("Flag", human, Position::new(2, 2), 1).with_moves(2));

        let env = Env::with_all(&map, &combat);
        let env = env.as_game_env();
        let mut game = Game::new(world, GameConfig::default());

        let outcome = game.submit_human_move(&env, fleet, Position::new(3, 2));
        assert_eq!(outcome, MoveOutcome::Relocated { to: Position::new(3, 2) });
        let outside = game.submit_human_move(&env, fleet, Position::new(-1, 2));
        assert_eq!(outside, MoveOutcome::Rejected);
    }
}
