use std::time::Duration;

use farstar_core::{Game, GameEnv, GameScreen, StateObserver, TickOutcome, TransitionPayload};
use tokio::time::interval;
use tracing::{debug, error, info};

use crate::error::DriverError;

/// Cadence settings for the cooperative driver.
#[derive(Clone, Copy, Debug)]
pub struct DriverConfig {
    /// Pause between scheduler invocations, leaving room for the
    /// presentation layer to refresh between fleets.
    pub tick_interval: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(25),
        }
    }
}

/// Drive one full automated-turn cycle to completion.
///
/// Enters the AI-turn presentation state, invokes `tick()` at the
/// configured cadence until the scheduler reports completion (which
/// applies any deferred transition), and returns the number of ticks the
/// cycle took.
pub async fn run_turn_cycle(
    game: &mut Game,
    env: &GameEnv<'_>,
    observer: &dyn StateObserver,
    config: DriverConfig,
) -> Result<u64, DriverError> {
    game.request_transition(GameScreen::AiTurn, None, TransitionPayload::None, observer);

    let mut cadence = interval(config.tick_interval);
    let mut ticks: u64 = 0;

    loop {
        cadence.tick().await;
        ticks += 1;
        match game.tick(env, observer) {
            Ok(TickOutcome::Working) => {
                debug!(ticks, "scheduler tick");
            }
            Ok(TickOutcome::CycleComplete) => {
                info!(ticks, turn = game.world().turn, "turn cycle complete");
                return Ok(ticks);
            }
            Err(tick_error) => {
                error!(%tick_error, "turn cycle aborted");
                return Err(DriverError::Tick(tick_error));
            }
        }
    }
}
