//! Discrete presentation-state machine.
//!
//! Holds the current screen and a previous-state slot for return-to-caller
//! transitions. Transitions requested while the automated-turn scheduler is
//! mid-cycle are deferred (never dropped) and applied once the scheduler
//! reports completion. Payload-shape mismatches fall back to the main menu;
//! that is a recoverable condition, not an error.

use crate::conflict::CombatTicket;
use crate::state::{FleetId, Position, RealmId, WorldContext};

/// The closed set of presentation states.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum GameScreen {
    #[default]
    MainMenu,
    Intro,
    NewGame,
    GalaxySetup,
    RaceSelect,
    LoadMenu,
    SaveMenu,
    Options,
    Help,
    Encyclopedia,
    Starmap,
    AiTurn,
    Combat,
    PlanetView,
    PlanetBombing,
    Colonization,
    FleetView,
    FleetOrders,
    ShipDesign,
    Research,
    Diplomacy,
    Espionage,
    TradeSummit,
    CouncilVote,
    NewsReel,
    History,
    TextOverlay,
    Victory,
    Defeat,
    Credits,
    GameEnd,
}

impl GameScreen {
    /// Terminal-ish states that reconfigure the notification cadence.
    pub fn is_terminal(self) -> bool {
        matches!(self, GameScreen::Credits | GameScreen::GameEnd)
    }
}

/// Hint for the presentation layer attached to terminal-state
/// notifications.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PresentationHint {
    FullRefresh,
}

/// Typed transition payload: each variant carries exactly the fields its
/// transitions need.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TransitionPayload {
    None,
    Fleet(FleetId),
    Planet(Position),
    Text(String),
    Combat(CombatTicket),
    Hint(PresentationHint),
}

/// Presentation notification sink. Exactly one notification is emitted per
/// applied transition.
pub trait StateObserver: Send + Sync {
    fn on_state_changed(&self, screen: GameScreen, payload: &TransitionPayload);
}

/// Observer that ignores every notification, for headless runs and tests.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl StateObserver for NullObserver {
    fn on_state_changed(&self, _screen: GameScreen, _payload: &TransitionPayload) {}
}

#[derive(Clone, Debug, PartialEq)]
struct DeferredTransition {
    screen: GameScreen,
    focus: Option<RealmId>,
    payload: TransitionPayload,
}

/// Top-level presentation state machine.
#[derive(Debug)]
pub struct GameStateMachine {
    current: GameScreen,
    previous: GameScreen,
    deferred: Option<DeferredTransition>,
    /// Which realm's message queue the presentation should focus.
    focus: Option<RealmId>,
    /// Once the human loss is finalized, transitions are no longer
    /// deferred behind the running cycle.
    human_defeated: bool,
}

impl Default for GameStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl GameStateMachine {
    pub fn new() -> Self {
        Self {
            current: GameScreen::MainMenu,
            previous: GameScreen::MainMenu,
            deferred: None,
            focus: None,
            human_defeated: false,
        }
    }

    pub fn current(&self) -> GameScreen {
        self.current
    }

    pub fn previous(&self) -> GameScreen {
        self.previous
    }

    pub fn focus(&self) -> Option<RealmId> {
        self.focus
    }

    pub fn has_deferred(&self) -> bool {
        self.deferred.is_some()
    }

    pub fn set_human_defeated(&mut self, defeated: bool) {
        self.human_defeated = defeated;
    }

    /// Request a transition to `screen`.
    ///
    /// While the scheduler is mid-cycle and the human loss is not yet
    /// finalized the request is queued (a single slot, latest request
    /// wins) and applied on cycle completion.
    pub fn request_transition(
        &mut self,
        world: &WorldContext,
        scheduler_busy: bool,
        screen: GameScreen,
        focus: Option<RealmId>,
        payload: TransitionPayload,
        observer: &dyn StateObserver,
    ) {
        if scheduler_busy && !self.human_defeated {
            self.deferred = Some(DeferredTransition {
                screen,
                focus,
                payload,
            });
            return;
        }
        self.apply(world, screen, focus, payload, observer);
    }

    /// Return to the state recorded in the previous-state slot.
    pub fn return_to_caller(&mut self, world: &WorldContext, observer: &dyn StateObserver) {
        let target = self.previous;
        self.apply(world, target, None, TransitionPayload::None, observer);
    }

    /// Called by the scheduler once an automated-turn cycle completes:
    /// applies the deferred transition, or returns to the primary map
    /// state when none is queued.
    pub fn on_cycle_complete(&mut self, world: &WorldContext, observer: &dyn StateObserver) {
        match self.deferred.take() {
            Some(deferred) => self.apply(
                world,
                deferred.screen,
                deferred.focus,
                deferred.payload,
                observer,
            ),
            None => self.apply(
                world,
                GameScreen::Starmap,
                None,
                TransitionPayload::None,
                observer,
            ),
        }
    }

    fn apply(
        &mut self,
        world: &WorldContext,
        screen: GameScreen,
        focus: Option<RealmId>,
        payload: TransitionPayload,
        observer: &dyn StateObserver,
    ) {
        let (screen, mut payload) = Self::validated(world, screen, payload);

        self.previous = self.current;
        self.current = screen;
        self.focus = focus;

        if screen.is_terminal() {
            // Presentation refresh hint for the reconfigured cadence.
            payload = TransitionPayload::Hint(PresentationHint::FullRefresh);
        }
        observer.on_state_changed(screen, &payload);
    }

    /// Payload-shape validation as a total function: every mismatch
    /// resolves to the main menu rather than leaving the machine stuck.
    fn validated(
        world: &WorldContext,
        screen: GameScreen,
        payload: TransitionPayload,
    ) -> (GameScreen, TransitionPayload) {
        match screen {
            GameScreen::PlanetBombing => match payload {
                TransitionPayload::Fleet(fleet_id) => {
                    let over_planet = world
                        .fleets
                        .get(fleet_id)
                        .is_some_and(|fleet| world.planet_at(fleet.position).is_some());
                    if over_planet {
                        (screen, TransitionPayload::Fleet(fleet_id))
                    } else {
                        (GameScreen::MainMenu, TransitionPayload::None)
                    }
                }
                _ => (GameScreen::MainMenu, TransitionPayload::None),
            },
            GameScreen::TextOverlay => match payload {
                TransitionPayload::Text(_) => (screen, payload),
                _ => (GameScreen::MainMenu, TransitionPayload::None),
            },
            GameScreen::Combat => match payload {
                TransitionPayload::Combat(_) => (screen, payload),
                _ => (GameScreen::MainMenu, TransitionPayload::None),
            },
            _ => (screen, payload),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        seen: Mutex<Vec<(GameScreen, TransitionPayload)>>,
    }

    impl StateObserver for RecordingObserver {
        fn on_state_changed(&self, screen: GameScreen, payload: &TransitionPayload) {
            self.seen.lock().unwrap().push((screen, payload.clone()));
        }
    }

    #[test]
    fn transition_records_previous_state() {
        let world = WorldContext::new(1);
        let observer = RecordingObserver::default();
        let mut fsm = GameStateMachine::new();

        fsm.request_transition(
            &world,
            false,
            GameScreen::Starmap,
            None,
            TransitionPayload::None,
            &observer,
        );
        fsm.request_transition(
            &world,
            false,
            GameScreen::Research,
            None,
            TransitionPayload::None,
            &observer,
        );
        assert_eq!(fsm.current(), GameScreen::Research);
        assert_eq!(fsm.previous(), GameScreen::Starmap);

        fsm.return_to_caller(&world, &observer);
        assert_eq!(fsm.current(), GameScreen::Starmap);
        assert_eq!(observer.seen.lock().unwrap().len(), 3);
    }

    #[test]
    fn text_overlay_without_text_falls_back_to_main_menu() {
        let world = WorldContext::new(1);
        let observer = RecordingObserver::default();
        let mut fsm = GameStateMachine::new();

        fsm.request_transition(
            &world,
            false,
            GameScreen::TextOverlay,
            None,
            TransitionPayload::None,
            &observer,
        );
        assert_eq!(fsm.current(), GameScreen::MainMenu);
    }

    #[test]
    fn bombing_requires_fleet_over_planet() {
        use crate::state::{Fleet, Planet, Position};

        let mut world = WorldContext::new(1);
        let realm = world.add_realm(true, 3);
        let adrift = world.spawn_fleet(Fleet::new("Adrift", realm, Position::new(1, 1), 1));
        world.add_planet(Position::new(4, 4), Planet::unowned());
        let bomber = world.spawn_fleet(Fleet::new("Bomber", realm, Position::new(4, 4), 1));

        let observer = RecordingObserver::default();
        let mut fsm = GameStateMachine::new();
        fsm.request_transition(
            &world,
            false,
            GameScreen::PlanetBombing,
            None,
            TransitionPayload::Fleet(adrift),
            &observer,
        );
        assert_eq!(fsm.current(), GameScreen::MainMenu);

        fsm.request_transition(
            &world,
            false,
            GameScreen::PlanetBombing,
            None,
            TransitionPayload::Fleet(bomber),
            &observer,
        );
        assert_eq!(fsm.current(), GameScreen::PlanetBombing);
    }

    #[test]
    fn busy_scheduler_defers_latest_transition_until_completion() {
        let world = WorldContext::new(1);
        let observer = RecordingObserver::default();
        let mut fsm = GameStateMachine::new();

        fsm.request_transition(
            &world,
            true,
            GameScreen::Research,
            None,
            TransitionPayload::None,
            &observer,
        );
        fsm.request_transition(
            &world,
            true,
            GameScreen::Diplomacy,
            None,
            TransitionPayload::None,
            &observer,
        );
        assert_eq!(fsm.current(), GameScreen::MainMenu);
        assert!(fsm.has_deferred());
        assert!(observer.seen.lock().unwrap().is_empty());

        fsm.on_cycle_complete(&world, &observer);
        assert_eq!(fsm.current(), GameScreen::Diplomacy);
        assert!(!fsm.has_deferred());
    }

    #[test]
    fn completion_without_deferral_returns_to_starmap() {
        let world = WorldContext::new(1);
        let observer = RecordingObserver::default();
        let mut fsm = GameStateMachine::new();

        fsm.on_cycle_complete(&world, &observer);
        assert_eq!(fsm.current(), GameScreen::Starmap);
    }

    #[test]
    fn terminal_states_carry_refresh_hint() {
        let world = WorldContext::new(1);
        let observer = RecordingObserver::default();
        let mut fsm = GameStateMachine::new();

        fsm.request_transition(
            &world,
            false,
            GameScreen::GameEnd,
            None,
            TransitionPayload::None,
            &observer,
        );
        let seen = observer.seen.lock().unwrap();
        assert_eq!(
            seen.last(),
            Some(&(
                GameScreen::GameEnd,
                TransitionPayload::Hint(PresentationHint::FullRefresh)
            ))
        );
    }

    #[test]
    fn finalized_human_loss_bypasses_deferral() {
        let world = WorldContext::new(1);
        let observer = RecordingObserver::default();
        let mut fsm = GameStateMachine::new();
        fsm.set_human_defeated(true);

        fsm.request_transition(
            &world,
            true,
            GameScreen::Defeat,
            None,
            TransitionPayload::None,
            &observer,
        );
        assert_eq!(fsm.current(), GameScreen::Defeat);
        assert!(!fsm.has_deferred());
    }
}
