use farstar_core::{GameScreen, StateObserver, TransitionPayload};
use tokio::sync::mpsc;

/// A presentation notification forwarded out of the engine.
#[derive(Clone, Debug, PartialEq)]
pub struct PresentationEvent {
    pub screen: GameScreen,
    pub payload: TransitionPayload,
}

/// [`StateObserver`] that forwards every notification onto an unbounded
/// channel for the presentation layer to drain at its own pace.
#[derive(Clone, Debug)]
pub struct ChannelObserver {
    tx: mpsc::UnboundedSender<PresentationEvent>,
}

impl ChannelObserver {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PresentationEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl StateObserver for ChannelObserver {
    fn on_state_changed(&self, screen: GameScreen, payload: &TransitionPayload) {
        // A closed receiver means the presentation layer is gone; the
        // engine keeps running headless.
        let _ = self.tx.send(PresentationEvent {
            screen,
            payload: payload.clone(),
        });
    }
}
