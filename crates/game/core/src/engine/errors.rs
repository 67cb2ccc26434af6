use crate::error::ErrorSeverity;

/// Fatal invariant violations surfaced by the turn scheduler.
///
/// These abort the running cycle: continuing with a corrupted realm index
/// or turn counter would desynchronize deterministic replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TickError {
    #[error("realm index {index} out of range (realm count {count})")]
    RealmIndexOutOfRange { index: usize, count: usize },

    #[error("turn counter overflow at {turn}")]
    TurnCounterOverflow { turn: i32 },
}

impl TickError {
    pub const fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Fatal
    }
}
