use farstar_core::TickError;

/// Errors surfaced while driving the turn engine.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// The scheduler reported a fatal invariant violation; the cycle was
    /// aborted to protect deterministic replay.
    #[error("turn cycle aborted: {0}")]
    Tick(#[from] TickError),
}
