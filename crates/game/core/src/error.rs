//! Common error infrastructure for farstar-core.
//!
//! Domain-specific errors are defined in their respective modules next to
//! the operations they guard; this module provides the shared severity
//! classification used to decide how a failure propagates.

/// Severity level of an error, used for categorization and recovery.
///
/// Per-fleet and per-mission failures are local: one fleet's failure must
/// never abort processing of other fleets in the same cycle. Only
/// invariant violations on shared indices escalate to `Fatal` and abort
/// the turn cycle, since continuing would desynchronize deterministic
/// replay.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Temporary condition that may succeed on retry or with an
    /// alternative action (blocked destination, exhausted search).
    Recoverable,

    /// Invalid input that is silently rejected without retry
    /// (out-of-bounds move, wrong owner).
    Validation,

    /// Unexpected state inconsistency worth investigating
    /// (orphaned mission, stale index entry).
    Internal,

    /// Shared-state invariant violated; the turn cycle must abort.
    Fatal,
}

impl ErrorSeverity {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }
}
