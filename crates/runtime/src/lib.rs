//! Cooperative driver for the farstar turn engine.
//!
//! The core processes at most one fleet per tick by design; this crate
//! provides the external periodic invocation (a tokio interval), the
//! channel-backed presentation notification sink, and structured logging
//! around the cycle. The core itself stays free of async and I/O.
mod driver;
mod error;
mod event;

pub use driver::{DriverConfig, run_turn_cycle};
pub use error::DriverError;
pub use event::{ChannelObserver, PresentationEvent};
