//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Parse flags → Resolve & validate → Select providers → Serve
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Server stops accepting → In-flight requests cancelled
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
pub use startup::{run_start, start_command, start_server, StartError};
