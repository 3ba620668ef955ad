//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Router transitions produce:
//!     → tracing spans (one per navigation, carrying a navigation id)
//!     → logging.rs (structured log events, subscriber setup)
//!     → metrics.rs (counters by outcome)
//! ```
//!
//! # Design Decisions
//! - The library only emits; installing a subscriber or recorder is the
//!   application's call (the CLI installs a subscriber)
//! - Navigation id flows through every event of a transition

pub mod logging;
pub mod metrics;
