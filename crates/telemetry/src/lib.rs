//! stackhealth-telemetry -- verification scenarios for the telemetry
//! service: alarms, samples, statistics, events, and the notification
//! meters emitted for resources owned by other services.
//!
//! Scenario step sequences and their operator-facing failure messages are
//! the crate's contract; [`register_scenarios`] wires all of them into a
//! registry in report order.

pub mod helpers;
pub mod scenarios;
pub mod waits;

pub use scenarios::register_scenarios;
