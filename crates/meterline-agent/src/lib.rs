//! meterline agent library entry.
//!
//! Wires the core aggregator to a runtime: config loading, the timer-driven
//! flush loop and its sinks, batched remote dispatch, and the ops HTTP
//! surface. Consumed by the binary (`main.rs`) and by integration tests.

pub mod app_state;
pub mod config;
pub mod emit;
pub mod ops;
pub mod remote;
pub mod router;
