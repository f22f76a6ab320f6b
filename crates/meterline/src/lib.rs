//! Top-level facade crate for meterline.
//!
//! Re-exports the core engine and the agent runtime so users can depend on a single crate.

pub mod core {
    pub use meterline_core::*;
}

pub mod agent {
    pub use meterline_agent::*;
}

pub use meterline_core::{Aggregator, Counter, Gauge, Histogram, Provider, Timing};
