//! meterline core: label-indexed metric aggregation without a runtime.
//!
//! Producers record observations through typed handles (`Counter`, `Gauge`,
//! `Timing`, `Histogram`) created by an `Aggregator`. A flush driver calls
//! `Aggregator::write_to` (line format) or `Aggregator::drain` (any other
//! encoding) to take everything accumulated since the previous flush.
//! Code that should not depend on this backend can take `&dyn Provider`.
//!
//! # Defensive guarantees
//! `unwrap`, `expect`, and `panic!` are compile-denied here. Programmer errors
//! (odd label-value lists, sample rates outside (0, 1]) are reported through
//! `assert!`; everything else surfaces as `MeterlineError`.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

pub mod aggregator;
pub mod error;
pub mod gauge;
pub mod line;
pub mod lv;
pub mod metric;
pub mod provider;
pub mod ratemap;

pub use aggregator::{Aggregator, Kind, Series};
pub use error::{ErrorCode, MeterlineError, Result};
pub use gauge::Gauge;
pub use lv::{LabelValues, NO_LABELS};
pub use metric::{Counter, Histogram, Timing};
pub use provider::Provider;
