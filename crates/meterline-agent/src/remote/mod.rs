//! Remote emission: data points, batching, and bounded concurrent dispatch.
//!
//! The engine talks to a remote service only through `MetricClient`; wire
//! protocol and credentials belong to the implementation.

pub mod dispatch;
pub mod emitter;

pub use dispatch::dispatch_chunks;
pub use emitter::{
    Datum, DatumValue, Dimension, MetricBatch, MetricClient, RemoteConfig, RemoteEmitter, Unit,
    MAX_BATCH_SIZE, MAX_CONCURRENT_REQUESTS, MAX_VALUES_PER_DATUM,
};
