//! Flush drivers.
//!
//! A `Sink` takes one generation out of an `Aggregator` and delivers it; the
//! flush loop calls it on every tick until shutdown.

mod flush_loop;
mod sink;

pub use flush_loop::{run_loop, Tick};
pub use sink::{pack_lines, Sink, UdpSink, WriterSink};
