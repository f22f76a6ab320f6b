//! Backend-agnostic metric interfaces.
//!
//! Producer code written against these traits does not care which backend
//! aggregates its observations. `Aggregator` is one `Provider`; the concrete
//! handles in `metric` and `gauge` implement the handle traits. `with` returns
//! a boxed handle so a trait object can derive further label scopes.

use crate::aggregator::Aggregator;
use crate::{gauge, metric};

/// Monotonic count. `with` panics on an odd-length list.
pub trait Counter: Send + Sync {
    fn with(&self, label_values: &[&str]) -> Box<dyn Counter>;
    fn add(&self, delta: f64);
}

/// Point-in-time value.
pub trait Gauge: Send + Sync {
    fn with(&self, label_values: &[&str]) -> Box<dyn Gauge>;
    fn set(&self, value: f64);
    fn add(&self, delta: f64);
}

/// Distribution of observed values.
pub trait Histogram: Send + Sync {
    fn with(&self, label_values: &[&str]) -> Box<dyn Histogram>;
    fn observe(&self, value: f64);
}

/// Source of metric handles.
pub trait Provider: Send + Sync {
    fn new_counter(&self, name: &str) -> Box<dyn Counter>;
    fn new_gauge(&self, name: &str) -> Box<dyn Gauge>;
    fn new_histogram(&self, name: &str) -> Box<dyn Histogram>;

    /// Release backend resources. Handles created earlier may stop reporting.
    fn stop(&self) {}
}

impl Counter for metric::Counter {
    fn with(&self, label_values: &[&str]) -> Box<dyn Counter> {
        Box::new(metric::Counter::with(self, label_values))
    }

    fn add(&self, delta: f64) {
        metric::Counter::add(self, delta);
    }
}

impl Gauge for gauge::Gauge {
    fn with(&self, label_values: &[&str]) -> Box<dyn Gauge> {
        Box::new(gauge::Gauge::with(self, label_values))
    }

    fn set(&self, value: f64) {
        gauge::Gauge::set(self, value);
    }

    fn add(&self, delta: f64) {
        gauge::Gauge::add(self, delta);
    }
}

impl Histogram for metric::Histogram {
    fn with(&self, label_values: &[&str]) -> Box<dyn Histogram> {
        Box::new(metric::Histogram::with(self, label_values))
    }

    fn observe(&self, value: f64) {
        metric::Histogram::observe(self, value);
    }
}

// Timings are histograms in milliseconds.
impl Histogram for metric::Timing {
    fn with(&self, label_values: &[&str]) -> Box<dyn Histogram> {
        Box::new(metric::Timing::with(self, label_values))
    }

    fn observe(&self, value: f64) {
        metric::Timing::observe(self, value);
    }
}

/// Handles created through `Provider` are unsampled.
impl Provider for Aggregator {
    fn new_counter(&self, name: &str) -> Box<dyn Counter> {
        Box::new(Aggregator::new_counter(self, name, 1.0))
    }

    fn new_gauge(&self, name: &str) -> Box<dyn Gauge> {
        Box::new(Aggregator::new_gauge(self, name))
    }

    fn new_histogram(&self, name: &str) -> Box<dyn Histogram> {
        Box::new(Aggregator::new_histogram(self, name, 1.0))
    }
}
