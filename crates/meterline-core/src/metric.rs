//! Typed observation handles for the aggregating kinds.
//!
//! Handles are cheap clones (two `Arc`s and a label sequence). `with` derives a
//! new handle with an extended label scope and never mutates the parent.

use std::sync::Arc;
use std::time::Duration;

use crate::lv::{LabelValues, Space};

#[derive(Clone)]
struct Observer {
    name: Arc<str>,
    label_values: LabelValues,
    space: Arc<Space>,
}

impl Observer {
    fn with<S: AsRef<str>>(&self, label_values: &[S]) -> Self {
        Self {
            name: Arc::clone(&self.name),
            label_values: self.label_values.with(label_values),
            space: Arc::clone(&self.space),
        }
    }

    fn observe(&self, value: f64) {
        self.space.observe(&self.name, &self.label_values, value);
    }
}

/// Counter: observations are summed per series per flush.
#[derive(Clone)]
pub struct Counter(Observer);

impl Counter {
    pub(crate) fn new(name: Arc<str>, space: Arc<Space>) -> Self {
        Self(Observer {
            name,
            label_values: LabelValues::new(),
            space,
        })
    }

    /// Panics on an odd-length list.
    pub fn with<S: AsRef<str>>(&self, label_values: &[S]) -> Self {
        Self(self.0.with(label_values))
    }

    pub fn add(&self, delta: f64) {
        self.0.observe(delta);
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn label_values(&self) -> &LabelValues {
        &self.0.label_values
    }
}

/// Timing: every observation is kept and emitted as a millisecond value.
#[derive(Clone)]
pub struct Timing(Observer);

impl Timing {
    pub(crate) fn new(name: Arc<str>, space: Arc<Space>) -> Self {
        Self(Observer {
            name,
            label_values: LabelValues::new(),
            space,
        })
    }

    /// Panics on an odd-length list.
    pub fn with<S: AsRef<str>>(&self, label_values: &[S]) -> Self {
        Self(self.0.with(label_values))
    }

    /// Record `millis` milliseconds.
    pub fn observe(&self, millis: f64) {
        self.0.observe(millis);
    }

    pub fn observe_duration(&self, d: Duration) {
        self.0.observe(d.as_secs_f64() * 1000.0);
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn label_values(&self) -> &LabelValues {
        &self.0.label_values
    }
}

/// Histogram: like `Timing` but unit-less.
#[derive(Clone)]
pub struct Histogram(Observer);

impl Histogram {
    pub(crate) fn new(name: Arc<str>, space: Arc<Space>) -> Self {
        Self(Observer {
            name,
            label_values: LabelValues::new(),
            space,
        })
    }

    /// Panics on an odd-length list.
    pub fn with<S: AsRef<str>>(&self, label_values: &[S]) -> Self {
        Self(self.0.with(label_values))
    }

    pub fn observe(&self, value: f64) {
        self.0.observe(value);
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn label_values(&self) -> &LabelValues {
        &self.0.label_values
    }
}
