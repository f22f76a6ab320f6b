//! The aggregator facade.
//!
//! Owns one `Space` per aggregating kind, the gauge trees, and the rate map.
//! Handles created here write into those structures; `drain` is the only
//! place data leaves, always in the order counters, gauges, timings,
//! histograms.

use std::ops::ControlFlow;
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::Result;
use crate::gauge::{Gauge, GaugeNode};
use crate::lv::{LabelValues, Space};
use crate::metric::{Counter, Histogram, Timing};
use crate::ratemap::RateMap;

/// Metric kind; also selects the line-format type tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Counter,
    Gauge,
    Timing,
    Histogram,
}

impl Kind {
    pub fn type_tag(self) -> &'static str {
        match self {
            Kind::Counter => "c",
            Kind::Gauge => "g",
            Kind::Timing => "ms",
            Kind::Histogram => "h",
        }
    }
}

/// One drained timeseries.
///
/// `values` holds every raw observation for counters, timings and histograms
/// and exactly one element (the latest value) for gauges.
#[derive(Debug, Clone, Copy)]
pub struct Series<'a> {
    pub kind: Kind,
    pub name: &'a str,
    pub label_values: &'a LabelValues,
    pub values: &'a [f64],
    pub sample_rate: f64,
}

impl Series<'_> {
    pub fn sum(&self) -> f64 {
        self.values.iter().sum()
    }

    pub fn last(&self) -> Option<f64> {
        self.values.last().copied()
    }
}

pub struct Aggregator {
    prefix: String,
    base_label_values: LabelValues,
    rates: RateMap,
    counters: Arc<Space>,
    gauges: DashMap<String, Arc<GaugeNode>>,
    timings: Arc<Space>,
    histograms: Arc<Space>,
}

impl Aggregator {
    /// `prefix` is prepended to every emitted name; `base_label_values` are
    /// attached to every emitted series ahead of its own label values.
    pub fn new<S: AsRef<str>>(prefix: impl Into<String>, base_label_values: &[S]) -> Result<Self> {
        Ok(Self {
            prefix: prefix.into(),
            base_label_values: LabelValues::try_from_slice(base_label_values)?,
            rates: RateMap::new(),
            counters: Arc::new(Space::new()),
            gauges: DashMap::new(),
            timings: Arc::new(Space::new()),
            histograms: Arc::new(Space::new()),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn base_label_values(&self) -> &LabelValues {
        &self.base_label_values
    }

    pub fn sample_rate(&self, name: &str) -> f64 {
        self.rates.get(name)
    }

    fn register_rate(&self, name: &str, sample_rate: f64) {
        assert!(
            sample_rate > 0.0 && sample_rate <= 1.0,
            "sample rate for {name} must be in (0, 1], got {sample_rate}"
        );
        self.rates.set(name, sample_rate);
    }

    /// Panics if `sample_rate` is outside (0, 1].
    pub fn new_counter(&self, name: &str, sample_rate: f64) -> Counter {
        self.register_rate(name, sample_rate);
        Counter::new(Arc::from(name), Arc::clone(&self.counters))
    }

    /// Repeated calls with the same name share the same gauge tree.
    pub fn new_gauge(&self, name: &str) -> Gauge {
        let root = Arc::clone(
            self.gauges
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(GaugeNode::new()))
                .value(),
        );
        Gauge::root(Arc::from(name), root)
    }

    /// Values are interpreted as milliseconds. Panics if `sample_rate` is
    /// outside (0, 1].
    pub fn new_timing(&self, name: &str, sample_rate: f64) -> Timing {
        self.register_rate(name, sample_rate);
        Timing::new(Arc::from(name), Arc::clone(&self.timings))
    }

    /// Panics if `sample_rate` is outside (0, 1].
    pub fn new_histogram(&self, name: &str, sample_rate: f64) -> Histogram {
        self.register_rate(name, sample_rate);
        Histogram::new(Arc::from(name), Arc::clone(&self.histograms))
    }

    /// Drain everything accumulated since the previous drain.
    ///
    /// Counters, timings and histograms are reset up front per kind, so a
    /// `Break` loses the rest of that kind's generation; kinds not yet reached
    /// keep their data for the next drain.
    pub fn drain<B>(&self, mut f: impl FnMut(&Series<'_>) -> ControlFlow<B>) -> ControlFlow<B> {
        let flow = self.drain_space(&self.counters, Kind::Counter, &mut f);
        if flow.is_break() {
            return flow;
        }

        let roots: Vec<(String, Arc<GaugeNode>)> = self
            .gauges
            .iter()
            .map(|e| (e.key().clone(), Arc::clone(e.value())))
            .collect();
        for (name, root) in &roots {
            let flow = root.walk_touched(name, &mut |name, label_values, value| {
                f(&Series {
                    kind: Kind::Gauge,
                    name,
                    label_values,
                    values: std::slice::from_ref(&value),
                    sample_rate: 1.0,
                })
            });
            if flow.is_break() {
                return flow;
            }
        }

        let flow = self.drain_space(&self.timings, Kind::Timing, &mut f);
        if flow.is_break() {
            return flow;
        }
        self.drain_space(&self.histograms, Kind::Histogram, &mut f)
    }

    fn drain_space<B>(
        &self,
        space: &Space,
        kind: Kind,
        f: &mut impl FnMut(&Series<'_>) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        space.reset().walk(|name, label_values, values| {
            f(&Series {
                kind,
                name,
                label_values,
                values,
                sample_rate: self.rates.get(name),
            })
        })
    }
}
