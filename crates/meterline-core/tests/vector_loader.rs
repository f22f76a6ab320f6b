//! JSON flush-scenario loader shared by line-format tests.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use serde::Deserialize;

use meterline_core::{Aggregator, Counter, Gauge, Histogram, Timing};

#[derive(Debug, Deserialize)]
pub struct FlushVector {
    pub description: String,
    #[serde(default)]
    pub prefix: String,
    #[serde(default)]
    pub base_labels: Vec<String>,
    #[serde(default)]
    pub rates: Vec<RateEntry>,
    pub ops: Vec<Op>,
    pub expect_lines: Vec<String>,
    #[serde(default)]
    pub expect_second_flush_empty: bool,
}

#[derive(Debug, Deserialize)]
pub struct RateEntry {
    pub name: String,
    pub rate: f64,
}

#[derive(Debug, Deserialize)]
pub struct Op {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub labels: Vec<String>,
    pub op: String,
    pub value: f64,
}

impl FlushVector {
    pub fn build(&self) -> Aggregator {
        Aggregator::new(self.prefix.clone(), &self.base_labels).unwrap()
    }

    fn rate(&self, name: &str) -> f64 {
        self.rates
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.rate)
            .unwrap_or(1.0)
    }

    /// Replay every op against `agg`.
    pub fn apply(&self, agg: &Aggregator) {
        for op in &self.ops {
            match (op.kind.as_str(), op.op.as_str()) {
                ("counter", "add") => {
                    let c: Counter = agg.new_counter(&op.name, self.rate(&op.name));
                    c.with(&op.labels).add(op.value);
                }
                ("gauge", "set") => {
                    let g: Gauge = agg.new_gauge(&op.name);
                    g.with(&op.labels).set(op.value);
                }
                ("gauge", "add") => {
                    let g: Gauge = agg.new_gauge(&op.name);
                    g.with(&op.labels).add(op.value);
                }
                ("timing", "observe") => {
                    let t: Timing = agg.new_timing(&op.name, self.rate(&op.name));
                    t.with(&op.labels).observe(op.value);
                }
                ("histogram", "observe") => {
                    let h: Histogram = agg.new_histogram(&op.name, self.rate(&op.name));
                    h.with(&op.labels).observe(op.value);
                }
                other => panic!("unsupported op in vector {}: {other:?}", self.description),
            }
        }
    }
}
