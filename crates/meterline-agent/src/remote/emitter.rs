use std::ops::ControlFlow;
use std::sync::Arc;
use std::time::SystemTime;

use async_trait::async_trait;

use meterline_core::error::{MeterlineError, Result};
use meterline_core::{Aggregator, Kind, LabelValues, Series};

use super::dispatch::dispatch_chunks;
use crate::emit::Sink;

/// Most data points a single request may carry.
pub const MAX_BATCH_SIZE: usize = 20;
/// Upper bound on simultaneous requests.
pub const MAX_CONCURRENT_REQUESTS: usize = 20;
/// Most distinct values one statistic-set datum may carry.
pub const MAX_VALUES_PER_DATUM: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    None,
    Count,
    Milliseconds,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum DatumValue {
    Single(f64),
    /// Distinct values with how often each was observed.
    Set { values: Vec<f64>, counts: Vec<f64> },
}

/// One remote data point.
#[derive(Debug, Clone, PartialEq)]
pub struct Datum {
    pub name: String,
    pub dimensions: Vec<Dimension>,
    pub value: DatumValue,
    pub unit: Unit,
    pub timestamp: SystemTime,
}

/// One request's worth of data points.
#[derive(Debug, Clone)]
pub struct MetricBatch {
    pub namespace: Arc<str>,
    pub data: Vec<Datum>,
}

/// Remote metrics service. Implementations wrap a vendor client.
#[async_trait]
pub trait MetricClient: Send + Sync {
    async fn put_metric_data(&self, batch: MetricBatch) -> Result<()>;
}

#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub namespace: String,
    pub batch_size: usize,
    pub concurrent_requests: usize,
    /// Percentiles in (0, 1) reported for timings and histograms. Empty sends
    /// the raw values as statistic sets instead.
    pub percentiles: Vec<f64>,
}

impl RemoteConfig {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            batch_size: MAX_BATCH_SIZE,
            concurrent_requests: 10,
            percentiles: vec![0.50, 0.90, 0.95, 0.99],
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.namespace.is_empty() {
            return Err(MeterlineError::Config("remote namespace must not be empty".into()));
        }
        if !(1..=MAX_BATCH_SIZE).contains(&self.batch_size) {
            return Err(MeterlineError::Config(format!(
                "remote batch_size must be between 1 and {MAX_BATCH_SIZE}"
            )));
        }
        if self.concurrent_requests == 0 {
            return Err(MeterlineError::Config(
                "remote concurrent_requests must be at least 1".into(),
            ));
        }
        if let Some(p) = self.percentiles.iter().find(|p| !(**p > 0.0 && **p < 1.0)) {
            return Err(MeterlineError::Config(format!(
                "percentile {p} must be in (0, 1)"
            )));
        }
        Ok(())
    }
}

/// Sink that converts each flush into data points and sends them in batches
/// through a `MetricClient`.
///
/// Failed batches are not retried: their data points are dropped and the next
/// flush carries on with new data.
pub struct RemoteEmitter<C> {
    client: Arc<C>,
    namespace: Arc<str>,
    batch_size: usize,
    concurrent_requests: usize,
    percentiles: Vec<f64>,
}

impl<C: MetricClient> RemoteEmitter<C> {
    pub fn new(client: Arc<C>, cfg: RemoteConfig) -> Result<Self> {
        cfg.validate()?;
        let concurrent_requests = if cfg.concurrent_requests > MAX_CONCURRENT_REQUESTS {
            tracing::warn!(
                requested = cfg.concurrent_requests,
                max = MAX_CONCURRENT_REQUESTS,
                "concurrent_requests clamped"
            );
            MAX_CONCURRENT_REQUESTS
        } else {
            cfg.concurrent_requests
        };
        Ok(Self {
            client,
            namespace: Arc::from(cfg.namespace),
            batch_size: cfg.batch_size,
            concurrent_requests,
            percentiles: cfg.percentiles,
        })
    }

    pub fn concurrent_requests(&self) -> usize {
        self.concurrent_requests
    }

    /// Drain `agg` into data points stamped with `now`.
    pub fn collect(&self, agg: &Aggregator, now: SystemTime) -> Vec<Datum> {
        let mut data = Vec::new();
        let _: ControlFlow<()> = agg.drain(|series| {
            self.push_series(&mut data, agg, series, now);
            ControlFlow::Continue(())
        });
        data
    }

    fn push_series(&self, data: &mut Vec<Datum>, agg: &Aggregator, series: &Series<'_>, now: SystemTime) {
        let name = format!("{}{}", agg.prefix(), series.name);
        let dimensions = dimensions(agg.base_label_values(), series.label_values);
        let datum = |name: String, value: DatumValue, unit: Unit| Datum {
            name,
            dimensions: dimensions.clone(),
            value,
            unit,
            timestamp: now,
        };

        match series.kind {
            Kind::Counter => data.push(datum(name, DatumValue::Single(series.sum()), Unit::Count)),
            Kind::Gauge => {
                if let Some(v) = series.last() {
                    data.push(datum(name, DatumValue::Single(v), Unit::None));
                }
            }
            Kind::Timing | Kind::Histogram => {
                let unit = if series.kind == Kind::Timing {
                    Unit::Milliseconds
                } else {
                    Unit::None
                };
                let mut sorted = series.values.to_vec();
                sorted.sort_by(f64::total_cmp);

                if self.percentiles.is_empty() {
                    for set in statistic_sets(&sorted) {
                        data.push(datum(name.clone(), set, unit));
                    }
                    return;
                }
                for &p in &self.percentiles {
                    if let Some(v) = quantile(&sorted, p) {
                        let pname = format!("{name}_{}", format_percentile(p));
                        data.push(datum(pname, DatumValue::Single(v), unit));
                    }
                }
            }
        }
    }
}

#[async_trait]
impl<C: MetricClient + 'static> Sink for RemoteEmitter<C> {
    async fn flush(&mut self, agg: &Aggregator) -> Result<u64> {
        let data = self.collect(agg, SystemTime::now());
        let points = data.len() as u64;
        if data.is_empty() {
            return Ok(0);
        }

        let chunks = dispatch_chunks(data, self.batch_size, self.concurrent_requests, |chunk| {
            let client = Arc::clone(&self.client);
            let namespace = Arc::clone(&self.namespace);
            async move { client.put_metric_data(MetricBatch { namespace, data: chunk }).await }
        })
        .await?;

        tracing::debug!(points, chunks, namespace = %self.namespace, "remote flush sent");
        Ok(points)
    }
}

fn dimensions(base: &LabelValues, series: &LabelValues) -> Vec<Dimension> {
    base.pairs()
        .chain(series.pairs())
        .map(|(k, v)| Dimension {
            name: k.to_owned(),
            value: v.to_owned(),
        })
        .collect()
}

/// Nearest-rank quantile over sorted values.
fn quantile(sorted: &[f64], p: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let rank = (p * sorted.len() as f64).ceil() as usize;
    sorted.get(rank.clamp(1, sorted.len()) - 1).copied()
}

/// `0.5 -> "50"`, `0.999 -> "99.9"`.
fn format_percentile(p: f64) -> String {
    let pct = (p * 100.0 * 1e6).round() / 1e6;
    format!("{pct}")
}

/// Run-length encode sorted values into sets of at most
/// `MAX_VALUES_PER_DATUM` distinct values each.
fn statistic_sets(sorted: &[f64]) -> Vec<DatumValue> {
    let mut sets = Vec::new();
    let mut values: Vec<f64> = Vec::new();
    let mut counts: Vec<f64> = Vec::new();
    for &v in sorted {
        if values.last() == Some(&v) {
            if let Some(c) = counts.last_mut() {
                *c += 1.0;
            }
            continue;
        }
        if values.len() == MAX_VALUES_PER_DATUM {
            sets.push(DatumValue::Set {
                values: std::mem::take(&mut values),
                counts: std::mem::take(&mut counts),
            });
        }
        values.push(v);
        counts.push(1.0);
    }
    if !values.is_empty() {
        sets.push(DatumValue::Set { values, counts });
    }
    sets
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percentile_names() {
        assert_eq!(format_percentile(0.5), "50");
        assert_eq!(format_percentile(0.95), "95");
        assert_eq!(format_percentile(0.999), "99.9");
    }

    #[test]
    fn nearest_rank() {
        let v: Vec<f64> = (1..=100).map(f64::from).collect();
        assert_eq!(quantile(&v, 0.5), Some(50.0));
        assert_eq!(quantile(&v, 0.99), Some(99.0));
        assert_eq!(quantile(&[7.0], 0.9), Some(7.0));
        assert_eq!(quantile(&[], 0.9), None);
    }

    #[test]
    fn sets_count_duplicates_and_split() {
        let sets = statistic_sets(&[1.0, 1.0, 2.0, 3.0, 3.0, 3.0]);
        assert_eq!(
            sets,
            vec![DatumValue::Set {
                values: vec![1.0, 2.0, 3.0],
                counts: vec![2.0, 1.0, 3.0],
            }]
        );

        let many: Vec<f64> = (0..(MAX_VALUES_PER_DATUM + 5)).map(|i| i as f64).collect();
        assert_eq!(statistic_sets(&many).len(), 2);
    }
}
