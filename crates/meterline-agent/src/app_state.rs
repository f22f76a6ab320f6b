//! Shared application state for the meterline agent.
//!
//! Owns the process aggregator. The flush loop and the ops HTTP handlers both
//! hold a clone.

use std::sync::Arc;

use meterline_core::error::{MeterlineError, Result};
use meterline_core::{Aggregator, LabelValues};

use crate::config::AgentConfig;
use crate::ops::{ObserveKind, Observation};

#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    cfg: AgentConfig,
    aggregator: Arc<Aggregator>,
}

impl AppState {
    /// Build application state.
    /// Returns Result so main can handle errors gracefully (no panic).
    pub fn new(cfg: AgentConfig) -> Result<Self> {
        let aggregator = Aggregator::new(
            cfg.metrics.prefix.clone(),
            &cfg.metrics.base_label_values(),
        )?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                cfg,
                aggregator: Arc::new(aggregator),
            }),
        })
    }

    pub fn aggregator(&self) -> Arc<Aggregator> {
        Arc::clone(&self.inner.aggregator)
    }

    /// Record one externally supplied observation.
    pub fn record(&self, obs: &Observation) -> Result<()> {
        if obs.name.is_empty() {
            return Err(MeterlineError::BadRequest("metric name must not be empty".into()));
        }
        if !obs.value.is_finite() {
            return Err(MeterlineError::BadRequest("value must be finite".into()));
        }
        // Reject odd lists here so the handle constructors below cannot panic.
        let labels = LabelValues::try_from_slice(&obs.labels)?;

        let agg = &self.inner.aggregator;
        let rate = self.inner.cfg.metrics.sample_rate(&obs.name);
        match obs.kind {
            ObserveKind::Counter => agg
                .new_counter(&obs.name, rate)
                .with(labels.as_slice())
                .add(obs.value),
            ObserveKind::Gauge => agg.new_gauge(&obs.name).with(labels.as_slice()).set(obs.value),
            ObserveKind::Timing => agg
                .new_timing(&obs.name, rate)
                .with(labels.as_slice())
                .observe(obs.value),
            ObserveKind::Histogram => agg
                .new_histogram(&obs.name, rate)
                .with(labels.as_slice())
                .observe(obs.value),
        }
        Ok(())
    }
}
