//! Per-name sample rates, consulted only when serializing.

use dashmap::DashMap;

/// Rate reported for names that were never registered.
pub const DEFAULT_SAMPLE_RATE: f64 = 1.0;

#[derive(Default)]
pub struct RateMap {
    rates: DashMap<String, f64>,
}

impl RateMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `rate` for `name`, replacing any earlier value.
    pub fn set(&self, name: &str, rate: f64) {
        self.rates.insert(name.to_owned(), rate);
    }

    pub fn get(&self, name: &str) -> f64 {
        self.rates
            .get(name)
            .map(|r| *r.value())
            .unwrap_or(DEFAULT_SAMPLE_RATE)
    }
}
