use std::net::SocketAddr;

use serde::Deserialize;
use meterline_core::error::{MeterlineError, Result};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    pub version: u32,

    #[serde(default)]
    pub agent: AgentSection,

    #[serde(default)]
    pub metrics: MetricsSection,

    #[serde(default)]
    pub sink: SinkConfig,
}

impl AgentConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(MeterlineError::UnsupportedVersion);
        }
        self.agent.validate()?;
        self.metrics.validate()?;
        self.sink.validate()?;
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AgentSection {
    #[serde(default = "default_listen")]
    pub listen: String,

    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            flush_interval_ms: default_flush_interval_ms(),
        }
    }
}

impl AgentSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr()?;
        if !(100..=600_000).contains(&self.flush_interval_ms) {
            return Err(MeterlineError::Config(
                "agent.flush_interval_ms must be between 100 and 600000".into(),
            ));
        }
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen.parse().map_err(|_| {
            MeterlineError::Config(format!(
                "agent.listen must be a valid SocketAddr, got {}",
                self.listen
            ))
        })
    }
}

fn default_listen() -> String {
    "127.0.0.1:9102".into()
}
fn default_flush_interval_ms() -> u64 {
    10_000
}

#[derive(Debug, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct MetricsSection {
    #[serde(default)]
    pub prefix: String,

    /// Attached to every emitted series, in this order.
    #[serde(default)]
    pub base_labels: Vec<LabelPair>,

    #[serde(default)]
    pub sample_rates: Vec<SampleRate>,
}

impl MetricsSection {
    pub fn validate(&self) -> Result<()> {
        for r in &self.sample_rates {
            if !(r.rate > 0.0 && r.rate <= 1.0) {
                return Err(MeterlineError::Config(format!(
                    "metrics.sample_rates[{}] must be in (0, 1], got {}",
                    r.name, r.rate
                )));
            }
        }
        for (i, r) in self.sample_rates.iter().enumerate() {
            if self.sample_rates[..i].iter().any(|p| p.name == r.name) {
                return Err(MeterlineError::Config(format!(
                    "metrics.sample_rates lists {} more than once",
                    r.name
                )));
            }
        }
        Ok(())
    }

    /// Base labels flattened to `[k1, v1, k2, v2, ...]`.
    pub fn base_label_values(&self) -> Vec<String> {
        self.base_labels
            .iter()
            .flat_map(|p| [p.key.clone(), p.value.clone()])
            .collect()
    }

    /// Configured rate for `name`, 1.0 when unlisted.
    pub fn sample_rate(&self, name: &str) -> f64 {
        self.sample_rates
            .iter()
            .find(|r| r.name == name)
            .map(|r| r.rate)
            .unwrap_or(1.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LabelPair {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SampleRate {
    pub name: String,
    pub rate: f64,
}

/// Where the flush loop sends line-format output.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SinkConfig {
    #[default]
    Stdout,
    Udp {
        address: String,
        #[serde(default = "default_max_packet_bytes")]
        max_packet_bytes: usize,
    },
}

impl SinkConfig {
    pub fn validate(&self) -> Result<()> {
        match self {
            SinkConfig::Stdout => Ok(()),
            SinkConfig::Udp {
                address,
                max_packet_bytes,
            } => {
                if address.is_empty() {
                    return Err(MeterlineError::Config("sink.address must not be empty".into()));
                }
                if !(64..=65_507).contains(max_packet_bytes) {
                    return Err(MeterlineError::Config(
                        "sink.max_packet_bytes must be between 64 and 65507".into(),
                    ));
                }
                Ok(())
            }
        }
    }
}

fn default_max_packet_bytes() -> usize {
    1432
}
