#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use meterline_agent::config::{self, SinkConfig};

#[test]
fn deny_unknown_fields_nested() {
    let bad = r#"
version: 1
agent:
  listen: "127.0.0.1:9102"
metrics:
  prefx: "svc." # typo should fail
"#;

    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn ok_minimal_config() {
    let cfg = config::load_from_str("version: 1\n").expect("must parse");
    assert_eq!(cfg.version, 1);
    assert_eq!(cfg.agent.flush_interval_ms, 10_000);
    assert!(matches!(cfg.sink, SinkConfig::Stdout));
    assert!(cfg.metrics.base_label_values().is_empty());
}

#[test]
fn full_config() {
    let ok = r#"
version: 1
agent:
  listen: "0.0.0.0:9200"
  flush_interval_ms: 500
metrics:
  prefix: "svc."
  base_labels:
    - { key: env, value: prod }
    - { key: host, value: a1 }
  sample_rates:
    - { name: requests, rate: 0.25 }
sink:
  kind: udp
  address: "127.0.0.1:8125"
"#;
    let cfg = config::load_from_str(ok).expect("must parse");
    assert_eq!(cfg.agent.listen_addr().unwrap().port(), 9200);
    assert_eq!(cfg.metrics.base_label_values(), ["env", "prod", "host", "a1"]);
    assert_eq!(cfg.metrics.sample_rate("requests"), 0.25);
    assert_eq!(cfg.metrics.sample_rate("other"), 1.0);
    match cfg.sink {
        SinkConfig::Udp {
            address,
            max_packet_bytes,
        } => {
            assert_eq!(address, "127.0.0.1:8125");
            assert_eq!(max_packet_bytes, 1432);
        }
        other => panic!("unexpected sink {other:?}"),
    }
}

#[test]
fn unsupported_version() {
    let err = config::load_from_str("version: 2\n").expect_err("must fail");
    assert_eq!(err.code().as_str(), "UNSUPPORTED_VERSION");
}

#[test]
fn sample_rate_out_of_range() {
    let bad = r#"
version: 1
metrics:
  sample_rates:
    - { name: requests, rate: 1.5 }
"#;
    let err = config::load_from_str(bad).expect_err("must fail");
    assert_eq!(err.code().as_str(), "BAD_CONFIG");
}

#[test]
fn duplicate_sample_rate() {
    let bad = r#"
version: 1
metrics:
  sample_rates:
    - { name: requests, rate: 0.5 }
    - { name: requests, rate: 0.1 }
"#;
    assert!(config::load_from_str(bad).is_err());
}

#[test]
fn flush_interval_bounds() {
    let bad = "version: 1\nagent:\n  flush_interval_ms: 5\n";
    assert!(config::load_from_str(bad).is_err());
}
