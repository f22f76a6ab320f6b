#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use axum::{body::to_bytes, extract::State, http::StatusCode, response::Response, Json};

use meterline_agent::app_state::AppState;
use meterline_agent::config;
use meterline_agent::ops::{self, ObserveKind, Observation};

fn state(yaml: &str) -> AppState {
    AppState::new(config::load_from_str(yaml).unwrap()).unwrap()
}

fn obs(kind: ObserveKind, name: &str, labels: &[&str], value: f64) -> Observation {
    Observation {
        kind,
        name: name.to_string(),
        labels: labels.iter().map(|s| s.to_string()).collect(),
        value,
    }
}

async fn body_text(resp: Response) -> String {
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn observe_then_flush_returns_lines() {
    let st = state(
        r#"
version: 1
metrics:
  prefix: "svc."
  sample_rates:
    - { name: requests, rate: 0.5 }
"#,
    );

    for _ in 0..2 {
        let resp = ops::observe(
            State(st.clone()),
            Json(obs(ObserveKind::Counter, "requests", &["code", "200"], 1.0)),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    }
    let resp = ops::observe(
        State(st.clone()),
        Json(obs(ObserveKind::Gauge, "inflight", &[], 7.0)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);

    let resp = ops::flush(State(st.clone())).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        body_text(resp).await,
        "svc.requests,code=200:2.000000|c|@0.500000\nsvc.inflight:7.000000|g\n"
    );

    // Drained: the next flush is empty.
    let resp = ops::flush(State(st)).await;
    assert_eq!(body_text(resp).await, "");
}

#[tokio::test]
async fn observe_rejects_odd_labels() {
    let st = state("version: 1\n");
    let resp = ops::observe(
        State(st.clone()),
        Json(obs(ObserveKind::Timing, "rpc", &["method"], 3.0)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let v: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(v["code"], "BAD_LABELS");

    // Nothing was recorded.
    assert_eq!(body_text(ops::flush(State(st)).await).await, "");
}

#[tokio::test]
async fn observe_rejects_empty_name_and_non_finite_value() {
    let st = state("version: 1\n");

    let resp = ops::observe(
        State(st.clone()),
        Json(obs(ObserveKind::Histogram, "", &[], 1.0)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = ops::observe(
        State(st),
        Json(obs(ObserveKind::Histogram, "size", &[], f64::NAN)),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let v: serde_json::Value = serde_json::from_str(&body_text(resp).await).unwrap();
    assert_eq!(v["code"], "BAD_REQUEST");
}

#[test]
fn observation_body_is_strict() {
    let ok: Observation = serde_json::from_str(
        r#"{"kind":"histogram","name":"size","labels":["shard","a"],"value":12.5}"#,
    )
    .unwrap();
    assert!(matches!(ok.kind, ObserveKind::Histogram));
    assert_eq!(ok.labels, ["shard", "a"]);

    let bad = serde_json::from_str::<Observation>(
        r#"{"kind":"counter","name":"x","value":1,"extra":true}"#,
    );
    assert!(bad.is_err());
}
