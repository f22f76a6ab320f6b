//! Line-format flush vectors.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(clippy::panic)]

use std::fs;

mod vector_loader;
use vector_loader::FlushVector;

fn load(name: &str) -> FlushVector {
    let s = fs::read_to_string(format!("tests/vectors/{name}")).unwrap();
    serde_json::from_str(&s).unwrap()
}

fn flush(agg: &meterline_core::Aggregator) -> Vec<String> {
    let mut out = Vec::new();
    let n = agg.write_to(&mut out).expect("flush to Vec cannot fail");
    assert_eq!(n as usize, out.len());
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(str::to_owned)
        .collect()
}

#[test]
fn flush_vectors() {
    let files = [
        "requests_inflight.json",
        "sampling.json",
        "prefix_base_labels.json",
        "timings_unaggregated.json",
        "gauge_last_value.json",
    ];

    for f in files {
        let v = load(f);
        let agg = v.build();
        v.apply(&agg);

        let mut got = flush(&agg);
        let mut want = v.expect_lines.clone();
        got.sort();
        want.sort();
        assert_eq!(got, want, "vector={}", v.description);

        if v.expect_second_flush_empty {
            assert!(flush(&agg).is_empty(), "vector={}", v.description);
        }
    }
}
