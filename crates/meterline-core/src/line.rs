//! Line-format serialization of a drained aggregator.
//!
//! ```text
//! <prefix><name>[,k=v,...]:<value>|<type>[|@<rate>]\n
//! ```
//!
//! Values and rates use six fractional digits. Tags are the base label values
//! followed by the series' own; the tag block is omitted when both are empty.

use std::fmt::{self, Write as _};
use std::io;
use std::ops::ControlFlow;

use crate::aggregator::{Aggregator, Kind, Series};
use crate::error::{MeterlineError, Result};
use crate::lv::LabelValues;

/// Append one line to `out`.
pub fn format_line<W: fmt::Write + ?Sized>(
    out: &mut W,
    prefix: &str,
    base: &LabelValues,
    series: &Series<'_>,
    value: f64,
) -> fmt::Result {
    write!(out, "{prefix}{}", series.name)?;
    for (k, v) in base.pairs().chain(series.label_values.pairs()) {
        write!(out, ",{k}={v}")?;
    }
    write!(out, ":{value:.6}|{}", series.kind.type_tag())?;
    if series.kind != Kind::Gauge && series.sample_rate < 1.0 {
        write!(out, "|@{:.6}", series.sample_rate)?;
    }
    out.write_char('\n')
}

impl Aggregator {
    /// Flush every series to `w` in line format and return the bytes written.
    ///
    /// The first write error aborts the flush; the error carries the byte
    /// count that made it out. Lines already drained are not restored.
    pub fn write_to<W: io::Write + ?Sized>(&self, w: &mut W) -> Result<u64> {
        let mut written = 0u64;
        let mut line = String::with_capacity(128);
        let prefix = self.prefix();
        let base = self.base_label_values();

        let flow = self.drain(|series| {
            let sum;
            let values: &[f64] = match series.kind {
                Kind::Counter => {
                    sum = [series.sum()];
                    &sum
                }
                Kind::Gauge | Kind::Timing | Kind::Histogram => series.values,
            };
            for &value in values {
                line.clear();
                let res = format_line(&mut line, prefix, base, series, value)
                    .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "line formatting failed"))
                    .and_then(|()| w.write_all(line.as_bytes()));
                if let Err(e) = res {
                    return ControlFlow::Break(e);
                }
                written += line.len() as u64;
            }
            ControlFlow::Continue(())
        });

        match flow {
            ControlFlow::Continue(()) => Ok(written),
            ControlFlow::Break(source) => Err(MeterlineError::Write { written, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn line_shapes() {
        let base = LabelValues::new().with(&["env", "prod"]);
        let lvs = LabelValues::new().with(&["region", "eu"]);
        let mut out = String::new();

        format_line(
            &mut out,
            "app.",
            &base,
            &Series {
                kind: Kind::Counter,
                name: "requests",
                label_values: &lvs,
                values: &[1.0, 2.0],
                sample_rate: 0.5,
            },
            3.0,
        )
        .unwrap();
        assert_eq!(out, "app.requests,env=prod,region=eu:3.000000|c|@0.500000\n");

        out.clear();
        let empty = LabelValues::new();
        format_line(
            &mut out,
            "",
            &empty,
            &Series {
                kind: Kind::Timing,
                name: "latency",
                label_values: &empty,
                values: &[12.5],
                sample_rate: 1.0,
            },
            12.5,
        )
        .unwrap();
        assert_eq!(out, "latency:12.500000|ms\n");
    }
}
