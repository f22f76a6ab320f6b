//! Label-value primitives and the label-indexed observation space.
//!
//! - `LabelValues`: flat `[k1, v1, k2, v2, ...]` sequence, cheap to clone.
//! - `Space`: per-kind index of observations keyed by (name, label values),
//!   drained one generation at a time.

mod labels;
mod space;

pub use labels::LabelValues;
pub use space::{SeriesKey, Snapshot, Space};

/// Empty label list, for call sites that have no labels to pass.
pub const NO_LABELS: &[&str] = &[];
