//! Gauge tree: structural identity for gauge series.
//!
//! Each gauge name owns a root `GaugeNode`. A series is the node reached by
//! following its label-value pairs one at a time from the root, so every
//! distinct label path maps to exactly one `GaugeCell` no matter how many
//! handles were derived for it. Node locks cover only the child
//! lookup-or-create step; disjoint branches never contend.

use std::collections::HashMap;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::lv::LabelValues;

/// Last-value-wins storage for one gauge series.
#[derive(Debug)]
pub(crate) struct GaugeCell {
    bits: AtomicU64,
    touched: AtomicBool,
}

impl Default for GaugeCell {
    fn default() -> Self {
        Self {
            bits: AtomicU64::new(0f64.to_bits()),
            touched: AtomicBool::new(false),
        }
    }
}

impl GaugeCell {
    pub(crate) fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::Relaxed);
        self.touched.store(true, Ordering::Release);
    }

    pub(crate) fn add(&self, delta: f64) {
        // The closure always returns Some, so the update cannot be rejected.
        self.bits
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |b| {
                Some((f64::from_bits(b) + delta).to_bits())
            })
            .ok();
        self.touched.store(true, Ordering::Release);
    }

    pub(crate) fn value(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }

    /// Read-and-clear: the value if touched since the last read.
    fn take_touched(&self) -> Option<f64> {
        if self.touched.swap(false, Ordering::AcqRel) {
            Some(self.value())
        } else {
            None
        }
    }
}

type LabelPair = (String, String);

#[derive(Default)]
pub(crate) struct GaugeNode {
    cell: OnceLock<Arc<GaugeCell>>,
    children: Mutex<HashMap<LabelPair, Arc<GaugeNode>>>,
}

impl GaugeNode {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn cell(&self) -> Arc<GaugeCell> {
        Arc::clone(self.cell.get_or_init(Default::default))
    }

    /// Walk (creating as needed) the path for `label_values` and return the
    /// cell at its end.
    pub(crate) fn resolve(self: &Arc<Self>, label_values: &LabelValues) -> Arc<GaugeCell> {
        let mut node = Arc::clone(self);
        for (label, value) in label_values.pairs() {
            let next = {
                let mut children = node.children.lock().unwrap_or_else(PoisonError::into_inner);
                Arc::clone(
                    children
                        .entry((label.to_owned(), value.to_owned()))
                        .or_default(),
                )
            };
            node = next;
        }
        node.cell()
    }

    /// Depth-first visit of cells touched since their last read.
    pub(crate) fn walk_touched<B>(
        &self,
        name: &str,
        f: &mut impl FnMut(&str, &LabelValues, f64) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        self.walk_path(name, &mut Vec::new(), f)
    }

    fn walk_path<B>(
        &self,
        name: &str,
        path: &mut Vec<String>,
        f: &mut impl FnMut(&str, &LabelValues, f64) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        if let Some(value) = self.cell.get().and_then(|c| c.take_touched()) {
            let lvs = LabelValues::from_even(path.clone());
            if let ControlFlow::Break(b) = f(name, &lvs, value) {
                return ControlFlow::Break(b);
            }
        }

        let children: Vec<(LabelPair, Arc<GaugeNode>)> = {
            let children = self.children.lock().unwrap_or_else(PoisonError::into_inner);
            children
                .iter()
                .map(|(pair, child)| (pair.clone(), Arc::clone(child)))
                .collect()
        };

        for ((label, value), child) in children {
            path.push(label);
            path.push(value);
            let flow = child.walk_path(name, path, f);
            path.truncate(path.len() - 2);
            if flow.is_break() {
                return flow;
            }
        }
        ControlFlow::Continue(())
    }
}

/// Handle to one gauge series. Handles derived for the same label path share
/// the same cell.
#[derive(Clone)]
pub struct Gauge {
    name: Arc<str>,
    label_values: LabelValues,
    root: Arc<GaugeNode>,
    cell: Arc<GaugeCell>,
}

impl Gauge {
    pub(crate) fn root(name: Arc<str>, root: Arc<GaugeNode>) -> Self {
        let label_values = LabelValues::new();
        let cell = root.resolve(&label_values);
        Self {
            name,
            label_values,
            root,
            cell,
        }
    }

    /// Derive a handle scoped to additional label values.
    /// Panics on an odd-length list.
    pub fn with<S: AsRef<str>>(&self, label_values: &[S]) -> Gauge {
        let label_values = self.label_values.with(label_values);
        let cell = self.root.resolve(&label_values);
        Gauge {
            name: Arc::clone(&self.name),
            label_values,
            root: Arc::clone(&self.root),
            cell,
        }
    }

    pub fn set(&self, value: f64) {
        self.cell.set(value);
    }

    pub fn add(&self, delta: f64) {
        self.cell.add(delta);
    }

    /// Current value; does not clear the touched flag.
    pub fn value(&self) -> f64 {
        self.cell.value()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label_values(&self) -> &LabelValues {
        &self.label_values
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(root: &GaugeNode, name: &str) -> Vec<(Vec<String>, f64)> {
        let mut out = Vec::new();
        let _: ControlFlow<()> = root.walk_touched(name, &mut |_, lvs, v| {
            out.push((lvs.as_slice().to_vec(), v));
            ControlFlow::Continue(())
        });
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    #[test]
    fn same_path_shares_a_cell() {
        let g = Gauge::root(Arc::from("temp"), Arc::new(GaugeNode::new()));
        let a = g.with(&["room", "a", "floor", "1"]);
        let b = g.with(&["room", "a"]).with(&["floor", "1"]);
        a.set(3.0);
        assert_eq!(b.value(), 3.0);
        b.add(1.5);
        assert_eq!(a.value(), 4.5);
    }

    #[test]
    fn walk_reports_only_touched_cells_once() {
        let root = Arc::new(GaugeNode::new());
        let g = Gauge::root(Arc::from("temp"), Arc::clone(&root));
        let a = g.with(&["room", "a"]);
        let _untouched = g.with(&["room", "b"]);
        a.set(1.0);
        a.set(2.0);

        let got = collect(&root, "temp");
        assert_eq!(got, vec![(vec!["room".to_string(), "a".to_string()], 2.0)]);
        assert!(collect(&root, "temp").is_empty());

        a.add(1.0);
        assert_eq!(collect(&root, "temp")[0].1, 3.0);
    }
}
