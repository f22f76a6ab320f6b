use std::ops::ControlFlow;
use std::sync::{Arc, PoisonError, RwLock};

use dashmap::DashMap;

use super::LabelValues;

/// Identity of one timeseries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SeriesKey {
    pub name: Arc<str>,
    pub label_values: LabelValues,
}

type Generation = DashMap<SeriesKey, Vec<f64>>;

/// Label-indexed observation space.
///
/// Observers hold the generation lock in shared mode for the length of one
/// insert; `reset` takes it exclusively only to swap the map out, so a drained
/// generation never sees a late write and producers wait at most one swap.
#[derive(Default)]
pub struct Space {
    current: RwLock<Generation>,
}

impl Space {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `value` to the bucket for (name, label values).
    pub fn observe(&self, name: &Arc<str>, label_values: &LabelValues, value: f64) {
        let generation = self.current.read().unwrap_or_else(PoisonError::into_inner);
        let key = SeriesKey {
            name: Arc::clone(name),
            label_values: label_values.clone(),
        };
        generation.entry(key).or_default().push(value);
    }

    /// Swap in an empty generation and hand back the previous one.
    pub fn reset(&self) -> Snapshot {
        let series = {
            let mut generation = self.current.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::take(&mut *generation)
        };
        tracing::trace!(series = series.len(), "space generation reset");
        Snapshot { series }
    }
}

/// One drained generation. Consumed by a single `walk`.
pub struct Snapshot {
    series: Generation,
}

impl Snapshot {
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Visit every (name, label values, values) triple in unspecified order.
    /// A `Break` from `f` stops the walk and is returned to the caller.
    pub fn walk<B>(
        self,
        mut f: impl FnMut(&str, &LabelValues, &[f64]) -> ControlFlow<B>,
    ) -> ControlFlow<B> {
        for (key, values) in self.series {
            if let ControlFlow::Break(b) = f(&key.name, &key.label_values, &values) {
                return ControlFlow::Break(b);
            }
        }
        ControlFlow::Continue(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_starts_a_fresh_generation() {
        let space = Space::new();
        let name: Arc<str> = Arc::from("hits");
        let lvs = LabelValues::new().with(&["region", "eu"]);
        space.observe(&name, &lvs, 1.0);
        space.observe(&name, &lvs, 2.0);
        space.observe(&name, &LabelValues::new(), 5.0);

        let snap = space.reset();
        assert_eq!(snap.len(), 2);
        let mut seen = Vec::new();
        let flow: ControlFlow<()> = snap.walk(|n, l, v| {
            seen.push((n.to_owned(), l.len(), v.to_vec()));
            ControlFlow::Continue(())
        });
        assert!(flow.is_continue());
        seen.sort_by_key(|(_, l, _)| *l);
        assert_eq!(seen[0].2, vec![5.0]);
        assert_eq!(seen[1].2, vec![1.0, 2.0]);

        assert!(space.reset().is_empty());
    }

    #[test]
    fn walk_stops_on_break() {
        let space = Space::new();
        for i in 0..10 {
            let name: Arc<str> = Arc::from(format!("m{i}"));
            space.observe(&name, &LabelValues::new(), 1.0);
        }
        let mut visited = 0;
        let flow = space.reset().walk(|_, _, _| {
            visited += 1;
            if visited == 3 {
                ControlFlow::Break("stop")
            } else {
                ControlFlow::Continue(())
            }
        });
        assert_eq!(flow, ControlFlow::Break("stop"));
        assert_eq!(visited, 3);
    }
}
