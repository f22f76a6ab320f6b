use std::sync::Arc;

use crate::error::{MeterlineError, Result};

/// Ordered label-value sequence. Order is part of a series' identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LabelValues(Arc<[String]>);

impl Default for LabelValues {
    fn default() -> Self {
        Self(Arc::from(Vec::<String>::new()))
    }
}

impl LabelValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a flat list, rejecting odd lengths.
    pub fn try_from_slice<S: AsRef<str>>(lvs: &[S]) -> Result<Self> {
        Self::new().try_with(lvs)
    }

    /// Return a new sequence extended by `extra`; `self` is left untouched.
    ///
    /// An odd-length `extra` is a programmer error and panics.
    pub fn with<S: AsRef<str>>(&self, extra: &[S]) -> Self {
        assert!(
            extra.len() % 2 == 0,
            "odd number of label values ({}); programmer error",
            extra.len()
        );
        self.extend(extra)
    }

    /// Fallible `with` for label values that come from outside the process.
    pub fn try_with<S: AsRef<str>>(&self, extra: &[S]) -> Result<Self> {
        if extra.len() % 2 != 0 {
            return Err(MeterlineError::OddLabelValues(extra.len()));
        }
        Ok(self.extend(extra))
    }

    fn extend<S: AsRef<str>>(&self, extra: &[S]) -> Self {
        if extra.is_empty() {
            return self.clone();
        }
        let mut v = Vec::with_capacity(self.0.len() + extra.len());
        v.extend(self.0.iter().cloned());
        v.extend(extra.iter().map(|s| s.as_ref().to_owned()));
        Self(Arc::from(v))
    }

    /// Caller guarantees `v.len()` is even.
    pub(crate) fn from_even(v: Vec<String>) -> Self {
        debug_assert!(v.len() % 2 == 0);
        Self(Arc::from(v))
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    /// Number of strings (twice the number of pairs).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate `(label, value)` pairs in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.0.chunks_exact(2).filter_map(|p| match p {
            [k, v] => Some((k.as_str(), v.as_str())),
            _ => None,
        })
    }
}
