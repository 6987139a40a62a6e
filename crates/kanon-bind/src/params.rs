//! Path parameter storage.
//!
//! Path segments are matched by the host router; the binder only receives the
//! resulting `(name, raw value)` pairs. Most endpoints declare one or two path
//! parameters, so the pairs live inline until that stops being true.

use smallvec::SmallVec;

/// Number of path parameters stored without a heap allocation.
const INLINE_PARAMS: usize = 4;

/// Raw path parameters captured by the host router.
///
/// Values are kept exactly as they appeared in the URL after percent-decoding;
/// no coercion happens here.
///
/// # Example
///
/// ```rust
/// use kanon_bind::PathParams;
///
/// let mut params = PathParams::new();
/// params.push("user_id", "42");
/// params.push("item_id", "foo");
///
/// assert_eq!(params.get("user_id"), Some("42"));
/// assert_eq!(params.get("missing"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathParams {
    inner: SmallVec<[(String, String); INLINE_PARAMS]>,
}

impl PathParams {
    /// Creates an empty set of path parameters.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a captured segment.
    ///
    /// A name pushed twice shadows the earlier value.
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.inner.push((name.into(), value.into()));
    }

    /// Returns the raw value captured for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Returns true if no segment was captured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    /// Returns the number of captured segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Iterates over the captured segments in capture order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for PathParams {
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        Self {
            inner: iter
                .into_iter()
                .map(|(n, v)| (n.into(), v.into()))
                .collect(),
        }
    }
}
