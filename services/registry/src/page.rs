//! Cursor pagination over sorted name listings.

use std::collections::BTreeSet;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};

/// Maximum number of entries in a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Limit {
    /// Return everything after the cursor.
    #[default]
    Unbounded,

    /// Return at most this many entries.
    At(usize),
}

impl Limit {
    /// The bound, if any.
    pub fn value(&self) -> Option<usize> {
        match self {
            Limit::Unbounded => None,
            Limit::At(n) => Some(*n),
        }
    }
}

impl From<usize> for Limit {
    fn from(value: usize) -> Self {
        Limit::At(value)
    }
}

impl From<Option<usize>> for Limit {
    fn from(value: Option<usize>) -> Self {
        value.map_or(Limit::Unbounded, Limit::At)
    }
}

/// Deduplicate and sort `items`, keep those strictly after `from`, and
/// truncate to `limit`.
pub(crate) fn paginate<T: Ord>(
    items: impl IntoIterator<Item = T>,
    from: Option<&T>,
    limit: Limit,
) -> Vec<T> {
    let sorted: BTreeSet<T> = items.into_iter().collect();
    let after = sorted
        .into_iter()
        .filter(|item| from.is_none_or(|from| item > from));
    match limit {
        Limit::Unbounded => after.collect(),
        Limit::At(n) => after.take(n).collect(),
    }
}

/// Names of the immediate children of `root` appearing in `keys`.
pub(crate) fn children<'k>(
    root: &'k Utf8Path,
    keys: &'k [Utf8PathBuf],
) -> impl Iterator<Item = String> + 'k {
    keys.iter().filter_map(move |key| {
        match key.strip_prefix(root).ok()?.components().next()? {
            Utf8Component::Normal(name) => Some(name.to_owned()),
            _ => None,
        }
    })
}
