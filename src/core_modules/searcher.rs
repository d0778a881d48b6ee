// THEORY:
// The `Searcher` is the analytical half of the engine. Given a read-only
// `ImageIndex` and a query `Descriptor`, it scores every entry with the chi-squared
// distance and returns all of them, most similar first.
//
// Key architectural principles:
// 1.  **Exact, full scan**: every entry is scored; nothing is approximated or pruned.
// 2.  **Fail fast on configuration drift**: if any indexed descriptor has a different
//     length than the query, the whole ranking is aborted before a single distance is
//     computed. One bad length means the index was built under another configuration.
// 3.  **Deterministic order**: results are sorted by (distance, identifier). The
//     identifier tie-break makes the output independent of the index's hash order,
//     so repeated runs produce byte-identical lists.
// 4.  **Stateless**: the searcher borrows the index and keeps nothing between calls;
//     any number of searches may share one index concurrently.

use crate::core_modules::chi_squared::{Distance, chi_squared_unchecked};
use crate::core_modules::descriptor::Descriptor;
use crate::core_modules::index::ImageIndex;
use crate::error::{RetrievalError, RetrievalResult};
use log::{debug, warn};
use std::cmp::Ordering;
use std::fmt::Debug;

/// One ranked entry: how far an indexed image is from the query.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult<K> {
    pub distance: Distance,
    pub id: K,
}

impl<K: Ord> SearchResult<K> {
    /// Ascending distance, then identifier.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        self.distance
            .total_cmp(&other.distance)
            .then_with(|| self.id.cmp(&other.id))
    }
}

/// Ranks an index against query descriptors.
pub struct Searcher<'a, K> {
    index: &'a ImageIndex<K>,
}

impl<'a, K> Searcher<'a, K>
where
    K: Ord + Clone + Debug,
{
    pub fn new(index: &'a ImageIndex<K>) -> Self {
        Self { index }
    }

    /// Every indexed identifier exactly once, ascending by distance to `query`.
    pub fn search(&self, query: &Descriptor) -> RetrievalResult<Vec<SearchResult<K>>> {
        let entries = sorted_entries(self.index);
        check_lengths(entries.iter().copied(), query)?;
        let mut results = score_entries(&entries, query);
        results.sort_by(SearchResult::rank_cmp);

        debug!(
            "ranked {} entries against a {}-bin query",
            results.len(),
            query.len()
        );
        Ok(results)
    }

    /// The first `limit` entries of [`Searcher::search`].
    pub fn search_top(&self, query: &Descriptor, limit: usize) -> RetrievalResult<Vec<SearchResult<K>>> {
        let mut results = self.search(query)?;
        results.truncate(limit);
        Ok(results)
    }
}

/// Index entries ordered by identifier.
pub(crate) fn sorted_entries<K: Ord>(index: &ImageIndex<K>) -> Vec<(&K, &Descriptor)> {
    let mut entries: Vec<_> = index.iter().collect();
    entries.sort_by(|(a, _), (b, _)| a.cmp(b));
    entries
}

/// Rejects the first entry, in the given order, whose length differs from the query.
pub(crate) fn check_lengths<'a, K: Debug + 'a>(
    entries: impl IntoIterator<Item = (&'a K, &'a Descriptor)>,
    query: &Descriptor,
) -> RetrievalResult<()> {
    if let Some((id, descriptor)) = entries.into_iter().find(|(_, d)| d.len() != query.len()) {
        warn!(
            "aborting search: entry {:?} has {} bins, query has {}",
            id,
            descriptor.len(),
            query.len()
        );
        return Err(RetrievalError::MismatchedDescriptor {
            identifier: Some(format!("{id:?}")),
            expected: query.len(),
            found: descriptor.len(),
        });
    }
    Ok(())
}

/// Distances for already length-checked entries, unsorted.
pub(crate) fn score_entries<K: Clone>(
    entries: &[(&K, &Descriptor)],
    query: &Descriptor,
) -> Vec<SearchResult<K>> {
    entries
        .iter()
        .map(|(id, descriptor)| SearchResult {
            distance: chi_squared_unchecked(descriptor.values(), query.values()),
            id: (*id).clone(),
        })
        .collect()
}
