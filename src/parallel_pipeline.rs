// THEORY:
// Ranking is an embarrassingly parallel reduction: each entry's distance to the
// query depends on nothing but that entry. The `ParallelSearcher` exploits this by
// cutting a snapshot of the index into contiguous shards, scoring and sorting each
// shard on a blocking worker, and merging the sorted shards back together.
//
// Key architectural principles:
// 1.  **Snapshot, not lock**: the searcher holds an `Arc` to an immutable, pre-sorted
//     copy of the index. Rebuilding the index elsewhere never disturbs a search in
//     flight; the next searcher simply gets the next snapshot.
// 2.  **Same answer as the sequential path**: shards are merged on the exact
//     (distance, identifier) key the `Searcher` sorts by. Identifiers are unique, so
//     the merged list is identical to a single sort, whatever the shard count.
// 3.  **Same failure as the sequential path**: lengths are checked up front, in
//     identifier order, so a mismatch is reported against the same entry.

use crate::core_modules::descriptor::Descriptor;
use crate::core_modules::index::ImageIndex;
use crate::core_modules::searcher::{SearchResult, check_lengths, score_entries, sorted_entries};
use crate::error::{RetrievalError, RetrievalResult};
use futures::future::try_join_all;
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fmt::Debug;
use std::ops::Range;
use std::sync::Arc;

/// Configuration for the parallel searcher.
#[derive(Debug, Clone, Default)]
pub struct ParallelConfig {
    /// Number of shards to split a scan into. `None` uses one shard per CPU.
    pub shards: Option<usize>,
}

impl ParallelConfig {
    fn shard_count(&self) -> usize {
        self.shards.unwrap_or_else(num_cpus::get).max(1)
    }
}

/// Ranks an index snapshot across blocking worker tasks.
pub struct ParallelSearcher<K> {
    /// Index entries sorted by identifier, shared with every worker.
    entries: Arc<[(K, Descriptor)]>,
    shards: usize,
}

impl<K> ParallelSearcher<K>
where
    K: Ord + Clone + Debug + Send + Sync + 'static,
{
    /// Takes a sorted snapshot of `index`.
    pub fn new(index: &ImageIndex<K>, config: ParallelConfig) -> Self {
        let entries: Vec<(K, Descriptor)> = sorted_entries(index)
            .into_iter()
            .map(|(id, descriptor)| (id.clone(), descriptor.clone()))
            .collect();
        Self {
            entries: entries.into(),
            shards: config.shard_count(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn shards(&self) -> usize {
        self.shards
    }

    /// Every snapshot identifier exactly once, ascending by distance to `query`.
    pub async fn search(&self, query: &Descriptor) -> RetrievalResult<Vec<SearchResult<K>>> {
        check_lengths(self.entries.iter().map(|(id, d)| (id, d)), query)?;

        if self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let query = Arc::new(query.clone());
        let workers = shard_ranges(self.entries.len(), self.shards).into_iter().map(|range| {
            let entries = Arc::clone(&self.entries);
            let query = Arc::clone(&query);
            tokio::task::spawn_blocking(move || rank_shard(&entries[range], &query))
        });

        let partials = try_join_all(workers)
            .await
            .map_err(|e| RetrievalError::WorkerFailed(e.to_string()))?;

        let results = merge_sorted(partials);
        debug!(
            "ranked {} entries across {} shards",
            results.len(),
            self.shards.min(self.entries.len())
        );
        Ok(results)
    }

    /// The first `limit` entries of [`ParallelSearcher::search`].
    pub async fn search_top(&self, query: &Descriptor, limit: usize) -> RetrievalResult<Vec<SearchResult<K>>> {
        let mut results = self.search(query).await?;
        results.truncate(limit);
        Ok(results)
    }
}

fn rank_shard<K: Ord + Clone>(shard: &[(K, Descriptor)], query: &Descriptor) -> Vec<SearchResult<K>> {
    let borrowed: Vec<(&K, &Descriptor)> = shard.iter().map(|(id, d)| (id, d)).collect();
    let mut results = score_entries(&borrowed, query);
    results.sort_by(SearchResult::rank_cmp);
    trace!("shard of {} entries ranked", results.len());
    results
}

/// Splits `0..len` into at most `shards` contiguous, near-equal, non-empty ranges.
fn shard_ranges(len: usize, shards: usize) -> Vec<Range<usize>> {
    let shards = shards.clamp(1, len.max(1));
    let base = len / shards;
    let remainder = len % shards;
    let mut ranges = Vec::with_capacity(shards);
    let mut start = 0;
    for shard in 0..shards {
        let size = base + usize::from(shard < remainder);
        if size == 0 {
            continue;
        }
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

/// A shard's current front entry, ordered so that `BinaryHeap` pops the best rank.
struct MergeHead<K> {
    result: SearchResult<K>,
    shard: usize,
}

impl<K: Ord> Ord for MergeHead<K> {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .result
            .rank_cmp(&self.result)
            .then_with(|| other.shard.cmp(&self.shard))
    }
}

impl<K: Ord> PartialOrd for MergeHead<K> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<K: Ord> PartialEq for MergeHead<K> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<K: Ord> Eq for MergeHead<K> {}

/// K-way merge of individually sorted lists on the ranking key.
fn merge_sorted<K: Ord>(partials: Vec<Vec<SearchResult<K>>>) -> Vec<SearchResult<K>> {
    let total = partials.iter().map(Vec::len).sum();
    let mut merged = Vec::with_capacity(total);
    let mut sources: Vec<_> = partials.into_iter().map(Vec::into_iter).collect();

    let mut heap = BinaryHeap::with_capacity(sources.len());
    for (shard, source) in sources.iter_mut().enumerate() {
        if let Some(result) = source.next() {
            heap.push(MergeHead { result, shard });
        }
    }

    while let Some(MergeHead { result, shard }) = heap.pop() {
        merged.push(result);
        if let Some(next) = sources[shard].next() {
            heap.push(MergeHead { result: next, shard });
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::searcher::Searcher;
    use rand::rngs::StdRng;
    use rand::seq::SliceRandom;
    use rand::{Rng, SeedableRng};

    fn random_descriptor(rng: &mut StdRng, len: usize) -> Descriptor {
        let values = (0..len).map(|_| rng.gen_range(0.0..1.0)).collect();
        Descriptor::new(values).unwrap()
    }

    fn random_index(rng: &mut StdRng, entries: usize, len: usize) -> ImageIndex<u32> {
        let mut ids: Vec<u32> = (0..entries as u32).collect();
        ids.shuffle(rng);
        ids.into_iter().map(|id| (id, random_descriptor(rng, len))).collect()
    }

    #[test]
    fn zero_shards_fall_back_to_one() {
        let index: ImageIndex<u32> = ImageIndex::new();
        let searcher = ParallelSearcher::new(&index, ParallelConfig { shards: Some(0) });
        assert_eq!(searcher.shards(), 1);
        let default = ParallelSearcher::new(&index, ParallelConfig::default());
        assert_eq!(default.shards(), num_cpus::get().max(1));
    }

    #[test]
    fn ranges_cover_everything_once() {
        for len in 0..20 {
            for shards in 1..8 {
                let ranges = shard_ranges(len, shards);
                assert!(ranges.len() <= shards);
                assert!(ranges.iter().all(|r| !r.is_empty()));
                let covered: Vec<usize> = ranges.into_iter().flatten().collect();
                assert_eq!(covered, (0..len).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn merge_interleaves_on_rank() {
        let partials = vec![
            vec![SearchResult { distance: 0.1, id: 1 }, SearchResult { distance: 0.5, id: 3 }],
            vec![SearchResult { distance: 0.1, id: 0 }, SearchResult { distance: 0.3, id: 2 }],
            Vec::new(),
        ];
        let ids: Vec<_> = merge_sorted(partials).into_iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
    }

    #[tokio::test]
    async fn matches_sequential_search_for_any_shard_count() {
        let mut rng = StdRng::seed_from_u64(7);
        let index = random_index(&mut rng, 57, 27);
        let query = random_descriptor(&mut rng, 27);
        let expected = Searcher::new(&index).search(&query).unwrap();

        for shards in [1, 2, 3, 8, 57, 100] {
            let searcher = ParallelSearcher::new(&index, ParallelConfig { shards: Some(shards) });
            assert_eq!(searcher.shards(), shards);
            assert_eq!(searcher.len(), 57);
            assert_eq!(searcher.search(&query).await.unwrap(), expected);
        }
    }

    #[tokio::test]
    async fn ties_survive_the_merge() {
        let same = Descriptor::new(vec![0.5, 0.5]).unwrap();
        let index: ImageIndex<u32> = (0..10).rev().map(|id| (id, same.clone())).collect();
        let searcher = ParallelSearcher::new(&index, ParallelConfig { shards: Some(4) });
        let results = searcher.search(&same).await.unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.id).collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }

    #[tokio::test]
    async fn empty_snapshot_yields_empty_ranking() {
        let index: ImageIndex<u32> = ImageIndex::new();
        let searcher = ParallelSearcher::new(&index, ParallelConfig::default());
        assert!(searcher.is_empty());
        let query = Descriptor::new(vec![1.0]).unwrap();
        assert!(searcher.search(&query).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatch_is_reported_like_sequential_search() {
        let mut rng = StdRng::seed_from_u64(11);
        let mut index = random_index(&mut rng, 20, 8);
        index.insert(5, random_descriptor(&mut rng, 4));
        let query = random_descriptor(&mut rng, 8);

        let sequential = Searcher::new(&index).search(&query).unwrap_err();
        let searcher = ParallelSearcher::new(&index, ParallelConfig { shards: Some(3) });
        assert_eq!(searcher.search(&query).await.unwrap_err(), sequential);
    }

    #[tokio::test]
    async fn search_top_truncates() {
        let mut rng = StdRng::seed_from_u64(3);
        let index = random_index(&mut rng, 30, 16);
        let query = random_descriptor(&mut rng, 16);
        let searcher = ParallelSearcher::new(&index, ParallelConfig { shards: Some(4) });
        let full = searcher.search(&query).await.unwrap();
        let top = searcher.search_top(&query, 5).await.unwrap();
        assert_eq!(top.as_slice(), &full[..5]);
    }
}
