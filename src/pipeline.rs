// THEORY:
// The `pipeline` module is the top-level API of the retrieval engine. It wires the
// two halves together in the only order that makes sense: frames go through the
// `DescriptorExtractor`, descriptors are collected into an `ImageIndex`, and query
// frames go through the very same extractor before the `Searcher` ranks them.
//
// Owning the extractor is the point. A caller that goes through the pipeline cannot
// describe the index with one bin layout and the query with another, which is the
// one mistake the chi-squared ranking cannot recover from.

use crate::core_modules::descriptor::Descriptor;
use crate::core_modules::extractor::{DescriptorConfig, DescriptorExtractor};
use crate::core_modules::frame::Frame;
use crate::core_modules::index::ImageIndex;
use crate::core_modules::searcher::Searcher;
use crate::error::RetrievalResult;
use crate::parallel_pipeline::{ParallelConfig, ParallelSearcher};
use log::info;
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;

// Re-export key data structures for the public API.
pub use crate::core_modules::descriptor::Normalization;
pub use crate::core_modules::searcher::SearchResult;

/// Configuration for the RetrievalPipeline.
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    pub descriptor: DescriptorConfig,
    pub parallel: ParallelConfig,
}

/// The main, top-level struct for the retrieval engine.
pub struct RetrievalPipeline<K> {
    extractor: DescriptorExtractor,
    config: PipelineConfig,
    /// Shared so that snapshots handed to parallel searches stay valid while new
    /// frames are added.
    index: Arc<ImageIndex<K>>,
}

impl<K> RetrievalPipeline<K>
where
    K: Ord + Hash + Clone + Debug + Send + Sync + 'static,
{
    pub fn new(config: PipelineConfig) -> RetrievalResult<Self> {
        Ok(Self {
            extractor: DescriptorExtractor::new(config.descriptor)?,
            config,
            index: Arc::new(ImageIndex::new()),
        })
    }

    /// Starts from an index built elsewhere. Its descriptors must come from the same
    /// descriptor configuration; a mismatch surfaces on the first query.
    pub fn with_index(config: PipelineConfig, index: ImageIndex<K>) -> RetrievalResult<Self> {
        let mut pipeline = Self::new(config)?;
        pipeline.index = Arc::new(index);
        Ok(pipeline)
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn index(&self) -> &ImageIndex<K> {
        &self.index
    }

    pub fn describe(&self, frame: &Frame) -> RetrievalResult<Descriptor> {
        self.extractor.describe(frame)
    }

    /// Describes `frame` and stores it under `id`, replacing any earlier entry.
    pub fn add_frame(&mut self, id: K, frame: &Frame) -> RetrievalResult<()> {
        let descriptor = self.extractor.describe(frame)?;
        Arc::make_mut(&mut self.index).insert(id, descriptor);
        Ok(())
    }

    /// Describes and stores a batch of frames, stopping at the first failure.
    pub fn add_frames<'a>(&mut self, frames: impl IntoIterator<Item = (K, &'a Frame)>) -> RetrievalResult<usize> {
        let mut added = 0;
        for (id, frame) in frames {
            self.add_frame(id, frame)?;
            added += 1;
        }
        info!("indexed {added} frames ({} total)", self.index.len());
        Ok(added)
    }

    /// Ranks the whole index against `frame`.
    pub fn query(&self, frame: &Frame) -> RetrievalResult<Vec<SearchResult<K>>> {
        let descriptor = self.extractor.describe(frame)?;
        Searcher::new(&self.index).search(&descriptor)
    }

    /// The `limit` closest entries to `frame`.
    pub fn query_top(&self, frame: &Frame, limit: usize) -> RetrievalResult<Vec<SearchResult<K>>> {
        let descriptor = self.extractor.describe(frame)?;
        Searcher::new(&self.index).search_top(&descriptor, limit)
    }

    /// A parallel searcher over the current index contents.
    pub fn parallel_searcher(&self) -> ParallelSearcher<K> {
        ParallelSearcher::new(&self.index, self.config.parallel.clone())
    }

    /// Ranks the whole index against `frame` across worker tasks.
    pub async fn query_parallel(&self, frame: &Frame) -> RetrievalResult<Vec<SearchResult<K>>> {
        let descriptor = self.extractor.describe(frame)?;
        self.parallel_searcher().search(&descriptor).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::pixel::pixel::Pixel;
    use crate::error::{InvalidInput, RetrievalError};

    fn palette() -> Vec<(&'static str, Frame)> {
        vec![
            ("red", Frame::solid(4, 4, Pixel::new(255, 0, 0))),
            ("blue", Frame::solid(4, 4, Pixel::new(0, 0, 255))),
            ("dark-red", Frame::solid(4, 4, Pixel::new(200, 10, 10))),
            ("green", Frame::solid(4, 4, Pixel::new(0, 255, 0))),
        ]
    }

    fn pipeline() -> RetrievalPipeline<&'static str> {
        let config = PipelineConfig {
            descriptor: DescriptorConfig::uniform(4),
            parallel: ParallelConfig { shards: Some(2) },
        };
        let mut pipeline = RetrievalPipeline::new(config).unwrap();
        let frames = palette();
        pipeline
            .add_frames(frames.iter().map(|(id, frame)| (*id, frame)))
            .unwrap();
        pipeline
    }

    #[test]
    fn query_finds_same_color_first() {
        let pipeline = pipeline();
        let query = Frame::solid(9, 3, Pixel::new(230, 5, 5));
        let results = pipeline.query(&query).unwrap();
        assert_eq!(results.len(), 4);
        // Both reds share the (3, 0, 0) cell with the query.
        assert_eq!(results[0].id, "dark-red");
        assert_eq!(results[1].id, "red");
        assert!(results[0].distance < 1e-9);
        assert!(results[1].distance < 1e-9);
        assert!((results[3].distance - 1.0).abs() < 1e-9);
    }

    #[test]
    fn query_top_limits_results() {
        let pipeline = pipeline();
        let results = pipeline.query_top(&Frame::solid(1, 1, Pixel::new(0, 0, 250)), 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].id, "blue");
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let config = PipelineConfig {
            descriptor: DescriptorConfig { bins: [8, 8, 0], normalization: Normalization::L2 },
            parallel: ParallelConfig::default(),
        };
        let err = RetrievalPipeline::<u32>::new(config).err().unwrap();
        assert_eq!(
            err,
            RetrievalError::InvalidInput(InvalidInput::NonPositiveBinCount { channel: 2, bins: 0 })
        );
    }

    #[test]
    fn empty_frame_is_not_indexed() {
        let mut pipeline = RetrievalPipeline::<u32>::new(PipelineConfig::default()).unwrap();
        let empty = Frame::new(0, 0, Vec::new()).unwrap();
        assert!(pipeline.add_frame(1, &empty).is_err());
        assert!(pipeline.index().is_empty());
    }

    #[test]
    fn foreign_index_mismatch_surfaces_on_query() {
        let mut foreign = ImageIndex::new();
        foreign.insert(7u32, Descriptor::new(vec![1.0; 64]).unwrap());
        let pipeline = RetrievalPipeline::with_index(PipelineConfig::default(), foreign).unwrap();
        let err = pipeline.query(&Frame::solid(2, 2, Pixel::default())).unwrap_err();
        assert_eq!(
            err,
            RetrievalError::MismatchedDescriptor { identifier: Some("7".to_string()), expected: 512, found: 64 }
        );
    }

    #[tokio::test]
    async fn snapshot_is_unaffected_by_later_frames() {
        let mut pipeline = pipeline();
        let snapshot = pipeline.parallel_searcher();
        pipeline
            .add_frame("white", &Frame::solid(2, 2, Pixel::new(255, 255, 255)))
            .unwrap();

        let query = pipeline.describe(&Frame::solid(2, 2, Pixel::new(255, 255, 255))).unwrap();
        assert_eq!(snapshot.search(&query).await.unwrap().len(), 4);
        assert_eq!(pipeline.parallel_searcher().search(&query).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn parallel_query_matches_sequential_query() {
        let pipeline = pipeline();
        let query = Frame::solid(3, 3, Pixel::new(10, 240, 30));
        assert_eq!(
            pipeline.query_parallel(&query).await.unwrap(),
            pipeline.query(&query).unwrap()
        );
    }
}
