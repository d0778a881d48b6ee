// THEORY:
// This file is the main entry point for the `waldo_search` library crate.
// The engine answers one question: "which of these images look most like this
// one?" It does so in two strictly ordered stages:
//
// 1.  **Description**: every image is reduced to a `Descriptor`, a normalized joint
//     RGB histogram (`core_modules::extractor`).
// 2.  **Ranking**: a query descriptor is compared against every descriptor in an
//     `ImageIndex` with the chi-squared distance, producing a total, reproducible
//     order (`core_modules::searcher`, or `parallel_pipeline` for sharded scans).
//
// `pipeline::RetrievalPipeline` is the high-level interface that keeps both stages
// on one configuration. Decoding images from disk and persisting indexes belong to
// the caller; the `image` crate conversions on `Frame` are the hand-off point.

pub mod core_modules;
pub mod error;
pub mod parallel_pipeline;
pub mod pipeline;

pub use core_modules::chi_squared::{Distance, EPSILON, chi_squared_distance};
pub use core_modules::descriptor::{Descriptor, Normalization};
pub use core_modules::extractor::{DescriptorConfig, DescriptorExtractor, extract};
pub use core_modules::frame::Frame;
pub use core_modules::index::ImageIndex;
pub use core_modules::pixel::pixel::Pixel;
pub use core_modules::searcher::{SearchResult, Searcher};
pub use error::{InvalidInput, RetrievalError, RetrievalResult};
pub use parallel_pipeline::{ParallelConfig, ParallelSearcher};
pub use pipeline::{PipelineConfig, RetrievalPipeline};
