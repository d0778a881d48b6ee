// THEORY:
// The `DescriptorExtractor` turns one `Frame` into one `Descriptor`. It is the only
// place where raw pixels become numbers that can be compared, so it owns the two
// decisions that make descriptors comparable at all:
//
// 1.  **Bin layout**: how many bins each channel is split into. The layout fixes the
//     descriptor length; descriptors from different layouts never meet.
// 2.  **Normalization basis**: how raw counts are rescaled so that a 100×100 and a
//     1000×1000 rendition of the same picture produce the same signature.
//
// Both decisions live in `DescriptorConfig` and are applied identically to every
// image, whether it is being indexed or used as a query.

use crate::core_modules::descriptor::{BinValue, Descriptor, Normalization};
use crate::core_modules::frame::Frame;
use crate::core_modules::histogram::ColorHistogram;
use crate::core_modules::pixel::pixel::{BinCount, RGB_CHANNELS};
use crate::error::{InvalidInput, RetrievalResult};
use log::debug;

const DEFAULT_BINS_PER_CHANNEL: BinCount = 8;

/// Configuration for descriptor extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DescriptorConfig {
    /// Histogram bins for the (red, green, blue) channels.
    pub bins: [BinCount; RGB_CHANNELS],
    /// How the flattened histogram is rescaled.
    pub normalization: Normalization,
}

impl Default for DescriptorConfig {
    fn default() -> Self {
        Self::uniform(DEFAULT_BINS_PER_CHANNEL)
    }
}

impl DescriptorConfig {
    /// The same bin count on every channel, L2 normalization.
    pub fn uniform(bins: BinCount) -> Self {
        Self {
            bins: [bins; RGB_CHANNELS],
            normalization: Normalization::L2,
        }
    }

    pub fn with_normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Length of every descriptor this configuration produces.
    pub fn descriptor_len(&self) -> RetrievalResult<usize> {
        ColorHistogram::cell_count(self.bins)
    }

    pub fn validate(&self) -> RetrievalResult<()> {
        self.descriptor_len().map(|_| ())
    }
}

/// Computes normalized joint color histograms.
#[derive(Debug, Clone)]
pub struct DescriptorExtractor {
    config: DescriptorConfig,
}

impl DescriptorExtractor {
    /// Validates the configuration once so later calls only have to check the frame.
    pub fn new(config: DescriptorConfig) -> RetrievalResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &DescriptorConfig {
        &self.config
    }

    pub fn descriptor_len(&self) -> usize {
        self.config.bins.iter().map(|b| *b as usize).product()
    }

    /// Produces the descriptor for one frame.
    pub fn describe(&self, frame: &Frame) -> RetrievalResult<Descriptor> {
        if frame.is_empty() {
            return Err(InvalidInput::EmptyImage.into());
        }

        let mut histogram = ColorHistogram::new(self.config.bins)?;
        histogram.accumulate_all(frame.pixels());

        let mut values: Vec<BinValue> = histogram.cells().iter().map(|c| *c as BinValue).collect();
        self.config.normalization.apply(&mut values);

        debug!(
            "described {}x{} frame: {} of {} cells occupied ({:?})",
            frame.width(),
            frame.height(),
            histogram.occupied_cells(),
            values.len(),
            self.config.normalization
        );

        Ok(Descriptor::from_histogram(values))
    }
}

/// One-shot extraction: validates `config`, then describes `frame`.
pub fn extract(frame: &Frame, config: &DescriptorConfig) -> RetrievalResult<Descriptor> {
    DescriptorExtractor::new(*config)?.describe(frame)
}
