// THEORY:
// The `ColorHistogram` counts how often each combination of (red, green, blue) bins
// occurs in a frame. It is a joint histogram: one cell per bin triple, not three
// independent per-channel histograms, so it remembers which colors appear together.
//
// Cells live in one flat vector laid out channel-major: red is the outermost axis,
// blue the innermost. Flattening is therefore free, and two histograms with the same
// bin layout line up element by element.

use crate::core_modules::pixel::pixel::{BinCount, BinIndex, Pixel, RGB_CHANNELS};
use crate::error::{InvalidInput, RetrievalResult};

pub type Count = u64;

/// A joint 3-D color histogram stored in channel-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorHistogram {
    /// Bins per channel, in (red, green, blue) order.
    bins: [BinCount; RGB_CHANNELS],
    /// One counter per cell, `bins[0] * bins[1] * bins[2]` entries.
    cells: Vec<Count>,
    /// The number of pixels accumulated so far.
    samples: u64,
}

impl ColorHistogram {
    /// Allocates an empty histogram after validating the bin layout.
    pub fn new(bins: [BinCount; RGB_CHANNELS]) -> RetrievalResult<Self> {
        let cell_count = Self::cell_count(bins)?;
        Ok(Self {
            bins,
            cells: vec![0; cell_count],
            samples: 0,
        })
    }

    /// Number of cells a layout produces, rejecting zero bins and layouts whose
    /// counters could not be allocated.
    pub fn cell_count(bins: [BinCount; RGB_CHANNELS]) -> RetrievalResult<usize> {
        if let Some((channel, &count)) = bins.iter().enumerate().find(|(_, b)| **b == 0) {
            return Err(InvalidInput::NonPositiveBinCount { channel, bins: count }.into());
        }
        bins.iter()
            .try_fold(1usize, |acc, &b| acc.checked_mul(b as usize))
            .filter(|cells| {
                cells
                    .checked_mul(size_of::<Count>())
                    .is_some_and(|bytes| bytes <= isize::MAX as usize)
            })
            .ok_or_else(|| InvalidInput::DescriptorTooLarge { bins }.into())
    }

    /// Flat position of the cell at `(red, green, blue)` bin coordinates.
    #[inline]
    pub fn flat_index(&self, coordinates: [BinIndex; RGB_CHANNELS]) -> usize {
        let [r, g, b] = coordinates;
        (r * self.bins[1] as usize + g) * self.bins[2] as usize + b
    }

    /// Adds a single pixel to its cell.
    #[inline]
    pub fn accumulate(&mut self, pixel: &Pixel) {
        let index = self.flat_index(pixel.bin_coordinates(self.bins));
        self.cells[index] += 1;
        self.samples += 1;
    }

    pub fn accumulate_all<'a>(&mut self, pixels: impl IntoIterator<Item = &'a Pixel>) {
        for pixel in pixels {
            self.accumulate(pixel);
        }
    }

    pub fn bins(&self) -> [BinCount; RGB_CHANNELS] {
        self.bins
    }

    pub fn samples(&self) -> u64 {
        self.samples
    }

    /// The raw counts, already flattened.
    pub fn cells(&self) -> &[Count] {
        &self.cells
    }

    /// Count at the given bin coordinates.
    pub fn count_at(&self, coordinates: [BinIndex; RGB_CHANNELS]) -> Count {
        self.cells[self.flat_index(coordinates)]
    }

    /// Number of cells holding at least one pixel.
    pub fn occupied_cells(&self) -> usize {
        self.cells.iter().filter(|c| **c > 0).count()
    }
}
