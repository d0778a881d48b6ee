// THEORY:
// The `Pixel` module is the most fundamental unit of the retrieval engine. It is a
// "dumb" data container for a single RGB sample. The only analysis it knows how to
// do is the one that needs nothing but itself: deciding which histogram bin each of
// its channels falls into for a given bin count.
//
// Key principles:
// 1) Three channels, 8 bits each. Alpha is not a color and never reaches a histogram;
//    RGBA input is accepted for convenience and the alpha byte is dropped.
// 2) Channel order is fixed (red, green, blue). Everything downstream that flattens a
//    joint histogram relies on this order being stable.
// 3) Binning uses integer arithmetic only, so the same byte always lands in the same
//    bin on every platform.

pub mod pixel {
    pub type Byte = u8;
    pub type Channel = Byte;
    pub type BinCount = u32;
    pub type BinIndex = usize;

    pub const RGB_CHANNELS: usize = 3;
    pub const RGBA_CHANNELS: usize = 4;
    /// Number of distinct intensities per channel; bins partition `[0, CHANNEL_RANGE)`.
    pub const CHANNEL_RANGE: u32 = 256;

    /// A "dumb" data container representing a single RGB pixel.
    #[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
    pub struct Pixel {
        /// The red channel value (0-255).
        pub red: Channel,
        /// The green channel value (0-255).
        pub green: Channel,
        /// The blue channel value (0-255).
        pub blue: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel) -> Self {
            Pixel { red, green, blue }
        }

        /// The channels in histogram order.
        pub fn channels(&self) -> [Channel; RGB_CHANNELS] {
            [self.red, self.green, self.blue]
        }

        /// Maps one channel value to its equal-width bin.
        ///
        /// `bins` must be non-zero; callers validate bin layouts before counting.
        #[inline]
        pub fn bin_of(value: Channel, bins: BinCount) -> BinIndex {
            (value as u64 * bins as u64 / CHANNEL_RANGE as u64) as BinIndex
        }

        /// The (red, green, blue) cell this pixel occupies in a joint histogram.
        #[inline]
        pub fn bin_coordinates(&self, bins: [BinCount; RGB_CHANNELS]) -> [BinIndex; RGB_CHANNELS] {
            [
                Self::bin_of(self.red, bins[0]),
                Self::bin_of(self.green, bins[1]),
                Self::bin_of(self.blue, bins[2]),
            ]
        }
    }

    /// Reads a pixel from an RGB or RGBA byte group. Returns `None` for any other width.
    pub fn from_bytes(bytes: &[Byte]) -> Option<Pixel> {
        match bytes.len() {
            RGB_CHANNELS | RGBA_CHANNELS => Some(Pixel::new(bytes[0], bytes[1], bytes[2])),
            _ => None,
        }
    }

    impl From<image::Rgb<u8>> for Pixel {
        fn from(rgb: image::Rgb<u8>) -> Self {
            let [red, green, blue] = rgb.0;
            Pixel::new(red, green, blue)
        }
    }

    impl From<Pixel> for [Byte; RGB_CHANNELS] {
        fn from(pixel: Pixel) -> Self {
            pixel.channels()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::pixel::*;

    #[test]
    fn extremes_land_in_first_and_last_bin() {
        for bins in [1, 2, 4, 8, 16, 32, 256] {
            assert_eq!(Pixel::bin_of(0, bins), 0);
            assert_eq!(Pixel::bin_of(255, bins), bins as usize - 1);
        }
    }

    #[test]
    fn bins_are_equal_width() {
        // Four bins over [0, 256): 64 intensities each.
        assert_eq!(Pixel::bin_of(63, 4), 0);
        assert_eq!(Pixel::bin_of(64, 4), 1);
        assert_eq!(Pixel::bin_of(127, 4), 1);
        assert_eq!(Pixel::bin_of(128, 4), 2);
        assert_eq!(Pixel::bin_of(192, 4), 3);
    }

    #[test]
    fn more_bins_than_intensities_leaves_gaps() {
        assert_eq!(Pixel::bin_of(1, 512), 2);
        assert_eq!(Pixel::bin_of(255, 512), 510);
    }

    #[test]
    fn coordinates_follow_channel_order() {
        let pixel = Pixel::new(255, 0, 130);
        assert_eq!(pixel.bin_coordinates([4, 8, 2]), [3, 0, 1]);
    }

    #[test]
    fn rgba_bytes_drop_alpha() {
        let pixel = from_bytes(&[10, 20, 30, 40]).unwrap();
        assert_eq!(pixel, Pixel::new(10, 20, 30));
        assert_eq!(from_bytes(&[10, 20]), None);
    }
}
