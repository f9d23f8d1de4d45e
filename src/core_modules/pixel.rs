// THEORY:
// The `Pixel` module is the smallest unit of the benchmark. It is a "dumb" data
// container for one RGBA sample as the decoder reports it. Channels are stored
// wide (u16) so the same type carries both decoder conventions:
//
// - `ChannelDepth::Sixteen`: 0..=65535. 8-bit sources are widened by x257, which
//   is how the original Galaxy Zoo benchmark's decoder reported JPEG pixels.
// - `ChannelDepth::Eight`:   0..=255, the raw byte values.
//
// The depth matters downstream: the color hash divides channels by their mean
// intensity using integer division, so the absolute magnitude of the channels
// changes which ratios truncate to which integers. Training and test images must
// always be decoded with the same depth.

pub mod pixel {
    use serde::Deserialize;

    pub type Channel = u16;
    pub type ChannelSum = u64;

    /// The numeric range the decoder reports channel values in.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
    #[serde(rename_all = "lowercase")]
    pub enum ChannelDepth {
        /// 0..=255
        Eight,
        /// 0..=65535
        #[default]
        Sixteen,
    }

    impl ChannelDepth {
        /// Maps an 8-bit source value into this depth's range.
        pub fn widen(self, value: u8) -> Channel {
            match self {
                ChannelDepth::Eight => value as Channel,
                ChannelDepth::Sixteen => value as Channel * 257,
            }
        }
    }

    /// A single RGBA pixel in the decoder's native range.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Pixel {
        pub red: Channel,
        pub green: Channel,
        pub blue: Channel,
        pub alpha: Channel,
    }

    impl Pixel {
        pub fn new(red: Channel, green: Channel, blue: Channel, alpha: Channel) -> Self {
            Pixel {
                red,
                green,
                blue,
                alpha,
            }
        }

        /// Sum of the color channels; alpha is not part of the color.
        pub fn sum(&self) -> ChannelSum {
            self.red as ChannelSum + self.green as ChannelSum + self.blue as ChannelSum
        }
    }

    impl From<image::Rgba<u16>> for Pixel {
        fn from(rgba: image::Rgba<u16>) -> Self {
            let [red, green, blue, alpha] = rgba.0;
            Pixel::new(red, green, blue, alpha)
        }
    }

    impl From<image::Rgba<u8>> for Pixel {
        fn from(rgba: image::Rgba<u8>) -> Self {
            let [red, green, blue, alpha] = rgba.0;
            let depth = ChannelDepth::Eight;
            Pixel::new(
                depth.widen(red),
                depth.widen(green),
                depth.widen(blue),
                depth.widen(alpha),
            )
        }
    }
}
