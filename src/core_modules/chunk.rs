// THEORY:
// A `Chunk` is the rectangular patch of pixels cut out of the middle of a galaxy
// image. It is a "dumb" data container: it holds the pixels and knows how to
// summarize them, but it does not know where in the image it came from.
//
// The only summary the benchmark needs is `average_pixel`, a per-channel mean
// using truncating integer division. Rounding here would move samples across
// cluster boundaries, so the truncation is part of the contract.

pub mod chunk {
    use crate::core_modules::pixel::pixel::{Channel, ChannelSum, Pixel};

    /// A rectangular block of pixels, stored row-major.
    #[derive(Debug, Clone)]
    pub struct Chunk {
        pub width: u32,
        pub height: u32,
        pub pixels: Vec<Pixel>,
    }

    impl Chunk {
        pub fn new(width: u32, height: u32, pixels: Vec<Pixel>) -> Self {
            debug_assert_eq!(pixels.len(), (width * height) as usize);
            Self {
                width,
                height,
                pixels,
            }
        }

        /// Per-channel mean over every pixel in the chunk, truncated toward zero.
        pub fn average_pixel(&self) -> Pixel {
            let num_pixels = self.pixels.len() as ChannelSum;
            if num_pixels == 0 {
                return Pixel::default();
            }

            let mut sum_r: ChannelSum = 0;
            let mut sum_g: ChannelSum = 0;
            let mut sum_b: ChannelSum = 0;
            let mut sum_a: ChannelSum = 0;

            for pixel in &self.pixels {
                sum_r += pixel.red as ChannelSum;
                sum_g += pixel.green as ChannelSum;
                sum_b += pixel.blue as ChannelSum;
                sum_a += pixel.alpha as ChannelSum;
            }

            // A mean of u16 values always fits back into a u16.
            Pixel {
                red: (sum_r / num_pixels) as Channel,
                green: (sum_g / num_pixels) as Channel,
                blue: (sum_b / num_pixels) as Channel,
                alpha: (sum_a / num_pixels) as Channel,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::chunk::Chunk;
    use crate::core_modules::pixel::pixel::Pixel;

    #[test]
    fn averages_truncate_instead_of_rounding() {
        // 99 pixels of 10 and one of 109 average to 10.99, which must stay 10.
        let mut pixels = vec![Pixel::new(10, 10, 10, 10); 99];
        pixels.push(Pixel::new(109, 109, 109, 109));
        let chunk = Chunk::new(10, 10, pixels);

        assert_eq!(chunk.average_pixel(), Pixel::new(10, 10, 10, 10));
    }

    #[test]
    fn averages_each_channel_independently() {
        let pixels = vec![
            Pixel::new(0, 100, 65535, 65535),
            Pixel::new(10, 200, 65535, 65535),
        ];
        let chunk = Chunk::new(2, 1, pixels);

        assert_eq!(chunk.average_pixel(), Pixel::new(5, 150, 65535, 65535));
    }

    #[test]
    fn empty_chunk_averages_to_default() {
        let chunk = Chunk {
            width: 0,
            height: 0,
            pixels: Vec::new(),
        };
        assert_eq!(chunk.average_pixel(), Pixel::default());
    }
}
