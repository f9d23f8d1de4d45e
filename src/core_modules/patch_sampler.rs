// THEORY:
// The `PatchSampler` turns a whole decoded image into one `ColorSample`. Galaxy
// Zoo images are centered on the target galaxy, so the middle of the frame is a
// cheap proxy for the galaxy's core color.
//
// The window is `[cx - h, cx + h) x [cy - h, cy + h)` around the integer center
// `(W / 2, H / 2)`, with `h` the half-width (5 by default, a 10x10 patch). The
// window is cut into a `Chunk` and averaged with truncating integer division.
//
// A window that does not fit inside the image is rejected. The sampler never
// clamps or shrinks the window, since a smaller sample count would change the
// averages and therefore the cluster keys.

use crate::core_modules::chunk::chunk::Chunk;
use crate::core_modules::pixel::pixel::Pixel;
use crate::error::{BenchmarkError, Result};

pub const DEFAULT_PATCH_HALF_WIDTH: u32 = 5;

/// A decoded image widened to 16 bits per channel.
pub type Rgba16Buffer = image::ImageBuffer<image::Rgba<u16>, Vec<u16>>;

/// Anything that can be read as a rectangular grid of pixels.
pub trait PixelGrid {
    fn width(&self) -> u32;
    fn height(&self) -> u32;
    /// The pixel at column `x`, row `y`. Callers stay within `width` x `height`.
    fn pixel(&self, x: u32, y: u32) -> Pixel;
}

impl PixelGrid for Rgba16Buffer {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> Pixel {
        Pixel::from(*self.get_pixel(x, y))
    }
}

impl PixelGrid for image::RgbaImage {
    fn width(&self) -> u32 {
        self.dimensions().0
    }

    fn height(&self) -> u32 {
        self.dimensions().1
    }

    fn pixel(&self, x: u32, y: u32) -> Pixel {
        Pixel::from(*self.get_pixel(x, y))
    }
}

/// The averaged central color of one galaxy image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorSample {
    identifier: String,
    average: Pixel,
}

impl ColorSample {
    pub fn new(identifier: impl Into<String>, average: Pixel) -> Self {
        Self {
            identifier: identifier.into(),
            average,
        }
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn average(&self) -> &Pixel {
        &self.average
    }
}

/// Pixel bounds of the sampling window, half-open on both axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchWindow {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl PatchWindow {
    pub fn width(&self) -> u32 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> u32 {
        self.y1 - self.y0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSampler {
    half_width: u32,
}

impl Default for PatchSampler {
    fn default() -> Self {
        Self {
            half_width: DEFAULT_PATCH_HALF_WIDTH,
        }
    }
}

impl PatchSampler {
    pub fn new(half_width: u32) -> Result<Self> {
        if half_width == 0 {
            return Err(BenchmarkError::Config(
                "patch half-width must be at least 1".to_string(),
            ));
        }
        Ok(Self { half_width })
    }

    pub fn half_width(&self) -> u32 {
        self.half_width
    }

    /// Computes the central window for an image of the given size.
    pub fn window(&self, width: u32, height: u32) -> Result<PatchWindow> {
        let h = self.half_width;
        let (cx, cy) = (width / 2, height / 2);

        let fits = |center: u32, extent: u32| center >= h && center + h <= extent;
        if !fits(cx, width) || !fits(cy, height) {
            return Err(BenchmarkError::PatchOutOfBounds {
                width,
                height,
                half_width: h,
            });
        }

        Ok(PatchWindow {
            x0: cx - h,
            y0: cy - h,
            x1: cx + h,
            y1: cy + h,
        })
    }

    /// Copies the central window out of the grid, row by row.
    pub fn extract_chunk<G: PixelGrid + ?Sized>(&self, grid: &G) -> Result<Chunk> {
        let window = self.window(grid.width(), grid.height())?;
        let mut pixels = Vec::with_capacity((window.width() * window.height()) as usize);
        for y in window.y0..window.y1 {
            for x in window.x0..window.x1 {
                pixels.push(grid.pixel(x, y));
            }
        }
        Ok(Chunk::new(window.width(), window.height(), pixels))
    }

    pub fn sample<G: PixelGrid + ?Sized>(
        &self,
        identifier: impl Into<String>,
        grid: &G,
    ) -> Result<ColorSample> {
        let chunk = self.extract_chunk(grid)?;
        Ok(ColorSample::new(identifier, chunk.average_pixel()))
    }
}
