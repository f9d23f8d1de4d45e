// THEORY:
// The `ColorHasher` reduces a sample's average color to one integer, the
// `ClusterKey`. Galaxies are never compared by distance; two galaxies are in the
// same cluster exactly when their keys are equal.
//
// 1.  Intensity: `avg = (r + g + b) / 3`, integer division.
// 2.  Normalization: each channel is divided by `avg`, again with integer
//     division. The result is a coarse color ratio that no longer depends on
//     brightness (a white patch and a grey patch both become (1, 1, 1)).
// 3.  Combination: `key = r' * H^2 + g' * H + b'`, with `H` the hash factor.
//
// When `avg` is zero (a black or nearly black patch) there is no ratio to
// compute. Those samples are all routed to `ZERO_INTENSITY_KEY`, a reserved key
// that no normal sample can produce because normal keys are never negative. The
// same hasher instance serves training and test samples, so black training
// galaxies and black test galaxies meet in the same cluster.

use crate::core_modules::patch_sampler::ColorSample;
use crate::core_modules::pixel::pixel::{ChannelSum, Pixel};
use crate::error::{BenchmarkError, Result};
use tracing::debug;

pub type ClusterKey = i64;

pub const DEFAULT_HASH_FACTOR: u32 = 10;

/// Largest hash factor whose keys are guaranteed to fit in a `ClusterKey`.
pub const MAX_HASH_FACTOR: u32 = u16::MAX as u32;

/// Reserved key for samples whose average intensity truncates to zero.
pub const ZERO_INTENSITY_KEY: ClusterKey = -1;

/// Channels divided by the sample's average intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NormalizedColor {
    pub red: ChannelSum,
    pub green: ChannelSum,
    pub blue: ChannelSum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColorHasher {
    hash_factor: u32,
}

impl Default for ColorHasher {
    fn default() -> Self {
        Self {
            hash_factor: DEFAULT_HASH_FACTOR,
        }
    }
}

impl ColorHasher {
    pub fn new(hash_factor: u32) -> Result<Self> {
        if hash_factor == 0 || hash_factor > MAX_HASH_FACTOR {
            return Err(BenchmarkError::Config(format!(
                "hash factor must be between 1 and {}, got {}",
                MAX_HASH_FACTOR, hash_factor
            )));
        }
        Ok(Self { hash_factor })
    }

    pub fn hash_factor(&self) -> u32 {
        self.hash_factor
    }

    /// Integer mean of the three color channels.
    pub fn average_intensity(pixel: &Pixel) -> ChannelSum {
        pixel.sum() / 3
    }

    /// Brightness-independent channel ratios, or `None` for a zero-intensity sample.
    pub fn normalize(pixel: &Pixel) -> Option<NormalizedColor> {
        let intensity = Self::average_intensity(pixel);
        if intensity == 0 {
            return None;
        }
        Some(NormalizedColor {
            red: pixel.red as ChannelSum / intensity,
            green: pixel.green as ChannelSum / intensity,
            blue: pixel.blue as ChannelSum / intensity,
        })
    }

    pub fn key_for_pixel(&self, pixel: &Pixel) -> ClusterKey {
        match Self::normalize(pixel) {
            Some(color) => self.combine(color),
            None => ZERO_INTENSITY_KEY,
        }
    }

    pub fn key(&self, sample: &ColorSample) -> ClusterKey {
        let key = self.key_for_pixel(sample.average());
        if key == ZERO_INTENSITY_KEY {
            debug!(
                "Galaxy {} has zero average intensity; using reserved cluster key {}",
                sample.identifier(),
                ZERO_INTENSITY_KEY
            );
        }
        key
    }

    fn combine(&self, color: NormalizedColor) -> ClusterKey {
        // Each ratio is at most 5 (r + g + b < 3 * (avg + 1)), so this cannot overflow
        // for any hash factor up to MAX_HASH_FACTOR.
        let h = self.hash_factor as ClusterKey;
        color.red as ClusterKey * h * h + color.green as ClusterKey * h + color.blue as ClusterKey
    }
}
