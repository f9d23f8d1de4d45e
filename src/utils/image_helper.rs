// The image-side collaborators of the benchmark: decode a file into a pixel
// grid, derive a galaxy identifier from a path, and enumerate an image
// directory. PNG writing is kept for building fixture images.

pub mod image_helper {
    use crate::core_modules::patch_sampler::{ColorSample, PatchSampler, PixelGrid, Rgba16Buffer};
    use crate::core_modules::pixel::pixel::{ChannelDepth, Pixel};
    use crate::error::{BenchmarkError, Result};
    use image::ImageEncoder;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};
    use tracing::warn;
    use walkdir::WalkDir;

    /// A decoded image held at the configured channel depth.
    pub enum ImageGrid {
        Eight(image::RgbaImage),
        Sixteen(Rgba16Buffer),
    }

    impl ImageGrid {
        fn as_grid(&self) -> &dyn PixelGrid {
            match self {
                ImageGrid::Eight(buffer) => buffer,
                ImageGrid::Sixteen(buffer) => buffer,
            }
        }
    }

    impl PixelGrid for ImageGrid {
        fn width(&self) -> u32 {
            self.as_grid().width()
        }

        fn height(&self) -> u32 {
            self.as_grid().height()
        }

        fn pixel(&self, x: u32, y: u32) -> Pixel {
            self.as_grid().pixel(x, y)
        }
    }

    pub fn decode_grid(path: &Path, depth: ChannelDepth) -> Result<ImageGrid> {
        let decoded = image::open(path).map_err(|source| BenchmarkError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(match depth {
            ChannelDepth::Eight => ImageGrid::Eight(decoded.to_rgba8()),
            ChannelDepth::Sixteen => ImageGrid::Sixteen(decoded.to_rgba16()),
        })
    }

    /// Derives the galaxy identifier for an image path.
    pub trait IdentifierSource: Send + Sync {
        fn identifier(&self, path: &Path) -> Result<String>;
    }

    /// Uses the file name without its extension: `images_test/100018.jpg` -> `100018`.
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FileStemIdentifier;

    impl IdentifierSource for FileStemIdentifier {
        fn identifier(&self, path: &Path) -> Result<String> {
            path.file_stem()
                .and_then(|stem| stem.to_str())
                .filter(|stem| !stem.is_empty())
                .map(str::to_string)
                .ok_or_else(|| {
                    BenchmarkError::DataIntegrity(format!(
                        "cannot derive a galaxy id from {}",
                        path.display()
                    ))
                })
        }
    }

    /// One image file and the galaxy it belongs to.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct ImageEntry {
        pub identifier: String,
        pub path: PathBuf,
    }

    /// Lists the images directly inside `dir` whose extension matches, sorted by name.
    pub fn list_images(
        dir: &Path,
        extension: &str,
        identifiers: &dyn IdentifierSource,
    ) -> Result<Vec<ImageEntry>> {
        let extension = extension.trim_start_matches('.');
        let mut seen: HashMap<String, PathBuf> = HashMap::new();
        let mut entries = Vec::new();

        for entry in WalkDir::new(dir)
            .min_depth(1)
            .max_depth(1)
            .follow_links(true)
            .sort_by_file_name()
        {
            let entry = entry.map_err(|err| {
                let path = err.path().unwrap_or(dir).to_path_buf();
                BenchmarkError::io(path, err.into())
            })?;
            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let matches = path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
            if !matches {
                continue;
            }

            let identifier = identifiers.identifier(path)?;
            if let Some(previous) = seen.insert(identifier.clone(), path.to_path_buf()) {
                return Err(BenchmarkError::DataIntegrity(format!(
                    "missing galaxy somewhere: {} and {} both map to galaxy id {}",
                    previous.display(),
                    path.display(),
                    identifier
                )));
            }
            entries.push(ImageEntry {
                identifier,
                path: path.to_path_buf(),
            });
        }

        Ok(entries)
    }

    /// Decodes one image and samples its central patch.
    pub fn sample_file(
        sampler: &PatchSampler,
        depth: ChannelDepth,
        entry: &ImageEntry,
    ) -> Result<ColorSample> {
        let grid = decode_grid(&entry.path, depth)?;
        sampler.sample(entry.identifier.clone(), &grid).inspect_err(|err| {
            warn!("Cannot sample {}: {}", entry.path.display(), err);
        })
    }

    /// Writes an RGBA8 buffer as a PNG file.
    pub fn save(
        path: &Path,
        width: u32,
        height: u32,
        buffer: &[u8],
    ) -> std::result::Result<(), image::error::ImageError> {
        let output = std::fs::File::create(path)?;
        let encoder = image::codecs::png::PngEncoder::new(output);

        encoder.write_image(buffer, width, height, image::ExtendedColorType::Rgba8)?;

        Ok(())
    }
}
