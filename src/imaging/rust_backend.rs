//! Pure Rust image processing backend, no system libraries.
//!
//! Everything is statically linked into the binary.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (JPEG, PNG, WebP) | `image` crate (pure Rust decoders) |
//! | Resize | `image::DynamicImage::resize_exact` with `Lanczos3` filter |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` (quality honored) |
//! | Encode → AVIF | `image::codecs::avif::AvifEncoder` (rav1e, speed 6, quality honored) |
//! | Encode → WebP | `webp::Encoder` (bundled libwebp, lossy, quality honored) |
//! | Encode → PNG | `image::codecs::png::PngEncoder` (lossless) |

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::params::{OutputFormat, ResizeParams};
use image::codecs::avif::AvifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageFormat, ImageReader};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::LazyLock;

/// Extensions whose decoders are compiled in.
///
/// The `image` crate's `"avif"` feature only enables the **encoder** (rav1e),
/// so AVIF originals are not accepted.
const PHOTO_CANDIDATES: &[(&str, ImageFormat)] = &[
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("png", ImageFormat::Png),
    ("webp", ImageFormat::WebP),
];

static SUPPORTED_EXTENSIONS: LazyLock<Vec<&'static str>> = LazyLock::new(|| {
    PHOTO_CANDIDATES
        .iter()
        .filter(|(_, fmt)| fmt.reading_enabled())
        .map(|(ext, _)| *ext)
        .collect()
});

/// Returns the set of image file extensions that have working decoders compiled in.
pub fn supported_input_extensions() -> &'static [&'static str] {
    &SUPPORTED_EXTENSIONS
}

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

/// Load and decode an image from disk, sniffing the format from content.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)?
        .with_guessed_format()?
        .decode()
        .map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to decode {}: {}", path.display(), e))
        })
}

/// Normalize to an 8-bit layout every encoder here accepts.
fn to_8bit(img: &DynamicImage, keep_alpha: bool) -> DynamicImage {
    if keep_alpha && img.color().has_alpha() {
        DynamicImage::ImageRgba8(img.to_rgba8())
    } else {
        DynamicImage::ImageRgb8(img.to_rgb8())
    }
}

/// Encode `img` into `writer` as `format`.
fn encode(
    img: &DynamicImage,
    writer: &mut impl Write,
    format: OutputFormat,
    quality: u32,
) -> Result<(), BackendError> {
    let quality = quality.clamp(1, 100) as u8;
    let failed =
        |e: String| BackendError::ProcessingFailed(format!("{format} encode failed: {e}"));
    let result = match format {
        // JPEG has no alpha channel.
        OutputFormat::Jpeg => to_8bit(img, false)
            .write_with_encoder(JpegEncoder::new_with_quality(writer, quality)),
        OutputFormat::Avif => to_8bit(img, true)
            .write_with_encoder(AvifEncoder::new_with_speed_quality(writer, 6, quality)),
        OutputFormat::Webp => {
            let rgb = to_8bit(img, true);
            let encoded = webp::Encoder::from_image(&rgb)
                .map_err(|e| failed(e.to_string()))?
                .encode(f32::from(quality));
            writer.write_all(&encoded)?;
            Ok(())
        }
        OutputFormat::Png => to_8bit(img, true).write_with_encoder(PngEncoder::new(writer)),
    };
    result.map_err(|e| failed(e.to_string()))
}

impl ImageBackend for RustBackend {
    type Decoded = DynamicImage;

    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = image::image_dimensions(path).map_err(|e| {
            BackendError::ProcessingFailed(format!("Failed to read dimensions: {}", e))
        })?;
        Ok(Dimensions { width, height })
    }

    fn decode(&self, path: &Path) -> Result<DynamicImage, BackendError> {
        load_image(path)
    }

    fn resize(&self, image: &DynamicImage, params: &ResizeParams) -> Result<(), BackendError> {
        let resized;
        let img = if (image.width(), image.height()) == (params.width, params.height) {
            image
        } else {
            resized = image.resize_exact(params.width, params.height, FilterType::Lanczos3);
            &resized
        };

        let mut writer = BufWriter::new(File::create(&params.output)?);
        encode(img, &mut writer, params.format, params.quality.value())?;
        writer.flush()?;
        Ok(())
    }
}
