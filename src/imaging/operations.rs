//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take a variant spec, compute parameters, and call the backend.
//! Variants are encoded to a hidden staging file and renamed into place.

use super::backend::{BackendError, ImageBackend};
use super::calculations::calculate_variant_dimensions;
use super::params::{OutputFormat, Quality, ResizeParams};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get image dimensions using the backend.
pub fn get_dimensions(backend: &impl ImageBackend, path: &Path) -> Result<(u32, u32)> {
    let dims = backend.identify(path)?;
    Ok((dims.width, dims.height))
}

/// One (size, format) combination of the variant matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantSpec {
    /// Target width (upper bound, see [`calculate_variant_dimensions`]).
    pub width: u32,
    /// Size tag appended to the original's stem, e.g. `-large`.
    pub suffix: String,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl VariantSpec {
    /// Output file name for an original with the given stem.
    pub fn file_name(&self, stem: &str) -> String {
        format!("{}{}.{}", stem, self.suffix, self.format.extension())
    }
}

impl fmt::Display for VariantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}w{} {}@{}",
            self.width,
            self.suffix,
            self.format,
            self.quality.value()
        )
    }
}

/// Generated image variant with path and dimensions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedVariant {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
}

/// Plan a variant operation without executing it.
///
/// Useful for testing parameter generation.
pub fn plan_variant(
    source: &Path,
    output_dir: &Path,
    filename_stem: &str,
    original_dims: (u32, u32),
    spec: &VariantSpec,
) -> ResizeParams {
    let (width, height) = calculate_variant_dimensions(original_dims, spec.width);
    ResizeParams {
        source: source.to_path_buf(),
        output: output_dir.join(spec.file_name(filename_stem)),
        width,
        height,
        format: spec.format,
        quality: spec.quality,
    }
}

/// Hidden sibling the encoder writes to before the variant is moved into place.
pub fn staging_path(output: &Path) -> PathBuf {
    let name = output
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    output.with_file_name(format!(".{name}.partial"))
}

/// Create one variant of `source` (already decoded as `image`) in `output_dir`.
///
/// The variant only appears under its final name once fully encoded. On
/// failure the staging file is removed and no existing file is touched.
pub fn create_variant<B: ImageBackend>(
    backend: &B,
    image: &B::Decoded,
    source: &Path,
    output_dir: &Path,
    filename_stem: &str,
    original_dims: (u32, u32),
    spec: &VariantSpec,
) -> Result<GeneratedVariant> {
    let planned = plan_variant(source, output_dir, filename_stem, original_dims, spec);
    let staging = staging_path(&planned.output);
    let params = ResizeParams {
        output: staging.clone(),
        ..planned.clone()
    };

    let written = backend
        .resize(image, &params)
        .and_then(|()| fs::rename(&staging, &planned.output).map_err(BackendError::from));
    if let Err(e) = written {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }

    Ok(GeneratedVariant {
        path: planned.output,
        width: planned.width,
        height: planned.height,
    })
}
