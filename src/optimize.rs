//! Image variant job.
//!
//! Runs outside the main pipeline (`sitebake optimize-images`). For every
//! original under `<source>/assets/imagens/original/` it produces one
//! derivative per (size, format) pair of the configured matrix into
//! `<source>/assets/imagens/optimized/`. The asset copy stage later picks
//! the derivatives up from there.
//!
//! ## Output naming
//!
//! ```text
//! original/hero.jpg  ──▶  optimized/hero-large.webp
//!                         optimized/hero-large.jpg
//!                         optimized/hero-large.avif
//!                         optimized/hero-medium.webp
//!                         ...
//!                         optimized/hero-thumbnail.avif
//! ```
//!
//! ## Failure policy
//!
//! Only setup problems (unreadable originals directory, uncreatable output
//! directory) abort the job. Everything after that is per variant: a failed
//! variant becomes a [`VariantOutcome::Failed`], its staging file is
//! removed, and the rest of the matrix still runs.
//!
//! Two originals sharing a stem (`hero.jpg`, `hero.png`) would share every
//! output name. The first in file-name order keeps the name; every variant
//! of the others fails with a collision reason.
//!
//! ## Parallel processing
//!
//! Originals are identified up front. Each usable original is then decoded
//! once on the rayon global pool and its size × format matrix is fanned out
//! over the same pool, sharing the decoded pixels. Outcomes are collected in
//! combination order regardless of scheduling.

use crate::config::{BuildConfig, ImagesConfig};
use crate::imaging::{
    ImageBackend, Quality, RustBackend, VariantSpec, create_variant, get_dimensions,
    size_reduction_percent,
};
use crate::types::{AssetKind, GeneratedArtifact, SourceAsset};
use rayon::prelude::*;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OptimizeError {
    #[error("cannot read originals directory {}: {source}", path.display())]
    ListOriginals {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot create output directory {}: {source}", path.display())]
    CreateOutput {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result of one (image, size, format) combination.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantOutcome {
    Succeeded {
        artifact: GeneratedArtifact,
        width: u32,
        height: u32,
        original_bytes: u64,
        /// Negative when the derivative is larger than the original.
        reduction_percent: f64,
    },
    Failed {
        image: PathBuf,
        variant: VariantSpec,
        reason: String,
    },
}

impl VariantOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded { .. })
    }
}

/// Progress events sent while the job runs.
#[derive(Debug, Clone)]
pub enum OptimizeEvent {
    /// An original was found and probed. `dimensions` is `None` when it
    /// could not be identified.
    ImageFound {
        index: usize,
        source: PathBuf,
        dimensions: Option<(u32, u32)>,
    },
    /// A variant finished, in completion order across all images.
    VariantFinished(VariantOutcome),
}

/// Everything the job attempted, in combination order.
#[derive(Debug, Default)]
pub struct OptimizeReport {
    pub originals: usize,
    pub outcomes: Vec<VariantOutcome>,
}

impl OptimizeReport {
    pub fn attempted(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.attempted() - self.succeeded()
    }

    pub fn failures(&self) -> impl Iterator<Item = &VariantOutcome> {
        self.outcomes.iter().filter(|o| !o.is_success())
    }
}

/// The configured cross-product: sizes outer, formats inner.
pub fn variant_matrix(images: &ImagesConfig) -> Vec<VariantSpec> {
    images
        .sizes
        .iter()
        .flat_map(|size| {
            images.formats.iter().map(move |format| VariantSpec {
                width: size.width,
                suffix: size.suffix.clone(),
                format: format.format,
                quality: Quality::new(format.quality),
            })
        })
        .collect()
}

/// Accepted originals directly under `dir`, sorted by file name.
pub fn find_originals(dir: &Path, images: &ImagesConfig) -> Result<Vec<PathBuf>, OptimizeError> {
    let list_err = |source| OptimizeError::ListOriginals {
        path: dir.to_path_buf(),
        source,
    };
    let mut originals = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        let hidden = path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().starts_with('.'));
        if path.is_file() && !hidden && images.accepts(&path) {
            originals.push(path);
        }
    }
    originals.sort();
    Ok(originals)
}

/// An original after identification.
struct Original {
    source: PathBuf,
    stem: String,
    /// Dimensions and byte size, or the reason the image cannot be used.
    probe: Result<((u32, u32), u64), String>,
}

fn probe_original(backend: &impl ImageBackend, source: &Path) -> Original {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let probe = fs::metadata(source)
        .map_err(|e| e.to_string())
        .and_then(|meta| {
            let dims = get_dimensions(backend, source).map_err(|e| e.to_string())?;
            Ok((dims, meta.len()))
        });
    Original {
        source: source.to_path_buf(),
        stem,
        probe,
    }
}

/// Mark every original whose stem was already claimed by an earlier one.
fn reject_stem_collisions(originals: &mut [Original]) {
    let mut claimed: HashMap<String, PathBuf> = HashMap::new();
    for original in originals {
        match claimed.get(&original.stem) {
            Some(owner) => {
                let owner = owner
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                original.probe = Err(format!("output name collides with {owner}"));
            }
            None => {
                claimed.insert(original.stem.clone(), original.source.clone());
            }
        }
    }
}

fn failed(original: &Original, spec: &VariantSpec, reason: String) -> VariantOutcome {
    VariantOutcome::Failed {
        image: original.source.clone(),
        variant: spec.clone(),
        reason,
    }
}

fn produce_variant<B: ImageBackend>(
    backend: &B,
    image: &B::Decoded,
    original: &Original,
    (dims, original_bytes): ((u32, u32), u64),
    spec: &VariantSpec,
    output_dir: &Path,
) -> VariantOutcome {
    let generated = create_variant(
        backend,
        image,
        &original.source,
        output_dir,
        &original.stem,
        dims,
        spec,
    )
    .and_then(|variant| {
        let artifact = GeneratedArtifact::written(
            &variant.path,
            vec![SourceAsset::new(&original.source, AssetKind::ImageOriginal)],
        )?
        .with_variant(spec.clone());
        Ok((variant, artifact))
    });

    match generated {
        Ok((variant, artifact)) => VariantOutcome::Succeeded {
            reduction_percent: size_reduction_percent(original_bytes, artifact.bytes),
            artifact,
            width: variant.width,
            height: variant.height,
            original_bytes,
        },
        Err(e) => failed(original, spec, e.to_string()),
    }
}

/// Every variant of one original, in matrix order. Decodes it at most once.
fn produce_variants<B: ImageBackend>(
    backend: &B,
    original: &Original,
    matrix: &[VariantSpec],
    output_dir: &Path,
    emit: &(impl Fn(OptimizeEvent) + Sync),
) -> Vec<VariantOutcome> {
    let decoded = original.probe.clone().and_then(|probe| {
        let image = backend.decode(&original.source).map_err(|e| e.to_string())?;
        Ok((image, probe))
    });

    let finish = |outcome: VariantOutcome| {
        emit(OptimizeEvent::VariantFinished(outcome.clone()));
        outcome
    };
    match decoded {
        Ok((image, probe)) => matrix
            .par_iter()
            .map(|spec| {
                finish(produce_variant(backend, &image, original, probe, spec, output_dir))
            })
            .collect(),
        Err(reason) => matrix
            .iter()
            .map(|spec| finish(failed(original, spec, reason.clone())))
            .collect(),
    }
}

/// Run the job with the pure-Rust backend.
pub fn optimize_images(
    config: &BuildConfig,
    events: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeReport, OptimizeError> {
    optimize_with_backend(&RustBackend::new(), config, events)
}

/// Run the job with a specific backend (allows testing with mock).
pub fn optimize_with_backend(
    backend: &impl ImageBackend,
    config: &BuildConfig,
    events: Option<Sender<OptimizeEvent>>,
) -> Result<OptimizeReport, OptimizeError> {
    let source_dir = config.original_images_dir();
    let output_dir = config.optimized_images_dir();

    let sources = find_originals(&source_dir, &config.images)?;
    fs::create_dir_all(&output_dir).map_err(|e| OptimizeError::CreateOutput {
        path: output_dir.clone(),
        source: e,
    })?;

    let matrix = variant_matrix(&config.images);
    let emit = |event| {
        if let Some(tx) = &events {
            // A closed channel only means nobody is listening.
            let _ = tx.send(event);
        }
    };

    let mut originals: Vec<Original> = sources
        .iter()
        .enumerate()
        .map(|(i, source)| {
            let original = probe_original(backend, source);
            emit(OptimizeEvent::ImageFound {
                index: i + 1,
                source: source.clone(),
                dimensions: original.probe.as_ref().ok().map(|(dims, _)| *dims),
            });
            original
        })
        .collect();
    reject_stem_collisions(&mut originals);

    let per_image: Vec<Vec<VariantOutcome>> = originals
        .par_iter()
        .map(|original| produce_variants(backend, original, &matrix, &output_dir, &emit))
        .collect();

    Ok(OptimizeReport {
        originals: originals.len(),
        outcomes: per_image.into_iter().flatten().collect(),
    })
}
