//! Verbatim copy stages: asset directories and template fragments.
//!
//! Each [`CopyRule`](crate::config::CopyRule) maps a directory under the
//! source root onto a directory under the output root. The walk is sorted by
//! file name and skips hidden entries (leading `.`) together with their
//! contents. Existing files at the destination are overwritten.
//!
//! A configured source directory that does not exist fails the stage.

use crate::config::BuildConfig;
use crate::types::{AssetKind, GeneratedArtifact, SourceAsset};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum AssetError {
    #[error("source directory not found: {}", .0.display())]
    MissingSource(PathBuf),
    #[error("cannot walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot copy {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0 && entry.file_name().to_string_lossy().starts_with('.')
}

/// Recursively copy `from` into `to`, tagging every copied source as `kind`.
pub fn copy_tree(
    from: &Path,
    to: &Path,
    kind: AssetKind,
) -> Result<Vec<GeneratedArtifact>, AssetError> {
    if !from.is_dir() {
        return Err(AssetError::MissingSource(from.to_path_buf()));
    }

    let mut artifacts = Vec::new();
    let walker = WalkDir::new(from)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| !is_hidden(e));

    for entry in walker {
        let entry = entry.map_err(|e| AssetError::Walk {
            path: from.to_path_buf(),
            source: e,
        })?;
        let Ok(relative) = entry.path().strip_prefix(from) else {
            continue;
        };
        let dest = to.join(relative);
        let copy_err = |e| AssetError::Copy {
            from: entry.path().to_path_buf(),
            to: dest.clone(),
            source: e,
        };

        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).map_err(copy_err)?;
            continue;
        }
        fs::copy(entry.path(), &dest).map_err(copy_err)?;
        artifacts.push(
            GeneratedArtifact::written(&dest, vec![SourceAsset::new(entry.path(), kind)])
                .map_err(copy_err)?,
        );
    }

    Ok(artifacts)
}

/// Kind recorded for files copied from `from`.
fn kind_for(config: &BuildConfig, from: &Path) -> AssetKind {
    if from == config.images.optimized_dir {
        AssetKind::ImageDerivative
    } else if from.file_name().is_some_and(|n| n == "fonts") {
        AssetKind::Font
    } else {
        AssetKind::Other
    }
}

/// Run the asset copy stage: every configured rule, in order.
pub fn copy_assets(config: &BuildConfig) -> Result<Vec<GeneratedArtifact>, AssetError> {
    let mut artifacts = Vec::new();
    for rule in &config.assets.copy {
        artifacts.extend(copy_tree(
            &config.source.join(&rule.from),
            &config.output.join(&rule.to),
            kind_for(config, &rule.from),
        )?);
    }
    Ok(artifacts)
}

/// Run the template copy stage.
pub fn copy_templates(config: &BuildConfig) -> Result<Vec<GeneratedArtifact>, AssetError> {
    copy_tree(
        &config.source.join(&config.assets.templates),
        &config.output.join(&config.assets.templates),
        AssetKind::Template,
    )
}
