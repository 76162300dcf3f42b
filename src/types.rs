//! Shared types used across the pipeline stages and the image job.
//!
//! Everything here is created fresh during a run and never mutated after
//! construction.

use crate::imaging::VariantSpec;
use std::fmt;
use std::path::{Path, PathBuf};

/// Role of a file in the source tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AssetKind {
    Markup,
    StylePartial,
    ScriptPartial,
    ImageOriginal,
    /// A pre-generated variant picked up by the asset copy stage.
    ImageDerivative,
    Font,
    Template,
    /// Anything else under a copied directory.
    Other,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Markup => "markup",
            Self::StylePartial => "style-partial",
            Self::ScriptPartial => "script-partial",
            Self::ImageOriginal => "image-original",
            Self::ImageDerivative => "image-derivative",
            Self::Font => "font",
            Self::Template => "template",
            Self::Other => "other",
        };
        f.write_str(label)
    }
}

/// A read-only file in the source tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceAsset {
    pub path: PathBuf,
    pub kind: AssetKind,
}

impl SourceAsset {
    pub fn new(path: impl Into<PathBuf>, kind: AssetKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }
}

/// A file written by a stage or by the image job.
///
/// `path` is absolute or relative exactly as written (output root joined with
/// the artifact's relative path).
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedArtifact {
    pub path: PathBuf,
    pub bytes: u64,
    /// Inputs the artifact was produced from; empty for generated documents
    /// such as the sitemap.
    pub sources: Vec<SourceAsset>,
    /// The variant spec, for image derivatives.
    pub variant: Option<VariantSpec>,
}

impl GeneratedArtifact {
    /// Build an artifact record for a file that has just been written.
    pub fn written(
        path: impl Into<PathBuf>,
        sources: Vec<SourceAsset>,
    ) -> std::io::Result<Self> {
        let path = path.into();
        let bytes = std::fs::metadata(&path)?.len();
        Ok(Self {
            path,
            bytes,
            sources,
            variant: None,
        })
    }

    /// Attach the variant spec that produced this artifact.
    pub fn with_variant(mut self, variant: VariantSpec) -> Self {
        self.variant = Some(variant);
        self
    }

    /// Path relative to `root`, or the full path when outside it.
    pub fn relative_to<'a>(&'a self, root: &Path) -> &'a Path {
        self.path.strip_prefix(root).unwrap_or(&self.path)
    }
}
