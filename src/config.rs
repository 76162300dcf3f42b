//! Build configuration module.
//!
//! Handles loading, validating, and merging `sitebake.toml`. The file is
//! optional: stock defaults describe the standard site layout, and a user file
//! only needs the keys it wants to override.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source = "src"            # Source root (markup at top level, assets/, templates/)
//! output = "dist"           # Output root, emptied at the start of every build
//!
//! [css]
//! files = ["style.css", "layout.css", "components.css",
//!          "responsive.css", "high-contrast.css", "dark-mode.css"]
//! output = "assets/css/styles.min.css"
//!
//! [js]
//! files = ["app.js", "router.js", "templates.js", "a11y.js", "theme-manager.js"]
//! output = "assets/js/app.min.js"
//!
//! [images]
//! original_dir = "assets/imagens/original"
//! optimized_dir = "assets/imagens/optimized"
//! extensions = ["jpg", "jpeg", "png", "webp"]
//! formats = [{ format = "webp", quality = 80 }, ...]
//! sizes = [{ width = 1920, suffix = "-large" }, ...]
//!
//! [assets]
//! copy = [{ from = "assets/imagens/optimized", to = "assets/imagens" }, ...]
//! templates = "templates"
//!
//! [sitemap]
//! base_url = "https://vidaverde.org"
//!
//! [processing]
//! max_processes = 4         # Max parallel image workers (omit for auto = CPU cores)
//! ```
//!
//! ## Ordering
//!
//! `css.files` and `js.files` are concatenation orders, not sets. They are
//! never sorted: swapping two entries changes the bundle bytes.
//!
//! Unknown keys are rejected to catch typos early.

use crate::imaging::{OutputFormat, supported_input_extensions};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// File name looked up in the working directory when `--config` is not given.
pub const CONFIG_FILE_NAME: &str = "sitebake.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration, fixed before any stage runs.
///
/// Every stage receives it as `&BuildConfig`; nothing mutates it during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Source root directory.
    pub source: PathBuf,
    /// Output root directory. Emptied at the start of every build.
    pub output: PathBuf,
    /// Stylesheet bundle: partials under `<source>/assets/css/`.
    pub css: BundleConfig,
    /// Script bundle: partials under `<source>/assets/js/`.
    pub js: BundleConfig,
    /// Image variant matrix.
    pub images: ImagesConfig,
    /// Directories copied verbatim into the output tree.
    pub assets: AssetsConfig,
    /// Sitemap settings.
    pub sitemap: SitemapConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            source: PathBuf::from("src"),
            output: PathBuf::from("dist"),
            css: BundleConfig {
                files: [
                    "style.css",
                    "layout.css",
                    "components.css",
                    "responsive.css",
                    "high-contrast.css",
                    "dark-mode.css",
                ]
                .map(String::from)
                .to_vec(),
                output: PathBuf::from("assets/css/styles.min.css"),
            },
            js: BundleConfig {
                files: [
                    "app.js",
                    "router.js",
                    "templates.js",
                    "a11y.js",
                    "theme-manager.js",
                ]
                .map(String::from)
                .to_vec(),
                output: PathBuf::from("assets/js/app.min.js"),
            },
            images: ImagesConfig::default(),
            assets: AssetsConfig::default(),
            sitemap: SitemapConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Directory holding the stylesheet partials.
    pub fn css_dir(&self) -> PathBuf {
        self.source.join("assets").join("css")
    }

    /// Directory holding the script partials.
    pub fn js_dir(&self) -> PathBuf {
        self.source.join("assets").join("js")
    }

    /// Directory the image job reads originals from.
    pub fn original_images_dir(&self) -> PathBuf {
        self.source.join(&self.images.original_dir)
    }

    /// Directory the image job writes variants to.
    pub fn optimized_images_dir(&self) -> PathBuf {
        self.source.join(&self.images.optimized_dir)
    }

    /// Replace the source and/or output roots (CLI overrides).
    pub fn with_roots(mut self, source: Option<PathBuf>, output: Option<PathBuf>) -> Self {
        if let Some(source) = source {
            self.source = source;
        }
        if let Some(output) = output {
            self.output = output;
        }
        self
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // The clean stage removes the output root, so it must not hold the source.
        let source = normalize_root(&self.source)?;
        let output = normalize_root(&self.output)?;
        if source.starts_with(&output) {
            return Err(ConfigError::Validation(format!(
                "output {} must not be or contain source {}",
                self.output.display(),
                self.source.display()
            )));
        }
        for (key, bundle) in [("css", &self.css), ("js", &self.js)] {
            if bundle.files.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{key}.files must not be empty"
                )));
            }
            if bundle.output.is_absolute() || bundle.output.as_os_str().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "{key}.output must be a relative file path"
                )));
            }
        }
        self.images.validate()?;
        if self.sitemap.base_url.trim().is_empty() {
            return Err(ConfigError::Validation(
                "sitemap.base_url must not be empty".into(),
            ));
        }
        Ok(())
    }
}

/// Absolute form of a root directory with `.` and `..` resolved lexically.
fn normalize_root(path: &Path) -> Result<PathBuf, ConfigError> {
    let mut normalized = PathBuf::new();
    for component in std::path::absolute(path)?.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalized.pop();
            }
            other => normalized.push(other),
        }
    }
    Ok(normalized)
}

/// An ordered list of partials and the bundle path they produce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BundleConfig {
    /// Partial file names, in concatenation order.
    pub files: Vec<String>,
    /// Bundle path relative to the output root.
    pub output: PathBuf,
}

/// One output format of the image matrix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatSpec {
    pub format: OutputFormat,
    /// Encoding quality (1 = worst, 100 = best).
    pub quality: u32,
}

/// One target width of the image matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SizeSpec {
    /// Target width in pixels. Never exceeded, never upscaled to.
    pub width: u32,
    /// Appended to the original's stem, e.g. `-large` → `hero-large.webp`.
    pub suffix: String,
}

/// Image variant generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImagesConfig {
    /// Originals, relative to the source root.
    pub original_dir: PathBuf,
    /// Variant output, relative to the source root.
    pub optimized_dir: PathBuf,
    /// Accepted original extensions (case-insensitive, without the dot).
    pub extensions: Vec<String>,
    /// Output formats; every size is produced in every format.
    pub formats: Vec<FormatSpec>,
    /// Target widths; every size is produced in every format.
    pub sizes: Vec<SizeSpec>,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            original_dir: PathBuf::from("assets/imagens/original"),
            optimized_dir: PathBuf::from("assets/imagens/optimized"),
            extensions: ["jpg", "jpeg", "png", "webp"].map(String::from).to_vec(),
            formats: vec![
                FormatSpec {
                    format: OutputFormat::Webp,
                    quality: 80,
                },
                FormatSpec {
                    format: OutputFormat::Jpeg,
                    quality: 75,
                },
                FormatSpec {
                    format: OutputFormat::Avif,
                    quality: 60,
                },
            ],
            sizes: vec![
                SizeSpec {
                    width: 1920,
                    suffix: "-large".to_string(),
                },
                SizeSpec {
                    width: 1200,
                    suffix: "-medium".to_string(),
                },
                SizeSpec {
                    width: 800,
                    suffix: "-small".to_string(),
                },
                SizeSpec {
                    width: 400,
                    suffix: "-thumbnail".to_string(),
                },
            ],
        }
    }
}

impl ImagesConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "images.extensions must not be empty".into(),
            ));
        }
        if let Some(ext) = self.extensions.iter().find(|ext| {
            !supported_input_extensions()
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        }) {
            return Err(ConfigError::Validation(format!(
                "images.extensions: no decoder for \"{ext}\""
            )));
        }
        if self.formats.is_empty() {
            return Err(ConfigError::Validation(
                "images.formats must not be empty".into(),
            ));
        }
        if self.sizes.is_empty() {
            return Err(ConfigError::Validation(
                "images.sizes must not be empty".into(),
            ));
        }
        if self
            .formats
            .iter()
            .any(|f| f.quality == 0 || f.quality > 100)
        {
            return Err(ConfigError::Validation(
                "images.formats quality must be 1-100".into(),
            ));
        }
        if self.sizes.iter().any(|s| s.width == 0) {
            return Err(ConfigError::Validation(
                "images.sizes width must be non-zero".into(),
            ));
        }
        // Each (size, format) pair must map to its own file name.
        let mut extensions = HashSet::new();
        if !self
            .formats
            .iter()
            .all(|f| extensions.insert(f.format.extension()))
        {
            return Err(ConfigError::Validation(
                "images.formats must not repeat a format".into(),
            ));
        }
        let mut suffixes = HashSet::new();
        if !self.sizes.iter().all(|s| suffixes.insert(s.suffix.as_str())) {
            return Err(ConfigError::Validation(
                "images.sizes suffixes must be unique".into(),
            ));
        }
        Ok(())
    }

    /// Whether `path` has one of the accepted original extensions.
    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| {
                self.extensions
                    .iter()
                    .any(|accepted| accepted.eq_ignore_ascii_case(ext))
            })
    }
}

/// A directory copied verbatim from the source tree into the output tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CopyRule {
    /// Relative to the source root.
    pub from: PathBuf,
    /// Relative to the output root.
    pub to: PathBuf,
}

/// Verbatim copy settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssetsConfig {
    /// Directories copied by the asset stage, in order.
    pub copy: Vec<CopyRule>,
    /// Template fragments directory, copied to the same relative path.
    pub templates: PathBuf,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            copy: vec![
                CopyRule {
                    from: PathBuf::from("assets/imagens/optimized"),
                    to: PathBuf::from("assets/imagens"),
                },
                CopyRule {
                    from: PathBuf::from("assets/fonts"),
                    to: PathBuf::from("assets/fonts"),
                },
            ],
            templates: PathBuf::from("templates"),
        }
    }
}

/// Sitemap settings. The route list itself is fixed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapConfig {
    /// Absolute site URL the routes are joined onto.
    pub base_url: String,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self {
            base_url: "https://vidaverde.org".to_string(),
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel image workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)`, at least 1
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged on top of.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    toml::Value::try_from(BuildConfig::default())
        .map_err(|e| ConfigError::Validation(format!("default config must serialize: {e}")))
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely. Arrays are
///   replaced, never concatenated, so a user `css.files` is the full order.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize.
pub fn resolve_config(overlay: Option<toml::Value>) -> Result<BuildConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    Ok(merged.try_into()?)
}

/// Load config from the given `sitebake.toml` path.
///
/// A missing file yields the stock defaults. The result is not validated
/// yet: callers apply CLI root overrides first, then call
/// [`BuildConfig::validate`].
pub fn load_config(path: &Path) -> Result<BuildConfig, ConfigError> {
    resolve_config(load_raw_config(path)?)
}

/// Returns a fully-commented stock `sitebake.toml` with all keys.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# sitebake configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# Source root: markup documents at the top level, assets/ and templates/ below.
source = "src"

# Output root. Emptied at the start of every build.
output = "dist"

# ---------------------------------------------------------------------------
# Stylesheet bundle
# ---------------------------------------------------------------------------
[css]
# Partials under <source>/assets/css/, concatenated in exactly this order.
files = [
    "style.css",
    "layout.css",
    "components.css",
    "responsive.css",
    "high-contrast.css",
    "dark-mode.css",
]
# Bundle path, relative to the output root.
output = "assets/css/styles.min.css"

# ---------------------------------------------------------------------------
# Script bundle
# ---------------------------------------------------------------------------
[js]
# Partials under <source>/assets/js/, concatenated in exactly this order.
files = ["app.js", "router.js", "templates.js", "a11y.js", "theme-manager.js"]
output = "assets/js/app.min.js"

# ---------------------------------------------------------------------------
# Image variants (sitebake optimize-images)
# ---------------------------------------------------------------------------
[images]
original_dir = "assets/imagens/original"
optimized_dir = "assets/imagens/optimized"
extensions = ["jpg", "jpeg", "png", "webp"]

# Every size is produced in every format: |sizes| x |formats| files per image.
# Formats: webp, jpg, avif, png (lossless, quality ignored).
formats = [
    { format = "webp", quality = 80 },
    { format = "jpg", quality = 75 },
    { format = "avif", quality = 60 },
]

# Widths are upper bounds: narrower originals keep their own width.
sizes = [
    { width = 1920, suffix = "-large" },
    { width = 1200, suffix = "-medium" },
    { width = 800, suffix = "-small" },
    { width = 400, suffix = "-thumbnail" },
]

# ---------------------------------------------------------------------------
# Verbatim copies
# ---------------------------------------------------------------------------
[assets]
# from: relative to the source root; to: relative to the output root.
copy = [
    { from = "assets/imagens/optimized", to = "assets/imagens" },
    { from = "assets/fonts", to = "assets/fonts" },
]
templates = "templates"

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
[sitemap]
base_url = "https://vidaverde.org"

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel image workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
