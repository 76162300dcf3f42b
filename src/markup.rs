//! Markup stage: minify every top-level HTML document.
//!
//! Each `*.html` file directly under the source root is minified on its own
//! and written to the same file name under the output root. Subdirectories
//! and other files are ignored (templates are copied verbatim by a later
//! stage).
//!
//! Minification uses [`minify_html`]: comments and redundant attributes are
//! dropped, insignificant whitespace collapsed, and inline `<style>` /
//! `<script>` content minified as CSS / JS. Any leading doctype, legacy
//! public identifiers included, is replaced by `<!doctype html>`.
//!
//! Any unreadable or non-UTF-8 document fails the whole stage.

use crate::config::BuildConfig;
use crate::types::{AssetKind, GeneratedArtifact, SourceAsset};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MarkupError {
    #[error("cannot list source root {}: {source}", path.display())]
    ListSource {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

fn is_markup(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("html"))
}

/// Top-level markup documents of `root`, sorted by file name.
pub fn find_documents(root: &Path) -> Result<Vec<PathBuf>, MarkupError> {
    let list_err = |source| MarkupError::ListSource {
        path: root.to_path_buf(),
        source,
    };
    let mut documents = Vec::new();
    for entry in fs::read_dir(root).map_err(list_err)? {
        let path = entry.map_err(list_err)?.path();
        if is_markup(&path) {
            documents.push(path);
        }
    }
    documents.sort();
    Ok(documents)
}

const SHORT_DOCTYPE: &str = "<!doctype html>";

/// The document after its leading doctype, or `None` when it has none.
fn strip_doctype(html: &str) -> Option<&str> {
    let html = html.trim_start_matches(|c: char| c.is_whitespace() || c == '\u{feff}');
    let keyword = html.get(..9)?;
    if !keyword.eq_ignore_ascii_case("<!doctype") {
        return None;
    }
    let end = html.find('>')?;
    Some(html[end + 1..].trim_start())
}

/// Minify one HTML document.
pub fn minify_document(html: &str) -> Vec<u8> {
    let mut cfg = minify_html::Cfg::new();
    cfg.minify_css = true;
    cfg.minify_js = true;
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;

    match strip_doctype(html) {
        Some(rest) => {
            let mut out = SHORT_DOCTYPE.as_bytes().to_vec();
            out.extend(minify_html::minify(rest.as_bytes(), &cfg));
            out
        }
        None => minify_html::minify(html.as_bytes(), &cfg),
    }
}

/// Run the markup stage.
pub fn process_markup(config: &BuildConfig) -> Result<Vec<GeneratedArtifact>, MarkupError> {
    let mut artifacts = Vec::new();

    for source in find_documents(&config.source)? {
        let html = fs::read_to_string(&source).map_err(|e| MarkupError::Read {
            path: source.clone(),
            source: e,
        })?;
        let minified = minify_document(&html);

        let Some(file_name) = source.file_name() else {
            continue;
        };
        let dest = config.output.join(file_name);
        let write_err = |e| MarkupError::Write {
            path: dest.clone(),
            source: e,
        };
        fs::create_dir_all(&config.output).map_err(write_err)?;
        fs::write(&dest, &minified).map_err(write_err)?;

        artifacts.push(GeneratedArtifact {
            path: dest,
            bytes: minified.len() as u64,
            sources: vec![SourceAsset::new(source, AssetKind::Markup)],
            variant: None,
        });
    }

    Ok(artifacts)
}
