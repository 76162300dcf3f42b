//! Style and script bundles.
//!
//! Both stages share one shape: read the configured partials in order,
//! concatenate them with a newline after each one, minify the result, and
//! write a single bundle file under the output root.
//!
//! ```text
//! src/assets/css/style.css  ─┐
//! src/assets/css/layout.css ─┼─▶ concat ─▶ lightningcss ─▶ dist/assets/css/styles.min.css
//! src/assets/css/...        ─┘
//! ```
//!
//! Every partial is read before the bundle path is touched, so a missing
//! partial or a syntax error leaves no bundle behind.

use crate::config::{BuildConfig, BundleConfig};
use crate::types::{AssetKind, GeneratedArtifact, SourceAsset};
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use minify_js::{Session, TopLevelMode};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BundleError {
    #[error("missing partial {}: {source}", path.display())]
    MissingPartial {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("stylesheet error: {0}")]
    Css(String),
    #[error("script error: {0}")]
    Js(String),
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Read `files` from `dir` in order and join them, each followed by `\n`.
pub fn concatenate_partials(
    dir: &Path,
    files: &[String],
    kind: AssetKind,
) -> Result<(String, Vec<SourceAsset>), BundleError> {
    let mut combined = String::new();
    let mut sources = Vec::with_capacity(files.len());

    for name in files {
        let path = dir.join(name);
        let content = fs::read_to_string(&path).map_err(|e| BundleError::MissingPartial {
            path: path.clone(),
            source: e,
        })?;
        combined.push_str(&content);
        combined.push('\n');
        sources.push(SourceAsset::new(path, kind));
    }

    Ok((combined, sources))
}

/// Minify a stylesheet, keeping cascade order.
pub fn minify_css(css: &str) -> Result<String, BundleError> {
    let mut sheet = StyleSheet::parse(css, ParserOptions::default())
        .map_err(|e| BundleError::Css(e.to_string()))?;
    sheet
        .minify(MinifyOptions::default())
        .map_err(|e| BundleError::Css(e.to_string()))?;
    let printed = sheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| BundleError::Css(e.to_string()))?;
    Ok(printed.code)
}

/// Minify a classic script. Top-level bindings keep their names since
/// partials share the global scope.
pub fn minify_js(js: &str) -> Result<Vec<u8>, BundleError> {
    let session = Session::new();
    let mut out = Vec::new();
    minify_js::minify(&session, TopLevelMode::Global, js.as_bytes(), &mut out)
        .map_err(|e| BundleError::Js(format!("{e:?}")))?;
    Ok(out)
}

fn write_bundle(
    output_root: &Path,
    bundle: &BundleConfig,
    bytes: &[u8],
    sources: Vec<SourceAsset>,
) -> Result<GeneratedArtifact, BundleError> {
    let dest = output_root.join(&bundle.output);
    let write_err = |e| BundleError::Write {
        path: dest.clone(),
        source: e,
    };
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).map_err(write_err)?;
    }
    fs::write(&dest, bytes).map_err(write_err)?;

    Ok(GeneratedArtifact {
        bytes: bytes.len() as u64,
        path: dest,
        sources,
        variant: None,
    })
}

/// Run the styles stage.
pub fn bundle_styles(config: &BuildConfig) -> Result<GeneratedArtifact, BundleError> {
    let (css, sources) =
        concatenate_partials(&config.css_dir(), &config.css.files, AssetKind::StylePartial)?;
    let minified = minify_css(&css)?;
    write_bundle(&config.output, &config.css, minified.as_bytes(), sources)
}

/// Run the scripts stage.
pub fn bundle_scripts(config: &BuildConfig) -> Result<GeneratedArtifact, BundleError> {
    let (js, sources) =
        concatenate_partials(&config.js_dir(), &config.js.files, AssetKind::ScriptPartial)?;
    let minified = minify_js(&js)?;
    write_bundle(&config.output, &config.js, &minified, sources)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config_with(tmp: &TempDir, css: &[(&str, &str)], js: &[(&str, &str)]) -> BuildConfig {
        let mut config = BuildConfig::default().with_roots(
            Some(tmp.path().join("src")),
            Some(tmp.path().join("dist")),
        );
        fs::create_dir_all(config.css_dir()).unwrap();
        fs::create_dir_all(config.js_dir()).unwrap();
        for (name, body) in css {
            fs::write(config.css_dir().join(name), body).unwrap();
        }
        for (name, body) in js {
            fs::write(config.js_dir().join(name), body).unwrap();
        }
        config.css.files = css.iter().map(|(n, _)| n.to_string()).collect();
        config.js.files = js.iter().map(|(n, _)| n.to_string()).collect();
        config
    }

    // =========================================================================
    // Concatenation
    // =========================================================================

    #[test]
    fn concatenation_follows_configured_order_with_newlines() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("a.css"), "a{}").unwrap();
        fs::write(tmp.path().join("b.css"), "b{}").unwrap();

        let files = vec!["b.css".to_string(), "a.css".to_string()];
        let (text, sources) =
            concatenate_partials(tmp.path(), &files, AssetKind::StylePartial).unwrap();

        assert_eq!(text, "b{}\na{}\n");
        assert_eq!(sources[0].path, tmp.path().join("b.css"));
        assert_eq!(sources[1].kind, AssetKind::StylePartial);
    }

    #[test]
    fn newline_boundary_ends_trailing_line_comment() {
        let tmp = TempDir::new().unwrap();
        let config = config_with(
            &tmp,
            &[("a.css", "a{color:red}")],
            &[("one.js", "var first = 1; // no newline"), ("two.js", "var second = 2;")],
        );

        bundle_scripts(&config).unwrap();
        let out = fs::read_to_string(config.output.join("assets/js/app.min.js")).unwrap();
        assert!(out.contains("second"));
    }

    // =========================================================================
    // Styles
    // =========================================================================

    #[test]
    fn minify_css_strips_comments_and_whitespace() {
        let out = minify_css("/* header */\nbody {\n  color : red ;\n}\n").unwrap();
        assert!(!out.contains("header"));
        assert_eq!(out, "body{color:red}");
    }

    #[test]
    fn minify_css_rejects_invalid_selector() {
        assert!(matches!(
            minify_css("..broken { color: red; }"),
            Err(BundleError::Css(_))
        ));
    }

    #[test]
    fn bundle_styles_writes_configured_output() {
        let tmp = TempDir::new().unwrap();
        let config = config_with(
            &tmp,
            &[("style.css", "body { margin: 0 }"), ("dark.css", "p { color: white }")],
            &[("app.js", "")],
        );

        let artifact = bundle_styles(&config).unwrap();

        assert_eq!(artifact.path, config.output.join("assets/css/styles.min.css"));
        assert_eq!(artifact.sources.len(), 2);
        let written = fs::read(&artifact.path).unwrap();
        assert_eq!(written.len() as u64, artifact.bytes);
    }

    #[test]
    fn swapping_partials_changes_the_bundle() {
        let tmp = TempDir::new().unwrap();
        let partials = [("a.css", "a { color: red }"), ("b.css", "b { color: blue }")];
        let mut config = config_with(&tmp, &partials, &[("app.js", "")]);

        let forward = fs::read(bundle_styles(&config).unwrap().path).unwrap();
        config.css.files.reverse();
        let reversed = fs::read(bundle_styles(&config).unwrap().path).unwrap();

        assert_ne!(forward, reversed);
        assert_eq!(forward.len(), reversed.len());
    }

    #[test]
    fn missing_style_partial_leaves_no_bundle() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_with(&tmp, &[("style.css", "a{}")], &[("app.js", "")]);
        config.css.files.push("layout.css".to_string());

        let result = bundle_styles(&config);

        assert!(
            matches!(result, Err(BundleError::MissingPartial { ref path, .. }) if path.ends_with("layout.css"))
        );
        assert!(!config.output.join("assets/css/styles.min.css").exists());
    }

    // =========================================================================
    // Scripts
    // =========================================================================

    #[test]
    fn minify_js_keeps_global_names_and_drops_comments() {
        let js = "// helper\nvar greeting = 'hi';\nfunction shout(message) {\n  return message.toUpperCase();\n}\n";
        let out = String::from_utf8(minify_js(js).unwrap()).unwrap();

        assert!(!out.contains("helper"));
        assert!(out.contains("greeting"));
        assert!(out.contains("shout"));
        assert!(out.len() < js.len());
    }

    #[test]
    fn minify_js_rejects_invalid_syntax() {
        assert!(matches!(
            minify_js("function ( {"),
            Err(BundleError::Js(_))
        ));
    }

    #[test]
    fn invalid_script_leaves_no_bundle() {
        let tmp = TempDir::new().unwrap();
        let config = config_with(
            &tmp,
            &[("style.css", "a{}")],
            &[("app.js", "var ok = 1;"), ("router.js", "let = = ;")],
        );

        assert!(bundle_scripts(&config).is_err());
        assert!(!config.output.join("assets/js/app.min.js").exists());
    }

    #[test]
    fn missing_script_partial_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let mut config = config_with(&tmp, &[("style.css", "a{}")], &[("app.js", "var a;")]);
        config.js.files.insert(0, "router.js".to_string());

        assert!(matches!(
            bundle_scripts(&config),
            Err(BundleError::MissingPartial { .. })
        ));
    }
}
