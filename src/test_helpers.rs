//! Shared test utilities for the sitebake test suite.
//!
//! Lays out a small but complete source tree matching the stock config, and
//! provides helpers to write synthetic images and to snapshot output trees.
//!
//! # Usage
//!
//! ```ignore
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let config = setup_source_tree(tmp.path());
//! let report = pipeline::run_on(&config, date, None);
//! assert_eq!(tree_snapshot(&config.output), expected);
//! ```

use crate::config::BuildConfig;
use image::{ImageEncoder, Rgb, RgbImage};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

// =========================================================================
// Fixture setup
// =========================================================================

fn write(path: &Path, body: impl AsRef<[u8]>) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, body).unwrap();
}

/// Write a `width`×`height` gradient JPEG to `path`.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    });
    let mut bytes = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut bytes, 90)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    write(path, bytes);
}

/// Write a PNG whose header says `width`×`height` but whose pixel data is
/// cut short: it identifies but does not decode.
pub fn create_truncated_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 64]));
    let mut bytes = Vec::new();
    image::codecs::png::PngEncoder::new(&mut bytes)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
    let idat = bytes.windows(4).position(|w| w == b"IDAT").unwrap();
    bytes.truncate(idat + 4 + 16);
    write(path, bytes);
}

/// Lay out a source tree under `root/src` and return a config building it
/// into `root/dist`.
///
/// Every stylesheet and script partial of the stock lists exists, along with
/// two pages, a font, a template, one pre-generated derivative and one
/// original image.
pub fn setup_source_tree(root: &Path) -> BuildConfig {
    let config = BuildConfig::default().with_roots(Some(root.join("src")), Some(root.join("dist")));
    let src = &config.source;

    write(
        &src.join("index.html"),
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n  <head>\n    <title>Vida Verde</title>\n    <link rel=\"stylesheet\" href=\"assets/css/styles.min.css\">\n  </head>\n  <body>\n    <!-- conteúdo -->\n    <main id=\"app\"></main>\n    <script src=\"assets/js/app.min.js\"></script>\n  </body>\n</html>\n",
    );
    write(
        &src.join("projetos.html"),
        "<!DOCTYPE html>\n<html>\n  <body>\n    <h1>  Projetos  </h1>\n  </body>\n</html>\n",
    );

    for (i, name) in config.css.files.iter().enumerate() {
        write(
            &config.css_dir().join(name),
            format!("/* {name} */\n.block-{i} {{\n  margin : {i}px ;\n}}\n"),
        );
    }
    for (i, name) in config.js.files.iter().enumerate() {
        write(
            &config.js_dir().join(name),
            format!("// {name}\nfunction setup{i}(target) {{\n  return target + {i};\n}}\n"),
        );
    }

    write(&src.join("assets/fonts/inter.woff2"), [0u8, 1, 2, 3]);
    write(&src.join("templates/card.html"), "<article class=\"card\"></article>\n");
    write(
        &config.optimized_images_dir().join("hero-small.webp"),
        b"RIFF-derivative",
    );
    create_test_jpeg(&config.original_images_dir().join("hero.jpg"), 48, 32);

    config
}

// =========================================================================
// Output inspection
// =========================================================================

/// Every file under `dir`, keyed by relative path.
pub fn tree_snapshot(dir: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .map(|entry| entry.unwrap())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| {
            let relative = entry.path().strip_prefix(dir).unwrap().to_path_buf();
            (relative, fs::read(entry.path()).unwrap())
        })
        .collect()
}
