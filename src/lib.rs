//! # sitebake
//!
//! Build tooling for a small static site: one command minifies and bundles
//! the source tree into a deployable output tree, another pre-generates
//! responsive image variants.
//!
//! # Architecture: Two Jobs
//!
//! ```text
//! build            src/  →  dist/                        (sequential stages)
//! optimize-images  src/assets/imagens/original/
//!                       →  src/assets/imagens/optimized/ (parallel variants)
//! ```
//!
//! The build is a fixed sequence of stages (clean, markup, styles, scripts,
//! assets, templates, sitemap). Any stage failure aborts the build. The image
//! job is independent: it runs before a build so the asset stage can copy its
//! derivatives, and it tolerates per-variant failures.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`pipeline`] | Ordered stage descriptors, driver loop, per-stage outcomes |
//! | [`markup`] | Minifies top-level HTML documents |
//! | [`bundle`] | Concatenates and minifies stylesheet and script partials |
//! | [`assets`] | Verbatim directory copies (assets, templates) |
//! | [`sitemap`] | Fixed-route `sitemap.xml` |
//! | [`optimize`] | Image variant job: size × format matrix over every original |
//! | [`imaging`] | Pure-Rust image operations: identify, resize, encode |
//! | [`config`] | `sitebake.toml` loading, merging onto defaults, validation |
//! | [`types`] | Source assets and generated artifacts shared by all stages |
//! | [`output`] | CLI output formatting for both jobs |
//!
//! # Design Decisions
//!
//! ## Explicit Stage List
//!
//! The build order lives in one constant, [`pipeline::STAGES`]. Each entry
//! pairs a [`pipeline::Stage`] tag with a plain function taking the shared
//! `&BuildConfig`, so the driver can report exactly which stage failed and
//! which were skipped.
//!
//! ## Pure-Rust Toolchain
//!
//! Minification (`minify-html`, `lightningcss`, `minify-js`) and imaging
//! (`image`) are all pure Rust. The binary needs no Node runtime, no
//! ImageMagick and no system codecs.
//!
//! ## Deterministic Output
//!
//! Given the same source tree and generation date, a build produces a
//! byte-identical output tree: documents are processed in file-name order,
//! partials in configured order, and the sitemap date is injectable through
//! [`pipeline::run_on`]. Image variants are generated in parallel, but their
//! report is collected in combination order.

pub mod assets;
pub mod bundle;
pub mod config;
pub mod imaging;
pub mod markup;
pub mod optimize;
pub mod output;
pub mod pipeline;
pub mod sitemap;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;
