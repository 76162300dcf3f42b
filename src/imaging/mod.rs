//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Resize** | Lanczos3 `resize_exact`, width-bounded, never upscaled |
//! | **Decode** | `image` decoders, once per original |
//! | **Encode** | JPEG / AVIF (rav1e) / lossy WebP (libwebp) / PNG |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension and size math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{calculate_variant_dimensions, size_reduction_percent};
pub use operations::{
    GeneratedVariant, VariantSpec, create_variant, get_dimensions, staging_path,
};
pub use params::{OutputFormat, Quality, ResizeParams};
pub use rust_backend::{RustBackend, supported_input_extensions};
