//! Pure calculation functions for image dimensions.
//!
//! All functions here are pure and testable without any I/O or images.

/// Calculate the output dimensions of a width-targeted variant.
///
/// The target width is an upper bound: an original narrower than the target
/// keeps its own width (never upscaled). Height follows the original aspect
/// ratio, rounded, and is at least 1 pixel.
///
/// # Arguments
/// * `original` - Original image dimensions (width, height)
/// * `target_width` - Requested variant width
///
/// # Returns
/// * `(width, height)` - Variant dimensions
///
/// # Examples
/// ```
/// # use sitebake::imaging::calculate_variant_dimensions;
/// // 4000x3000 down to 800 wide → 800x600
/// assert_eq!(calculate_variant_dimensions((4000, 3000), 800), (800, 600));
///
/// // 600x400 with a 1920 target stays 600x400
/// assert_eq!(calculate_variant_dimensions((600, 400), 1920), (600, 400));
/// ```
pub fn calculate_variant_dimensions(original: (u32, u32), target_width: u32) -> (u32, u32) {
    let (orig_w, orig_h) = original;
    if orig_w == 0 || orig_h == 0 {
        return (orig_w, orig_h);
    }

    let width = target_width.min(orig_w).max(1);
    if width == orig_w {
        return (orig_w, orig_h);
    }

    let height = (orig_h as f64 * width as f64 / orig_w as f64).round() as u32;
    (width, height.max(1))
}

/// Percentage size reduction of a derivative relative to its original.
///
/// Positive when the derivative is smaller, negative when it grew. An empty
/// original yields `0.0`.
pub fn size_reduction_percent(original_bytes: u64, output_bytes: u64) -> f64 {
    if original_bytes == 0 {
        return 0.0;
    }
    (original_bytes as f64 - output_bytes as f64) / original_bytes as f64 * 100.0
}
