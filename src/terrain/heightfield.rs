//! Flat height arrays.

/// One chunk's elevations in row-major order (`index = y * width + x`).
///
/// Width and height travel alongside the field; nothing is embedded.
pub type HeightField = Vec<f32>;

/// Returns `(min, max)` over `heights`.
///
/// An empty slice gives `(f32::MAX, f32::MIN)`.
pub fn height_range(heights: &[f32]) -> (f32, f32) {
    heights
        .iter()
        .fold((f32::MAX, f32::MIN), |(min, max), &h| (min.min(h), max.max(h)))
}
