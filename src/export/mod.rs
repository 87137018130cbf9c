//! Export module for saving height fields and previews.
//!
//! Supports 8/16-bit grayscale PNG, binary PGM, per-chunk PNG sets and an
//! RGBA atlas of the whole chunk grid.

mod error;
mod grayscale;
mod pgm;
mod png;

pub use error::ExportError;
pub use grayscale::{
    chunk_atlas_rgba8, grayscale_rgba8, ChunkAtlas, GrayscalePreview, Normalizer,
    ATLAS_BACKGROUND,
};
pub use pgm::export_pgm;
pub use png::{
    chunk_file_name, export_all_chunks_png, export_atlas_png, export_png, BitDepth, ExportSummary,
    PngExportOptions,
};

/// `{prefix}_{YYYYMMDD}_{HHMMSS}.{ext}` in local time.
pub fn timestamped_filename(prefix: &str, ext: &str) -> String {
    let now = chrono::Local::now();
    format!("{}_{}.{}", prefix, now.format("%Y%m%d_%H%M%S"), ext)
}
