//! PNG export functionality for height fields.

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::error::ExportError;
use super::grayscale::{luma16, luma8, ChunkAtlas, Normalizer};
use crate::terrain::ChunkGrid;

/// Sample depth of exported grayscale PNGs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BitDepth {
    /// 8-bit, what the studio preview and most viewers expect.
    #[default]
    Eight,
    /// 16-bit, for engines importing heightmaps.
    Sixteen,
}

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    pub bit_depth: BitDepth,
    /// Explicit `(min, max)` normalization range; `None` fits each field.
    pub range: Option<(f32, f32)>,
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            bit_depth: BitDepth::Eight,
            range: None,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Normalizes every chunk against the grid's global range.
    pub fn global_range(grid: &ChunkGrid) -> Self {
        Self {
            range: Some(grid.height_range()),
            ..Default::default()
        }
    }

    fn normalizer(&self, heights: &[f32]) -> Result<Normalizer, ExportError> {
        match self.range {
            Some((min, max)) if min >= max => Err(ExportError::InvalidHeightRange(min, max)),
            Some((min, max)) => Ok(Normalizer::from_range(min, max)),
            None => Ok(Normalizer::fit(heights)),
        }
    }
}

pub(super) fn check_len(heights: &[f32], width: u32, height: u32) -> Result<(), ExportError> {
    let expected = width as usize * height as usize;
    if heights.len() != expected {
        return Err(ExportError::SizeMismatch {
            expected,
            actual: heights.len(),
        });
    }
    Ok(())
}

/// Exports one height field as a grayscale PNG.
///
/// # Arguments
/// * `heights` - Row-major field, `width * height` long
/// * `width`, `height` - Image dimensions
/// * `path` - Output file path
/// * `options` - Bit depth, normalization range and encoder settings
///
/// # Returns
/// `Ok(())` on success, `SizeMismatch` for a wrong-length field,
/// `InvalidHeightRange` for an explicit range with `min >= max`, or an
/// I/O or encoding error.
pub fn export_png(
    heights: &[f32],
    width: u32,
    height: u32,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), ExportError> {
    check_len(heights, width, height)?;
    let norm = options.normalizer(heights)?;

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);

    match options.bit_depth {
        BitDepth::Eight => {
            let pixels = luma8(heights, &norm);
            encoder.write_image(&pixels, width, height, ExtendedColorType::L8)?;
        }
        BitDepth::Sixteen => {
            let pixels = luma16(heights, &norm);
            let bytes: &[u8] = bytemuck::cast_slice(&pixels);
            encoder.write_image(bytes, width, height, ExtendedColorType::L16)?;
        }
    }

    tracing::info!(path = %path.display(), width, height, "exported png");
    Ok(())
}

/// Result of a multi-file export.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportSummary {
    /// Files written successfully.
    pub written: Vec<PathBuf>,
    /// Files attempted.
    pub total: usize,
}

impl ExportSummary {
    pub fn is_complete(&self) -> bool {
        self.written.len() == self.total
    }
}

impl std::fmt::Display for ExportSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} files", self.written.len(), self.total)
    }
}

/// File name of chunk `(col, row)` for a multi-chunk export.
pub fn chunk_file_name(prefix: &str, col: u32, row: u32, ext: &str) -> String {
    format!("{}_r{}_c{}.{}", prefix, row, col, ext)
}

/// Exports every chunk as `{prefix}_r{row}_c{col}.png` in `output_dir`.
///
/// A chunk that fails to write is logged and skipped.
///
/// # Arguments
/// * `grid` - Chunks to export
/// * `output_dir` - Directory to save files to, created if missing
/// * `prefix` - Base name for output files
/// * `options` - Export options applied to every chunk
///
/// # Returns
/// An [`ExportSummary`] of written and attempted files, or `EmptyGrid` /
/// an I/O error if nothing could be attempted.
pub fn export_all_chunks_png(
    grid: &ChunkGrid,
    output_dir: &Path,
    prefix: &str,
    options: &PngExportOptions,
) -> Result<ExportSummary, ExportError> {
    if grid.is_empty() {
        return Err(ExportError::EmptyGrid);
    }
    std::fs::create_dir_all(output_dir)?;

    let mut summary = ExportSummary {
        written: Vec::with_capacity(grid.len()),
        total: grid.len(),
    };

    for (col, row, chunk) in grid.iter() {
        let path = output_dir.join(chunk_file_name(prefix, col, row, "png"));
        match export_png(chunk, grid.chunk_width(), grid.chunk_height(), &path, options) {
            Ok(()) => summary.written.push(path),
            Err(e) => tracing::warn!(col, row, error = %e, "chunk export failed"),
        }
    }

    Ok(summary)
}

/// Writes a chunk atlas as an RGBA PNG.
pub fn export_atlas_png(atlas: &ChunkAtlas, path: &Path) -> Result<(), ExportError> {
    if atlas.is_empty() {
        return Err(ExportError::EmptyGrid);
    }

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder =
        PngEncoder::new_with_quality(writer, CompressionType::Default, FilterType::Adaptive);
    encoder.write_image(&atlas.rgba, atlas.width, atlas.height, ExtendedColorType::Rgba8)?;

    tracing::info!(
        path = %path.display(),
        width = atlas.width,
        height = atlas.height,
        "exported atlas"
    );
    Ok(())
}
