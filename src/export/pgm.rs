//! Binary PGM (P5) export.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::pnm::{PnmEncoder, PnmSubtype, SampleEncoding};
use image::{ExtendedColorType, ImageEncoder};

use super::error::ExportError;
use super::grayscale::{luma8, Normalizer};
use super::png::check_len;

/// Exports one height field as an 8-bit binary graymap, normalized to its own range.
pub fn export_pgm(heights: &[f32], width: u32, height: u32, path: &Path) -> Result<(), ExportError> {
    check_len(heights, width, height)?;
    let pixels = luma8(heights, &Normalizer::fit(heights));

    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PnmEncoder::new(writer).with_subtype(PnmSubtype::Graymap(SampleEncoding::Binary));
    encoder.write_image(&pixels, width, height, ExtendedColorType::L8)?;

    tracing::info!(path = %path.display(), width, height, "exported pgm");
    Ok(())
}
