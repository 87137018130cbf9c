//! Height-to-gray normalization and preview images.

use super::error::ExportError;
use crate::terrain::{height_range, ChunkGrid};

/// Ranges narrower than this normalize with a unit denominator.
const MIN_RANGE: f32 = 1e-9;

/// Atlas pixels not covered by a chunk.
pub const ATLAS_BACKGROUND: [u8; 4] = [20, 20, 20, 255];

/// Maps heights in `[min, max]` onto `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalizer {
    min: f32,
    denom: f32,
}

impl Normalizer {
    pub fn from_range(min: f32, max: f32) -> Self {
        let denom = max - min;
        Self {
            min,
            denom: if denom < MIN_RANGE { 1.0 } else { denom },
        }
    }

    /// Normalizer spanning the field's own min and max.
    pub fn fit(heights: &[f32]) -> Self {
        let (min, max) = height_range(heights);
        Self::from_range(min, max)
    }

    #[inline]
    pub fn unit(&self, h: f32) -> f32 {
        ((h - self.min) / self.denom).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn gray8(&self, h: f32) -> u8 {
        (self.unit(h) * 255.0).round() as u8
    }

    #[inline]
    pub fn gray16(&self, h: f32) -> u16 {
        (self.unit(h) * 65535.0).round() as u16
    }
}

/// RGBA8 grayscale rendering of one height field.
#[derive(Debug, Clone, PartialEq)]
pub struct GrayscalePreview {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Height mapped to black.
    pub min: f32,
    /// Height mapped to white.
    pub max: f32,
}

/// Builds an opaque grayscale RGBA8 image of `heights`.
///
/// Returns `None` if `heights.len() != width * height`.
pub fn grayscale_rgba8(heights: &[f32], width: u32, height: u32) -> Option<GrayscalePreview> {
    if heights.len() != width as usize * height as usize {
        return None;
    }

    let (min, max) = height_range(heights);
    let norm = Normalizer::from_range(min, max);
    let rgba = heights
        .iter()
        .flat_map(|&h| {
            let g = norm.gray8(h);
            [g, g, g, 255]
        })
        .collect();

    Some(GrayscalePreview {
        width,
        height,
        rgba,
        min,
        max,
    })
}

/// All chunks of a grid laid out in one RGBA8 image.
#[derive(Debug, Clone, PartialEq)]
pub struct ChunkAtlas {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
    /// Global minimum across every chunk.
    pub min: f32,
    /// Global maximum across every chunk.
    pub max: f32,
}

impl ChunkAtlas {
    fn empty() -> Self {
        Self {
            width: 0,
            height: 0,
            rgba: Vec::new(),
            min: 0.0,
            max: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// RGBA of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let k = (y as usize * self.width as usize + x as usize) * 4;
        [self.rgba[k], self.rgba[k + 1], self.rgba[k + 2], self.rgba[k + 3]]
    }
}

/// Lays every chunk into one image separated by `gap_px` background pixels.
///
/// All chunks share one global min/max, so brightness is comparable across
/// chunk borders. An empty grid gives an empty atlas.
///
/// # Errors
/// `AtlasTooLarge` when the atlas dimensions do not fit in `u32` or its
/// buffer does not fit in memory addressing.
pub fn chunk_atlas_rgba8(grid: &ChunkGrid, gap_px: u32) -> Result<ChunkAtlas, ExportError> {
    if grid.is_empty() {
        return Ok(ChunkAtlas::empty());
    }

    let (cw, ch) = (grid.chunk_width(), grid.chunk_height());
    let too_large = || ExportError::AtlasTooLarge { gap: gap_px };
    let atlas_w = atlas_extent(grid.cols(), cw, gap_px).ok_or_else(too_large)?;
    let atlas_h = atlas_extent(grid.rows(), ch, gap_px).ok_or_else(too_large)?;
    let pixels = (atlas_w as usize)
        .checked_mul(atlas_h as usize)
        .filter(|n| n.checked_mul(4).is_some())
        .ok_or_else(too_large)?;

    let (min, max) = grid.height_range();
    let norm = Normalizer::from_range(min, max);

    let mut rgba = ATLAS_BACKGROUND.repeat(pixels);

    let stride_x = cw as usize + gap_px as usize;
    let stride_y = ch as usize + gap_px as usize;
    for (col, row, chunk) in grid.iter() {
        let ox = col as usize * stride_x;
        let oy = row as usize * stride_y;
        for y in 0..ch as usize {
            for x in 0..cw as usize {
                let g = norm.gray8(chunk[y * cw as usize + x]);
                let k = ((oy + y) * atlas_w as usize + ox + x) * 4;
                rgba[k..k + 4].copy_from_slice(&[g, g, g, 255]);
            }
        }
    }

    Ok(ChunkAtlas {
        width: atlas_w,
        height: atlas_h,
        rgba,
        min,
        max,
    })
}

/// `count * size + (count - 1) * gap`, `None` on overflow.
fn atlas_extent(count: u32, size: u32, gap: u32) -> Option<u32> {
    let gaps = count.saturating_sub(1).checked_mul(gap)?;
    count.checked_mul(size)?.checked_add(gaps)
}

/// Single-channel 8-bit pixels of `heights` under `norm`.
pub(crate) fn luma8(heights: &[f32], norm: &Normalizer) -> Vec<u8> {
    heights.iter().map(|&h| norm.gray8(h)).collect()
}

/// Single-channel 16-bit pixels of `heights` under `norm`.
pub(crate) fn luma16(heights: &[f32], norm: &Normalizer) -> Vec<u16> {
    heights.iter().map(|&h| norm.gray16(h)).collect()
}
