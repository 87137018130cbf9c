//! Crest post-filter: smooths or sharpens strict local maxima.

use rayon::prelude::*;

use super::params::GenerationParams;

/// Factors below this are treated as off.
const ACTIVE_THRESHOLD: f32 = 0.001;

/// Settings for the single-pass crest filter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CrestFilter {
    /// Blend toward the local mean, in [0, 1].
    pub smoothing: f32,
    /// Push away from the local mean, in [0, 1].
    pub sharpen: f32,
    /// Averaging window radius before rounding.
    pub width: f32,
}

impl CrestFilter {
    pub fn new(smoothing: f32, sharpen: f32, width: f32) -> Self {
        Self {
            smoothing,
            sharpen,
            width,
        }
    }

    pub fn from_params(params: &GenerationParams) -> Self {
        Self::new(params.crest_smoothing, params.crest_sharpen, params.crest_width)
    }

    fn smoothing_active(&self) -> bool {
        self.smoothing > ACTIVE_THRESHOLD
    }

    fn sharpen_active(&self) -> bool {
        self.sharpen > ACTIVE_THRESHOLD
    }

    /// True when the filter would modify anything.
    pub fn is_active(&self) -> bool {
        self.smoothing_active() || self.sharpen_active()
    }

    /// Window radius in cells, `max(1, round(width))`.
    pub fn radius(&self) -> usize {
        self.width.round().max(1.0) as usize
    }

    /// Applies the filter in place to a `width` x `height` row-major field.
    ///
    /// Crest detection and window averages read a snapshot of the input, so
    /// the result does not depend on visiting order.
    pub fn apply(&self, heights: &mut [f32], width: usize, height: usize) {
        if !self.is_active() || width < 3 || height < 3 {
            return;
        }
        assert_eq!(
            heights.len(),
            width * height,
            "height field length does not match {}x{}",
            width,
            height
        );

        let snapshot = heights.to_vec();
        let radius = self.radius();

        heights
            .par_chunks_mut(width)
            .enumerate()
            .filter(|(y, _)| *y >= 1 && *y < height - 1)
            .for_each(|(y, row)| {
                for x in 1..width - 1 {
                    if let Some(h) = self.filter_cell(&snapshot, width, height, x, y, radius) {
                        row[x] = h;
                    }
                }
            });
    }

    /// New height for an interior crest cell, `None` if the cell is not a crest.
    fn filter_cell(
        &self,
        src: &[f32],
        width: usize,
        height: usize,
        x: usize,
        y: usize,
        radius: usize,
    ) -> Option<f32> {
        let idx = |x: usize, y: usize| y * width + x;

        let h = src[idx(x, y)];
        let max_neighbor = src[idx(x - 1, y)]
            .max(src[idx(x + 1, y)])
            .max(src[idx(x, y - 1)])
            .max(src[idx(x, y + 1)]);
        if h <= max_neighbor {
            return None;
        }

        let x0 = x.saturating_sub(radius);
        let x1 = x.saturating_add(radius).min(width - 1);
        let y0 = y.saturating_sub(radius);
        let y1 = y.saturating_add(radius).min(height - 1);

        let mut sum = 0.0f32;
        let mut count = 0usize;
        for wy in y0..=y1 {
            for wx in x0..=x1 {
                sum += src[idx(wx, wy)];
                count += 1;
            }
        }
        let local_avg = sum / count.max(1) as f32;

        let mut out = h;
        if self.smoothing_active() {
            let t = self.smoothing * 0.5;
            out = out * (1.0 - t) + local_avg * t;
        }
        if self.sharpen_active() {
            out += (out - local_avg) * self.sharpen * 0.8;
        }
        Some(out)
    }
}
