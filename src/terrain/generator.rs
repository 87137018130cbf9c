//! Per-chunk height synthesis.

use std::time::Instant;

use glam::{Mat2, Vec2};
use rayon::prelude::*;

use super::chunk_grid::{self, ChunkGrid};
use super::crest::CrestFilter;
use super::heightfield::{height_range, HeightField};
use super::params::GenerationParams;
use crate::noise::{fbm, FractalShape, NoiseMode, NoiseTable};

/// Shift between the X and Y warp samples, decorrelating the two displacement fields.
const WARP_DECORRELATION: f32 = 100.0;

/// Domain-warp settings: a low-frequency fBm displacement applied before sampling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DomainWarp {
    pub frequency: f32,
    pub amplitude: f32,
}

impl DomainWarp {
    /// `Some` when warping is enabled in `params`.
    pub fn from_params(params: &GenerationParams) -> Option<Self> {
        params.warp_enabled.then(|| Self {
            frequency: params.warp_freq,
            amplitude: params.warp_amp,
        })
    }

    /// Displacement `(dx, dy)` to add at `p`.
    pub fn displacement(&self, table: &NoiseTable, p: Vec2) -> Vec2 {
        let shape = FractalShape::WARP;
        let f = self.frequency;
        let dx = fbm(table, p.x * f, p.y * f, shape.octaves, shape.lacunarity, shape.gain);
        let dy = fbm(
            table,
            (p.x + WARP_DECORRELATION) * f,
            (p.y + WARP_DECORRELATION) * f,
            shape.octaves,
            shape.lacunarity,
            shape.gain,
        );
        Vec2::new(dx * self.amplitude, dy * self.amplitude)
    }
}

/// World position of vertex `(i, j)` in a `width` x `height` chunk.
///
/// The chunk spans `terrain_width` x `terrain_length` centered on `chunk_offset`.
/// A single-vertex axis collapses to `u = 0` instead of dividing by zero.
pub fn vertex_world_position(
    params: &GenerationParams,
    width: u32,
    height: u32,
    i: u32,
    j: u32,
    chunk_offset: Vec2,
) -> Vec2 {
    let u = if width > 1 {
        i as f32 / (width - 1) as f32
    } else {
        0.0
    };
    let v = if height > 1 {
        j as f32 / (height - 1) as f32
    } else {
        0.0
    };

    let local = Vec2::new(
        (u - 0.5) * params.terrain_width,
        (v - 0.5) * params.terrain_length,
    );
    local + chunk_offset
}

/// Parameter-derived constants of the per-vertex pipeline.
struct SamplePipeline {
    stretch: Vec2,
    rotation: Mat2,
    exploration_offset: Vec2,
    warp: Option<DomainWarp>,
    zoom: f32,
    freq: f32,
    mode: NoiseMode,
    shape: FractalShape,
    amp: f32,
    invert: bool,
}

impl SamplePipeline {
    fn new(params: &GenerationParams) -> Self {
        Self {
            stretch: Vec2::new(params.stretch_x, params.stretch_y),
            rotation: Mat2::from_angle(params.rotation_deg.to_radians()),
            exploration_offset: Vec2::new(params.noise_offset_x, params.noise_offset_y),
            warp: DomainWarp::from_params(params),
            zoom: params.noise_zoom,
            freq: params.freq,
            mode: params.noise_mode,
            shape: params.fractal_shape(),
            amp: params.amp,
            invert: params.invert_z,
        }
    }

    /// Height before recentering for a world-space position.
    fn height_at(&self, table: &NoiseTable, world: Vec2) -> f32 {
        let p = self.rotation * (world * self.stretch) + self.exploration_offset;
        let p = match &self.warp {
            Some(warp) => p + warp.displacement(table, p),
            None => p,
        };

        let n = p * self.zoom * self.freq;
        let value = self.mode.sample(table, n.x, n.y, &self.shape);

        let z = value * 0.25 * self.amp;
        if self.invert {
            -z
        } else {
            z
        }
    }
}

/// Generates height fields from a shared, read-only noise table.
#[derive(Debug, Clone, Copy)]
pub struct TerrainGenerator<'a> {
    noise: &'a NoiseTable,
}

impl<'a> TerrainGenerator<'a> {
    pub fn new(noise: &'a NoiseTable) -> Self {
        Self { noise }
    }

    pub fn noise(&self) -> &'a NoiseTable {
        self.noise
    }

    /// Generates one chunk of `width` x `height` vertices centered on `chunk_offset`.
    ///
    /// Rows are evaluated in parallel. The finished field is shifted by
    /// `-(min + max) / 4` over this chunk alone, then crest-filtered.
    pub fn generate_heights(
        &self,
        params: &GenerationParams,
        width: u32,
        height: u32,
        chunk_offset: Vec2,
    ) -> HeightField {
        let w = width as usize;
        let h = height as usize;
        let mut heights: HeightField = vec![0.0; w * h];
        if heights.is_empty() {
            return heights;
        }

        let pipeline = SamplePipeline::new(params);
        let table = self.noise;

        heights.par_chunks_mut(w).enumerate().for_each(|(j, row)| {
            for (i, out) in row.iter_mut().enumerate() {
                let world =
                    vertex_world_position(params, width, height, i as u32, j as u32, chunk_offset);
                *out = pipeline.height_at(table, world);
            }
        });

        let (min, max) = height_range(&heights);
        let recenter = -(min + max) / 4.0;
        heights.par_iter_mut().for_each(|v| *v += recenter);

        CrestFilter::from_params(params).apply(&mut heights, w, h);

        heights
    }

    /// Generates every chunk of the grid described by `params`.
    pub fn generate_chunk_grid(&self, params: &GenerationParams) -> ChunkGrid {
        chunk_grid::build_chunk_grid(self, params)
    }
}

/// Single-chunk entry point, used for the chunk [0, 0] export path.
///
/// # Arguments
/// * `table` - Shared noise table
/// * `params` - Generation parameters, used as given (no clamping)
/// * `width`, `height` - Vertex counts along X and Y
/// * `offset_x`, `offset_y` - World-space center of the chunk
///
/// # Returns
/// A row-major field of `width * height` heights, recentered and
/// crest-filtered. Empty when either dimension is zero.
pub fn generate_heights_for_chunk(
    table: &NoiseTable,
    params: &GenerationParams,
    width: u32,
    height: u32,
    offset_x: f32,
    offset_y: f32,
) -> HeightField {
    let start = Instant::now();
    let heights = TerrainGenerator::new(table).generate_heights(
        params,
        width,
        height,
        Vec2::new(offset_x, offset_y),
    );
    tracing::debug!(
        width,
        height,
        offset_x,
        offset_y,
        elapsed = ?start.elapsed(),
        "generated height field"
    );
    heights
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::ridged_fbm;

    fn flat_params() -> GenerationParams {
        GenerationParams {
            warp_enabled: false,
            crest_smoothing: 0.0,
            crest_sharpen: 0.0,
            ..Default::default()
        }
    }

    /// Reference fBm field computed vertex by vertex, `map` taking world
    /// positions to pre-zoom noise space.
    fn expected_fbm_field(
        table: &NoiseTable,
        params: &GenerationParams,
        n: u32,
        map: impl Fn(Vec2) -> Vec2,
    ) -> Vec<f32> {
        let mut raw = Vec::with_capacity((n * n) as usize);
        for j in 0..n {
            for i in 0..n {
                let world = vertex_world_position(params, n, n, i, j, Vec2::ZERO);
                let p = map(world) * params.noise_zoom * params.freq;
                let value = fbm(table, p.x, p.y, params.octaves, params.lacunarity, params.gain);
                raw.push(value * 0.25 * params.amp);
            }
        }
        let (min, max) = height_range(&raw);
        let recenter = -(min + max) / 4.0;
        raw.iter().map(|v| v + recenter).collect()
    }

    fn assert_fields_close(actual: &[f32], expected: &[f32], eps: f32) {
        assert_eq!(actual.len(), expected.len());
        for (k, (a, e)) in actual.iter().zip(expected).enumerate() {
            assert!((a - e).abs() < eps, "vertex {}: got {}, expected {}", k, a, e);
        }
    }

    #[test]
    fn test_output_length() {
        let table = NoiseTable::new(1);
        let params = GenerationParams::default();
        for (w, h) in [(2, 2), (17, 9), (64, 33), (1, 5)] {
            let field = generate_heights_for_chunk(&table, &params, w, h, 0.0, 0.0);
            assert_eq!(field.len(), (w * h) as usize);
        }
    }

    #[test]
    fn test_zero_size_is_empty() {
        let table = NoiseTable::new(1);
        let params = GenerationParams::default();
        assert!(generate_heights_for_chunk(&table, &params, 0, 10, 0.0, 0.0).is_empty());
    }

    #[test]
    fn test_vertex_world_position_corners() {
        let params = GenerationParams {
            terrain_width: 100.0,
            terrain_length: 50.0,
            ..Default::default()
        };
        let offset = Vec2::new(10.0, -20.0);

        assert_eq!(vertex_world_position(&params, 11, 6, 0, 0, offset), Vec2::new(-40.0, -45.0));
        assert_eq!(vertex_world_position(&params, 11, 6, 10, 5, offset), Vec2::new(60.0, 5.0));
        assert_eq!(vertex_world_position(&params, 11, 6, 5, 0, offset), Vec2::new(10.0, -45.0));
    }

    #[test]
    fn test_single_vertex_axis_collapses() {
        let params = GenerationParams::default();
        let p = vertex_world_position(&params, 1, 1, 0, 0, Vec2::ZERO);
        assert_eq!(p, Vec2::new(-64.0, -64.0));
    }

    #[test]
    fn test_single_sample_chunk() {
        // min == max, so the recenter offset halves the only value.
        let table = NoiseTable::new(9);
        let params = GenerationParams {
            noise_mode: NoiseMode::Ridged,
            ..flat_params()
        };
        let field = generate_heights_for_chunk(&table, &params, 1, 1, 0.0, 0.0);

        let n = Vec2::new(-64.0, -64.0) * params.noise_zoom * params.freq;
        let raw = ridged_fbm(&table, n.x, n.y, params.octaves, params.lacunarity, params.gain)
            * 0.25
            * params.amp;
        assert_eq!(field.len(), 1);
        assert!((field[0] - raw / 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_deterministic() {
        let table = NoiseTable::new(4242);
        let params = GenerationParams {
            crest_smoothing: 0.4,
            crest_sharpen: 0.3,
            crest_width: 2.0,
            ..Default::default()
        };
        let a = generate_heights_for_chunk(&table, &params, 48, 40, 12.0, -3.0);
        let b = generate_heights_for_chunk(&table, &params, 48, 40, 12.0, -3.0);
        assert!(a.iter().zip(&b).all(|(x, y)| x.to_bits() == y.to_bits()));
    }

    #[test]
    fn test_invert_negates_field() {
        let table = NoiseTable::new(31);
        let params = GenerationParams {
            noise_mode: NoiseMode::Fbm,
            ..flat_params()
        };
        let inverted = GenerationParams {
            invert_z: true,
            ..params.clone()
        };

        let up = generate_heights_for_chunk(&table, &params, 24, 24, 0.0, 0.0);
        let down = generate_heights_for_chunk(&table, &inverted, 24, 24, 0.0, 0.0);
        for (a, b) in up.iter().zip(&down) {
            assert!((a + b).abs() < 1e-5, "{} is not the negation of {}", b, a);
        }
    }

    #[test]
    fn test_warp_changes_field() {
        let table = NoiseTable::new(5);
        let plain = flat_params();
        let warped = GenerationParams {
            warp_enabled: true,
            warp_amp: 25.0,
            warp_freq: 0.02,
            ..plain.clone()
        };

        let a = generate_heights_for_chunk(&table, &plain, 32, 32, 0.0, 0.0);
        let b = generate_heights_for_chunk(&table, &warped, 32, 32, 0.0, 0.0);
        assert!(a.iter().zip(&b).any(|(x, y)| (x - y).abs() > 1e-4));
    }

    #[test]
    fn test_warp_displacement_decorrelated() {
        let table = NoiseTable::new(17);
        let warp = DomainWarp {
            frequency: 0.05,
            amplitude: 10.0,
        };
        let p = Vec2::new(13.7, -4.2);
        let d = warp.displacement(&table, p);

        let expected_x = fbm(&table, p.x * 0.05, p.y * 0.05, 3, 2.0, 0.5) * 10.0;
        let expected_y =
            fbm(&table, (p.x + 100.0) * 0.05, (p.y + 100.0) * 0.05, 3, 2.0, 0.5) * 10.0;
        assert_eq!(d, Vec2::new(expected_x, expected_y));
    }

    #[test]
    fn test_warp_disabled_gives_none() {
        let params = flat_params();
        assert!(DomainWarp::from_params(&params).is_none());
        assert!(DomainWarp::from_params(&GenerationParams::default()).is_some());
    }

    #[test]
    fn test_rotation_by_quarter_turn() {
        // Rotating a square chunk by 90 degrees maps the field onto itself transposed.
        let table = NoiseTable::new(77);
        let base = GenerationParams {
            noise_mode: NoiseMode::Fbm,
            ..flat_params()
        };
        let rotated = GenerationParams {
            rotation_deg: 90.0,
            ..base.clone()
        };

        let n = 9u32;
        let a = generate_heights_for_chunk(&table, &base, n, n, 0.0, 0.0);
        let b = generate_heights_for_chunk(&table, &rotated, n, n, 0.0, 0.0);

        // (x, y) rotated by +90 degrees is (-y, x): vertex (i, j) of `b`
        // samples vertex (n-1-j, i) of `a`.
        let size = n as usize;
        for j in 0..size {
            for i in 0..size {
                let rb = b[j * size + i];
                let ra = a[i * size + (size - 1 - j)];
                assert!((rb - ra).abs() < 1e-3, "mismatch at ({}, {})", i, j);
            }
        }
    }

    #[test]
    fn test_crest_filter_runs_after_recentering() {
        let table = NoiseTable::new(2024);
        // High enough frequency for several interior crests.
        let plain = GenerationParams {
            noise_mode: NoiseMode::Fbm,
            freq: 0.08,
            ..flat_params()
        };
        let crested = GenerationParams {
            crest_smoothing: 0.7,
            crest_sharpen: 0.4,
            crest_width: 2.0,
            ..plain.clone()
        };

        let mut expected = generate_heights_for_chunk(&table, &plain, 40, 40, 0.0, 0.0);
        let unfiltered = expected.clone();
        CrestFilter::from_params(&crested).apply(&mut expected, 40, 40);
        assert_ne!(expected, unfiltered);

        let field = generate_heights_for_chunk(&table, &crested, 40, 40, 0.0, 0.0);
        assert_eq!(field, expected);
    }

    #[test]
    fn test_stretch_scales_world_axes() {
        let table = NoiseTable::new(61);
        let params = GenerationParams {
            noise_mode: NoiseMode::Fbm,
            stretch_x: 2.0,
            stretch_y: 0.5,
            ..flat_params()
        };

        let field = generate_heights_for_chunk(&table, &params, 12, 12, 0.0, 0.0);
        let expected = expected_fbm_field(&table, &params, 12, |w| Vec2::new(w.x * 2.0, w.y * 0.5));
        assert_fields_close(&field, &expected, 1e-4);

        let unstretched = expected_fbm_field(&table, &params, 12, |w| w);
        assert!(field.iter().zip(&unstretched).any(|(a, b)| (a - b).abs() > 1e-3));
    }

    #[test]
    fn test_exploration_offset_applies_after_rotation() {
        let table = NoiseTable::new(8);
        let params = GenerationParams {
            noise_mode: NoiseMode::Fbm,
            rotation_deg: 90.0,
            noise_offset_x: 37.0,
            noise_offset_y: -11.0,
            ..flat_params()
        };

        let field = generate_heights_for_chunk(&table, &params, 10, 10, 0.0, 0.0);
        let expected =
            expected_fbm_field(&table, &params, 10, |w| Vec2::new(-w.y + 37.0, w.x - 11.0));
        assert_fields_close(&field, &expected, 1e-3);

        // Offsetting before rotating would sample elsewhere.
        let offset_first =
            expected_fbm_field(&table, &params, 10, |w| Vec2::new(-(w.y - 11.0), w.x + 37.0));
        assert!(field.iter().zip(&offset_first).any(|(a, b)| (a - b).abs() > 1e-2));
    }

    #[test]
    fn test_zoom_scales_like_frequency() {
        let table = NoiseTable::new(303);
        let zoomed = GenerationParams {
            noise_mode: NoiseMode::Fbm,
            noise_zoom: 2.5,
            freq: 0.01,
            ..flat_params()
        };
        let faster = GenerationParams {
            noise_zoom: 1.0,
            freq: 0.025,
            ..zoomed.clone()
        };
        let base = GenerationParams {
            noise_zoom: 1.0,
            ..zoomed.clone()
        };

        let a = generate_heights_for_chunk(&table, &zoomed, 16, 16, 0.0, 0.0);
        let b = generate_heights_for_chunk(&table, &faster, 16, 16, 0.0, 0.0);
        let c = generate_heights_for_chunk(&table, &base, 16, 16, 0.0, 0.0);

        assert_fields_close(&a, &b, 1e-4);
        assert!(a.iter().zip(&c).any(|(x, y)| (x - y).abs() > 1e-3));
    }

    #[test]
    fn test_generator_reuses_table() {
        let table = NoiseTable::new(3);
        let generator = TerrainGenerator::new(&table);
        assert_eq!(generator.noise().seed(), 3);

        let params = flat_params();
        let a = generator.generate_heights(&params, 8, 8, Vec2::ZERO);
        let b = generate_heights_for_chunk(&table, &params, 8, 8, 0.0, 0.0);
        assert_eq!(a, b);
    }
}
