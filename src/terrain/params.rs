//! Generation parameters.

use serde::{Deserialize, Serialize};

use crate::noise::{FractalShape, NoiseMode};

/// Viewer-side settings persisted alongside the generation parameters.
///
/// The engine never reads these; they only travel through configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewSettings {
    /// Camera pitch in degrees.
    pub cam_rot_x: f32,
    /// Camera yaw in degrees.
    pub cam_rot_y: f32,
    /// Camera distance.
    pub cam_zoom: f32,
    pub cam_pan_x: f32,
    pub cam_pan_y: f32,
    /// Vertices hidden on each side when drawing a chunk.
    pub crop_left: u32,
    pub crop_right: u32,
    pub crop_top: u32,
    pub crop_bottom: u32,
    /// Filled triangles instead of wireframe.
    pub filled: bool,
}

impl Default for ViewSettings {
    fn default() -> Self {
        Self {
            cam_rot_x: 55.0,
            cam_rot_y: 35.0,
            cam_zoom: 280.0,
            cam_pan_x: 0.0,
            cam_pan_y: -30.0,
            crop_left: 0,
            crop_right: 0,
            crop_top: 0,
            crop_bottom: 0,
            filled: false,
        }
    }
}

/// Complete parameter snapshot for one generation call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    // Main noise
    /// Octaves of the main fractal (1-16).
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude multiplier per octave.
    pub gain: f32,
    /// Base sampling frequency applied after zoom.
    pub freq: f32,
    /// Vertical scale in world units.
    pub amp: f32,
    /// Plain or ridged fBm.
    pub noise_mode: NoiseMode,
    /// Negate heights after scaling.
    pub invert_z: bool,

    // Domain warp
    pub warp_enabled: bool,
    pub warp_freq: f32,
    pub warp_amp: f32,

    // Anisotropy
    pub stretch_x: f32,
    pub stretch_y: f32,
    pub rotation_deg: f32,

    // Ridge shape, reserved knobs not read by the generator yet
    pub ridge_bias: f32,
    pub ridge_pow: f32,
    pub ridge_gain: f32,
    pub ridge_lacunarity: f32,
    pub ridge_octaves: u32,
    pub ridge_attenuation: f32,

    // Exploration
    pub noise_offset_x: f32,
    pub noise_offset_y: f32,
    /// Sampling zoom, must stay strictly positive.
    pub noise_zoom: f32,

    // Crest post-filter
    /// Blend factor toward the local mean on crest cells, in [0, 1].
    pub crest_smoothing: f32,
    /// Push factor away from the local mean on crest cells, in [0, 1].
    pub crest_sharpen: f32,
    /// Averaging window radius in cells (>= 1).
    pub crest_width: f32,

    // Resolution
    /// Vertices per chunk along X.
    pub grid_width: u32,
    /// Vertices per chunk along Y.
    pub grid_height: u32,

    // World size per chunk
    pub terrain_width: f32,
    pub terrain_length: f32,

    // Chunk layout
    pub chunk_cols: u32,
    pub chunk_rows: u32,
    /// Spacing between chunks when drawn; does not affect sampling.
    pub chunk_gap_visual: f32,

    /// Presentation-only settings.
    pub view: ViewSettings,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            octaves: 5,
            lacunarity: 1.9,
            gain: 0.45,
            freq: 0.01,
            amp: 40.0,
            noise_mode: NoiseMode::Ridged,
            invert_z: false,

            warp_enabled: true,
            warp_freq: 0.008,
            warp_amp: 6.0,

            stretch_x: 1.0,
            stretch_y: 1.0,
            rotation_deg: 0.0,

            ridge_bias: 0.25,
            ridge_pow: 1.5,
            ridge_gain: 0.5,
            ridge_lacunarity: 2.0,
            ridge_octaves: 4,
            ridge_attenuation: 0.6,

            noise_offset_x: 0.0,
            noise_offset_y: 0.0,
            noise_zoom: 1.0,

            crest_smoothing: 0.0,
            crest_sharpen: 0.0,
            crest_width: 1.0,

            grid_width: 128,
            grid_height: 128,

            terrain_width: 128.0,
            terrain_length: 128.0,

            chunk_cols: 1,
            chunk_rows: 1,
            chunk_gap_visual: 1.0,

            view: ViewSettings::default(),
        }
    }
}

impl GenerationParams {
    /// Fractal shape of the main height noise.
    pub fn fractal_shape(&self) -> FractalShape {
        FractalShape::new(self.octaves, self.lacunarity, self.gain)
    }

    /// Number of chunks the grid builder will produce.
    pub fn chunk_count(&self) -> usize {
        self.chunk_cols.max(1) as usize * self.chunk_rows.max(1) as usize
    }

    /// Number of vertices in a single chunk.
    pub fn vertices_per_chunk(&self) -> usize {
        self.grid_width as usize * self.grid_height as usize
    }

    /// Clamps every field into the range the generator expects.
    ///
    /// This is the caller's responsibility; generation itself never validates.
    pub fn clamp_safety(&mut self) {
        self.grid_width = self.grid_width.max(2);
        self.grid_height = self.grid_height.max(2);
        self.terrain_width = self.terrain_width.max(1.0);
        self.terrain_length = self.terrain_length.max(1.0);
        self.noise_zoom = self.noise_zoom.max(0.0001);
        self.crest_width = self.crest_width.max(1.0);
        self.chunk_cols = self.chunk_cols.max(1);
        self.chunk_rows = self.chunk_rows.max(1);
        self.chunk_gap_visual = self.chunk_gap_visual.max(0.0);

        self.octaves = self.octaves.clamp(1, 16);
        self.ridge_octaves = self.ridge_octaves.clamp(1, 16);
    }

    /// Returns a clamped copy.
    pub fn sanitized(mut self) -> Self {
        self.clamp_safety();
        self
    }
}
