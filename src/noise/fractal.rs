//! Multi-octave fractal Brownian motion (fBm) and ridged fBm.

use serde::{Deserialize, Serialize};

use super::perlin::NoiseTable;

/// Amplitude of the first octave for both fractal flavors.
const FIRST_OCTAVE_AMPLITUDE: f32 = 0.5;

/// Which fractal flavor drives the main height field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum NoiseMode {
    /// Plain fBm: smooth rolling terrain.
    Fbm,
    /// Ridged fBm: sharp crests, output clamped to [0, 1].
    #[default]
    Ridged,
}

impl NoiseMode {
    /// Samples the selected flavor at `(x, y)`.
    #[inline]
    pub fn sample(self, table: &NoiseTable, x: f32, y: f32, shape: &FractalShape) -> f32 {
        match self {
            NoiseMode::Fbm => fbm(table, x, y, shape.octaves, shape.lacunarity, shape.gain),
            NoiseMode::Ridged => {
                ridged_fbm(table, x, y, shape.octaves, shape.lacunarity, shape.gain)
            }
        }
    }

    pub fn is_ridged(self) -> bool {
        self == NoiseMode::Ridged
    }

    pub fn name(self) -> &'static str {
        match self {
            NoiseMode::Fbm => "fbm",
            NoiseMode::Ridged => "ridged",
        }
    }
}

/// Octave progression shared by [`fbm`] and [`ridged_fbm`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalShape {
    /// Number of octaves summed.
    pub octaves: u32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude multiplier per octave.
    pub gain: f32,
}

impl FractalShape {
    /// Shape used for the domain-warp displacement field.
    pub const WARP: FractalShape = FractalShape {
        octaves: 3,
        lacunarity: 2.0,
        gain: 0.5,
    };

    pub fn new(octaves: u32, lacunarity: f32, gain: f32) -> Self {
        Self {
            octaves,
            lacunarity,
            gain,
        }
    }
}

impl Default for FractalShape {
    fn default() -> Self {
        Self::new(5, 1.9, 0.45)
    }
}

/// Sums `octaves` attenuated noise samples.
///
/// Starts at amplitude 0.5 and frequency 1.0; after each octave the frequency
/// is multiplied by `lacunarity` and the amplitude by `gain`. Not normalized.
pub fn fbm(table: &NoiseTable, x: f32, y: f32, octaves: u32, lacunarity: f32, gain: f32) -> f32 {
    let mut amplitude = FIRST_OCTAVE_AMPLITUDE;
    let mut frequency = 1.0f32;
    let mut sum = 0.0f32;

    for _ in 0..octaves {
        sum += amplitude * table.evaluate(x * frequency, y * frequency);
        frequency *= lacunarity;
        amplitude *= gain;
    }

    sum
}

/// Ridged variant of [`fbm`]: each octave contributes `(1 - |n|)^2`.
///
/// The sum is clamped to [0, 1].
pub fn ridged_fbm(
    table: &NoiseTable,
    x: f32,
    y: f32,
    octaves: u32,
    lacunarity: f32,
    gain: f32,
) -> f32 {
    let mut amplitude = FIRST_OCTAVE_AMPLITUDE;
    let mut frequency = 1.0f32;
    let mut sum = 0.0f32;

    for _ in 0..octaves {
        let mut r = 1.0 - table.evaluate(x * frequency, y * frequency).abs();
        r *= r;
        sum += r * amplitude;
        frequency *= lacunarity;
        amplitude *= gain;
    }

    sum.clamp(0.0, 1.0)
}
