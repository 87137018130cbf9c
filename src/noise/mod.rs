//! Noise generation module for terrain synthesis.
//!
//! A seeded permutation table drives classic 2D gradient noise, which the
//! fractal layer sums into plain and ridged fBm.

mod fractal;
mod perlin;

pub use fractal::{fbm, ridged_fbm, FractalShape, NoiseMode};
pub use perlin::{init_noise, NoiseTable, DEFAULT_SEED};
