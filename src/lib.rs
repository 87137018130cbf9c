//! Procedural dune and ridge height-field generator.
//!
//! A seeded gradient-noise table feeds plain or ridged fractal noise, which a
//! per-vertex pipeline (anisotropy, rotation, domain warp, crest filtering)
//! turns into one height field per chunk of a world-space chunk grid.

pub mod config;
pub mod export;
pub mod noise;
pub mod terrain;

pub use noise::{init_noise, NoiseMode, NoiseTable};
pub use terrain::{
    generate_chunk_grid, generate_heights_for_chunk, ChunkGrid, GenerationParams, HeightField,
    TerrainGenerator,
};
