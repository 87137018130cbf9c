//! Terrain generation module.
//!
//! Turns generation parameters and a shared noise table into per-chunk height
//! fields, then lays chunks out on a world-space grid.

mod chunk_grid;
mod crest;
mod generator;
mod heightfield;
mod params;

pub use chunk_grid::{chunk_world_offset, generate_chunk_grid, ChunkGrid};
pub use crest::CrestFilter;
pub use generator::{
    generate_heights_for_chunk, vertex_world_position, DomainWarp, TerrainGenerator,
};
pub use heightfield::{height_range, HeightField};
pub use params::{GenerationParams, ViewSettings};
