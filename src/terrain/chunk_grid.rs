//! Multi-chunk layout and generation.

use std::time::Instant;

use glam::Vec2;
use rayon::prelude::*;

use super::generator::TerrainGenerator;
use super::heightfield::{height_range, HeightField};
use super::params::GenerationParams;
use crate::noise::NoiseTable;

/// A `cols` x `rows` array of equally sized height fields.
///
/// Chunk `(col, row)` lives at index `row * cols + col`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChunkGrid {
    cols: u32,
    rows: u32,
    chunk_width: u32,
    chunk_height: u32,
    chunks: Vec<HeightField>,
}

impl ChunkGrid {
    /// Wraps already generated chunks.
    ///
    /// # Panics
    /// Panics if `chunks.len() != cols * rows` or any chunk is not
    /// `chunk_width * chunk_height` long.
    pub fn from_chunks(
        cols: u32,
        rows: u32,
        chunk_width: u32,
        chunk_height: u32,
        chunks: Vec<HeightField>,
    ) -> Self {
        assert_eq!(
            chunks.len(),
            cols as usize * rows as usize,
            "chunk count does not match a {}x{} grid",
            cols,
            rows
        );
        let expected = chunk_width as usize * chunk_height as usize;
        for (i, chunk) in chunks.iter().enumerate() {
            assert_eq!(
                chunk.len(),
                expected,
                "chunk {} has {} heights, expected {}x{}",
                i,
                chunk.len(),
                chunk_width,
                chunk_height
            );
        }

        Self {
            cols,
            rows,
            chunk_width,
            chunk_height,
            chunks,
        }
    }

    /// Flat index of chunk `(col, row)`.
    pub fn index(col: u32, row: u32, cols: u32) -> usize {
        row as usize * cols as usize + col as usize
    }

    pub fn cols(&self) -> u32 {
        self.cols
    }

    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Vertices per chunk along X.
    pub fn chunk_width(&self) -> u32 {
        self.chunk_width
    }

    /// Vertices per chunk along Y.
    pub fn chunk_height(&self) -> u32 {
        self.chunk_height
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty() || self.cols == 0 || self.rows == 0
    }

    /// Heights of chunk `(col, row)`, if in range.
    pub fn chunk(&self, col: u32, row: u32) -> Option<&HeightField> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.chunks.get(Self::index(col, row, self.cols))
    }

    /// Chunk `[0, 0]`, the one single-field consumers work with.
    pub fn primary(&self) -> Option<&HeightField> {
        self.chunk(0, 0)
    }

    pub fn chunks(&self) -> &[HeightField] {
        &self.chunks
    }

    pub fn into_chunks(self) -> Vec<HeightField> {
        self.chunks
    }

    /// Iterates `(col, row, heights)` in index order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &HeightField)> + '_ {
        let cols = self.cols.max(1);
        self.chunks
            .iter()
            .enumerate()
            .map(move |(i, chunk)| ((i as u32) % cols, (i as u32) / cols, chunk))
    }

    /// Global `(min, max)` across every chunk.
    pub fn height_range(&self) -> (f32, f32) {
        self.chunks
            .iter()
            .map(|chunk| height_range(chunk))
            .fold((f32::MAX, f32::MIN), |(min, max), (lo, hi)| {
                (min.min(lo), max.max(hi))
            })
    }
}

/// World offset of chunk `(col, row)` so the whole grid is centered on the origin.
pub fn chunk_world_offset(
    cols: u32,
    rows: u32,
    col: u32,
    row: u32,
    terrain_width: f32,
    terrain_length: f32,
) -> Vec2 {
    let center_cols = 0.5 * (cols as f32 - 1.0);
    let center_rows = 0.5 * (rows as f32 - 1.0);
    Vec2::new(
        (col as f32 - center_cols) * terrain_width,
        (row as f32 - center_rows) * terrain_length,
    )
}

/// Generates every chunk of the grid described by `params`.
///
/// Chunks are independent and generated in parallel; each one is recentered
/// over its own min/max only.
pub fn generate_chunk_grid(table: &NoiseTable, params: &GenerationParams) -> ChunkGrid {
    build_chunk_grid(&TerrainGenerator::new(table), params)
}

pub(super) fn build_chunk_grid(
    generator: &TerrainGenerator<'_>,
    params: &GenerationParams,
) -> ChunkGrid {
    let start = Instant::now();
    let cols = params.chunk_cols.max(1);
    let rows = params.chunk_rows.max(1);
    let (width, height) = (params.grid_width, params.grid_height);

    let chunks: Vec<HeightField> = (0..cols * rows)
        .into_par_iter()
        .map(|i| {
            let offset = chunk_world_offset(
                cols,
                rows,
                i % cols,
                i / cols,
                params.terrain_width,
                params.terrain_length,
            );
            generator.generate_heights(params, width, height, offset)
        })
        .collect();

    tracing::debug!(
        cols,
        rows,
        width,
        height,
        elapsed = ?start.elapsed(),
        "generated chunk grid"
    );

    ChunkGrid::from_chunks(cols, rows, width, height, chunks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::generator::vertex_world_position;

    fn small_params(cols: u32, rows: u32) -> GenerationParams {
        GenerationParams {
            grid_width: 12,
            grid_height: 10,
            chunk_cols: cols,
            chunk_rows: rows,
            ..Default::default()
        }
    }

    #[test]
    fn test_grid_shape() {
        let table = NoiseTable::new(1337);
        for (cols, rows) in [(1, 1), (2, 1), (3, 2), (1, 4)] {
            let grid = generate_chunk_grid(&table, &small_params(cols, rows));
            assert_eq!(grid.cols(), cols);
            assert_eq!(grid.rows(), rows);
            assert_eq!(grid.len(), (cols * rows) as usize);
            assert!(grid.chunks().iter().all(|c| c.len() == 120));
        }
    }

    #[test]
    fn test_zero_layout_resolves_to_one_chunk() {
        let table = NoiseTable::new(2);
        let grid = generate_chunk_grid(&table, &small_params(0, 0));
        assert_eq!(grid.cols(), 1);
        assert_eq!(grid.rows(), 1);
        assert_eq!(grid.len(), 1);
        assert!(!grid.is_empty());
    }

    #[test]
    fn test_default_grid_is_empty() {
        let grid = ChunkGrid::default();
        assert!(grid.is_empty());
        assert!(grid.primary().is_none());
    }

    #[test]
    fn test_chunk_offsets_centered() {
        assert_eq!(chunk_world_offset(1, 1, 0, 0, 128.0, 128.0), Vec2::ZERO);
        assert_eq!(chunk_world_offset(2, 1, 0, 0, 128.0, 128.0), Vec2::new(-64.0, 0.0));
        assert_eq!(chunk_world_offset(2, 1, 1, 0, 128.0, 128.0), Vec2::new(64.0, 0.0));
        assert_eq!(chunk_world_offset(3, 3, 0, 2, 10.0, 20.0), Vec2::new(-10.0, 20.0));
    }

    #[test]
    fn test_chunks_match_single_chunk_generation() {
        let table = NoiseTable::new(808);
        let params = small_params(3, 2);
        let grid = generate_chunk_grid(&table, &params);
        let generator = TerrainGenerator::new(&table);

        for (col, row, chunk) in grid.iter() {
            let offset = chunk_world_offset(3, 2, col, row, 128.0, 128.0);
            let expected = generator.generate_heights(&params, 12, 10, offset);
            assert_eq!(chunk, &expected, "chunk ({}, {})", col, row);
        }
    }

    #[test]
    fn test_generator_method_matches_free_function() {
        let table = NoiseTable::new(12);
        let params = small_params(2, 2);
        let a = TerrainGenerator::new(&table).generate_chunk_grid(&params);
        let b = generate_chunk_grid(&table, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn test_per_chunk_recentering_seam() {
        // Adjacent chunks sample the same world positions along their shared
        // edge, so with the crest filter off they differ there only by the
        // difference of their own recenter offsets.
        let table = NoiseTable::new(55);
        let params = GenerationParams {
            grid_width: 16,
            grid_height: 16,
            chunk_cols: 2,
            chunk_rows: 1,
            ..Default::default()
        };
        let grid = generate_chunk_grid(&table, &params);
        let left = grid.chunk(0, 0).unwrap();
        let right = grid.chunk(1, 0).unwrap();

        let w = 16usize;
        let deltas: Vec<f32> = (0..16)
            .map(|j| left[j * w + (w - 1)] - right[j * w])
            .collect();
        for d in &deltas {
            assert!((d - deltas[0]).abs() < 1e-3);
        }

        let left_offset = chunk_world_offset(2, 1, 0, 0, 128.0, 128.0);
        let right_offset = chunk_world_offset(2, 1, 1, 0, 128.0, 128.0);
        let left_edge = vertex_world_position(&params, 16, 16, 15, 3, left_offset);
        let right_edge = vertex_world_position(&params, 16, 16, 0, 3, right_offset);
        assert_eq!(left_edge, right_edge);
    }

    #[test]
    fn test_global_height_range() {
        let grid = ChunkGrid::from_chunks(
            2,
            1,
            2,
            1,
            vec![vec![-1.0, 0.5], vec![2.0, 0.0]],
        );
        assert_eq!(grid.height_range(), (-1.0, 2.0));
        assert_eq!(grid.chunk(1, 0), Some(&vec![2.0, 0.0]));
        assert_eq!(grid.chunk(2, 0), None);
    }

    #[test]
    fn test_iter_order() {
        let chunks = (0..6).map(|i| vec![i as f32]).collect();
        let grid = ChunkGrid::from_chunks(3, 2, 1, 1, chunks);
        let coords: Vec<(u32, u32)> = grid.iter().map(|(c, r, _)| (c, r)).collect();
        assert_eq!(coords, vec![(0, 0), (1, 0), (2, 0), (0, 1), (1, 1), (2, 1)]);
        assert_eq!(grid.chunk(2, 1), Some(&vec![5.0]));
    }

    #[test]
    #[should_panic(expected = "chunk count")]
    fn test_from_chunks_rejects_wrong_count() {
        ChunkGrid::from_chunks(2, 2, 1, 1, vec![vec![0.0]; 3]);
    }

    #[test]
    #[should_panic(expected = "expected 2x2")]
    fn test_from_chunks_rejects_wrong_size() {
        ChunkGrid::from_chunks(1, 2, 2, 2, vec![vec![0.0; 4], vec![0.0; 3]]);
    }
}
