use thiserror::Error;

/// Errors that can occur during export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("Height data length {actual} does not match expected {expected}")]
    SizeMismatch { expected: usize, actual: usize },
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
    #[error("Atlas with a {gap} pixel gap exceeds the maximum image size")]
    AtlasTooLarge { gap: u32 },
    #[error("Chunk grid is empty")]
    EmptyGrid,
}
