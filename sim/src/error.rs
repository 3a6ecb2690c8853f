//! Recoverable errors surfaced to the host.
//!
//! Engine invariant violations (missing components, a broken collision
//! frame, a bad timestep) are bugs and panic instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("level layout has no rows")]
    EmptyLevel,
    #[error("level row {row} has {found} tiles, expected {expected}")]
    RaggedRow { row: usize, found: usize, expected: usize },
    #[error("unknown tile code {code} at row {row}, column {col}")]
    UnknownTile { code: u32, row: usize, col: usize },
    #[error("level dimensions must be finite and positive, got {width}x{height}")]
    InvalidDimensions { width: f32, height: f32 },
    #[error("fixed timestep must be finite and positive, got {0}")]
    InvalidTimestep(f32),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
