use std::path::PathBuf;

use thiserror::Error;

/// Invalid startup configuration. Always fatal: the pipeline never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("zone '{0}' is defined more than once")]
    DuplicateZone(String),
    #[error("zone '{name}' has degenerate bounds ({x1},{y1})-({x2},{y2}); need x1 < x2 and y1 < y2")]
    DegenerateZone {
        name: String,
        x1: i32,
        y1: i32,
        x2: i32,
        y2: i32,
    },
    #[error("zone '{0}' has a capacity of 0; omit it or use at least 1")]
    ZeroCapacity(String),
    #[error("working resolution must be non-zero, got {width}x{height}")]
    InvalidResolution { width: u32, height: u32 },
    #[error("invalid detector parameter: {0}")]
    InvalidDetectorParameter(String),
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}
