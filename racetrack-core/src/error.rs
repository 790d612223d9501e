use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed loading track image {path}: {source}")]
    TrackLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("track has zero area ({width}x{height})")]
    EmptyTrack { width: u32, height: u32 },

    #[error("controller {index} emits {actual} action scores, expected {expected}")]
    DegenerateController {
        index: usize,
        expected: usize,
        actual: usize,
    },

    #[error("fitness slots ({fitness}) do not match controllers ({controllers})")]
    FitnessLenMismatch { controllers: usize, fitness: usize },

    #[error("generation has no controllers")]
    EmptyPopulation,

    #[error("invalid simulation config: {0}")]
    InvalidConfig(String),
}
