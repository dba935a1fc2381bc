//! Error types for grids, worlds and render configuration.

use std::io;

use thiserror::Error;

use crate::world::Layer;

#[derive(Debug, Error)]
pub enum GridError {
    #[error("coordinates ({x}, {y}) are outside a grid of side {side}")]
    OutOfBounds { x: usize, y: usize, side: usize },

    #[error("grid size 2^{power_of_two} is not supported")]
    InvalidSize { power_of_two: u32 },

    #[error("store returned {actual} cells for a grid of side {side}")]
    SizeMismatch { side: usize, actual: usize },

    #[error(transparent)]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{layer} layer has side {actual}, expected {expected}")]
    LayerSizeMismatch {
        layer: Layer,
        expected: usize,
        actual: usize,
    },

    #[error("{layer} layer: {source}")]
    Layer {
        layer: Layer,
        #[source]
        source: GridError,
    },

    #[error(transparent)]
    Grid(#[from] GridError),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl WorldError {
    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        WorldError::InvalidArgument(message.into())
    }

    pub(crate) fn layer_io(layer: Layer, source: io::Error) -> Self {
        WorldError::Layer {
            layer,
            source: GridError::Io(source),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}
