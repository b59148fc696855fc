//! Errors raised by the generation pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("unknown activation: {name:?}")]
    UnknownActivation { name: String },

    #[error("activation list has {actual} entries but layers is {expected}")]
    ActivationCountMismatch { expected: usize, actual: usize },

    #[error("invalid resolution: width={width}, height={height}")]
    InvalidResolution { width: u32, height: u32 },

    #[error("invalid layer count: layers={layers} (must be at least 1)")]
    InvalidLayerCount { layers: usize },

    #[error("invalid hidden width: hidden_width={hidden_width} (must be at least 1)")]
    InvalidHiddenWidth { hidden_width: usize },

    #[error("failed to create output directory {}", .path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to encode image to {}", .path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl GenerationError {
    /// True for errors caught while validating parameters, before any
    /// array work starts.
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            Self::UnknownActivation { .. }
                | Self::ActivationCountMismatch { .. }
                | Self::InvalidResolution { .. }
                | Self::InvalidLayerCount { .. }
                | Self::InvalidHiddenWidth { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, GenerationError>;
