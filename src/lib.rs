//! Neurogram - images from untrained, randomly weighted neural networks.
//!
//! Every pixel's centred `(row, col, radius)` coordinates are pushed through
//! a stack of dense layers whose weights are drawn fresh from a seeded
//! standard-normal stream. The final layer's activations become pixel
//! intensities. Nothing is trained; the seed is the whole artwork.

pub mod activation;
pub mod batch;
pub mod config;
pub mod coords;
pub mod error;
pub mod generator;
pub mod network;
pub mod normalize;
pub mod output;

pub use activation::Activation;
pub use config::NeurogramConfig;
pub use coords::CoordinateTensor;
pub use error::GenerationError;
pub use generator::{
    describe, generate, generate_with_coords, generate_with_sampler, ActivationSelection,
    ColorMode, GenerationConfig,
};
pub use network::{NormalSampler, WeightSampler};
pub use normalize::{NormalizationPolicy, OutputImage};
