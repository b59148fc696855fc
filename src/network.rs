//! Forward propagation through an untrained, randomly weighted network.
//!
//! Weights are never stored: every layer samples a fresh standard-normal
//! matrix from the run's random stream, multiplies, applies its activation
//! and hands the result on. Sampling happens once per layer in increasing
//! layer order, so a seeded stream reproduces the same image.

use crate::activation::Activation;
use ndarray::{Array2, ArrayView2};
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

/// Source of layer weight matrices.
pub trait WeightSampler {
    /// Draw a `(rows, cols)` weight matrix.
    fn sample(&mut self, rows: usize, cols: usize) -> Array2<f64>;
}

/// Standard-normal weights drawn from an owned random stream.
///
/// Each run owns its sampler, so concurrent runs never share a stream.
#[derive(Debug, Clone)]
pub struct NormalSampler<R = ChaCha8Rng> {
    rng: R,
}

impl NormalSampler<ChaCha8Rng> {
    /// Seeded stream, or fresh entropy when `seed` is absent.
    pub fn from_seed(seed: Option<u64>) -> Self {
        let seed = seed.unwrap_or_else(rand::random);
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> WeightSampler for NormalSampler<R> {
    fn sample(&mut self, rows: usize, cols: usize) -> Array2<f64> {
        Array2::random_using((rows, cols), StandardNormal, &mut self.rng)
    }
}

/// One layer of the network: its output width and activation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerSpec {
    pub output_width: usize,
    pub activation: Activation,
}

/// Validated layer plan. Interior layers are `hidden_width` wide, the last
/// layer emits one column per output channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    layers: Vec<LayerSpec>,
}

impl Network {
    /// Build the plan from already validated parameters. `activations` holds
    /// one entry per layer.
    pub(crate) fn from_parts(
        activations: &[Activation],
        hidden_width: usize,
        channels: usize,
    ) -> Self {
        let last = activations.len().saturating_sub(1);
        let layers = activations
            .iter()
            .enumerate()
            .map(|(index, &activation)| LayerSpec {
                output_width: if index == last { channels } else { hidden_width },
                activation,
            })
            .collect();
        Self { layers }
    }

    pub fn layers(&self) -> &[LayerSpec] {
        &self.layers
    }

    /// Width of the final layer.
    pub fn output_width(&self) -> usize {
        self.layers.last().map_or(0, |layer| layer.output_width)
    }

    /// Push `inputs` through every layer. Returns `(rows, output_width)`.
    pub fn propagate<S>(&self, inputs: ArrayView2<'_, f64>, sampler: &mut S) -> Array2<f64>
    where
        S: WeightSampler + ?Sized,
    {
        let total = self.layers.len();
        let mut current = inputs.to_owned();

        for (index, layer) in self.layers.iter().enumerate() {
            debug!("layer {}/{}", index + 1, total);
            let weights = sampler.sample(current.ncols(), layer.output_width);
            current = layer.activation.apply(current.dot(&weights));
        }

        current
    }
}
