//! Batch generation.
//!
//! A batch draws many independent parameter sets and renders them in
//! parallel. Image `i` takes its parameters from its own stream, seeded by
//! hashing the batch seed with `i`, so a batch seed reproduces the whole
//! batch regardless of worker count or completion order. Every render then
//! seeds its own weight stream from its plan; no stream is ever shared.

use crate::config::BatchConfig;
use crate::coords::CoordinateTensor;
use crate::generator::{generate_with_coords, ActivationSelection, ColorMode, GenerationConfig};
use crate::normalize::NormalizationPolicy;
use crate::output::{output_path, write_image, write_params};
use anyhow::{bail, Context, Result};
use rand::distributions::{Distribution, WeightedIndex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use tracing::{info, warn};

/// Draws per-image [`GenerationConfig`]s for a batch.
#[derive(Debug, Clone)]
pub struct BatchPlanner {
    settings: BatchConfig,
    width: u32,
    height: u32,
    batch_seed: u64,
    color: ColorMode,
    normalization: NormalizationPolicy,
    forced_activation: Option<String>,
    names: Vec<String>,
    weights: WeightedIndex<u32>,
}

impl BatchPlanner {
    pub fn new(settings: BatchConfig, width: u32, height: u32, batch_seed: u64) -> Result<Self> {
        if settings.seed_min > settings.seed_max {
            bail!(
                "batch seed range is empty: {}..={}",
                settings.seed_min,
                settings.seed_max
            );
        }
        if settings.min_layers == 0 || settings.min_layers > settings.max_layers {
            bail!(
                "batch layer range is invalid: {}..={}",
                settings.min_layers,
                settings.max_layers
            );
        }
        if settings.min_hidden_width == 0 || settings.min_hidden_width > settings.max_hidden_width {
            bail!(
                "batch hidden width range is invalid: {}..={}",
                settings.min_hidden_width,
                settings.max_hidden_width
            );
        }
        if !(0.0..=1.0).contains(&settings.mixed_probability) {
            bail!(
                "mixed_probability must be within 0..=1, got {}",
                settings.mixed_probability
            );
        }

        let names: Vec<String> = settings.activations.iter().map(|a| a.name.clone()).collect();
        let weights = WeightedIndex::new(settings.activations.iter().map(|a| a.weight))
            .context("batch activation table needs at least one positive weight")?;
        let color = if settings.color {
            ColorMode::Rgb
        } else {
            ColorMode::Grayscale
        };

        Ok(Self {
            settings,
            width,
            height,
            batch_seed,
            color,
            normalization: NormalizationPolicy::default(),
            forced_activation: None,
            names,
            weights,
        })
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    pub fn with_normalization(mut self, policy: NormalizationPolicy) -> Self {
        self.normalization = policy;
        self
    }

    /// Use `activation` for every layer of every image.
    pub fn with_activation(mut self, activation: impl Into<String>) -> Self {
        self.forced_activation = Some(activation.into());
        self
    }

    pub fn count(&self) -> usize {
        self.settings.count
    }

    fn image_rng(&self, index: usize) -> ChaCha8Rng {
        let mut hasher = Sha256::new();
        hasher.update(self.batch_seed.to_le_bytes());
        hasher.update((index as u64).to_le_bytes());
        ChaCha8Rng::from_seed(hasher.finalize().into())
    }

    /// Parameters for image `index`.
    pub fn plan(&self, index: usize) -> GenerationConfig {
        let s = &self.settings;
        let mut rng = self.image_rng(index);

        let seed = rng.gen_range(s.seed_min..=s.seed_max);
        let layers = rng.gen_range(s.min_layers..=s.max_layers);
        let hidden_width = rng.gen_range(s.min_hidden_width..=s.max_hidden_width);

        let activation = match &self.forced_activation {
            Some(name) => ActivationSelection::Single(name.clone()),
            None if rng.gen_bool(s.mixed_probability) => ActivationSelection::PerLayer(
                (0..layers)
                    .map(|_| self.names[self.weights.sample(&mut rng)].clone())
                    .collect(),
            ),
            None => {
                let index = rng.gen_range(0..self.names.len());
                ActivationSelection::Single(self.names[index].clone())
            }
        };

        GenerationConfig::new(self.width, self.height, layers, hidden_width, activation)
            .with_seed(seed)
            .with_color(self.color)
            .with_normalization(self.normalization)
    }

    /// Parameters for every image in the batch.
    pub fn plans(&self) -> Vec<GenerationConfig> {
        (0..self.count()).map(|index| self.plan(index)).collect()
    }
}

/// Where and how batch images are written.
#[derive(Debug, Clone)]
pub struct BatchOutput {
    pub directory: PathBuf,
    pub format: String,
    pub quality: u8,
    pub save_params: bool,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Written image paths, in plan order.
    pub written: Vec<PathBuf>,
    /// Plan index and error message of every image that failed.
    pub failed: Vec<(usize, String)>,
}

/// Render and write every planned image on a rayon pool of `jobs` threads
/// (rayon's default when `None`). One failing image does not stop the rest.
pub fn run_batch(
    planner: &BatchPlanner,
    output: &BatchOutput,
    jobs: Option<usize>,
) -> Result<BatchSummary> {
    let plans = planner.plans();
    let total = plans.len();
    let coords = CoordinateTensor::new(planner.width, planner.height)?;

    let mut builder = rayon::ThreadPoolBuilder::new();
    if let Some(jobs) = jobs {
        builder = builder.num_threads(jobs);
    }
    let pool = builder.build().context("failed to start batch worker pool")?;

    let results: Vec<(usize, Result<PathBuf>)> = pool.install(|| {
        plans
            .par_iter()
            .enumerate()
            .map(|(index, config)| {
                info!(
                    "image {}/{}: layers={} hidden_width={} activation={}",
                    index + 1,
                    total,
                    config.layers,
                    config.hidden_width,
                    config.activation.label()
                );
                (index, render_one(config, &coords, output))
            })
            .collect()
    });

    let mut summary = BatchSummary::default();
    for (index, result) in results {
        match result {
            Ok(path) => summary.written.push(path),
            Err(err) => {
                warn!("image {} failed: {:#}", index + 1, err);
                summary.failed.push((index, format!("{err:#}")));
            }
        }
    }
    Ok(summary)
}

fn render_one(
    config: &GenerationConfig,
    coords: &CoordinateTensor,
    output: &BatchOutput,
) -> Result<PathBuf> {
    let image = generate_with_coords(config, coords)?;
    let path = output_path(&output.directory, config, &output.format);
    write_image(&image, &path, output.quality)?;
    if output.save_params {
        write_params(config, &path.with_extension("json"))?;
    }
    Ok(path)
}
