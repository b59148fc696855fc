//! Configuration loading for Neurogram.
//!
//! Configuration is loaded from TOML files with environment variable overrides.
//! Environment keys nest with a double underscore, e.g.
//! `NEUROGRAM_OUTPUT__SAVE_PARAMS=true` or `NEUROGRAM_BATCH__MAX_LAYERS=7`.
//! These values only drive the CLI and batch glue; the generation core never
//! fills in defaults on its own.

use crate::generator::ColorMode;
use crate::normalize::NormalizationPolicy;
use anyhow::Result;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

pub const DEFAULT_CONFIG_FILE: &str = "config.default.toml";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct NeurogramConfig {
    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub random: RandomConfig,

    #[serde(default)]
    pub batch: BatchConfig,

    #[serde(default)]
    pub generator: GeneratorConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    #[serde(default = "default_directory")]
    pub directory: String,

    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_quality")]
    pub quality: u8,

    #[serde(default = "default_format")]
    pub format: String,

    #[serde(default)]
    pub save_params: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            width: default_width(),
            height: default_height(),
            quality: default_quality(),
            format: default_format(),
            save_params: false,
        }
    }
}

fn default_directory() -> String {
    "images".to_string()
}

fn default_width() -> u32 {
    1920
}

fn default_height() -> u32 {
    1080
}

fn default_quality() -> u8 {
    100
}

fn default_format() -> String {
    "jpg".to_string()
}

/// Ranges used by `single` for parameters left off the command line.
#[derive(Debug, Clone, Deserialize)]
pub struct RandomConfig {
    #[serde(default = "default_random_seed_max")]
    pub seed_max: u64,

    #[serde(default = "default_random_min_layers")]
    pub min_layers: usize,

    #[serde(default = "default_random_max_layers")]
    pub max_layers: usize,

    #[serde(default = "default_random_min_hidden_width")]
    pub min_hidden_width: usize,

    #[serde(default = "default_random_max_hidden_width")]
    pub max_hidden_width: usize,
}

impl Default for RandomConfig {
    fn default() -> Self {
        Self {
            seed_max: default_random_seed_max(),
            min_layers: default_random_min_layers(),
            max_layers: default_random_max_layers(),
            min_hidden_width: default_random_min_hidden_width(),
            max_hidden_width: default_random_max_hidden_width(),
        }
    }
}

fn default_random_seed_max() -> u64 {
    2_147_483_647
}

fn default_random_min_layers() -> usize {
    1
}

fn default_random_max_layers() -> usize {
    50
}

fn default_random_min_hidden_width() -> usize {
    1
}

fn default_random_max_hidden_width() -> usize {
    20
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    #[serde(default = "default_count")]
    pub count: usize,

    #[serde(default = "default_seed_min")]
    pub seed_min: u64,

    #[serde(default = "default_seed_max")]
    pub seed_max: u64,

    #[serde(default = "default_min_layers")]
    pub min_layers: usize,

    #[serde(default = "default_max_layers")]
    pub max_layers: usize,

    #[serde(default = "default_min_hidden_width")]
    pub min_hidden_width: usize,

    #[serde(default = "default_max_hidden_width")]
    pub max_hidden_width: usize,

    /// Chance that an image gets a per-layer activation list.
    #[serde(default = "default_mixed_probability")]
    pub mixed_probability: f64,

    #[serde(default = "default_batch_color")]
    pub color: bool,

    /// Activation identifiers and their relative weights.
    #[serde(default = "default_activations")]
    pub activations: Vec<WeightedActivation>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WeightedActivation {
    pub name: String,
    pub weight: u32,
}

impl WeightedActivation {
    pub fn new(name: &str, weight: u32) -> Self {
        Self {
            name: name.to_string(),
            weight,
        }
    }
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: default_count(),
            seed_min: default_seed_min(),
            seed_max: default_seed_max(),
            min_layers: default_min_layers(),
            max_layers: default_max_layers(),
            min_hidden_width: default_min_hidden_width(),
            max_hidden_width: default_max_hidden_width(),
            mixed_probability: default_mixed_probability(),
            color: default_batch_color(),
            activations: default_activations(),
        }
    }
}

fn default_count() -> usize {
    50
}

fn default_seed_min() -> u64 {
    1
}

fn default_seed_max() -> u64 {
    4_294_967_294
}

fn default_min_layers() -> usize {
    2
}

fn default_max_layers() -> usize {
    120
}

fn default_min_hidden_width() -> usize {
    3
}

fn default_max_hidden_width() -> usize {
    24
}

fn default_mixed_probability() -> f64 {
    0.5
}

fn default_batch_color() -> bool {
    true
}

fn default_activations() -> Vec<WeightedActivation> {
    vec![
        WeightedActivation::new("tanh", 50),
        WeightedActivation::new("relu", 20),
        WeightedActivation::new("sigmoid", 1),
        WeightedActivation::new("sech", 1),
    ]
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default = "default_activation")]
    pub activation: String,

    #[serde(default)]
    pub normalization: NormalizationPolicy,

    #[serde(default)]
    pub color: ColorMode,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            activation: default_activation(),
            normalization: NormalizationPolicy::default(),
            color: ColorMode::default(),
        }
    }
}

fn default_activation() -> String {
    "tanh".to_string()
}

impl NeurogramConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false))
            .add_source(File::from(path).required(false))
            .add_source(
                Environment::with_prefix("NEUROGRAM")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let neurogram_config: NeurogramConfig = config.try_deserialize()?;
        Ok(neurogram_config)
    }
}
