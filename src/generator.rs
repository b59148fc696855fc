//! Generation parameters and the end-to-end pipeline.
//!
//! `generate` validates a [`GenerationConfig`], builds the coordinate
//! features, propagates them through a freshly sampled random network and
//! normalizes the result into an [`OutputImage`]. Nothing is retained
//! between runs; the seed alone re-derives every weight.

use crate::activation::Activation;
use crate::coords::CoordinateTensor;
use crate::error::{GenerationError, Result};
use crate::network::{Network, NormalSampler, WeightSampler};
use crate::normalize::{normalize, NormalizationPolicy, OutputImage};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::info;

/// Separator between the fields of a canonical name.
pub const NAME_DELIMITER: &str = "-";

/// Placeholder used in names when layers use different activations.
pub const MIXED_LABEL: &str = "mixed";

/// Seed field of a canonical name when no seed was configured.
pub const UNSEEDED_LABEL: &str = "unseeded";

/// Which activation each layer uses, by identifier.
///
/// Identifiers are resolved at validation time, so an unknown name is
/// reported before any weights are drawn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ActivationSelection {
    /// One activation for every layer.
    Single(String),
    /// One activation per layer; length must equal the layer count.
    PerLayer(Vec<String>),
}

impl ActivationSelection {
    /// Parse a comma separated list. A single entry becomes `Single`.
    pub fn parse_list(list: &str) -> Self {
        let names: Vec<String> = list
            .split(',')
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty())
            .collect();
        match names.as_slice() {
            [single] => Self::Single(single.clone()),
            _ => Self::PerLayer(names),
        }
    }

    /// Label used in canonical names.
    pub fn label(&self) -> &str {
        match self {
            Self::Single(name) => name,
            Self::PerLayer(names) => {
                let distinct: HashSet<&str> = names.iter().map(String::as_str).collect();
                match names.first() {
                    Some(first) if distinct.len() == 1 => first.as_str(),
                    _ => MIXED_LABEL,
                }
            }
        }
    }

    /// Resolve to one activation per layer.
    pub fn resolve(&self, layers: usize) -> Result<Vec<Activation>> {
        match self {
            Self::Single(name) => Ok(vec![Activation::from_name(name)?; layers]),
            Self::PerLayer(names) => {
                if names.len() != layers {
                    return Err(GenerationError::ActivationCountMismatch {
                        expected: layers,
                        actual: names.len(),
                    });
                }
                names.iter().map(|name| Activation::from_name(name)).collect()
            }
        }
    }
}

impl From<&str> for ActivationSelection {
    fn from(name: &str) -> Self {
        Self::Single(name.to_string())
    }
}

impl From<Vec<String>> for ActivationSelection {
    fn from(names: Vec<String>) -> Self {
        Self::PerLayer(names)
    }
}

/// Number of output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColorMode {
    /// Three channels.
    #[default]
    Rgb,
    /// One channel.
    Grayscale,
}

impl ColorMode {
    pub fn channels(self) -> usize {
        match self {
            Self::Rgb => 3,
            Self::Grayscale => 1,
        }
    }

    /// Short tag used in canonical names.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Rgb => "RGB",
            Self::Grayscale => "BW",
        }
    }
}

/// Parameters of a single generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationConfig {
    pub width: u32,
    pub height: u32,
    /// Absent means the run draws fresh entropy and is not reproducible.
    pub seed: Option<u64>,
    pub layers: usize,
    pub hidden_width: usize,
    pub activation: ActivationSelection,
    #[serde(default)]
    pub color: ColorMode,
    #[serde(default)]
    pub normalization: NormalizationPolicy,
}

impl GenerationConfig {
    pub fn new(
        width: u32,
        height: u32,
        layers: usize,
        hidden_width: usize,
        activation: impl Into<ActivationSelection>,
    ) -> Self {
        Self {
            width,
            height,
            seed: None,
            layers,
            hidden_width,
            activation: activation.into(),
            color: ColorMode::default(),
            normalization: NormalizationPolicy::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_color(mut self, color: ColorMode) -> Self {
        self.color = color;
        self
    }

    pub fn with_normalization(mut self, policy: NormalizationPolicy) -> Self {
        self.normalization = policy;
        self
    }

    /// Check every parameter and resolve the layer plan.
    pub fn validate(&self) -> Result<Network> {
        if self.width == 0 || self.height == 0 {
            return Err(GenerationError::InvalidResolution {
                width: self.width,
                height: self.height,
            });
        }
        if self.layers == 0 {
            return Err(GenerationError::InvalidLayerCount {
                layers: self.layers,
            });
        }
        if self.hidden_width == 0 {
            return Err(GenerationError::InvalidHiddenWidth {
                hidden_width: self.hidden_width,
            });
        }
        let activations = self.activation.resolve(self.layers)?;
        Ok(Network::from_parts(
            &activations,
            self.hidden_width,
            self.color.channels(),
        ))
    }

    /// Canonical name: seed, activation, layers, hidden width and colour
    /// joined by [`NAME_DELIMITER`].
    pub fn describe(&self) -> String {
        let seed = self
            .seed
            .map_or_else(|| UNSEEDED_LABEL.to_string(), |seed| seed.to_string());
        [
            seed,
            self.activation.label().to_string(),
            self.layers.to_string(),
            self.hidden_width.to_string(),
            self.color.tag().to_string(),
        ]
        .join(NAME_DELIMITER)
    }

    /// Human readable settings report.
    pub fn details(&self) -> String {
        let seed = self
            .seed
            .map_or_else(|| UNSEEDED_LABEL.to_string(), |seed| seed.to_string());
        let activation = match &self.activation {
            ActivationSelection::Single(name) => name.clone(),
            ActivationSelection::PerLayer(names) => names.join(","),
        };
        [
            "Generator Settings:".to_string(),
            format!("    Resolution: {}x{}", self.width, self.height),
            format!("    Seed: {}", seed),
            format!("    Number of Layers: {}", self.layers),
            format!("    Hidden Layer Width: {}", self.hidden_width),
            format!("    Activation Function: {}", activation),
            format!("    Color: {}", self.color.tag()),
            format!("    Normalization: {}", self.normalization),
        ]
        .join("\n")
    }
}

impl fmt::Display for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.describe())
    }
}

/// Canonical descriptive name for `config`, used as a filename stem.
pub fn describe(config: &GenerationConfig) -> String {
    config.describe()
}

/// Run the full pipeline with a stream seeded from `config.seed`.
pub fn generate(config: &GenerationConfig) -> Result<OutputImage> {
    let network = config.validate()?;
    let coords = CoordinateTensor::new(config.width, config.height)?;
    let mut sampler = NormalSampler::from_seed(config.seed);
    Ok(run(config, &network, &coords, &mut sampler))
}

/// Like [`generate`], reusing a coordinate tensor built for the same
/// resolution.
pub fn generate_with_coords(
    config: &GenerationConfig,
    coords: &CoordinateTensor,
) -> Result<OutputImage> {
    let network = config.validate()?;
    if coords.width() != config.width || coords.height() != config.height {
        return Err(GenerationError::InvalidResolution {
            width: config.width,
            height: config.height,
        });
    }
    let mut sampler = NormalSampler::from_seed(config.seed);
    Ok(run(config, &network, coords, &mut sampler))
}

/// Like [`generate`], drawing weights from a caller supplied sampler.
/// `config.seed` is ignored.
pub fn generate_with_sampler<S>(config: &GenerationConfig, sampler: &mut S) -> Result<OutputImage>
where
    S: WeightSampler + ?Sized,
{
    let network = config.validate()?;
    let coords = CoordinateTensor::new(config.width, config.height)?;
    Ok(run(config, &network, &coords, sampler))
}

fn run<S>(
    config: &GenerationConfig,
    network: &Network,
    coords: &CoordinateTensor,
    sampler: &mut S,
) -> OutputImage
where
    S: WeightSampler + ?Sized,
{
    info!(
        name = %config.describe(),
        width = config.width,
        height = config.height,
        policy = %config.normalization,
        "generating"
    );
    let raw = network.propagate(coords.features(), sampler);
    normalize(&raw, config.width, config.height, config.normalization)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;

    struct CountingSampler {
        calls: usize,
    }

    impl WeightSampler for CountingSampler {
        fn sample(&mut self, rows: usize, cols: usize) -> Array2<f64> {
            self.calls += 1;
            Array2::zeros((rows, cols))
        }
    }

    fn base() -> GenerationConfig {
        GenerationConfig::new(8, 6, 3, 4, "tanh").with_seed(42)
    }

    #[test]
    fn test_describe_format() {
        assert_eq!(base().describe(), "42-tanh-3-4-RGB");
        let mono = base().with_color(ColorMode::Grayscale);
        assert_eq!(describe(&mono), "42-tanh-3-4-BW");
    }

    #[test]
    fn test_describe_without_seed() {
        let config = GenerationConfig::new(8, 6, 2, 4, "relu");
        assert_eq!(config.describe(), "unseeded-relu-2-4-RGB");
    }

    #[test]
    fn test_describe_mixed_activations() {
        let mut config = base();
        config.activation = ActivationSelection::parse_list("tanh,relu,tanh");
        assert_eq!(config.describe(), "42-mixed-3-4-RGB");
    }

    #[test]
    fn test_describe_uniform_per_layer_list_uses_name() {
        let mut config = base();
        config.activation = vec!["sech".to_string(); 3].into();
        assert_eq!(config.describe(), "42-sech-3-4-RGB");
    }

    #[test]
    fn test_describe_ignores_normalization() {
        let signed = base();
        let unsigned = base().with_normalization(NormalizationPolicy::Unsigned);
        assert_eq!(signed.describe(), unsigned.describe());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            ActivationSelection::parse_list("tanh"),
            ActivationSelection::Single("tanh".to_string())
        );
        assert_eq!(
            ActivationSelection::parse_list("tanh, relu"),
            ActivationSelection::PerLayer(vec!["tanh".to_string(), "relu".to_string()])
        );
    }

    #[test]
    fn test_validation_errors_name_field() {
        let err = GenerationConfig::new(0, 4, 1, 1, "tanh").validate().unwrap_err();
        assert!(err.to_string().contains("width=0"));

        let err = GenerationConfig::new(4, 4, 0, 1, "tanh").validate().unwrap_err();
        assert!(matches!(err, GenerationError::InvalidLayerCount { layers: 0 }));

        let err = GenerationConfig::new(4, 4, 2, 0, "tanh").validate().unwrap_err();
        assert!(matches!(
            err,
            GenerationError::InvalidHiddenWidth { hidden_width: 0 }
        ));
    }

    #[test]
    fn test_length_mismatch_fails_before_sampling() {
        let mut config = base();
        config.activation = ActivationSelection::parse_list("tanh,relu");
        let mut sampler = CountingSampler { calls: 0 };

        let err = generate_with_sampler(&config, &mut sampler).unwrap_err();

        assert!(matches!(
            err,
            GenerationError::ActivationCountMismatch {
                expected: 3,
                actual: 2
            }
        ));
        assert_eq!(sampler.calls, 0);
    }

    #[test]
    fn test_unknown_activation_fails_before_sampling() {
        let mut config = base();
        config.activation = ActivationSelection::parse_list("tanh,bogus,tanh");
        let mut sampler = CountingSampler { calls: 0 };

        let err = generate_with_sampler(&config, &mut sampler).unwrap_err();

        assert!(matches!(err, GenerationError::UnknownActivation { ref name } if name == "bogus"));
        assert_eq!(sampler.calls, 0);
    }

    #[test]
    fn test_sampler_called_once_per_layer() {
        let mut sampler = CountingSampler { calls: 0 };
        let image = generate_with_sampler(&base(), &mut sampler).unwrap();
        assert_eq!(sampler.calls, 3);
        // Zero weights give tanh(0) = 0, the middle of the signed range.
        assert!(image.pixels().iter().all(|&v| v == 127));
    }

    #[test]
    fn test_coords_resolution_must_match() {
        let coords = CoordinateTensor::new(4, 4).unwrap();
        let err = generate_with_coords(&base(), &coords).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::InvalidResolution {
                width: 8,
                height: 6
            }
        ));
    }

    #[test]
    fn test_reused_coords_match_fresh_generation() {
        let config = base();
        let coords = CoordinateTensor::new(8, 6).unwrap();
        assert_eq!(
            generate_with_coords(&config, &coords).unwrap(),
            generate(&config).unwrap()
        );
    }

    #[test]
    fn test_details_lists_settings() {
        let details = base().details();
        assert!(details.contains("Seed: 42"));
        assert!(details.contains("Number of Layers: 3"));
        assert!(details.contains("Activation Function: tanh"));
    }

    #[test]
    fn test_config_serde_accepts_string_or_list() {
        let single: GenerationConfig = serde_json::from_str(
            r#"{"width":2,"height":2,"seed":7,"layers":1,"hidden_width":1,"activation":"relu"}"#,
        )
        .unwrap();
        assert_eq!(single.activation, ActivationSelection::Single("relu".into()));
        assert_eq!(single.color, ColorMode::Rgb);

        let list: GenerationConfig = serde_json::from_str(
            r#"{"width":2,"height":2,"seed":null,"layers":2,"hidden_width":1,
                "activation":["relu","tanh"],"color":"grayscale"}"#,
        )
        .unwrap();
        assert_eq!(list.activation.label(), MIXED_LABEL);
        assert_eq!(list.color, ColorMode::Grayscale);
    }
}
