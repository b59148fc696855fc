//! Neurogram CLI - render images from randomly weighted neural networks.

use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use neurogram::activation::Activation;
use neurogram::batch::{run_batch, BatchOutput, BatchPlanner};
use neurogram::config::{BatchConfig, NeurogramConfig};
use neurogram::generator::{generate, ActivationSelection, ColorMode, GenerationConfig};
use neurogram::normalize::NormalizationPolicy;
use neurogram::output::{output_path, write_image, write_params};
use rand::Rng;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "neurogram")]
#[command(about = "Generate images from untrained, randomly weighted neural networks")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(long, default_value = "neurogram.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Generate a single image
    Single {
        /// Seed for the weight stream (random if omitted)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Number of layers (random if omitted)
        #[arg(short, long)]
        layers: Option<usize>,

        /// Neurons in each hidden layer (random if omitted)
        #[arg(short, long)]
        width: Option<usize>,

        /// Output resolution
        #[arg(short, long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
        resolution: Option<Vec<u32>>,

        /// Activation for every layer, or a comma-separated list with one entry per layer
        #[arg(short, long)]
        activation: Option<String>,

        /// Single-channel output
        #[arg(long)]
        mono: bool,

        /// How raw activations map to intensities
        #[arg(long, value_enum)]
        normalization: Option<NormalizationArg>,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Also save the parameters as JSON
        #[arg(long)]
        save_params: bool,

        /// Print generator settings and per-layer progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// Generate many images with randomly drawn parameters
    Batch {
        /// Number of images (config `batch.count` if omitted)
        count: Option<usize>,

        /// Use this activation for every layer of every image
        #[arg(short, long)]
        activation: Option<String>,

        /// Output resolution
        #[arg(short, long, num_args = 2, value_names = ["WIDTH", "HEIGHT"])]
        resolution: Option<Vec<u32>>,

        /// Single-channel output
        #[arg(long)]
        mono: bool,

        /// How raw activations map to intensities
        #[arg(long, value_enum)]
        normalization: Option<NormalizationArg>,

        /// Batch seed; the same seed reproduces the whole batch
        #[arg(short = 'S', long)]
        seed: Option<u64>,

        /// Worker threads
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Output directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Also save each image's parameters as JSON
        #[arg(long)]
        save_params: bool,

        /// Log per-image and per-layer progress
        #[arg(short, long)]
        verbose: bool,
    },

    /// List the available activation functions
    Activations,
}

impl Commands {
    fn verbose(&self) -> bool {
        match self {
            Commands::Single { verbose, .. } | Commands::Batch { verbose, .. } => *verbose,
            Commands::Activations => false,
        }
    }
}

#[derive(Clone, Copy, ValueEnum, Debug, PartialEq, Eq)]
enum NormalizationArg {
    /// (1 + x) / 2, for activations centred on zero
    Signed,
    /// x as-is, for activations already in [0, 1]
    Unsigned,
}

impl NormalizationArg {
    fn to_policy(self) -> NormalizationPolicy {
        match self {
            NormalizationArg::Signed => NormalizationPolicy::Signed,
            NormalizationArg::Unsigned => NormalizationPolicy::Unsigned,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let directive = if cli.command.verbose() {
        "neurogram=debug"
    } else {
        "neurogram=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    let config = NeurogramConfig::load(Path::new(&cli.config))?;

    match cli.command {
        Commands::Single {
            seed,
            layers,
            width,
            resolution,
            activation,
            mono,
            normalization,
            output,
            save_params,
            verbose,
        } => {
            let random = &config.random;
            let mut rng = rand::thread_rng();

            let seed = seed.unwrap_or_else(|| rng.gen_range(0..=random.seed_max));
            let layers = match layers {
                Some(layers) => layers,
                None => pick(&mut rng, random.min_layers, random.max_layers, "layers")?,
            };
            let hidden_width = match width {
                Some(width) => width,
                None => pick(
                    &mut rng,
                    random.min_hidden_width,
                    random.max_hidden_width,
                    "hidden width",
                )?,
            };
            let (width, height) = resolve_resolution(resolution, &config);
            let activation = ActivationSelection::parse_list(
                activation.as_deref().unwrap_or(&config.generator.activation),
            );
            let color = if mono {
                ColorMode::Grayscale
            } else {
                config.generator.color
            };
            let normalization = normalization
                .map(NormalizationArg::to_policy)
                .unwrap_or(config.generator.normalization);

            let gen_config = GenerationConfig::new(width, height, layers, hidden_width, activation)
                .with_seed(seed)
                .with_color(color)
                .with_normalization(normalization);

            if verbose {
                println!("{}", gen_config.details());
            }
            println!("Generating {}...", gen_config.describe());

            let image = generate(&gen_config)?;

            let output_dir = PathBuf::from(&config.output.directory);
            let output_path = output
                .unwrap_or_else(|| output_path(&output_dir, &gen_config, &config.output.format));

            write_image(&image, &output_path, config.output.quality)?;
            println!("Saved to {}", output_path.display());

            if save_params || config.output.save_params {
                let params_path = output_path.with_extension("json");
                write_params(&gen_config, &params_path)?;
                println!("Saved parameters to {}", params_path.display());
            }
        }

        Commands::Batch {
            count,
            activation,
            resolution,
            mono,
            normalization,
            seed,
            jobs,
            output_dir,
            save_params,
            ..
        } => {
            let (width, height) = resolve_resolution(resolution, &config);
            let batch_seed = seed.unwrap_or_else(rand::random);
            let settings = batch_settings(count, &config);
            let count = settings.count;

            let mut planner = BatchPlanner::new(settings, width, height, batch_seed)?;
            if let Some(activation) = activation {
                activation.parse::<Activation>()?;
                planner = planner.with_activation(activation);
            }
            if mono {
                planner = planner.with_color(ColorMode::Grayscale);
            }
            planner = planner.with_normalization(
                normalization
                    .map(NormalizationArg::to_policy)
                    .unwrap_or(config.generator.normalization),
            );

            let output = BatchOutput {
                directory: output_dir.unwrap_or_else(|| PathBuf::from(&config.output.directory)),
                format: config.output.format.clone(),
                quality: config.output.quality,
                save_params: save_params || config.output.save_params,
            };

            println!(
                "Generating {} images at {}x{} with batch seed {}...",
                count, width, height, batch_seed
            );

            let summary = run_batch(&planner, &output, jobs)?;
            for path in &summary.written {
                println!("  Created {}", path.display());
            }

            if !summary.failed.is_empty() {
                for (index, message) in &summary.failed {
                    eprintln!("  Image {} failed: {}", index + 1, message);
                }
                bail!("{} of {} images failed", summary.failed.len(), count);
            }
            println!("Done! Batch saved to {}", output.directory.display());
        }

        Commands::Activations => {
            for name in Activation::names() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

fn resolve_resolution(resolution: Option<Vec<u32>>, config: &NeurogramConfig) -> (u32, u32) {
    match resolution.as_deref() {
        Some([width, height]) => (*width, *height),
        _ => (config.output.width, config.output.height),
    }
}

fn batch_settings(count: Option<usize>, config: &NeurogramConfig) -> BatchConfig {
    BatchConfig {
        count: count.unwrap_or(config.batch.count),
        ..config.batch.clone()
    }
}

fn pick(rng: &mut impl Rng, min: usize, max: usize, what: &str) -> Result<usize> {
    if min > max {
        bail!("configured {} range is empty: {}..={}", what, min, max);
    }
    Ok(rng.gen_range(min..=max))
}
