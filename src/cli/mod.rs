//! Command-line interface for argoml.
//!
//! Provides commands for compiling workflow documents and inspecting the
//! resolved configuration.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};

use crate::adapters;
use crate::config::{self, ResolvedConfig};
use crate::core::{Compiler, FixedSuffixes, RandomSuffix, SuffixSource, Variant};

/// argoml - Compile ML build-and-serve workflows for Argo
#[derive(Parser, Debug)]
#[command(name = "argoml")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Compile a workflow document
    Compile {
        /// Workflow shape to compile
        #[arg(value_enum)]
        variant: VariantArg,

        /// Config file (searches for .argoml/config.yaml if not provided)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "yaml")]
        format: FormatArg,

        /// Output file (writes to stdout if not provided)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Override the model type
        #[arg(long)]
        model_type: Option<String>,

        /// Override the model path (comma-separated for serve)
        #[arg(long)]
        model_path: Option<String>,

        /// Use a fixed name suffix instead of a random one
        #[arg(long, env = "ARGOML_SUFFIX")]
        suffix: Option<String>,
    },

    /// Show resolved configuration (debug)
    Config {
        /// Config file (searches for .argoml/config.yaml if not provided)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

/// Workflow shape for CLI (maps to Variant)
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum VariantArg {
    /// Train, then build and serve
    BuildServe,

    /// Train only
    Build,

    /// Build and serve trained models
    Serve,
}

impl From<VariantArg> for Variant {
    fn from(v: VariantArg) -> Self {
        match v {
            VariantArg::BuildServe => Variant::BuildServe,
            VariantArg::Build => Variant::Build,
            VariantArg::Serve => Variant::Serve,
        }
    }
}

/// Output format for CLI
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FormatArg {
    Yaml,
    Json,
}

impl FormatArg {
    fn name(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Commands::Compile {
                variant,
                config,
                format,
                output,
                model_type,
                model_path,
                suffix,
            } => {
                let overrides = Overrides {
                    model_type,
                    model_path,
                };
                compile(
                    variant.into(),
                    config.as_deref(),
                    format,
                    output,
                    overrides,
                    suffix,
                )
                .await
            }
            Commands::Config { config } => show_config(config.as_deref()).await,
        }
    }
}

/// Command-line values that take precedence over config and environment
#[derive(Debug, Default)]
struct Overrides {
    model_type: Option<String>,
    model_path: Option<String>,
}

/// Compile a workflow and write it out
async fn compile(
    variant: Variant,
    config_path: Option<&Path>,
    format: FormatArg,
    output: Option<PathBuf>,
    overrides: Overrides,
    suffix: Option<String>,
) -> Result<()> {
    let ResolvedConfig { mut workflow, .. } = config::load(config_path)?;
    if let Some(model_type) = overrides.model_type {
        workflow.model_type = Some(model_type);
    }
    if let Some(model_path) = overrides.model_path {
        workflow.model_path = Some(model_path);
    }

    let fixed;
    let random = RandomSuffix;
    let suffixes: &dyn SuffixSource = match suffix {
        Some(value) => {
            fixed = FixedSuffixes::single(value);
            &fixed
        }
        None => &random,
    };

    let document = Compiler::new(suffixes)
        .compile(variant, &workflow)
        .with_context(|| format!("Failed to compile {} workflow", variant))?;

    let serializer = adapters::serializer_for(format.name())
        .with_context(|| format!("No serializer for format: {}", format.name()))?;
    let rendered = serializer.serialize(&document)?;
    let digest = adapters::fingerprint(&rendered);

    match output {
        Some(path) => {
            tokio::fs::write(&path, &rendered)
                .await
                .with_context(|| format!("Failed to write workflow file: {}", path.display()))?;
            tracing::info!(path = %path.display(), %digest, "Workflow written");
        }
        None => {
            print!("{}", rendered);
            tracing::info!(%digest, format = serializer.format(), "Workflow written to stdout");
        }
    }

    Ok(())
}

/// Show the resolved configuration
async fn show_config(config_path: Option<&Path>) -> Result<()> {
    let cfg = config::load(config_path)?;

    println!("argoml configuration");
    println!();
    println!(
        "Config file: {}",
        cfg.config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();

    let workflow = &cfg.workflow;
    println!("Runners:");
    println!("  Feature engineering: {}", workflow.feature_runner());
    println!("  Training:            {}", workflow.training_runner());
    println!();
    println!("Optional images:");
    println!("  Stats:     {}", if workflow.enable_stats { "enabled" } else { "disabled" });
    println!("  Processor: {}", if workflow.enable_processor { "enabled" } else { "disabled" });
    println!();
    println!("Values:");
    let yaml = serde_yaml::to_string(workflow).context("Failed to render configuration")?;
    for line in yaml.lines() {
        println!("  {}", line);
    }

    Ok(())
}
