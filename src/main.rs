//! retrograph CLI: RetroPath2.0 results to a pruned reaction network.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use miette::Result;

use retrograph::config::PipelineConfig;
use retrograph::enrich::StaticTemplates;
use retrograph::export::{OutputFormat, write_network, write_reactions};
use retrograph::ingest::read_rows_from_path;
use retrograph::pipeline::Pipeline;

#[derive(Parser)]
#[command(
    name = "retrograph",
    version,
    about = "Build source-to-sink reaction networks from RetroPath2.0 results"
)]
struct Cli {
    /// Pipeline configuration file (TOML).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build, prune and export the network.
    Build {
        /// RetroPath2.0 results (CSV).
        rp2_results: PathBuf,

        #[command(flatten)]
        overrides: Overrides,

        /// JSON table mapping rule ids to template reaction ids.
        #[arg(long)]
        templates: Option<PathBuf>,

        /// Output format.
        #[arg(long, value_enum, default_value = "json")]
        format: Format,

        /// Output path: a file for `json`, a directory for `script`.
        #[arg(long, default_value = "network.json")]
        output: PathBuf,

        /// Also write every reaction, as oriented in the network, to this TSV file.
        #[arg(long)]
        reactions_tsv: Option<PathBuf>,
    },

    /// Print network statistics before and after pruning.
    Stats {
        /// RetroPath2.0 results (CSV).
        rp2_results: PathBuf,

        #[command(flatten)]
        overrides: Overrides,
    },

    /// Write the default configuration to a TOML file.
    InitConfig {
        /// Destination path.
        path: PathBuf,
    },
}

#[derive(clap::Args)]
struct Overrides {
    /// Target node id.
    #[arg(long)]
    target: Option<String>,

    /// Structural descriptor to exclude from paths (repeatable).
    /// Replaces the configured exclusion list.
    #[arg(long = "exclude")]
    exclude: Vec<String>,

    /// Read reactions in the direction they are written.
    #[arg(long)]
    no_reverse: bool,
}

impl Overrides {
    fn apply(self, config: &mut PipelineConfig) {
        if let Some(target) = self.target {
            config.target_id = target;
        }
        if !self.exclude.is_empty() {
            config.excluded = self.exclude;
        }
        if self.no_reverse {
            config.reverse = false;
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Json,
    Script,
}

impl From<Format> for OutputFormat {
    fn from(f: Format) -> Self {
        match f {
            Format::Json => OutputFormat::Json,
            Format::Script => OutputFormat::Script,
        }
    }
}

fn load_config(path: Option<&PathBuf>, overrides: Overrides) -> Result<PipelineConfig> {
    let mut config = match path {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    overrides.apply(&mut config);
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(3)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set (e.g., in tests)

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Build {
            rp2_results,
            overrides,
            templates,
            format,
            output,
            reactions_tsv,
        } => {
            let config = load_config(cli.config.as_ref(), overrides)?;
            let rows = read_rows_from_path(&rp2_results)?;

            let mut pipeline = Pipeline::new(config);
            if let Some(path) = templates {
                pipeline = pipeline.with_templates(StaticTemplates::load(&path)?);
            }
            let result = pipeline.run(rows)?;

            if let Some(path) = reactions_tsv {
                write_reactions(&result.transformations, &result.registry, false, &path)?;
                println!("Wrote {}", path.display());
            }

            let export = result.export();
            if export.is_empty() {
                tracing::warn!("exporting an empty network");
            }
            let json = export.to_json()?;
            let written = write_network(&json, &output, format.into())?;
            println!("{}", result.stats);
            println!("Wrote {}", written.display());
        }

        Commands::Stats {
            rp2_results,
            overrides,
        } => {
            let config = load_config(cli.config.as_ref(), overrides)?;
            let rows = read_rows_from_path(&rp2_results)?;
            let result = Pipeline::new(config).run(rows)?;
            println!("{}", result.stats);
            for sink in &result.stats.prune.sinks {
                let distance = sink
                    .distance
                    .map_or_else(|| "-".to_string(), |d| d.to_string());
                println!(
                    "  {} distance={} paths={} accepted={}",
                    sink.sink, distance, sink.paths, sink.accepted
                );
            }
        }

        Commands::InitConfig { path } => {
            PipelineConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    Ok(())
}
