//! # csar-cli
//!
//! Command-line interface for parsing orchestration archives.
//!
//! Exit codes: `0` when parsing succeeded, `1` when the result carries
//! errors, `2` when nothing could be parsed.

mod output;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use csar_archive::{ArchiveResolver, ArchiveSource, ResolverConfig};
use csar_definitions::{DefinitionsDocument, Dialect};
use csar_parser::DocumentParser;
use tracing_subscriber::EnvFilter;

use crate::output::Format;

#[derive(Parser)]
#[command(name = "csar")]
#[command(about = "Parse and inspect orchestration archives")]
#[command(version)]
struct Cli {
    /// Path to a resolver configuration file (YAML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log resolution steps to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an archive (zip file or directory) or a single document
    Parse {
        /// Archive or document path
        path: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Treat the path as a single definitions document
        #[arg(long)]
        document: bool,
    },

    /// List root-level entry document candidates of an archive
    Discover {
        /// Archive path
        path: PathBuf,
    },

    /// List supported definitions versions
    Dialects,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for Format {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Format::Text,
            OutputFormat::Json => Format::Json,
        }
    }
}

const EXIT_FATAL: u8 = 2;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("ERROR: {e:#}");
            ExitCode::from(EXIT_FATAL)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ResolverConfig> {
    match path {
        Some(path) => ResolverConfig::from_yaml_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(ResolverConfig::default()),
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Commands::Parse {
            path,
            format,
            document,
        } => {
            let parsed = if document {
                tracing::info!("Parsing document {}", path.display());
                DefinitionsDocument::new().parse_file(&path, None)
            } else {
                let config = load_config(cli.config.as_ref())?;
                let resolver = ArchiveResolver::new(config).context("building resolver")?;
                tracing::info!("Resolving archive {}", path.display());
                resolver.resolve_path(&path)
            };

            match parsed {
                Ok(result) => {
                    output::print_result(&result, format.into())?;
                    Ok(if result.has_errors() {
                        ExitCode::from(1)
                    } else {
                        ExitCode::SUCCESS
                    })
                }
                Err(error) => {
                    output::print_fatal(&error, format.into())?;
                    Ok(ExitCode::from(EXIT_FATAL))
                }
            }
        }
        Commands::Discover { path } => {
            let config = load_config(cli.config.as_ref())?;
            let resolver = ArchiveResolver::new(config).context("building resolver")?;
            match resolver.discover(&ArchiveSource::detect(&path)) {
                Ok(candidates) => {
                    for candidate in &candidates {
                        println!("{candidate}");
                    }
                    eprintln!("Discovered {} candidate(s)", candidates.len());
                    Ok(ExitCode::SUCCESS)
                }
                Err(error) => {
                    output::print_fatal(&error, Format::Text)?;
                    Ok(ExitCode::from(EXIT_FATAL))
                }
            }
        }
        Commands::Dialects => {
            for dialect in Dialect::ALL {
                if dialect == Dialect::LATEST {
                    println!("{dialect} (default)");
                } else {
                    println!("{dialect}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}
