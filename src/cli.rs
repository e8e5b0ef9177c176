use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "bean-synth")]
#[command(about = "Synthesize bean-style getters and setters for public fields of Java classes")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(long, value_name = "FILE", global = true)]
    pub db: Option<PathBuf>,

    /// Skip the persistent report cache.
    #[arg(long, global = true)]
    pub no_cache: bool,

    /// Spaces per indentation level in emitted accessors.
    #[arg(long, value_name = "N", default_value_t = 4, global = true)]
    pub indent: usize,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Report the accessors each class would get.
    Plan {
        path: PathBuf,

        #[arg(short = 'f', long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Rewrite sources with the missing accessors inserted.
    Apply {
        path: PathBuf,

        /// Rewrite files in place.
        #[arg(long, conflicts_with = "output")]
        write: bool,

        #[arg(short = 'o', long, value_name = "FILE")]
        output: Option<PathBuf>,
    },
    Stats,
    Clear,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}
