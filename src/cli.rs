use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::config::Settings;

#[derive(Parser, Debug)]
#[command(name = "family-archive")]
#[command(version, about = "Export and import the family-tree archive tables as JSON or Excel")]
pub struct Cli {
    /// Log level: trace, debug, info, warn, error
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    /// Config file (default: config.toml in the platform config directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Supabase project URL
    #[arg(long, global = true, env = "SUPABASE_URL")]
    pub supabase_url: Option<String>,

    /// Supabase API key
    #[arg(long, global = true, env = "SUPABASE_ANON_KEY", hide_env_values = true)]
    pub supabase_key: Option<String>,

    /// Work against a local SQLite database instead of Supabase
    #[arg(long, global = true, env = "FAMILY_ARCHIVE_SQLITE")]
    pub sqlite: Option<PathBuf>,

    /// Show the full-screen progress dashboard
    #[arg(long, global = true)]
    pub tui: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Xlsx,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List the archive tables with their row counts
    Tables {
        /// Only print the table registry, without contacting the database
        #[arg(long)]
        offline: bool,
    },

    /// Export tables to a JSON bundle or an Excel workbook
    Export {
        #[arg(short, long, value_enum, default_value_t = ExportFormat::Json)]
        format: ExportFormat,

        /// Only export these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tables: Option<Vec<String>>,

        /// Exclude these tables (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Choose tables interactively
        #[arg(short, long)]
        pick: bool,

        /// Directory for the export file
        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,

        /// Print the JSON to stdout instead of writing a file
        #[arg(long, conflicts_with = "output_dir")]
        stdout: bool,
    },

    /// Validate an import file and show what it contains
    Preview {
        /// JSON bundle or Excel workbook
        file: PathBuf,

        /// Sample rows shown per table for JSON bundles
        #[arg(short, long, default_value_t = 3)]
        rows: usize,
    },

    /// Import a JSON bundle, or the first sheet of a workbook into one table
    Import {
        /// JSON bundle or Excel workbook
        file: PathBuf,

        /// Target table (required for Excel files)
        #[arg(short, long)]
        table: Option<String>,

        /// Do not ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },

    /// Write a blank Excel template for one table
    Template {
        table: String,

        #[arg(short, long, default_value = ".")]
        output_dir: PathBuf,
    },
}

impl Cli {
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Backend settings given on the command line or in the environment
    pub fn overrides(&self) -> Settings {
        Settings {
            supabase_url: self.supabase_url.clone(),
            supabase_key: self.supabase_key.clone(),
            sqlite_path: self.sqlite.clone(),
        }
    }
}
