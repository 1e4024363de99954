// Kesher CLI - merge contact lists from CSV, Excel, Word and vCard files

mod exit_codes;
mod merge;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use env_logger::Env;

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_SUCCESS, EXIT_USAGE};

#[derive(Parser)]
#[command(name = "kesher")]
#[command(about = "Merge contact lists with mismatched columns into one deduplicated table")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Merge contact files into one table
    #[command(after_help = "\
Supported inputs: .csv .tsv .xlsx .xlsm .xls .xlsb .ods .docx .vcf
Files with other extensions are skipped.

Examples:
  kesher merge suppliers.xlsx phones.csv
  kesher merge *.vcf -o contacts.csv
  kesher merge a.docx b.xlsx --format json -o merged.json
  kesher merge a.csv b.csv --report report.json --strict")]
    Merge {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output file [default: contacts.<format>]
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,

        /// Output format (inferred from --output extension if omitted)
        #[arg(long, short = 'f')]
        format: Option<OutputFormat>,

        /// Merge config (TOML)
        #[arg(long, env = "KESHER_CONFIG")]
        config: Option<PathBuf>,

        /// Write a JSON run report to this path
        #[arg(long)]
        report: Option<PathBuf>,

        /// Exit non-zero when any input failed to parse
        #[arg(long)]
        strict: bool,
    },

    /// Show detected columns and how each one would be mapped
    #[command(after_help = "\
Examples:
  kesher inspect suppliers.xlsx
  kesher inspect *.csv --json | jq '.[].columns'")]
    Inspect {
        /// Input files
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Merge config (TOML)
        #[arg(long, env = "KESHER_CONFIG")]
        config: Option<PathBuf>,

        /// Output JSON to stdout instead of a human summary
        #[arg(long)]
        json: bool,
    },

    /// Validate a merge config without running
    Validate {
        /// Path to the config file
        config: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Xlsx,
    Csv,
    Json,
}

impl From<OutputFormat> for kesher_io::ExportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Xlsx => Self::Xlsx,
            OutputFormat::Csv => Self::Csv,
            OutputFormat::Json => Self::Json,
        }
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Merge { files, output, format, config, report, strict } => {
            merge::cmd_merge(files, output, format, config, report, strict)
        }
        Commands::Inspect { files, config, json } => merge::cmd_inspect(files, config, json),
        Commands::Validate { config } => settings::cmd_validate(config),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::new(EXIT_CONFIG, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
