// regcheck - licence and registration checks for contractor spreadsheets

mod exit_codes;
mod logging;
mod lookup;
mod registry;
mod run;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use exit_codes::{EXIT_CONFIG, EXIT_ERROR, EXIT_IO, EXIT_SUCCESS, EXIT_USAGE};
use settings::Overrides;

#[derive(Parser)]
#[command(name = "regcheck")]
#[command(about = "Check spreadsheet rows against public licence and registration registers")]
#[command(long_version = long_version())]
#[command(version)]
struct Cli {
    /// Log each lookup and save
    #[arg(long, short = 'v', global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check every routed sheet of a workbook and write results in place
    #[command(after_help = "\
Examples:
  regcheck run contractors.xlsx
  regcheck run contractors.xlsx --registry qbcc-individual --skip-days 0
  regcheck run contractors.xlsx --config ./regcheck.toml --json")]
    Run {
        /// Workbook to check (.xlsx), saved back to the same path
        file: PathBuf,

        /// Config file (default: <config dir>/regcheck/config.toml)
        #[arg(long, env = "REGCHECK_CONFIG")]
        config: Option<PathBuf>,

        /// Only use these registries. Repeatable.
        #[arg(long = "registry", value_name = "NAME")]
        registries: Vec<String>,

        /// Skip rows checked fewer than this many days ago (0 checks all)
        #[arg(long)]
        skip_days: Option<u32>,

        /// Save after this many checked rows (0 saves per sheet only)
        #[arg(long)]
        save_every: Option<usize>,

        /// Print the run summary as JSON on stdout
        #[arg(long)]
        json: bool,
    },

    /// Look up a single identifier
    #[command(after_help = "\
Examples:
  regcheck lookup qbcc-individual 1234567
  regcheck lookup surveyors 'Jane Citizen' --company 'Citizen Surveys'
  regcheck lookup pool-safety PS12345 --json

Exit codes: 0 found, 50 not on the register, 51 expired, 54 lookup failed")]
    Lookup {
        /// Registry name (see `regcheck registries`)
        registry: String,

        /// Licence or registration number, or a person's name
        identifier: String,

        /// Company to fall back to (name-searched registries only)
        #[arg(long)]
        company: Option<String>,

        /// Config file, for registry endpoint overrides
        #[arg(long, env = "REGCHECK_CONFIG")]
        config: Option<PathBuf>,

        #[arg(long)]
        json: bool,
    },

    /// List registries and the sheets they claim
    Registries {
        #[arg(long)]
        json: bool,
    },
}

fn long_version() -> &'static str {
    concat!(
        env!("CARGO_PKG_VERSION"),
        " (", env!("GIT_COMMIT_HASH"), ")",
        "\ntarget:  ", env!("TARGET"),
    )
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose, cli.quiet);

    let result = match cli.command {
        Commands::Run {
            file,
            config,
            registries,
            skip_days,
            save_every,
            json,
        } => run::cmd_run(run::RunArgs {
            file,
            config,
            registries,
            overrides: Overrides {
                skip_days,
                save_every,
            },
            json,
        }),
        Commands::Lookup {
            registry,
            identifier,
            company,
            config,
            json,
        } => lookup::cmd_lookup(
            &registry,
            &identifier,
            company.as_deref(),
            config.as_deref(),
            json,
        ),
        Commands::Registries { json } => lookup::cmd_registries(json),
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
    pub fn args(msg: impl Into<String>) -> Self {
        Self { code: EXIT_USAGE, message: msg.into(), hint: None }
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self { code: EXIT_IO, message: msg.into(), hint: None }
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self { code: EXIT_CONFIG, message: msg.into(), hint: None }
    }

    pub fn general(msg: impl Into<String>) -> Self {
        Self { code: EXIT_ERROR, message: msg.into(), hint: None }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}
