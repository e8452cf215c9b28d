//! Command-line argument definitions.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stitchcount_core::{ConfigInput, CounterKind};

/// Row and stitch counter for knitting and crochet projects.
#[derive(Debug, Parser)]
#[command(name = "stitchcount")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// SQLite file holding the project slot
    #[arg(long, global = true, env = "STITCHCOUNT_DB_PATH")]
    pub db_path: Option<PathBuf>,

    /// Log level for file logging (error, warn, info, debug, trace)
    #[arg(long, global = true, env = "STITCHCOUNT_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Absolute directory for rolling log files; file logging is off when unset
    #[arg(long, global = true, env = "STITCHCOUNT_LOG_DIR")]
    pub log_dir: Option<PathBuf>,

    /// Timer tick interval in milliseconds
    #[arg(long, global = true, env = "STITCHCOUNT_TICK_MS")]
    pub tick_ms: Option<u64>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

impl Cli {
    /// Settings to validate with `AppConfig::resolve`.
    pub fn config_input(&self) -> ConfigInput {
        ConfigInput {
            db_path: self.db_path.clone(),
            log_level: self.log_level.clone(),
            log_dir: self.log_dir.clone(),
            tick_ms: self.tick_ms,
        }
    }

    /// The requested subcommand; [`Command::Summary`] when none was given.
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Summary)
    }
}

/// Available subcommands.
#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Show the selected project and section (default)
    Summary,
    /// List projects, most recently modified first
    List,
    /// Create a project from the starter template and select it
    New,
    /// Select a project, and optionally one of its sections
    Select {
        project: String,
        section: Option<String>,
    },
    /// Add a section to the selected project
    AddSection,
    /// Increment a counter of the selected section
    Inc {
        #[arg(value_enum)]
        kind: CounterArg,
    },
    /// Decrement a counter of the selected section (never below zero)
    Dec {
        #[arg(value_enum)]
        kind: CounterArg,
    },
    /// Reset a counter of the selected section to zero
    Reset {
        #[arg(value_enum)]
        kind: CounterArg,
    },
    /// Run the selected section's timer in the foreground
    Time {
        /// How long to run before stopping
        seconds: u64,
    },
    /// Print the core library version
    Version,
}

impl Command {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::List => "list",
            Self::New => "new",
            Self::Select { .. } => "select",
            Self::AddSection => "add-section",
            Self::Inc { .. } => "inc",
            Self::Dec { .. } => "dec",
            Self::Reset { .. } => "reset",
            Self::Time { .. } => "time",
            Self::Version => "version",
        }
    }
}

/// Counter names accepted on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CounterArg {
    Stitches,
    Rows,
    Repeats,
}

impl From<CounterArg> for CounterKind {
    fn from(arg: CounterArg) -> Self {
        match arg {
            CounterArg::Stitches => CounterKind::Stitches,
            CounterArg::Rows => CounterKind::Rows,
            CounterArg::Repeats => CounterKind::Repeats,
        }
    }
}
