use std::io::Write;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use recall_core::ManagerConfig;
use tracing_subscriber::EnvFilter;

use crate::error::Result;
use crate::scenario;

/// Environment variable holding the log filter directive.
pub const LOG_ENV: &str = "RECALL_LOG";

const DEFAULT_VERSES: u32 = 3;

/// Psalm 119, the longest chapter.
const MAX_VERSES: i64 = 176;

#[derive(Debug, Parser)]
#[command(
    name = "recall-demo",
    about = "Undo/redo walkthroughs for a reading tracker",
    version
)]
pub struct Cli {
    /// TOML file with manager settings (label, notify, history_capacity).
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Page tracking with saved and unsaved page turns.
    Book,

    /// Verse-by-verse reading with back navigation.
    Reading(ReadingArgs),

    /// Per-title bookmarks shared by two readers.
    Bookmarks,

    /// Run every scenario in turn (the default).
    All,
}

#[derive(Debug, Args)]
pub struct ReadingArgs {
    /// Verses to read before walking back.
    #[arg(
        long,
        default_value_t = DEFAULT_VERSES,
        value_parser = clap::value_parser!(u32).range(..=MAX_VERSES)
    )]
    pub verses: u32,
}

pub fn run_from_env() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_json);
    let stdout = std::io::stdout();
    run(cli, &mut stdout.lock())
}

pub fn run<W: Write>(cli: Cli, out: &mut W) -> Result<()> {
    let config = cli.config.as_deref().map(load_config).transpose()?;
    let config = config.as_ref();
    match cli.command.unwrap_or(Commands::All) {
        Commands::Book => scenario::book(out, config),
        Commands::Reading(args) => scenario::reading(out, config, args.verses),
        Commands::Bookmarks => scenario::bookmarks(out, config),
        Commands::All => {
            writeln!(out, "== book ==")?;
            scenario::book(out, config)?;
            writeln!(out, "\n== reading ==")?;
            scenario::reading(out, config, DEFAULT_VERSES)?;
            writeln!(out, "\n== bookmarks ==")?;
            scenario::bookmarks(out, config)
        }
    }
}

/// Manager settings from a TOML file.
///
/// Without a file each scenario uses the defaults, labeled after itself.
pub fn load_config(path: &Path) -> Result<ManagerConfig> {
    let config = ManagerConfig::from_toml_file(path)?;
    tracing::debug!(
        path = %path.display(),
        label = %config.label,
        notify = ?config.notify,
        history_capacity = config.history_capacity,
        "manager config loaded"
    );
    Ok(config)
}

fn init_logging(json: bool) {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    // A subscriber may already be installed when embedded in tests.
    let _ = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
