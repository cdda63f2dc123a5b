mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wpm_lib::addon::SourceKind;
use wpm_lib::consts::CONFIG_ENV;
use wpm_lib::platform::paths;

use output::OutputFormat;

/// wpm - addon package manager
#[derive(Parser)]
#[command(name = "wpm")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable verbose output
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Path to the configuration file
  #[arg(long, global = true, env = CONFIG_ENV)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Create a configuration file with one installation
  Init {
    /// Installation directory (default: the platform AddOns directory)
    #[arg(long)]
    dir: Option<PathBuf>,

    /// Overwrite an existing configuration
    #[arg(short, long)]
    force: bool,
  },

  /// List the addons of an installation
  List {
    /// Installation directory (default: the first installation)
    #[arg(long)]
    install: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: OutputFormat,
  },

  /// Start managing an addon
  Add {
    /// Project name on the remote, or directory name for ignore/link
    #[arg(long)]
    name: String,

    /// Source kind: curse, wowace, ignore or link
    #[arg(long = "type")]
    kind: SourceKind,

    /// Link target for link addons
    #[arg(long)]
    location: Option<String>,

    /// Branch to track
    #[arg(long)]
    branch: Option<String>,

    /// Installation directory (default: the first installation)
    #[arg(long)]
    install: Option<PathBuf>,
  },

  /// Stop managing an addon (files on disk are kept)
  Remove {
    #[arg(long)]
    name: String,

    /// Installation directory (default: the first installation)
    #[arg(long)]
    install: Option<PathBuf>,
  },

  /// Fetch and install the latest version of every addon
  Upgrade {
    /// Installation directory (default: the first installation)
    #[arg(long)]
    install: Option<PathBuf>,

    /// Show the planned changes without applying them
    #[arg(long)]
    dry_run: bool,

    /// Maximum number of addons processed at once (default: CPU count)
    #[arg(short, long)]
    jobs: Option<usize>,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let config = cli.config.unwrap_or_else(paths::config_file);

  match cli.command {
    Commands::Init { dir, force } => cmd::cmd_init(&config, dir, force),
    Commands::List { install, format } => cmd::cmd_list(&config, install.as_deref(), format),
    Commands::Add {
      name,
      kind,
      location,
      branch,
      install,
    } => cmd::cmd_add(
      &config,
      install.as_deref(),
      cmd::AddArgs {
        name,
        kind,
        location,
        branch,
      },
    ),
    Commands::Remove { name, install } => cmd::cmd_remove(&config, install.as_deref(), &name),
    Commands::Upgrade { install, dry_run, jobs } => cmd::cmd_upgrade(&config, install.as_deref(), dry_run, jobs),
  }
}
