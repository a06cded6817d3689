//! CLI command definitions and execution
//!
//! Each command lives in its own module with an `execute` entry point. The
//! work itself is done by functions generic over [`RemoteStore`] so it can be
//! exercised against an in-memory store.

use clap::{Parser, Subcommand};
use gd_core::config::Defaults;
use gd_core::{ConfigManager, Depth, Error, Parent, ParentManager, RemoteStore, Resolver};
use gd_drive::DriveClient;
use tracing::debug;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod cd;
mod completions;
mod find;
mod ls;
mod mkdir;
mod parent;
mod pwd;
mod rm;
mod transfer;

/// gd - path-addressed drive client
///
/// Lists, searches, uploads and downloads drive content by slash path.
#[derive(Parser, Debug)]
#[command(name = "gd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Disable progress bar
    #[arg(long, global = true, default_value = "false")]
    pub no_progress: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Parent to act on instead of the default one
    #[arg(short, long, global = true, env = "GD_PARENT")]
    pub parent: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Manage parents (named drives with a working directory)
    #[command(subcommand)]
    Parent(parent::ParentCommands),

    /// List the contents of a folder
    Ls(ls::LsArgs),

    /// Find paths matching a query such as "*.jpg and not tmp*"
    Find(find::FindArgs),

    /// Create folders, including missing parents
    Mkdir(mkdir::MkdirArgs),

    /// Move files or folders to the trash, or delete them
    Rm(rm::RmArgs),

    /// Change the working directory of the parent
    Cd(cd::CdArgs),

    /// Print the working directory of the parent
    Pwd,

    /// Upload a local file or folder
    Push(transfer::PushArgs),

    /// Download a drive file or folder
    Pull(transfer::PullArgs),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// Execute the CLI command and return an exit code
pub async fn execute(cli: Cli) -> ExitCode {
    let output_config = OutputConfig::from_flags(
        cli.json,
        cli.no_color,
        cli.no_progress,
        cli.quiet,
        &configured_defaults(),
    );
    let parent = cli.parent.as_deref();

    match cli.command {
        Commands::Parent(cmd) => parent::execute(cmd, output_config).await,
        Commands::Ls(args) => ls::execute(args, parent, output_config).await,
        Commands::Find(args) => find::execute(args, parent, output_config).await,
        Commands::Mkdir(args) => mkdir::execute(args, parent, output_config).await,
        Commands::Rm(args) => rm::execute(args, parent, output_config).await,
        Commands::Cd(args) => cd::execute(args, parent, output_config).await,
        Commands::Pwd => pwd::execute(parent, output_config),
        Commands::Push(args) => transfer::execute_push(args, parent, output_config).await,
        Commands::Pull(args) => transfer::execute_pull(args, parent, output_config).await,
        Commands::Completions(args) => completions::execute(args),
    }
}

/// Output defaults from the configuration file; a broken file is reported by
/// the command that actually needs it
fn configured_defaults() -> Defaults {
    match ConfigManager::new().and_then(|manager| manager.load()) {
        Ok(config) => config.defaults,
        Err(e) => {
            debug!(error = %e, "Using built-in output defaults");
            Defaults::default()
        }
    }
}

/// Everything a drive command needs: the parent, its manager and a client
pub(crate) struct Session {
    pub manager: ParentManager,
    pub parent: Parent,
    pub defaults: Defaults,
    pub client: DriveClient,
}

impl Session {
    /// Load the configuration and connect to the named or default parent
    pub fn open(parent: Option<&str>) -> gd_core::Result<Self> {
        let config_manager = ConfigManager::new()?;
        let defaults = config_manager.load()?.defaults;
        let manager = ParentManager::with_config_manager(config_manager);
        let parent = manager.resolve(parent)?;
        let client = DriveClient::new(parent.access_token()?);
        Ok(Self {
            manager,
            parent,
            defaults,
            client,
        })
    }

    pub fn resolver(&self) -> Resolver<'_, DriveClient> {
        resolver_for(&self.client, &self.parent)
    }
}

/// Resolver rooted at the parent's drive, relative to its working directory
pub(crate) fn resolver_for<'a, S: RemoteStore + ?Sized>(
    store: &'a S,
    parent: &Parent,
) -> Resolver<'a, S> {
    Resolver::new(store, parent.drive_id.clone()).relative_to(parent.working_id())
}

/// Report `error` and map it to an exit code
pub(crate) fn fail(formatter: &Formatter, error: &Error) -> ExitCode {
    formatter.error(&error.to_string());
    ExitCode::from(error)
}

/// Parse `all`, `current` or a number of levels
pub(crate) fn parse_depth(value: &str) -> Result<Depth, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "all" | "a" => Ok(Depth::All),
        "current" | "c" => Ok(Depth::Current),
        other => other.parse::<u32>().map(Depth::Levels).map_err(|_| {
            format!("invalid depth '{value}': expected 'all', 'current' or a number")
        }),
    }
}
