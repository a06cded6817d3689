//! Parent management commands
//!
//! A parent names one drive (the user's own drive or a shared drive), keeps
//! its working directory and says where the access token comes from.

use clap::Subcommand;
use comfy_table::{Table, presets::UTF8_FULL};
use gd_core::parent::DEFAULT_TOKEN_ENV;
use gd_core::{Error, Parent, ParentManager, Result};
use serde::Serialize;

use super::fail;
use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

/// Drive id the API accepts for the user's own drive
const MY_DRIVE_ID: &str = "root";

/// Parent subcommands
#[derive(Subcommand, Debug)]
pub enum ParentCommands {
    /// Add or update a parent
    Set(SetArgs),

    /// List all configured parents
    List(ListArgs),

    /// Remove a parent
    Remove(NameArgs),

    /// Make a parent the default one
    Default(NameArgs),
}

/// Arguments for `parent set`
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Parent name (e.g. "origin", "team")
    pub name: String,

    /// Drive id: "root" for your own drive, or a shared drive id
    #[arg(long, default_value = MY_DRIVE_ID)]
    pub drive_id: String,

    /// Display name of the drive
    #[arg(long)]
    pub drive_name: Option<String>,

    /// Environment variable holding the access token
    #[arg(long, default_value = DEFAULT_TOKEN_ENV)]
    pub token_env: String,
}

/// Arguments for `parent list`
#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Show drive ids, working directories and token variables
    #[arg(short, long)]
    pub long: bool,
}

/// Arguments naming a single parent
#[derive(clap::Args, Debug)]
pub struct NameArgs {
    /// Parent name
    pub name: String,
}

/// Parent as shown by `parent list`
#[derive(Debug, Serialize)]
pub(crate) struct ParentInfo {
    name: String,
    drive_id: String,
    drive_name: String,
    cwd: String,
    token_env: String,
    default: bool,
}

#[derive(Debug, Serialize)]
struct ParentOperationOutput {
    success: bool,
    parent: String,
    message: String,
}

/// Execute a parent subcommand
pub async fn execute(cmd: ParentCommands, output_config: OutputConfig) -> ExitCode {
    let formatter = Formatter::new(output_config);

    let manager = match ParentManager::new() {
        Ok(m) => m,
        Err(e) => return fail(&formatter, &e),
    };

    let result = match cmd {
        ParentCommands::Set(args) => set_parent(&manager, args).map(|message| (None, message)),
        ParentCommands::List(args) => match list_parents(&manager) {
            Ok(parents) => {
                formatter.emit(&parents, || render_parents(&parents, args.long));
                return ExitCode::Success;
            }
            Err(e) => Err(e),
        },
        ParentCommands::Remove(args) => manager
            .remove(&args.name)
            .map(|()| (Some(args.name.clone()), format!("Parent '{}' removed", args.name))),
        ParentCommands::Default(args) => manager.set_default(&args.name).map(|()| {
            (
                Some(args.name.clone()),
                format!("'{}' is now the default parent", args.name),
            )
        }),
    };

    match result {
        Ok((name, message)) => {
            if formatter.is_json() {
                formatter.json(&ParentOperationOutput {
                    success: true,
                    parent: name.unwrap_or_default(),
                    message,
                });
            } else {
                formatter.success(&message);
            }
            ExitCode::Success
        }
        Err(e) => fail(&formatter, &e),
    }
}

/// Add or update a parent, keeping its working directory when the drive
/// stays the same
pub(crate) fn set_parent(manager: &ParentManager, args: SetArgs) -> Result<String> {
    let name = args.name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return Err(Error::Config(format!("Invalid parent name '{}'", args.name)));
    }
    if args.drive_id.trim().is_empty() {
        return Err(Error::Config("Drive id cannot be empty".into()));
    }

    let drive_name = args.drive_name.unwrap_or_else(|| {
        if args.drive_id == MY_DRIVE_ID {
            "My Drive".to_string()
        } else {
            args.drive_id.clone()
        }
    });

    let mut parent = Parent::new(name, args.drive_id.as_str(), drive_name);
    parent.token_env = args.token_env;

    let updated = match manager.get(name) {
        Ok(existing) => {
            if existing.drive_id == parent.drive_id {
                parent.cwd_path = existing.cwd_path;
                parent.cwd_id = existing.cwd_id;
            }
            true
        }
        Err(Error::ParentNotFound(_)) => false,
        Err(e) => return Err(e),
    };
    manager.set(parent)?;

    Ok(if updated {
        format!("Parent '{name}' updated")
    } else {
        format!("Parent '{name}' configured")
    })
}

pub(crate) fn list_parents(manager: &ParentManager) -> Result<Vec<ParentInfo>> {
    let default = manager.default_parent().ok().map(|p| p.name);
    Ok(manager
        .list()?
        .into_iter()
        .map(|p| ParentInfo {
            default: default.as_deref() == Some(p.name.as_str()),
            cwd: p.display_cwd(),
            name: p.name,
            drive_id: p.drive_id,
            drive_name: p.drive_name,
            token_env: p.token_env,
        })
        .collect())
}

pub(crate) fn render_parents(parents: &[ParentInfo], long: bool) -> String {
    if parents.is_empty() {
        return "No parents configured. Add one with 'gd parent set <name>'.".to_string();
    }

    if long {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["", "Name", "Drive", "Drive id", "Working dir", "Token env"]);
        for p in parents {
            table.add_row(vec![
                if p.default { "*" } else { "" },
                p.name.as_str(),
                p.drive_name.as_str(),
                p.drive_id.as_str(),
                p.cwd.as_str(),
                p.token_env.as_str(),
            ]);
        }
        return table.to_string();
    }

    parents
        .iter()
        .map(|p| {
            let mark = if p.default { '*' } else { ' ' };
            format!("{mark} {:<12} {} ({})", p.name, p.drive_name, p.cwd)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
