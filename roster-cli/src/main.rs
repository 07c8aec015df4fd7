use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use roster_core::config::{Config, StorageBackend};
use roster_core::groups::{storage, DeviceKey, GroupId, GroupStore, MemberId, RegistrationId};
use roster_core::logging::{init_logging_with_config, LogConfig};
use serde_json::{json, Value};
use std::path::PathBuf;
use tracing::{debug, info};

#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(author, version, about = "Group membership store", long_about = None)]
struct Args {
    /// SQLite database path (overrides config and environment)
    #[arg(long)]
    db: Option<PathBuf>,

    /// Member id of the local user
    #[arg(long)]
    me: Option<String>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(short, long)]
    log_level: Option<String>,

    /// Enable JSON formatted logging
    #[arg(long)]
    json_logs: bool,

    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a group; the local user is always a member
    Create {
        /// Use this id instead of generating one
        #[arg(long)]
        id: Option<String>,
        members: Vec<String>,
    },
    /// Print a group with its members
    Show { id: String },
    /// Print the members of a group
    Members { id: String },
    /// Add members to a group
    Add {
        id: String,
        #[arg(required = true)]
        members: Vec<String>,
    },
    /// Remove a member from a group
    Remove { id: String, member: String },
    /// Grow a group to the given membership; prints the newly added members
    Update {
        id: String,
        #[arg(required = true)]
        members: Vec<String>,
    },
    /// Delete a group
    Delete { id: String },
    /// List all group ids
    List,
    /// Record a device registration id; prints whether sessions need a rebuild
    CheckRegistration {
        id: String,
        member: String,
        device: String,
        registration_id: u32,
    },
}

fn load_config(args: &Args) -> Result<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };
    config.apply_overrides(|key| std::env::var(key).ok())?;

    if let Some(db) = &args.db {
        config.store.backend = StorageBackend::Sqlite;
        config.store.db_path = db.clone();
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    if args.json_logs {
        config.logging.json_format = true;
    }

    config.validate()?;
    Ok(config)
}

fn to_members(ids: &[String]) -> Vec<MemberId> {
    ids.iter().map(|id| MemberId::new(id.as_str())).collect()
}

fn require_me(me: &Option<String>) -> Result<MemberId> {
    me.as_deref()
        .map(MemberId::from)
        .context("--me is required for this command")
}

async fn execute(store: &GroupStore, me: &Option<String>, command: Command) -> Result<Value> {
    let output = match command {
        Command::Create { id, members } => {
            let me = require_me(me)?;
            let group = store
                .create_group(&to_members(&members), id.map(GroupId::from), &me)
                .await?;
            serde_json::to_value(group)?
        }
        Command::Show { id } => serde_json::to_value(store.get_group(&GroupId::from(id)).await?)?,
        Command::Members { id } => {
            serde_json::to_value(store.get_members(&GroupId::from(id)).await?)?
        }
        Command::Add { id, members } => serde_json::to_value(
            store.add_members(&GroupId::from(id), &to_members(&members)).await?,
        )?,
        Command::Remove { id, member } => {
            let me = require_me(me)?;
            serde_json::to_value(
                store
                    .remove_member(&GroupId::from(id), &MemberId::from(member), &me)
                    .await?,
            )?
        }
        Command::Update { id, members } => {
            let added = store.update_members(&GroupId::from(id), &to_members(&members)).await?;
            json!({ "added": added })
        }
        Command::Delete { id } => {
            store.delete_group(&GroupId::from(id.as_str())).await?;
            json!({ "deleted": id })
        }
        Command::List => serde_json::to_value(store.list_groups().await?)?,
        Command::CheckRegistration { id, member, device, registration_id } => {
            let needs_update = store
                .needs_update(
                    &GroupId::from(id),
                    &MemberId::from(member),
                    &DeviceKey::new(device),
                    RegistrationId(registration_id),
                )
                .await?;
            json!({ "needs_update": needs_update })
        }
    };
    Ok(output)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    init_logging_with_config(LogConfig::try_from(&config.logging)?)?;
    roster_core::metrics::init_metrics();

    debug!(backend = %config.store.backend, path = %config.store.db_path.display(), "opening storage");
    let storage = storage::open(&config.store)?;
    let store = GroupStore::new(storage).with_config(config.groups.clone());

    let output = execute(&store, &args.me, args.command).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    info!("roster finished");
    Ok(())
}
