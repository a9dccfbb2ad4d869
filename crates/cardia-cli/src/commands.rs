use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use eyre::{Result, WrapErr};
use serde_json::{Value, json};

use cardia_core::models::AssessmentRecord;
use cardia_history::AssessmentHistoryStore;
use cardia_storage::KeyValueStore;

#[derive(Debug, Clone, Subcommand)]
pub enum HistoryCommand {
    /// Show the current identity
    Whoami,
    /// Set the current identity
    Login { email: String },
    /// Save an assessment read from a JSON file (`-` for stdin)
    Save {
        #[arg(long)]
        email: Option<String>,
        input: PathBuf,
    },
    /// List an identity's history, most recent first
    List {
        #[arg(long)]
        email: Option<String>,
    },
    /// Delete one record by id
    Delete {
        #[arg(long)]
        email: Option<String>,
        id: String,
    },
    /// Delete an identity's whole history
    Clear {
        #[arg(long)]
        email: Option<String>,
    },
    /// Move history out of legacy keys into the current scheme
    Migrate,
    /// Dump every key and partition
    Debug,
    /// Assign missing ids and timestamps, fix duplicate ids
    Heal {
        #[arg(long)]
        email: Option<String>,
    },
    /// Merge case-variant and legacy partitions into one
    Consolidate {
        #[arg(long)]
        email: Option<String>,
    },
    /// Move one identity's history onto another
    Relocate { from: String, to: String },
}

/// Execute `command` against `store`. Returns the JSON document to print.
///
/// `stdin` is read only by `save -`.
pub fn run<S: KeyValueStore>(
    store: &AssessmentHistoryStore<S>,
    command: HistoryCommand,
    stdin: impl Read,
) -> Result<Value> {
    match command {
        HistoryCommand::Whoami => Ok(json!({ "current_email": store.try_current_email()? })),
        HistoryCommand::Login { email } => {
            store.try_save_current_email(&email)?;
            Ok(json!({ "current_email": store.try_current_email()? }))
        }
        HistoryCommand::Save { email, input } => {
            let email = resolve_email(store, email)?;
            let raw = read_input(&input, stdin)?;
            let record: AssessmentRecord =
                serde_json::from_str(&raw).wrap_err("input is not a valid assessment")?;
            let saved = store
                .try_save_assessment(&email, record)?
                .ok_or_else(|| eyre::eyre!("nothing saved"))?;
            Ok(serde_json::to_value(saved)?)
        }
        HistoryCommand::List { email } => {
            let email = resolve_email(store, email)?;
            Ok(serde_json::to_value(store.try_assessment_history(&email)?)?)
        }
        HistoryCommand::Delete { email, id } => {
            let email = resolve_email(store, email)?;
            let deleted = store.try_delete_history_item(&email, &id)?;
            Ok(json!({ "id": id, "deleted": deleted }))
        }
        HistoryCommand::Clear { email } => {
            let email = resolve_email(store, email)?;
            store.try_clear_assessment_history(&email)?;
            Ok(json!({ "cleared": email.to_lowercase() }))
        }
        HistoryCommand::Migrate => Ok(serde_json::to_value(store.try_migrate_old_history()?)?),
        HistoryCommand::Debug => Ok(serde_json::to_value(store.debug_history())?),
        HistoryCommand::Heal { email } => {
            let email = resolve_email(store, email)?;
            Ok(serde_json::to_value(store.try_heal_partition(&email)?)?)
        }
        HistoryCommand::Consolidate { email } => {
            let email = resolve_email(store, email)?;
            Ok(serde_json::to_value(store.try_consolidate_history(&email)?)?)
        }
        HistoryCommand::Relocate { from, to } => {
            Ok(serde_json::to_value(store.try_relocate_history(&from, &to)?)?)
        }
    }
}

/// The explicit `--email`, else the current identity.
fn resolve_email<S: KeyValueStore>(
    store: &AssessmentHistoryStore<S>,
    email: Option<String>,
) -> Result<String> {
    if let Some(email) = email.filter(|e| !e.is_empty()) {
        return Ok(email);
    }
    store
        .try_current_email()?
        .ok_or_else(|| eyre::eyre!("no --email given and no current identity (run `cardia login`)"))
}

fn read_input(input: &Path, mut stdin: impl Read) -> Result<String> {
    if input.as_os_str() == "-" {
        let mut buf = String::new();
        stdin.read_to_string(&mut buf)?;
        return Ok(buf);
    }
    std::fs::read_to_string(input)
        .wrap_err_with(|| format!("failed to read {}", input.display()))
}
