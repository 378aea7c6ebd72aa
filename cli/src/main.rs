//! `sandpool`: operator CLI over the account pool.

mod command;

use std::env;
use std::io;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use sandpool_config::{Backend, EnvConfig, PoolConfig};
use sandpool_db::{Clock, Db, DbError, SystemClock};
use sandpool_store::{RecordStore, SqliteStore};
use sandpool_types::{Account, Lease};
use serde::Serialize;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::command::{AccountCommand, Command, LeaseCommand, USAGE, UsageError};

#[derive(Debug, Error)]
#[error("no {what} found for {key}")]
struct NotFound {
    what: &'static str,
    key: String,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .init();
}

fn exit_code(err: &anyhow::Error) -> u8 {
    if err.downcast_ref::<NotFound>().is_some() {
        return 2;
    }
    match err.downcast_ref::<DbError>() {
        Some(DbError::AccountNotFound(_)) => 2,
        Some(DbError::StatusTransition(_)) => 3,
        Some(DbError::AccountLeased(_)) => 4,
        _ => 1,
    }
}

fn open_store(backend: &Backend) -> Result<Arc<dyn RecordStore>> {
    match backend {
        Backend::Memory => anyhow::bail!(
            "the memory backend keeps nothing between runs; configure a sqlite backend for the CLI"
        ),
        Backend::Sqlite { path, options } => {
            let store = SqliteStore::open(path, options)
                .with_context(|| format!("failed to open pool database at {}", path.display()))?;
            Ok(Arc::new(store))
        }
    }
}

fn print_json(value: &impl Serialize) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn found<T>(value: Option<T>, what: &'static str, key: impl Into<String>) -> Result<T> {
    value.ok_or_else(|| {
        NotFound {
            what,
            key: key.into(),
        }
        .into()
    })
}

fn run_accounts(db: &Db, command: AccountCommand) -> Result<()> {
    let accounts = db.accounts();
    match command {
        AccountCommand::List => print_json(&accounts.list()?),
        AccountCommand::Get { id } => {
            let account = found(accounts.get(&id)?, "account", &id)?;
            print_json(&account)
        }
        AccountCommand::Ready => {
            let account = found(accounts.get_first_ready()?, "account", "status Ready")?;
            print_json(&account)
        }
        AccountCommand::ResetCandidates => print_json(&accounts.list_non_ready()?),
        AccountCommand::Status { status } => print_json(&accounts.find_by_status(status)?),
        AccountCommand::Principal { role_arn } => {
            print_json(&accounts.find_by_principal(&role_arn)?)
        }
        AccountCommand::Put {
            id,
            status,
            role_arn,
            metadata,
        } => {
            let mut account = Account::new(id, status)
                .with_last_modified_on(db_now())
                .with_metadata(metadata);
            account.principal_role_arn = role_arn;
            print_json(&accounts.put(&account)?)
        }
        AccountCommand::Metadata { id, metadata } => {
            print_json(&accounts.update_metadata(&id, metadata)?)
        }
        AccountCommand::Transition { id, from, to } => {
            print_json(&accounts.transition_status(&id, from, to)?)
        }
        AccountCommand::PolicyHash { id, previous, next } => print_json(
            &accounts.update_principal_policy_hash(&id, previous.as_deref(), &next)?,
        ),
        AccountCommand::Delete { id } => print_json(&accounts.delete(&id)?),
    }
}

fn run_leases(db: &Db, command: LeaseCommand) -> Result<()> {
    let leases = db.leases();
    match command {
        LeaseCommand::List => print_json(&leases.list()?),
        LeaseCommand::Get { account, principal } => {
            let lease = found(
                leases.get(&account, &principal)?,
                "lease",
                format!("{account}/{principal}"),
            )?;
            print_json(&lease)
        }
        LeaseCommand::Account { account } => print_json(&leases.find_by_account(&account)?),
        LeaseCommand::Principal { principal } => {
            print_json(&leases.find_by_principal(&principal)?)
        }
        LeaseCommand::Status { status } => print_json(&leases.find_by_status(status)?),
        LeaseCommand::Put {
            account,
            principal,
            status,
        } => {
            let lease = Lease::new(account, principal, status).created_at(db_now());
            print_json(&leases.put(&lease)?)
        }
        LeaseCommand::Transition {
            account,
            principal,
            from,
            to,
        } => print_json(&leases.transition_status(&account, &principal, from, to)?),
        LeaseCommand::Delete { account, principal } => {
            let lease = found(
                leases.delete(&account, &principal)?,
                "lease",
                format!("{account}/{principal}"),
            )?;
            print_json(&lease)
        }
    }
}

fn db_now() -> i64 {
    SystemClock.now()
}

fn run(args: Vec<String>) -> Result<()> {
    let invocation = command::parse(args)?;
    if invocation.command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = match &invocation.config {
        Some(path) => PoolConfig::load_from(path)?,
        None => PoolConfig::load()?.unwrap_or_default(),
    };
    let settings = config
        .resolve(&EnvConfig::from_process())
        .context("invalid configuration")?;
    tracing::debug!(?settings, "resolved configuration");

    let db = Db::new(open_store(&settings.backend)?, &settings.db);
    match invocation.command {
        Command::Accounts(command) => run_accounts(&db, command),
        Command::Leases(command) => run_leases(&db, command),
        Command::Help => Ok(()),
    }
}

fn main() -> ExitCode {
    init_tracing();

    match run(env::args().skip(1).collect()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            if err.downcast_ref::<UsageError>().is_some() {
                eprintln!("\n{USAGE}");
            }
            ExitCode::from(exit_code(&err))
        }
    }
}
