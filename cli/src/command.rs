//! Argument parsing for `sandpool`.

use std::path::PathBuf;
use std::str::FromStr;

use sandpool_types::{AccountStatus, LeaseStatus, Metadata, StatusParseError};
use thiserror::Error;

pub(crate) const USAGE: &str = "\
usage: sandpool [--config PATH] <accounts|leases> <command> [args]

accounts:
  list                              every account
  get <id>                          one account
  ready                             some Ready account
  reset-candidates                  accounts that are not Ready
  status <status>                   accounts in a status
  principal <role-arn>              accounts leased to a principal role
  put <id> <status> [--role-arn ARN] [--metadata JSON]
  metadata <id> <json>              replace metadata
  transition <id> <from> <to>       guarded status change
  policy-hash <id> <next> [--from PREV]
  delete <id>                       delete unless leased

leases:
  list
  get <account> <principal>
  account <account>
  principal <principal>
  status <status>
  put <account> <principal> <status>
  transition <account> <principal> <from> <to>
  delete <account> <principal>

exit codes: 0 ok, 1 usage or other error, 2 not found,
            3 transition rejected, 4 account leased";

#[derive(Debug, Error)]
pub(crate) enum UsageError {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("unexpected argument '{0}'")]
    Unexpected(String),
    #[error("unknown command '{0}'")]
    UnknownCommand(String),
    #[error(transparent)]
    Status(#[from] StatusParseError),
    #[error("metadata must be a JSON object: {0}")]
    Metadata(String),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum AccountCommand {
    List,
    Get { id: String },
    Ready,
    ResetCandidates,
    Status { status: AccountStatus },
    Principal { role_arn: String },
    Put {
        id: String,
        status: AccountStatus,
        role_arn: Option<String>,
        metadata: Metadata,
    },
    Metadata { id: String, metadata: Metadata },
    Transition {
        id: String,
        from: AccountStatus,
        to: AccountStatus,
    },
    PolicyHash {
        id: String,
        previous: Option<String>,
        next: String,
    },
    Delete { id: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum LeaseCommand {
    List,
    Get { account: String, principal: String },
    Account { account: String },
    Principal { principal: String },
    Status { status: LeaseStatus },
    Put {
        account: String,
        principal: String,
        status: LeaseStatus,
    },
    Transition {
        account: String,
        principal: String,
        from: LeaseStatus,
        to: LeaseStatus,
    },
    Delete { account: String, principal: String },
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Command {
    Accounts(AccountCommand),
    Leases(LeaseCommand),
    Help,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Invocation {
    pub(crate) config: Option<PathBuf>,
    pub(crate) command: Command,
}

struct Args {
    items: std::vec::IntoIter<String>,
}

impl Args {
    fn next(&mut self, what: &'static str) -> Result<String, UsageError> {
        self.items.next().ok_or(UsageError::Missing(what))
    }

    fn status<T>(&mut self, what: &'static str) -> Result<T, UsageError>
    where
        T: FromStr<Err = StatusParseError>,
    {
        Ok(self.next(what)?.parse()?)
    }

    fn finish(mut self) -> Result<(), UsageError> {
        match self.items.next() {
            Some(extra) => Err(UsageError::Unexpected(extra)),
            None => Ok(()),
        }
    }
}

pub(crate) fn parse(args: Vec<String>) -> Result<Invocation, UsageError> {
    let mut args = Args {
        items: args.into_iter(),
    };
    let mut config = None;
    let group = loop {
        let arg = args.next("command group")?;
        match arg.as_str() {
            "--config" => config = Some(PathBuf::from(args.next("config path")?)),
            "-h" | "--help" | "help" => {
                return Ok(Invocation {
                    config,
                    command: Command::Help,
                });
            }
            _ => break arg,
        }
    };
    let command = match group.as_str() {
        "accounts" => Command::Accounts(parse_account(&mut args)?),
        "leases" => Command::Leases(parse_lease(&mut args)?),
        _ => return Err(UsageError::UnknownCommand(group)),
    };
    args.finish()?;
    Ok(Invocation { config, command })
}

fn parse_account(args: &mut Args) -> Result<AccountCommand, UsageError> {
    let name = args.next("accounts command")?;
    let command = match name.as_str() {
        "list" => AccountCommand::List,
        "get" => AccountCommand::Get {
            id: args.next("account id")?,
        },
        "ready" => AccountCommand::Ready,
        "reset-candidates" => AccountCommand::ResetCandidates,
        "status" => AccountCommand::Status {
            status: args.status("status")?,
        },
        "principal" => AccountCommand::Principal {
            role_arn: args.next("principal role arn")?,
        },
        "put" => {
            let id = args.next("account id")?;
            let status = args.status("status")?;
            let mut role_arn = None;
            let mut metadata = Metadata::new();
            while let Some(flag) = args.items.next() {
                match flag.as_str() {
                    "--role-arn" => role_arn = Some(args.next("role arn")?),
                    "--metadata" => metadata = parse_metadata(&args.next("metadata")?)?,
                    _ => return Err(UsageError::Unexpected(flag)),
                }
            }
            AccountCommand::Put {
                id,
                status,
                role_arn,
                metadata,
            }
        }
        "metadata" => AccountCommand::Metadata {
            id: args.next("account id")?,
            metadata: parse_metadata(&args.next("metadata")?)?,
        },
        "transition" => AccountCommand::Transition {
            id: args.next("account id")?,
            from: args.status("from status")?,
            to: args.status("to status")?,
        },
        "policy-hash" => {
            let id = args.next("account id")?;
            let next = args.next("next hash")?;
            let previous = match args.items.next() {
                Some(flag) if flag == "--from" => Some(args.next("previous hash")?),
                Some(flag) => return Err(UsageError::Unexpected(flag)),
                None => None,
            };
            AccountCommand::PolicyHash { id, previous, next }
        }
        "delete" => AccountCommand::Delete {
            id: args.next("account id")?,
        },
        _ => return Err(UsageError::UnknownCommand(name)),
    };
    Ok(command)
}

fn parse_lease(args: &mut Args) -> Result<LeaseCommand, UsageError> {
    let name = args.next("leases command")?;
    let command = match name.as_str() {
        "list" => LeaseCommand::List,
        "get" => LeaseCommand::Get {
            account: args.next("account id")?,
            principal: args.next("principal id")?,
        },
        "account" => LeaseCommand::Account {
            account: args.next("account id")?,
        },
        "principal" => LeaseCommand::Principal {
            principal: args.next("principal id")?,
        },
        "status" => LeaseCommand::Status {
            status: args.status("status")?,
        },
        "put" => LeaseCommand::Put {
            account: args.next("account id")?,
            principal: args.next("principal id")?,
            status: args.status("status")?,
        },
        "transition" => LeaseCommand::Transition {
            account: args.next("account id")?,
            principal: args.next("principal id")?,
            from: args.status("from status")?,
            to: args.status("to status")?,
        },
        "delete" => LeaseCommand::Delete {
            account: args.next("account id")?,
            principal: args.next("principal id")?,
        },
        _ => return Err(UsageError::UnknownCommand(name)),
    };
    Ok(command)
}

fn parse_metadata(raw: &str) -> Result<Metadata, UsageError> {
    match serde_json::from_str(raw) {
        Ok(serde_json::Value::Object(map)) => Ok(map),
        Ok(other) => Err(UsageError::Metadata(format!("got {other}"))),
        Err(err) => Err(UsageError::Metadata(err.to_string())),
    }
}
