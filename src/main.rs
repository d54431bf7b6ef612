//! casemail CLI entry point.
//!
//! Operator commands over the messaging core: apply the schema, inspect a
//! user's contacts, threads, inbox and sent box, send a message, or mark one
//! read. Results are printed to stdout as JSON; logs go to stderr.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, warn};

use casemail::config::{self, Config};
use casemail::messaging::{
    CaseId, MarkReadOutcome, MessageId, MessagingService, SendMessageRequest, SqliteMessageStore,
    UserId,
};
use casemail::{db, logging};

/// casemail: internal messaging for the case-management backend.
#[derive(Parser)]
#[command(name = "casemail", version, about)]
struct Cli {
    /// Config file (default: `$CASEMAIL_CONFIG` or `~/.casemail/config.toml`).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the config.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Command,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Command {
    /// Create the database and apply the schema.
    Migrate,
    /// List the contacts a user may message.
    Contacts {
        /// Viewing user.
        #[arg(long)]
        user: UserId,
        /// Viewing user's role (ADMIN, ADVOCATE, CLIENT, CLERK).
        #[arg(long)]
        role: String,
    },
    /// Show the conversation between two users, marking incoming messages read.
    Thread {
        /// Viewing user.
        #[arg(long)]
        user: UserId,
        /// Other participant.
        #[arg(long)]
        other: UserId,
    },
    /// List messages received by a user.
    Inbox {
        /// Recipient.
        #[arg(long)]
        user: UserId,
    },
    /// List messages sent by a user.
    Sent {
        /// Sender.
        #[arg(long)]
        user: UserId,
    },
    /// Send a message.
    Send {
        /// Sender.
        #[arg(long)]
        from: UserId,
        /// Recipient.
        #[arg(long)]
        to: UserId,
        /// Message body.
        #[arg(long)]
        text: String,
        /// Case the message is about.
        #[arg(long = "case")]
        case_id: Option<CaseId>,
        /// Subject line.
        #[arg(long)]
        subject: Option<String>,
    },
    /// Mark a single message read.
    MarkRead {
        /// Message id.
        id: MessageId,
    },
    /// Show a single message in full.
    Show {
        /// Message id.
        id: MessageId,
    },
}

#[derive(Serialize)]
struct SendReceipt {
    message_id: MessageId,
    status: &'static str,
}

#[derive(Serialize)]
struct MarkReadReceipt {
    message_id: MessageId,
    outcome: MarkReadOutcome,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    // A missing .env is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config_path = match cli.config.clone() {
        Some(path) => path,
        None => config::config_path_with(|key| std::env::var(key).ok())?,
    };
    let mut config = config::load_config_or_default(&config_path)?;
    config.apply_overrides(|key| std::env::var(key).ok());
    if let Some(base) = config_path.parent() {
        config.resolve_database_path(base);
    }
    // A path given on the command line is relative to the working directory.
    if let Some(path) = cli.database.clone() {
        config.database.path = path;
    }

    let _logging_guard = match &config.logging.dir {
        Some(dir) => Some(logging::init_production(dir)?),
        None => {
            logging::init_cli();
            None
        }
    };

    run(cli.command, config).await
}

async fn run(command: Command, config: Config) -> anyhow::Result<ExitCode> {
    let pool = db::open_database(&config.database.path, config.database.max_connections).await?;
    if matches!(command, Command::Migrate) {
        info!(path = %config.database.path.display(), "schema applied");
        pool.close().await;
        return Ok(ExitCode::SUCCESS);
    }

    let store = Arc::new(SqliteMessageStore::new(pool.clone()));
    let service = MessagingService::new(store, config.messaging.clone());

    let code = match command {
        Command::Migrate => ExitCode::SUCCESS,
        Command::Contacts { user, role } => print_json(&service.contacts(user, &role).await?)?,
        Command::Thread { user, other } => print_json(&service.thread(user, other).await?)?,
        Command::Inbox { user } => print_json(&service.inbox(user).await?)?,
        Command::Sent { user } => print_json(&service.sent(user).await?)?,
        Command::Send {
            from,
            to,
            text,
            case_id,
            subject,
        } => {
            let request = SendMessageRequest {
                sender_id: Some(from),
                recipient_id: Some(to),
                text: Some(text),
                case_id,
                subject,
            };
            let message_id = service.send(request).await?;
            print_json(&SendReceipt {
                message_id,
                status: "sent",
            })?
        }
        Command::MarkRead { id } => {
            let outcome = service.mark_as_read(id).await?;
            print_json(&MarkReadReceipt {
                message_id: id,
                outcome,
            })?;
            if outcome.is_found() {
                ExitCode::SUCCESS
            } else {
                warn!(message_id = id, "message not found");
                ExitCode::FAILURE
            }
        }
        Command::Show { id } => match service.message(id).await? {
            Some(detail) => print_json(&detail)?,
            None => {
                warn!(message_id = id, "message not found");
                ExitCode::FAILURE
            }
        },
    };

    pool.close().await;
    Ok(code)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<ExitCode> {
    let rendered = serde_json::to_string_pretty(value).context("failed to render output")?;
    println!("{rendered}");
    Ok(ExitCode::SUCCESS)
}
