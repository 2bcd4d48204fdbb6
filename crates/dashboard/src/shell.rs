//! Line-oriented command shell

use anyhow::Context;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::warn;

use taskdash_core::auth::{AuthService, LocalAuth};
use taskdash_core::controller::Outcome;
use taskdash_core::dashboard::{Dashboard, Snapshot};
use taskdash_core::session::Session;
use taskdash_firestore::FirebaseAuth;

use crate::render;

pub const HELP: &str = "\
Commands:
  login <email> [password]  sign in
  add <text>                add a task, or save the task being edited
  edit <n>                  edit task n
  cancel                    stop editing
  toggle <n>                mark task n done / not done
  delete <n>                delete task n
  list                      reload the list
  logout                    sign out
  help                      show this help
  quit                      exit";

/// The auth backend the shell signs in with
pub enum Login {
    Local(Arc<LocalAuth>),
    Firebase(Arc<FirebaseAuth>),
}

impl Login {
    pub fn service(&self) -> Arc<dyn AuthService> {
        match self {
            Self::Local(auth) => Arc::clone(auth) as Arc<dyn AuthService>,
            Self::Firebase(auth) => Arc::clone(auth) as Arc<dyn AuthService>,
        }
    }

    async fn sign_in(&self, email: &str, password: Option<&str>) -> taskdash_core::Result<Session> {
        match self {
            Self::Local(auth) => auth.sign_in(email),
            Self::Firebase(auth) => {
                let password = password.ok_or_else(|| {
                    taskdash_core::Error::InvalidInput("A password is required".to_string())
                })?;
                auth.sign_in(email, password).await
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Login {
        email: String,
        password: Option<String>,
    },
    Add(String),
    Edit(usize),
    Cancel,
    Toggle(usize),
    Delete(usize),
    List,
    Logout,
    Help,
    Quit,
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Command>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();

    let position = |rest: &str| {
        rest.parse::<usize>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| format!("'{}' expects a task number", word))
    };

    let command = match word.to_ascii_lowercase().as_str() {
        "login" => {
            let mut parts = rest.split_whitespace();
            let email = parts
                .next()
                .ok_or_else(|| "login expects an email".to_string())?;
            Command::Login {
                email: email.to_string(),
                password: parts.next().map(str::to_string),
            }
        }
        // The text itself may be blank; the dashboard ignores it
        "add" => Command::Add(rest.to_string()),
        "edit" => Command::Edit(position(rest)?),
        "cancel" => Command::Cancel,
        "toggle" | "done" => Command::Toggle(position(rest)?),
        "delete" | "rm" => Command::Delete(position(rest)?),
        "list" | "ls" => Command::List,
        "logout" => Command::Logout,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command '{}', try 'help'", other)),
    };
    Ok(Some(command))
}

/// Run the shell until `quit` or end of input
pub async fn run(dashboard: &Dashboard, login: &Login) -> anyhow::Result<()> {
    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    write(&mut stdout, HELP).await?;
    write(&mut stdout, &render::render(&dashboard.snapshot().await)).await?;

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let command = match parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                write(&mut stdout, &message).await?;
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Some(message) = execute(dashboard, login, command).await {
            write(&mut stdout, &message).await?;
        }
        write(&mut stdout, &render::render(&dashboard.snapshot().await)).await?;
    }
    Ok(())
}

/// Carry out one command, returning a message for the user if any
async fn execute(dashboard: &Dashboard, login: &Login, command: Command) -> Option<String> {
    let snapshot = dashboard.snapshot().await;
    let outcome = match command {
        Command::Login { email, password } => {
            return match login.sign_in(&email, password.as_deref()).await {
                Ok(session) => {
                    dashboard.gate().settled_on(Some(session.user_id.as_str())).await;
                    None
                }
                Err(e) => {
                    warn!("Sign-in failed: {}", e);
                    Some(format!("Sign-in failed: {}", e))
                }
            };
        }
        Command::Logout => {
            return match dashboard.logout().await {
                Ok(()) => {
                    dashboard.gate().settled_on(None).await;
                    Some("Signed out.".to_string())
                }
                Err(e) => Some(format!("Sign-out failed: {}", e)),
            };
        }
        Command::Help => return Some(HELP.to_string()),
        Command::Quit => return None,
        Command::Add(text) => dashboard.submit(&text).await,
        Command::Cancel => dashboard.cancel_edit().await,
        Command::List => dashboard.refresh().await,
        Command::Edit(n) => match task_id(&snapshot, n) {
            Ok(id) => dashboard.edit(&id).await,
            Err(message) => return Some(message),
        },
        Command::Toggle(n) => match task_id(&snapshot, n) {
            Ok(id) => dashboard.toggle(&id).await,
            Err(message) => return Some(message),
        },
        Command::Delete(n) => match task_id(&snapshot, n) {
            Ok(id) => dashboard.delete(&id).await,
            Err(message) => return Some(message),
        },
    };
    render::outcome_message(outcome)
}

fn task_id(snapshot: &Snapshot, position: usize) -> Result<String, String> {
    snapshot
        .task_at(position)
        .map(|t| t.id.clone())
        .ok_or_else(|| format!("There is no task {}", position))
}

async fn write(stdout: &mut tokio::io::Stdout, text: &str) -> anyhow::Result<()> {
    stdout.write_all(text.as_bytes()).await?;
    stdout.write_all(b"\n").await?;
    stdout.flush().await?;
    Ok(())
}
