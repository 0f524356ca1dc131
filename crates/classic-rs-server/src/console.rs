//! Server console commands, read from stdin.

use classic_rs_proto::packets::{Message, UpdateUserType, USER_TYPE_NORMAL, USER_TYPE_OP};
use classic_rs_proto::Packet;
use classic_rs_world::storage::WorldStorage;
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;

use crate::state::ServerState;

/// Result of a console command.
#[derive(Debug)]
pub struct CommandResult {
    pub success: bool,
    /// Lines to print back to the operator.
    pub messages: Vec<String>,
    /// If true, the server should shut down.
    pub should_stop: bool,
}

impl CommandResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            messages: vec![message.into()],
            should_stop: false,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            messages: vec![message.into()],
            should_stop: false,
        }
    }
}

const HELP: &[(&str, &str)] = &[
    ("help", "List available commands"),
    ("list", "Show online players"),
    ("say <message>", "Broadcast a message to all players"),
    ("kick <player> [reason]", "Disconnect a player"),
    ("ban <player> [reason]", "Ban a player and disconnect them"),
    ("unban <player>", "Lift a ban"),
    ("op <player>", "Grant operator status"),
    ("deop <player>", "Revoke operator status"),
    ("save", "Save the world now"),
    ("stop", "Stop the server"),
];

/// Forward trimmed, non-empty stdin lines to `tx`.
pub fn spawn_stdin_reader(tx: mpsc::Sender<String>) {
    tokio::spawn(async move {
        let stdin = tokio::io::BufReader::new(tokio::io::stdin());
        let mut lines = stdin.lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim().to_string();
            if !line.is_empty() && tx.send(line).await.is_err() {
                break;
            }
        }
    });
}

/// Run one console command line.
pub async fn execute(state: &ServerState, storage: &WorldStorage, line: &str) -> CommandResult {
    let mut parts = line.split_whitespace();
    let Some(command) = parts.next() else {
        return CommandResult::err("Empty command");
    };
    let args: Vec<&str> = parts.collect();

    match command.to_ascii_lowercase().as_str() {
        "help" => CommandResult {
            success: true,
            messages: HELP
                .iter()
                .map(|(usage, description)| format!("{usage}: {description}"))
                .collect(),
            should_stop: false,
        },
        "list" => cmd_list(state),
        "say" => cmd_say(state, &args),
        "kick" => cmd_kick(state, &args),
        "ban" => cmd_ban(state, &args),
        "unban" => cmd_unban(state, &args),
        "op" => cmd_op(state, &args, true),
        "deop" => cmd_op(state, &args, false),
        "save" => match state.save_world(storage).await {
            Ok(()) => CommandResult::ok(format!("Saved world to {}", storage.path().display())),
            Err(e) => CommandResult::err(format!("Save failed: {e}")),
        },
        "stop" => CommandResult {
            success: true,
            messages: vec!["Stopping the server".into()],
            should_stop: true,
        },
        other => CommandResult::err(format!("Unknown command: {other}. Type 'help' for a list.")),
    }
}

fn reason_from(args: &[&str], default: &str) -> String {
    if args.len() > 1 {
        args[1..].join(" ")
    } else {
        default.to_string()
    }
}

fn cmd_list(state: &ServerState) -> CommandResult {
    let online = state.dispatcher.online();
    let names: Vec<String> = online.into_iter().map(|(_, name)| name).collect();
    CommandResult::ok(format!(
        "There are {}/{} players online: {}",
        names.len(),
        state.settings.max_players,
        names.join(", ")
    ))
}

fn cmd_say(state: &ServerState, args: &[&str]) -> CommandResult {
    if args.is_empty() {
        return CommandResult::err("Usage: say <message>");
    }
    let text = format!("[Server] {}", args.join(" "));
    state
        .dispatcher
        .broadcast(Packet::Message(Message::system(text.clone())));
    CommandResult::ok(text)
}

fn cmd_kick(state: &ServerState, args: &[&str]) -> CommandResult {
    let Some(name) = args.first() else {
        return CommandResult::err("Usage: kick <player> [reason]");
    };
    let reason = reason_from(args, "Kicked by an operator");
    if state.dispatcher.kick(name, &reason) {
        CommandResult::ok(format!("Kicked {name}: {reason}"))
    } else {
        CommandResult::err(format!("Player not found: {name}"))
    }
}

fn cmd_ban(state: &ServerState, args: &[&str]) -> CommandResult {
    let Some(name) = args.first() else {
        return CommandResult::err("Usage: ban <player> [reason]");
    };
    let reason = reason_from(args, "Banned by an operator");
    state.permissions.lock().ban(name, reason.clone());
    state.dispatcher.kick(name, &format!("Banned: {reason}"));
    CommandResult::ok(format!("Banned {name}: {reason}"))
}

fn cmd_unban(state: &ServerState, args: &[&str]) -> CommandResult {
    let Some(name) = args.first() else {
        return CommandResult::err("Usage: unban <player>");
    };
    if state.permissions.lock().unban(name) {
        CommandResult::ok(format!("Unbanned {name}"))
    } else {
        CommandResult::err(format!("{name} is not banned"))
    }
}

fn cmd_op(state: &ServerState, args: &[&str], grant: bool) -> CommandResult {
    let Some(name) = args.first() else {
        return CommandResult::err(if grant {
            "Usage: op <player>"
        } else {
            "Usage: deop <player>"
        });
    };
    let changed = {
        let mut permissions = state.permissions.lock();
        if permissions.is_config_op(name) {
            return CommandResult::err(format!(
                "{name} is an operator in server.toml; edit the config to change it"
            ));
        }
        if grant {
            permissions.op(name)
        } else {
            permissions.deop(name)
        }
    };
    if !changed {
        return CommandResult::err(if grant {
            format!("{name} is already an operator")
        } else {
            format!("{name} is not an operator")
        });
    }

    if let Some((id, _, _)) = state.dispatcher.find(name) {
        let user_type = if grant { USER_TYPE_OP } else { USER_TYPE_NORMAL };
        state
            .dispatcher
            .send_to(id, Packet::UpdateUserType(UpdateUserType { user_type }));
        let notice = if grant {
            "You are now an operator"
        } else {
            "You are no longer an operator"
        };
        state
            .dispatcher
            .send_to(id, Packet::Message(Message::system(notice)));
    }
    CommandResult::ok(if grant {
        format!("Opped {name}")
    } else {
        format!("De-opped {name}")
    })
}
