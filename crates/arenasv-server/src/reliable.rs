// reliable.rs — reliable command channel
// Converted from: myq2-original/server/sv_user.rs (the clc_clientCommand
// dispatch table), with strictly-increasing sequence admission, gap-detection
// drop, flood protection, and chat-command size capping.

use arenasv_common::common::com_printf;
use arenasv_common::qcommon::MAX_RELIABLE_COMMANDS;

use crate::server::{Client, ClientState};

/// Outcome of admitting one inbound reliable command.
pub enum AdmitResult {
    /// Sequence number was a duplicate of an already-executed command; ignore.
    Duplicate,
    /// A gap was detected in the sequence; caller must drop the client.
    Lost,
    /// Command accepted. `client_ok` is false while flood-suppressed — built-ins
    /// still run, but the command must not reach the game module.
    Accepted { client_ok: bool },
}

/// Admits a command with execute-exactly-once ordering plus the
/// 1-command-per-second flood allowance while ACTIVE.
pub fn admit(client: &mut Client, seq: i32, text: &str, now: i32, flood_protect: i32) -> AdmitResult {
    if seq <= client.last_client_command {
        return AdmitResult::Duplicate;
    }
    if seq > client.last_client_command + 1 {
        return AdmitResult::Lost;
    }

    client.reliable_commands[(seq as usize) % MAX_RELIABLE_COMMANDS] = text.to_string();
    client.last_client_command = seq;

    let active_and_flood_checked = matches!(client.state, ClientState::Active);
    let client_ok = if active_and_flood_checked {
        if now < client.next_reliable_time {
            client.numcmds += 1;
            if client.numcmds > flood_protect {
                false
            } else {
                true
            }
        } else {
            client.numcmds = 1;
            true
        }
    } else {
        true
    };

    if active_and_flood_checked {
        client.next_reliable_time = now + 1000;
    }

    AdmitResult::Accepted { client_ok }
}

/// Built-in reliable commands handled before falling through to the game module.
pub enum BuiltinOutcome {
    /// Not a built-in; forward to the game module if `client_ok` and state allows.
    NotBuiltin,
    /// Handled here; do not forward.
    Handled,
    /// Handled, and the client must be dropped with the given reason.
    Drop(String),
}

/// Dispatch the well-known built-ins (`userinfo`, `disconnect`, `vdr`, `donedl`);
/// `cp` is handled separately by `pure::verify_pure` since it needs server-wide
/// pure-mode state, and `voip` preference toggles are a thin passthrough.
pub fn dispatch_builtin(client: &mut Client, argv: &[&str], client_ok: bool) -> BuiltinOutcome {
    if argv.is_empty() {
        return BuiltinOutcome::NotBuiltin;
    }

    match argv[0] {
        "disconnect" => BuiltinOutcome::Drop("disconnected".to_string()),
        "userinfo" => {
            if argv.len() < 2 {
                return BuiltinOutcome::Handled;
            }
            if client_ok {
                client.userinfo = argv[1].to_string();
            } else {
                // staged for application once flood pressure clears
                client.pending_userinfo = Some(argv[1].to_string());
            }
            BuiltinOutcome::Handled
        }
        "vdr" => {
            client.pure_authentic = false;
            client.got_cp = false;
            BuiltinOutcome::Handled
        }
        "donedl" => {
            // Resend of the gamestate (if not yet Active) is the caller's job —
            // it owns the server-wide config needed to rebuild the message.
            BuiltinOutcome::Handled
        }
        "voip" => BuiltinOutcome::Handled,
        _ => BuiltinOutcome::NotBuiltin,
    }
}

/// True if `argv[0]` is a chat-like command subject to the `$`-variable-aware
/// size cap.
pub fn is_chat_command(cmd: &str) -> bool {
    matches!(cmd, "say" | "say_team" | "tell" | "ut_radio")
}

pub const MAX_CHAT_COMMAND_LEN: usize = 150;
/// Extra budget credited per `$`-variable reference, since expansion happens
/// downstream and could otherwise be used to smuggle a much larger payload.
pub const DOLLAR_VAR_COST: usize = 20;

/// True if `text` fits the flood-resistant chat-command size budget.
pub fn chat_command_fits(text: &str) -> bool {
    let dollar_count = text.matches('$').count();
    text.len() + dollar_count * DOLLAR_VAR_COST <= MAX_CHAT_COMMAND_LEN
}

pub fn log_dropped_chat(reason: &str) {
    com_printf(&format!("dropped oversized chat command: {}\n", reason));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_sequence_is_ignored() {
        let mut c = Client::default();
        c.last_client_command = 5;
        assert!(matches!(admit(&mut c, 5, "x", 0, 10), AdmitResult::Duplicate));
    }

    #[test]
    fn gap_is_lost() {
        let mut c = Client::default();
        c.last_client_command = 5;
        assert!(matches!(admit(&mut c, 8, "x", 0, 10), AdmitResult::Lost));
    }

    #[test]
    fn flood_suppresses_after_threshold_while_active() {
        let mut c = Client::default();
        c.state = ClientState::Active;
        c.next_reliable_time = 1000;
        let mut last_ok = true;
        for i in 0..12 {
            if let AdmitResult::Accepted { client_ok } = admit(&mut c, i + 1, "x", 500, 10) {
                last_ok = client_ok;
            }
        }
        assert!(!last_ok);
    }

    #[test]
    fn chat_budget_penalizes_dollar_expansions() {
        let long_plain = "a".repeat(200);
        assert!(!chat_command_fits(&long_plain));
        let short_plain = "a".repeat(100);
        assert!(chat_command_fits(&short_plain));
        let with_vars = format!("{}{}", "a".repeat(100), "$var".repeat(3));
        assert!(!chat_command_fits(&with_vars));
        let all_dollars = "$".repeat(50);
        assert!(!chat_command_fits(&all_dollars));
    }
}
