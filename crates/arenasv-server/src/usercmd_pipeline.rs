// usercmd_pipeline.rs — user-command (input) pipeline
// Converted from: myq2-original/server/sv_user.rs (the `Move` op branch of
// sv_execute_client_message), rebuilt around a delta-key derived from the
// server's checksum feed and reliable-command history.

use arenasv_common::common::hash32;
use arenasv_common::q_shared::UserCmd;

use crate::server::{Client, ClientState};

/// The key a `move`/`moveNoDelta` batch is decoded against: entangles
/// input decoding with the server's current content epoch and the client's
/// reliable-command history, so replays across epochs fail to decode.
pub fn delta_key(checksum_feed: i32, message_acknowledge: i32, last_ack_reliable_command: &str) -> i32 {
    checksum_feed ^ message_acknowledge ^ (hash32(last_ack_reliable_command) as i32)
}

pub enum MoveOutcome {
    /// Packet silently ignored (pure mode lost its `cp`, client not yet Active).
    Ignored,
    /// Gamestate should be resent (Active client lost/skipped its `cp`).
    ResendGamestate,
    /// Pure mode required but the client never authenticated; drop it.
    DropUnpure,
    /// Cmds were (possibly partially) applied; `became_active` is true on the
    /// Primed → Active transition.
    Applied { became_active: bool },
}

/// Decide what to do with an inbound batch of cmds before any are applied,
/// per the pure-mode and state-machine gates.
pub fn gate(client: &mut Client, pure_enabled: bool) -> MoveOutcome {
    if pure_enabled && !client.got_cp {
        return if matches!(client.state, ClientState::Active) {
            MoveOutcome::ResendGamestate
        } else {
            MoveOutcome::Ignored
        };
    }

    let became_active = if matches!(client.state, ClientState::Primed) {
        client.state = ClientState::Active;
        true
    } else {
        false
    };

    if pure_enabled && !client.pure_authentic {
        return MoveOutcome::DropUnpure;
    }

    if !matches!(client.state, ClientState::Active) {
        client.message_acknowledge = -1;
        return MoveOutcome::Applied { became_active: false };
    }

    MoveOutcome::Applied { became_active }
}

/// Feed decoded cmds to the game module's `client_think` hook in order,
/// honoring the serverTime monotonicity / map-restart-skip rule.
pub fn apply_cmds<F: FnMut(&UserCmd)>(client: &mut Client, cmds: &[UserCmd], server_times: &[i32], mut think: F) {
    for (cmd, &server_time) in cmds.iter().zip(server_times.iter()) {
        if server_time <= client.last_usercmd_server_time {
            continue;
        }
        think(cmd);
        client.lastcmd = *cmd;
        client.last_usercmd_server_time = server_time;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delta_key_changes_with_any_input() {
        let a = delta_key(0xFF, 10, "spawn");
        let b = delta_key(0xFE, 10, "spawn");
        let c = delta_key(0xFF, 11, "spawn");
        let d = delta_key(0xFF, 10, "other");
        assert_ne!(a, b);
        assert_ne!(a, c);
        assert_ne!(a, d);
    }

    #[test]
    fn primed_transitions_to_active_on_first_move() {
        let mut c = Client::default();
        c.state = ClientState::Primed;
        let outcome = gate(&mut c, false);
        assert!(matches!(outcome, MoveOutcome::Applied { became_active: true }));
        assert_eq!(c.state, ClientState::Active);
    }

    #[test]
    fn pure_mode_without_cp_on_active_client_resends_gamestate() {
        let mut c = Client::default();
        c.state = ClientState::Active;
        c.got_cp = false;
        let outcome = gate(&mut c, true);
        assert!(matches!(outcome, MoveOutcome::ResendGamestate));
    }

    #[test]
    fn pure_mode_unauthentic_drops_client() {
        let mut c = Client::default();
        c.state = ClientState::Primed;
        c.got_cp = true;
        c.pure_authentic = false;
        let outcome = gate(&mut c, true);
        assert!(matches!(outcome, MoveOutcome::DropUnpure));
    }

    #[test]
    fn apply_cmds_skips_nonmonotonic_times() {
        let mut c = Client::default();
        c.last_usercmd_server_time = 100;
        let cmds = [UserCmd::default(), UserCmd::default()];
        let times = [50, 150];
        let mut seen = Vec::new();
        apply_cmds(&mut c, &cmds, &times, |_| seen.push(()));
        assert_eq!(seen.len(), 1);
        assert_eq!(c.last_usercmd_server_time, 150);
    }
}
