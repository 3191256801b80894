// gamestate.rs — gamestate emission
// Converted from: myq2-original/server/sv_init.rs + sv_user.rs
// (SV_SendClientGameState), assembling configstrings and entity baselines
// into the reliable message that primes a new or resynchronising client.

use arenasv_common::common::{msg_write_byte, msg_write_delta_entity, msg_write_long, msg_write_string};
use arenasv_common::q_shared::EntityState;
use arenasv_common::qcommon::{SizeBuf, SVC_BASELINE, SVC_CONFIGSTRING, SVC_EOF, SVC_GAMESTATE};

use crate::server::{Client, ClientState, Server};

/// Assemble the single reliable message that primes a client.
///
/// Side effects (applied by the caller): `state = Primed`, `pureAuthentic =
/// false`, `gotCP = false`, `gamestateMessageNum = netchan.outgoingSequence`.
pub fn build_gamestate(sv: &Server, client: &Client) -> SizeBuf {
    let mut msg = SizeBuf::new(arenasv_common::qcommon::MAX_MSGLEN as i32);

    msg_write_long(&mut msg, client.last_client_command);

    msg_write_byte(&mut msg, SVC_GAMESTATE);
    msg_write_long(&mut msg, client.reliable_sequence);

    for (index, value) in sv.configstrings.iter().enumerate() {
        if value.is_empty() {
            continue;
        }
        msg_write_byte(&mut msg, SVC_CONFIGSTRING);
        msg_write_long(&mut msg, index as i32);
        msg_write_string(&mut msg, value);
    }

    let zero = EntityState::default();
    for baseline in sv.baselines.iter() {
        if baseline.number == 0 {
            continue;
        }
        msg_write_byte(&mut msg, SVC_BASELINE);
        msg_write_delta_entity(&zero, baseline, &mut msg, true, true);
    }

    msg_write_byte(&mut msg, SVC_EOF);

    msg_write_long(&mut msg, client.edict_index);
    msg_write_long(&mut msg, sv.checksum_feed);

    msg
}

/// Apply the gamestate-send side effects to a client slot in place.
pub fn mark_primed(client: &mut Client) {
    client.state = ClientState::Primed;
    client.pure_authentic = false;
    client.got_cp = false;
    client.gamestate_message_num = client.netchan.outgoing_sequence;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_configstrings_and_baselines_still_frame_correctly() {
        let sv = Server::default();
        let client = Client::default();
        let msg = build_gamestate(&sv, &client);
        assert!(msg.cursize > 0);
    }

    #[test]
    fn mark_primed_resets_pure_state() {
        let mut client = Client::default();
        client.pure_authentic = true;
        client.got_cp = true;
        client.netchan.outgoing_sequence = 42;
        mark_primed(&mut client);
        assert_eq!(client.state, ClientState::Primed);
        assert!(!client.pure_authentic);
        assert!(!client.got_cp);
        assert_eq!(client.gamestate_message_num, 42);
    }
}
