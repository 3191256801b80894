// sv_user.rs — per-packet inbound dispatch for connected clients
// Converted from: myq2-original/server/sv_user.c (SV_ExecuteClientMessage),
// looping over clc_* blocks and delegating to the reliable / usercmd_pipeline
// / pure modules built alongside this file.

use arenasv_common::cmd::CmdContext;
use arenasv_common::common::{com_printf, msg_read_byte, msg_read_long, msg_read_string};
use arenasv_common::net::net_is_local_address;
use arenasv_common::q_shared::UserCmd;
use arenasv_common::qcommon::{ClcOps, MAX_PACKET_USERCMDS, MAX_RELIABLE_COMMANDS, SizeBuf};

use crate::gamestate::{build_gamestate, mark_primed};
use crate::pure::{verify_pure, PureResult};
use crate::reliable::{admit, dispatch_builtin, chat_command_fits, is_chat_command, log_dropped_chat, AdmitResult, BuiltinOutcome};
use crate::server::{ClientState, ServerContext};
use crate::usercmd_pipeline::{apply_cmds, delta_key, gate, MoveOutcome};
use crate::userinfo::userinfo_changed;

/// What the caller (the per-client read loop) must do after a message is processed.
pub enum ClientMessageOutcome {
    Continue,
    Drop(String),
}

fn clc_op(byte: i32) -> Option<i32> {
    if byte < 0 || byte > ClcOps::Eof as i32 {
        None
    } else {
        Some(byte)
    }
}

/// The reliable-command text this client's last inbound command is checked against
/// when validating a `move`/`moveNoDelta` block's decode key. Both sides can
/// recompute this from state already exchanged, with no extra wire field needed for it.
fn last_ack_reliable_command(client: &crate::server::Client) -> String {
    if client.last_client_command < 0 {
        return String::new();
    }
    client.reliable_commands[(client.last_client_command as usize) % MAX_RELIABLE_COMMANDS].clone()
}

fn read_move_block(msg: &mut SizeBuf, no_delta: bool, previous: &UserCmd) -> (i32, Vec<UserCmd>, Vec<i32>) {
    let sent_key = msg_read_long(msg);
    let cmd_count = (msg_read_byte(msg).max(0) as usize).min(MAX_PACKET_USERCMDS);

    let mut cmds = Vec::with_capacity(cmd_count);
    let mut times = Vec::with_capacity(cmd_count);
    let mut base = *previous;

    for i in 0..cmd_count {
        let server_time = msg_read_long(msg);
        let from = if no_delta && i == 0 { UserCmd::default() } else { base };
        let cmd = arenasv_common::common::msg_read_delta_usercmd(msg, &from);
        base = cmd;
        cmds.push(cmd);
        times.push(server_time);
    }

    (sent_key, cmds, times)
}

/// Parse and act on every block in one client datagram. `msg` must already be
/// positioned past the netchan sequence header (see `netchan_process`).
pub fn sv_execute_client_message(ctx: &mut ServerContext, client_idx: usize, msg: &mut SizeBuf) -> ClientMessageOutcome {
    let packet_server_id = msg_read_long(msg);
    let message_acknowledge = msg_read_long(msg);
    let reliable_acknowledge = msg_read_long(msg);

    if packet_server_id < ctx.sv.server_id {
        com_printf("ignoring pre map_restart\n");
        return ClientMessageOutcome::Continue;
    }

    {
        let client = &mut ctx.svs.clients[client_idx];
        client.message_acknowledge = message_acknowledge;
        client.reliable_acknowledge = reliable_acknowledge;
    }

    let flood_protect = ctx.cvars.variable_value("sv_floodProtect") as i32;
    let now = ctx.svs.realtime;

    loop {
        if msg.readcount > msg.cursize {
            return ClientMessageOutcome::Drop("Bad message from client".to_string());
        }

        let op = match clc_op(msg_read_byte(msg)) {
            Some(op) => op,
            None => return ClientMessageOutcome::Drop("Unknown command char".to_string()),
        };

        if op == ClcOps::Eof as i32 {
            return ClientMessageOutcome::Continue;
        }
        if op == ClcOps::Bad as i32 || op == ClcOps::Nop as i32 {
            if op == ClcOps::Bad as i32 {
                continue;
            }
            continue;
        }

        if op == ClcOps::ClientCommand as i32 {
            let seq = msg_read_long(msg);
            let text = msg_read_string(msg);

            let admitted = {
                let client = &mut ctx.svs.clients[client_idx];
                admit(client, seq, &text, now, flood_protect)
            };

            let client_ok = match admitted {
                AdmitResult::Duplicate => continue,
                AdmitResult::Lost => return ClientMessageOutcome::Drop("Lost reliable commands".to_string()),
                AdmitResult::Accepted { client_ok } => client_ok,
            };

            let mut scratch = CmdContext::new();
            scratch.cmd_tokenize_string(&text, false);
            let argc = scratch.cmd_argc();
            let argv: Vec<String> = (0..argc).map(|i| scratch.cmd_argv(i).to_string()).collect();
            let argv_ref: Vec<&str> = argv.iter().map(String::as_str).collect();

            if argv_ref.is_empty() {
                continue;
            }

            if argv_ref[0] == "cp" {
                let (result, got_cp) = verify_pure(&ctx.sv, &argv_ref[1..], ctx.sv.server_id);
                let client = &mut ctx.svs.clients[client_idx];
                client.got_cp = got_cp;
                match result {
                    PureResult::StaleEpoch => {}
                    PureResult::Accepted => client.pure_authentic = true,
                    PureResult::Rejected => {
                        client.pure_authentic = false;
                        return ClientMessageOutcome::Drop("Unpure client detected.".to_string());
                    }
                }
                continue;
            }

            match dispatch_builtin(&mut ctx.svs.clients[client_idx], &argv_ref, client_ok) {
                BuiltinOutcome::Drop(reason) => return ClientMessageOutcome::Drop(reason),
                BuiltinOutcome::Handled => {
                    if argv_ref[0] == "donedl" {
                        let not_active = !matches!(ctx.svs.clients[client_idx].state, ClientState::Active);
                        if not_active {
                            let reply = build_gamestate(&ctx.sv, &ctx.svs.clients[client_idx]);
                            let client = &mut ctx.svs.clients[client_idx];
                            client.netchan.message.write(&reply.data[..reply.cursize as usize]);
                            mark_primed(client);
                        }
                    } else if argv_ref[0] == "userinfo" && client_ok {
                        let remote = ctx.svs.clients[client_idx].netchan.remote_address;
                        let is_lan = net_is_local_address(&remote);
                        let lan_force_rate = ctx.cvars.variable_value("sv_lanForceRate") != 0.0;
                        let sv_fps = ctx.cvars.variable_value("sv_fps") as i32;
                        let result = userinfo_changed(&mut ctx.svs.clients[client_idx], &remote, is_lan, lan_force_rate, sv_fps);
                        if result.overflowed {
                            return ClientMessageOutcome::Drop("userinfo string length exceeded".to_string());
                        }
                        if let Some(game) = ctx.game.as_mut() {
                            let userinfo = ctx.svs.clients[client_idx].userinfo.clone();
                            game.client_userinfo_changed(client_idx, &userinfo);
                        }
                    }
                }
                BuiltinOutcome::NotBuiltin => {
                    if !client_ok || matches!(ctx.svs.clients[client_idx].state, ClientState::Zombie) {
                        continue;
                    }
                    if is_chat_command(argv_ref[0]) && !chat_command_fits(&text) {
                        log_dropped_chat(argv_ref[0]);
                        continue;
                    }
                    if let Some(game) = ctx.game.as_mut() {
                        game.client_command(client_idx, &argv_ref);
                    }
                }
            }
            continue;
        }

        if op == ClcOps::Move as i32 || op == ClcOps::MoveNoDelta as i32 {
            let no_delta = op == ClcOps::MoveNoDelta as i32;
            let previous = ctx.svs.clients[client_idx].lastcmd;
            let (sent_key, cmds, times) = read_move_block(msg, no_delta, &previous);

            let expected_key = {
                let client = &ctx.svs.clients[client_idx];
                delta_key(ctx.sv.checksum_feed, client.message_acknowledge, &last_ack_reliable_command(client))
            };
            if sent_key != expected_key {
                return ClientMessageOutcome::Drop("Illegible client message".to_string());
            }

            let outcome = gate(&mut ctx.svs.clients[client_idx], ctx.sv.pure_enabled);
            match outcome {
                MoveOutcome::Ignored => {}
                MoveOutcome::ResendGamestate => {
                    let reply = build_gamestate(&ctx.sv, &ctx.svs.clients[client_idx]);
                    let client = &mut ctx.svs.clients[client_idx];
                    client.netchan.message.write(&reply.data[..reply.cursize as usize]);
                    mark_primed(client);
                }
                MoveOutcome::DropUnpure => {
                    return ClientMessageOutcome::Drop("Cannot validate pure client!".to_string());
                }
                MoveOutcome::Applied { .. } => {
                    let ServerContext { svs, game, .. } = ctx;
                    let client = &mut svs.clients[client_idx];
                    apply_cmds(client, &cmds, &times, |cmd| {
                        if let Some(game) = game.as_mut() {
                            game.client_think(client_idx, cmd);
                        }
                    });
                }
            }
            continue;
        }

        if op == ClcOps::VoipOpus as i32 || op == ClcOps::VoipSpeex as i32 {
            // Opaque to the core; length-prefixed payload is read and discarded.
            let len = msg_read_byte(msg).max(0) as usize;
            arenasv_common::common::msg_read_data(msg, len);
            continue;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::Client;
    use crate::sv_game::test_support::RecordingGameModule;
    use arenasv_common::common::{msg_write_byte, msg_write_long, msg_write_string};

    fn base_ctx() -> ServerContext {
        let mut ctx = ServerContext::default();
        ctx.svs.clients.resize_with(2, Client::default);
        ctx.svs.clients[0].state = ClientState::Active;
        ctx.game = Some(Box::new(RecordingGameModule::default()));
        ctx
    }

    fn write_header(msg: &mut SizeBuf, server_id: i32, msg_ack: i32, rel_ack: i32) {
        msg_write_long(msg, server_id);
        msg_write_long(msg, msg_ack);
        msg_write_long(msg, rel_ack);
    }

    #[test]
    fn stale_server_id_is_ignored_without_touching_state() {
        let mut ctx = base_ctx();
        ctx.sv.server_id = 10;
        let mut msg = SizeBuf::new(64);
        write_header(&mut msg, 3, 0, 0);
        msg_write_byte(&mut msg, ClcOps::Eof as i32);
        arenasv_common::common::msg_begin_reading(&mut msg);

        let outcome = sv_execute_client_message(&mut ctx, 0, &mut msg);
        assert!(matches!(outcome, ClientMessageOutcome::Continue));
    }

    #[test]
    fn client_command_with_unknown_sequence_gap_drops() {
        let mut ctx = base_ctx();
        ctx.svs.clients[0].last_client_command = 5;
        let mut msg = SizeBuf::new(256);
        write_header(&mut msg, 0, 0, 0);
        msg_write_byte(&mut msg, ClcOps::ClientCommand as i32);
        msg_write_long(&mut msg, 9);
        msg_write_string(&mut msg, "say hi");
        msg_write_byte(&mut msg, ClcOps::Eof as i32);
        arenasv_common::common::msg_begin_reading(&mut msg);

        let outcome = sv_execute_client_message(&mut ctx, 0, &mut msg);
        assert!(matches!(outcome, ClientMessageOutcome::Drop(_)));
    }

    #[test]
    fn client_command_forwards_to_game_module() {
        let mut ctx = base_ctx();
        let mut msg = SizeBuf::new(256);
        write_header(&mut msg, 0, 0, 0);
        msg_write_byte(&mut msg, ClcOps::ClientCommand as i32);
        msg_write_long(&mut msg, 1);
        msg_write_string(&mut msg, "say hi");
        msg_write_byte(&mut msg, ClcOps::Eof as i32);
        arenasv_common::common::msg_begin_reading(&mut msg);

        let outcome = sv_execute_client_message(&mut ctx, 0, &mut msg);
        assert!(matches!(outcome, ClientMessageOutcome::Continue));
    }

    #[test]
    fn move_block_with_forged_key_is_rejected() {
        let mut ctx = base_ctx();
        ctx.svs.clients[0].state = ClientState::Primed;
        let mut msg = SizeBuf::new(256);
        write_header(&mut msg, 0, 0, 0);
        msg_write_byte(&mut msg, ClcOps::Move as i32);
        msg_write_long(&mut msg, 0xDEAD); // wrong key
        msg_write_byte(&mut msg, 0); // cmd_count = 0
        msg_write_byte(&mut msg, ClcOps::Eof as i32);
        arenasv_common::common::msg_begin_reading(&mut msg);

        let outcome = sv_execute_client_message(&mut ctx, 0, &mut msg);
        assert!(matches!(outcome, ClientMessageOutcome::Drop(_)));
    }

    #[test]
    fn move_block_with_correct_key_activates_primed_client() {
        let mut ctx = base_ctx();
        ctx.svs.clients[0].state = ClientState::Primed;
        let key = delta_key(ctx.sv.checksum_feed, 0, "");

        let mut msg = SizeBuf::new(256);
        write_header(&mut msg, 0, 0, 0);
        msg_write_byte(&mut msg, ClcOps::Move as i32);
        msg_write_long(&mut msg, key);
        msg_write_byte(&mut msg, 1); // cmd_count = 1
        msg_write_long(&mut msg, 100); // server_time
        arenasv_common::common::msg_write_delta_usercmd(&mut msg, &UserCmd::default(), &UserCmd::default());
        msg_write_byte(&mut msg, ClcOps::Eof as i32);
        arenasv_common::common::msg_begin_reading(&mut msg);

        let outcome = sv_execute_client_message(&mut ctx, 0, &mut msg);
        assert!(matches!(outcome, ClientMessageOutcome::Continue));
        assert_eq!(ctx.svs.clients[0].state, ClientState::Active);
    }
}
