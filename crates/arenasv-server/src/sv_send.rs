// sv_send.rs — outbound reliable message delivery
// Converted from: myq2-original/server/sv_send.c (SV_ClientPrintf,
// SV_BroadcastPrintf, SV_SendClientMessages), trimmed to the reliable
// command channel this crate owns. Entity/snapshot/PVS delta emission,
// demo recording and rcon redirection are Non-goals and have no
// counterpart here.

use rayon::prelude::*;

use arenasv_common::common::{com_printf, msg_write_byte, msg_write_string};
use arenasv_common::net_chan::netchan_transmit;
use arenasv_common::q_shared::PRINT_HIGH;
use arenasv_common::qcommon::SvcOps;

use crate::server::{Client, ClientState, ServerContext};

/// Keep-alive interval: a client with nothing queued still gets an empty
/// reliable transmit after this many ms, matching the engine's own
/// `curtime - last_sent > 1000` check in `SV_SendClientMessages`.
const OUTBOUND_KEEPALIVE_MSEC: i32 = 1000;

/// Queue an `svc_print` block addressed to a single client.
/// Equivalent to SV_ClientPrintf.
pub fn sv_client_printf(cl: &mut Client, level: i32, msg: &str) {
    msg_write_byte(&mut cl.netchan.message, SvcOps::Print as i32);
    msg_write_byte(&mut cl.netchan.message, level);
    msg_write_string(&mut cl.netchan.message, msg);
}

/// Queue an `svc_print` to every connected, non-zombie client and echo it
/// to the console. Equivalent to SV_BroadcastPrintf; used by the drop
/// procedure to announce a disconnect.
pub fn sv_broadcast_printf(ctx: &mut ServerContext, level: i32, msg: &str) {
    com_printf(&format!("{}\n", msg));

    let max = ctx.maxclients_value as usize;
    let num_slots = max.min(ctx.svs.clients.len());
    for i in 0..num_slots {
        let cl = &mut ctx.svs.clients[i];
        if matches!(cl.state, ClientState::Free | ClientState::Zombie) {
            continue;
        }
        sv_client_printf(cl, level, msg);
    }
}

enum SendAction {
    Skip,
    Transmit,
}

/// Flush every client's accumulated reliable buffer over its netchan, and
/// report when the next walk is due. The tick loop (or whatever drives it)
/// is free to sleep or multiplex until then. Runs the same two-phase rayon discipline as the ping/timeout
/// sweeps in `sv_main.rs`: a read-only parallel pass decides who gets a
/// transmit, then a sequential pass performs it.
pub fn sv_send_client_messages(ctx: &mut ServerContext) -> i32 {
    let max = ctx.maxclients_value as usize;
    let num_slots = max.min(ctx.svs.clients.len());
    let curtime = ctx.svs.realtime;

    let client_data: Vec<_> = (0..num_slots)
        .map(|i| {
            let c = &ctx.svs.clients[i];
            (c.state, c.netchan.message.cursize, c.netchan.last_sent)
        })
        .collect();

    let actions: Vec<SendAction> = client_data
        .par_iter()
        .map(|&(state, cursize, last_sent)| {
            if matches!(state, ClientState::Free) {
                SendAction::Skip
            } else if cursize > 0 || curtime - last_sent >= OUTBOUND_KEEPALIVE_MSEC {
                SendAction::Transmit
            } else {
                SendAction::Skip
            }
        })
        .collect();

    for (i, action) in actions.into_iter().enumerate() {
        if let SendAction::Transmit = action {
            let qport = ctx.svs.clients[i].netchan.qport;
            netchan_transmit(&mut ctx.svs.clients[i].netchan, &[], curtime, qport);
        }
    }

    curtime + OUTBOUND_KEEPALIVE_MSEC
}

#[cfg(test)]
mod tests {
    use super::*;
    use arenasv_common::common::msg_begin_reading;
    use arenasv_common::qcommon::NetAdr;

    #[test]
    fn client_printf_queues_a_print_block() {
        let mut client = Client::default();
        sv_client_printf(&mut client, PRINT_HIGH, "hello");
        assert!(client.netchan.message.cursize > 0);
        assert_eq!(client.netchan.message.data[0], SvcOps::Print as u8);
        assert_eq!(client.netchan.message.data[1] as i32, PRINT_HIGH);
    }

    #[test]
    fn broadcast_printf_skips_free_and_zombie_slots() {
        let mut ctx = ServerContext::default();
        ctx.svs.clients.resize_with(3, Client::default);
        ctx.maxclients_value = 3;
        ctx.svs.clients[0].state = ClientState::Active;
        ctx.svs.clients[1].state = ClientState::Free;
        ctx.svs.clients[2].state = ClientState::Zombie;

        sv_broadcast_printf(&mut ctx, PRINT_HIGH, "Player disconnected");

        assert!(ctx.svs.clients[0].netchan.message.cursize > 0);
        assert_eq!(ctx.svs.clients[1].netchan.message.cursize, 0);
        assert_eq!(ctx.svs.clients[2].netchan.message.cursize, 0);
    }

    #[test]
    fn send_client_messages_transmits_queued_reliable_data() {
        let mut ctx = ServerContext::default();
        ctx.svs.clients.resize_with(1, Client::default);
        ctx.maxclients_value = 1;
        ctx.svs.clients[0].state = ClientState::Active;
        ctx.svs.clients[0].netchan.remote_address = NetAdr::default();
        sv_client_printf(&mut ctx.svs.clients[0], PRINT_HIGH, "hi");

        let next_due = sv_send_client_messages(&mut ctx);
        assert_eq!(next_due, ctx.svs.realtime + OUTBOUND_KEEPALIVE_MSEC);
        assert_eq!(ctx.svs.clients[0].netchan.message.cursize, 0);
    }

    #[test]
    fn send_client_messages_skips_free_slots() {
        let mut ctx = ServerContext::default();
        ctx.svs.clients.resize_with(1, Client::default);
        ctx.maxclients_value = 1;
        // state defaults to Free
        let before = ctx.svs.clients[0].netchan.last_sent;
        sv_send_client_messages(&mut ctx);
        assert_eq!(ctx.svs.clients[0].netchan.last_sent, before);
    }

    #[test]
    fn msg_begin_reading_resets_readcount() {
        let mut msg = arenasv_common::qcommon::SizeBuf::new(16);
        msg.readcount = 5;
        msg_begin_reading(&mut msg);
        assert_eq!(msg.readcount, 0);
    }
}
