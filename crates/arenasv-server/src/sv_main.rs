// sv_main.rs — connectionless handshake dispatch and the server tick loop
//
// Converted from: myq2-original/server/sv_main.c (SV_ConnectionlessPacket,
// SVC_GetChallenge, SVC_DirectConnect, SV_DropClient, SV_CalcPings,
// SV_CheckTimeouts, SV_ReadPackets, SV_Frame), delegating to the
// challenge/ban/rate_limit/userinfo/gamestate modules built alongside this
// file rather than re-deriving their logic inline.

use rayon::prelude::*;

use arenasv_common::cmd::CmdContext;
use arenasv_common::common::{com_dprintf, com_error, com_printf, msg_read_long, msg_read_string_line, rand_i32};
use arenasv_common::net::{net_adr_to_string, net_compare_base_adr, net_get_packet, net_is_local_address};
use arenasv_common::net_chan::{netchan_out_of_band_print, netchan_process, netchan_set_protocol, netchan_setup};
use arenasv_common::q_shared::{info_set_value_for_key, info_value_for_key, ERR_FATAL, MAX_INFO_STRING};
use arenasv_common::qcommon::{NetSrc, PROTOCOL_VERSION, PROTOCOL_VERSION_LEGACY};

use crate::server::{Client, ClientState, ServerContext, LATENCY_COUNTS, ZOMBIE_LINGER_MSEC};
use crate::sv_user::{sv_execute_client_message, ClientMessageOutcome};
use crate::userinfo::userinfo_changed;

/// Idle-timeout threshold for a CONNECTED/PRIMED/ACTIVE slot with no inbound
/// traffic. There is no separate outer loop in this engine, so the tick loop
/// owns the timeout directly; matches the engine's own `sv_timeout` default
/// of 125s.
const IDLE_TIMEOUT_MSEC: i32 = 125_000;

// ============================================================
// Ambient connectionless console responders
// ============================================================

fn svc_ping(ctx: &ServerContext) {
    netchan_out_of_band_print(NetSrc::Server, &ctx.net_from, "ack");
}

fn svc_info(ctx: &ServerContext, cmd_argv: &dyn Fn(usize) -> String) {
    if ctx.maxclients_value == 1 {
        // no point advertising a single-player listen game
        return;
    }

    let version: i32 = cmd_argv(1).parse().unwrap_or(-1);
    if version != PROTOCOL_VERSION {
        netchan_out_of_band_print(
            NetSrc::Server,
            &ctx.net_from,
            &format!("print\nServer is protocol version {}.\n", PROTOCOL_VERSION),
        );
        return;
    }

    let reply = format!(
        "{}\\{}\\{}\\{}\n",
        ctx.cvars.variable_string("com_gamename"),
        ctx.sv.name,
        ctx.populated_count(),
        ctx.maxclients_value,
    );
    netchan_out_of_band_print(NetSrc::Server, &ctx.net_from, &reply);
}

/// Serverinfo plus one `ping edict "name"` line per populated slot, capped to
/// fit a single packet.
fn sv_status_string(ctx: &ServerContext) -> String {
    let mut status = ctx.cvars.serverinfo();
    status.push('\n');
    for client in ctx.svs.clients.iter() {
        if matches!(client.state, ClientState::Free) {
            continue;
        }
        let line = format!("{} {} \"{}\"\n", client.ping, client.edict_index, client.name);
        if status.len() + line.len() >= arenasv_common::qcommon::MAX_MSGLEN - 16 {
            break;
        }
        status.push_str(&line);
    }
    status
}

fn svc_status(ctx: &ServerContext) {
    let status = sv_status_string(ctx);
    netchan_out_of_band_print(NetSrc::Server, &ctx.net_from, &format!("print\n{}", status));
}

// ============================================================
// get_challenge
// ============================================================

fn svc_get_challenge(ctx: &mut ServerContext, cmd_argv: &dyn Fn(usize) -> String) {
    if ctx.maxclients_value <= 1 {
        // single-player mode: handshake is pointless
        return;
    }

    let from = ctx.net_from;
    let now = ctx.svs.realtime;

    // Two leaky buckets: per-address, then the single global one. Either
    // exhausted means a silent drop .
    let addr_key = net_adr_to_string(&from);
    if !ctx.svs.oob_buckets.take(&addr_key, now) {
        return;
    }
    if !ctx.svs.oob_global_bucket.take(now) {
        return;
    }

    let expected_game = ctx.cvars.variable_string("com_gamename").to_string();
    let game_name = cmd_argv(2);
    if !game_name.is_empty() && game_name != expected_game {
        netchan_out_of_band_print(
            NetSrc::Server,
            &from,
            &format!("print\nServer is running {}.\n", expected_game),
        );
        return;
    }

    let client_challenge: i32 = cmd_argv(1).parse().unwrap_or(0);

    // nonce = mix of two 16-bit random words XOR'd with the current tick time.
    let word_a = rand_i32() & 0xffff;
    let word_b = rand_i32() & 0xffff;
    let nonce = (word_a | (word_b << 16)) ^ now;

    ctx.svs.challenges.issue(&from, client_challenge, now, nonce);

    netchan_out_of_band_print(
        NetSrc::Server,
        &from,
        &format!("challengeResponse {} {} {}", nonce, client_challenge, PROTOCOL_VERSION),
    );
}

// ============================================================
// direct_connect
// ============================================================

fn svc_direct_connect(ctx: &mut ServerContext, cmd_argv: &dyn Fn(usize) -> String) {
    let adr = ctx.net_from;
    com_dprintf("SVC_DirectConnect ()\n");

    // Step 1: ban check.
    if ctx.svs.ban_list.is_banned(&adr) {
        netchan_out_of_band_print(NetSrc::Server, &adr, "print\nYou are banned.\n");
        return;
    }

    // The connect command line carries a single userinfo blob; challenge,
    // qport and protocol all travel as keys inside it (see
    // worked example above).
    let mut userinfo = cmd_argv(1);
    if userinfo.len() >= MAX_INFO_STRING {
        userinfo.truncate(MAX_INFO_STRING - 1);
    }

    // Step 2: protocol version. A legacy protocol is accepted in parallel
    // only when sv_legacyProtocol is enabled (treated as an
    // optional capability, rejected when absent.
    let version: i32 = info_value_for_key(&userinfo, "protocol").parse().unwrap_or(0);
    let legacy_enabled = ctx.cvars.variable_value("sv_legacyProtocol") != 0.0;
    let is_legacy = version == PROTOCOL_VERSION_LEGACY && legacy_enabled;
    if version != PROTOCOL_VERSION && !is_legacy {
        netchan_out_of_band_print(
            NetSrc::Server,
            &adr,
            &format!("print\nServer is protocol {}.\nSupported protocol: {}\n", PROTOCOL_VERSION, PROTOCOL_VERSION),
        );
        com_dprintf(&format!("    rejected connect from version {}\n", version));
        return;
    }

    // Step 3: extract qport and challenge.
    let qport: i32 = info_value_for_key(&userinfo, "qport").parse().unwrap_or(0);
    let challenge: i32 = info_value_for_key(&userinfo, "challenge").parse().unwrap_or(0);

    let is_lan = net_is_local_address(&adr);
    let max = ctx.maxclients_value as usize;
    let num_slots = max.min(ctx.svs.clients.len());

    // Step 4: reconnect scan — same base address and (same qport OR same
    // source port) reuses the slot, subject to a cooldown.
    let reconnect_limit = ctx.cvars.variable_value("sv_reconnectlimit") as i32;
    let mut reuse_index: Option<usize> = None;
    for i in 0..num_slots {
        let cl = &ctx.svs.clients[i];
        if matches!(cl.state, ClientState::Free) {
            continue;
        }
        if net_compare_base_adr(&adr, &cl.netchan.remote_address)
            && (cl.netchan.qport == qport || adr.port == cl.netchan.remote_address.port)
        {
            if (ctx.svs.realtime - cl.last_connect_time) < reconnect_limit * 1000 {
                com_dprintf(&format!("{}:reconnect rejected : too soon\n", net_adr_to_string(&adr)));
                return;
            }
            com_printf(&format!("{}:reconnect\n", net_adr_to_string(&adr)));
            reuse_index = Some(i);
            break;
        }
    }

    // Step 5: inject the canonical ip key; reject on overflow.
    let ip_value = net_adr_to_string(&adr);
    let mut candidate_userinfo = userinfo.clone();
    info_set_value_for_key(&mut candidate_userinfo, "ip", &ip_value);
    if candidate_userinfo.len() >= MAX_INFO_STRING {
        netchan_out_of_band_print(NetSrc::Server, &adr, "print\nUserinfo string length exceeded.\n");
        return;
    }
    userinfo = candidate_userinfo;

    // Steps 6-8: challenge validation, unless this is a LAN peer (bypasses
    // both challenge and ping policy).
    if !is_lan {
        let record = match ctx.svs.challenges.find_any(&adr) {
            Some(r) => r.clone(),
            None => {
                netchan_out_of_band_print(NetSrc::Server, &adr, "print\nNo or bad challenge.\n");
                return;
            }
        };
        if record.challenge != challenge {
            netchan_out_of_band_print(NetSrc::Server, &adr, "print\nNo or bad challenge.\n");
            return;
        }
        if record.refused {
            // already told this peer why; stay silent on repeats .
            return;
        }

        let ping = ctx.svs.realtime - record.ping_time;
        let per_ip_cap = ctx.cvars.variable_value("sv_clientsPerIp") as i32;
        let min_ping = ctx.cvars.variable_value("sv_minPing") as i32;
        let max_ping = ctx.cvars.variable_value("sv_maxPing") as i32;

        let existing_from_ip = (0..num_slots)
            .filter(|&i| {
                !matches!(ctx.svs.clients[i].state, ClientState::Free)
                    && net_compare_base_adr(&adr, &ctx.svs.clients[i].netchan.remote_address)
            })
            .count() as i32;

        let ping_out_of_policy = (min_ping > 0 && ping < min_ping) || (max_ping > 0 && ping > max_ping);
        if (per_ip_cap > 0 && existing_from_ip >= per_ip_cap) || ping_out_of_policy {
            if let Some(rec) = ctx.svs.challenges.find_any_mut(&adr) {
                rec.refused = true;
            }
            netchan_out_of_band_print(NetSrc::Server, &adr, "print\nConnection refused.\n");
            return;
        }
    }

    // Step 9: slot selection.
    let private_password = ctx.cvars.variable_string("sv_privatePassword").to_string();
    let supplied_password = info_value_for_key(&userinfo, "password");
    let start_index = if !private_password.is_empty() && supplied_password == private_password {
        0
    } else {
        ctx.private_clients_value.max(0) as usize
    };

    let slot_index = if let Some(i) = reuse_index {
        Some(i)
    } else {
        (start_index..num_slots).find(|&i| matches!(ctx.svs.clients[i].state, ClientState::Free))
    };

    let slot_index = match slot_index {
        Some(i) => i,
        None => {
            if is_lan {
                let all_bots = (0..num_slots)
                    .all(|i| ctx.svs.clients[i].is_bot || matches!(ctx.svs.clients[i].state, ClientState::Free));
                if all_bots && num_slots > 0 {
                    num_slots - 1 // evict the highest-index bot slot to make room
                } else {
                    com_error(ERR_FATAL, "Server is full on local connect.\n");
                    return;
                }
            } else {
                netchan_out_of_band_print(NetSrc::Server, &adr, "print\nServer is full.\n");
                com_dprintf("Rejected a connection.\n");
                return;
            }
        }
    };

    // Step 10: initialize the slot.
    let before = ctx.populated_count();
    ctx.svs.clients[slot_index] = Client::default();
    ctx.sv_client_index = Some(slot_index);
    ctx.svs.clients[slot_index].edict_index = (slot_index + 1) as i32;
    ctx.svs.clients[slot_index].challenge = challenge;
    ctx.svs.clients[slot_index].legacy_protocol = is_legacy;
    ctx.svs.clients[slot_index].userinfo = userinfo.clone();
    ctx.svs.clients[slot_index].state = ClientState::Connected;
    ctx.svs.clients[slot_index].last_connect_time = ctx.svs.realtime;
    ctx.svs.clients[slot_index].last_packet_time = ctx.svs.realtime;
    ctx.svs.clients[slot_index].gamestate_message_num = -1;

    netchan_setup(NetSrc::Server, &mut ctx.svs.clients[slot_index].netchan, adr, qport, ctx.svs.realtime);
    netchan_set_protocol(&mut ctx.svs.clients[slot_index].netchan, version);

    if !is_lan {
        if let Some(rec) = ctx.svs.challenges.find_any_mut(&adr) {
            rec.connected = true;
        }
    }

    // Step 11: let the game module accept or reject.
    let rejection = match ctx.game.as_mut() {
        Some(game) => game.client_connect(slot_index, true, false),
        None => None,
    };
    if let Some(reason) = rejection {
        ctx.svs.clients[slot_index] = Client::default();
        ctx.sv_client_index = None;
        netchan_out_of_band_print(NetSrc::Server, &adr, &format!("print\n{}\nConnection refused.\n", reason));
        com_dprintf("Game rejected a connection.\n");
        return;
    }

    // Step 12: clamp derived userinfo-backed settings.
    let lan_force_rate = ctx.cvars.variable_value("sv_lanForceRate") != 0.0;
    let sv_fps = ctx.cvars.variable_value("sv_fps") as i32;
    userinfo_changed(&mut ctx.svs.clients[slot_index], &adr, is_lan, lan_force_rate, sv_fps);

    // Step 13: reply.
    netchan_out_of_band_print(NetSrc::Server, &adr, &format!("connectResponse {}", challenge));

    // Step 14: heartbeat on population-boundary transitions.
    ctx.fire_heartbeat_if_boundary(before);
}

// ============================================================
// drop procedure
// ============================================================

/// Drop a client with `reason`: broadcast a print, call the game hook,
/// notify the peer, clear its challenge record (unless it's a bot), then
/// ZOMBIE (humans) or FREE (bots).
pub fn sv_drop_client(ctx: &mut ServerContext, client_index: usize, reason: &str) {
    let already_zombie = matches!(ctx.svs.clients[client_index].state, ClientState::Zombie);
    let is_bot = ctx.svs.clients[client_index].is_bot;
    let name = ctx.svs.clients[client_index].name.clone();
    let remote = ctx.svs.clients[client_index].netchan.remote_address;
    let before = ctx.populated_count();

    if !already_zombie {
        if !name.is_empty() {
            crate::sv_send::sv_broadcast_printf(
                ctx,
                arenasv_common::q_shared::PRINT_HIGH,
                &format!("{} disconnected ({})\n", name, reason),
            );
        }
        if !is_bot {
            if let Some(rec) = ctx.svs.challenges.find_any_mut(&remote) {
                rec.connected = false;
            }
        }
    }

    if let Some(game) = ctx.game.as_mut() {
        game.client_disconnect(client_index);
    }

    // Tell the dropped peer why, best-effort (it may already be gone).
    let client = &mut ctx.svs.clients[client_index];
    client.netchan.message.print(&format!("disconnect \"{}\"", reason));

    client.userinfo.clear();
    client.pending_userinfo = None;

    if is_bot {
        *client = Client::default();
    } else {
        client.state = ClientState::Zombie;
        client.zombie_since = ctx.svs.realtime;
    }

    ctx.fire_heartbeat_if_boundary(before);
}

// ============================================================
// Connectionless dispatch
// ============================================================

fn sv_connectionless_packet(ctx: &mut ServerContext, cmd_context: &mut CmdContext) {
    ctx.net_message.readcount = 0;
    msg_read_long(&mut ctx.net_message); // skip the -1 marker

    let line = msg_read_string_line(&mut ctx.net_message);
    cmd_context.cmd_tokenize_string(&line, false);

    let argc = cmd_context.cmd_argc();
    let command = cmd_context.cmd_argv(0).to_string();
    let argv_strings: Vec<String> = (0..argc).map(|i| cmd_context.cmd_argv(i).to_string()).collect();
    let cmd_argv = |idx: usize| -> String { argv_strings.get(idx).cloned().unwrap_or_default() };

    com_dprintf(&format!("Packet {} : {}\n", net_adr_to_string(&ctx.net_from), command));

    match command.as_str() {
        "ping" => svc_ping(ctx),
        "status" => svc_status(ctx),
        "info" => svc_info(ctx, &cmd_argv),
        "getchallenge" => svc_get_challenge(ctx, &cmd_argv),
        "connect" => svc_direct_connect(ctx, &cmd_argv),
        _ => com_dprintf(&format!("bad connectionless packet from {}\n", net_adr_to_string(&ctx.net_from))),
    }
}

// ============================================================
// inbound datagram drain
// ============================================================

pub fn sv_read_packets(ctx: &mut ServerContext) {
    let mut cmd_context = CmdContext::new();

    while net_get_packet(NetSrc::Server, &mut ctx.net_from, &mut ctx.net_message) {
        if ctx.net_message.cursize >= 4 {
            let marker = i32::from_le_bytes([
                ctx.net_message.data[0],
                ctx.net_message.data[1],
                ctx.net_message.data[2],
                ctx.net_message.data[3],
            ]);
            if marker == -1 {
                sv_connectionless_packet(ctx, &mut cmd_context);
                continue;
            }
        }

        let max = ctx.maxclients_value as usize;
        let num_slots = max.min(ctx.svs.clients.len());
        let from = ctx.net_from;

        for i in 0..num_slots {
            if matches!(ctx.svs.clients[i].state, ClientState::Free) {
                continue;
            }
            if !net_compare_base_adr(&from, &ctx.svs.clients[i].netchan.remote_address) {
                continue;
            }

            let curtime = ctx.svs.realtime;
            let valid = netchan_process(&mut ctx.svs.clients[i].netchan, &mut ctx.net_message, curtime);
            if !valid {
                break;
            }

            if !matches!(ctx.svs.clients[i].state, ClientState::Zombie) {
                ctx.svs.clients[i].last_packet_time = ctx.svs.realtime;
                let mut msg = ctx.net_message.clone();
                match sv_execute_client_message(ctx, i, &mut msg) {
                    ClientMessageOutcome::Continue => {}
                    ClientMessageOutcome::Drop(reason) => sv_drop_client(ctx, i, &reason),
                }
            }
            break;
        }
    }
}

// ============================================================
// ping aggregation (two-phase rayon sweep)
// ============================================================

struct PingCalcResult {
    index: usize,
    ping: i32,
}

pub fn sv_calc_pings(ctx: &mut ServerContext) {
    let max = ctx.maxclients_value as usize;
    let num_slots = max.min(ctx.svs.clients.len());

    // Phase 1: snapshot the immutable inputs each slot needs.
    let client_data: Vec<_> = (0..num_slots)
        .filter_map(|i| {
            if !matches!(ctx.svs.clients[i].state, ClientState::Active) {
                return None;
            }
            Some((i, ctx.svs.clients[i].frame_latency))
        })
        .collect();

    // Phase 2: parallel averaging, no shared mutable state touched.
    let results: Vec<PingCalcResult> = client_data
        .par_iter()
        .map(|&(index, frame_latency)| {
            let mut total = 0;
            let mut count = 0;
            for j in 0..LATENCY_COUNTS {
                if frame_latency[j] > 0 {
                    count += 1;
                    total += frame_latency[j];
                }
            }
            let ping = if count == 0 { 0 } else { total / count };
            PingCalcResult { index, ping }
        })
        .collect();

    // Phase 3: sequential apply.
    for result in results {
        ctx.svs.clients[result.index].ping = result.ping;
    }
}

// ============================================================
// idle-timeout and zombie-linger sweep (two-phase)
// ============================================================

enum SweepAction {
    None,
    Drop(usize, String),
    FreeZombie(usize),
}

pub fn sv_check_timeouts(ctx: &mut ServerContext) {
    let max = ctx.maxclients_value as usize;
    let num_slots = max.min(ctx.svs.clients.len());
    let realtime = ctx.svs.realtime;

    // Phase 1: snapshot per-slot timing state.
    let client_data: Vec<_> = (0..num_slots)
        .map(|i| {
            (
                i,
                ctx.svs.clients[i].state,
                ctx.svs.clients[i].last_packet_time,
                ctx.svs.clients[i].zombie_since,
                ctx.svs.clients[i].name.clone(),
            )
        })
        .collect();

    let actions: Vec<SweepAction> = client_data
        .par_iter()
        .map(|(i, state, last_packet_time, zombie_since, name)| {
            let i = *i;
            match *state {
                ClientState::Zombie if realtime - *zombie_since >= ZOMBIE_LINGER_MSEC => SweepAction::FreeZombie(i),
                ClientState::Connected | ClientState::Primed | ClientState::Active
                    if realtime - *last_packet_time >= IDLE_TIMEOUT_MSEC =>
                {
                    SweepAction::Drop(i, name.clone())
                }
                _ => SweepAction::None,
            }
        })
        .collect();

    // Phase 2: sequential apply.
    for action in actions {
        match action {
            SweepAction::None => {}
            SweepAction::FreeZombie(i) => {
                ctx.svs.clients[i] = Client::default();
            }
            SweepAction::Drop(i, name) => {
                com_printf(&format!("{} timed out\n", name));
                sv_drop_client(ctx, i, "timed out");
            }
        }
    }
}

// ============================================================
// Tick loop entry point
// ============================================================

pub fn sv_frame(ctx: &mut ServerContext, msec: i32) {
    if !ctx.svs.initialized {
        return;
    }

    ctx.svs.realtime += msec;

    sv_read_packets(ctx);
    sv_check_timeouts(ctx);
    sv_calc_pings(ctx);

    ctx.sv.framenum += 1;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sv_game::test_support::RecordingGameModule;
    use arenasv_common::qcommon::{NetAdr, NetAdrType};

    fn remote(port: u16) -> NetAdr {
        NetAdr {
            adr_type: NetAdrType::Ip,
            ip: [10, 0, 0, 1],
            ip6: [0; 16],
            scope_id: 0,
            port,
        }
    }

    fn base_ctx() -> ServerContext {
        let mut ctx = ServerContext::default();
        crate::sv_init::sv_init(&mut ctx);
        ctx.game = Some(Box::new(RecordingGameModule::default()));
        ctx
    }

    #[test]
    fn get_challenge_issues_and_records_a_nonce() {
        let mut ctx = base_ctx();
        ctx.net_from = remote(1111);
        let argv = |i: usize| match i {
            1 => "42".to_string(),
            2 => "arenasv".to_string(),
            _ => String::new(),
        };
        svc_get_challenge(&mut ctx, &argv);
        let from = ctx.net_from;
        assert!(ctx.svs.challenges.find_any(&from).is_some());
    }

    #[test]
    fn direct_connect_without_challenge_is_rejected() {
        let mut ctx = base_ctx();
        ctx.net_from = remote(2222);
        let argv = |i: usize| match i {
            1 => format!("\\protocol\\{}\\qport\\1234\\challenge\\999\\name\\Player", PROTOCOL_VERSION),
            _ => String::new(),
        };
        svc_direct_connect(&mut ctx, &argv);
        assert_eq!(ctx.populated_count(), 0);
    }

    #[test]
    fn direct_connect_with_matching_challenge_allocates_a_slot() {
        let mut ctx = base_ctx();
        ctx.net_from = remote(3333);
        let from = ctx.net_from;
        ctx.svs.challenges.issue(&from, 42, ctx.svs.realtime, 555);

        let argv = |i: usize| match i {
            1 => format!("\\protocol\\{}\\qport\\1234\\challenge\\555\\name\\Player", PROTOCOL_VERSION),
            _ => String::new(),
        };
        svc_direct_connect(&mut ctx, &argv);
        assert_eq!(ctx.populated_count(), 1);
        assert_eq!(ctx.svs.clients[0].state, ClientState::Connected);
    }

    #[test]
    fn drop_client_sends_humans_to_zombie_linger() {
        let mut ctx = base_ctx();
        ctx.svs.clients[0].state = ClientState::Active;
        ctx.svs.clients[0].name = "Player".to_string();
        sv_drop_client(&mut ctx, 0, "disconnected");
        assert_eq!(ctx.svs.clients[0].state, ClientState::Zombie);
        assert!(ctx.svs.clients[0].userinfo.is_empty());
    }

    #[test]
    fn drop_client_frees_bots_immediately() {
        let mut ctx = base_ctx();
        ctx.svs.clients[0].state = ClientState::Active;
        ctx.svs.clients[0].is_bot = true;
        sv_drop_client(&mut ctx, 0, "disconnected");
        assert_eq!(ctx.svs.clients[0].state, ClientState::Free);
    }

    #[test]
    fn zombie_linger_sweep_frees_after_window() {
        let mut ctx = base_ctx();
        ctx.svs.clients[0].state = ClientState::Zombie;
        ctx.svs.clients[0].zombie_since = 0;
        ctx.svs.realtime = ZOMBIE_LINGER_MSEC + 1;
        sv_check_timeouts(&mut ctx);
        assert_eq!(ctx.svs.clients[0].state, ClientState::Free);
    }

    #[test]
    fn idle_timeout_drops_a_silent_client() {
        let mut ctx = base_ctx();
        ctx.svs.clients[0].state = ClientState::Active;
        ctx.svs.clients[0].last_packet_time = 0;
        ctx.svs.realtime = IDLE_TIMEOUT_MSEC + 1;
        sv_check_timeouts(&mut ctx);
        assert_eq!(ctx.svs.clients[0].state, ClientState::Zombie);
    }

    #[test]
    fn calc_pings_averages_positive_latency_samples() {
        let mut ctx = base_ctx();
        ctx.svs.clients[0].state = ClientState::Active;
        ctx.svs.clients[0].frame_latency = [100, 200, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0];
        sv_calc_pings(&mut ctx);
        assert_eq!(ctx.svs.clients[0].ping, 150);
    }
}
