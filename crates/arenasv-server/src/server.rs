// server.rs — core server types and constants
// Converted from: myq2-original/server/server.h
//
// Copyright (C) 1997-2001 Id Software, Inc.
// Licensed under the GNU General Public License v2 or later.

use arenasv_common::cvar::CvarContext;
use arenasv_common::q_shared::*;
use arenasv_common::qcommon::*;

use crate::ban::BanList;
use crate::challenge::ChallengeTable;
use crate::rate_limit::{BucketMap, LeakyBucket};
use crate::sv_game::GameModule;

// ============================================================
// Constants
// ============================================================

pub const MAX_MASTERS: usize = 8; // max recipients for heartbeat packets
pub const LATENCY_COUNTS: usize = 16;

/// Zombie-slot linger before the slot is recycled to FREE
pub const ZOMBIE_LINGER_MSEC: i32 = 2000;

// ============================================================
// server_state_t
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ServerState {
    #[default]
    Dead = 0, // no map loaded
    Loading = 1, // spawning level entities
    Game = 2,    // actively running
}

// ============================================================
// client_state_t — the five-state lifecycle a connection moves through.
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ClientState {
    #[default]
    Free = 0, // can be reused for a new connection
    Connected = 1, // accepted, waiting for gamestate to be primed
    Primed = 2,    // gamestate sent, waiting for the first usercmd
    Active = 3,    // fully in the game
    Zombie = 4,    // disconnected, lingering to absorb stray datagrams
}

// ============================================================
// Server (per-level state) — corresponds to C `server_t`
// ============================================================

pub struct Server {
    pub state: ServerState,
    pub time: u32, // always sv.framenum * frame msec
    pub framenum: i32,
    pub name: String,

    pub configstrings: Vec<String>, // [MAX_CONFIGSTRINGS]
    pub baselines: Vec<EntityState>, // [MAX_EDICTS]

    /// Identifies the current map/load epoch. A `cp` or `move` whose
    /// `serverId` predates this is from before a restart.
    pub server_id: i32,

    /// Random per-epoch seed entangling pure checksums and the usercmd
    /// delta-decode key.
    pub checksum_feed: i32,

    /// The set of content-package checksums the server expects connected
    /// clients to have loaded, in pure mode.
    pub pure_checksums: Vec<i32>,
    pub cgame_checksum: i32,
    pub ui_checksum: i32,
    pub pure_enabled: bool,
}

impl Default for Server {
    fn default() -> Self {
        let mut configstrings = Vec::with_capacity(MAX_CONFIGSTRINGS);
        for _ in 0..MAX_CONFIGSTRINGS {
            configstrings.push(String::new());
        }
        let mut baselines = Vec::with_capacity(MAX_EDICTS);
        for _ in 0..MAX_EDICTS {
            baselines.push(EntityState::default());
        }

        Self {
            state: ServerState::Dead,
            time: 0,
            framenum: 0,
            name: String::new(),
            configstrings,
            baselines,
            server_id: 0,
            checksum_feed: 0,
            pure_checksums: Vec::new(),
            cgame_checksum: 0,
            ui_checksum: 0,
            pure_enabled: false,
        }
    }
}

// ============================================================
// Client — per-client server data (client_t)
// ============================================================

pub struct Client {
    pub state: ClientState,

    pub userinfo: String, // name, rate, snaps, etc (MAX_INFO_STRING)
    /// Userinfo update staged while flood-delayed.
    pub pending_userinfo: Option<String>,

    pub lastcmd: UserCmd, // last processed usercmd, for replay on drops
    pub last_usercmd_server_time: i32,

    pub frame_latency: [i32; LATENCY_COUNTS],
    pub ping: i32,

    pub rate: i32,
    pub snaps: i32,
    pub snapshot_msec: i32,
    pub last_snapshot_time: i32,

    pub edict_index: i32, // index into the game module's entity table
    pub name: String,     // extracted from userinfo, masked/truncated

    pub is_bot: bool,

    pub challenge: i32, // challenge of this user, bound at connect time
    pub legacy_protocol: bool,

    // Reliable command channel
    pub reliable_sequence: i32,
    pub reliable_acknowledge: i32,
    pub last_client_command: i32,
    pub reliable_commands: Vec<String>, // ring sized MAX_RELIABLE_COMMANDS

    pub message_acknowledge: i32,
    /// outgoingSequence at the time the current gamestate was sent; -1 forces a resend.
    pub gamestate_message_num: i32,

    // Pure-content verification
    pub pure_authentic: bool,
    pub got_cp: bool,

    // Flood protection
    pub next_reliable_time: i32,
    pub next_reliable_user_time: i32,
    pub numcmds: i32,

    pub last_connect_time: i32,
    pub last_packet_time: i32,
    /// Set when this slot transitions to ZOMBIE; used for the linger sweep
    pub zombie_since: i32,

    pub netchan: NetChan,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            state: ClientState::Free,
            userinfo: String::new(),
            pending_userinfo: None,
            lastcmd: UserCmd::default(),
            last_usercmd_server_time: 0,
            frame_latency: [0; LATENCY_COUNTS],
            ping: 0,
            rate: 5000,
            snaps: 20,
            snapshot_msec: 50,
            last_snapshot_time: 0,
            edict_index: 0,
            name: String::new(),
            is_bot: false,
            challenge: 0,
            legacy_protocol: false,
            reliable_sequence: 0,
            reliable_acknowledge: 0,
            last_client_command: 0,
            reliable_commands: vec![String::new(); MAX_RELIABLE_COMMANDS],
            message_acknowledge: 0,
            gamestate_message_num: -1,
            pure_authentic: false,
            got_cp: false,
            next_reliable_time: 0,
            next_reliable_user_time: 0,
            numcmds: 0,
            last_connect_time: 0,
            last_packet_time: 0,
            zombie_since: 0,
            netchan: NetChan::new(),
        }
    }
}

// ============================================================
// ServerStatic — persistent across level changes (server_static_t)
// ============================================================

pub struct ServerStatic {
    pub initialized: bool,
    pub realtime: i32,
    pub spawncount: i32,

    pub clients: Vec<Client>, // [sv_maxclients]
    pub last_heartbeat: i32,

    pub challenges: ChallengeTable,
    pub ban_list: BanList,
    /// Per-address leaky bucket gating `getchallenge`.
    pub oob_buckets: BucketMap,
    /// Single global leaky bucket gating total outbound challenge replies
    ///, independent of the per-address buckets above.
    pub oob_global_bucket: LeakyBucket,
}

impl Default for ServerStatic {
    fn default() -> Self {
        Self {
            initialized: false,
            realtime: 0,
            spawncount: 0,
            clients: Vec::new(),
            last_heartbeat: 0,
            challenges: ChallengeTable::new(),
            ban_list: BanList::new(),
            oob_buckets: BucketMap::new(),
            oob_global_bucket: LeakyBucket::new(10, 100, 0),
        }
    }
}

// ============================================================
// ServerContext — replaces C globals (sv, svs, ge, cvar pointers, ...)
// ============================================================

pub struct ServerContext {
    pub sv: Server,
    pub svs: ServerStatic,

    pub game: Option<Box<dyn GameModule>>,

    pub sv_client_index: Option<usize>,

    pub maxclients_value: i32,
    pub private_clients_value: i32,

    pub cvars: CvarContext,

    pub net_from: NetAdr,
    pub net_message: SizeBuf,

    /// Invoked when the populated-client count transitions to 1 or to
    /// `maxclients_value`, and when it drops to 0.
    pub heartbeat: Option<Box<dyn FnMut()>>,
}

impl Default for ServerContext {
    fn default() -> Self {
        Self {
            sv: Server::default(),
            svs: ServerStatic::default(),
            game: None,
            sv_client_index: None,
            maxclients_value: 8,
            private_clients_value: 0,
            cvars: CvarContext::new(),
            net_from: NetAdr::default(),
            net_message: SizeBuf::new(MAX_MSGLEN as i32),
            heartbeat: None,
        }
    }
}

impl ServerContext {
    pub fn populated_count(&self) -> usize {
        self.svs
            .clients
            .iter()
            .filter(|c| !matches!(c.state, ClientState::Free))
            .count()
    }

    pub fn fire_heartbeat_if_boundary(&mut self, before: usize) {
        let after = self.populated_count();
        if after == 0 && before != 0 {
            if let Some(cb) = self.heartbeat.as_mut() {
                cb();
            }
            return;
        }
        if before != after && (after == 1 || after == self.maxclients_value as usize) {
            if let Some(cb) = self.heartbeat.as_mut() {
                cb();
            }
        }
    }
}
