// qcommon.rs — definitions shared across the protocol engine.
// Converted from: myq2-original/qcommon/qcommon.h

// ============================================================
// Version / build info
// ============================================================

pub const VERSION: f32 = 1.0;
pub const BASEDIRNAME: &str = "basearena";

#[cfg(all(target_os = "windows", not(debug_assertions)))]
pub const BUILDSTRING: &str = "Win32 RELEASE";
#[cfg(all(target_os = "windows", debug_assertions))]
pub const BUILDSTRING: &str = "Win32 DEBUG";
#[cfg(target_os = "linux")]
pub const BUILDSTRING: &str = "Linux";
#[cfg(not(any(target_os = "windows", target_os = "linux")))]
pub const BUILDSTRING: &str = "Unknown";

#[cfg(target_arch = "x86")]
pub const CPUSTRING: &str = "x86";
#[cfg(target_arch = "x86_64")]
pub const CPUSTRING: &str = "x86_64";
#[cfg(target_arch = "aarch64")]
pub const CPUSTRING: &str = "aarch64";
#[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
pub const CPUSTRING: &str = "Unknown";

// ============================================================
// SizeBuf — growable byte buffer
// ============================================================

#[derive(Debug, Clone, Default)]
pub struct SizeBuf {
    pub allow_overflow: bool,
    pub overflowed: bool,
    pub data: Vec<u8>,
    pub maxsize: i32,
    pub cursize: i32,
    pub readcount: i32,
}

impl SizeBuf {
    pub fn new(maxsize: i32) -> Self {
        Self {
            allow_overflow: false,
            overflowed: false,
            data: vec![0u8; maxsize as usize],
            maxsize,
            cursize: 0,
            readcount: 0,
        }
    }

    pub fn clear(&mut self) {
        self.cursize = 0;
        self.overflowed = false;
    }
}

// ============================================================
// Protocol
// ============================================================

/// Current wire protocol version.
pub const PROTOCOL_VERSION: i32 = 71;

/// Older protocol a server may optionally still accept (`sv_legacyProtocol`).
/// When legacy compatibility is disabled, a connect at this version is rejected.
pub const PROTOCOL_VERSION_LEGACY: i32 = 70;

pub const PORT_MASTER: i32 = 27950;
pub const PORT_SERVER: i32 = 27960;
pub const PORT_ANY: i32 = -1;

pub const UPDATE_BACKUP: i32 = 32;
pub const UPDATE_MASK: i32 = UPDATE_BACKUP - 1;

/// Reliable command ring size: bounds how far `reliableAcknowledge` may lag
/// `reliableSequence` before the server considers the commands lost
pub const MAX_RELIABLE_COMMANDS: usize = 64;

/// Hard cap on usercmds packed into a single `clc_move`/`clc_moveNoDelta`.
pub const MAX_PACKET_USERCMDS: usize = 32;

// ============================================================
// Server-to-client ops
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum SvcOps {
    Bad = 0,
    Nop,
    Gamestate,
    Configstring,
    Baseline,
    Eof,
    ServerCommand,
    Print,
    Disconnect,
    Download,
    Snapshot,
}

// ============================================================
// Client-to-server ops
// ============================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ClcOps {
    Bad = 0,
    Nop,
    ClientCommand,
    Move,
    MoveNoDelta,
    VoipOpus,
    VoipSpeex,
    Eof,
}

// ============================================================
// User command communication flags
// ============================================================

pub const CM_ANGLE1: i32 = 1 << 0;
pub const CM_ANGLE2: i32 = 1 << 1;
pub const CM_ANGLE3: i32 = 1 << 2;
pub const CM_FORWARD: i32 = 1 << 3;
pub const CM_SIDE: i32 = 1 << 4;
pub const CM_UP: i32 = 1 << 5;
pub const CM_BUTTONS: i32 = 1 << 6;
pub const CM_IMPULSE: i32 = 1 << 7;

// ============================================================
// Command execution — canonical definitions in cmd.rs
// ============================================================

pub use crate::cmd::{EXEC_APPEND, EXEC_INSERT, EXEC_NOW};

// ============================================================
// Error levels — canonical definitions in q_shared.rs
// ============================================================

pub use crate::q_shared::{ERR_DROP, ERR_FATAL};

/// ERR_QUIT is an alias for ERR_DISCONNECT (same value, engine-level semantics)
pub const ERR_QUIT: i32 = crate::q_shared::ERR_DISCONNECT;

// ============================================================
// Print levels — canonical definitions in q_shared.rs
// ============================================================

pub use crate::q_shared::{PRINT_ALL, PRINT_DEVELOPER};

// ============================================================
// Network types
// ============================================================

pub const MAX_MSGLEN: usize = 16384;
pub const PACKET_HEADER: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum NetAdrType {
    Loopback = 0,
    Broadcast,
    Ip,
    /// IPv6 address
    Ip6,
    /// IPv6 broadcast/multicast
    Broadcast6,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum NetSrc {
    Client = 0,
    Server,
}

#[derive(Debug, Clone, Copy)]
pub struct NetAdr {
    pub adr_type: NetAdrType,
    /// IPv4 address (4 bytes)
    pub ip: [u8; 4],
    /// IPv6 address (16 bytes)
    pub ip6: [u8; 16],
    /// IPv6 scope ID for link-local addresses
    pub scope_id: u32,
    pub port: u16,
}

impl Default for NetAdr {
    fn default() -> Self {
        Self {
            adr_type: NetAdrType::Loopback,
            ip: [0; 4],
            ip6: [0; 16],
            scope_id: 0,
            port: 0,
        }
    }
}

// ============================================================
// NetChan — network channel
//
// Datagram fragmentation and reassembly are out of scope here (handled, if
// at all, by the transport this engine is embedded in); this channel only
// tracks the sequencing state the reliable command and usercmd protocols
// are built on top of.
// ============================================================

pub const OLD_AVG: f32 = 0.99;

pub struct NetChan {
    pub sock: NetSrc,
    pub dropped: i32,
    pub last_received: i32,
    pub last_sent: i32,
    pub remote_address: NetAdr,
    pub qport: i32,

    pub protocol: i32,

    // Sequencing variables
    pub incoming_sequence: i32,
    pub incoming_acknowledged: i32,
    pub incoming_reliable_acknowledged: i32,
    pub incoming_reliable_sequence: i32,
    pub outgoing_sequence: i32,
    pub reliable_sequence: i32,
    pub last_reliable_sequence: i32,

    // Reliable staging and holding areas
    pub message: SizeBuf,
    pub message_buf: [u8; MAX_MSGLEN - 16],
    pub reliable_length: i32,
    pub reliable_buf: [u8; MAX_MSGLEN - 16],
}

impl NetChan {
    pub fn new() -> Self {
        Self {
            sock: NetSrc::Client,
            dropped: 0,
            last_received: 0,
            last_sent: 0,
            remote_address: NetAdr::default(),
            qport: 0,
            protocol: PROTOCOL_VERSION,
            incoming_sequence: 0,
            incoming_acknowledged: 0,
            incoming_reliable_acknowledged: 0,
            incoming_reliable_sequence: 0,
            outgoing_sequence: 0,
            reliable_sequence: 0,
            last_reliable_sequence: 0,
            message: SizeBuf::new((MAX_MSGLEN - 16) as i32),
            message_buf: [0u8; MAX_MSGLEN - 16],
            reliable_length: 0,
            reliable_buf: [0u8; MAX_MSGLEN - 16],
        }
    }
}

impl Default for NetChan {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================
// SVC_* integer constants matching the SvcOps enum values
// ============================================================

pub const SVC_BAD: i32 = 0;
pub const SVC_NOP: i32 = 1;
pub const SVC_GAMESTATE: i32 = 2;
pub const SVC_CONFIGSTRING: i32 = 3;
pub const SVC_BASELINE: i32 = 4;
pub const SVC_EOF: i32 = 5;
pub const SVC_SERVERCOMMAND: i32 = 6;
pub const SVC_PRINT: i32 = 7;
pub const SVC_DISCONNECT: i32 = 8;
pub const SVC_DOWNLOAD: i32 = 9;
pub const SVC_SNAPSHOT: i32 = 10;

// ============================================================
// CLC_* integer constants matching the ClcOps enum values
// ============================================================

pub const CLC_BAD: i32 = 0;
pub const CLC_NOP: i32 = 1;
pub const CLC_CLIENTCOMMAND: i32 = 2;
pub const CLC_MOVE: i32 = 3;
pub const CLC_MOVENODELTA: i32 = 4;
pub const CLC_VOIPOPUS: i32 = 5;
pub const CLC_VOIPSPEEX: i32 = 6;
pub const CLC_EOF: i32 = 7;
