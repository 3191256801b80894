// challenge.rs — anti-spoof challenge handshake
// Converted from: myq2-original/server/sv_main.c (SV_GetChallenge), generalized
// with a sticky `refused` flag so repeated connect attempts after a policy
// rejection don't keep flooding the console.

use arenasv_common::qcommon::NetAdr;

pub const MAX_CHALLENGES: usize = 1024;

/// A pending or consumed handshake entry, bound to a remote address.
#[derive(Clone, Default)]
pub struct ChallengeRecord {
    pub adr: NetAdr,
    /// Server-issued nonce.
    pub challenge: i32,
    /// Echoed back by the client so it can detect server impersonation.
    pub client_challenge: i32,
    pub time: i32,
    pub ping_time: i32,
    /// A direct_connect has already consumed this record.
    pub connected: bool,
    /// Permanently rejected (e.g. ping out of policy); further connects are
    /// silently dropped rather than re-printing the same rejection.
    pub refused: bool,
}

/// Fixed-size LRU table of pending challenges.
pub struct ChallengeTable {
    entries: Vec<ChallengeRecord>,
}

impl ChallengeTable {
    pub fn new() -> Self {
        Self {
            entries: vec![ChallengeRecord::default(); MAX_CHALLENGES],
        }
    }

    fn adr_matches(a: &NetAdr, b: &NetAdr) -> bool {
        arenasv_common::net::net_compare_base_adr(a, b)
    }

    /// Find an unconsumed record for `from`, if any.
    pub fn find_unconsumed(&self, from: &NetAdr) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| !e.connected && Self::adr_matches(&e.adr, from))
    }

    /// Find any record (consumed or not) for `from` — used by direct_connect
    /// to validate the challenge echoed back in userinfo.
    pub fn find_any(&self, from: &NetAdr) -> Option<&ChallengeRecord> {
        self.entries.iter().find(|e| Self::adr_matches(&e.adr, from))
    }

    pub fn find_any_mut(&mut self, from: &NetAdr) -> Option<&mut ChallengeRecord> {
        self.entries
            .iter_mut()
            .find(|e| Self::adr_matches(&e.adr, from))
    }

    /// Evict the globally oldest record and return its index for reuse.
    fn oldest_index(&self) -> usize {
        self.entries
            .iter()
            .enumerate()
            .min_by_key(|(_, e)| e.time)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Issue (or refresh) a challenge for `from`. Returns the new nonce.
    pub fn issue(&mut self, from: &NetAdr, client_challenge: i32, now: i32, nonce: i32) -> i32 {
        let idx = self
            .find_unconsumed(from)
            .unwrap_or_else(|| self.oldest_index());
        self.entries[idx] = ChallengeRecord {
            adr: *from,
            challenge: nonce,
            client_challenge,
            time: now,
            ping_time: now,
            connected: false,
            refused: false,
        };
        nonce
    }
}

impl Default for ChallengeTable {
    fn default() -> Self {
        Self::new()
    }
}
