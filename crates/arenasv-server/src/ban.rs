// ban.rs — address-based ban list
// Converted from: myq2-original/server/sv_ccmds.c (SV_AddressBanned), generalized
// with an exception list that is checked first and short-circuits a ban match.

use arenasv_common::net::net_adr_to_string;
use arenasv_common::qcommon::NetAdr;
use arenasv_common::wildcards::wildcardfit;

#[derive(Clone)]
struct BanEntry {
    pattern: String,
    is_exception: bool,
}

/// An ordered sequence of (pattern, isException) pairs. Exceptions are
/// evaluated first and short-circuit a ban match (invariant-bearing: a
/// banned subnet with a carved-out exception never rejects the exception).
pub struct BanList {
    entries: Vec<BanEntry>,
}

impl BanList {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    pub fn add_ban(&mut self, pattern: &str) {
        self.entries.push(BanEntry {
            pattern: pattern.to_string(),
            is_exception: false,
        });
    }

    pub fn add_exception(&mut self, pattern: &str) {
        self.entries.push(BanEntry {
            pattern: pattern.to_string(),
            is_exception: true,
        });
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// True if `adr` matches a ban pattern that is not overridden by a
    /// later-or-earlier exception covering the same address.
    pub fn is_banned(&self, adr: &NetAdr) -> bool {
        let ip_string = net_adr_to_string(adr);
        let ip_only = ip_string.split(':').next().unwrap_or(&ip_string);

        if self
            .entries
            .iter()
            .filter(|e| e.is_exception)
            .any(|e| wildcardfit(&e.pattern, ip_only))
        {
            return false;
        }

        self.entries
            .iter()
            .filter(|e| !e.is_exception)
            .any(|e| wildcardfit(&e.pattern, ip_only))
    }
}

impl Default for BanList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arenasv_common::qcommon::NetAdrType;

    fn adr(a: u8, b: u8, c: u8, d: u8) -> NetAdr {
        NetAdr {
            adr_type: NetAdrType::Ip,
            ip: [a, b, c, d],
            ip6: [0; 16],
            scope_id: 0,
            port: 0,
        }
    }

    #[test]
    fn bans_a_matching_subnet() {
        let mut bans = BanList::new();
        bans.add_ban("10.0.*.*");
        assert!(bans.is_banned(&adr(10, 0, 5, 5)));
        assert!(!bans.is_banned(&adr(10, 1, 5, 5)));
    }

    #[test]
    fn exception_overrides_ban() {
        let mut bans = BanList::new();
        bans.add_ban("10.0.*.*");
        bans.add_exception("10.0.0.7");
        assert!(!bans.is_banned(&adr(10, 0, 0, 7)));
        assert!(bans.is_banned(&adr(10, 0, 0, 8)));
    }
}
