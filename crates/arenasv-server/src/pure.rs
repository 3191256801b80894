// pure.rs — pure-content verification protocol
// Converted from: myq2-original/server/sv_ccmds.c (SV_VerifyPaks_f), checking
// a client's `cp` checksum report against the server's loaded pak set and
// current checksum feed.

use crate::server::Server;

pub enum PureResult {
    /// Syntactically fine but from a pre-restart epoch; ignore silently.
    StaleEpoch,
    Accepted,
    Rejected,
}

/// Validate a `cp <serverId> <cgameChk> <uiChk> @ <chk...> <folded>` command.
///
/// `args` excludes the leading `cp` token itself.
pub fn verify_pure(sv: &Server, args: &[&str], client_server_id_floor: i32) -> (PureResult, bool) {
    // returns (result, got_cp) — got_cp is set whenever the shape parsed far
    // enough to be a genuine (if failing) pure-content reply.
    if args.len() < 2 {
        return (PureResult::Rejected, false);
    }

    let server_id: i32 = match args[0].parse() {
        Ok(v) => v,
        Err(_) => return (PureResult::Rejected, false),
    };

    if server_id < client_server_id_floor {
        return (PureResult::StaleEpoch, false);
    }

    if args.len() < 6 {
        return (PureResult::Rejected, true);
    }

    let cgame_chk: i32 = match args[1].parse() {
        Ok(v) => v,
        Err(_) => return (PureResult::Rejected, true),
    };
    let ui_chk: i32 = match args[2].parse() {
        Ok(v) => v,
        Err(_) => return (PureResult::Rejected, true),
    };

    if args[3] != "@" {
        return (PureResult::Rejected, true);
    }

    let remaining = &args[4..];
    if remaining.len() < 2 {
        return (PureResult::Rejected, true);
    }
    let (chk_strs, folded_str) = remaining.split_at(remaining.len() - 1);
    let folded_str = folded_str[0];

    let mut chks = Vec::with_capacity(chk_strs.len());
    for s in chk_strs {
        match s.parse::<i32>() {
            Ok(v) => chks.push(v),
            Err(_) => return (PureResult::Rejected, true),
        }
    }
    let folded: i32 = match folded_str.parse() {
        Ok(v) => v,
        Err(_) => return (PureResult::Rejected, true),
    };

    if cgame_chk != sv.cgame_checksum || ui_chk != sv.ui_checksum {
        return (PureResult::Rejected, true);
    }

    // All client-supplied checksums must be pairwise distinct.
    let mut seen = std::collections::HashSet::new();
    if !chks.iter().all(|c| seen.insert(*c)) {
        return (PureResult::Rejected, true);
    }

    // Every checksum must be one the server actually has loaded.
    if !chks.iter().all(|c| sv.pure_checksums.contains(c)) {
        return (PureResult::Rejected, true);
    }

    let mut computed = sv.checksum_feed;
    for c in &chks {
        computed ^= c;
    }
    computed ^= chks.len() as i32;

    if computed != folded {
        return (PureResult::Rejected, true);
    }

    (PureResult::Accepted, true)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_server() -> Server {
        let mut sv = Server::default();
        sv.checksum_feed = 0xFF;
        sv.cgame_checksum = 0xC;
        sv.ui_checksum = 0xD;
        sv.pure_checksums = vec![0x11, 0x22];
        sv.server_id = 5;
        sv
    }

    #[test]
    fn worked_example_folded_mismatch_rejects() {
        let sv = make_server();
        // cp 5 C D @ 11 22 EC  (decimal: 5 12 13 @ 17 34 236)
        let args = ["5", "12", "13", "@", "17", "34", "236"];
        let (result, got_cp) = verify_pure(&sv, &args, 0);
        assert!(got_cp);
        assert!(matches!(result, PureResult::Rejected));
    }

    #[test]
    fn correct_fold_is_accepted() {
        let sv = make_server();
        // checksumFeed(0xFF) ^ 0x11 ^ 0x22 ^ 2 = 0xEE = 238
        let args = ["5", "12", "13", "@", "17", "34", "238"];
        let (result, got_cp) = verify_pure(&sv, &args, 0);
        assert!(got_cp);
        assert!(matches!(result, PureResult::Accepted));
    }

    #[test]
    fn stale_epoch_is_silent() {
        let sv = make_server();
        let args = ["2", "12", "13", "@", "17", "34", "238"];
        let (result, got_cp) = verify_pure(&sv, &args, 5);
        assert!(!got_cp);
        assert!(matches!(result, PureResult::StaleEpoch));
    }
}
