// userinfo.rs — per-client settings parsing and clamping
// Converted from: myq2-original/server/sv_main.rs (sv_userinfo_changed),
// generalized with rate/snaps/handicap clamps.

use arenasv_common::q_shared::{info_set_value_for_key, info_value_for_key, MAX_INFO_STRING};
use arenasv_common::qcommon::NetAdr;

use crate::server::Client;

pub const MIN_RATE: i32 = 1000;
pub const MAX_RATE: i32 = 100_000;
pub const LAN_FORCED_RATE: i32 = 99_999;

pub struct UserinfoChangedResult {
    /// Set when the injected `ip` key would overflow the userinfo cap.
    pub overflowed: bool,
}

pub fn userinfo_changed(
    client: &mut Client,
    remote: &NetAdr,
    is_lan: bool,
    lan_force_rate: bool,
    sv_fps: i32,
) -> UserinfoChangedResult {
    let name = info_value_for_key(&client.userinfo, "name");
    client.name = name.chars().take(32).collect();

    if is_lan && lan_force_rate {
        client.rate = LAN_FORCED_RATE;
    } else {
        let rate_str = info_value_for_key(&client.userinfo, "rate");
        client.rate = rate_str
            .parse::<i32>()
            .unwrap_or(5000)
            .clamp(MIN_RATE, MAX_RATE);
    }

    let handicap_str = info_value_for_key(&client.userinfo, "handicap");
    if !handicap_str.is_empty() {
        let ok = handicap_str
            .parse::<i32>()
            .map(|h| h > 0 && h <= 100)
            .unwrap_or(false);
        if !ok {
            info_set_value_for_key(&mut client.userinfo, "handicap", "100");
        }
    }

    let snaps_str = info_value_for_key(&client.userinfo, "snaps");
    let new_snaps = snaps_str
        .parse::<i32>()
        .unwrap_or(client.snaps)
        .clamp(1, sv_fps.max(1));
    if new_snaps != client.snaps {
        client.snaps = new_snaps;
        client.last_snapshot_time = 0;
    }
    client.snapshot_msec = 1000 / client.snaps.max(1);

    let ip_value = if matches!(
        remote.adr_type,
        arenasv_common::qcommon::NetAdrType::Loopback
    ) {
        "localhost".to_string()
    } else {
        arenasv_common::net::net_adr_to_string(remote)
    };

    let mut candidate = client.userinfo.clone();
    info_set_value_for_key(&mut candidate, "ip", &ip_value);

    if candidate.len() >= MAX_INFO_STRING {
        return UserinfoChangedResult { overflowed: true };
    }
    client.userinfo = candidate;
    UserinfoChangedResult { overflowed: false }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arenasv_common::qcommon::NetAdrType;

    fn remote() -> NetAdr {
        NetAdr {
            adr_type: NetAdrType::Ip,
            ip: [1, 2, 3, 4],
            ip6: [0; 16],
            scope_id: 0,
            port: 27960,
        }
    }

    #[test]
    fn clamps_rate_into_range() {
        let mut c = Client::default();
        c.userinfo = r"\name\Player\rate\999999".to_string();
        let r = userinfo_changed(&mut c, &remote(), false, false, 20);
        assert!(!r.overflowed);
        assert_eq!(c.rate, MAX_RATE);
    }

    #[test]
    fn lan_force_rate_overrides_requested_rate() {
        let mut c = Client::default();
        c.userinfo = r"\name\Player\rate\5000".to_string();
        userinfo_changed(&mut c, &remote(), true, true, 20);
        assert_eq!(c.rate, LAN_FORCED_RATE);
    }

    #[test]
    fn snaps_clamped_and_resets_snapshot_clock() {
        let mut c = Client::default();
        c.last_snapshot_time = 500;
        c.userinfo = r"\name\Player\snaps\500".to_string();
        userinfo_changed(&mut c, &remote(), false, false, 20);
        assert_eq!(c.snaps, 20);
        assert_eq!(c.last_snapshot_time, 0);
        assert_eq!(c.snapshot_msec, 50);
    }
}
