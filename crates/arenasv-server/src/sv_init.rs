// sv_init.rs — server initialization: configuration-variable registration
// Converted from: myq2-original/server/sv_init.c (cvar registration block).

use arenasv_common::q_shared::{CVAR_ARCHIVE, CVAR_LATCH, CVAR_NOSET, CVAR_SERVERINFO, CVAR_ZERO};

use crate::server::ServerContext;

/// Register every configuration variable the engine consults.
pub fn sv_init(ctx: &mut ServerContext) {
    ctx.cvars.get("sv_maxclients", Some("8"), CVAR_SERVERINFO | CVAR_LATCH);
    ctx.cvars.get("sv_privateClients", Some("0"), CVAR_LATCH);
    ctx.cvars.get("sv_privatePassword", Some(""), CVAR_NOSET);
    ctx.cvars.get("sv_pure", Some("1"), CVAR_SERVERINFO | CVAR_LATCH);
    ctx.cvars.get("sv_minPing", Some("0"), CVAR_ARCHIVE);
    ctx.cvars.get("sv_maxPing", Some("0"), CVAR_ARCHIVE);
    ctx.cvars.get("sv_floodProtect", Some("10"), CVAR_ARCHIVE);
    ctx.cvars.get("sv_reconnectlimit", Some("3"), CVAR_ARCHIVE);
    ctx.cvars.get("sv_clientsPerIp", Some("3"), CVAR_ARCHIVE);
    ctx.cvars.get("sv_lanForceRate", Some("1"), CVAR_ARCHIVE);
    ctx.cvars.get("com_dedicated", Some("0"), CVAR_ZERO);
    ctx.cvars.get("public", Some("0"), CVAR_ZERO);
    ctx.cvars.get("sv_fps", Some("20"), CVAR_SERVERINFO | CVAR_LATCH);
    ctx.cvars.get("sv_autoRecordDemo", Some("0"), CVAR_ARCHIVE);
    ctx.cvars.get("com_gamename", Some("arenasv"), CVAR_SERVERINFO | CVAR_NOSET);
    ctx.cvars.get(
        "com_protocol",
        Some(&arenasv_common::qcommon::PROTOCOL_VERSION.to_string()),
        CVAR_SERVERINFO | CVAR_NOSET,
    );
    ctx.cvars.get("sv_legacyProtocol", Some("0"), CVAR_LATCH);

    ctx.maxclients_value = ctx.cvars.variable_value("sv_maxclients") as i32;
    ctx.private_clients_value = ctx.cvars.variable_value("sv_privateClients") as i32;

    ctx.svs.clients.clear();
    ctx.svs
        .clients
        .resize_with(ctx.maxclients_value.max(1) as usize, Default::default);

    ctx.svs.initialized = true;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_expected_defaults_and_sizes_client_array() {
        let mut ctx = ServerContext::default();
        sv_init(&mut ctx);
        assert_eq!(ctx.cvars.variable_value("sv_pure"), 1.0);
        assert_eq!(ctx.svs.clients.len(), ctx.maxclients_value as usize);
    }
}
