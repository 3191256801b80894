// sv_game.rs — the pluggable game-module boundary
// Converted from: myq2-original/server/sv_game.rs (the GameExport fn-pointer
// table), trimmed to six lifecycle hooks; DLL loading, edict simulation, and
// the pf_* engine-function plumbing are the game module's own concern.

/// The only coupling between this engine and gameplay. The engine calls these
/// methods at defined lifecycle points and otherwise never inspects gameplay
/// state.
pub trait GameModule {
    /// Called on a successful `direct_connect`. Returning `Some(reason)` rejects
    /// the connection and the slot is never populated.
    fn client_connect(&mut self, client_index: usize, first_time: bool, is_bot: bool) -> Option<String>;

    fn client_begin(&mut self, client_index: usize);

    fn client_userinfo_changed(&mut self, client_index: usize, userinfo: &str);

    fn client_disconnect(&mut self, client_index: usize);

    /// Dispatch for reliable commands not recognized as engine built-ins.
    fn client_command(&mut self, client_index: usize, argv: &[&str]);

    fn client_think(&mut self, client_index: usize, cmd: &arenasv_common::q_shared::UserCmd);
}

#[cfg(test)]
pub mod test_support {
    use super::GameModule;
    use std::collections::HashMap;

    #[derive(Default)]
    pub struct RecordingGameModule {
        pub connects: Vec<usize>,
        pub disconnects: Vec<usize>,
        pub thinks: HashMap<usize, u32>,
        pub reject_next: bool,
    }

    impl GameModule for RecordingGameModule {
        fn client_connect(&mut self, client_index: usize, _first_time: bool, _is_bot: bool) -> Option<String> {
            if self.reject_next {
                self.reject_next = false;
                return Some("rejected by test game module".to_string());
            }
            self.connects.push(client_index);
            None
        }

        fn client_begin(&mut self, _client_index: usize) {}

        fn client_userinfo_changed(&mut self, _client_index: usize, _userinfo: &str) {}

        fn client_disconnect(&mut self, client_index: usize) {
            self.disconnects.push(client_index);
        }

        fn client_command(&mut self, _client_index: usize, _argv: &[&str]) {}

        fn client_think(&mut self, client_index: usize, _cmd: &arenasv_common::q_shared::UserCmd) {
            *self.thinks.entry(client_index).or_insert(0) += 1;
        }
    }
}
