//! Shared gameplay core used by both server and client.
//!
//! The server is the single session authority: it runs every mutating
//! system and replicates the results. Clients only render the mirrored
//! state, so everything here is written to be driven headless (the
//! enemy behavior core in [`enemy`] takes its collaborators as trait
//! arguments and never touches the network directly).

use bevy::prelude::*;

pub mod components;
pub mod enemy;
pub mod movement;
pub mod player;
pub mod protocol;
pub mod spatial;

pub use components::*;
pub use enemy::*;
pub use movement::*;
pub use player::*;
pub use protocol::*;
pub use spatial::*;

/// Whether this process is the authoritative host for the session.
///
/// Supplied once at startup (true on the server, false on clients) and
/// never flipped afterwards; authority migration is out of scope. Every
/// mutating system set is gated on [`has_authority`] instead of inline
/// per-function checks.
#[derive(Resource, Clone, Copy, Debug)]
pub struct SessionAuthority(pub bool);

impl Default for SessionAuthority {
    fn default() -> Self {
        Self(false)
    }
}

/// Run condition for mutating simulation systems.
///
/// Non-authoritative participants simply skip the gated systems; that
/// is the expected path, not an error.
pub fn has_authority(authority: Res<SessionAuthority>) -> bool {
    authority.0
}
