//! Client game states

use bevy::prelude::*;

#[derive(States, Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum GameState {
    /// Connecting to the server
    #[default]
    Connecting,
    /// In the arena
    Playing,
}
