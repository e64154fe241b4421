//! Lightyear network protocol definition
//!
//! The server is the single replication writer: enemy and player state
//! flows server -> client as replicated components, transient combat
//! feedback flows as messages.

use bevy::prelude::*;
use lightyear::prelude::*;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::components::{
    Enemy, EnemyPosition, EnemyRotation, EnemyStats, HasTarget, Health, Player, PlayerPosition,
    PlayerRotation,
};

// --- Input (for server-authoritative movement) ---

/// Player input sent from client to server each tick
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
pub struct PlayerInput {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Player's facing direction (yaw) for movement calculation
    pub yaw: f32,
}

// --- Messages ---

/// Message sent from client to request firing at an enemy
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct FireRequest {
    /// Normalized aim direction in world space
    pub direction: Vec3,
}

/// Server -> Client: an enemy took a hit (drives hit particles, hit
/// sound, and the immediate health-bar refresh on every client).
///
/// `health_shown` is the value the display uses at feedback time, which
/// is the pre-hit health; the replicated `Health` component carries the
/// post-hit value a moment later.
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct EnemyHit {
    pub enemy_id: u64,
    pub hit_point: Vec3,
    pub hit_normal: Vec3,
    pub health_shown: f32,
    pub health_max: f32,
}

/// Server -> Client: an enemy died (terminal; drives the death
/// animation, death sound, and health-bar removal).
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct EnemyKilled {
    pub enemy_id: u64,
    /// Where the corpse lies, for spatial audio placement.
    pub position: Vec3,
}

/// Message sent from server when the local player takes damage
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct DamageReceived {
    /// Direction damage came from (for hit indicator)
    pub direction: Vec3,
    /// Damage amount
    pub damage: f32,
    /// Current health after damage
    pub health_remaining: f32,
}

// --- Channels ---
// In Lightyear 0.25, Channel trait is auto-implemented for all Send + Sync + 'static types

/// Reliable channel for important messages
pub struct ReliableChannel;

/// Unreliable channel for frequent input (lowest latency)
pub struct InputChannel;

// --- Protocol Plugin ---

pub struct ProtocolPlugin;

impl Plugin for ProtocolPlugin {
    fn build(&self, app: &mut App) {
        // === PLAYER COMPONENTS ===

        app.register_component::<Player>()
            .add_prediction();

        app.register_component::<PlayerPosition>()
            .add_prediction();

        app.register_component::<PlayerRotation>()
            .add_prediction();

        // === ENEMY COMPONENTS ===

        app.register_component::<Enemy>()
            .add_prediction();

        app.register_component::<EnemyPosition>()
            .add_prediction();

        app.register_component::<EnemyRotation>()
            .add_prediction();

        app.register_component::<EnemyStats>()
            .add_prediction();

        app.register_component::<HasTarget>()
            .add_prediction();

        // === COMBAT COMPONENTS ===

        app.register_component::<Health>()
            .add_prediction();

        // === MESSAGES ===

        // Client -> Server
        app.register_message::<PlayerInput>()
            .add_direction(NetworkDirection::ClientToServer);
        app.register_message::<FireRequest>()
            .add_direction(NetworkDirection::ClientToServer);

        // Server -> Client
        app.register_message::<EnemyHit>()
            .add_direction(NetworkDirection::ServerToClient);
        app.register_message::<EnemyKilled>()
            .add_direction(NetworkDirection::ServerToClient);
        app.register_message::<DamageReceived>()
            .add_direction(NetworkDirection::ServerToClient);

        // === CHANNELS ===

        app.add_channel::<ReliableChannel>(ChannelSettings {
            mode: ChannelMode::OrderedReliable(ReliableSettings::default()),
            ..default()
        })
        // Combat feedback; per-enemy causal order matters for hit-then-kill.
        .add_direction(NetworkDirection::Bidirectional);

        app.add_channel::<InputChannel>(ChannelSettings {
            mode: ChannelMode::UnorderedUnreliable,
            ..default()
        })
        // High-frequency input: client -> server only
        .add_direction(NetworkDirection::ClientToServer);
    }
}

// --- Network Configuration ---

pub const SERVER_PORT: u16 = 5000;
pub const SERVER_ADDR: &str = "127.0.0.1";
pub const PROTOCOL_ID: u64 = 0xD0A7_51CC_0D15_EA5E;

/// Server bind address - 0.0.0.0 works for both local and hosted deployments.
pub fn get_server_bind_addr() -> &'static str {
    "0.0.0.0"
}

/// Shared private key for local development (use proper key management in production!)
pub const PRIVATE_KEY: [u8; 32] = [
    0x21, 0x02, 0x13, 0x04, 0x25, 0x06, 0x37, 0x08,
    0x49, 0x0a, 0x5b, 0x0c, 0x6d, 0x0e, 0x7f, 0x10,
    0x81, 0x12, 0x93, 0x14, 0xa5, 0x16, 0xb7, 0x18,
    0xc9, 0x1a, 0xdb, 0x1c, 0xed, 0x1e, 0xff, 0x20,
];

/// Fixed timestep for game logic (60 Hz)
pub const FIXED_TIMESTEP_HZ: f64 = 60.0;

/// Tick duration for lightyear plugins
pub fn tick_duration() -> Duration {
    Duration::from_secs_f64(1.0 / FIXED_TIMESTEP_HZ)
}
