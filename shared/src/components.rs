//! Shared ECS components used by both server and client

use bevy::prelude::*;
use lightyear::prelude::PeerId;
use serde::{Deserialize, Serialize};

// =============================================================================
// PLAYERS
// =============================================================================

/// Marker component for player entities
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Player {
    pub client_id: PeerId,
}

/// Player position component - replicated across network
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct PlayerPosition(pub Vec3);

/// Player rotation (yaw only for simplicity) - replicated across network
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct PlayerRotation(pub f32);

/// Marker for the local player (client-side only)
#[derive(Component)]
pub struct LocalPlayer;

// =============================================================================
// HEALTH (living-entity base contract)
// =============================================================================

/// Health component for damageable entities.
///
/// This is the base living-entity contract: `current` never leaves
/// `[0, max]` and `dead` is latched exactly once when `current` reaches
/// zero. `take_damage` reports the alive -> dead edge so callers can run
/// their terminal transition exactly once.
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Health {
    pub current: f32,
    pub max: f32,
    pub dead: bool,
}

impl Default for Health {
    fn default() -> Self {
        Self {
            current: 100.0,
            max: 100.0,
            dead: false,
        }
    }
}

impl Health {
    pub fn new(max: f32) -> Self {
        Self {
            current: max,
            max,
            dead: false,
        }
    }

    /// Apply damage. Returns true only on the transition into death.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        let was_dead = self.dead;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        if self.current <= 0.0 && !was_dead {
            self.dead = true;
            return true;
        }
        false
    }

    /// Restore health. Does not revive: once dead, healing is a no-op.
    pub fn heal(&mut self, amount: f32) {
        if self.dead {
            return;
        }
        self.current = (self.current + amount.max(0.0)).min(self.max);
    }

    /// Reset to full health. Only player respawn uses this; enemies are
    /// never revived, their `dead` flag is terminal.
    pub fn respawn(&mut self) {
        self.current = self.max;
        self.dead = false;
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn percentage(&self) -> f32 {
        self.current / self.max
    }
}

// =============================================================================
// ENEMIES
// =============================================================================

/// Marker component for enemy entities (server authoritative, replicated)
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Enemy {
    pub id: u64,
}

/// Enemy position component - replicated across network
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct EnemyPosition(pub Vec3);

/// Enemy rotation (yaw) - replicated across network
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
pub struct EnemyRotation(pub f32);

/// Stats assigned once by the setup entry point and immutable afterwards.
/// Replicated so clients can apply the skin color and speed-based visuals.
#[derive(Component, Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct EnemyStats {
    pub damage: f32,
    /// Minimum simulated seconds between two contact attacks.
    pub attack_interval: f32,
    pub move_speed: f32,
    /// Skin tint as linear RGB (bevy `Color` is presentation-side).
    pub skin_color: [f32; 3],
}

impl Default for EnemyStats {
    fn default() -> Self {
        Self {
            damage: 20.0,
            attack_interval: 0.5,
            move_speed: 3.5,
            skin_color: [1.0, 1.0, 1.0],
        }
    }
}

/// Weak reference to the currently pursued entity (server-side only).
///
/// Holding an `Entity` here never implies it is still valid: liveness
/// (entity exists AND its `Health` is not dead) is re-checked at every
/// point of use, never cached.
#[derive(Component, Clone, Copy, Debug, Default)]
pub struct EnemyTarget(pub Option<Entity>);

/// Contact-attack cooldown bookkeeping (server-side only).
/// An attack may execute only if `now >= last_attack_time + attack_interval`.
#[derive(Component, Clone, Copy, Debug)]
pub struct AttackCooldown {
    pub last_attack_time: f32,
}

impl Default for AttackCooldown {
    fn default() -> Self {
        // Allow an immediate first attack.
        Self {
            last_attack_time: -10.0,
        }
    }
}

/// Animation flag: true iff the enemy currently holds a valid target.
/// Recomputed every authoritative tick and replicated for the rendering layer.
#[derive(Component, Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Default)]
pub struct HasTarget(pub bool);
