//! Player-related constants

/// Player movement speed (units per second)
pub const PLAYER_SPEED: f32 = 6.0;

/// Player height (for capsule)
pub const PLAYER_HEIGHT: f32 = 1.8;

/// Player radius (for capsule)
pub const PLAYER_RADIUS: f32 = 0.3;

/// Mouse sensitivity for look
pub const MOUSE_SENSITIVITY: f32 = 0.003;

/// Spawn position for new players (capsule center on flat ground)
pub const SPAWN_POSITION: [f32; 3] = [0.0, 0.9, 0.0];

/// Player starting/maximum health
pub const PLAYER_MAX_HEALTH: f32 = 100.0;

/// Maximum hitscan range of the player rifle
pub const PLAYER_FIRE_RANGE: f32 = 50.0;

/// Minimum seconds between player shots
pub const PLAYER_FIRE_COOLDOWN: f32 = 0.18;

/// Damage per player shot
pub const PLAYER_FIRE_DAMAGE: f32 = 20.0;

/// How long a dead player waits before respawning (seconds)
pub const PLAYER_RESPAWN_TIME: f32 = 4.0;

/// Half extent of the playable square arena, centered on the origin
pub const ARENA_HALF_EXTENT: f32 = 60.0;
