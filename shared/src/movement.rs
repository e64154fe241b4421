//! Shared player movement logic (server authority, client prediction)

use bevy::prelude::*;

use crate::{PlayerInput, PlayerPosition, PlayerRotation, ARENA_HALF_EXTENT, PLAYER_SPEED};

/// Apply movement input to update player position.
///
/// The arena is a flat plane; the capsule center stays at its spawn
/// height and horizontal movement is clamped to the arena bounds.
pub fn apply_movement(
    input: &PlayerInput,
    position: &mut PlayerPosition,
    rotation: &mut PlayerRotation,
    delta_seconds: f32,
) {
    // Update rotation from input
    rotation.0 = input.yaw;

    // Calculate movement direction based on input and rotation
    // In Bevy: +X is right, +Y is up, -Z is forward
    let mut direction = Vec3::ZERO;

    let forward = Vec3::new(-rotation.0.sin(), 0.0, -rotation.0.cos());
    let right = Vec3::new(rotation.0.cos(), 0.0, -rotation.0.sin());

    if input.forward {
        direction += forward;
    }
    if input.backward {
        direction -= forward;
    }
    if input.right {
        direction += right;
    }
    if input.left {
        direction -= right;
    }

    if direction.length_squared() > 0.0 {
        direction = direction.normalize();
        position.0 += direction * PLAYER_SPEED * delta_seconds;
        position.0.x = position.0.x.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT);
        position.0.z = position.0.z.clamp(-ARENA_HALF_EXTENT, ARENA_HALF_EXTENT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forward_input_moves_along_facing() {
        let input = PlayerInput {
            forward: true,
            yaw: 0.0,
            ..Default::default()
        };
        let mut position = PlayerPosition(Vec3::new(0.0, 0.9, 0.0));
        let mut rotation = PlayerRotation(0.0);

        apply_movement(&input, &mut position, &mut rotation, 1.0);

        // Yaw 0 faces -Z.
        assert!((position.0.z - (-PLAYER_SPEED)).abs() < 1e-4);
        assert_eq!(position.0.x, 0.0);
        assert_eq!(position.0.y, 0.9);
    }

    #[test]
    fn movement_clamped_to_arena() {
        let input = PlayerInput {
            forward: true,
            yaw: 0.0,
            ..Default::default()
        };
        let mut position = PlayerPosition(Vec3::new(0.0, 0.9, -ARENA_HALF_EXTENT + 0.1));
        let mut rotation = PlayerRotation(0.0);

        apply_movement(&input, &mut position, &mut rotation, 1.0);

        assert_eq!(position.0.z, -ARENA_HALF_EXTENT);
    }
}
