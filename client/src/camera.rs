//! First-person camera

use bevy::prelude::*;
use shared::{LocalPlayer, PLAYER_HEIGHT};

/// Camera offset from player position (eye level)
const CAMERA_HEIGHT_OFFSET: f32 = PLAYER_HEIGHT * 0.35;

/// Update camera to follow the local player
pub fn update_camera(
    player_query: Query<&Transform, (With<LocalPlayer>, Without<Camera3d>)>,
    mut camera_query: Query<&mut Transform, (With<Camera3d>, Without<LocalPlayer>)>,
    input_state: Res<crate::input::InputState>,
    time: Res<Time>,
) {
    let Some(player_transform) = player_query.iter().next() else {
        return;
    };

    let Ok(mut camera_transform) = camera_query.single_mut() else {
        return;
    };

    let target_pos = player_transform.translation + Vec3::new(0.0, CAMERA_HEIGHT_OFFSET, 0.0);
    let target_rot = Quat::from_euler(EulerRot::YXZ, input_state.yaw, input_state.pitch, 0.0);

    // Mild smoothing to remove micro-jitter from replicated positions.
    let cam_rate: f32 = 35.0;
    let cam_t = 1.0_f32 - (-cam_rate * time.delta_secs()).exp();

    camera_transform.translation = camera_transform.translation.lerp(target_pos, cam_t);
    camera_transform.rotation = camera_transform.rotation.slerp(target_rot, cam_t);
}
