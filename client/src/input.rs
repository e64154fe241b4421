//! Player input handling

use bevy::input::mouse::MouseMotion;
use bevy::prelude::*;
use lightyear::prelude::*;
use shared::{
    FireRequest, InputChannel, PlayerInput, ReliableChannel, MOUSE_SENSITIVITY,
    PLAYER_FIRE_COOLDOWN,
};
use std::f32::consts::FRAC_PI_2;

/// Client-side input state
#[derive(Resource, Default)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    /// Mouse-controlled yaw
    pub yaw: f32,
    /// Mouse-controlled pitch
    pub pitch: f32,
    /// Local fire-rate limit so we don't spam the server
    pub last_fire_time: f32,
}

/// Handle keyboard input for movement
pub fn handle_keyboard_input(
    keyboard: Res<ButtonInput<KeyCode>>,
    mut input_state: ResMut<InputState>,
) {
    input_state.forward = keyboard.pressed(KeyCode::KeyW);
    input_state.backward = keyboard.pressed(KeyCode::KeyS);
    input_state.left = keyboard.pressed(KeyCode::KeyA);
    input_state.right = keyboard.pressed(KeyCode::KeyD);
}

/// Handle mouse input for looking around
pub fn handle_mouse_input(
    mut mouse_motion: MessageReader<MouseMotion>,
    mut input_state: ResMut<InputState>,
) {
    let mut delta = Vec2::ZERO;
    for motion in mouse_motion.read() {
        delta += motion.delta;
    }

    if delta != Vec2::ZERO {
        input_state.yaw -= delta.x * MOUSE_SENSITIVITY;
        input_state.pitch -= delta.y * MOUSE_SENSITIVITY;
        input_state.pitch = input_state.pitch.clamp(-FRAC_PI_2 + 0.01, FRAC_PI_2 - 0.01);
    }
}

/// Send input to server at the fixed tick rate
pub fn send_input_to_server(
    input_state: Res<InputState>,
    mut client_query: Query<
        &mut MessageSender<PlayerInput>,
        (With<crate::GameClient>, With<Connected>),
    >,
    time: Res<Time>,
    mut last_warn_time: Local<f32>,
) {
    let Ok(mut sender) = client_query.single_mut() else {
        // If this fires, input never reaches the server and movement freezes.
        let now = time.elapsed_secs();
        if now - *last_warn_time > 1.0 {
            warn!("send_input_to_server: missing connected client entity; not sending inputs");
            *last_warn_time = now;
        }
        return;
    };

    let input = PlayerInput {
        forward: input_state.forward,
        backward: input_state.backward,
        left: input_state.left,
        right: input_state.right,
        yaw: input_state.yaw,
    };

    sender.send::<InputChannel>(input);
}

/// Fire on left click: send the aim direction to the server, which does
/// the authoritative hit test.
pub fn send_fire_requests(
    mouse_button: Res<ButtonInput<MouseButton>>,
    mut input_state: ResMut<InputState>,
    mut client_query: Query<
        &mut MessageSender<FireRequest>,
        (With<crate::GameClient>, With<Connected>),
    >,
    time: Res<Time>,
) {
    if !mouse_button.pressed(MouseButton::Left) {
        return;
    }

    let now = time.elapsed_secs();
    if now - input_state.last_fire_time < PLAYER_FIRE_COOLDOWN {
        return;
    }

    let Ok(mut sender) = client_query.single_mut() else {
        return;
    };

    input_state.last_fire_time = now;

    let direction =
        Quat::from_euler(EulerRot::YXZ, input_state.yaw, input_state.pitch, 0.0) * -Vec3::Z;

    sender.send::<ReliableChannel>(FireRequest { direction });
}
