//! Game client: renders the arena and forwards input to the server.
//!
//! Lightyear 0.25 / Bevy 0.17

mod audio;
mod camera;
mod connection;
mod effects;
mod enemy;
mod hud;
mod input;
mod player;
mod scene;
mod states;

use bevy::audio::{AudioPlugin, SpatialScale};
use bevy::prelude::*;
use bevy::window::WindowResolution;
use lightyear::prelude::client::ClientPlugins;
use shared::{protocol::tick_duration, ProtocolPlugin, SERVER_ADDR, SERVER_PORT};
use states::GameState;

/// Marker component for our client entity
#[derive(Component)]
pub struct GameClient;

fn main() {
    let mut app = App::new();

    app.add_plugins(
        DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Horde Arena".to_string(),
                    resolution: WindowResolution::new(1280, 720),
                    ..default()
                }),
                ..default()
            })
            // World units are ~meters; scale distances down so rodio's
            // inverse-square falloff stays audible.
            .set(AudioPlugin {
                default_spatial_scale: SpatialScale::new(0.2),
                ..default()
            }),
    );

    app.init_state::<GameState>();

    app.add_plugins(ClientPlugins {
        tick_duration: tick_duration(),
    });
    app.add_plugins(ProtocolPlugin);

    app.init_resource::<input::InputState>();

    app.add_systems(
        Startup,
        (
            scene::setup_scene,
            audio::setup_audio,
            player::setup_player_assets,
            enemy::setup_enemy_assets,
            effects::setup_hit_effect_assets,
        ),
    );

    // Connection
    app.add_systems(OnEnter(GameState::Connecting), connection::start_connection);
    app.add_systems(
        Update,
        connection::check_connection.run_if(in_state(GameState::Connecting)),
    );

    app.add_systems(OnEnter(GameState::Playing), (hud::spawn_hud, audio::start_ambient));

    // Send input to server at fixed tick rate (60 Hz)
    app.add_systems(
        FixedUpdate,
        input::send_input_to_server.run_if(in_state(GameState::Playing)),
    );

    // Replication-driven spawn/setup must NOT be gated solely to
    // `Playing`: initial snapshots can arrive while still `Connecting`,
    // and `Added<T>` handlers would miss them.
    app.add_systems(
        Update,
        (
            player::handle_player_spawned,
            enemy::handle_enemy_spawned,
            player::ensure_local_player_tag,
        )
            .chain()
            .run_if(in_state(GameState::Connecting).or(in_state(GameState::Playing))),
    );

    // Gameplay systems
    app.add_systems(
        Update,
        (
            input::handle_keyboard_input,
            input::handle_mouse_input,
            input::send_fire_requests,
            connection::grab_cursor,
            // Render pose pipeline: replicated state first, camera last.
            (
                player::sync_player_transforms,
                enemy::sync_enemy_transforms,
                camera::update_camera,
            )
                .chain(),
            player::update_player_visibility,
        )
            .run_if(in_state(GameState::Playing)),
    );

    // Enemy presentation
    app.add_systems(
        Update,
        (
            enemy::update_health_bar_fill,
            enemy::billboard_health_bars,
            enemy::update_target_glow,
            enemy::handle_enemy_killed,
            enemy::update_death_fall,
        )
            .run_if(in_state(GameState::Playing)),
    );

    // Effects and HUD
    app.add_systems(
        Update,
        (
            effects::handle_enemy_hits,
            effects::update_hit_particles,
            hud::update_health_display,
            hud::handle_damage_received,
            hud::update_damage_flash,
        )
            .run_if(in_state(GameState::Playing)),
    );

    info!("Starting client, server at {}:{}", SERVER_ADDR, SERVER_PORT);
    app.run();
}
