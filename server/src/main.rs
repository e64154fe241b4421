//! Game server - headless Bevy app and session authority.
//!
//! This process is the only participant that runs mutating simulation:
//! player movement, enemy behavior, damage and death. Everything else
//! mirrors replicated state.

mod enemy;
mod systems;

use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;
use lightyear::prelude::server::*;
use lightyear::prelude::*;
use shared::{
    protocol::*, ProtocolPlugin, SessionAuthority, SpatialBodyIndex,
};
use std::net::SocketAddr;

use systems::ClientInputs;

/// Marker for our server entity
#[derive(Component)]
struct GameServer;

/// Spawn the server entity with all required networking components
fn spawn_server(mut commands: Commands) {
    let bind_addr = get_server_bind_addr();
    let server_addr: SocketAddr = format!("{}:{}", bind_addr, SERVER_PORT)
        .parse()
        .expect("Invalid server bind address");

    info!("Spawning server entity, binding to {:?}", server_addr);

    commands.spawn((
        GameServer,
        Server::default(),
        ServerUdpIo::default(),
        LocalAddr(server_addr),
        NetcodeServer::new(NetcodeConfig {
            protocol_id: PROTOCOL_ID,
            private_key: PRIVATE_KEY,
            ..default()
        }),
    ));
}

/// Start the server after it's spawned
fn start_server(
    mut commands: Commands,
    server_query: Query<Entity, (With<GameServer>, Without<Started>, Without<Starting>)>,
) {
    for server_entity in server_query.iter() {
        info!("Starting server...");
        commands.trigger(Start { entity: server_entity });
    }
}

/// Check if server is started (run condition)
fn server_is_started(server_query: Query<(), (With<GameServer>, With<Started>)>) -> bool {
    !server_query.is_empty()
}

fn main() {
    let mut app = App::new();

    // Headless plugins (no rendering)
    // IMPORTANT: run the main loop at the same rate as our fixed tick.
    //
    // If the headless app runs "as fast as possible", Bevy clears the
    // `MessageReceiver` buffers every frame (in `Last`), but gameplay
    // reads messages in `FixedUpdate`. When frames >> fixed ticks, most
    // input/fire messages get cleared before `FixedUpdate` runs.
    app.add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_loop(tick_duration())));
    app.add_plugins(bevy::log::LogPlugin::default());

    // This process is the session authority for its whole lifetime.
    app.insert_resource(SessionAuthority(true));

    // Spatial query service, rebuilt from live bodies each tick
    app.init_resource::<SpatialBodyIndex>();

    // Server-side input cache
    app.init_resource::<ClientInputs>();

    // Enemy wave bookkeeping
    app.init_resource::<enemy::WaveState>();

    // Lightyear server plugins (tick_duration = 60Hz)
    app.add_plugins(ServerPlugins {
        tick_duration: tick_duration(),
    });

    // Protocol plugin (component/message registration)
    app.add_plugins(ProtocolPlugin);

    app.add_systems(Startup, spawn_server);

    // Start server after spawning, then keep the horde populated
    app.add_systems(Update, start_server);
    app.add_systems(
        Update,
        enemy::spawn_wave_when_cleared.run_if(server_is_started.and(shared::has_authority)),
    );

    // Fixed tick: receive inputs, simulate everyone, resolve combat.
    // Every mutating system runs behind the authority gate; the order
    // within one tick is pursuit -> navigation -> attacks -> damage ->
    // animation-flag publication.
    app.add_systems(
        FixedUpdate,
        (
            systems::handle_connections,
            systems::handle_disconnections,
            systems::receive_client_input,
            systems::simulate_players,
            systems::tick_player_respawns,
            enemy::rebuild_body_index,
            enemy::tick_pursuit,
            enemy::step_navigation,
            enemy::tick_contact_attacks,
            systems::handle_fire_requests,
            enemy::publish_has_target,
            enemy::tick_dead_enemy_despawns,
        )
            .chain()
            .run_if(server_is_started.and(shared::has_authority)),
    );

    info!("Starting server on port {}", SERVER_PORT);
    app.run();
}
