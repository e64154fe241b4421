//! Server-side player systems: connections, input, movement, firing.

use bevy::prelude::*;
use lightyear::prelude::server::*;
use lightyear::prelude::*;
use std::collections::HashMap;

use shared::{
    apply_movement, on_damage, DamageReceived, Enemy, EnemyHit, EnemyKilled, EnemyPosition,
    FireRequest, Health, Player, PlayerInput, PlayerPosition, PlayerRotation, ReliableChannel,
    ENEMY_HEIGHT, FIXED_TIMESTEP_HZ, PLAYER_FIRE_COOLDOWN, PLAYER_FIRE_DAMAGE, PLAYER_FIRE_RANGE,
    PLAYER_HEIGHT, PLAYER_MAX_HEALTH, PLAYER_RESPAWN_TIME, SPAWN_POSITION,
};

use crate::enemy::{deliver_feedback, BodyColliders, NavMotor};
use shared::FeedbackBuffer;

/// Stores the latest input for each connected client.
#[derive(Resource, Default)]
pub struct ClientInputs {
    pub latest: HashMap<PeerId, PlayerInput>,
}

/// Component added to dead players while waiting to respawn
#[derive(Component)]
pub struct RespawnTimer {
    pub time_remaining: f32,
}

/// Per-player fire cooldown bookkeeping (server-side only)
#[derive(Component)]
pub struct FireControl {
    pub last_fire_time: f32,
}

impl Default for FireControl {
    fn default() -> Self {
        // Allow an immediate first shot.
        Self {
            last_fire_time: -10.0,
        }
    }
}

/// Handle new client connections: set up message channels and spawn the
/// player entity for the peer.
pub fn handle_connections(
    mut commands: Commands,
    new_clients: Query<(Entity, &RemoteId), Added<Connected>>,
    client_filter: Query<(), With<ClientOf>>,
    existing_players: Query<&Player>,
) {
    for (client_entity, remote_id) in new_clients.iter() {
        // Skip if this isn't a client link
        if client_filter.get(client_entity).is_err() {
            continue;
        }

        let peer_id = remote_id.0;
        info!("Client connected: {:?}", peer_id);

        // IMPORTANT: enable replication + message I/O on this client link.
        //
        // Lightyear 0.25 requires these components on the connection
        // entity (the one with `ClientOf` + `Connected`); without them,
        // no replication happens.
        commands.entity(client_entity).insert((
            // Replication out: server -> this client
            ReplicationSender::new(
                shared::protocol::tick_duration(),
                SendUpdatesMode::SinceLastAck,
                false,
            ),
            // Client -> Server
            MessageReceiver::<PlayerInput>::default(),
            MessageReceiver::<FireRequest>::default(),
            // Server -> Client
            MessageSender::<EnemyHit>::default(),
            MessageSender::<EnemyKilled>::default(),
            MessageSender::<DamageReceived>::default(),
        ));

        // One player entity per peer (guard against duplicate Connected edges)
        if existing_players.iter().any(|p| p.client_id == peer_id) {
            continue;
        }

        commands.spawn((
            Player { client_id: peer_id },
            PlayerPosition(Vec3::from_array(SPAWN_POSITION)),
            PlayerRotation(0.0),
            Health::new(PLAYER_MAX_HEALTH),
            FireControl::default(),
            Replicate::new(ReplicationMode::SingleServer(NetworkTarget::All)),
        ));

        info!("Spawned player for {:?} at {:?}", peer_id, SPAWN_POSITION);
    }
}

/// Despawn the player entity when its peer disconnects. Enemies holding
/// it as a target recover on their next pursuit cycle (stale handle).
pub fn handle_disconnections(
    mut commands: Commands,
    disconnected: Query<&RemoteId, Added<Disconnected>>,
    players: Query<(Entity, &Player)>,
    mut inputs: ResMut<ClientInputs>,
) {
    for remote_id in disconnected.iter() {
        let peer_id = remote_id.0;
        info!("Client disconnected: {:?}", peer_id);

        for (player_entity, player) in players.iter() {
            if player.client_id == peer_id {
                commands.entity(player_entity).despawn();
            }
        }
        inputs.latest.remove(&peer_id);
    }
}

/// Receive input messages from clients
pub fn receive_client_input(
    mut inputs: ResMut<ClientInputs>,
    mut client_links: Query<(&RemoteId, &mut MessageReceiver<PlayerInput>), With<ClientOf>>,
) {
    for (remote_id, mut receiver) in client_links.iter_mut() {
        for input in receiver.receive() {
            inputs.latest.insert(remote_id.0, input);
        }
    }
}

/// Simulate all players
pub fn simulate_players(
    inputs: Res<ClientInputs>,
    mut players: Query<(&Player, &Health, &mut PlayerPosition, &mut PlayerRotation)>,
) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;

    for (player, health, mut position, mut rotation) in players.iter_mut() {
        // Dead players stay where they fell until respawn.
        if health.is_dead() {
            continue;
        }

        let input = inputs
            .latest
            .get(&player.client_id)
            .cloned()
            .unwrap_or_default();

        apply_movement(&input, &mut position, &mut rotation, dt);
    }
}

/// Respawn dead players after a delay.
pub fn tick_player_respawns(
    mut commands: Commands,
    mut players: Query<
        (
            Entity,
            &Player,
            &mut Health,
            &mut PlayerPosition,
            Option<&mut RespawnTimer>,
        ),
        Without<Enemy>,
    >,
) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;

    for (entity, player, mut health, mut position, timer) in players.iter_mut() {
        if !health.is_dead() {
            continue;
        }

        match timer {
            None => {
                commands.entity(entity).insert(RespawnTimer {
                    time_remaining: PLAYER_RESPAWN_TIME,
                });
            }
            Some(mut timer) => {
                timer.time_remaining -= dt;
                if timer.time_remaining <= 0.0 {
                    health.respawn();
                    position.0 = Vec3::from_array(SPAWN_POSITION);
                    commands.entity(entity).remove::<RespawnTimer>();
                    info!("Respawned player {:?}", player.client_id);
                }
            }
        }
    }
}

/// Handle fire requests: hitscan from the shooter's eye against enemy
/// bodies, then run the enemy damage entry point on the closest hit.
pub fn handle_fire_requests(
    mut client_links: Query<(&RemoteId, &mut MessageReceiver<FireRequest>), With<ClientOf>>,
    mut players: Query<
        (&Player, &PlayerPosition, &Health, &mut FireControl),
        (With<Player>, Without<Enemy>),
    >,
    mut enemies: Query<
        (
            Entity,
            &Enemy,
            &EnemyPosition,
            &mut Health,
            &mut NavMotor,
            &mut BodyColliders,
        ),
        (With<Enemy>, Without<Player>),
    >,
    mut senders: Query<
        (&mut MessageSender<EnemyHit>, &mut MessageSender<EnemyKilled>),
        (With<ClientOf>, With<Connected>),
    >,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (remote_id, mut receiver) in client_links.iter_mut() {
        let peer_id = remote_id.0;

        for request in receiver.receive() {
            let Some((_, position, health, mut fire)) =
                players.iter_mut().find(|(p, _, _, _)| p.client_id == peer_id)
            else {
                continue;
            };
            if health.is_dead() {
                continue;
            }
            if now - fire.last_fire_time < PLAYER_FIRE_COOLDOWN {
                continue;
            }

            let direction = request.direction.normalize_or_zero();
            if direction == Vec3::ZERO {
                continue;
            }
            fire.last_fire_time = now;

            let eye = position.0 + Vec3::Y * (PLAYER_HEIGHT * 0.35);

            // Closest ray/body intersection wins.
            let mut best: Option<(f32, Entity)> = None;
            for (entity, _, enemy_pos, enemy_health, _, colliders) in enemies.iter() {
                if enemy_health.is_dead() || !colliders.enabled {
                    continue;
                }
                // Generous body sphere centered mid-torso.
                let body_center = enemy_pos.0 + Vec3::Y * (ENEMY_HEIGHT * 0.5);
                if let Some(t) = ray_sphere(eye, direction, body_center, ENEMY_HEIGHT * 0.5) {
                    if t <= PLAYER_FIRE_RANGE && best.is_none_or(|(bt, _)| t < bt) {
                        best = Some((t, entity));
                    }
                }
            }

            let Some((t, enemy_entity)) = best else {
                continue;
            };
            let Ok((_, enemy, enemy_pos, mut enemy_health, mut motor, mut colliders)) =
                enemies.get_mut(enemy_entity)
            else {
                continue;
            };

            let hit_point = eye + direction * t;
            let body_center = enemy_pos.0 + Vec3::Y * (ENEMY_HEIGHT * 0.5);
            let hit_normal = (hit_point - body_center).normalize_or_zero();

            let mut feedback = FeedbackBuffer::default();
            let died = on_damage(
                &mut enemy_health,
                &mut *motor,
                &mut feedback,
                PLAYER_FIRE_DAMAGE,
                hit_point,
                hit_normal,
            );

            info!(
                "Player {:?} hit enemy {} for {:.1} (kill: {})",
                peer_id, enemy.id, PLAYER_FIRE_DAMAGE, died
            );

            deliver_feedback(enemy.id, enemy_pos.0, feedback, &mut colliders, &mut senders);
        }
    }
}

/// Ray vs sphere intersection; returns the nearest positive distance.
fn ray_sphere(origin: Vec3, direction: Vec3, center: Vec3, radius: f32) -> Option<f32> {
    let oc = origin - center;
    let c = oc.length_squared() - radius * radius;
    if c <= 0.0 {
        // Origin already inside the body. An immediate hit here, or a
        // point-blank shot passes through and lands on an enemy behind.
        return Some(0.0);
    }
    let b = oc.dot(direction);
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let t = -b - disc.sqrt();
    (t >= 0.0).then_some(t)
}

/// Send a reliable message to the client link belonging to `peer_id`.
pub fn send_damage_received(
    links: &mut Query<(&RemoteId, &mut MessageSender<DamageReceived>), With<ClientOf>>,
    peer_id: PeerId,
    message: DamageReceived,
) {
    for (remote_id, mut sender) in links.iter_mut() {
        if remote_id.0 == peer_id {
            sender.send::<ReliableChannel>(message.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ray_hits_sphere_ahead() {
        let t = ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, -10.0), 0.9);
        assert!(t.is_some_and(|t| (t - 9.1).abs() < 1e-3));
    }

    #[test]
    fn ray_misses_sphere_behind() {
        let t = ray_sphere(Vec3::ZERO, Vec3::NEG_Z, Vec3::new(0.0, 0.0, 10.0), 0.9);
        assert!(t.is_none());
    }

    #[test]
    fn point_blank_shot_hits_enclosing_body() {
        // Nothing stops a player walking into an enemy, so the eye can
        // end up inside the body sphere. The shot must still land on
        // that enemy rather than skipping to one behind it.
        let center = Vec3::new(0.0, 0.9, -0.2);
        let eye = Vec3::new(0.0, 0.63, 0.0);
        let t = ray_sphere(eye, Vec3::NEG_Z, center, ENEMY_HEIGHT * 0.5);
        assert_eq!(t, Some(0.0));
    }

    #[test]
    fn grazing_ray_outside_radius_misses() {
        let t = ray_sphere(Vec3::new(1.0, 0.0, 0.0), Vec3::NEG_Z, Vec3::new(0.0, 0.0, -5.0), 0.9);
        assert!(t.is_none());
    }
}
