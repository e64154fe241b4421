//! Server-side enemy simulation.
//!
//! Enemies are fully server-authoritative: the pursuit loop, the combat
//! state machine and contact attacks all run here, and clients only see
//! replicated components plus feedback messages. The behavior core lives
//! in `shared::enemy`; this module wires it to the ECS and the network.

use bevy::prelude::*;
use lightyear::prelude::server::*;
use lightyear::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use shared::{
    apply_setup, check_contact_attack, pursuit_cycle, AttackCooldown, BodyEntry, BodyTag,
    DamageReceived, Enemy, EnemyHit, EnemyKilled, EnemyPosition, EnemyRotation, EnemyStats,
    EnemyTarget, FeedbackBuffer, FeedbackEvent, HasTarget, Health, NavAgent, Player,
    PlayerPosition, ReliableChannel, SpatialBodyIndex, CONTACT_SLACK, DEAD_ENEMY_DESPAWN_TIME,
    ENEMY_PRESETS, ENEMY_RADIUS, ENEMY_TURN_SPEED, FIXED_TIMESTEP_HZ, PLAYER_RADIUS,
    PURSUIT_PERIOD,
};

use crate::systems::RespawnTimer;

/// Enemies per wave on top of the base count.
const WAVE_BASE_COUNT: u32 = 4;
/// Pause between clearing a wave and the next one arriving.
const WAVE_RESPITE: f32 = 3.0;
/// Radius of the spawn ring around the arena center.
const WAVE_SPAWN_RADIUS: f32 = 25.0;

// =============================================================================
// COMPONENTS
// =============================================================================

/// Server-side navigation motor driving an enemy across the arena.
///
/// Stands in for a full navmesh agent: a destination, a speed, and
/// pause/disable switches. `step_navigation` integrates it each tick.
#[derive(Component, Debug)]
pub struct NavMotor {
    pub destination: Option<Vec3>,
    pub speed: f32,
    pub stopped: bool,
    pub enabled: bool,
}

impl Default for NavMotor {
    fn default() -> Self {
        Self {
            destination: None,
            speed: 0.0,
            stopped: true,
            enabled: true,
        }
    }
}

impl NavAgent for NavMotor {
    fn set_destination(&mut self, point: Vec3) {
        if self.enabled {
            self.destination = Some(point);
        }
    }
    fn pause(&mut self) {
        self.stopped = true;
    }
    fn resume(&mut self) {
        if self.enabled {
            self.stopped = false;
        }
    }
    fn set_speed(&mut self, speed: f32) {
        self.speed = speed;
    }
    fn disable(&mut self) {
        self.enabled = false;
        self.destination = None;
    }
}

/// Whether this enemy's body still blocks rays and contact queries.
/// Switched off on death so corpses stop soaking shots.
#[derive(Component)]
pub struct BodyColliders {
    pub enabled: bool,
}

impl Default for BodyColliders {
    fn default() -> Self {
        Self { enabled: true }
    }
}

/// Drives the periodic pursuit cycle. Decoupled from the tick rate so
/// target scans stay cheap at 60Hz.
#[derive(Component)]
pub struct PursuitTimer(pub Timer);

impl Default for PursuitTimer {
    fn default() -> Self {
        Self(Timer::from_seconds(PURSUIT_PERIOD, TimerMode::Repeating))
    }
}

/// Timer component for tracking how long an enemy has been dead.
/// When the timer reaches 0, the corpse is despawned.
#[derive(Component)]
pub struct DeadEnemyDespawnTimer(pub f32);

// =============================================================================
// WAVES
// =============================================================================

#[derive(Resource)]
pub struct WaveState {
    pub wave: u32,
    pub next_enemy_id: u64,
    pub respite_remaining: f32,
}

impl Default for WaveState {
    fn default() -> Self {
        Self {
            wave: 0,
            next_enemy_id: 1,
            respite_remaining: WAVE_RESPITE,
        }
    }
}

/// Spawn the next wave once every enemy from the previous one is dead
/// and at least one player is around to fight it.
pub fn spawn_wave_when_cleared(
    mut commands: Commands,
    mut state: ResMut<WaveState>,
    enemies: Query<&Health, With<Enemy>>,
    players: Query<(), With<Player>>,
    time: Res<Time>,
) {
    if players.is_empty() {
        return;
    }
    if enemies.iter().any(|h| !h.is_dead()) {
        return;
    }

    state.respite_remaining -= time.delta_secs();
    if state.respite_remaining > 0.0 {
        return;
    }
    state.respite_remaining = WAVE_RESPITE;
    state.wave += 1;

    let count = WAVE_BASE_COUNT + state.wave;
    let mut rng = rand::thread_rng();
    info!("Spawning wave {} with {} enemies", state.wave, count);

    for i in 0..count {
        let setup = ENEMY_PRESETS
            .choose(&mut rng)
            .copied()
            .unwrap_or(ENEMY_PRESETS[0]);

        // Ring placement with a little jitter so packs don't stack.
        let angle = (i as f32 / count as f32) * std::f32::consts::TAU;
        let radius = WAVE_SPAWN_RADIUS + rng.gen_range(-3.0..3.0);
        let position = Vec3::new(angle.cos() * radius, 0.0, angle.sin() * radius);

        let mut health = Health::new(1.0);
        let mut stats = EnemyStats::default();
        let mut motor = NavMotor::default();
        let mut configured = false;
        apply_setup(&setup, &mut configured, &mut health, &mut stats, &mut motor);

        let id = state.next_enemy_id;
        state.next_enemy_id += 1;

        commands.spawn((
            Enemy { id },
            EnemyPosition(position),
            EnemyRotation(0.0),
            health,
            stats,
            motor,
            EnemyTarget(None),
            HasTarget(false),
            AttackCooldown::default(),
            PursuitTimer::default(),
            BodyColliders::default(),
            Replicate::new(ReplicationMode::SingleServer(NetworkTarget::All)),
        ));
    }
}

// =============================================================================
// SPATIAL INDEX
// =============================================================================

/// Rebuild the body index from live positions. Runs every tick before
/// pursuit and contact checks.
pub fn rebuild_body_index(
    mut index: ResMut<SpatialBodyIndex>,
    players: Query<(Entity, &PlayerPosition, &Health), (With<Player>, Without<Enemy>)>,
    enemies: Query<(Entity, &EnemyPosition, &Health, &BodyColliders), (With<Enemy>, Without<Player>)>,
) {
    index.clear();

    for (entity, position, health) in players.iter() {
        if health.is_dead() {
            continue;
        }
        index.insert(BodyEntry {
            entity,
            center: position.0,
            radius: PLAYER_RADIUS,
            tag: BodyTag::Player,
        });
    }

    for (entity, position, health, colliders) in enemies.iter() {
        if health.is_dead() || !colliders.enabled {
            continue;
        }
        index.insert(BodyEntry {
            entity,
            center: position.0,
            radius: ENEMY_RADIUS,
            tag: BodyTag::Enemy,
        });
    }
}

// =============================================================================
// PURSUIT
// =============================================================================

/// Run the pursuit cycle for every living enemy whose timer elapsed.
pub fn tick_pursuit(
    index: Res<SpatialBodyIndex>,
    mut enemies: Query<
        (
            &EnemyPosition,
            &Health,
            &mut EnemyTarget,
            &mut PursuitTimer,
            &mut NavMotor,
        ),
        (With<Enemy>, Without<Player>),
    >,
    players: Query<(&PlayerPosition, &Health), (With<Player>, Without<Enemy>)>,
    time: Res<Time>,
) {
    for (position, health, mut target, mut timer, mut motor) in enemies.iter_mut() {
        // The loop self-terminates on death.
        if health.is_dead() {
            continue;
        }
        timer.0.tick(time.delta());
        if !timer.0.just_finished() {
            continue;
        }

        pursuit_cycle(
            &mut target,
            position.0,
            &index,
            BodyTag::Player,
            &mut *motor,
            |entity| players.get(entity).is_ok_and(|(_, h)| !h.is_dead()),
            |entity| players.get(entity).ok().map(|(p, _)| p.0),
        );
    }
}

/// Integrate the navigation motors: walk toward the destination and
/// turn to face the direction of travel.
pub fn step_navigation(
    mut enemies: Query<(&mut EnemyPosition, &mut EnemyRotation, &NavMotor), With<Enemy>>,
) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;

    for (mut position, mut rotation, motor) in enemies.iter_mut() {
        if !motor.enabled || motor.stopped {
            continue;
        }
        let Some(destination) = motor.destination else {
            continue;
        };

        let mut delta = destination - position.0;
        delta.y = 0.0;
        let distance = delta.length();

        // Stop short of the target body instead of standing inside it.
        let stop_distance = ENEMY_RADIUS + PLAYER_RADIUS;
        if distance <= stop_distance {
            let target_yaw = delta.x.atan2(delta.z);
            rotation.0 = smooth_rotate_toward(rotation.0, target_yaw, ENEMY_TURN_SPEED, dt);
            continue;
        }

        let step = (motor.speed * dt).min(distance - stop_distance);
        let direction = delta / distance;
        position.0 += direction * step;

        let target_yaw = direction.x.atan2(direction.z);
        rotation.0 = smooth_rotate_toward(rotation.0, target_yaw, ENEMY_TURN_SPEED, dt);
    }
}

/// Smoothly rotate current angle toward target angle at a given speed.
/// Returns the new angle after rotation.
fn smooth_rotate_toward(current: f32, target: f32, turn_speed: f32, dt: f32) -> f32 {
    use std::f32::consts::PI;

    // Normalize angle difference to [-PI, PI]
    let mut diff = target - current;
    while diff > PI {
        diff -= 2.0 * PI;
    }
    while diff < -PI {
        diff += 2.0 * PI;
    }

    let max_turn = turn_speed * dt;
    if diff.abs() <= max_turn {
        target
    } else {
        current + diff.signum() * max_turn
    }
}

// =============================================================================
// CONTACT ATTACKS
// =============================================================================

/// Check every living enemy for a contact attack against its current
/// target and apply the damage server-side.
pub fn tick_contact_attacks(
    mut commands: Commands,
    index: Res<SpatialBodyIndex>,
    mut enemies: Query<
        (
            &EnemyPosition,
            &Health,
            &EnemyStats,
            &EnemyTarget,
            &mut AttackCooldown,
        ),
        (With<Enemy>, Without<Player>),
    >,
    mut players: Query<
        (Entity, &Player, &PlayerPosition, &mut Health),
        (With<Player>, Without<Enemy>),
    >,
    mut links: Query<(&RemoteId, &mut MessageSender<DamageReceived>), With<ClientOf>>,
    time: Res<Time>,
) {
    let now = time.elapsed_secs();

    for (position, health, stats, target, mut cooldown) in enemies.iter_mut() {
        let overlapping =
            index.query_overlap(position.0, ENEMY_RADIUS + CONTACT_SLACK, BodyTag::Player);

        let Some(hit) = check_contact_attack(
            health.is_dead(),
            &mut cooldown,
            stats,
            target,
            position.0,
            now,
            overlapping,
        ) else {
            continue;
        };

        let Ok((player_entity, player, player_pos, mut player_health)) =
            players.get_mut(hit.target)
        else {
            continue;
        };

        let killed = player_health.take_damage(hit.damage);
        // Attack direction from the victim's point of view.
        let direction = (position.0 - player_pos.0).normalize_or_zero();

        crate::systems::send_damage_received(
            &mut links,
            player.client_id,
            DamageReceived {
                direction,
                damage: hit.damage,
                health_remaining: player_health.current,
            },
        );

        if killed {
            info!("Player {:?} was killed by an enemy", player.client_id);
            commands.entity(player_entity).insert(RespawnTimer {
                time_remaining: shared::PLAYER_RESPAWN_TIME,
            });
        }
    }
}

// =============================================================================
// FEEDBACK DELIVERY
// =============================================================================

/// Translate buffered feedback calls into network messages, preserving
/// order. Collider toggles stay server-side.
pub fn deliver_feedback(
    enemy_id: u64,
    enemy_position: Vec3,
    feedback: FeedbackBuffer,
    colliders: &mut BodyColliders,
    senders: &mut Query<
        (&mut MessageSender<EnemyHit>, &mut MessageSender<EnemyKilled>),
        (With<ClientOf>, With<Connected>),
    >,
) {
    // A hit broadcast combines the effect point with the health shown on
    // the bar at that moment.
    let mut pending_hit: Option<(Vec3, Vec3)> = None;

    for event in feedback.events {
        match event {
            FeedbackEvent::HitEffect { point, normal } => {
                pending_hit = Some((point, normal));
            }
            FeedbackEvent::HealthBar { current, max } => {
                if let Some((point, normal)) = pending_hit.take() {
                    for (mut hit_sender, _) in senders.iter_mut() {
                        hit_sender.send::<ReliableChannel>(EnemyHit {
                            enemy_id,
                            hit_point: point,
                            hit_normal: normal,
                            health_shown: current,
                            health_max: max,
                        });
                    }
                }
            }
            FeedbackEvent::DeathAnimation => {
                for (_, mut killed_sender) in senders.iter_mut() {
                    killed_sender.send::<ReliableChannel>(EnemyKilled {
                        enemy_id,
                        position: enemy_position,
                    });
                }
            }
            FeedbackEvent::CollidersEnabled(enabled) => {
                colliders.enabled = enabled;
            }
            // Sounds and bar visibility are driven client-side off the
            // hit/killed messages.
            FeedbackEvent::HideHealthBar
            | FeedbackEvent::HitSound
            | FeedbackEvent::DeathSound => {}
        }
    }
}

/// Mirror the private target handle into the replicated flag.
/// Recomputed every tick: dead enemies and stale handles read false.
pub fn publish_has_target(
    mut enemies: Query<(&EnemyTarget, &Health, &mut HasTarget), (With<Enemy>, Without<Player>)>,
    players: Query<&Health, (With<Player>, Without<Enemy>)>,
) {
    for (target, health, mut has_target) in enemies.iter_mut() {
        let engaged = !health.is_dead()
            && shared::has_valid_target(target, |entity| {
                players.get(entity).is_ok_and(|h| !h.is_dead())
            });
        if has_target.0 != engaged {
            has_target.0 = engaged;
        }
    }
}

// =============================================================================
// CORPSE CLEANUP
// =============================================================================

/// Give fresh corpses a despawn timer, tick it down, and remove enemies
/// that have been dead long enough.
pub fn tick_dead_enemy_despawns(
    mut commands: Commands,
    newly_dead: Query<
        (Entity, &Health),
        (With<Enemy>, Without<DeadEnemyDespawnTimer>),
    >,
    mut corpses: Query<(Entity, &Enemy, &mut DeadEnemyDespawnTimer)>,
) {
    let dt = 1.0 / FIXED_TIMESTEP_HZ as f32;

    for (entity, health) in newly_dead.iter() {
        if health.is_dead() {
            commands
                .entity(entity)
                .insert(DeadEnemyDespawnTimer(DEAD_ENEMY_DESPAWN_TIME));
        }
    }

    for (entity, enemy, mut timer) in corpses.iter_mut() {
        timer.0 -= dt;
        if timer.0 <= 0.0 {
            trace!("Despawning dead enemy {}", enemy.id);
            commands.entity(entity).despawn();
        }
    }
}
