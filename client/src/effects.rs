//! Hit effects
//!
//! Particle bursts, hit sounds, and the immediate health-bar refresh
//! driven by `EnemyHit` broadcasts.

use bevy::audio::Volume;
use bevy::prelude::*;
use lightyear::prelude::*;
use shared::EnemyHit;

use crate::enemy::{set_bar_fill, EnemyVisual, HealthBarFill};

const BURST_PARTICLES: usize = 10;

/// A single blood/impact particle
#[derive(Component)]
pub struct HitParticle {
    pub lifetime: f32,
    pub max_lifetime: f32,
    pub velocity: Vec3,
    pub initial_scale: f32,
}

/// Pre-made assets for hit particles (avoid recreating each burst)
#[derive(Resource)]
pub struct HitEffectAssets {
    pub mesh: Handle<Mesh>,
    pub materials: Vec<Handle<StandardMaterial>>,
}

/// Build particle assets on startup
pub fn setup_hit_effect_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let mesh = meshes.add(Sphere::new(1.0).mesh().ico(1).unwrap());

    let colors = [
        Color::srgba(0.6, 0.08, 0.08, 0.9),
        Color::srgba(0.45, 0.05, 0.05, 0.85),
        Color::srgba(0.7, 0.12, 0.1, 0.8),
    ];

    let materials: Vec<_> = colors
        .iter()
        .map(|&color| {
            materials.add(StandardMaterial {
                base_color: color,
                alpha_mode: AlphaMode::Blend,
                unlit: true,
                ..default()
            })
        })
        .collect();

    commands.insert_resource(HitEffectAssets { mesh, materials });
}

/// Handle `EnemyHit` broadcasts: particle burst at the impact point, a
/// spatial hit sound, and the health bar snapped to the value the
/// server displayed at feedback time.
pub fn handle_enemy_hits(
    mut commands: Commands,
    assets: Option<Res<HitEffectAssets>>,
    audio: Option<Res<crate::audio::GameAudio>>,
    mut receivers: Query<&mut MessageReceiver<EnemyHit>, With<crate::GameClient>>,
    enemies: Query<(&shared::Enemy, &EnemyVisual)>,
    mut bar_fills: Query<&mut Transform, With<HealthBarFill>>,
    time: Res<Time>,
) {
    let Some(assets) = assets else {
        return;
    };

    for mut receiver in receivers.iter_mut() {
        for hit in receiver.receive() {
            spawn_hit_burst(&mut commands, &assets, &time, hit.hit_point, hit.hit_normal);

            if let Some(audio) = &audio {
                commands.spawn((
                    AudioPlayer::new(audio.hit_impact.clone()),
                    PlaybackSettings::DESPAWN
                        .with_spatial(true)
                        .with_volume(Volume::Linear(0.8)),
                    Transform::from_translation(hit.hit_point),
                ));
            }

            // Immediate refresh with the displayed value; the replicated
            // health component overwrites it when the snapshot lands.
            if let Some((_, visual)) = enemies.iter().find(|(e, _)| e.id == hit.enemy_id) {
                if let Ok(mut fill_transform) = bar_fills.get_mut(visual.bar_fill) {
                    set_bar_fill(&mut fill_transform, hit.health_shown / hit.health_max.max(1.0));
                }
            }
        }
    }
}

fn spawn_hit_burst(
    commands: &mut Commands,
    assets: &HitEffectAssets,
    time: &Time,
    point: Vec3,
    normal: Vec3,
) {
    for i in 0..BURST_PARTICLES {
        // Cheap pseudo-random spread seeded off time and index.
        let seed = time.elapsed_secs() * 1000.0 + i as f32 * 17.3;
        let rx = (seed * 12.9898).sin().fract() - 0.5;
        let ry = (seed * 78.233).sin().fract() * 0.5;
        let rz = (seed * 37.719).sin().fract() - 0.5;

        let velocity = normal * 2.5 + Vec3::new(rx * 3.0, 1.5 + ry * 2.0, rz * 3.0);
        let lifetime = 0.4 + (seed * 3.7).sin().fract().abs() * 0.3;
        let initial_scale = 0.04 + (seed * 5.1).sin().fract().abs() * 0.04;

        let mat_idx = i % assets.materials.len();

        commands.spawn((
            HitParticle {
                lifetime,
                max_lifetime: lifetime,
                velocity,
                initial_scale,
            },
            Mesh3d(assets.mesh.clone()),
            MeshMaterial3d(assets.materials[mat_idx].clone()),
            Transform::from_translation(point).with_scale(Vec3::splat(initial_scale)),
        ));
    }
}

/// Update hit particles: move, fall, shrink, despawn.
pub fn update_hit_particles(
    mut commands: Commands,
    time: Res<Time>,
    mut particles: Query<(Entity, &mut HitParticle, &mut Transform)>,
) {
    let dt = time.delta_secs();
    let gravity = Vec3::new(0.0, -9.0, 0.0);

    for (entity, mut particle, mut transform) in particles.iter_mut() {
        particle.lifetime -= dt;

        if particle.lifetime <= 0.0 {
            commands.entity(entity).despawn();
            continue;
        }

        particle.velocity += gravity * dt;
        particle.velocity *= 0.96_f32.powf(dt * 60.0);
        transform.translation += particle.velocity * dt;

        let fade = (particle.lifetime / particle.max_lifetime).powf(0.5);
        transform.scale = Vec3::splat(particle.initial_scale * fade.max(0.1));
    }
}
