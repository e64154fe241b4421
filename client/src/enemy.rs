//! Enemy visuals: meshes, health bars, target glow, and death fall.

use bevy::prelude::*;
use lightyear::prelude::*;
use shared::{
    Enemy, EnemyKilled, EnemyPosition, EnemyRotation, EnemyStats, HasTarget, Health,
    ENEMY_HEIGHT, ENEMY_RADIUS,
};

/// Height of the health bar above the enemy's feet.
const HEALTH_BAR_HEIGHT: f32 = ENEMY_HEIGHT + 0.4;
const HEALTH_BAR_WIDTH: f32 = 0.9;
/// How long the corpse takes to topple over.
const DEATH_FALL_DURATION: f32 = 0.8;

/// Shared enemy visual assets (skin materials are per-enemy).
#[derive(Resource)]
pub struct EnemyAssets {
    pub body_mesh: Handle<Mesh>,
    pub bar_mesh: Handle<Mesh>,
    pub bar_back_material: Handle<StandardMaterial>,
}

/// Direct handles to an enemy's visual parts, cached at spawn so the
/// message handlers don't walk hierarchies.
#[derive(Component)]
pub struct EnemyVisual {
    pub model: Entity,
    pub bar_root: Entity,
    pub bar_fill: Entity,
    pub skin_material: Handle<StandardMaterial>,
}

#[derive(Component)]
pub struct EnemyModel;

/// Billboard root holding the bar quads.
#[derive(Component)]
pub struct HealthBarRoot;

#[derive(Component)]
pub struct HealthBarFill;

/// Drives the topple animation after an `EnemyKilled` message.
#[derive(Component)]
pub struct DeathFall {
    pub elapsed: f32,
}

pub fn setup_enemy_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let body_mesh = meshes.add(Capsule3d::new(ENEMY_RADIUS, ENEMY_HEIGHT - ENEMY_RADIUS * 2.0));
    let bar_mesh = meshes.add(Rectangle::new(HEALTH_BAR_WIDTH, 0.12));
    let bar_back_material = materials.add(StandardMaterial {
        base_color: Color::srgba(0.1, 0.1, 0.1, 0.8),
        alpha_mode: AlphaMode::Blend,
        unlit: true,
        ..default()
    });

    commands.insert_resource(EnemyAssets {
        body_mesh,
        bar_mesh,
        bar_back_material,
    });
}

/// Build visuals for newly replicated enemies.
pub fn handle_enemy_spawned(
    mut commands: Commands,
    assets: Option<Res<EnemyAssets>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    new_enemies: Query<(Entity, &Enemy, &EnemyPosition, &EnemyStats), Added<Enemy>>,
) {
    let Some(assets) = assets else {
        return;
    };

    for (entity, enemy, position, stats) in new_enemies.iter() {
        info!("Enemy {} spawned", enemy.id);

        let [r, g, b] = stats.skin_color;
        let skin_material = materials.add(StandardMaterial {
            base_color: Color::srgb(r, g, b),
            perceptual_roughness: 0.8,
            ..default()
        });
        let fill_material = materials.add(StandardMaterial {
            base_color: Color::srgb(0.85, 0.15, 0.15),
            unlit: true,
            ..default()
        });

        commands.entity(entity).insert((
            Transform::from_translation(position.0),
            GlobalTransform::from_translation(position.0),
            Visibility::Inherited,
            InheritedVisibility::default(),
        ));

        let model = commands
            .spawn((
                EnemyModel,
                Mesh3d(assets.body_mesh.clone()),
                MeshMaterial3d(skin_material.clone()),
                Transform::from_xyz(0.0, ENEMY_HEIGHT * 0.5, 0.0),
                GlobalTransform::default(),
                Visibility::Inherited,
                InheritedVisibility::default(),
            ))
            .id();

        // Billboard health bar: background + fill, fill slightly in front.
        let mut bar_fill = Entity::PLACEHOLDER;
        let bar_root = commands
            .spawn((
                HealthBarRoot,
                Transform::from_xyz(0.0, HEALTH_BAR_HEIGHT, 0.0),
                GlobalTransform::default(),
                Visibility::Inherited,
                InheritedVisibility::default(),
            ))
            .with_children(|parent| {
                parent.spawn((
                    Mesh3d(assets.bar_mesh.clone()),
                    MeshMaterial3d(assets.bar_back_material.clone()),
                    Transform::default(),
                ));
                bar_fill = parent
                    .spawn((
                        HealthBarFill,
                        Mesh3d(assets.bar_mesh.clone()),
                        MeshMaterial3d(fill_material),
                        Transform::from_xyz(0.0, 0.0, 0.01),
                    ))
                    .id();
            })
            .id();

        commands.entity(entity).add_child(model);
        commands.entity(entity).add_child(bar_root);
        commands.entity(entity).insert(EnemyVisual {
            model,
            bar_root,
            bar_fill,
            skin_material,
        });
    }
}

/// Sync replicated enemy positions into render transforms.
pub fn sync_enemy_transforms(
    mut enemies: Query<(&EnemyPosition, &EnemyRotation, &mut Transform), With<Enemy>>,
    time: Res<Time>,
) {
    let rate: f32 = 20.0;
    let t = 1.0_f32 - (-rate * time.delta_secs()).exp();

    for (position, rotation, mut transform) in enemies.iter_mut() {
        transform.translation = transform.translation.lerp(position.0, t);
        transform.rotation = transform
            .rotation
            .slerp(Quat::from_rotation_y(rotation.0), t);
    }
}

/// Set a bar fill to the given health fraction, left-anchored.
pub fn set_bar_fill(transform: &mut Transform, fraction: f32) {
    let fraction = fraction.clamp(0.0, 1.0);
    transform.scale.x = fraction;
    transform.translation.x = -(1.0 - fraction) * HEALTH_BAR_WIDTH * 0.5;
}

/// Follow the replicated health component. Runs on change only, so a
/// hit broadcast can briefly show the displayed value instead.
pub fn update_health_bar_fill(
    enemies: Query<(&EnemyVisual, &Health), (With<Enemy>, Changed<Health>)>,
    mut bar_fills: Query<&mut Transform, With<HealthBarFill>>,
) {
    for (visual, health) in enemies.iter() {
        if let Ok(mut fill_transform) = bar_fills.get_mut(visual.bar_fill) {
            set_bar_fill(&mut fill_transform, health.percentage());
        }
    }
}

/// Turn the bar quads toward the camera, countering the parent's yaw.
pub fn billboard_health_bars(
    mut bar_roots: Query<
        (&mut Transform, &GlobalTransform),
        (With<HealthBarRoot>, Without<Camera3d>),
    >,
    cameras: Query<&GlobalTransform, With<Camera3d>>,
) {
    let Some(camera_pos) = cameras.iter().next().map(|t| t.translation()) else {
        return;
    };

    for (mut root_transform, root_global) in bar_roots.iter_mut() {
        let mut to_camera = camera_pos - root_global.translation();
        to_camera.y = 0.0;
        if to_camera == Vec3::ZERO {
            continue;
        }
        let world_yaw = to_camera.x.atan2(to_camera.z);
        let parent_yaw = root_global
            .to_scale_rotation_translation()
            .1
            .to_euler(EulerRot::YXZ)
            .0;
        let local_yaw = root_transform.rotation.to_euler(EulerRot::YXZ).0;
        root_transform.rotation = Quat::from_rotation_y(world_yaw - (parent_yaw - local_yaw));
    }
}

/// Brighten enemies that are actively hunting someone.
pub fn update_target_glow(
    enemies: Query<(&EnemyVisual, &HasTarget, &Health), (With<Enemy>, Changed<HasTarget>)>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    for (visual, has_target, health) in enemies.iter() {
        if health.is_dead() {
            continue;
        }
        if let Some(material) = materials.get_mut(&visual.skin_material) {
            material.emissive = if has_target.0 {
                LinearRgba::new(0.4, 0.05, 0.05, 1.0)
            } else {
                LinearRgba::BLACK
            };
        }
    }
}

/// Handle enemy death broadcasts: start the topple animation, hide the
/// health bar, and play the death sound at the corpse.
pub fn handle_enemy_killed(
    mut commands: Commands,
    mut receivers: Query<&mut MessageReceiver<EnemyKilled>, With<crate::GameClient>>,
    enemies: Query<(Entity, &Enemy, &EnemyVisual)>,
    mut bar_visibility: Query<&mut Visibility, With<HealthBarRoot>>,
    audio: Option<Res<crate::audio::GameAudio>>,
) {
    for mut receiver in receivers.iter_mut() {
        for killed in receiver.receive() {
            info!("Enemy {} was killed", killed.enemy_id);

            let Some((entity, _, visual)) =
                enemies.iter().find(|(_, e, _)| e.id == killed.enemy_id)
            else {
                continue;
            };

            commands.entity(entity).insert(DeathFall { elapsed: 0.0 });
            if let Ok(mut visibility) = bar_visibility.get_mut(visual.bar_root) {
                *visibility = Visibility::Hidden;
            }

            if let Some(audio) = &audio {
                commands.spawn((
                    AudioPlayer::new(audio.enemy_death.clone()),
                    PlaybackSettings::DESPAWN.with_spatial(true),
                    Transform::from_translation(killed.position),
                ));
            }
        }
    }
}

/// Topple dead enemies over and leave them on the ground.
pub fn update_death_fall(
    mut fallen: Query<(&EnemyVisual, &mut DeathFall)>,
    mut models: Query<&mut Transform, With<EnemyModel>>,
    time: Res<Time>,
) {
    for (visual, mut fall) in fallen.iter_mut() {
        if fall.elapsed >= DEATH_FALL_DURATION {
            continue;
        }
        fall.elapsed += time.delta_secs();
        let t = (fall.elapsed / DEATH_FALL_DURATION).clamp(0.0, 1.0);
        // Ease out so the fall decelerates into the ground.
        let eased = 1.0 - (1.0 - t) * (1.0 - t);

        if let Ok(mut transform) = models.get_mut(visual.model) {
            transform.rotation = Quat::from_rotation_x(-std::f32::consts::FRAC_PI_2 * eased);
            transform.translation.y =
                ENEMY_HEIGHT * 0.5 + (ENEMY_RADIUS - ENEMY_HEIGHT * 0.5) * eased;
        }
    }
}
