//! Arena scene setup
//!
//! Camera, lighting, and the static arena geometry. Everything here is
//! purely visual; the server only knows positions.

use bevy::audio::SpatialListener;
use bevy::prelude::*;
use shared::ARENA_HALF_EXTENT;

/// One-time scene setup.
pub fn setup_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    commands.insert_resource(ClearColor(Color::srgb(0.05, 0.05, 0.08)));

    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(0.0, 1.6, 0.0),
        // Ears follow the camera.
        SpatialListener::new(0.3),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_rotation(Quat::from_euler(EulerRot::XYZ, -0.9, 0.4, 0.0)),
    ));

    commands.insert_resource(AmbientLight {
        color: Color::srgb(0.6, 0.6, 0.8),
        brightness: 120.0,
        ..default()
    });

    // Arena floor
    let floor_size = ARENA_HALF_EXTENT * 2.0;
    commands.spawn((
        Mesh3d(meshes.add(Plane3d::default().mesh().size(floor_size, floor_size))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.25, 0.25, 0.28),
            perceptual_roughness: 0.95,
            ..default()
        })),
        Transform::from_xyz(0.0, 0.0, 0.0),
    ));

    // Low boundary walls marking the playable area
    let wall_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.15, 0.15, 0.2),
        ..default()
    });
    let wall_mesh = meshes.add(Cuboid::new(floor_size, 2.0, 0.5));

    for (offset, angle) in [
        (Vec3::new(0.0, 1.0, -ARENA_HALF_EXTENT), 0.0),
        (Vec3::new(0.0, 1.0, ARENA_HALF_EXTENT), 0.0),
        (Vec3::new(-ARENA_HALF_EXTENT, 1.0, 0.0), std::f32::consts::FRAC_PI_2),
        (Vec3::new(ARENA_HALF_EXTENT, 1.0, 0.0), std::f32::consts::FRAC_PI_2),
    ] {
        commands.spawn((
            Mesh3d(wall_mesh.clone()),
            MeshMaterial3d(wall_material.clone()),
            Transform::from_translation(offset).with_rotation(Quat::from_rotation_y(angle)),
        ));
    }
}
