//! Player visuals and transform sync

use bevy::prelude::*;
use lightyear::prelude::client::Connected;
use lightyear::prelude::*;
use shared::{Health, LocalPlayer, Player, PlayerPosition, PlayerRotation, PLAYER_HEIGHT, PLAYER_RADIUS};

/// The mesh child attached to a replicated player entity.
#[derive(Component)]
pub struct PlayerModel;

/// Marker for the local player's model (hidden in first person)
#[derive(Component)]
pub struct LocalPlayerModel;

/// Pre-made player visual assets
#[derive(Resource)]
pub struct PlayerAssets {
    pub body_mesh: Handle<Mesh>,
    pub body_material: Handle<StandardMaterial>,
}

pub fn setup_player_assets(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let body_mesh = meshes.add(Capsule3d::new(PLAYER_RADIUS, PLAYER_HEIGHT - PLAYER_RADIUS * 2.0));
    let body_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.3, 0.5, 0.8),
        ..default()
    });

    commands.insert_resource(PlayerAssets {
        body_mesh,
        body_material,
    });
}

/// Handle player spawn visuals
///
/// The replicated entity is server-authoritative; we only add a
/// transform and a mesh child here.
pub fn handle_player_spawned(
    mut commands: Commands,
    assets: Option<Res<PlayerAssets>>,
    client_query: Query<&LocalId, (With<crate::GameClient>, With<Connected>)>,
    new_players: Query<(Entity, &Player, &PlayerPosition), Added<Player>>,
) {
    let Some(assets) = assets else {
        return;
    };

    let our_peer_id = client_query.iter().next().map(|r| r.0);

    for (entity, player, position) in new_players.iter() {
        info!("Player spawned: {:?}", player.client_id);

        let is_local = our_peer_id.map(|id| player.client_id == id).unwrap_or(false);

        commands.entity(entity).insert((
            Transform::from_translation(position.0),
            GlobalTransform::from_translation(position.0),
            Visibility::Inherited,
            InheritedVisibility::default(),
        ));

        let model_entity = commands
            .spawn((
                PlayerModel,
                Mesh3d(assets.body_mesh.clone()),
                MeshMaterial3d(assets.body_material.clone()),
                Transform::default(),
                GlobalTransform::default(),
                Visibility::Inherited,
                InheritedVisibility::default(),
            ))
            .id();

        commands.entity(entity).add_child(model_entity);

        if is_local {
            commands.entity(entity).insert(LocalPlayer);
            commands.entity(model_entity).insert(LocalPlayerModel);
            info!("Local player spawned!");
        }
    }
}

/// Ensure exactly one `Player` entity is tagged as `LocalPlayer`.
///
/// The first replicated `Player` can arrive while we are still in
/// `Connecting`, so `Added<Player>` handlers gated to `Playing` would
/// miss it. This converges on the correct local entity regardless of
/// timing.
pub fn ensure_local_player_tag(
    mut commands: Commands,
    client_query: Query<&LocalId, (With<crate::GameClient>, With<Connected>)>,
    players: Query<(Entity, &Player)>,
    existing_local: Query<Entity, With<LocalPlayer>>,
) {
    let Some(our_peer_id) = client_query.iter().next().map(|r| r.0) else {
        return;
    };

    let Some(local_entity) = players
        .iter()
        .find(|(_, p)| p.client_id == our_peer_id)
        .map(|(e, _)| e)
    else {
        return;
    };

    for e in existing_local.iter() {
        if e != local_entity {
            commands.entity(e).remove::<LocalPlayer>();
        }
    }
    commands.entity(local_entity).insert(LocalPlayer);
}

/// Sync replicated player positions into render transforms.
pub fn sync_player_transforms(
    mut players: Query<(&PlayerPosition, &PlayerRotation, &mut Transform), With<Player>>,
    time: Res<Time>,
) {
    // Snappy interpolation toward the authoritative pose.
    let rate: f32 = 20.0;
    let t = 1.0_f32 - (-rate * time.delta_secs()).exp();

    for (position, rotation, mut transform) in players.iter_mut() {
        transform.translation = transform.translation.lerp(position.0, t);
        transform.rotation = transform
            .rotation
            .slerp(Quat::from_rotation_y(rotation.0), t);
    }
}

/// Hide the local player's own mesh (first-person view), show dead
/// remote players lying down.
pub fn update_player_visibility(
    mut local_models: Query<&mut Visibility, With<LocalPlayerModel>>,
    mut remote_players: Query<(&Health, &Children), (With<Player>, Without<LocalPlayer>)>,
    mut models: Query<&mut Transform, (With<PlayerModel>, Without<Player>)>,
) {
    for mut visibility in local_models.iter_mut() {
        *visibility = Visibility::Hidden;
    }

    for (health, children) in remote_players.iter_mut() {
        for child in children.iter() {
            if let Ok(mut transform) = models.get_mut(child) {
                transform.rotation = if health.is_dead() {
                    Quat::from_rotation_x(std::f32::consts::FRAC_PI_2)
                } else {
                    Quat::IDENTITY
                };
            }
        }
    }
}
