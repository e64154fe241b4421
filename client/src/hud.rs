//! HUD: crosshair, local health bar, and damage feedback.

use bevy::audio::Volume;
use bevy::prelude::*;
use lightyear::prelude::*;
use shared::{DamageReceived, Health, LocalPlayer, PLAYER_MAX_HEALTH};

/// Marker component for the crosshair UI
#[derive(Component)]
pub struct Crosshair;

/// Marker for the local health bar fill node
#[derive(Component)]
pub struct HealthBarUi;

/// Full-screen red overlay shown briefly when we take damage
#[derive(Component)]
pub struct DamageFlash {
    pub intensity: f32,
}

/// Spawn the HUD
pub fn spawn_hud(mut commands: Commands) {
    // Crosshair: centered dot
    commands
        .spawn((
            Crosshair,
            Node {
                width: Val::Percent(100.0),
                height: Val::Percent(100.0),
                position_type: PositionType::Absolute,
                justify_content: JustifyContent::Center,
                align_items: AlignItems::Center,
                ..default()
            },
            Pickable::IGNORE,
        ))
        .with_children(|parent| {
            parent.spawn((
                Node {
                    width: Val::Px(4.0),
                    height: Val::Px(4.0),
                    ..default()
                },
                BackgroundColor(Color::srgba(1.0, 1.0, 1.0, 0.85)),
                BorderRadius::all(Val::Px(2.0)),
            ));
        });

    // Health bar, bottom left
    commands
        .spawn((
            Node {
                width: Val::Px(240.0),
                height: Val::Px(18.0),
                position_type: PositionType::Absolute,
                left: Val::Px(24.0),
                bottom: Val::Px(24.0),
                ..default()
            },
            BackgroundColor(Color::srgba(0.0, 0.0, 0.0, 0.6)),
            Pickable::IGNORE,
        ))
        .with_children(|parent| {
            parent.spawn((
                HealthBarUi,
                Node {
                    width: Val::Percent(100.0),
                    height: Val::Percent(100.0),
                    ..default()
                },
                BackgroundColor(Color::srgb(0.75, 0.15, 0.15)),
            ));
        });

    // Damage flash overlay (starts invisible)
    commands.spawn((
        DamageFlash { intensity: 0.0 },
        Node {
            width: Val::Percent(100.0),
            height: Val::Percent(100.0),
            position_type: PositionType::Absolute,
            ..default()
        },
        BackgroundColor(Color::srgba(0.8, 0.0, 0.0, 0.0)),
        Pickable::IGNORE,
    ));
}

/// Keep the local health bar in sync with replicated health.
pub fn update_health_display(
    local_player: Query<&Health, With<LocalPlayer>>,
    mut bar: Query<&mut Node, With<HealthBarUi>>,
) {
    let Some(health) = local_player.iter().next() else {
        return;
    };
    let Ok(mut node) = bar.single_mut() else {
        return;
    };

    let fraction = (health.current / PLAYER_MAX_HEALTH).clamp(0.0, 1.0);
    node.width = Val::Percent(fraction * 100.0);
}

/// Handle incoming damage messages: flash the screen red and play the
/// hurt sound.
pub fn handle_damage_received(
    mut commands: Commands,
    mut receivers: Query<&mut MessageReceiver<DamageReceived>, With<crate::GameClient>>,
    mut flash: Query<&mut DamageFlash>,
    audio: Option<Res<crate::audio::GameAudio>>,
) {
    for mut receiver in receivers.iter_mut() {
        for damage in receiver.receive() {
            info!(
                "Took {:.0} damage, {:.0} health remaining",
                damage.damage, damage.health_remaining
            );

            for mut f in flash.iter_mut() {
                f.intensity = (f.intensity + 0.45).min(0.8);
            }

            if let Some(audio) = &audio {
                commands.spawn((
                    AudioPlayer::new(audio.player_hurt.clone()),
                    PlaybackSettings::DESPAWN.with_volume(Volume::Linear(0.9)),
                ));
            }
        }
    }
}

/// Fade the damage flash back out.
pub fn update_damage_flash(
    mut flash: Query<(&mut DamageFlash, &mut BackgroundColor)>,
    time: Res<Time>,
) {
    for (mut f, mut color) in flash.iter_mut() {
        f.intensity = (f.intensity - time.delta_secs() * 1.5).max(0.0);
        color.0 = Color::srgba(0.8, 0.0, 0.0, f.intensity);
    }
}
