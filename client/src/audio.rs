//! Audio system for game sounds

use bevy::audio::Volume;
use bevy::prelude::*;

/// Resource holding all loaded audio assets
#[derive(Resource)]
pub struct GameAudio {
    pub hit_impact: Handle<AudioSource>,
    pub enemy_death: Handle<AudioSource>,
    pub player_hurt: Handle<AudioSource>,
    pub arena_ambient: Handle<AudioSource>,
}

/// Marker for ambient sound entities
#[derive(Component)]
pub struct AmbientSound;

/// Load all audio assets on startup
pub fn setup_audio(mut commands: Commands, asset_server: Res<AssetServer>) {
    let hit_impact = asset_server.load("audio/sfx/hit_impact.ogg");
    let enemy_death = asset_server.load("audio/sfx/enemy_death.ogg");
    let player_hurt = asset_server.load("audio/sfx/player_hurt.ogg");
    let arena_ambient = asset_server.load("audio/ambient/arena_hum.ogg");

    commands.insert_resource(GameAudio {
        hit_impact,
        enemy_death,
        player_hurt,
        arena_ambient,
    });
}

/// Start the looping ambient track when gameplay begins.
pub fn start_ambient(
    mut commands: Commands,
    audio: Option<Res<GameAudio>>,
    existing: Query<(), With<AmbientSound>>,
) {
    let Some(audio) = audio else { return };
    if !existing.is_empty() {
        return;
    }

    commands.spawn((
        AmbientSound,
        AudioPlayer::new(audio.arena_ambient.clone()),
        PlaybackSettings::LOOP.with_volume(Volume::Linear(0.35)),
    ));
}
