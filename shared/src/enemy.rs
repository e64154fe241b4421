//! Enemy behavior core: target acquisition, pursuit, combat state machine.
//!
//! Everything here is authority-side logic, written as plain functions
//! over injected collaborators (navigation agent, spatial body index,
//! presentation feedback sink) so the whole state machine runs headless
//! under test. The server's fixed-tick systems supply the real
//! collaborators; clients never call into this module.

use bevy::prelude::*;

use crate::{
    AttackCooldown, EnemyStats, EnemyTarget, Health, SpatialBodyIndex,
    spatial::BodyTag,
};

// =============================================================================
// TUNING CONSTANTS
// =============================================================================

/// Period of the pursuit re-evaluation cycle in simulated seconds.
pub const PURSUIT_PERIOD: f32 = 0.25;

/// Radius of the target acquisition scan.
pub const TARGET_SCAN_RADIUS: f32 = 20.0;

/// Enemy capsule height (shared humanoid rig).
pub const ENEMY_HEIGHT: f32 = 1.8;

/// Enemy capsule radius.
pub const ENEMY_RADIUS: f32 = 0.4;

/// Extra reach beyond touching radii that still counts as sustained
/// contact for the attack trigger.
pub const CONTACT_SLACK: f32 = 0.2;

/// Enemy rotation speed in radians per second for smooth turning.
pub const ENEMY_TURN_SPEED: f32 = 8.0;

/// Time in seconds before a dead enemy despawns.
pub const DEAD_ENEMY_DESPAWN_TIME: f32 = 30.0;

// =============================================================================
// COLLABORATOR INTERFACES
// =============================================================================

/// Navigation service consumed by the behavior core.
///
/// The real implementation lives on the server (a steering motor that
/// advances the enemy each tick); path computation itself is outside
/// this crate's scope.
pub trait NavAgent {
    fn set_destination(&mut self, pos: Vec3);
    fn pause(&mut self);
    fn resume(&mut self);
    fn set_speed(&mut self, speed: f32);
    /// Permanently shut the agent down (terminal, used on death).
    fn disable(&mut self);
}

/// Presentation sink consumed by the combat state machine.
///
/// The server translates these calls into replication-layer messages;
/// tests record them to assert ordering.
pub trait FeedbackSink {
    fn hit_effect(&mut self, point: Vec3, normal: Vec3);
    fn refresh_health_bar(&mut self, current: f32, max: f32);
    fn hide_health_bar(&mut self);
    fn play_hit_sound(&mut self);
    fn play_death_sound(&mut self);
    fn play_death_animation(&mut self);
    fn set_colliders_enabled(&mut self, enabled: bool);
}

/// One recorded feedback call.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FeedbackEvent {
    HitEffect { point: Vec3, normal: Vec3 },
    HealthBar { current: f32, max: f32 },
    HideHealthBar,
    HitSound,
    DeathSound,
    DeathAnimation,
    CollidersEnabled(bool),
}

/// Buffering sink: records calls in order for later delivery.
///
/// The server drains the buffer into network messages after each core
/// call; tests inspect it directly.
#[derive(Default, Debug)]
pub struct FeedbackBuffer {
    pub events: Vec<FeedbackEvent>,
}

impl FeedbackSink for FeedbackBuffer {
    fn hit_effect(&mut self, point: Vec3, normal: Vec3) {
        self.events.push(FeedbackEvent::HitEffect { point, normal });
    }
    fn refresh_health_bar(&mut self, current: f32, max: f32) {
        self.events.push(FeedbackEvent::HealthBar { current, max });
    }
    fn hide_health_bar(&mut self) {
        self.events.push(FeedbackEvent::HideHealthBar);
    }
    fn play_hit_sound(&mut self) {
        self.events.push(FeedbackEvent::HitSound);
    }
    fn play_death_sound(&mut self) {
        self.events.push(FeedbackEvent::DeathSound);
    }
    fn play_death_animation(&mut self) {
        self.events.push(FeedbackEvent::DeathAnimation);
    }
    fn set_colliders_enabled(&mut self, enabled: bool) {
        self.events.push(FeedbackEvent::CollidersEnabled(enabled));
    }
}

// =============================================================================
// SETUP
// =============================================================================

/// Initial stats delivered once per enemy by the session authority.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EnemySetup {
    pub starting_health: f32,
    pub damage: f32,
    pub move_speed: f32,
    pub skin_color: [f32; 3],
}

/// Spawn presets in the spirit of the classic horde roster: a standard
/// walker, a slow bruiser, and a fast runner.
pub const ENEMY_PRESETS: &[EnemySetup] = &[
    EnemySetup {
        starting_health: 100.0,
        damage: 20.0,
        move_speed: 3.5,
        skin_color: [0.55, 0.65, 0.45],
    },
    EnemySetup {
        starting_health: 200.0,
        damage: 30.0,
        move_speed: 2.0,
        skin_color: [0.45, 0.35, 0.3],
    },
    EnemySetup {
        starting_health: 60.0,
        damage: 15.0,
        move_speed: 5.0,
        skin_color: [0.75, 0.7, 0.4],
    },
];

/// Apply the one-time setup to a freshly spawned enemy.
///
/// Guarded against duplicate delivery: the replication layer may
/// redeliver the call, and re-applying it mid-fight would silently
/// reset health. Returns false (and changes nothing) if this enemy was
/// already configured.
pub fn apply_setup(
    setup: &EnemySetup,
    configured: &mut bool,
    health: &mut Health,
    stats: &mut EnemyStats,
    nav: &mut impl NavAgent,
) -> bool {
    if *configured {
        warn!("duplicate setup delivery ignored");
        return false;
    }
    *configured = true;

    *health = Health::new(setup.starting_health);
    stats.damage = setup.damage;
    stats.move_speed = setup.move_speed;
    stats.skin_color = setup.skin_color;
    nav.set_speed(setup.move_speed);
    true
}

// =============================================================================
// TARGET SELECTION & PURSUIT
// =============================================================================

/// Scan for a pursuit target around `origin`.
///
/// Returns the first queried body whose living entity is still alive;
/// no distance ranking, proximity is already bounded by the query
/// radius. Never returns a dead or missing entity.
pub fn select_target(
    index: &SpatialBodyIndex,
    origin: Vec3,
    radius: f32,
    tag: BodyTag,
    is_alive: impl Fn(Entity) -> bool,
) -> Option<Entity> {
    index
        .query_overlap(origin, radius, tag)
        .into_iter()
        .map(|body| body.entity)
        .find(|&entity| is_alive(entity))
}

/// True iff the held target reference currently resolves to a living entity.
pub fn has_valid_target(target: &EnemyTarget, is_alive: impl Fn(Entity) -> bool) -> bool {
    target.0.is_some_and(&is_alive)
}

/// One pursuit cycle (runs every [`PURSUIT_PERIOD`] while alive).
///
/// A valid target keeps navigation running toward its current position.
/// Otherwise navigation pauses and a fresh scan may adopt a new target;
/// movement toward it starts on the next cycle.
pub fn pursuit_cycle(
    target: &mut EnemyTarget,
    enemy_pos: Vec3,
    index: &SpatialBodyIndex,
    target_tag: BodyTag,
    nav: &mut impl NavAgent,
    is_alive: impl Fn(Entity) -> bool,
    position_of: impl Fn(Entity) -> Option<Vec3>,
) {
    if let Some(entity) = target.0 {
        if is_alive(entity) {
            if let Some(pos) = position_of(entity) {
                nav.resume();
                nav.set_destination(pos);
                return;
            }
        }
        // Stale reference: the normal path, not an error.
        target.0 = None;
    }

    nav.pause();
    target.0 = select_target(index, enemy_pos, TARGET_SCAN_RADIUS, target_tag, is_alive);
}

// =============================================================================
// COMBAT STATE MACHINE
// =============================================================================

/// Damage entry point.
///
/// Hit feedback fires before the numeric health mutation, so the
/// health-bar refresh carries the pre-hit value; the steady-state bar
/// follows the replicated health component. Returns true when this hit
/// was the terminal one.
pub fn on_damage(
    health: &mut Health,
    nav: &mut impl NavAgent,
    feedback: &mut impl FeedbackSink,
    amount: f32,
    hit_point: Vec3,
    hit_normal: Vec3,
) -> bool {
    if !health.dead {
        feedback.hit_effect(hit_point, hit_normal);
        feedback.refresh_health_bar(health.current, health.max);
        feedback.play_hit_sound();
    }

    let died = health.take_damage(amount);
    if died {
        die(nav, feedback);
    }
    died
}

/// Terminal death transition.
///
/// Runs exactly once, on the alive -> dead edge reported by
/// `Health::take_damage`; callers gate re-entry on the `dead` flag.
/// Colliders go first so the corpse stops blocking other actors'
/// queries, then the display and navigation shut down, then the
/// terminal animation and audio fire.
pub fn die(nav: &mut impl NavAgent, feedback: &mut impl FeedbackSink) {
    feedback.set_colliders_enabled(false);
    feedback.hide_health_bar();
    nav.pause();
    nav.disable();
    feedback.play_death_animation();
    feedback.play_death_sound();
}

// =============================================================================
// CONTACT ATTACK
// =============================================================================

/// A resolved contact attack, ready for delivery to the victim.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackHit {
    pub target: Entity,
    /// Approximate contact point: closest point on the victim's body.
    pub point: Vec3,
    /// Approximate contact normal: from the victim toward the attacker.
    pub normal: Vec3,
    pub damage: f32,
}

/// Evaluate the sustained-overlap attack trigger for one tick.
///
/// `overlapping` is every body currently in physical contact with the
/// enemy (re-checked each tick, not only on first contact). An attack
/// executes only when the enemy is alive, the cooldown has elapsed, and
/// one of the overlapping bodies is the currently tracked target;
/// overlap with anything else never deals damage.
pub fn check_contact_attack(
    dead: bool,
    cooldown: &mut AttackCooldown,
    stats: &EnemyStats,
    target: &EnemyTarget,
    enemy_pos: Vec3,
    now: f32,
    overlapping: impl IntoIterator<Item = crate::spatial::BodyEntry>,
) -> Option<AttackHit> {
    if dead || now < cooldown.last_attack_time + stats.attack_interval {
        return None;
    }

    for body in overlapping {
        if target.0 != Some(body.entity) {
            continue;
        }
        cooldown.last_attack_time = now;

        let point = body.closest_point(enemy_pos);
        let normal = Vec3::new(
            enemy_pos.x - body.center.x,
            0.0,
            enemy_pos.z - body.center.z,
        )
        .normalize_or_zero();

        return Some(AttackHit {
            target: body.entity,
            point,
            normal,
            damage: stats.damage,
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{BodyEntry, BodyTag};
    use std::collections::HashMap;

    #[derive(Clone, Copy, Debug, PartialEq)]
    enum NavCall {
        SetDestination(Vec3),
        Pause,
        Resume,
        SetSpeed(f32),
        Disable,
    }

    #[derive(Default)]
    struct RecordingNav {
        calls: Vec<NavCall>,
    }

    impl NavAgent for RecordingNav {
        fn set_destination(&mut self, pos: Vec3) {
            self.calls.push(NavCall::SetDestination(pos));
        }
        fn pause(&mut self) {
            self.calls.push(NavCall::Pause);
        }
        fn resume(&mut self) {
            self.calls.push(NavCall::Resume);
        }
        fn set_speed(&mut self, speed: f32) {
            self.calls.push(NavCall::SetSpeed(speed));
        }
        fn disable(&mut self) {
            self.calls.push(NavCall::Disable);
        }
    }

    struct TestWorld {
        world: World,
        alive: HashMap<Entity, bool>,
        positions: HashMap<Entity, Vec3>,
    }

    impl TestWorld {
        fn new() -> Self {
            Self {
                world: World::new(),
                alive: HashMap::new(),
                positions: HashMap::new(),
            }
        }

        fn spawn_body(&mut self, pos: Vec3, alive: bool) -> Entity {
            let entity = self.world.spawn_empty().id();
            self.alive.insert(entity, alive);
            self.positions.insert(entity, pos);
            entity
        }

        fn index(&self, tag: BodyTag) -> SpatialBodyIndex {
            let mut index = SpatialBodyIndex::new();
            for (&entity, &pos) in &self.positions {
                index.insert(BodyEntry {
                    entity,
                    center: pos,
                    radius: 0.3,
                    tag,
                });
            }
            index
        }

        fn is_alive(&self) -> impl Fn(Entity) -> bool + '_ {
            |e| self.alive.get(&e).copied().unwrap_or(false)
        }

        fn position_of(&self) -> impl Fn(Entity) -> Option<Vec3> + '_ {
            |e| self.positions.get(&e).copied()
        }
    }

    fn death_events(buffer: &FeedbackBuffer) -> usize {
        buffer
            .events
            .iter()
            .filter(|e| matches!(e, FeedbackEvent::DeathAnimation))
            .count()
    }

    // --- Setup ---

    #[test]
    fn setup_applies_stats_and_speed() {
        let setup = EnemySetup {
            starting_health: 100.0,
            damage: 20.0,
            move_speed: 3.5,
            skin_color: [1.0, 0.0, 0.0],
        };
        let mut configured = false;
        let mut health = Health::default();
        let mut stats = EnemyStats::default();
        let mut nav = RecordingNav::default();

        assert!(apply_setup(&setup, &mut configured, &mut health, &mut stats, &mut nav));

        assert_eq!(health.current, 100.0);
        assert_eq!(health.max, 100.0);
        assert!(!health.dead);
        assert_eq!(stats.damage, 20.0);
        assert_eq!(stats.move_speed, 3.5);
        assert_eq!(stats.skin_color, [1.0, 0.0, 0.0]);
        assert_eq!(nav.calls, vec![NavCall::SetSpeed(3.5)]);
    }

    #[test]
    fn duplicate_setup_delivery_is_ignored() {
        let first = EnemySetup {
            starting_health: 100.0,
            damage: 20.0,
            move_speed: 3.5,
            skin_color: [1.0, 0.0, 0.0],
        };
        let redelivered = EnemySetup {
            starting_health: 500.0,
            damage: 99.0,
            move_speed: 9.0,
            skin_color: [0.0, 0.0, 1.0],
        };
        let mut configured = false;
        let mut health = Health::default();
        let mut stats = EnemyStats::default();
        let mut nav = RecordingNav::default();

        apply_setup(&first, &mut configured, &mut health, &mut stats, &mut nav);
        health.take_damage(30.0);

        assert!(!apply_setup(&redelivered, &mut configured, &mut health, &mut stats, &mut nav));
        // Mid-fight redelivery must not reset anything.
        assert_eq!(health.current, 70.0);
        assert_eq!(stats.damage, 20.0);
        assert_eq!(nav.calls.len(), 1);
    }

    // --- Health base contract ---

    #[test]
    fn health_clamps_and_latches_death_once() {
        let mut health = Health::new(100.0);

        assert!(!health.take_damage(80.0));
        assert_eq!(health.current, 20.0);
        assert!(!health.dead);

        // Overkill clamps at zero and reports the edge exactly once.
        assert!(health.take_damage(50.0));
        assert_eq!(health.current, 0.0);
        assert!(health.dead);

        assert!(!health.take_damage(10.0));
        assert!(health.dead);

        // Healing never revives.
        health.heal(50.0);
        assert_eq!(health.current, 0.0);
        assert!(health.dead);
    }

    #[test]
    fn negative_damage_never_heals() {
        let mut health = Health::new(100.0);
        health.take_damage(30.0);
        health.take_damage(-40.0);
        assert_eq!(health.current, 70.0);
    }

    // --- Target selection ---

    #[test]
    fn selector_skips_dead_and_unknown_bodies() {
        let mut tw = TestWorld::new();
        let dead = tw.spawn_body(Vec3::new(2.0, 0.9, 0.0), false);
        let alive = tw.spawn_body(Vec3::new(5.0, 0.9, 0.0), true);
        let index = tw.index(BodyTag::Player);

        let picked = select_target(&index, Vec3::ZERO, TARGET_SCAN_RADIUS, BodyTag::Player, tw.is_alive());

        assert_eq!(picked, Some(alive));
        assert_ne!(picked, Some(dead));
    }

    #[test]
    fn selector_returns_none_when_nothing_lives_in_radius() {
        let mut tw = TestWorld::new();
        tw.spawn_body(Vec3::new(2.0, 0.9, 0.0), false);
        tw.spawn_body(Vec3::new(40.0, 0.9, 0.0), true); // outside radius
        let index = tw.index(BodyTag::Player);

        assert_eq!(
            select_target(&index, Vec3::ZERO, TARGET_SCAN_RADIUS, BodyTag::Player, tw.is_alive()),
            None
        );
    }

    // --- Pursuit cycle ---

    #[test]
    fn pursuit_pauses_then_acquires_then_chases() {
        let mut tw = TestWorld::new();
        let mut target = EnemyTarget::default();
        let mut nav = RecordingNav::default();

        // No one around: navigation pauses, no target adopted.
        let empty = tw.index(BodyTag::Player);
        pursuit_cycle(
            &mut target,
            Vec3::ZERO,
            &empty,
            BodyTag::Player,
            &mut nav,
            tw.is_alive(),
            tw.position_of(),
        );
        assert_eq!(target.0, None);
        assert_eq!(nav.calls, vec![NavCall::Pause]);

        // A player steps into scan radius: adopted this cycle, still paused.
        let player = tw.spawn_body(Vec3::new(6.0, 0.9, 0.0), true);
        let index = tw.index(BodyTag::Player);
        nav.calls.clear();
        pursuit_cycle(
            &mut target,
            Vec3::ZERO,
            &index,
            BodyTag::Player,
            &mut nav,
            tw.is_alive(),
            tw.position_of(),
        );
        assert_eq!(target.0, Some(player));
        assert_eq!(nav.calls, vec![NavCall::Pause]);

        // Next cycle: navigation resumes toward the target's current position.
        nav.calls.clear();
        pursuit_cycle(
            &mut target,
            Vec3::ZERO,
            &index,
            BodyTag::Player,
            &mut nav,
            tw.is_alive(),
            tw.position_of(),
        );
        assert_eq!(
            nav.calls,
            vec![NavCall::Resume, NavCall::SetDestination(Vec3::new(6.0, 0.9, 0.0))]
        );
    }

    #[test]
    fn stale_target_is_dropped_and_reselected() {
        let mut tw = TestWorld::new();
        let dying = tw.spawn_body(Vec3::new(4.0, 0.9, 0.0), true);
        let other = tw.spawn_body(Vec3::new(8.0, 0.9, 0.0), true);
        let mut target = EnemyTarget(Some(dying));
        let mut nav = RecordingNav::default();

        tw.alive.insert(dying, false);
        let index = tw.index(BodyTag::Player);
        pursuit_cycle(
            &mut target,
            Vec3::ZERO,
            &index,
            BodyTag::Player,
            &mut nav,
            tw.is_alive(),
            tw.position_of(),
        );

        // Dead reference cleared and replaced in the same scan; the dead
        // body is never re-adopted.
        assert_eq!(target.0, Some(other));
        assert_eq!(nav.calls, vec![NavCall::Pause]);
    }

    #[test]
    fn has_valid_target_checks_liveness_at_point_of_use() {
        let mut tw = TestWorld::new();
        let player = tw.spawn_body(Vec3::ZERO, true);
        let target = EnemyTarget(Some(player));

        assert!(has_valid_target(&target, tw.is_alive()));
        tw.alive.insert(player, false);
        assert!(!has_valid_target(&target, tw.is_alive()));
        assert!(!has_valid_target(&EnemyTarget(None), tw.is_alive()));
    }

    // --- Damage / death ---

    #[test]
    fn damage_feedback_precedes_health_mutation() {
        let mut health = Health::new(100.0);
        let mut nav = RecordingNav::default();
        let mut feedback = FeedbackBuffer::default();
        let point = Vec3::new(1.0, 1.2, 0.0);
        let normal = Vec3::X;

        let died = on_damage(&mut health, &mut nav, &mut feedback, 30.0, point, normal);

        assert!(!died);
        assert_eq!(health.current, 70.0);
        // The bar refresh carries the pre-hit value.
        assert_eq!(
            feedback.events,
            vec![
                FeedbackEvent::HitEffect { point, normal },
                FeedbackEvent::HealthBar { current: 100.0, max: 100.0 },
                FeedbackEvent::HitSound,
            ]
        );
        assert!(nav.calls.is_empty());
    }

    #[test]
    fn lethal_hit_runs_death_effects_exactly_once() {
        let mut health = Health::new(100.0);
        let mut nav = RecordingNav::default();
        let mut feedback = FeedbackBuffer::default();

        on_damage(&mut health, &mut nav, &mut feedback, 80.0, Vec3::ZERO, Vec3::X);
        assert!(!health.dead);

        let died = on_damage(&mut health, &mut nav, &mut feedback, 50.0, Vec3::ZERO, Vec3::X);
        assert!(died);
        assert!(health.dead);
        assert_eq!(health.current, 0.0);
        assert_eq!(death_events(&feedback), 1);
        assert!(feedback.events.contains(&FeedbackEvent::CollidersEnabled(false)));
        assert!(feedback.events.contains(&FeedbackEvent::HideHealthBar));
        assert_eq!(nav.calls, vec![NavCall::Pause, NavCall::Disable]);

        // Further hits on the corpse: no feedback, no second death.
        let events_before = feedback.events.len();
        let died_again = on_damage(&mut health, &mut nav, &mut feedback, 50.0, Vec3::ZERO, Vec3::X);
        assert!(!died_again);
        assert_eq!(feedback.events.len(), events_before);
        assert_eq!(death_events(&feedback), 1);
    }

    #[test]
    fn death_ordering_disables_colliders_before_terminal_effects() {
        let mut nav = RecordingNav::default();
        let mut feedback = FeedbackBuffer::default();

        die(&mut nav, &mut feedback);

        assert_eq!(
            feedback.events,
            vec![
                FeedbackEvent::CollidersEnabled(false),
                FeedbackEvent::HideHealthBar,
                FeedbackEvent::DeathAnimation,
                FeedbackEvent::DeathSound,
            ]
        );
        assert_eq!(nav.calls, vec![NavCall::Pause, NavCall::Disable]);
    }

    // --- Contact attack ---

    fn body_at(entity: Entity, pos: Vec3) -> BodyEntry {
        BodyEntry {
            entity,
            center: pos,
            radius: 0.3,
            tag: BodyTag::Player,
        }
    }

    #[test]
    fn attack_only_hits_the_tracked_target() {
        let mut tw = TestWorld::new();
        let bystander = tw.spawn_body(Vec3::new(0.5, 0.9, 0.0), true);
        let tracked = tw.spawn_body(Vec3::new(-0.5, 0.9, 0.0), true);

        let mut cooldown = AttackCooldown::default();
        let stats = EnemyStats::default();
        let target = EnemyTarget(Some(tracked));

        let hit = check_contact_attack(
            false,
            &mut cooldown,
            &stats,
            &target,
            Vec3::new(0.0, 0.9, 0.0),
            1.0,
            [
                body_at(bystander, Vec3::new(0.5, 0.9, 0.0)),
                body_at(tracked, Vec3::new(-0.5, 0.9, 0.0)),
            ],
        )
        .expect("tracked target in contact should be attacked");

        assert_eq!(hit.target, tracked);
        assert_eq!(hit.damage, stats.damage);
        // Contact point lies on the victim's rim toward the attacker,
        // normal points from victim to attacker.
        assert!((hit.point - Vec3::new(-0.2, 0.9, 0.0)).length() < 1e-4);
        assert!((hit.normal - Vec3::X).length() < 1e-4);
    }

    #[test]
    fn overlap_with_non_target_never_attacks() {
        let mut tw = TestWorld::new();
        let bystander = tw.spawn_body(Vec3::new(0.5, 0.9, 0.0), true);

        let mut cooldown = AttackCooldown::default();
        let stats = EnemyStats::default();
        let target = EnemyTarget(None);

        let hit = check_contact_attack(
            false,
            &mut cooldown,
            &stats,
            &target,
            Vec3::new(0.0, 0.9, 0.0),
            1.0,
            [body_at(bystander, Vec3::new(0.5, 0.9, 0.0))],
        );

        assert_eq!(hit, None);
        // Cooldown must not be consumed by a refused attack.
        assert_eq!(cooldown.last_attack_time, AttackCooldown::default().last_attack_time);
    }

    #[test]
    fn cooldown_spaces_attacks_by_at_least_the_interval() {
        let mut tw = TestWorld::new();
        let tracked = tw.spawn_body(Vec3::new(0.5, 0.9, 0.0), true);

        let mut cooldown = AttackCooldown::default();
        let stats = EnemyStats {
            attack_interval: 0.5,
            ..Default::default()
        };
        let target = EnemyTarget(Some(tracked));
        let overlap = || [body_at(tracked, Vec3::new(0.5, 0.9, 0.0))];
        let enemy_pos = Vec3::new(0.0, 0.9, 0.0);

        assert!(check_contact_attack(false, &mut cooldown, &stats, &target, enemy_pos, 1.0, overlap()).is_some());
        // Sustained overlap inside the cooldown window: no attack.
        assert!(check_contact_attack(false, &mut cooldown, &stats, &target, enemy_pos, 1.2, overlap()).is_none());
        assert!(check_contact_attack(false, &mut cooldown, &stats, &target, enemy_pos, 1.49, overlap()).is_none());
        // Exactly at the interval boundary the attack is allowed again.
        assert!(check_contact_attack(false, &mut cooldown, &stats, &target, enemy_pos, 1.5, overlap()).is_some());
    }

    #[test]
    fn dead_enemy_never_attacks() {
        let mut tw = TestWorld::new();
        let tracked = tw.spawn_body(Vec3::new(0.5, 0.9, 0.0), true);

        let mut cooldown = AttackCooldown::default();
        let stats = EnemyStats::default();
        let target = EnemyTarget(Some(tracked));

        let hit = check_contact_attack(
            true,
            &mut cooldown,
            &stats,
            &target,
            Vec3::new(0.0, 0.9, 0.0),
            1.0,
            [body_at(tracked, Vec3::new(0.5, 0.9, 0.0))],
        );
        assert_eq!(hit, None);
    }

    // --- End-to-end scenario ---

    #[test]
    fn setup_then_damage_scenario() {
        let setup = EnemySetup {
            starting_health: 100.0,
            damage: 20.0,
            move_speed: 3.5,
            skin_color: [1.0, 0.0, 0.0],
        };
        let mut configured = false;
        let mut health = Health::default();
        let mut stats = EnemyStats::default();
        let mut nav = RecordingNav::default();
        let mut feedback = FeedbackBuffer::default();

        apply_setup(&setup, &mut configured, &mut health, &mut stats, &mut nav);

        let point = Vec3::new(0.3, 1.1, 0.0);
        on_damage(&mut health, &mut nav, &mut feedback, 30.0, point, Vec3::X);

        assert_eq!(health.current, 70.0);
        assert_eq!(health.max, 100.0);
        assert!(!health.dead);
        assert!(feedback
            .events
            .contains(&FeedbackEvent::HitEffect { point, normal: Vec3::X }));
    }
}
