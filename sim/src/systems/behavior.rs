//! Mob behavior systems: zombies and crawlers chasing the player.
//!
//! Both mobs share the same shape of logic:
//! - advance action timers
//! - clear runaway fall speed once standing on something
//! - on death, turn into a cadaver (drops out of player-attack filtering)
//! - otherwise accelerate toward the nearest player inside a vicinity range
//!
//! Crawlers add a lunge (`jump_attack`) that ends when they touch ground again.

use crate::components::*;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;

/// Chase tuning for one mob type.
#[derive(Debug, Clone, Copy)]
pub struct Pursuit {
    /// Distance within which the mob notices a player (px).
    pub range: f32,
    /// Horizontal acceleration toward the player (px/s²).
    pub acceleration: f32,
    pub max_speed: f32,
}

pub const ZOMBIE_PURSUIT: Pursuit = Pursuit {
    range: 500.0,
    acceleration: 500.0,
    max_speed: 100.0,
};

pub const CRAWLER_PURSUIT: Pursuit = Pursuit {
    range: 950.0,
    acceleration: 800.0,
    max_speed: 700.0,
};

/// Crawlers lunge when the player is this close...
pub const LUNGE_RANGE: f32 = 200.0;
/// ...and they are already running at least this fast toward it.
pub const LUNGE_MIN_SPEED: f32 = 350.0;
pub const LUNGE_VELOCITY: Velocity = Velocity { vx: 1000.0, vy: -250.0 };

/// Grounded mobs falling faster than this have their fall speed cleared.
const FALL_SPEED_RESET: f32 = 1000.0;

type PlayerPositions<'w, 's> = Query<'w, 's, &'static Position, With<PlayerActions>>;

fn nearest_player(position: &Position, players: &PlayerPositions) -> Option<(Position, f32)> {
    players
        .iter()
        .map(|player| (*player, position.distance_to(player)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Which way to go to reach `target`; `None` when directly above or below.
fn heading(from: &Position, target: &Position) -> Option<Facing> {
    if target.x < from.x {
        Some(Facing::Left)
    } else if target.x > from.x {
        Some(Facing::Right)
    } else {
        None
    }
}

/// Adds `step` toward `direction`, capped at `max_speed`.
fn accelerate(vx: f32, direction: Facing, step: f32, max_speed: f32) -> f32 {
    match direction {
        Facing::Left if vx - step <= -max_speed => -max_speed,
        Facing::Left => vx - step,
        Facing::Right if vx + step >= max_speed => max_speed,
        Facing::Right => vx + step,
    }
}

/// Shared death handling. Returns true once the mob is dead.
fn update_death(
    entity: Entity,
    stats: Option<&Stats>,
    die: &mut ActionTimer,
    collidable: Option<&mut Collidable>,
    velocity: &mut Velocity,
) -> bool {
    if !stats.is_some_and(Stats::is_dead) {
        return false;
    }
    if die.is_idle() {
        if let Some(collidable) = collidable {
            collidable.group = CollisionGroup::Cadaver;
        }
        die.start();
        velocity.vx = 0.0;
        log::debug!("{entity:?} died");
    }
    true
}

/// Zombies walk toward the nearest player in range and stop outside it.
pub fn zombie_behavior_system(
    dt: Res<DeltaTime>,
    players: PlayerPositions,
    mut zombies: Query<(
        Entity,
        &Position,
        &mut Velocity,
        &mut Facing,
        &mut ZombieActions,
        Option<&mut Collidable>,
        Option<&Stats>,
    )>,
) {
    let delta = dt.0;

    for (entity, position, mut velocity, mut facing, mut actions, mut collidable, stats) in zombies.iter_mut() {
        let dt_ms = dt.millis();
        actions.stale.advance(dt_ms);
        actions.walk.advance(dt_ms);
        actions.die.advance(dt_ms);

        if collidable.as_deref().is_some_and(Collidable::is_grounded) && velocity.vy > FALL_SPEED_RESET {
            velocity.vy = 0.0;
        }

        if update_death(entity, stats, &mut actions.die, collidable.as_deref_mut(), &mut velocity) {
            continue;
        }

        let Some((target, distance)) = nearest_player(position, &players) else {
            continue;
        };

        if distance > ZOMBIE_PURSUIT.range {
            actions.walk.reset();
            velocity.vx = 0.0;
            continue;
        }

        if let Some(direction) = heading(position, &target) {
            actions.walk.start();
            *facing = direction;
            velocity.vx = accelerate(
                velocity.vx,
                direction,
                ZOMBIE_PURSUIT.acceleration * delta,
                ZOMBIE_PURSUIT.max_speed,
            );
        }
    }
}

/// Crawlers chase like zombies, faster and from further away, and lunge at
/// close range.
pub fn crawler_behavior_system(
    dt: Res<DeltaTime>,
    players: PlayerPositions,
    mut crawlers: Query<(
        Entity,
        &Position,
        &mut Velocity,
        &mut Facing,
        &mut CrawlerActions,
        Option<&mut Collidable>,
        Option<&Stats>,
    )>,
) {
    let delta = dt.0;

    for (entity, position, mut velocity, mut facing, mut actions, mut collidable, stats) in crawlers.iter_mut() {
        let dt_ms = dt.millis();
        actions.stale.advance(dt_ms);
        actions.walk.advance(dt_ms);
        actions.die.advance(dt_ms);
        actions.jump_attack.advance(dt_ms);

        let contacts = collidable.as_deref().map(Collidable::contacts);
        let grounded = contacts.is_some_and(|c| c.is_touching(Side::Bottom));
        let landed = contacts.is_some_and(|c| c.has_initial(Side::Bottom));

        if grounded && velocity.vy > FALL_SPEED_RESET {
            velocity.vy = 0.0;
        }

        if landed && actions.jump_attack.is_in_use() {
            actions.jump_attack.reset();
            velocity.vx = 0.0;
        }

        if update_death(entity, stats, &mut actions.die, collidable.as_deref_mut(), &mut velocity) {
            continue;
        }

        if actions.jump_attack.is_in_use() {
            continue;
        }

        let Some((target, distance)) = nearest_player(position, &players) else {
            continue;
        };

        if distance > CRAWLER_PURSUIT.range {
            actions.walk.reset();
            velocity.vx = 0.0;
            continue;
        }

        let Some(direction) = heading(position, &target) else {
            continue;
        };
        *facing = direction;

        let closing_speed = velocity.vx * direction.sign();
        if distance <= LUNGE_RANGE && closing_speed >= LUNGE_MIN_SPEED {
            actions.jump_attack.start();
            velocity.vx = LUNGE_VELOCITY.vx * direction.sign();
            velocity.vy = LUNGE_VELOCITY.vy;
            log::trace!("{entity:?} lunges {direction:?}");
        } else {
            actions.walk.start();
            velocity.vx = accelerate(
                velocity.vx,
                direction,
                CRAWLER_PURSUIT.acceleration * delta,
                CRAWLER_PURSUIT.max_speed,
            );
        }
    }
}
