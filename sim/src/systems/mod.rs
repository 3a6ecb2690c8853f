//! ECS Systems for the platformer simulation.
//!
//! Systems contain the game logic that operates on components.
//!
//! ## Pipeline
//!
//! One pass of [`build_pipeline`] runs, strictly in this order:
//!
//! 1. `spawn_order_system` - stamps [`SpawnOrder`] on entities spawned since the last pass
//! 2. `player_system` - input intents into velocity, attacks spawned
//! 3. `zombie_behavior_system`, `crawler_behavior_system` - mobs chase the player
//! 4. `gravity_system` - `vy += pull * dt`
//! 5. `effect_system` - pending damage counts down and lands
//! 6. `movement_system` - `position += velocity * dt`
//! 7. `collision_system` - overlaps detected, corrected and reported
//! 8. `delete_system` - timed removals
//!
//! Automatic sync points are disabled: every command queued during the pass
//! (spawns, inserts, removals, despawns) is applied once, after `delete_system`.
//! A later system in the same pass never sees an entity or component an
//! earlier one queued.

pub mod behavior;
pub mod collision;
pub mod delete;
pub mod effect;
pub mod gravity;
pub mod movement;
pub mod player;

pub use behavior::*;
pub use collision::{collision_system, contact_side, correction, BodyQuery, CollisionContext};
pub use delete::*;
pub use effect::*;
pub use gravity::*;
pub use movement::*;
pub use player::*;

use crate::components::*;
use bevy_ecs::prelude::*;
use bevy_ecs::schedule::{ExecutorKind, ScheduleBuildSettings};
use bevy_ecs::world::EntityRef;

/// Source of [`SpawnOrder`] values. Monotonic for the life of a world.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct SpawnSequence(u64);

impl SpawnSequence {
    pub fn next(&mut self) -> SpawnOrder {
        let order = SpawnOrder(self.0);
        self.0 += 1;
        order
    }
}

/// Stamps a [`SpawnOrder`] on every positioned entity that lacks one.
///
/// Entities spawned through `SimWorld::spawn` are stamped immediately; this
/// picks up the ones queued by systems during the previous pass, ordered by
/// entity id.
pub fn spawn_order_system(world: &mut World) {
    let mut unordered = world.query_filtered::<Entity, (With<Position>, Without<SpawnOrder>)>();
    let mut pending: Vec<Entity> = unordered.iter(world).collect();
    if pending.is_empty() {
        return;
    }
    pending.sort_unstable();

    let stamped: Vec<(Entity, SpawnOrder)> = {
        let mut sequence = world.get_resource_or_insert_with(SpawnSequence::default);
        pending.into_iter().map(|entity| (entity, sequence.next())).collect()
    };
    for (entity, order) in stamped {
        world.entity_mut(entity).insert(order);
    }
}

/// One step of the pipeline, for hosts that want to filter the full entity
/// list the way each system's query does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Player,
    Zombie,
    Crawler,
    Gravity,
    Effect,
    Movement,
    Collision,
    Delete,
}

/// The stages in execution order.
pub const PIPELINE: [Stage; 8] = [
    Stage::Player,
    Stage::Zombie,
    Stage::Crawler,
    Stage::Gravity,
    Stage::Effect,
    Stage::Movement,
    Stage::Collision,
    Stage::Delete,
];

impl Stage {
    /// Whether the stage's system would process `entity`.
    pub fn applies_to(&self, entity: EntityRef) -> bool {
        let body = entity.contains::<Position>() && entity.contains::<Velocity>();
        match self {
            Stage::Player => {
                body && entity.contains::<Size>()
                    && entity.contains::<Facing>()
                    && entity.contains::<PlayerActions>()
                    && entity.contains::<Weapon>()
            }
            Stage::Zombie => body && entity.contains::<Facing>() && entity.contains::<ZombieActions>(),
            Stage::Crawler => body && entity.contains::<Facing>() && entity.contains::<CrawlerActions>(),
            Stage::Gravity => entity.contains::<Gravitational>() && entity.contains::<Velocity>(),
            Stage::Effect => entity.contains::<Stats>() && entity.contains::<Damage>(),
            Stage::Movement => body,
            Stage::Collision => body && entity.contains::<Size>() && entity.contains::<Collidable>(),
            Stage::Delete => entity.contains::<Delete>(),
        }
    }
}

/// Builds the simulation schedule.
pub fn build_pipeline() -> Schedule {
    let mut schedule = Schedule::default();
    schedule.set_executor_kind(ExecutorKind::SingleThreaded);
    schedule.set_build_settings(ScheduleBuildSettings {
        auto_insert_apply_deferred: false,
        ..Default::default()
    });
    schedule.add_systems(
        (
            spawn_order_system,
            player_system,
            zombie_behavior_system,
            crawler_behavior_system,
            gravity_system,
            effect_system,
            movement_system,
            collision_system,
            delete_system,
        )
            .chain(),
    );
    schedule
}
