//! Delete system - timed removal of entities from the world.

use crate::components::Delete;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;

/// Counts down every [`Delete`] in milliseconds and despawns the entity
/// once it reaches zero. Despawns are queued and land after the pass, so
/// the world is never resized while a system iterates it.
pub fn delete_system(dt: Res<DeltaTime>, mut commands: Commands, mut query: Query<(Entity, &mut Delete)>) {
    let elapsed_ms = dt.millis();
    for (entity, mut delete) in query.iter_mut() {
        delete.countdown_ms -= elapsed_ms;
        if delete.countdown_ms <= 0.0 {
            log::debug!("despawning {entity:?}");
            commands.entity(entity).despawn();
        }
    }
}
