//! Effect system - applies delayed damage to stats.

use crate::components::*;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;

/// Counts down each pending [`Damage`] and, on the tick its trigger time
/// runs out, subtracts its points from [`Stats::hp`] and removes it.
///
/// Removal is queued, so the component disappears when the pass ends.
pub fn effect_system(
    dt: Res<DeltaTime>,
    mut commands: Commands,
    mut query: Query<(Entity, &mut Stats, &mut Damage)>,
) {
    let elapsed_ms = dt.millis();
    for (entity, mut stats, mut damage) in query.iter_mut() {
        damage.trigger_in_ms -= elapsed_ms;
        if damage.trigger_in_ms > 0.0 {
            continue;
        }

        stats.take_damage(damage.points);
        commands.entity(entity).remove::<Damage>();
        log::debug!(
            "{entity:?} took {} damage from the {:?}, hp now {}",
            damage.points,
            damage.hit_direction,
            stats.hp()
        );
    }
}
