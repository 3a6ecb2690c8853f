//! Gravity system - constant downward acceleration.

use crate::components::*;
use crate::systems::movement::DeltaTime;
use bevy_ecs::prelude::*;

/// Adds `pull * dt` to the vertical velocity of every gravitational entity.
///
/// There is no terminal velocity; floors stop a fall through collision
/// correction and behavior systems decide when to zero `vy`.
pub fn gravity_system(dt: Res<DeltaTime>, mut query: Query<(&Gravitational, &mut Velocity)>) {
    let delta = dt.0;
    for (gravity, mut vel) in query.iter_mut() {
        vel.vy += gravity.pull() * delta;
    }
}
