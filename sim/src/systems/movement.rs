//! Movement system - the single place velocity is integrated into position.

use crate::components::*;
use bevy_ecs::prelude::*;

/// Resource containing the delta time for the current tick, in seconds.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct DeltaTime(pub f32);

impl DeltaTime {
    pub fn millis(&self) -> f32 {
        self.0 * 1000.0
    }
}

/// System that applies velocity to position.
///
/// Applies to every entity with a body; gravity and behavior systems only
/// ever write velocity.
pub fn movement_system(dt: Res<DeltaTime>, mut query: Query<(&mut Position, &Velocity)>) {
    let delta = dt.0;
    for (mut pos, vel) in query.iter_mut() {
        pos.x += vel.vx * delta;
        pos.y += vel.vy * delta;
    }
}
