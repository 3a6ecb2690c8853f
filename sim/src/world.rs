//! Snapshot types.
//!
//! The `Snapshot` struct provides a serializable view of the simulation state
//! that a renderer can draw from without touching the ECS world.

use crate::components::*;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Snapshot of a single entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntitySnapshot {
    /// Stable entity id (`Entity::to_bits`).
    pub id: u64,
    pub kind: Kind,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub vx: f32,
    pub vy: f32,
    pub hitbox: Rect,
    pub facing: Option<Facing>,
    /// Collision group, for collidable entities.
    pub group: Option<CollisionGroup>,
    pub grounded: bool,
    pub hp: Option<f32>,
    pub max_hp: Option<f32>,
}

/// Complete simulation state snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Current simulation tick.
    pub tick: u64,
    /// Elapsed simulation time in seconds.
    pub time: f32,
    /// Every entity with a body, in spawn order.
    pub entities: Vec<EntitySnapshot>,
}

impl Snapshot {
    /// Create a snapshot from the ECS world.
    pub fn from_world(world: &mut World, tick: u64, time: f32) -> Self {
        let mut query = world.query::<(
            Entity,
            &Kind,
            &Position,
            &Size,
            &Velocity,
            Option<&HitboxShape>,
            Option<&Facing>,
            Option<&Collidable>,
            Option<&Stats>,
            Option<&SpawnOrder>,
        )>();

        let mut ordered: Vec<(u64, Entity, EntitySnapshot)> = query
            .iter(world)
            .map(|(entity, kind, pos, size, vel, shape, facing, collidable, stats, order)| {
                let snapshot = EntitySnapshot {
                    id: entity.to_bits(),
                    kind: *kind,
                    x: pos.x,
                    y: pos.y,
                    width: size.width,
                    height: size.height,
                    vx: vel.vx,
                    vy: vel.vy,
                    hitbox: shape.copied().unwrap_or_default().hitbox(pos, size),
                    facing: facing.copied(),
                    group: collidable.map(|c| c.group),
                    grounded: collidable.is_some_and(Collidable::is_grounded),
                    hp: stats.map(Stats::hp),
                    max_hp: stats.map(Stats::max_hp),
                };
                (order.map_or(u64::MAX, |o| o.0), entity, snapshot)
            })
            .collect();
        ordered.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)));

        Self {
            tick,
            time,
            entities: ordered.into_iter().map(|(_, _, snapshot)| snapshot).collect(),
        }
    }

    pub fn count(&self, kind: Kind) -> usize {
        self.entities.iter().filter(|e| e.kind == kind).count()
    }

    /// Serialize snapshot to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize snapshot to pretty JSON string.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archetypes;
    use crate::config::SimConfig;

    #[test]
    fn test_snapshot_lists_bodies_in_spawn_order() {
        let mut world = World::new();
        let config = SimConfig::default();
        let zombie = world
            .spawn((archetypes::zombie(Position::new(300.0, 200.0), &config), SpawnOrder(1)))
            .id();
        let wall = world
            .spawn((archetypes::wall(0.0, 200.0, 1000.0, 50.0), SpawnOrder(0)))
            .id();
        world.spawn(Position::new(1.0, 1.0));

        let snapshot = Snapshot::from_world(&mut world, 7, 0.5);

        assert_eq!(snapshot.tick, 7);
        let ids: Vec<u64> = snapshot.entities.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![wall.to_bits(), zombie.to_bits()]);

        let zombie = &snapshot.entities[1];
        assert_eq!(zombie.kind, Kind::Zombie);
        assert_eq!(zombie.hp, Some(100.0));
        assert_eq!(zombie.group, Some(CollisionGroup::Mob));
        assert_eq!(zombie.hitbox.bottom(), 200.0);
        assert!(!zombie.grounded);
        assert_eq!(snapshot.entities[0].hp, None);
        assert_eq!(snapshot.count(Kind::Wall), 1);
    }

    #[test]
    fn test_snapshot_json_has_expected_fields() {
        let mut world = World::new();
        world.spawn(archetypes::wall(0.0, 0.0, 10.0, 10.0));
        let json = Snapshot::from_world(&mut world, 0, 0.0).to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["entities"][0]["kind"], "Wall");
        assert_eq!(value["entities"][0]["group"], "Wall");
        assert_eq!(value["entities"][0]["hitbox"]["width"], 10.0);
    }
}
