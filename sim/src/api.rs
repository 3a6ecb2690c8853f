//! Public API for the simulation.
//!
//! This module provides the main interface for a host (renderer, test
//! harness, replay tool) to interact with the simulation.
//!
//! ## Timestep
//!
//! `step(dt)` runs exactly one pipeline pass with the host's `dt`; the
//! sequence of `dt` values is the only time source, so replaying it replays
//! the game. `advance(elapsed)` is the fixed-timestep alternative: it
//! accumulates wall time and runs as many `fixed_timestep` passes as fit.

use crate::archetypes;
use crate::components::*;
use crate::config::SimConfig;
use crate::error::SimError;
use crate::level::{LevelLayout, Placement};
use crate::systems::*;
use crate::world::Snapshot;
use bevy_ecs::prelude::*;

/// The main simulation world container.
///
/// Holds the ECS world and schedule, providing a clean API for:
/// - Loading levels and spawning entities
/// - Stepping the simulation forward
/// - Reading and editing components between passes
/// - Extracting state snapshots
pub struct SimWorld {
    world: World,
    schedule: Schedule,
    tick: u64,
    time: f32,
    /// Accumulated time for `advance`.
    time_accumulator: f32,
}

impl SimWorld {
    /// Create a new empty simulation world.
    pub fn new() -> Self {
        Self::with_config(SimConfig::default())
    }

    /// Create a new simulation world with custom configuration.
    ///
    /// # Panics
    ///
    /// If `config` fails [`SimConfig::validate`].
    pub fn with_config(config: SimConfig) -> Self {
        if let Err(err) = config.validate() {
            panic!("invalid config: {err}");
        }
        let mut world = World::new();

        world.insert_resource(DeltaTime(config.fixed_timestep));
        world.insert_resource(config);
        world.init_resource::<SpawnSequence>();
        world.init_resource::<PlayerInput>();

        Self {
            world,
            schedule: build_pipeline(),
            tick: 0,
            time: 0.0,
            time_accumulator: 0.0,
        }
    }

    /// Create a world populated from a level layout.
    pub fn from_level(layout: &LevelLayout, config: SimConfig) -> Result<Self, SimError> {
        let mut sim = Self::with_config(config);
        sim.load_level(layout)?;
        Ok(sim)
    }

    /// Spawns everything `layout` places. Nothing is spawned if the layout
    /// is invalid.
    pub fn load_level(&mut self, layout: &LevelLayout) -> Result<Vec<Entity>, SimError> {
        let placements = layout.placements()?;
        let config = self.config().clone();

        let spawned: Vec<Entity> = placements
            .into_iter()
            .map(|placement| match placement {
                Placement::Wall { x, y, width, height } => self.spawn(archetypes::wall(x, y, width, height)),
                Placement::Player { x, y } => self.spawn(archetypes::player(Position::new(x, y), &config)),
                Placement::Zombie { x, y } => self.spawn(archetypes::zombie(Position::new(x, y), &config)),
                Placement::Crawler { x, y } => self.spawn(archetypes::crawler(Position::new(x, y), &config)),
            })
            .collect();

        log::debug!("level loaded: {} entities", spawned.len());
        Ok(spawned)
    }

    pub fn config(&self) -> &SimConfig {
        self.world.resource::<SimConfig>()
    }

    /// Step the simulation forward by `dt` seconds: one full pipeline pass.
    ///
    /// # Panics
    ///
    /// If `dt` is negative or not finite.
    pub fn step(&mut self, dt: f32) {
        assert!(dt.is_finite() && dt >= 0.0, "step called with invalid dt {dt}");

        self.world.insert_resource(DeltaTime(dt));
        self.schedule.run(&mut self.world);

        self.tick += 1;
        self.time += dt;
    }

    /// One pass of `SimConfig::fixed_timestep`.
    pub fn step_fixed(&mut self) {
        let dt = self.config().fixed_timestep;
        self.step(dt);
    }

    /// Accumulates `elapsed` seconds and runs fixed-timestep passes for as
    /// much of it as fits. Returns the number of passes run.
    ///
    /// # Panics
    ///
    /// If `elapsed` is negative or not finite.
    pub fn advance(&mut self, elapsed: f32) -> u32 {
        assert!(
            elapsed.is_finite() && elapsed >= 0.0,
            "advance called with invalid elapsed time {elapsed}"
        );
        let fixed_dt = self.config().fixed_timestep;
        self.time_accumulator += elapsed;

        let mut passes = 0;
        while self.time_accumulator >= fixed_dt {
            self.step(fixed_dt);
            self.time_accumulator -= fixed_dt;
            passes += 1;
        }
        passes
    }

    /// Spawns `bundle` and gives it the next spawn order.
    pub fn spawn(&mut self, bundle: impl Bundle) -> Entity {
        let order = self.world.resource_mut::<SpawnSequence>().next();
        self.world.spawn((bundle, order)).id()
    }

    /// Removes an entity immediately. Returns false if it did not exist.
    pub fn despawn(&mut self, entity: Entity) -> bool {
        self.world.despawn(entity)
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.world.entities().contains(entity)
    }

    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        self.world.get::<T>(entity).is_some()
    }

    /// # Panics
    ///
    /// If `entity` has no `T`; callers are expected to check with
    /// `has_component` or use `try_component` when absence is normal.
    pub fn get_component<T: Component>(&self, entity: Entity) -> &T {
        match self.world.get::<T>(entity) {
            Some(component) => component,
            None => panic!(
                "{entity:?} has no {} component",
                std::any::type_name::<T>()
            ),
        }
    }

    pub fn try_component<T: Component>(&self, entity: Entity) -> Option<&T> {
        self.world.get::<T>(entity)
    }

    /// # Panics
    ///
    /// If `entity` has no `T`.
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> Mut<'_, T> {
        match self.world.get_mut::<T>(entity) {
            Some(component) => component,
            None => panic!(
                "{entity:?} has no {} component",
                std::any::type_name::<T>()
            ),
        }
    }

    /// Attaches components, replacing any of the same type already present.
    pub fn add_components(&mut self, entity: Entity, bundle: impl Bundle) {
        self.world.entity_mut(entity).insert(bundle);
    }

    /// Detaches and returns a component, if present.
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> Option<T> {
        self.world.entity_mut(entity).take::<T>()
    }

    /// Entities the given stage's system would process, in spawn order.
    pub fn entities_for(&self, stage: Stage) -> Vec<Entity> {
        let mut matched: Vec<(u64, Entity)> = self
            .world
            .iter_entities()
            .filter(|entity| stage.applies_to(*entity))
            .map(|entity| {
                let order = entity.get::<SpawnOrder>().map_or(u64::MAX, |o| o.0);
                (order, entity.id())
            })
            .collect();
        matched.sort_unstable();
        matched.into_iter().map(|(_, entity)| entity).collect()
    }

    /// The entity's hitbox, if it has a body.
    pub fn hitbox(&self, entity: Entity) -> Option<Rect> {
        let position = self.world.get::<Position>(entity)?;
        let size = self.world.get::<Size>(entity)?;
        let shape = self.world.get::<HitboxShape>(entity).copied().unwrap_or_default();
        Some(shape.hitbox(position, size))
    }

    /// Contacts recorded for the entity by the last collision pass.
    pub fn contacts(&self, entity: Entity) -> Option<&ContactSet> {
        self.world.get::<Collidable>(entity).map(Collidable::contacts)
    }

    /// Replaces the input intents seen by the next passes.
    pub fn set_player_input(&mut self, input: PlayerInput) {
        self.world.insert_resource(input);
    }

    pub fn player_input_mut(&mut self) -> Mut<'_, PlayerInput> {
        self.world.resource_mut::<PlayerInput>()
    }

    /// Get a snapshot of the current simulation state.
    pub fn snapshot(&mut self) -> Snapshot {
        Snapshot::from_world(&mut self.world, self.tick, self.time)
    }

    /// Get the snapshot as a JSON string.
    pub fn snapshot_json(&mut self) -> Result<String, SimError> {
        Ok(self.snapshot().to_json()?)
    }

    /// Get the current tick number.
    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    /// Get the elapsed simulation time.
    pub fn current_time(&self) -> f32 {
        self.time
    }

    pub fn entity_count(&self) -> usize {
        self.world.entities().len() as usize
    }

    /// Get direct access to the ECS world (for advanced usage).
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Get mutable access to the ECS world (for advanced usage).
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }
}

impl Default for SimWorld {
    fn default() -> Self {
        Self::new()
    }
}
