//! Platformer Sim - Simulation Core
//!
//! A deterministic ECS simulation for a side-scrolling platformer: gravity,
//! integration, AABB collision with directional contact tracking, delayed
//! damage and timed deletion.
//! Uses `bevy_ecs` for the entity-component-system architecture.

pub mod api;
pub mod archetypes;
pub mod components;
pub mod config;
pub mod error;
pub mod level;
pub mod systems;
pub mod world;

pub use api::SimWorld;
pub use components::*;
pub use config::SimConfig;
pub use error::SimError;
pub use level::{LevelLayout, Placement, TileCode};
pub use systems::*;
pub use world::{EntitySnapshot, Snapshot};
