//! Tunable simulation parameters.
//!
//! All values are in pixels, seconds or milliseconds, matching the units the
//! systems work in. Missing JSON fields fall back to their defaults.

use crate::error::SimError;
use bevy_ecs::prelude::*;
use serde::{Deserialize, Serialize};

/// Configuration for archetypes, combat and the player controller.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Timestep used by `SimWorld::step_fixed` (seconds).
    pub fixed_timestep: f32,
    /// Downward pull given to characters (px/s²).
    pub gravity: f32,
    /// Horizontal speed of a fired bullet (px/s).
    pub bullet_speed: f32,
    pub bullet_damage: f32,
    /// Bullets are removed after this long even if they hit nothing.
    pub bullet_lifetime_ms: f32,
    pub crumble_damage: f32,
    pub crumble_duration_ms: f32,
    pub splatter_duration_ms: f32,
    /// Minimum time between two shots.
    pub shoot_cooldown_ms: f32,
    /// Minimum time between two butt attacks.
    pub butt_attack_cooldown_ms: f32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            fixed_timestep: 1.0 / 60.0,
            gravity: 1000.0,
            bullet_speed: 1500.0,
            bullet_damage: 20.0,
            bullet_lifetime_ms: 3000.0,
            crumble_damage: 20.0,
            crumble_duration_ms: 500.0,
            splatter_duration_ms: 500.0,
            shoot_cooldown_ms: 250.0,
            butt_attack_cooldown_ms: 500.0,
        }
    }
}

impl SimConfig {
    /// Parses a config from JSON. Absent fields keep their defaults.
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values the fixed-timestep loop cannot run with.
    pub fn validate(&self) -> Result<(), SimError> {
        if !(self.fixed_timestep.is_finite() && self.fixed_timestep > 0.0) {
            return Err(SimError::InvalidTimestep(self.fixed_timestep));
        }
        Ok(())
    }

    pub fn to_json(&self) -> Result<String, SimError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
