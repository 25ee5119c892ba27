//! Tuning knobs consumed by the world and the steering systems.
//!
//! Every value has a default matching the behaviour the simulation was
//! balanced around, and the whole bundle can be deserialised from a TOML
//! document by adapters. [`SimulationConfig::validate`] rejects values that
//! would make the physics degenerate.

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

const DEFAULT_FRICTION: f32 = 0.25;
const DEFAULT_ACCELERATION: f32 = 0.5;
const DEFAULT_MAX_SPEED: f32 = 2.0;

/// How friction bleeds speed from a moving body each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrictionPolicy {
    /// Subtracts the friction amount from each axis independently.
    PerAxis,
    /// Shrinks the velocity's magnitude by the friction amount, keeping its direction.
    Magnitude,
}

/// Integration constants applied by a steering controller.
///
/// Configuration tables only need to name the values they change; the rest
/// come from the tuning of the role the table belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SteeringTuning {
    /// Speed removed every tick.
    pub friction: f32,
    /// Speed added every tick along the desired direction.
    pub acceleration: f32,
    /// Upper bound on the velocity's magnitude.
    pub max_speed: f32,
    /// Policy used when applying friction.
    pub friction_policy: FrictionPolicy,
}

impl SteeringTuning {
    /// Tuning used by input-driven agents: friction shrinks the speed magnitude.
    #[must_use]
    pub const fn player() -> Self {
        Self {
            friction: DEFAULT_FRICTION,
            acceleration: DEFAULT_ACCELERATION,
            max_speed: DEFAULT_MAX_SPEED,
            friction_policy: FrictionPolicy::Magnitude,
        }
    }

    /// Tuning used by path-following agents: friction applies per axis.
    #[must_use]
    pub const fn hunter() -> Self {
        Self {
            friction: DEFAULT_FRICTION,
            acceleration: DEFAULT_ACCELERATION,
            max_speed: DEFAULT_MAX_SPEED,
            friction_policy: FrictionPolicy::PerAxis,
        }
    }

    fn overridden_by(self, overrides: SteeringOverrides) -> Self {
        Self {
            friction: overrides.friction.unwrap_or(self.friction),
            acceleration: overrides.acceleration.unwrap_or(self.acceleration),
            max_speed: overrides.max_speed.unwrap_or(self.max_speed),
            friction_policy: overrides.friction_policy.unwrap_or(self.friction_policy),
        }
    }

    fn validate(&self, owner: &'static str) -> Result<(), ConfigError> {
        non_negative(owner, "friction", self.friction)?;
        non_negative(owner, "acceleration", self.acceleration)?;
        positive(owner, "max_speed", self.max_speed)
    }
}

/// What a path follower does after a path request fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoPathRetry {
    /// Issues another request on the very next tick.
    EveryTick,
    /// Idles until the replanning countdown next expires.
    AtReplan,
}

/// Parameters governing path following.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathingTuning {
    /// Ticks between forced path refreshes.
    pub replan_interval: u32,
    /// Distance under which the current path cell counts as reached.
    pub arrival_radius: f32,
    /// Whether arrivals may skip ahead to cells reachable in a straight line.
    pub lookahead: bool,
    /// Whether a lookahead skip stops the body before steering toward the new cell.
    pub halt_on_skip: bool,
    /// Whether path requests may use diagonal moves.
    pub allow_diagonal: bool,
    /// Retry behaviour after a failed request.
    pub retry: NoPathRetry,
}

impl Default for PathingTuning {
    fn default() -> Self {
        Self {
            replan_interval: 30,
            arrival_radius: 4.0,
            lookahead: true,
            halt_on_skip: false,
            allow_diagonal: false,
            retry: NoPathRetry::AtReplan,
        }
    }
}

/// Parameters governing collision response.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionTuning {
    /// Whether blocked bodies may slide around corners they barely graze.
    pub allow_slide: bool,
    /// Largest perpendicular correction accepted as a slide.
    pub slide_threshold: f32,
}

impl Default for CollisionTuning {
    fn default() -> Self {
        Self {
            allow_slide: true,
            slide_threshold: 4.0,
        }
    }
}

/// Parameters describing projectiles fired by armed agents.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeaponTuning {
    /// Distance travelled by a projectile every tick.
    pub projectile_speed: f32,
    /// Side length of the projectile's square footprint.
    pub projectile_size: f32,
}

impl Default for WeaponTuning {
    fn default() -> Self {
        Self {
            projectile_speed: 4.0,
            projectile_size: 4.0,
        }
    }
}

/// Complete configuration bundle for a simulation run.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Side length of a level tile in world units.
    pub tile_length: f32,
    /// Side length of the square footprint used by players and hunters.
    pub agent_size: f32,
    /// Steering applied to input-driven agents.
    #[serde(deserialize_with = "player_steering")]
    pub player: SteeringTuning,
    /// Steering applied to path-following agents.
    #[serde(deserialize_with = "hunter_steering")]
    pub hunter: SteeringTuning,
    /// Path following parameters shared by every hunter.
    pub pathing: PathingTuning,
    /// Collision response shared by every body.
    pub collision: CollisionTuning,
    /// Projectile parameters shared by every armed agent.
    pub weapon: WeaponTuning,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            tile_length: 16.0,
            agent_size: 8.0,
            player: SteeringTuning::player(),
            hunter: SteeringTuning::hunter(),
            pathing: PathingTuning::default(),
            collision: CollisionTuning::default(),
            weapon: WeaponTuning::default(),
        }
    }
}

impl SimulationConfig {
    /// Checks that every value keeps the simulation well defined.
    pub fn validate(&self) -> Result<(), ConfigError> {
        positive("simulation", "tile_length", self.tile_length)?;
        positive("simulation", "agent_size", self.agent_size)?;
        if self.agent_size > self.tile_length {
            return Err(ConfigError::AgentLargerThanTile {
                agent_size: self.agent_size,
                tile_length: self.tile_length,
            });
        }
        self.player.validate("player")?;
        self.hunter.validate("hunter")?;
        if self.pathing.replan_interval == 0 {
            return Err(ConfigError::ZeroReplanInterval);
        }
        non_negative("pathing", "arrival_radius", self.pathing.arrival_radius)?;
        non_negative("collision", "slide_threshold", self.collision.slide_threshold)?;
        positive("weapon", "projectile_speed", self.weapon.projectile_speed)?;
        positive("weapon", "projectile_size", self.weapon.projectile_size)
    }
}

/// Reasons a configuration bundle may be rejected.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// A value that must be strictly positive was not.
    #[error("{section}.{field} must be positive (received {value})")]
    NotPositive {
        /// Section that owns the value.
        section: &'static str,
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// A value that must not be negative was.
    #[error("{section}.{field} must not be negative (received {value})")]
    Negative {
        /// Section that owns the value.
        section: &'static str,
        /// Name of the offending field.
        field: &'static str,
        /// Rejected value.
        value: f32,
    },
    /// The replanning interval was zero.
    #[error("pathing.replan_interval must be at least one tick")]
    ZeroReplanInterval,
    /// Agents would not fit through single-tile corridors.
    #[error("agent_size {agent_size} exceeds tile_length {tile_length}")]
    AgentLargerThanTile {
        /// Configured agent footprint.
        agent_size: f32,
        /// Configured tile length.
        tile_length: f32,
    },
}

fn positive(section: &'static str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            section,
            field,
            value,
        })
    }
}

fn non_negative(section: &'static str, field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            section,
            field,
            value,
        })
    }
}

/// Steering values named by a configuration table.
#[derive(Debug, Deserialize)]
struct SteeringOverrides {
    friction: Option<f32>,
    acceleration: Option<f32>,
    max_speed: Option<f32>,
    friction_policy: Option<FrictionPolicy>,
}

fn player_steering<'de, D>(deserializer: D) -> Result<SteeringTuning, D::Error>
where
    D: Deserializer<'de>,
{
    SteeringOverrides::deserialize(deserializer)
        .map(|overrides| SteeringTuning::player().overridden_by(overrides))
}

fn hunter_steering<'de, D>(deserializer: D) -> Result<SteeringTuning, D::Error>
where
    D: Deserializer<'de>,
{
    SteeringOverrides::deserialize(deserializer)
        .map(|overrides| SteeringTuning::hunter().overridden_by(overrides))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(SimulationConfig::default().validate(), Ok(()));
    }

    #[test]
    fn player_and_hunter_differ_only_in_friction_policy() {
        let player = SteeringTuning::player();
        let hunter = SteeringTuning::hunter();
        assert_eq!(player.friction, hunter.friction);
        assert_eq!(player.acceleration, hunter.acceleration);
        assert_eq!(player.max_speed, hunter.max_speed);
        assert_ne!(player.friction_policy, hunter.friction_policy);
    }

    #[test]
    fn partial_toml_keeps_unspecified_defaults() {
        let config: SimulationConfig = toml::from_str(
            r#"
            [hunter]
            max_speed = 1.5
            friction_policy = "magnitude"

            [pathing]
            replan_interval = 3000
            retry = "every_tick"
            "#,
        )
        .expect("config parses");

        assert_eq!(config.hunter.max_speed, 1.5);
        assert_eq!(config.hunter.friction, DEFAULT_FRICTION);
        assert_eq!(config.hunter.friction_policy, FrictionPolicy::Magnitude);
        assert_eq!(config.pathing.replan_interval, 3000);
        assert_eq!(config.pathing.retry, NoPathRetry::EveryTick);
        assert_eq!(config.pathing.arrival_radius, 4.0);
        assert_eq!(config.player, SteeringTuning::player());
    }

    #[test]
    fn partial_steering_table_keeps_role_defaults() {
        let config: SimulationConfig =
            toml::from_str("[player]\nmax_speed = 3.0\n").expect("config parses");

        assert_eq!(config.player.max_speed, 3.0);
        assert_eq!(config.player.friction, DEFAULT_FRICTION);
        assert_eq!(config.player.acceleration, DEFAULT_ACCELERATION);
        assert_eq!(config.player.friction_policy, FrictionPolicy::Magnitude);
        assert_eq!(config.hunter, SteeringTuning::hunter());

        let config: SimulationConfig =
            toml::from_str("[hunter]\nfriction = 0.5\n").expect("config parses");
        assert_eq!(config.hunter.friction, 0.5);
        assert_eq!(config.hunter.friction_policy, FrictionPolicy::PerAxis);
    }

    #[test]
    fn validation_rejects_degenerate_values() {
        let mut config = SimulationConfig::default();
        config.pathing.replan_interval = 0;
        assert_eq!(config.validate(), Err(ConfigError::ZeroReplanInterval));

        let mut config = SimulationConfig::default();
        config.hunter.max_speed = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NotPositive {
                section: "hunter",
                field: "max_speed",
                ..
            })
        ));

        let mut config = SimulationConfig::default();
        config.agent_size = 20.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::AgentLargerThanTile { .. })
        ));
    }
}
