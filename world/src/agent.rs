//! Agents and the typed capabilities they carry.

use delve_core::{AgentId, NavGrid, Role, SimulationConfig, TagLookup, Vec2};
use delve_system_pathing::{Guidance, PathFollower};
use delve_system_steering::SteeringController;

use crate::body::MotionBody;

/// Source of an agent's desired direction.
#[derive(Clone, Debug)]
pub(crate) enum Pilot {
    /// Direction held by the adapter through steer commands.
    Input(Vec2),
    /// Direction produced by following paths toward the first agent with the quarry role.
    Pursuit {
        follower: PathFollower,
        quarry: Role,
    },
    /// No direction at all; the body keeps whatever velocity it was given.
    Inert,
}

/// What happens to an agent whose body collides with a solid region.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BumpReaction {
    /// The blocked axis stops and the agent carries on.
    Stop,
    /// The agent is marked for removal at the end of the tick.
    Despawn,
}

/// Simulated agent with its capability set.
#[derive(Clone, Debug)]
pub(crate) struct Agent {
    pub(crate) id: AgentId,
    pub(crate) role: Role,
    pub(crate) body: MotionBody,
    pub(crate) steering: Option<SteeringController>,
    pub(crate) pilot: Pilot,
    pub(crate) on_bump: BumpReaction,
    pub(crate) armed: bool,
    pub(crate) marked_for_removal: bool,
}

impl Agent {
    /// Builds an agent with the capabilities its role grants.
    pub(crate) fn spawn(
        id: AgentId,
        role: Role,
        position: Vec2,
        config: &SimulationConfig,
    ) -> Self {
        let agent_size = Vec2::splat(config.agent_size);
        match role {
            Role::Player => Self {
                id,
                role,
                body: MotionBody::new(position, agent_size),
                steering: Some(SteeringController::new(config.player)),
                pilot: Pilot::Input(Vec2::ZERO),
                on_bump: BumpReaction::Stop,
                armed: true,
                marked_for_removal: false,
            },
            Role::Hunter => Self {
                id,
                role,
                body: MotionBody::new(position, agent_size),
                steering: Some(SteeringController::new(config.hunter)),
                pilot: Pilot::Pursuit {
                    follower: PathFollower::new(config.pathing),
                    quarry: Role::Player,
                },
                on_bump: BumpReaction::Stop,
                armed: false,
                marked_for_removal: false,
            },
            Role::Projectile => Self {
                id,
                role,
                body: MotionBody::new(position, Vec2::splat(config.weapon.projectile_size)),
                steering: None,
                pilot: Pilot::Inert,
                on_bump: BumpReaction::Despawn,
                armed: false,
                marked_for_removal: false,
            },
        }
    }

    /// Role whose position this agent's pilot tracks.
    pub(crate) fn quarry(&self) -> Option<Role> {
        match &self.pilot {
            Pilot::Pursuit { quarry, .. } => Some(*quarry),
            Pilot::Input(_) | Pilot::Inert => None,
        }
    }

    /// Asks the pilot for this tick's guidance.
    pub(crate) fn think<N, T>(&mut self, quarry: Option<Vec2>, nav: &N, tags: &T) -> Guidance
    where
        N: NavGrid + ?Sized,
        T: TagLookup + ?Sized,
    {
        match &mut self.pilot {
            Pilot::Input(direction) => Guidance {
                direction: *direction,
                halt: false,
                plan: None,
            },
            Pilot::Pursuit { follower, .. } => {
                follower.update(self.body.center(), quarry, nav, tags)
            }
            Pilot::Inert => Guidance {
                direction: Vec2::ZERO,
                halt: false,
                plan: None,
            },
        }
    }

    /// Facing used when the agent fires.
    pub(crate) fn facing(&self) -> Option<Vec2> {
        self.steering.as_ref().map(SteeringController::facing)
    }

    pub(crate) fn follower(&self) -> Option<&PathFollower> {
        match &self.pilot {
            Pilot::Pursuit { follower, .. } => Some(follower),
            Pilot::Input(_) | Pilot::Inert => None,
        }
    }
}
