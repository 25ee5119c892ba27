#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Delve.
//!
//! The world owns the level's static geometry, the walkability grid and every
//! agent. Adapters and systems mutate it exclusively through [`apply`] and read
//! it through the [`query`] module.

mod agent;
pub mod body;
pub mod collision;
pub mod layout;
pub mod navigation;

use delve_core::{
    AgentId, Command, ConfigError, Event, GridMetrics, Role, SimulationConfig, Tag, Vec2,
};
use delve_system_pathing::PlanOutcome;
use tracing::{debug, trace};

use agent::{Agent, BumpReaction, Pilot};
use collision::SpatialIndex;
use layout::LevelLayout;
use navigation::WalkGrid;

/// Represents the authoritative Delve world state.
#[derive(Debug)]
pub struct World {
    metrics: GridMetrics,
    index: SpatialIndex,
    nav: WalkGrid,
    config: SimulationConfig,
    agents: Vec<Agent>,
    next_agent_id: u32,
    tick_index: u64,
}

impl World {
    /// Builds a world from a parsed layout and a configuration bundle.
    ///
    /// The configuration is validated first; the layout contributes one solid
    /// region per wall tile and the walkability grid for path searches.
    pub fn new(layout: &LevelLayout, config: SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let metrics = layout.metrics(config.tile_length);
        let mut index = SpatialIndex::new(metrics);
        for region in layout.solid_regions(config.tile_length) {
            index.insert(region, Tag::Solid);
        }
        let nav = WalkGrid::build_with(metrics, |cell| layout.is_floor(cell));

        debug!(
            columns = metrics.columns(),
            rows = metrics.rows(),
            solids = index.regions().len(),
            "world constructed"
        );

        Ok(Self {
            metrics,
            index,
            nav,
            config,
            agents: Vec::new(),
            next_agent_id: 0,
            tick_index: 0,
        })
    }

    fn allocate_agent_id(&mut self) -> AgentId {
        let id = AgentId::new(self.next_agent_id);
        self.next_agent_id = self.next_agent_id.wrapping_add(1);
        id
    }

    fn agent(&self, id: AgentId) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == id)
    }

    fn agent_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.iter_mut().find(|agent| agent.id == id)
    }

    fn spawn(
        &mut self,
        role: Role,
        position: Vec2,
        velocity: Vec2,
        out_events: &mut Vec<Event>,
    ) -> AgentId {
        let id = self.allocate_agent_id();
        let mut agent = Agent::spawn(id, role, position, &self.config);
        agent.body.set_velocity(velocity);
        self.agents.push(agent);

        debug!(agent = id.get(), ?role, x = position.x, y = position.y, "agent spawned");
        out_events.push(Event::AgentSpawned {
            agent: id,
            role,
            position,
        });
        id
    }

    fn fire(&mut self, shooter: AgentId, out_events: &mut Vec<Event>) {
        let Some(agent) = self.agent(shooter) else {
            return;
        };
        if !agent.armed || agent.marked_for_removal {
            return;
        }
        let Some(facing) = agent.facing() else {
            return;
        };

        let size = self.config.weapon.projectile_size;
        let position = agent.body.center() - Vec2::splat(size * 0.5);
        let velocity = facing * self.config.weapon.projectile_speed;

        let projectile = self.spawn(Role::Projectile, position, velocity, out_events);
        out_events.push(Event::ProjectileFired {
            shooter,
            projectile,
        });
    }

    fn step_agents(&mut self, out_events: &mut Vec<Event>) {
        let Self {
            index,
            nav,
            config,
            agents,
            ..
        } = self;

        for slot in 0..agents.len() {
            let quarry = agents[slot].quarry().and_then(|role| {
                agents
                    .iter()
                    .find(|candidate| candidate.role == role)
                    .map(|candidate| candidate.body.center())
            });

            let agent = &mut agents[slot];
            let guidance = agent.think(quarry, &*nav, &*index);

            match guidance.plan {
                Some(PlanOutcome::Planned { cells }) => {
                    debug!(agent = agent.id.get(), cells, "path planned");
                    out_events.push(Event::PathPlanned {
                        agent: agent.id,
                        cells,
                    });
                }
                Some(PlanOutcome::Unavailable) => {
                    debug!(agent = agent.id.get(), "no path to goal");
                    out_events.push(Event::PathUnavailable { agent: agent.id });
                }
                None => {}
            }

            if guidance.halt {
                agent.body.set_velocity(Vec2::ZERO);
            }
            if let Some(steering) = agent.steering.as_mut() {
                let velocity = steering.integrate(agent.body.velocity(), guidance.direction);
                agent.body.set_velocity(velocity);
            }

            let outcome = agent.body.resolve_step(index, &config.collision);
            for axis in &outcome.bumps {
                trace!(agent = agent.id.get(), ?axis, "agent bumped");
                out_events.push(Event::AgentBumped {
                    agent: agent.id,
                    axis: *axis,
                });
            }

            if outcome.bumped()
                && agent.on_bump == BumpReaction::Despawn
                && !agent.marked_for_removal
            {
                agent.marked_for_removal = true;
                out_events.push(Event::ProjectileImpacted {
                    agent: agent.id,
                    position: agent.body.center(),
                });
            }
        }
    }

    fn flush_removals(&mut self, out_events: &mut Vec<Event>) {
        let mut removed = Vec::new();
        self.agents.retain(|agent| {
            if agent.marked_for_removal {
                removed.push(agent.id);
                false
            } else {
                true
            }
        });

        for agent in removed {
            debug!(agent = agent.get(), "agent removed");
            out_events.push(Event::AgentRemoved { agent });
        }
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::SpawnAgent { role, position } => {
            let _ = world.spawn(role, position, Vec2::ZERO, out_events);
        }
        Command::Steer { agent, direction } => {
            let Some(target) = world.agent_mut(agent) else {
                return;
            };
            match &mut target.pilot {
                Pilot::Input(held) => *held = direction,
                Pilot::Pursuit { .. } | Pilot::Inert => {
                    trace!(agent = agent.get(), "steer ignored for autonomous agent");
                }
            }
        }
        Command::Fire { agent } => world.fire(agent, out_events),
        Command::RemoveAgent { agent } => {
            if let Some(target) = world.agent_mut(agent) {
                target.marked_for_removal = true;
            }
        }
        Command::Tick => {
            world.tick_index = world.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced {
                tick: world.tick_index,
            });
            world.step_agents(out_events);
            world.flush_removals(out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use delve_core::{Aabb, AgentId, CellCoord, GridMetrics, Role, SimulationConfig, Vec2};
    use delve_system_pathing::FollowState;
    use delve_system_steering::Pose;

    use super::{collision::SolidRegion, Agent, SpatialIndex, WalkGrid, World};

    /// Number of ticks simulated so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Geometry of the level grid.
    #[must_use]
    pub fn metrics(world: &World) -> GridMetrics {
        world.metrics
    }

    /// Configuration the world was built with.
    #[must_use]
    pub fn config(world: &World) -> &SimulationConfig {
        &world.config
    }

    /// Static solid regions in insertion order.
    #[must_use]
    pub fn solids(world: &World) -> &[SolidRegion] {
        world.index.regions()
    }

    /// Spatial index answering collision and tag queries.
    #[must_use]
    pub fn spatial_index(world: &World) -> &SpatialIndex {
        &world.index
    }

    /// Walkability grid used by path followers.
    #[must_use]
    pub fn walk_grid(world: &World) -> &WalkGrid {
        &world.nav
    }

    /// Top-left position that centers an agent footprint on the provided cell.
    #[must_use]
    pub fn spawn_position(world: &World, cell: CellCoord) -> Vec2 {
        world.metrics.cell_center(cell) - Vec2::splat(world.config.agent_size * 0.5)
    }

    /// Identifier of the first agent, in spawn order, playing `role`.
    #[must_use]
    pub fn first_with_role(world: &World, role: Role) -> Option<AgentId> {
        world
            .agents
            .iter()
            .find(|agent| agent.role == role)
            .map(|agent| agent.id)
    }

    /// Snapshot of a single agent.
    #[must_use]
    pub fn agent(world: &World, id: AgentId) -> Option<AgentSnapshot> {
        world.agent(id).map(snapshot)
    }

    /// Captures a read-only view of every agent in spawn order.
    #[must_use]
    pub fn agent_view(world: &World) -> AgentView {
        AgentView {
            snapshots: world.agents.iter().map(snapshot).collect(),
        }
    }

    /// Read-only snapshot describing all agents in the level.
    #[derive(Clone, Debug, PartialEq)]
    pub struct AgentView {
        snapshots: Vec<AgentSnapshot>,
    }

    impl AgentView {
        /// Iterator over the captured snapshots in spawn order.
        pub fn iter(&self) -> impl Iterator<Item = &AgentSnapshot> {
            self.snapshots.iter()
        }

        /// Consumes the view, yielding the underlying snapshots.
        #[must_use]
        pub fn into_vec(self) -> Vec<AgentSnapshot> {
            self.snapshots
        }

        /// Number of agents captured by the view.
        #[must_use]
        pub fn len(&self) -> usize {
            self.snapshots.len()
        }

        /// Reports whether the view holds no agents.
        #[must_use]
        pub fn is_empty(&self) -> bool {
            self.snapshots.is_empty()
        }
    }

    /// Path progress of a path-following agent.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct PathProgress {
        /// Cells of the leased path.
        pub cells: Vec<CellCoord>,
        /// Index of the cell being approached.
        pub cursor: usize,
    }

    /// Read-only snapshot of an agent.
    #[derive(Clone, Debug, PartialEq)]
    pub struct AgentSnapshot {
        /// Identifier of the agent.
        pub id: AgentId,
        /// Role played by the agent.
        pub role: Role,
        /// Rectangle covered by the agent's body.
        pub bounds: Aabb,
        /// Velocity carried into the next tick.
        pub velocity: Vec2,
        /// Presentation state of steered agents.
        pub pose: Option<Pose>,
        /// Follower state of path-following agents.
        pub follow_state: Option<FollowState>,
        /// Path currently leased by path-following agents.
        pub path: Option<PathProgress>,
        /// Whether the agent leaves the level at the end of the current tick.
        pub marked_for_removal: bool,
    }

    fn snapshot(agent: &Agent) -> AgentSnapshot {
        let follower = agent.follower();
        AgentSnapshot {
            id: agent.id,
            role: agent.role,
            bounds: agent.body.bounds(),
            velocity: agent.body.velocity(),
            pose: agent.steering.as_ref().map(|steering| steering.pose()),
            follow_state: follower.map(|follower| follower.state()),
            path: follower
                .and_then(|follower| follower.path())
                .map(|path| PathProgress {
                    cells: path.cells().to_vec(),
                    cursor: path.cursor(),
                }),
            marked_for_removal: agent.marked_for_removal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_core::{Axis, CellCoord};

    const ROOM: &str = "\
#######
#.....#
#.....#
#.....#
#######
";

    fn world() -> World {
        let layout = LevelLayout::parse(ROOM).expect("room parses");
        World::new(&layout, SimulationConfig::default()).expect("defaults validate")
    }

    fn spawn(world: &mut World, role: Role, cell: CellCoord) -> AgentId {
        let mut events = Vec::new();
        let position = query::spawn_position(world, cell);
        apply(world, Command::SpawnAgent { role, position }, &mut events);
        match events.as_slice() {
            [Event::AgentSpawned { agent, .. }] => *agent,
            other => panic!("unexpected events {other:?}"),
        }
    }

    #[test]
    fn new_rejects_invalid_config() {
        let layout = LevelLayout::parse(ROOM).expect("room parses");
        let mut config = SimulationConfig::default();
        config.pathing.replan_interval = 0;
        assert_eq!(
            World::new(&layout, config).err(),
            Some(ConfigError::ZeroReplanInterval)
        );
    }

    #[test]
    fn spawn_allocates_sequential_ids() {
        let mut world = world();
        let first = spawn(&mut world, Role::Player, CellCoord::new(1, 1));
        let second = spawn(&mut world, Role::Hunter, CellCoord::new(4, 2));

        assert_eq!(first, AgentId::new(0));
        assert_eq!(second, AgentId::new(1));
        assert_eq!(query::first_with_role(&world, Role::Hunter), Some(second));
        assert_eq!(
            query::agent(&world, first).map(|agent| agent.bounds),
            Some(delve_core::Aabb::from_xywh(20.0, 20.0, 8.0, 8.0))
        );
    }

    #[test]
    fn removal_is_deferred_to_end_of_tick() {
        let mut world = world();
        let player = spawn(&mut world, Role::Player, CellCoord::new(1, 1));

        let mut events = Vec::new();
        apply(&mut world, Command::RemoveAgent { agent: player }, &mut events);
        assert!(events.is_empty());
        assert!(query::agent(&world, player).is_some_and(|agent| agent.marked_for_removal));

        apply(&mut world, Command::Tick, &mut events);
        assert_eq!(
            events,
            vec![
                Event::TimeAdvanced { tick: 1 },
                Event::AgentRemoved { agent: player },
            ]
        );
        assert!(query::agent(&world, player).is_none());
    }

    #[test]
    fn steering_moves_player_and_walls_stop_it() {
        let mut world = world();
        let player = spawn(&mut world, Role::Player, CellCoord::new(1, 1));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Steer {
                agent: player,
                direction: Vec2::new(-1.0, 0.0),
            },
            &mut events,
        );

        for _ in 0..10 {
            apply(&mut world, Command::Tick, &mut events);
        }

        let snapshot = query::agent(&world, player).expect("player present");
        assert_eq!(snapshot.bounds.left(), 16.0);
        assert!(events.contains(&Event::AgentBumped {
            agent: player,
            axis: Axis::Horizontal,
        }));
        let pose = snapshot.pose.expect("player is steered");
        assert!(pose.mirrored);
    }

    #[test]
    fn steer_is_ignored_for_hunters() {
        let mut world = world();
        let hunter = spawn(&mut world, Role::Hunter, CellCoord::new(3, 2));
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::Steer {
                agent: hunter,
                direction: Vec2::X,
            },
            &mut events,
        );
        apply(&mut world, Command::Tick, &mut events);

        let snapshot = query::agent(&world, hunter).expect("hunter present");
        assert_eq!(snapshot.velocity, Vec2::ZERO);
        assert_eq!(
            snapshot.follow_state,
            Some(delve_system_pathing::FollowState::NoPath)
        );
    }
}
