#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Delve simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. The geometry types and the [`NavGrid`] and
//! [`TagLookup`] seams are shared by the world and the steering systems so
//! neither depends on the other's internals.

pub mod config;

pub use glam::Vec2;

use serde::{Deserialize, Serialize};

pub use config::{
    CollisionTuning, ConfigError, FrictionPolicy, NoPathRetry, PathingTuning, SimulationConfig,
    SteeringTuning, WeaponTuning,
};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Spawns a new agent whose footprint is anchored at the provided top-left position.
    SpawnAgent {
        /// Role that determines the agent's capabilities.
        role: Role,
        /// Top-left corner of the agent's footprint in world units.
        position: Vec2,
    },
    /// Replaces the held input direction of an input-driven agent.
    Steer {
        /// Agent receiving the input.
        agent: AgentId,
        /// Raw direction; the zero vector releases all input.
        direction: Vec2,
    },
    /// Requests that an armed agent fires a projectile along its facing.
    Fire {
        /// Agent pulling the trigger.
        agent: AgentId,
    },
    /// Marks an agent for removal at the end of the next tick.
    RemoveAgent {
        /// Agent that should leave the level.
        agent: AgentId,
    },
    /// Advances the simulation by a single fixed tick.
    Tick,
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation advanced by one tick.
    TimeAdvanced {
        /// Index of the tick that just completed, starting at one.
        tick: u64,
    },
    /// Confirms that an agent entered the level.
    AgentSpawned {
        /// Identifier allocated to the new agent.
        agent: AgentId,
        /// Role assigned to the agent.
        role: Role,
        /// Top-left corner of the agent's footprint.
        position: Vec2,
    },
    /// Reports that a movement step was blocked by a solid region.
    AgentBumped {
        /// Agent whose body collided.
        agent: AgentId,
        /// Axis along which the collision was detected.
        axis: Axis,
    },
    /// Reports that a projectile struck a solid region and will be removed.
    ProjectileImpacted {
        /// Projectile that collided.
        agent: AgentId,
        /// Center of the projectile at the moment of impact.
        position: Vec2,
    },
    /// Confirms that an agent fired a projectile.
    ProjectileFired {
        /// Agent that fired.
        shooter: AgentId,
        /// Projectile spawned by the shot.
        projectile: AgentId,
    },
    /// Reports that a path follower adopted a fresh path.
    PathPlanned {
        /// Agent following the path.
        agent: AgentId,
        /// Number of cells in the adopted path.
        cells: usize,
    },
    /// Reports that a path request found no route to the goal.
    PathUnavailable {
        /// Agent whose request failed.
        agent: AgentId,
    },
    /// Confirms that a previously marked agent left the level.
    AgentRemoved {
        /// Identifier of the removed agent.
        agent: AgentId,
    },
}

/// Unique identifier assigned to an agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(u32);

impl AgentId {
    /// Creates a new agent identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Roles an agent can play within the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Input-driven agent steered by the adapter.
    Player,
    /// Autonomous agent that chases its quarry along planned paths.
    Hunter,
    /// Unsteered body travelling at constant velocity until it bumps.
    Projectile,
}

/// Movement axes resolved independently by motion bodies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Movement along the x axis.
    Horizontal,
    /// Movement along the y axis.
    Vertical,
}

/// Tags carried by static regions of the level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Tag {
    /// Blocks movement and line of sight.
    Solid,
}

/// Animation clip selected from an agent's velocity.
///
/// Leftward motion reuses the rightward clips; adapters mirror the sprite
/// using the agent's facing instead.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Clip {
    /// Moving toward decreasing y.
    Up,
    /// Moving diagonally toward decreasing y.
    UpRight,
    /// Moving horizontally.
    Right,
    /// Moving diagonally toward increasing y.
    DownRight,
    /// Moving toward increasing y.
    Down,
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two cell coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: CellCoord) -> u32 {
        self.column().abs_diff(other.column()) + self.row().abs_diff(other.row())
    }
}

/// Axis-aligned rectangle anchored at its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    position: Vec2,
    size: Vec2,
}

impl Aabb {
    /// Creates a rectangle from its top-left corner and dimensions.
    #[must_use]
    pub const fn new(position: Vec2, size: Vec2) -> Self {
        Self { position, size }
    }

    /// Creates a rectangle from scalar components.
    #[must_use]
    pub const fn from_xywh(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self::new(Vec2::new(x, y), Vec2::new(width, height))
    }

    /// Top-left corner of the rectangle.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Width and height of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Smallest x coordinate covered by the rectangle.
    #[must_use]
    pub fn left(&self) -> f32 {
        self.position.x
    }

    /// Largest x coordinate covered by the rectangle.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.position.x + self.size.x
    }

    /// Smallest y coordinate covered by the rectangle.
    #[must_use]
    pub fn top(&self) -> f32 {
        self.position.y
    }

    /// Largest y coordinate covered by the rectangle.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.position.y + self.size.y
    }

    /// Geometric center of the rectangle.
    #[must_use]
    pub fn center(&self) -> Vec2 {
        self.position + self.size * 0.5
    }

    /// Returns a copy of the rectangle shifted by the provided offset.
    #[must_use]
    pub fn translated(&self, offset: Vec2) -> Self {
        Self::new(self.position + offset, self.size)
    }

    /// Reports whether the two rectangles share interior area.
    ///
    /// Rectangles that merely touch along an edge do not overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }

    /// Reports whether the point lies inside the rectangle, edges inclusive.
    #[must_use]
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.left()
            && point.x <= self.right()
            && point.y >= self.top()
            && point.y <= self.bottom()
    }
}

/// Dimensions of the square tile grid shared by collision and navigation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridMetrics {
    columns: u32,
    rows: u32,
    tile_length: f32,
}

impl GridMetrics {
    /// Creates a new grid description.
    #[must_use]
    pub const fn new(columns: u32, rows: u32, tile_length: f32) -> Self {
        Self {
            columns,
            rows,
            tile_length,
        }
    }

    /// Number of columns contained in the grid.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the grid.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Side length of a single square tile expressed in world units.
    #[must_use]
    pub const fn tile_length(&self) -> f32 {
        self.tile_length
    }

    /// Total width of the grid measured in world units.
    #[must_use]
    pub fn width(&self) -> f32 {
        self.columns as f32 * self.tile_length
    }

    /// Total height of the grid measured in world units.
    #[must_use]
    pub fn height(&self) -> f32 {
        self.rows as f32 * self.tile_length
    }

    /// Reports whether the cell lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: CellCoord) -> bool {
        cell.column() < self.columns && cell.row() < self.rows
    }

    /// World-space center of the provided cell.
    #[must_use]
    pub fn cell_center(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            (cell.column() as f32 + 0.5) * self.tile_length,
            (cell.row() as f32 + 0.5) * self.tile_length,
        )
    }

    /// World-space top-left corner of the provided cell.
    #[must_use]
    pub fn cell_origin(&self, cell: CellCoord) -> Vec2 {
        Vec2::new(
            cell.column() as f32 * self.tile_length,
            cell.row() as f32 * self.tile_length,
        )
    }

    /// Rectangle covered by the provided cell.
    #[must_use]
    pub fn cell_bounds(&self, cell: CellCoord) -> Aabb {
        Aabb::new(self.cell_origin(cell), Vec2::splat(self.tile_length))
    }

    /// Cell containing the provided world position, if it lies within the grid.
    #[must_use]
    pub fn cell_at(&self, point: Vec2) -> Option<CellCoord> {
        if self.tile_length <= 0.0 || !point.x.is_finite() || !point.y.is_finite() {
            return None;
        }
        if point.x < 0.0 || point.y < 0.0 {
            return None;
        }

        let column = (point.x / self.tile_length).floor() as u32;
        let row = (point.y / self.tile_length).floor() as u32;
        let cell = CellCoord::new(column, row);
        self.contains(cell).then_some(cell)
    }

    /// Inclusive range of cells overlapped by the rectangle, clamped to the grid.
    ///
    /// Returns `None` when the rectangle lies entirely outside the grid.
    #[must_use]
    pub fn cell_span(&self, rect: &Aabb) -> Option<(CellCoord, CellCoord)> {
        if self.columns == 0 || self.rows == 0 || self.tile_length <= 0.0 {
            return None;
        }
        if rect.right() <= 0.0
            || rect.bottom() <= 0.0
            || rect.left() >= self.width()
            || rect.top() >= self.height()
        {
            return None;
        }

        let first_column = (rect.left().max(0.0) / self.tile_length).floor() as u32;
        let first_row = (rect.top().max(0.0) / self.tile_length).floor() as u32;
        // Edges that land exactly on a grid line belong to the previous cell.
        let last_column = ((rect.right() / self.tile_length).ceil() as u32)
            .saturating_sub(1)
            .min(self.columns - 1);
        let last_row = ((rect.bottom() / self.tile_length).ceil() as u32)
            .saturating_sub(1)
            .min(self.rows - 1);

        Some((
            CellCoord::new(first_column.min(last_column), first_row.min(last_row)),
            CellCoord::new(last_column, last_row),
        ))
    }
}

/// Read access to the tags attached to individual grid cells.
pub trait TagLookup {
    /// Reports whether any region tagged with `tag` covers part of the cell.
    fn cell_has_tag(&self, cell: CellCoord, tag: Tag) -> bool;
}

/// Path search service over a walkability grid.
pub trait NavGrid {
    /// Geometry shared with the collision index.
    fn metrics(&self) -> GridMetrics;

    /// Finds an ordered sequence of walkable cells leading from `start` to `goal`.
    ///
    /// Both positions are expressed in world units. The returned path begins
    /// with the cell containing `start` and ends with the cell containing
    /// `goal`. Returns `None` when no route exists.
    fn find_path(&self, start: Vec2, goal: Vec2, allow_diagonal: bool) -> Option<Vec<CellCoord>>;
}

/// Cells visited by a Bresenham line between two cells, both ends inclusive.
#[must_use]
pub fn cells_in_line(from: CellCoord, to: CellCoord) -> Vec<CellCoord> {
    let (mut x, mut y) = (i64::from(from.column()), i64::from(from.row()));
    let (end_x, end_y) = (i64::from(to.column()), i64::from(to.row()));
    let dx = (end_x - x).abs();
    let dy = -(end_y - y).abs();
    let step_x = if x < end_x { 1 } else { -1 };
    let step_y = if y < end_y { 1 } else { -1 };
    let mut error = dx + dy;

    let capacity = usize::try_from(dx.max(-dy) + 1).unwrap_or(1);
    let mut cells = Vec::with_capacity(capacity);

    loop {
        if let (Ok(column), Ok(row)) = (u32::try_from(x), u32::try_from(y)) {
            cells.push(CellCoord::new(column, row));
        }
        if x == end_x && y == end_y {
            break;
        }
        let doubled = 2 * error;
        if doubled >= dy {
            error += dy;
            x += step_x;
        }
        if doubled <= dx {
            error += dx;
            y += step_y;
        }
    }

    cells
}
