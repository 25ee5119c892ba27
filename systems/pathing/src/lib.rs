#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Path following for autonomous agents.
//!
//! A [`PathFollower`] leases paths from a [`NavGrid`], walks a cursor along
//! the returned cells, and turns the cell under the cursor into a desired
//! direction for the agent's steering controller. Paths are refreshed on a
//! fixed countdown so a moving quarry or a stale route never strands the
//! agent, and arrivals may skip ahead to any later cell visible along a
//! straight, solid-free line of cells.

use delve_core::{
    cells_in_line, CellCoord, NavGrid, NoPathRetry, PathingTuning, Tag, TagLookup, Vec2,
};

/// Whether a follower currently holds a path.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FollowState {
    /// No path is leased; the agent idles until a request succeeds.
    NoPath,
    /// A path is leased and its cursor names the cell being approached.
    Following,
}

/// Ordered cells returned by a path request plus the cursor walking them.
///
/// The cursor only ever moves forward. Replanning replaces the whole path.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Path {
    cells: Vec<CellCoord>,
    cursor: usize,
}

impl Path {
    /// Wraps the provided cells in a path positioned at the first cell.
    ///
    /// Returns `None` for an empty sequence.
    #[must_use]
    pub fn new(cells: Vec<CellCoord>) -> Option<Self> {
        if cells.is_empty() {
            return None;
        }
        Some(Self { cells, cursor: 0 })
    }

    /// Cells composing the path from start to goal.
    #[must_use]
    pub fn cells(&self) -> &[CellCoord] {
        &self.cells
    }

    /// Index of the cell currently being approached.
    #[must_use]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Cell currently being approached.
    #[must_use]
    pub fn current(&self) -> Option<CellCoord> {
        self.cells.get(self.cursor).copied()
    }

    /// Number of cells in the path.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Reports whether the path holds no cells.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Reports whether the cursor rests on the final cell.
    #[must_use]
    pub fn is_at_end(&self) -> bool {
        self.cursor + 1 >= self.cells.len()
    }

    fn advance(&mut self) {
        if !self.is_at_end() {
            self.cursor += 1;
        }
    }

    fn jump_to(&mut self, index: usize) {
        debug_assert!(index > self.cursor, "path cursor must never move backward");
        if index > self.cursor && index < self.cells.len() {
            self.cursor = index;
        }
    }
}

/// Result of a path request issued during an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PlanOutcome {
    /// A path was adopted at cursor zero.
    Planned {
        /// Number of cells in the adopted path.
        cells: usize,
    },
    /// The navigation grid reported no route to the goal.
    Unavailable,
}

/// Steering input produced by a single follower update.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Guidance {
    /// Unit vector toward the cell under the cursor, or zero when idle.
    pub direction: Vec2,
    /// Whether the body should shed its velocity before steering.
    pub halt: bool,
    /// Outcome of the path request issued this tick, if any.
    pub plan: Option<PlanOutcome>,
}

impl Guidance {
    const IDLE: Self = Self {
        direction: Vec2::ZERO,
        halt: false,
        plan: None,
    };
}

/// Path-following state machine owned by an autonomous agent.
#[derive(Clone, Debug)]
pub struct PathFollower {
    tuning: PathingTuning,
    path: Option<Path>,
    goal: Option<Vec2>,
    replan_countdown: u32,
    needs_plan: bool,
}

impl PathFollower {
    /// Creates a follower that requests its first path on the next update.
    #[must_use]
    pub fn new(tuning: PathingTuning) -> Self {
        Self {
            tuning,
            path: None,
            goal: None,
            replan_countdown: tuning.replan_interval,
            needs_plan: true,
        }
    }

    /// Current state of the follower.
    #[must_use]
    pub fn state(&self) -> FollowState {
        if self.path.is_some() {
            FollowState::Following
        } else {
            FollowState::NoPath
        }
    }

    /// Path currently leased by the follower.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_ref()
    }

    /// Last goal position observed, kept after the quarry disappears.
    #[must_use]
    pub fn goal(&self) -> Option<Vec2> {
        self.goal
    }

    /// Ticks left before the next forced replan.
    #[must_use]
    pub fn replan_countdown(&self) -> u32 {
        self.replan_countdown
    }

    /// Advances the follower by one tick.
    ///
    /// `center` is the agent's current center and `quarry` the tracked
    /// target's center when one exists. The returned [`Guidance`] carries the
    /// desired direction and reports any path request issued along the way.
    pub fn update<N, T>(
        &mut self,
        center: Vec2,
        quarry: Option<Vec2>,
        nav: &N,
        tags: &T,
    ) -> Guidance
    where
        N: NavGrid + ?Sized,
        T: TagLookup + ?Sized,
    {
        if let Some(position) = quarry {
            self.goal = Some(position);
        }

        let mut guidance = Guidance::IDLE;

        self.replan_countdown = self.replan_countdown.saturating_sub(1);
        if self.replan_countdown == 0 {
            self.needs_plan = true;
        }
        if self.needs_plan {
            guidance.plan = self.request(center, nav);
        }

        let Some(mut path) = self.path.take() else {
            return guidance;
        };
        let metrics = nav.metrics();

        let Some(mut cell) = path.current() else {
            guidance.plan = self.request(center, nav).or(guidance.plan);
            return guidance;
        };

        let offset = metrics.cell_center(cell) - center;
        if offset.length() <= self.tuning.arrival_radius {
            if !path.is_at_end() {
                path.advance();
                if self.tuning.lookahead && skip_ahead(&mut path, tags) {
                    guidance.halt = self.tuning.halt_on_skip;
                }
                if let Some(next) = path.current() {
                    cell = next;
                }
            } else if guidance.plan.is_none() {
                // A path planned this tick is kept even when it is already exhausted.
                guidance.plan = self.request(center, nav);
                guidance.direction = self.direction_from(center, nav);
                return guidance;
            }
        }

        guidance.direction = (metrics.cell_center(cell) - center).normalize_or_zero();
        self.path = Some(path);
        guidance
    }

    fn request<N>(&mut self, center: Vec2, nav: &N) -> Option<PlanOutcome>
    where
        N: NavGrid + ?Sized,
    {
        self.replan_countdown = self.tuning.replan_interval;
        self.path = None;

        let Some(goal) = self.goal else {
            self.needs_plan = self.tuning.retry == NoPathRetry::EveryTick;
            return None;
        };

        match nav
            .find_path(center, goal, self.tuning.allow_diagonal)
            .and_then(Path::new)
        {
            Some(path) => {
                let cells = path.len();
                self.path = Some(path);
                self.needs_plan = false;
                Some(PlanOutcome::Planned { cells })
            }
            None => {
                self.needs_plan = self.tuning.retry == NoPathRetry::EveryTick;
                Some(PlanOutcome::Unavailable)
            }
        }
    }

    fn direction_from<N>(&self, center: Vec2, nav: &N) -> Vec2
    where
        N: NavGrid + ?Sized,
    {
        self.path
            .as_ref()
            .and_then(Path::current)
            .map_or(Vec2::ZERO, |cell| {
                (nav.metrics().cell_center(cell) - center).normalize_or_zero()
            })
    }
}

/// Moves the cursor to the farthest cell visible from the cursor cell.
///
/// Returns `true` when the cursor moved.
fn skip_ahead<T>(path: &mut Path, tags: &T) -> bool
where
    T: TagLookup + ?Sized,
{
    let Some(start) = path.current() else {
        return false;
    };

    for index in (path.cursor() + 1..path.len()).rev() {
        let end = path.cells()[index];
        if end == start {
            break;
        }

        let clear = cells_in_line(start, end)
            .into_iter()
            .all(|cell| !tags.cell_has_tag(cell, Tag::Solid));
        if clear {
            path.jump_to(index);
            return true;
        }
    }

    false
}
