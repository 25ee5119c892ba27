#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure bootstrap system that populates a freshly built level.
//!
//! Spawn markers in the layout are honoured first. A missing player is placed
//! on a random floor cell, and extra hunters are scattered over the remaining
//! floor, preferring cells far from the player. All randomness comes from a
//! seeded [`ChaCha8Rng`] so a seed always yields the same population.

use delve_core::{CellCoord, Command, Role};
use delve_world::{layout::LevelLayout, query, World};
use rand::{seq::SliceRandom, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Minimum Manhattan distance, in cells, kept between the player and scattered hunters.
pub const HUNTER_STANDOFF: u32 = 6;

/// Emits the spawn commands that populate a level.
#[derive(Debug)]
pub struct Bootstrap {
    rng: ChaCha8Rng,
}

impl Bootstrap {
    /// Creates a bootstrap system whose random placements derive from `seed`.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Appends spawn commands for the layout's markers plus `extra_hunters`
    /// randomly placed hunters.
    ///
    /// Every spawned agent is centered on its cell. Hunters never share a cell
    /// with another spawn; when the floor runs out fewer hunters are emitted.
    pub fn populate(
        &mut self,
        layout: &LevelLayout,
        world: &World,
        extra_hunters: usize,
        out: &mut Vec<Command>,
    ) {
        let mut occupied: Vec<CellCoord> = Vec::new();

        for marker in layout.spawns() {
            occupied.push(marker.cell);
            out.push(spawn(world, marker.role, marker.cell));
        }

        let mut free: Vec<CellCoord> = layout
            .floor_cells()
            .iter()
            .copied()
            .filter(|cell| !occupied.contains(cell))
            .collect();

        let player = match layout.spawns().iter().find(|marker| marker.role == Role::Player) {
            Some(marker) => Some(marker.cell),
            None => {
                let chosen = free.choose(&mut self.rng).copied();
                if let Some(cell) = chosen {
                    free.retain(|candidate| *candidate != cell);
                    out.push(spawn(world, Role::Player, cell));
                }
                chosen
            }
        };

        free.shuffle(&mut self.rng);
        if let Some(player) = player {
            // Stable sort keeps the shuffled order within each band.
            free.sort_by_key(|cell| cell.manhattan_distance(player) < HUNTER_STANDOFF);
        }

        for cell in free.into_iter().take(extra_hunters) {
            out.push(spawn(world, Role::Hunter, cell));
        }
    }
}

fn spawn(world: &World, role: Role, cell: CellCoord) -> Command {
    Command::SpawnAgent {
        role,
        position: query::spawn_position(world, cell),
    }
}
