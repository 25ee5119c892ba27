#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Presentation adapter that snapshots the world into a scene and draws it as text.

mod cache;
mod glyphs;

use std::{
    fmt::Write as _,
    path::{Path, PathBuf},
};

use anyhow::Result;
use delve_core::{Aabb, AgentId, CellCoord, Clip, Event, GridMetrics, Role, Vec2};
use delve_world::{query, World};

pub use cache::ResourceCache;
pub use glyphs::GlyphSet;

/// Cache of glyph sets keyed by the file they were loaded from.
pub type GlyphCache = ResourceCache<PathBuf, GlyphSet>;

/// Animated sprite describing how a single agent should be drawn.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sprite {
    /// Agent represented by the sprite.
    pub agent: AgentId,
    /// Role of the agent, selecting the sprite sheet.
    pub role: Role,
    /// World-space rectangle covered by the agent.
    pub bounds: Aabb,
    /// Animation clip selected from the agent's motion.
    pub clip: Clip,
    /// Whether the sprite is flipped horizontally.
    pub mirrored: bool,
    /// Whether the clip is advancing or frozen on its first frame.
    pub playing: bool,
}

/// Effect spawned where a projectile struck a wall.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Impact {
    /// World-space center of the impact.
    pub position: Vec2,
}

/// Everything a presentation backend needs to draw one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Tick the scene was captured at.
    pub tick: u64,
    /// Grid the scene is drawn over.
    pub metrics: GridMetrics,
    /// Solid regions of the level.
    pub solids: Vec<Aabb>,
    /// Sprites in agent identifier order.
    pub sprites: Vec<Sprite>,
    /// Impacts reported since the previous frame.
    pub impacts: Vec<Impact>,
}

impl Scene {
    /// Captures the world's current state together with the impacts found in
    /// the events produced since the previous frame.
    #[must_use]
    pub fn capture(world: &World, events: &[Event]) -> Self {
        let solids = query::solids(world)
            .iter()
            .map(|region| region.bounds())
            .collect();

        let sprites = query::agent_view(world)
            .iter()
            .filter(|agent| !agent.marked_for_removal)
            .map(|agent| match agent.pose {
                Some(pose) => Sprite {
                    agent: agent.id,
                    role: agent.role,
                    bounds: agent.bounds,
                    clip: pose.clip,
                    mirrored: pose.mirrored,
                    playing: pose.moving,
                },
                None => Sprite {
                    agent: agent.id,
                    role: agent.role,
                    bounds: agent.bounds,
                    clip: Clip::Right,
                    mirrored: agent.velocity.x < 0.0,
                    playing: false,
                },
            })
            .collect();

        let impacts = events
            .iter()
            .filter_map(|event| match event {
                Event::ProjectileImpacted { position, .. } => Some(Impact {
                    position: *position,
                }),
                _ => None,
            })
            .collect();

        Self {
            tick: query::tick_index(world),
            metrics: query::metrics(world),
            solids,
            sprites,
            impacts,
        }
    }
}

/// Returns the glyph set stored at `path`, loading it into `cache` on first use.
pub fn load_glyphs<'cache>(
    cache: &'cache mut GlyphCache,
    path: &Path,
) -> Result<&'cache GlyphSet> {
    cache.get_or_try_insert_with(path.to_path_buf(), || GlyphSet::from_path(path))
}

/// Draws the scene as a block of text: a header, one line per grid row and one
/// line per sprite describing its animation state.
///
/// Players are drawn above hunters, hunters above projectiles and all sprites
/// above impacts.
#[must_use]
pub fn render_frame(scene: &Scene, glyphs: &GlyphSet) -> String {
    let metrics = scene.metrics;
    let columns = metrics.columns() as usize;
    let mut grid = vec![glyphs.floor(); columns * metrics.rows() as usize];
    let mut plot = |cell: CellCoord, glyph: char| {
        grid[cell.row() as usize * columns + cell.column() as usize] = glyph;
    };

    for solid in &scene.solids {
        if let Some((first, last)) = metrics.cell_span(solid) {
            for row in first.row()..=last.row() {
                for column in first.column()..=last.column() {
                    plot(CellCoord::new(column, row), glyphs.wall());
                }
            }
        }
    }

    for impact in &scene.impacts {
        if let Some(cell) = metrics.cell_at(impact.position) {
            plot(cell, glyphs.impact());
        }
    }

    let mut layered: Vec<&Sprite> = scene.sprites.iter().collect();
    layered.sort_by_key(|sprite| draw_layer(sprite.role));
    for sprite in layered {
        if let Some(cell) = metrics.cell_at(sprite.bounds.center()) {
            plot(cell, glyphs.sprite(sprite.role));
        }
    }

    let mut frame = format!("tick {}\n", scene.tick);
    for row in grid.chunks(columns.max(1)) {
        frame.extend(row.iter());
        frame.push('\n');
    }
    for sprite in &scene.sprites {
        let position = sprite.bounds.position();
        let _ = writeln!(
            frame,
            "{} {:?}#{} at ({:.1}, {:.1}) {:?}{}{}",
            glyphs.sprite(sprite.role),
            sprite.role,
            sprite.agent.get(),
            position.x,
            position.y,
            sprite.clip,
            if sprite.mirrored { " mirrored" } else { "" },
            if sprite.playing { " playing" } else { " idle" },
        );
    }
    frame
}

fn draw_layer(role: Role) -> u8 {
    match role {
        Role::Projectile => 0,
        Role::Hunter => 1,
        Role::Player => 2,
    }
}
