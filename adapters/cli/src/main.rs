#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs the delve chase simulation headlessly.

mod wander;

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use delve_core::{Command, Event, Role, SimulationConfig};
use delve_rendering::{load_glyphs, render_frame, GlyphCache, GlyphSet, Scene};
use delve_system_bootstrap::Bootstrap;
use delve_system_control::Control;
use delve_world::{self as world, layout::LevelLayout, query, World};
use tracing::{debug, info, warn};

use self::wander::Wanderer;

const DEFAULT_LEVEL: &str = "\
####################
#P.......#.........#
#.####...#...####..#
#.#......#......#..#
#.#..#######....#..#
#....#.....#.......#
#....#..H..#...##..#
#..........#.......#
#.######.......#...#
#........##....#.H.#
####################
";

#[derive(Parser, Debug)]
#[command(
    name = "delve",
    version,
    about = "Run the delve chase simulation without a window"
)]
struct Cli {
    /// Level text file: `#` walls, `.` floor, `P` player and `H` hunter spawns.
    #[arg(long)]
    level: Option<PathBuf>,
    /// TOML file overriding the simulation tuning.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 600)]
    ticks: u64,
    /// Seed driving spawn placement and the scripted player.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Hunters scattered over the floor in addition to the level's markers.
    #[arg(long, default_value_t = 0)]
    hunters: usize,
    /// TOML glyph set used to print frames.
    #[arg(long)]
    glyphs: Option<PathBuf>,
    /// Print a frame every N ticks; 0 prints only the final frame.
    #[arg(long, default_value_t = 0)]
    print_every: u64,
}

/// Entry point for the delve command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let layout = load_layout(cli.level.as_deref())?;
    let config = load_config(cli.config.as_deref())?;
    let mut world = World::new(&layout, config).context("simulation config is invalid")?;
    info!(
        columns = layout.columns(),
        rows = layout.rows(),
        floor = layout.floor_cells().len(),
        seed = cli.seed,
        "Loaded level"
    );

    let mut events = Vec::new();
    let mut commands = Vec::new();
    Bootstrap::new(cli.seed).populate(&layout, &world, cli.hunters, &mut commands);
    for command in commands.drain(..) {
        world::apply(&mut world, command, &mut events);
    }
    if query::first_with_role(&world, Role::Player).is_none() {
        warn!("Level has no room for a player; hunters will idle");
    }

    let mut presenter = Presenter::new(GlyphCache::new(), cli.glyphs);
    let mut control = Control::new();
    let mut wanderer = Wanderer::new(cli.seed);
    let mut stats = RunStats::default();

    for _ in 0..cli.ticks {
        control.handle(&events, wanderer.next_input(), &mut commands);
        stats.record(&events);
        events.clear();

        commands.push(Command::Tick);
        for command in commands.drain(..) {
            world::apply(&mut world, command, &mut events);
        }

        let tick = query::tick_index(&world);
        if cli.print_every > 0 && tick % cli.print_every == 0 && tick < cli.ticks {
            println!("{}", presenter.draw(&world, &events)?);
        }
    }
    stats.record(&events);
    println!("{}", presenter.draw(&world, &events)?);

    info!(
        ticks = query::tick_index(&world),
        agents = query::agent_view(&world).len(),
        paths_planned = stats.paths_planned,
        paths_unavailable = stats.paths_unavailable,
        bumps = stats.bumps,
        shots = stats.shots,
        impacts = stats.impacts,
        "Simulation finished"
    );
    if stats.paths_unavailable > 0 && stats.paths_planned == 0 {
        warn!("No hunter ever found a path to the player");
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_layout(path: Option<&Path>) -> Result<LevelLayout> {
    let Some(path) = path else {
        debug!("Using the built-in level");
        return LevelLayout::parse(DEFAULT_LEVEL).context("built-in level is malformed");
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read level at {}", path.display()))?;
    LevelLayout::parse(&text).with_context(|| format!("invalid level at {}", path.display()))
}

fn load_config(path: Option<&Path>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };

    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read config at {}", path.display()))?;
    let config: SimulationConfig = toml::from_str(&text)
        .with_context(|| format!("failed to parse config toml at {}", path.display()))?;
    debug!(?config, "Loaded simulation config");
    Ok(config)
}

/// Draws frames with glyphs from an optional file, loaded lazily through the cache.
#[derive(Debug)]
struct Presenter {
    cache: GlyphCache,
    glyph_path: Option<PathBuf>,
    fallback: GlyphSet,
}

impl Presenter {
    fn new(cache: GlyphCache, glyph_path: Option<PathBuf>) -> Self {
        Self {
            cache,
            glyph_path,
            fallback: GlyphSet::default(),
        }
    }

    fn draw(&mut self, world: &World, events: &[Event]) -> Result<String> {
        let glyphs = match &self.glyph_path {
            Some(path) => load_glyphs(&mut self.cache, path)?,
            None => &self.fallback,
        };
        Ok(render_frame(&Scene::capture(world, events), glyphs))
    }
}

#[derive(Debug, Default)]
struct RunStats {
    paths_planned: u64,
    paths_unavailable: u64,
    bumps: u64,
    shots: u64,
    impacts: u64,
}

impl RunStats {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::PathPlanned { .. } => self.paths_planned += 1,
                Event::PathUnavailable { .. } => self.paths_unavailable += 1,
                Event::AgentBumped { .. } => self.bumps += 1,
                Event::ProjectileFired { .. } => self.shots += 1,
                Event::ProjectileImpacted { .. } => self.impacts += 1,
                _ => {}
            }
        }
    }
}
