use std::{collections::HashMap, fs, path::Path};

use anyhow::{bail, Context, Result};
use delve_core::Role;
use serde::Deserialize;

const SUPPORTED_GLYPH_VERSION: u32 = 1;

/// Characters used by the text renderer for tiles and agents.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GlyphSet {
    wall: char,
    floor: char,
    impact: char,
    player: char,
    hunter: char,
    projectile: char,
}

impl Default for GlyphSet {
    fn default() -> Self {
        Self {
            wall: '#',
            floor: '.',
            impact: '*',
            player: '@',
            hunter: 'H',
            projectile: '+',
        }
    }
}

impl GlyphSet {
    /// Loads a glyph set from the TOML file at `path`.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read glyph set at {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("invalid glyph set at {}", path.display()))
    }

    /// Parses a glyph set from TOML text.
    ///
    /// ```toml
    /// version = 1
    ///
    /// [tiles]
    /// wall = "#"
    /// floor = "."
    /// impact = "*"
    ///
    /// [sprites]
    /// Player = "@"
    /// Hunter = "H"
    /// Projectile = "+"
    /// ```
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let manifest: GlyphManifest =
            toml::from_str(contents).context("failed to parse glyph set toml contents")?;
        if manifest.version != SUPPORTED_GLYPH_VERSION {
            bail!(
                "unsupported glyph set version {}; expected {}",
                manifest.version,
                SUPPORTED_GLYPH_VERSION
            );
        }

        let mut sprites = HashMap::new();
        for (name, glyph) in &manifest.sprites {
            let role = parse_role(name)?;
            let _ = sprites.insert(role, single_glyph(name, glyph)?);
        }
        let mut sprite = |role: Role| {
            sprites
                .remove(&role)
                .with_context(|| format!("glyph set missing sprite entry for {role:?}"))
        };

        let tiles = &manifest.tiles;
        Ok(Self {
            wall: single_glyph("wall", &tiles.wall)?,
            floor: single_glyph("floor", &tiles.floor)?,
            impact: single_glyph("impact", &tiles.impact)?,
            player: sprite(Role::Player)?,
            hunter: sprite(Role::Hunter)?,
            projectile: sprite(Role::Projectile)?,
        })
    }

    /// Glyph drawn for solid tiles.
    #[must_use]
    pub fn wall(&self) -> char {
        self.wall
    }

    /// Glyph drawn for open floor.
    #[must_use]
    pub fn floor(&self) -> char {
        self.floor
    }

    /// Glyph drawn where a projectile struck a wall.
    #[must_use]
    pub fn impact(&self) -> char {
        self.impact
    }

    /// Glyph drawn for agents with the provided role.
    #[must_use]
    pub fn sprite(&self, role: Role) -> char {
        match role {
            Role::Player => self.player,
            Role::Hunter => self.hunter,
            Role::Projectile => self.projectile,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GlyphManifest {
    version: u32,
    tiles: TileGlyphs,
    sprites: HashMap<String, String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct TileGlyphs {
    wall: String,
    floor: String,
    impact: String,
}

fn parse_role(name: &str) -> Result<Role> {
    match name {
        "Player" => Ok(Role::Player),
        "Hunter" => Ok(Role::Hunter),
        "Projectile" => Ok(Role::Projectile),
        _ => bail!("unknown sprite key `{name}` in glyph set"),
    }
}

fn single_glyph(name: &str, value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(glyph), None) if !glyph.is_control() => Ok(glyph),
        _ => bail!("glyph for `{name}` must be a single printable character, found {value:?}"),
    }
}
