//! Text level layouts.
//!
//! Layouts are rectangular grids of glyphs, one line per row:
//!
//! | Glyph | Meaning |
//! |-------|---------|
//! | `#` | solid wall tile |
//! | `.` or space | floor |
//! | `P` | floor with a player spawn |
//! | `H` | floor with a hunter spawn |
//!
//! Trailing blank lines are ignored; every other line must have the same width.

use delve_core::{Aabb, CellCoord, GridMetrics, Role};
use thiserror::Error;

/// Spawn request carried by a layout cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SpawnMarker {
    /// Role of the agent to spawn.
    pub role: Role,
    /// Cell hosting the spawn.
    pub cell: CellCoord,
}

/// Parsed level layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LevelLayout {
    columns: u32,
    rows: u32,
    walkable: Vec<bool>,
    solids: Vec<CellCoord>,
    floor: Vec<CellCoord>,
    spawns: Vec<SpawnMarker>,
}

/// Problems detected while parsing a layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// The text held no rows.
    #[error("layout is empty")]
    Empty,
    /// A row's width differed from the first row's.
    #[error("row {row} is {found} cells wide, expected {expected}")]
    Ragged {
        /// Zero-based row index.
        row: u32,
        /// Width of the first row.
        expected: u32,
        /// Width of the offending row.
        found: u32,
    },
    /// A glyph outside the layout alphabet was found.
    #[error("unknown glyph {glyph:?} at column {column}, row {row}")]
    UnknownGlyph {
        /// Offending character.
        glyph: char,
        /// Zero-based column index.
        column: u32,
        /// Zero-based row index.
        row: u32,
    },
    /// The layout exceeds the addressable grid size.
    #[error("layout dimensions exceed the supported grid size")]
    TooLarge,
}

impl LevelLayout {
    /// Parses a layout from its text form.
    pub fn parse(text: &str) -> Result<Self, LayoutError> {
        let mut lines: Vec<&str> = text
            .lines()
            .map(|line| line.trim_end_matches('\r'))
            .collect();
        while lines.last().is_some_and(|line| line.is_empty()) {
            let _ = lines.pop();
        }
        if lines.is_empty() {
            return Err(LayoutError::Empty);
        }

        let rows = u32::try_from(lines.len()).map_err(|_| LayoutError::TooLarge)?;
        let columns =
            u32::try_from(lines[0].chars().count()).map_err(|_| LayoutError::TooLarge)?;
        if columns == 0 {
            return Err(LayoutError::Empty);
        }

        let mut layout = Self {
            columns,
            rows,
            walkable: Vec::new(),
            solids: Vec::new(),
            floor: Vec::new(),
            spawns: Vec::new(),
        };

        for (row, line) in (0..rows).zip(&lines) {
            let found = u32::try_from(line.chars().count()).map_err(|_| LayoutError::TooLarge)?;
            if found != columns {
                return Err(LayoutError::Ragged {
                    row,
                    expected: columns,
                    found,
                });
            }

            for (column, glyph) in (0..columns).zip(line.chars()) {
                let cell = CellCoord::new(column, row);
                let spawn = match glyph {
                    '#' => {
                        layout.walkable.push(false);
                        layout.solids.push(cell);
                        continue;
                    }
                    '.' | ' ' => None,
                    'P' => Some(Role::Player),
                    'H' => Some(Role::Hunter),
                    other => {
                        return Err(LayoutError::UnknownGlyph {
                            glyph: other,
                            column,
                            row,
                        })
                    }
                };

                layout.walkable.push(true);
                layout.floor.push(cell);
                if let Some(role) = spawn {
                    layout.spawns.push(SpawnMarker { role, cell });
                }
            }
        }

        Ok(layout)
    }

    /// Number of columns in the layout.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows in the layout.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Grid geometry of the layout at the provided tile size.
    #[must_use]
    pub fn metrics(&self, tile_length: f32) -> GridMetrics {
        GridMetrics::new(self.columns, self.rows, tile_length)
    }

    /// Wall cells in row-major order.
    #[must_use]
    pub fn solid_cells(&self) -> &[CellCoord] {
        &self.solids
    }

    /// Floor cells in row-major order, spawn cells included.
    #[must_use]
    pub fn floor_cells(&self) -> &[CellCoord] {
        &self.floor
    }

    /// Spawn markers in row-major order.
    #[must_use]
    pub fn spawns(&self) -> &[SpawnMarker] {
        &self.spawns
    }

    /// Reports whether the cell lies inside the layout and is floor.
    #[must_use]
    pub fn is_floor(&self, cell: CellCoord) -> bool {
        if cell.column() >= self.columns || cell.row() >= self.rows {
            return false;
        }
        let offset = cell.row() as usize * self.columns as usize + cell.column() as usize;
        self.walkable.get(offset).copied().unwrap_or(false)
    }

    /// Solid rectangles derived from the wall cells, one per tile.
    pub fn solid_regions(&self, tile_length: f32) -> impl Iterator<Item = Aabb> + '_ {
        let metrics = self.metrics(tile_length);
        self.solids.iter().map(move |cell| metrics.cell_bounds(*cell))
    }
}
