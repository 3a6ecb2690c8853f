//! Tile-grid level layouts.
//!
//! A layout is a grid of tile codes stretched over a `width` x `height`
//! pixel area. Loading turns it into [`Placement`]s: walls merged into as
//! few rectangles as possible, and characters standing on the bottom edge
//! of their cell.

use crate::error::SimError;
use serde::{Deserialize, Serialize};

/// What a tile holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileCode {
    Empty,
    Wall,
    Crawler,
    Zombie,
    Player,
}

impl TileCode {
    pub fn from_code(code: u32) -> Option<TileCode> {
        match code {
            0 => Some(TileCode::Empty),
            1 => Some(TileCode::Wall),
            97 => Some(TileCode::Crawler),
            98 => Some(TileCode::Zombie),
            99 => Some(TileCode::Player),
            _ => None,
        }
    }

    pub fn code(&self) -> u32 {
        match self {
            TileCode::Empty => 0,
            TileCode::Wall => 1,
            TileCode::Crawler => 97,
            TileCode::Zombie => 98,
            TileCode::Player => 99,
        }
    }
}

/// Something to spawn when a level loads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Placement {
    /// Top-left corner and extent of a merged wall.
    Wall { x: f32, y: f32, width: f32, height: f32 },
    /// Feet position of a character.
    Player { x: f32, y: f32 },
    Zombie { x: f32, y: f32 },
    Crawler { x: f32, y: f32 },
}

/// Serialized level description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelLayout {
    /// Rows of tile codes, top row first.
    pub tiles: Vec<Vec<u32>>,
    pub width: f32,
    pub height: f32,
}

impl LevelLayout {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn rows(&self) -> usize {
        self.tiles.len()
    }

    pub fn columns(&self) -> usize {
        self.tiles.first().map_or(0, Vec::len)
    }

    /// Pixel size of one grid cell.
    pub fn cell_size(&self) -> (f32, f32) {
        (self.width / self.columns() as f32, self.height / self.rows() as f32)
    }

    /// Checks the grid and decodes every tile.
    fn decode(&self) -> Result<Vec<Vec<TileCode>>, SimError> {
        if self.rows() == 0 || self.columns() == 0 {
            return Err(SimError::EmptyLevel);
        }
        if !(self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0) {
            return Err(SimError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let expected = self.columns();
        self.tiles
            .iter()
            .enumerate()
            .map(|(row, tiles)| {
                if tiles.len() != expected {
                    return Err(SimError::RaggedRow {
                        row,
                        found: tiles.len(),
                        expected,
                    });
                }
                tiles
                    .iter()
                    .enumerate()
                    .map(|(col, &code)| TileCode::from_code(code).ok_or(SimError::UnknownTile { code, row, col }))
                    .collect()
            })
            .collect()
    }

    /// Everything the level spawns, in row-major order of the cell each
    /// placement starts in.
    pub fn placements(&self) -> Result<Vec<Placement>, SimError> {
        let grid = self.decode()?;
        let (cell_width, cell_height) = self.cell_size();
        let rows = grid.len();
        let columns = self.columns();

        let mut consumed = vec![vec![false; columns]; rows];
        let is_free_wall = |consumed: &[Vec<bool>], row: usize, col: usize| {
            grid[row][col] == TileCode::Wall && !consumed[row][col]
        };

        let mut placements = Vec::new();
        for row in 0..rows {
            for col in 0..columns {
                let feet = (
                    (col as f32 + 0.5) * cell_width,
                    (row + 1) as f32 * cell_height,
                );
                match grid[row][col] {
                    TileCode::Empty => {}
                    TileCode::Player => placements.push(Placement::Player { x: feet.0, y: feet.1 }),
                    TileCode::Zombie => placements.push(Placement::Zombie { x: feet.0, y: feet.1 }),
                    TileCode::Crawler => placements.push(Placement::Crawler { x: feet.0, y: feet.1 }),
                    TileCode::Wall => {
                        if consumed[row][col] {
                            continue;
                        }

                        // Widest run on this row, then as many rows down
                        // as are wall across the whole run.
                        let mut end = col + 1;
                        while end < columns && is_free_wall(&consumed, row, end) {
                            end += 1;
                        }
                        let mut bottom = row + 1;
                        while bottom < rows && (col..end).all(|c| is_free_wall(&consumed, bottom, c)) {
                            bottom += 1;
                        }

                        for line in &mut consumed[row..bottom] {
                            for cell in &mut line[col..end] {
                                *cell = true;
                            }
                        }

                        placements.push(Placement::Wall {
                            x: col as f32 * cell_width,
                            y: row as f32 * cell_height,
                            width: (end - col) as f32 * cell_width,
                            height: (bottom - row) as f32 * cell_height,
                        });
                    }
                }
            }
        }

        log::debug!(
            "level {columns}x{rows} decoded into {} placements",
            placements.len()
        );
        Ok(placements)
    }

    /// A walled arena with a stepped upper floor, a zombie up top and a
    /// crawler in the lower corridor.
    pub fn demo() -> Self {
        let mut tiles = vec![vec![0u32; 36]; 9];
        for row in [0, 8] {
            tiles[row].fill(1);
        }
        for line in tiles.iter_mut() {
            line[0] = 1;
            line[35] = 1;
        }
        // Stepping stones over the upper pit.
        for start in [0, 5, 10, 15, 20, 25] {
            tiles[4][start..start + 3].fill(1);
        }
        tiles[5][..28].fill(1);
        tiles[6][27] = 1;
        tiles[7][27] = 1;

        tiles[3][1] = TileCode::Player.code();
        tiles[3][12] = TileCode::Zombie.code();
        tiles[7][10] = TileCode::Crawler.code();

        Self {
            tiles,
            width: 7000.0,
            height: 1000.0,
        }
    }
}
