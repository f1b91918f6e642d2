//! Grid maze handed over by the map generator.
//!
//! Cells are stored row-major: `cells[y * width + x]`.

use std::{fmt, fs, io, path::Path};

use glam::Vec2;
use thiserror::Error;

/// One grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cell {
    Wall,
    Boundary,
    Empty,
    Goal,
}

impl Cell {
    pub fn from_char(ch: char) -> Option<Self> {
        match ch {
            'w' => Some(Cell::Wall),
            'b' => Some(Cell::Boundary),
            ' ' => Some(Cell::Empty),
            'g' => Some(Cell::Goal),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Cell::Wall => 'w',
            Cell::Boundary => 'b',
            Cell::Empty => ' ',
            Cell::Goal => 'g',
        }
    }

    /// Walls and boundaries stop rays and the player.
    #[inline]
    pub fn is_solid(self) -> bool {
        matches!(self, Cell::Wall | Cell::Boundary)
    }
}

#[derive(Error, Debug)]
pub enum MapError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("map has no cells")]
    Empty,

    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unknown cell {ch:?} at ({x}, {y})")]
    BadCell { ch: char, x: usize, y: usize },

    #[error("{found} cells do not fill a {width}x{height} map")]
    SizeMismatch {
        width: usize,
        height: usize,
        found: usize,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct GameMap {
    width: usize,
    height: usize,
    cells: Vec<Cell>,
}

impl GameMap {
    /// Build from a flattened row-major character grid.
    pub fn new(width: usize, height: usize, chars: &str) -> Result<Self, MapError> {
        if width == 0 || height == 0 {
            return Err(MapError::Empty);
        }
        let chars: Vec<char> = chars.chars().collect();
        if chars.len() != width * height {
            return Err(MapError::SizeMismatch {
                width,
                height,
                found: chars.len(),
            });
        }
        let mut cells = Vec::with_capacity(chars.len());
        for (i, &ch) in chars.iter().enumerate() {
            let cell = Cell::from_char(ch).ok_or(MapError::BadCell {
                ch,
                x: i % width,
                y: i / width,
            })?;
            cells.push(cell);
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build from one string per row; every row must have the same length.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, MapError> {
        let width = rows.first().map_or(0, |r| r.as_ref().chars().count());
        let mut flat = String::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let found = line.as_ref().chars().count();
            if found != width {
                return Err(MapError::Ragged {
                    row,
                    expected: width,
                    found,
                });
            }
            flat.push_str(line.as_ref());
        }
        Self::new(width, rows.len(), &flat)
    }

    /// Read a text file with one row per line. Trailing blank lines are ignored.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, MapError> {
        let text = fs::read_to_string(path)?;
        let mut rows: Vec<&str> = text.lines().collect();
        while rows.last().is_some_and(|r| r.trim().is_empty()) {
            rows.pop();
        }
        Self::from_rows(&rows)
    }

    /// Boundary ring around an empty interior.
    pub fn bordered(width: usize, height: usize) -> Self {
        let cells = (0..width * height)
            .map(|i| {
                let (x, y) = (i % width, i / width);
                if x == 0 || y == 0 || x + 1 == width || y + 1 == height {
                    Cell::Boundary
                } else {
                    Cell::Empty
                }
            })
            .collect();
        Self {
            width,
            height,
            cells,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// `None` outside `[0, width) × [0, height)`.
    #[inline]
    pub fn cell(&self, x: i64, y: i64) -> Option<Cell> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(self.cells[y as usize * self.width + x as usize])
    }

    /// Cell under a world-space point.
    #[inline]
    pub fn cell_at(&self, p: Vec2) -> Option<Cell> {
        self.cell(p.x.floor() as i64, p.y.floor() as i64)
    }

    /// Out-of-bounds counts as solid.
    pub fn is_solid(&self, x: i64, y: i64) -> bool {
        self.cell(x, y).is_none_or(Cell::is_solid)
    }

    /// Coordinates of every goal cell, row-major order.
    pub fn goals(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, c)| **c == Cell::Goal)
            .map(|(i, _)| (i % self.width, i / self.width))
    }
}

/// Rows in the same characters [`GameMap::from_rows`] reads, joined by `\n`.
impl fmt::Display for GameMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (y, row) in self.cells.chunks(self.width.max(1)).enumerate() {
            if y > 0 {
                writeln!(f)?;
            }
            for &cell in row {
                write!(f, "{}", cell.as_char())?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_rows() {
        let map = GameMap::from_rows(&["bbbb", "b wb", "bg b", "bbbb"]).unwrap();
        assert_eq!(map.width(), 4);
        assert_eq!(map.height(), 4);
        assert_eq!(map.cell(2, 1), Some(Cell::Wall));
        assert_eq!(map.cell(1, 2), Some(Cell::Goal));
        assert_eq!(map.cell(1, 1), Some(Cell::Empty));
        assert_eq!(map.cell(-1, 0), None);
        assert_eq!(map.cell(4, 0), None);
        assert_eq!(map.goals().collect::<Vec<_>>(), vec![(1, 2)]);
    }

    #[test]
    fn ragged_rows_rejected() {
        let err = GameMap::from_rows(&["bbb", "bb"]).unwrap_err();
        assert!(matches!(
            err,
            MapError::Ragged {
                row: 1,
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn unknown_char_rejected() {
        let err = GameMap::new(2, 1, "bx").unwrap_err();
        assert!(matches!(err, MapError::BadCell { ch: 'x', x: 1, y: 0 }));
    }

    #[test]
    fn bordered_has_solid_ring() {
        let map = GameMap::bordered(5, 4);
        assert!(map.is_solid(0, 2));
        assert!(map.is_solid(4, 3));
        assert!(!map.is_solid(2, 2));
        assert!(map.is_solid(-3, 2));
    }

    #[test]
    fn display_writes_back_the_rows() {
        let rows = ["bbbbb", "b w b", "bg  b", "bbbbb"];
        let map = GameMap::from_rows(&rows).unwrap();
        assert_eq!(map.to_string(), rows.join("\n"));
        let again: Vec<String> = map.to_string().lines().map(String::from).collect();
        assert_eq!(GameMap::from_rows(&again).unwrap(), map);
    }

    #[test]
    fn from_file_skips_trailing_blank_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("maze.txt");
        std::fs::write(&path, "bbb\nb b\nbbb\n\n").unwrap();
        let map = GameMap::from_file(&path).unwrap();
        assert_eq!((map.width(), map.height()), (3, 3));
    }
}
