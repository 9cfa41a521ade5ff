//! Shared types, enums, and constants.
//!
//! All types that cross module boundaries or define the FFI data model live here.

use bitflags::bitflags;

// ============================================================================
// Display Attributes
// ============================================================================

/// The five nestable display attributes driven by themed-text escapes.
/// The discriminant doubles as the attribute's counter slot in `StyleState`.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attr {
    Bold = 0,
    Underline = 1,
    Standout = 2,
    Reverse = 3,
    Dim = 4,
}

/// Number of counter slots in `StyleState`.
pub const ATTR_COUNT: usize = 5;

impl Attr {
    /// All attributes, in counter-slot order.
    pub const ALL: [Attr; ATTR_COUNT] = [
        Attr::Bold,
        Attr::Underline,
        Attr::Standout,
        Attr::Reverse,
        Attr::Dim,
    ];

    pub fn from_u8(v: u8) -> Option<Self> {
        match v {
            0 => Some(Self::Bold),
            1 => Some(Self::Underline),
            2 => Some(Self::Standout),
            3 => Some(Self::Reverse),
            4 => Some(Self::Dim),
            _ => None,
        }
    }

    pub fn flag(self) -> AttrFlags {
        match self {
            Self::Bold => AttrFlags::BOLD,
            Self::Underline => AttrFlags::UNDERLINE,
            Self::Standout => AttrFlags::STANDOUT,
            Self::Reverse => AttrFlags::REVERSE,
            Self::Dim => AttrFlags::DIM,
        }
    }
}

bitflags! {
    #[repr(transparent)]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AttrFlags: u8 {
        const BOLD      = 0b0000_0001;
        const UNDERLINE = 0b0000_0010;
        const STANDOUT  = 0b0000_0100;
        const REVERSE   = 0b0000_1000;
        const DIM       = 0b0001_0000;
    }
}

// ============================================================================
// Color Pairs
// ============================================================================
//
// Color pairs are small indices into the surface's palette. Pair 0 is the
// terminal default rendition; pairs 1-8 are selectable from themed text.

/// The pair both history slots start on.
pub const DEFAULT_PAIR: u8 = 1;

// ============================================================================
// Draw Outcome
// ============================================================================

/// Result of a draw call. `remainder` is the byte offset of the first
/// unconsumed byte of the input string, or `None` when the string was fully
/// consumed. `col` is the column the cursor ended on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawOutcome {
    pub remainder: Option<usize>,
    pub col: i32,
}

impl DrawOutcome {
    pub fn consumed(col: i32) -> Self {
        Self {
            remainder: None,
            col,
        }
    }

    pub fn partial(offset: usize, col: i32) -> Self {
        Self {
            remainder: Some(offset),
            col,
        }
    }
}

// ============================================================================
// Cell & Grid
// ============================================================================

/// One character cell as recorded by grid-backed surfaces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub ch: char,
    pub attrs: AttrFlags,
    pub pair: u8,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            ch: ' ',
            attrs: AttrFlags::empty(),
            pair: 0,
        }
    }
}

/// Row-major cell grid backing the headless and mock surfaces.
#[derive(Debug, Clone)]
pub struct Grid {
    pub width: u16,
    pub height: u16,
    pub cells: Vec<Cell>,
}

impl Grid {
    pub fn new(width: u16, height: u16) -> Self {
        let size = (width as usize) * (height as usize);
        Self {
            width,
            height,
            cells: vec![Cell::default(); size],
        }
    }

    pub fn clear(&mut self) {
        for cell in &mut self.cells {
            *cell = Cell::default();
        }
    }

    /// Whether a signed (x, y) coordinate lands on the grid.
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32
    }

    pub fn get(&self, x: u16, y: u16) -> Option<&Cell> {
        if x < self.width && y < self.height {
            Some(&self.cells[(y as usize) * (self.width as usize) + (x as usize)])
        } else {
            None
        }
    }

    pub fn set(&mut self, x: u16, y: u16, cell: Cell) {
        if x < self.width && y < self.height {
            self.cells[(y as usize) * (self.width as usize) + (x as usize)] = cell;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attr_from_u8() {
        assert_eq!(Attr::from_u8(0), Some(Attr::Bold));
        assert_eq!(Attr::from_u8(4), Some(Attr::Dim));
        assert_eq!(Attr::from_u8(5), None);
    }

    #[test]
    fn test_attr_slot_order_matches_all() {
        for (slot, attr) in Attr::ALL.iter().enumerate() {
            assert_eq!(*attr as usize, slot);
        }
    }

    #[test]
    fn test_attr_flags_bitflags() {
        let mut flags = AttrFlags::empty();
        flags |= Attr::Bold.flag();
        flags |= Attr::Standout.flag();
        assert!(flags.contains(AttrFlags::BOLD));
        assert!(flags.contains(AttrFlags::STANDOUT));
        assert!(!flags.contains(AttrFlags::DIM));
    }

    #[test]
    fn test_draw_outcome_ctors() {
        let full = DrawOutcome::consumed(7);
        assert_eq!(full.remainder, None);
        assert_eq!(full.col, 7);

        let part = DrawOutcome::partial(3, 5);
        assert_eq!(part.remainder, Some(3));
        assert_eq!(part.col, 5);
    }

    #[test]
    fn test_grid_operations() {
        let mut grid = Grid::new(10, 5);
        assert_eq!(grid.cells.len(), 50);

        grid.set(
            3,
            2,
            Cell {
                ch: 'X',
                attrs: AttrFlags::BOLD,
                pair: 2,
            },
        );
        assert_eq!(grid.get(3, 2).unwrap().ch, 'X');
        assert_eq!(grid.get(0, 0).unwrap().ch, ' ');
        assert!(grid.get(10, 5).is_none());

        grid.clear();
        assert_eq!(grid.get(3, 2).unwrap().ch, ' ');
    }
}
