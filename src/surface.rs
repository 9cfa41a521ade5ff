//! Surface trait + CrosstermSurface implementation.
//!
//! The render and style modules depend on this trait, not on crossterm
//! directly. This enables grid-backed surfaces for testing and future
//! backend substitution.

use crate::types::{Attr, AttrFlags, Cell, Grid};

// ============================================================================
// Surface Trait
// ============================================================================

/// A row/column addressable character grid with an active rendition.
/// Cell writes pick up whatever attributes and color pair are active at the
/// time of the write.
pub trait Surface {
    fn init(&mut self) -> Result<(), String>;
    fn shutdown(&mut self) -> Result<(), String>;
    fn size(&self) -> (u16, u16);
    /// Write one character at (row, col). Out-of-bounds writes are dropped.
    fn put_char(&mut self, row: i32, col: i32, ch: char);
    fn move_cursor(&mut self, row: i32, col: i32);
    /// Clear from the current cursor position to the end of the line.
    fn clear_to_eol(&mut self);
    fn set_attr(&mut self, attr: Attr, on: bool);
    /// Drop every active attribute and the active color pair (a full
    /// rendition reset, colour included).
    fn clear_attrs(&mut self);
    fn set_color_pair(&mut self, pair: u8);
    fn flush(&mut self) -> Result<(), String>;
    /// The cell recorded at (row, col). Grid-backed surfaces report their
    /// cells; live terminal surfaces have nothing to read back.
    fn read_cell(&self, _row: i32, _col: i32) -> Option<Cell> {
        None
    }
}

// ============================================================================
// CrosstermSurface
// ============================================================================

pub struct CrosstermSurface {
    width: u16,
    height: u16,
    // First queue error; cell ops are best-effort and the failure is
    // reported at the next flush.
    failed: Option<String>,
}

impl CrosstermSurface {
    pub fn new() -> Self {
        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        Self {
            width: w,
            height: h,
            failed: None,
        }
    }

    fn queue(&mut self, cmd: impl crossterm::Command) {
        use crossterm::QueueableCommand;

        if self.failed.is_some() {
            return;
        }
        if let Err(e) = std::io::stdout().queue(cmd) {
            self.failed = Some(format!("queue: {e}"));
        }
    }
}

impl Default for CrosstermSurface {
    fn default() -> Self {
        Self::new()
    }
}

/// Pair indices follow the conventional eight-colour palette; pair 0 is the
/// terminal's default rendition.
fn pair_color(pair: u8) -> Option<crossterm::style::Color> {
    use crossterm::style::Color;

    match pair {
        1 => Some(Color::White),
        2 => Some(Color::Red),
        3 => Some(Color::Green),
        4 => Some(Color::Yellow),
        5 => Some(Color::Blue),
        6 => Some(Color::Magenta),
        7 => Some(Color::Cyan),
        8 => Some(Color::DarkGrey),
        _ => None,
    }
}

impl Surface for CrosstermSurface {
    fn init(&mut self) -> Result<(), String> {
        use crossterm::{
            cursor,
            terminal::{enable_raw_mode, EnterAlternateScreen},
            ExecutableCommand,
        };

        enable_raw_mode().map_err(|e| format!("raw mode: {e}"))?;
        let mut stdout = std::io::stdout();
        stdout
            .execute(EnterAlternateScreen)
            .map_err(|e| format!("alternate screen: {e}"))?;
        // The OS cursor would trail the last written cell, so it stays hidden
        // for the whole session.
        stdout
            .execute(cursor::Hide)
            .map_err(|e| format!("hide cursor: {e}"))?;

        let (w, h) = crossterm::terminal::size().unwrap_or((80, 24));
        self.width = w;
        self.height = h;

        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), String> {
        use crossterm::{
            cursor,
            terminal::{disable_raw_mode, LeaveAlternateScreen},
            ExecutableCommand,
        };

        let mut stdout = std::io::stdout();
        // Restore the OS cursor before leaving so the shell prompt renders
        // correctly after exit.
        stdout
            .execute(cursor::Show)
            .map_err(|e| format!("show cursor: {e}"))?;
        stdout
            .execute(LeaveAlternateScreen)
            .map_err(|e| format!("leave alternate screen: {e}"))?;
        disable_raw_mode().map_err(|e| format!("disable raw mode: {e}"))?;

        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        crossterm::terminal::size().unwrap_or((self.width, self.height))
    }

    fn put_char(&mut self, row: i32, col: i32, ch: char) {
        use crossterm::{cursor::MoveTo, style::Print};

        if row < 0 || col < 0 || row > u16::MAX as i32 || col > u16::MAX as i32 {
            return;
        }
        self.queue(MoveTo(col as u16, row as u16));
        self.queue(Print(ch));
    }

    fn move_cursor(&mut self, row: i32, col: i32) {
        use crossterm::cursor::MoveTo;

        if row < 0 || col < 0 || row > u16::MAX as i32 || col > u16::MAX as i32 {
            return;
        }
        self.queue(MoveTo(col as u16, row as u16));
    }

    fn clear_to_eol(&mut self) {
        use crossterm::terminal::{Clear, ClearType};

        self.queue(Clear(ClearType::UntilNewLine));
    }

    fn set_attr(&mut self, attr: Attr, on: bool) {
        use crossterm::style::{Attribute, SetAttribute};

        // Standout has no crossterm rendition of its own; it renders as
        // reverse, the usual terminfo fallback.
        let rendition = match (attr, on) {
            (Attr::Bold, true) => Attribute::Bold,
            (Attr::Bold, false) => Attribute::NormalIntensity,
            (Attr::Underline, true) => Attribute::Underlined,
            (Attr::Underline, false) => Attribute::NoUnderline,
            (Attr::Standout, true) => Attribute::Reverse,
            (Attr::Standout, false) => Attribute::NoReverse,
            (Attr::Reverse, true) => Attribute::Reverse,
            (Attr::Reverse, false) => Attribute::NoReverse,
            (Attr::Dim, true) => Attribute::Dim,
            (Attr::Dim, false) => Attribute::NormalIntensity,
        };
        self.queue(SetAttribute(rendition));
    }

    fn clear_attrs(&mut self) {
        use crossterm::style::{Attribute, SetAttribute};

        self.queue(SetAttribute(Attribute::Reset));
    }

    fn set_color_pair(&mut self, pair: u8) {
        use crossterm::style::{ResetColor, SetForegroundColor};

        match pair_color(pair) {
            Some(c) => self.queue(SetForegroundColor(c)),
            None => self.queue(ResetColor),
        }
    }

    fn flush(&mut self) -> Result<(), String> {
        use std::io::Write;

        if let Some(e) = self.failed.take() {
            return Err(e);
        }
        std::io::stdout().flush().map_err(|e| format!("flush: {e}"))
    }
}

// ============================================================================
// HeadlessSurface (for testing and CI environments)
// ============================================================================

/// Grid-backed surface that never touches a terminal. Cell writes are
/// recorded, so hosts running without a tty can still snapshot output.
pub struct HeadlessSurface {
    pub grid: Grid,
    attrs: AttrFlags,
    pair: u8,
    cursor: (i32, i32),
}

impl HeadlessSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            grid: Grid::new(width, height),
            attrs: AttrFlags::empty(),
            pair: 0,
            cursor: (0, 0),
        }
    }

    fn stamp(&self) -> Cell {
        Cell {
            ch: ' ',
            attrs: self.attrs,
            pair: self.pair,
        }
    }
}

impl Surface for HeadlessSurface {
    fn init(&mut self) -> Result<(), String> {
        self.grid.clear();
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.grid.width, self.grid.height)
    }

    fn put_char(&mut self, row: i32, col: i32, ch: char) {
        if !self.grid.in_bounds(col, row) {
            return;
        }
        let cell = Cell { ch, ..self.stamp() };
        self.grid.set(col as u16, row as u16, cell);
    }

    fn move_cursor(&mut self, row: i32, col: i32) {
        self.cursor = (row, col);
    }

    fn clear_to_eol(&mut self) {
        let (row, col) = self.cursor;
        if row < 0 || row >= self.grid.height as i32 {
            return;
        }
        for x in col.max(0)..self.grid.width as i32 {
            self.grid.set(x as u16, row as u16, Cell::default());
        }
    }

    fn set_attr(&mut self, attr: Attr, on: bool) {
        if on {
            self.attrs.insert(attr.flag());
        } else {
            self.attrs.remove(attr.flag());
        }
    }

    fn clear_attrs(&mut self) {
        self.attrs = AttrFlags::empty();
        self.pair = 0;
    }

    fn set_color_pair(&mut self, pair: u8) {
        self.pair = pair;
    }

    fn flush(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn read_cell(&self, row: i32, col: i32) -> Option<Cell> {
        if !self.grid.in_bounds(col, row) {
            return None;
        }
        self.grid.get(col as u16, row as u16).cloned()
    }
}

// ============================================================================
// MockSurface (for Rust unit tests only)
// ============================================================================

/// Every rendition change applied to a `MockSurface`, in order.
#[cfg(test)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurfaceOp {
    AttrOn(Attr),
    AttrOff(Attr),
    ClearAttrs,
    ColorPair(u8),
}

#[cfg(test)]
pub struct MockSurface {
    pub grid: Grid,
    pub attrs: AttrFlags,
    pub pair: u8,
    pub cursor: (i32, i32),
    pub ops: Vec<SurfaceOp>,
    /// (row, from_col) of every clear_to_eol call.
    pub cleared: Vec<(i32, i32)>,
}

#[cfg(test)]
impl MockSurface {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            grid: Grid::new(width, height),
            attrs: AttrFlags::empty(),
            pair: 0,
            cursor: (0, 0),
            ops: Vec::new(),
            cleared: Vec::new(),
        }
    }

    /// The characters recorded on one row, trailing blanks trimmed.
    pub fn row_text(&self, row: u16) -> String {
        let mut s: String = (0..self.grid.width)
            .map(|x| self.grid.get(x, row).map(|c| c.ch).unwrap_or(' '))
            .collect();
        let trimmed = s.trim_end().len();
        s.truncate(trimmed);
        s
    }
}

#[cfg(test)]
impl Surface for MockSurface {
    fn init(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn shutdown(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn size(&self) -> (u16, u16) {
        (self.grid.width, self.grid.height)
    }

    fn put_char(&mut self, row: i32, col: i32, ch: char) {
        if !self.grid.in_bounds(col, row) {
            return;
        }
        self.grid.set(
            col as u16,
            row as u16,
            Cell {
                ch,
                attrs: self.attrs,
                pair: self.pair,
            },
        );
    }

    fn move_cursor(&mut self, row: i32, col: i32) {
        self.cursor = (row, col);
    }

    fn clear_to_eol(&mut self) {
        let (row, col) = self.cursor;
        self.cleared.push((row, col));
        if row < 0 || row >= self.grid.height as i32 {
            return;
        }
        for x in col.max(0)..self.grid.width as i32 {
            self.grid.set(x as u16, row as u16, Cell::default());
        }
    }

    fn set_attr(&mut self, attr: Attr, on: bool) {
        if on {
            self.attrs.insert(attr.flag());
            self.ops.push(SurfaceOp::AttrOn(attr));
        } else {
            self.attrs.remove(attr.flag());
            self.ops.push(SurfaceOp::AttrOff(attr));
        }
    }

    fn clear_attrs(&mut self) {
        self.attrs = AttrFlags::empty();
        self.pair = 0;
        self.ops.push(SurfaceOp::ClearAttrs);
    }

    fn set_color_pair(&mut self, pair: u8) {
        self.pair = pair;
        self.ops.push(SurfaceOp::ColorPair(pair));
    }

    fn flush(&mut self) -> Result<(), String> {
        Ok(())
    }

    fn read_cell(&self, row: i32, col: i32) -> Option<Cell> {
        if !self.grid.in_bounds(col, row) {
            return None;
        }
        self.grid.get(col as u16, row as u16).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_records_cells() {
        let mut s = HeadlessSurface::new(20, 5);
        s.set_attr(Attr::Bold, true);
        s.set_color_pair(3);
        s.put_char(1, 4, 'A');

        let cell = s.grid.get(4, 1).unwrap();
        assert_eq!(cell.ch, 'A');
        assert!(cell.attrs.contains(AttrFlags::BOLD));
        assert_eq!(cell.pair, 3);

        // Out-of-bounds and negative writes are dropped, not panics.
        s.put_char(-1, 0, 'B');
        s.put_char(0, 99, 'B');
        assert_eq!(s.grid.get(0, 0).unwrap().ch, ' ');
    }

    #[test]
    fn test_headless_clear_to_eol() {
        let mut s = HeadlessSurface::new(10, 2);
        for x in 0..10 {
            s.put_char(0, x, '#');
        }
        s.move_cursor(0, 4);
        s.clear_to_eol();

        assert_eq!(s.grid.get(3, 0).unwrap().ch, '#');
        assert_eq!(s.grid.get(4, 0).unwrap().ch, ' ');
        assert_eq!(s.grid.get(9, 0).unwrap().ch, ' ');
    }

    #[test]
    fn test_headless_clear_attrs_resets_pair() {
        let mut s = HeadlessSurface::new(5, 1);
        s.set_attr(Attr::Dim, true);
        s.set_color_pair(2);
        s.clear_attrs();
        s.put_char(0, 0, 'x');

        let cell = s.grid.get(0, 0).unwrap();
        assert_eq!(cell.attrs, AttrFlags::empty());
        assert_eq!(cell.pair, 0);
    }

    #[test]
    fn test_mock_logs_rendition_ops() {
        let mut s = MockSurface::new(10, 2);
        s.set_attr(Attr::Reverse, true);
        s.set_color_pair(5);
        s.set_attr(Attr::Reverse, false);
        s.clear_attrs();

        assert_eq!(
            s.ops,
            vec![
                SurfaceOp::AttrOn(Attr::Reverse),
                SurfaceOp::ColorPair(5),
                SurfaceOp::AttrOff(Attr::Reverse),
                SurfaceOp::ClearAttrs,
            ]
        );
    }

    #[test]
    fn test_mock_row_text_trims_trailing_blanks() {
        let mut s = MockSurface::new(10, 1);
        s.put_char(0, 0, 'h');
        s.put_char(0, 1, 'i');
        assert_eq!(s.row_text(0), "hi");
    }

    #[test]
    fn test_pair_color_palette_bounds() {
        assert!(pair_color(0).is_none());
        assert!(pair_color(1).is_some());
        assert!(pair_color(8).is_some());
        assert!(pair_color(9).is_none());
    }
}
