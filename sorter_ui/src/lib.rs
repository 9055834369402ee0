#![cfg_attr(all(not(debug_assertions), not(test)), deny(warnings))]
#![cfg_attr(
    all(not(debug_assertions), not(test)),
    deny(clippy::all, clippy::pedantic, clippy::nursery)
)]
#![allow(clippy::module_name_repetitions, clippy::missing_errors_doc)]
//! Character-cell operator panel.
//!
//! `TextPanel` mirrors a 16x2 character LCD in memory. Writes that run past
//! the right edge are truncated; writes to a row that does not exist fail.
use std::cell::RefCell;
use std::rc::Rc;

use sorter_traits::{BoxError, Display};
use thiserror::Error;

pub const COLS: usize = 16;
pub const ROWS: usize = 2;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PanelError {
    #[error("cursor ({col}, {row}) outside 16x2 panel")]
    OutOfBounds { col: u8, row: u8 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextPanel {
    cells: [[char; COLS]; ROWS],
}

impl Default for TextPanel {
    fn default() -> Self {
        Self {
            cells: [[' '; COLS]; ROWS],
        }
    }
}

impl TextPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current contents, one string per row, always `COLS` characters wide.
    pub fn render(&self) -> [String; ROWS] {
        self.cells.map(|row| row.iter().collect())
    }

    /// Rows with trailing blanks removed.
    pub fn lines(&self) -> Vec<String> {
        self.render()
            .iter()
            .map(|r| r.trim_end().to_string())
            .collect()
    }

    fn write_at(&mut self, text: &str, col: u8, row: u8) -> Result<(), PanelError> {
        let (c, r) = (usize::from(col), usize::from(row));
        if c >= COLS || r >= ROWS {
            return Err(PanelError::OutOfBounds { col, row });
        }
        for (cell, ch) in self.cells[r][c..].iter_mut().zip(text.chars()) {
            *cell = if ch.is_control() { '?' } else { ch };
        }
        Ok(())
    }

    fn pad_row(&mut self, row: usize, text: &str) {
        let mut chars = text.chars();
        for cell in &mut self.cells[row] {
            *cell = chars.next().unwrap_or(' ');
        }
    }
}

impl Display for TextPanel {
    fn show_weight(&mut self, grams: f32) -> Result<(), BoxError> {
        // Full-row writes so a shorter value never leaves stale digits behind.
        self.pad_row(0, "Weight:");
        self.pad_row(1, &format!("{grams:.1} g"));
        Ok(())
    }

    fn show_text(&mut self, text: &str, col: u8, row: u8) -> Result<(), BoxError> {
        self.write_at(text, col, row)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<(), BoxError> {
        self.cells = [[' '; COLS]; ROWS];
        Ok(())
    }
}

/// Cloneable handle to one panel; hand one clone to the sorter and keep
/// another to inspect what the operator sees.
#[derive(Debug, Clone, Default)]
pub struct SharedPanel(Rc<RefCell<TextPanel>>);

impl SharedPanel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> TextPanel {
        self.0.borrow().clone()
    }
}

impl Display for SharedPanel {
    fn show_weight(&mut self, grams: f32) -> Result<(), BoxError> {
        self.0.borrow_mut().show_weight(grams)
    }

    fn show_text(&mut self, text: &str, col: u8, row: u8) -> Result<(), BoxError> {
        self.0.borrow_mut().show_text(text, col, row)
    }

    fn clear(&mut self) -> Result<(), BoxError> {
        self.0.borrow_mut().clear()
    }
}
