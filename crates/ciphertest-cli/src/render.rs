//! Terminal rendering of the key legend and answer form.

use comfy_table::{Cell, Table};

use ciphertest_core::model::{AnswerCell, KeyGrid};

const GLYPHS: [char; 10] = ['○', '◆', '●', '▲', '■', '★', '♣', '♥', '♠', '✚'];

/// Glyph drawn for a symbol id.
pub fn glyph(symbol_id: u8) -> char {
    GLYPHS.get(symbol_id as usize).copied().unwrap_or('?')
}

/// The legend row: each symbol above the digit it stands for.
pub fn legend_table(legend: &[u8]) -> Table {
    let mut table = Table::new();
    table.set_header(legend.iter().map(|&s| Cell::new(glyph(s))));
    table.add_row(legend.iter().map(|&s| Cell::new(s)));
    table
}

/// The answer form laid out like the key grid, each cell shown as
/// `index:glyph`.
pub fn form_table(grid: &KeyGrid, cells: &[AnswerCell]) -> Table {
    let mut table = Table::new();
    let mut cells = cells.iter();
    for row in &grid.rows {
        let rendered: Vec<Cell> = cells
            .by_ref()
            .take(row.len())
            .map(|c| Cell::new(format!("{}:{}", c.cell_index, glyph(c.symbol_id))))
            .collect();
        table.add_row(rendered);
    }
    table
}

/// Plaintext key digits with row numbers.
pub fn key_table(grid: &KeyGrid) -> Table {
    let mut table = Table::new();
    let width = grid.rows.iter().map(Vec::len).max().unwrap_or(0);
    let mut header = vec![Cell::new("Row")];
    header.extend((1..=width).map(Cell::new));
    table.set_header(header);
    for (i, row) in grid.rows.iter().enumerate() {
        let mut cells = vec![Cell::new(i + 1)];
        cells.extend(row.iter().map(|&v| Cell::new(v)));
        table.add_row(cells);
    }
    table
}
