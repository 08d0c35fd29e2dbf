//! Table rendering utilities for CLI outputs.

use unicode_width::UnicodeWidthStr;

pub struct Column {
    pub header: String,
    /// Minimum width; grows to fit the widest cell.
    pub width: usize,
    pub align_right: bool,
}

impl Column {
    pub fn left(header: &str) -> Self {
        Self {
            header: header.to_string(),
            width: 0,
            align_right: false,
        }
    }

    pub fn right(header: &str) -> Self {
        Self {
            header: header.to_string(),
            width: 0,
            align_right: true,
        }
    }
}

pub struct Table {
    pub columns: Vec<Column>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn add_row(&mut self, row: Vec<String>) {
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(i, col)| {
                self.rows
                    .iter()
                    .filter_map(|r| r.get(i))
                    .map(|c| UnicodeWidthStr::width(c.as_str()))
                    .chain([col.width, UnicodeWidthStr::width(col.header.as_str())])
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Render with a rule of `separator` under the header.
    pub fn render(&self, separator: &str) -> String {
        let widths = self.widths();
        let mut out = String::new();

        let headers: Vec<&str> = self.columns.iter().map(|c| c.header.as_str()).collect();
        self.push_line(&mut out, &headers, &widths);

        let total: usize = widths.iter().sum::<usize>() + 2 * widths.len().saturating_sub(1);
        let sep = separator.chars().next().unwrap_or('-');
        out.push_str(&sep.to_string().repeat(total));
        out.push('\n');

        for row in &self.rows {
            let cells: Vec<&str> = (0..self.columns.len())
                .map(|i| row.get(i).map(String::as_str).unwrap_or(""))
                .collect();
            self.push_line(&mut out, &cells, &widths);
        }

        out
    }

    fn push_line(&self, out: &mut String, cells: &[&str], widths: &[usize]) {
        let mut parts = Vec::with_capacity(cells.len());
        for ((cell, col), w) in cells.iter().zip(&self.columns).zip(widths) {
            let pad = " ".repeat(w.saturating_sub(UnicodeWidthStr::width(*cell)));
            if col.align_right {
                parts.push(format!("{pad}{cell}"));
            } else {
                parts.push(format!("{cell}{pad}"));
            }
        }
        out.push_str(parts.join("  ").trim_end());
        out.push('\n');
    }
}
