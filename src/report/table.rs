use std::io::{self, Write};

/// Left-aligned text table. Every column but the last is as wide as its
/// widest cell plus `padding`; the last column is written as-is.
#[derive(Debug)]
pub struct Table {
    padding: usize,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new(padding: usize) -> Self {
        Self { padding, rows: Vec::new() }
    }

    pub fn with_header<I, S>(padding: usize, header: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut table = Self::new(padding);
        table.push_row(header);
        table
    }

    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.rows.push(cells.into_iter().map(Into::into).collect());
    }

    fn column_widths(&self) -> Vec<usize> {
        let columns = self.rows.iter().map(Vec::len).max().unwrap_or(0);
        let mut widths = vec![0; columns.saturating_sub(1)];
        for row in &self.rows {
            // The last cell of a row never takes part in alignment.
            let aligned = row.len().saturating_sub(1);
            for (i, cell) in row.iter().take(aligned).enumerate() {
                widths[i] = widths[i].max(display_width(cell) + self.padding);
            }
        }
        widths
    }

    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let widths = self.column_widths();
        for row in &self.rows {
            let last = row.len().saturating_sub(1);
            for (i, cell) in row.iter().enumerate() {
                if i == last {
                    out.write_all(cell.as_bytes())?;
                } else {
                    write!(out, "{}{:pad$}", cell, "", pad = widths[i] - display_width(cell))?;
                }
            }
            out.write_all(b"\n")?;
        }
        out.flush()
    }

    #[cfg(test)]
    pub fn render(&self) -> String {
        let mut out = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.write_to(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }
}

fn display_width(cell: &str) -> usize {
    cell.chars().count()
}
