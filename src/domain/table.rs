//! Plain-text grid rendering for query results

use crate::domain::entities::{ColumnInfo, DataTable, TableSummary};

/// Render `headers` and `rows` as left-aligned columns separated by two blanks.
///
/// Short rows are padded with empty cells.
pub fn render_grid(headers: &[String], rows: &[Vec<String>]) -> String {
    let width = headers
        .len()
        .max(rows.iter().map(Vec::len).max().unwrap_or(0));
    let mut widths = vec![0usize; width];
    for row in std::iter::once(headers).chain(rows.iter().map(Vec::as_slice)) {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.chars().count());
        }
    }

    let mut out = String::new();
    if !headers.is_empty() {
        push_row(&mut out, headers, &widths);
        let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
        push_row(&mut out, &rule, &widths);
    }
    for row in rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, row: &[String], widths: &[usize]) {
    let mut line = String::new();
    for (i, w) in widths.iter().enumerate() {
        let cell = row.get(i).map(String::as_str).unwrap_or("");
        if i > 0 {
            line.push_str("  ");
        }
        line.push_str(cell);
        line.extend(std::iter::repeat(' ').take(w - cell.chars().count()));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

/// Column listing as shown by `data --info-only`.
pub fn render_columns(columns: &[ColumnInfo]) -> String {
    let headers: Vec<String> = ["#", "Column", "Type", "Len", "Format", "Label"]
        .iter()
        .map(|h| h.to_string())
        .collect();
    let rows: Vec<Vec<String>> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| {
            vec![
                (i + 1).to_string(),
                c.name.clone(),
                c.kind.to_string(),
                c.length.to_string(),
                c.format.clone(),
                c.label.clone(),
            ]
        })
        .collect();
    render_grid(&headers, &rows)
}

pub fn render_rows(table: &DataTable) -> String {
    render_grid(&table.columns, &table.rows)
}

/// One line per member: name padded to the widest name, then member type.
pub fn render_tables(tables: &[TableSummary]) -> String {
    let rows: Vec<Vec<String>> = tables
        .iter()
        .map(|t| vec![t.name.clone(), t.kind.clone()])
        .collect();
    render_grid(&[], &rows)
}
