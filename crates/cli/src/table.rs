use triage_core::analysis::minutes_to_hours;

/// Widest a column may grow before its cells are truncated.
const MAX_COLUMN_WIDTH: usize = 40;

/// Box-drawn text table with columns sized to their content.
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Append a row. Missing trailing cells render empty; extra cells are
    /// dropped.
    pub fn row(&mut self, cells: Vec<String>) {
        self.rows.push(cells);
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn print(&self) {
        print!("{}", self.render());
    }

    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut out = String::new();

        out.push_str(&border(&widths, '┌', '┬', '┐'));
        out.push_str(&line(&self.headers, &widths));
        out.push_str(&border(&widths, '├', '┼', '┤'));
        for row in &self.rows {
            out.push_str(&line(row, &widths));
        }
        out.push_str(&border(&widths, '└', '┴', '┘'));
        out
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .filter_map(|row| row.get(i))
                    .map(|cell| cell.chars().count())
                    .chain(std::iter::once(header.chars().count()))
                    .max()
                    .unwrap_or(0)
                    .min(MAX_COLUMN_WIDTH)
            })
            .collect()
    }
}

fn border(widths: &[usize], left: char, mid: char, right: char) -> String {
    let segments: Vec<String> = widths.iter().map(|w| "─".repeat(w + 2)).collect();
    format!("{left}{}{right}\n", segments.join(&mid.to_string()))
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = widths
        .iter()
        .enumerate()
        .map(|(i, width)| truncate(cells.get(i).map_or("", String::as_str), *width))
        .collect();
    format!("│ {} │\n", padded.join(" │ "))
}

/// Pad or cut `s` to exactly `max_len` characters, marking cuts with "...".
///
/// Counts characters rather than bytes so multi-byte text never splits.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{s:<max_len$}")
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{:<max_len$}", format!("{kept}..."))
    }
}

/// `-` for missing values, otherwise fixed to `decimals` places.
pub fn opt_num(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.decimals$}"))
}

/// Minutes from the backend shown as hours, `-` when missing.
pub fn opt_hours(minutes: Option<f64>) -> String {
    opt_num(minutes.map(minutes_to_hours), 1)
}

pub fn opt_text(value: Option<&str>) -> String {
    value.unwrap_or("-").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_sizes_columns_to_content() {
        let mut table = Table::new(["ID", "Status"]);
        table.row(vec!["42".into(), "IN_PROGRESS".into()]);
        table.row(vec!["7".into()]);

        let rendered = table.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 6);
        assert_eq!(lines[0], "┌────┬─────────────┐");
        assert_eq!(lines[1], "│ ID │ Status      │");
        assert_eq!(lines[3], "│ 42 │ IN_PROGRESS │");
        assert_eq!(lines[4], "│ 7  │             │");
        assert_eq!(lines[5], "└────┴─────────────┘");
    }

    #[test]
    fn truncate_pads_short_values() {
        assert_eq!(truncate("ab", 4), "ab  ");
    }

    #[test]
    fn truncate_cuts_long_values_on_char_boundaries() {
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn missing_numbers_render_as_dash() {
        assert_eq!(opt_num(None, 1), "-");
        assert_eq!(opt_num(Some(12.3456), 2), "12.35");
    }

    #[test]
    fn minutes_render_as_hours() {
        assert_eq!(opt_hours(Some(120.0)), "2.0");
        assert_eq!(opt_hours(Some(90.0)), "1.5");
        assert_eq!(opt_hours(None), "-");
    }
}
