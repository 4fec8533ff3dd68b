//! Terminal line plot of elapsed time against iteration.
//!
//! When there are more rows than columns, consecutive rows are averaged
//! into one column each.

use crate::parser::LatencyRow;

/// Plot rows.
const PLOT_HEIGHT: usize = 12;

/// Width of the y-axis label gutter.
const LABEL_WIDTH: usize = 10;

/// Render `rows` as an ASCII plot at most `width` columns wide.
pub fn render_plot(rows: &[LatencyRow], width: usize) -> String {
    if rows.is_empty() || width == 0 {
        return String::from("(no data)\n");
    }

    let columns = width.min(rows.len());
    let values: Vec<f64> = (0..columns)
        .map(|col| {
            let lo = col * rows.len() / columns;
            let hi = ((col + 1) * rows.len() / columns).max(lo + 1);
            let bucket = &rows[lo..hi];
            bucket.iter().map(|r| r.elapsed).sum::<f64>() / bucket.len() as f64
        })
        .collect();

    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;

    let mut grid = vec![vec![' '; columns]; PLOT_HEIGHT];
    for (x, value) in values.iter().enumerate() {
        let level = if span > 0.0 {
            (((value - min) / span) * (PLOT_HEIGHT - 1) as f64).round() as usize
        } else {
            0
        };
        grid[PLOT_HEIGHT - 1 - level.min(PLOT_HEIGHT - 1)][x] = '*';
    }

    let mut out = String::new();
    for (y, line) in grid.iter().enumerate() {
        let label = match y {
            0 => format!("{:>width$.3}", max, width = LABEL_WIDTH),
            y if y == PLOT_HEIGHT - 1 => format!("{:>width$.3}", min, width = LABEL_WIDTH),
            _ => " ".repeat(LABEL_WIDTH),
        };
        let body: String = line.iter().collect();
        out.push_str(&format!("{label} |{}\n", body.trim_end()));
    }
    out.push_str(&format!("{} +{}\n", " ".repeat(LABEL_WIDTH), "-".repeat(columns)));

    let first = rows[0].iteration.to_string();
    let last = rows[rows.len() - 1].iteration.to_string();
    let gap = columns.saturating_sub(first.len() + last.len()).max(1);
    out.push_str(&format!(
        "{}  {first}{}{last}\n",
        " ".repeat(LABEL_WIDTH),
        " ".repeat(gap)
    ));
    out
}
