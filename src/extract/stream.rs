//! Table detection from text alignment alone ("stream" mode).
//!
//! Rows are baselines; columns are left edges shared by enough rows. A run
//! of consecutive rows that line up with the columns becomes a table.

use std::collections::{BTreeMap, BTreeSet};

use crate::model::{BBox, TableRegion};

use super::content::TextSpan;

/// Tuning for [`StreamDetector`].
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Fewest rows a table may have
    pub min_rows: usize,
    /// Fewest columns a table may have
    pub min_columns: usize,
    /// More columns than this is treated as word-level splitting
    pub max_columns: usize,
    /// Baseline tolerance for a row, as a fraction of the font size
    pub row_tolerance: f32,
    /// Share of rows (or spans) that must agree on an edge
    pub min_alignment: f32,
    /// Edges closer than this merge into one column
    pub min_column_gap: f32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            min_rows: 2,
            min_columns: 2,
            max_columns: 6,
            row_tolerance: 0.4,
            min_alignment: 0.3,
            min_column_gap: 15.0,
        }
    }
}

/// Width of the buckets left edges are snapped to.
const EDGE_BUCKET: f32 = 5.0;

/// Distance within which a span counts as aligned with a column.
const ALIGN_TOLERANCE: f32 = 5.0;

/// Slack for spans starting slightly left of their column.
const COLUMN_SLACK: f32 = 10.0;

/// Spans sharing a baseline.
#[derive(Debug, Clone)]
struct Row {
    spans: Vec<TextSpan>,
}

/// Alignment-based table detector.
#[derive(Debug, Clone, Default)]
pub struct StreamDetector {
    config: StreamConfig,
}

impl StreamDetector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: StreamConfig) -> Self {
        Self { config }
    }

    /// Find tables among a page's spans.
    pub fn detect(&self, spans: &[TextSpan]) -> Vec<TableRegion> {
        let cfg = &self.config;
        if spans.len() < cfg.min_rows * cfg.min_columns {
            return Vec::new();
        }

        let rows = self.rows(spans);
        if rows.len() < cfg.min_rows {
            return Vec::new();
        }

        let columns = self.columns(&rows);
        if columns.len() < cfg.min_columns {
            log::debug!("Stream tables: only {} aligned columns", columns.len());
            return Vec::new();
        }

        let mut tables = Vec::new();
        for (start, end) in self.regions(&rows, &columns) {
            let region = &rows[start..=end];
            let local = self.columns(region);

            if local.len() < cfg.min_columns {
                continue;
            }
            if local.len() > cfg.max_columns {
                log::debug!(
                    "Stream tables: rejecting {} columns (max {})",
                    local.len(),
                    cfg.max_columns
                );
                continue;
            }
            if looks_like_list(region, local.len()) {
                log::debug!("Stream tables: rejecting list-like region");
                continue;
            }

            tables.push(build_table(region, &local));
        }

        log::debug!("Stream tables: {} detected", tables.len());
        tables
    }

    fn rows(&self, spans: &[TextSpan]) -> Vec<Row> {
        let mut sorted = spans.to_vec();
        sorted.sort_by(|a, b| b.y.total_cmp(&a.y).then_with(|| a.x.total_cmp(&b.x)));

        let mut rows: Vec<Row> = Vec::new();
        let mut anchor: Option<f32> = None;
        for span in sorted {
            let tolerance = span.font_size * self.config.row_tolerance;
            if anchor.is_some_and(|y| (span.y - y).abs() <= tolerance) {
                if let Some(row) = rows.last_mut() {
                    row.spans.push(span);
                    continue;
                }
            }
            anchor = Some(span.y);
            rows.push(Row { spans: vec![span] });
        }
        rows
    }

    /// Left edges shared by enough rows, merged when closer than the gap.
    fn columns(&self, rows: &[Row]) -> Vec<f32> {
        let multi: Vec<&Row> = rows.iter().filter(|r| r.spans.len() >= 2).collect();

        // With few multi-span rows, count every span instead of every row.
        let (counts, population) = if multi.len() >= self.config.min_rows {
            let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
            for row in &multi {
                let buckets: BTreeSet<i32> = row.spans.iter().map(|s| bucket(s.x)).collect();
                for b in buckets {
                    *counts.entry(b).or_default() += 1;
                }
            }
            (counts, multi.len())
        } else {
            let mut counts: BTreeMap<i32, usize> = BTreeMap::new();
            for span in rows.iter().flat_map(|r| &r.spans) {
                *counts.entry(bucket(span.x)).or_default() += 1;
            }
            (counts, rows.len())
        };

        let threshold = ((population as f32 * self.config.min_alignment) as usize).max(2);
        let mut edges: Vec<f32> = Vec::new();
        for (b, count) in counts {
            if count < threshold {
                continue;
            }
            let edge = b as f32 * EDGE_BUCKET;
            match edges.last() {
                Some(&last) if edge - last < self.config.min_column_gap => {}
                _ => edges.push(edge),
            }
        }
        edges
    }

    /// Index ranges of consecutive rows aligned with `columns`.
    ///
    /// A run starts and ends on a row with at least `min_columns` spans, so
    /// a prose line sitting on a column edge never joins the table.
    fn regions(&self, rows: &[Row], columns: &[f32]) -> Vec<(usize, usize)> {
        let mut regions = Vec::new();
        let mut start: Option<usize> = None;

        for (i, row) in rows.iter().enumerate() {
            if alignment(row, columns) >= self.config.min_alignment {
                start.get_or_insert(i);
                continue;
            }
            if let Some(s) = start.take() {
                regions.extend(self.trim_sparse(rows, s, i - 1));
            }
        }
        if let Some(s) = start {
            regions.extend(self.trim_sparse(rows, s, rows.len() - 1));
        }
        regions
    }

    /// Shrink a run to its first and last multi-span rows.
    fn trim_sparse(&self, rows: &[Row], start: usize, end: usize) -> Option<(usize, usize)> {
        let dense = |i: &usize| rows[*i].spans.len() >= self.config.min_columns;
        let first = (start..=end).find(dense)?;
        let last = (first..=end).rev().find(dense)?;
        (last - first + 1 >= self.config.min_rows).then_some((first, last))
    }
}

fn bucket(x: f32) -> i32 {
    (x / EDGE_BUCKET).round() as i32
}

fn alignment(row: &Row, columns: &[f32]) -> f32 {
    if row.spans.is_empty() || columns.is_empty() {
        return 0.0;
    }
    let aligned = row
        .spans
        .iter()
        .filter(|s| columns.iter().any(|c| (s.x - c).abs() <= ALIGN_TOLERANCE))
        .count();
    aligned as f32 / row.spans.len() as f32
}

fn build_table(rows: &[Row], columns: &[f32]) -> TableRegion {
    let mut bbox: Option<BBox> = None;
    let mut grid = Vec::with_capacity(rows.len());

    for row in rows {
        let mut cells: Vec<Vec<&str>> = vec![Vec::new(); columns.len()];
        for span in &row.spans {
            bbox = Some(match bbox {
                Some(b) => b.union(&span.bbox()),
                None => span.bbox(),
            });
            cells[column_of(span.x, columns)].push(span.text.trim());
        }
        grid.push(cells.into_iter().map(|parts| parts.join(" ")).collect());
    }

    TableRegion::new(bbox.unwrap_or_default(), grid)
}

fn column_of(x: f32, columns: &[f32]) -> usize {
    for (i, &start) in columns.iter().enumerate() {
        let end = columns.get(i + 1).copied().unwrap_or(f32::INFINITY);
        if x >= start - COLUMN_SLACK && x < end - COLUMN_SLACK {
            return i;
        }
    }

    columns
        .iter()
        .enumerate()
        .min_by(|(_, a), (_, b)| (x - **a).abs().total_cmp(&(x - **b).abs()))
        .map(|(i, _)| i)
        .unwrap_or(0)
}

/// A bulleted or numbered list splits into marker and text spans that
/// align like a two-column table.
fn looks_like_list(rows: &[Row], columns: usize) -> bool {
    if rows.is_empty() || columns < 2 {
        return false;
    }

    let mut bullets = 0;
    let mut numbers = 0;
    for row in rows {
        let Some(first) = row.spans.iter().min_by(|a, b| a.x.total_cmp(&b.x)) else {
            continue;
        };
        let marker = first.text.trim();
        if is_bullet(marker) {
            bullets += 1;
        } else if is_numbering(marker) {
            numbers += 1;
        }
    }

    let total = rows.len() as f32;
    if bullets as f32 / total >= 0.5 {
        return true;
    }
    columns == 2 && (bullets + numbers) as f32 / total >= 0.5
}

fn is_bullet(text: &str) -> bool {
    matches!(
        text.trim(),
        "-" | "–" | "—" | "•" | "·" | "*" | "○" | "▪" | "◦" | "▸" | "▹" | "►" | "■" | "●" | "※"
            | "□" | "◆" | "◇" | "▶" | "▷" | "☞" | "➤" | "➜"
    )
}

/// `1.`, `12)`, a bare `3`, `a.` or `B)`.
fn is_numbering(text: &str) -> bool {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return false;
    }
    if compact.chars().all(|c| c.is_ascii_digit()) {
        return true;
    }

    let digits = compact.chars().take_while(|c| c.is_ascii_digit()).count();
    let rest = &compact[digits..];
    if digits > 0 && (rest == "." || rest == ")") {
        return true;
    }

    let mut chars = compact.chars();
    matches!(
        (chars.next(), chars.next(), chars.next()),
        (Some(c), Some('.' | ')'), None) if c.is_alphabetic()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str, x: f32, y: f32) -> TextSpan {
        TextSpan::new(text, x, y, text.len() as f32 * 6.0, 12.0, "Helvetica")
    }

    #[test]
    fn test_simple_table() {
        let spans = vec![
            span("Name", 10.0, 100.0),
            span("Age", 60.0, 100.0),
            span("Alice", 10.0, 85.0),
            span("30", 60.0, 85.0),
            span("Bob", 10.0, 70.0),
            span("25", 60.0, 70.0),
        ];
        let tables = StreamDetector::new().detect(&spans);
        assert_eq!(tables.len(), 1);
        assert_eq!(
            tables[0].grid,
            vec![
                vec!["Name".to_string(), "Age".to_string()],
                vec!["Alice".to_string(), "30".to_string()],
                vec!["Bob".to_string(), "25".to_string()],
            ]
        );
        let bbox = tables[0].bbox;
        assert_eq!(bbox.x0, 10.0);
        assert_eq!(bbox.y1, 100.0 + 12.0 * 0.8);
        assert_eq!(bbox.y0, 70.0 - 12.0 * 0.2);
    }

    #[test]
    fn test_single_column_is_not_table() {
        let spans = vec![
            span("Line 1", 10.0, 100.0),
            span("Line 2", 10.0, 85.0),
            span("Line 3", 10.0, 70.0),
        ];
        assert!(StreamDetector::new().detect(&spans).is_empty());
    }

    #[test]
    fn test_numbered_list_rejected() {
        let mut spans = Vec::new();
        for (i, item) in ["Setup", "Objects", "Routing", "VPN", "Operations"].iter().enumerate() {
            let y = 400.0 - i as f32 * 30.0;
            spans.push(span(&format!("{}.", i + 1), 50.0, y));
            spans.push(span(item, 80.0, y));
        }
        assert!(StreamDetector::new().detect(&spans).is_empty());
    }

    #[test]
    fn test_bullet_list_rejected() {
        let spans = vec![
            span("-", 50.0, 400.0),
            span("Management", 80.0, 400.0),
            span("-", 50.0, 370.0),
            span("Interface options", 80.0, 370.0),
            span("-", 50.0, 340.0),
            span("Firmware", 80.0, 340.0),
        ];
        assert!(StreamDetector::new().detect(&spans).is_empty());
    }

    #[test]
    fn test_prose_on_column_edge_stays_out() {
        let spans = vec![
            span("An introductory paragraph line.", 10.0, 160.0),
            span("It continues on a second line.", 10.0, 145.0),
            span("Name", 10.0, 100.0),
            span("Age", 60.0, 100.0),
            span("Alice", 10.0, 85.0),
            span("30", 60.0, 85.0),
            span("Bob", 10.0, 70.0),
            span("25", 60.0, 70.0),
            span("Closing remark.", 10.0, 40.0),
        ];
        let tables = StreamDetector::new().detect(&spans);
        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].grid.len(), 3);
        assert_eq!(tables[0].grid[0], vec!["Name".to_string(), "Age".to_string()]);
        assert_eq!(tables[0].bbox.y1, 100.0 + 12.0 * 0.8);
        assert_eq!(tables[0].bbox.y0, 70.0 - 12.0 * 0.2);
    }

    #[test]
    fn test_single_dense_row_is_not_table() {
        let spans = vec![
            span("Name", 10.0, 100.0),
            span("Age", 60.0, 100.0),
            span("Alice is thirty", 10.0, 85.0),
            span("years old", 60.0, 70.0),
        ];
        assert!(StreamDetector::new().detect(&spans).is_empty());
    }

    #[test]
    fn test_markers() {
        for marker in ["1.", "12.", "1)", "1 .", "3", "a.", "B)"] {
            assert!(is_numbering(marker), "{}", marker);
        }
        for bullet in ["-", "•", "*", "–"] {
            assert!(is_bullet(bullet), "{}", bullet);
        }
        for text in ["Name", "Hello World", "Alice", ""] {
            assert!(!is_numbering(text) && !is_bullet(text), "{}", text);
        }
    }

    #[test]
    fn test_column_assignment() {
        let columns = [10.0, 60.0, 120.0];
        assert_eq!(column_of(10.0, &columns), 0);
        assert_eq!(column_of(55.0, &columns), 1);
        assert_eq!(column_of(200.0, &columns), 2);
        assert_eq!(column_of(-50.0, &columns), 0);
    }
}
