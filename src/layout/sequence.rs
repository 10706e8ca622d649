//! Reading-order sequencing and Markdown serialization.
//!
//! Elements are ordered top to bottom by their top edge, then left to right.
//! The key has no notion of columns, so true multi-column pages interleave.

use std::cmp::Ordering;
use std::fmt::Write as _;

use crate::model::{Element, TableRegion};

use super::cleaner::clean;

/// Order elements for reading.
///
/// Elements with an empty payload or a malformed bounding box are dropped.
/// The sort is stable: elements sharing `(y1, x0)` keep their input order.
pub fn sequence(elements: Vec<Element>) -> Vec<Element> {
    let mut kept: Vec<Element> = elements
        .into_iter()
        .filter(|e| {
            let keep = !e.content.is_empty() && e.bbox.is_well_formed();
            if !keep {
                log::debug!("Dropping degenerate element: {:?}", e);
            }
            keep
        })
        .collect();

    kept.sort_by(reading_order);
    kept
}

/// Comparator for `(−y1, x0)` ordering.
pub fn reading_order(a: &Element, b: &Element) -> Ordering {
    b.bbox
        .y1
        .total_cmp(&a.bbox.y1)
        .then_with(|| a.bbox.x0.total_cmp(&b.bbox.x0))
}

/// Concatenate element payloads, each followed by a blank line.
pub fn render(elements: &[Element]) -> String {
    let mut out = String::new();
    for element in elements {
        if element.content.is_empty() {
            continue;
        }
        out.push_str(&element.content);
        out.push_str("\n\n");
    }
    out
}

/// Serialize a table region as a labelled pipe table.
///
/// The header row holds the zero-based column indices; every grid row
/// follows as a body row. Cells are cleaned and short rows padded.
pub fn render_table(table: &TableRegion) -> String {
    let columns = table.column_count();
    let mut lines: Vec<String> = Vec::with_capacity(table.row_count() + 4);

    lines.push("#### Table\n".to_string());

    let header: Vec<String> = (0..columns).map(|i| i.to_string()).collect();
    lines.push(pipe_row(&header));
    lines.push(pipe_row(&vec!["---".to_string(); columns]));

    for row in &table.grid {
        let cells: Vec<String> = (0..columns)
            .map(|i| {
                row.get(i)
                    .map(|cell| clean(cell).replace('\n', " "))
                    .unwrap_or_default()
            })
            .collect();
        lines.push(pipe_row(&cells));
    }

    lines.push("\n".to_string());
    lines.join("\n")
}

fn pipe_row(cells: &[String]) -> String {
    let mut row = String::from("|");
    for cell in cells {
        let _ = write!(row, " {} |", cell);
    }
    row
}

/// Markdown reference for the `index`-th image on a page.
pub fn image_reference(index: usize, path: &str) -> String {
    format!("![Image {}]({})", index, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::BBox;

    fn at(name: &str, x0: f32, y1: f32) -> Element {
        Element::text(name, BBox::new(x0, y1 - 10.0, x0 + 20.0, y1), 12.0, false)
    }

    #[test]
    fn test_top_to_bottom_left_to_right() {
        let out = sequence(vec![at("a", 50.0, 500.0), at("b", 10.0, 500.0), at("c", 0.0, 300.0)]);
        let names: Vec<&str> = out.iter().map(|e| e.content.as_str()).collect();
        assert_eq!(names, ["b", "a", "c"]);
    }

    #[test]
    fn test_stable_for_equal_keys() {
        let out = sequence(vec![at("first", 10.0, 400.0), at("second", 10.0, 400.0)]);
        assert_eq!(out[0].content, "first");
        assert_eq!(out[1].content, "second");

        let out = sequence(vec![at("second", 10.0, 400.0), at("first", 10.0, 400.0)]);
        assert_eq!(out[0].content, "second");
    }

    #[test]
    fn test_degenerate_dropped() {
        let bad = Element::text("x", BBox::new(10.0, 0.0, 5.0, 1.0), 12.0, false);
        let empty = Element::text("", BBox::new(0.0, 0.0, 1.0, 1.0), 12.0, false);
        let out = sequence(vec![bad, empty, at("ok", 0.0, 10.0)]);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].content, "ok");
    }

    #[test]
    fn test_render_blank_line_after_each() {
        let out = render(&[at("a", 0.0, 10.0), at("b", 0.0, 5.0)]);
        assert_eq!(out, "a\n\nb\n\n");
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn test_render_table() {
        let table = TableRegion::new(
            BBox::new(0.0, 0.0, 100.0, 50.0),
            vec![
                vec!["Name".into(), "Age".into()],
                vec!["Alice\nSmith".into(), "30".into()],
                vec!["Bob".into()],
            ],
        );
        assert_eq!(
            render_table(&table),
            "#### Table\n\n| 0 | 1 |\n| --- | --- |\n| Name | Age |\n| Alice Smith | 30 |\n| Bob |  |\n\n"
        );
    }

    #[test]
    fn test_image_reference() {
        assert_eq!(image_reference(0, "image_0_0.png"), "![Image 0](image_0_0.png)");
    }
}
