//! Suppression of prose that duplicates table content.

use crate::model::{BBox, Element};

/// Tolerance, in points, added to each side of a table region.
pub const OVERLAP_MARGIN: f32 = 5.0;

/// Whether `text` touches any table region grown by `margin`.
pub fn overlaps_any(text: &BBox, tables: &[BBox], margin: f32) -> bool {
    tables.iter().any(|t| t.expand(margin).intersects(text))
}

/// Drop text elements overlapping any table region.
///
/// Non-text elements always pass. Survivors keep their relative order.
pub fn filter_overlapping(elements: Vec<Element>, tables: &[BBox], margin: f32) -> Vec<Element> {
    if tables.is_empty() {
        return elements;
    }

    elements
        .into_iter()
        .filter(|element| {
            if !element.is_text() || !overlaps_any(&element.bbox, tables, margin) {
                return true;
            }
            log::debug!(
                "Dropping text inside table at ({:.1}, {:.1}, {:.1}, {:.1}): {:?}",
                element.bbox.x0,
                element.bbox.y0,
                element.bbox.x1,
                element.bbox.y1,
                element.content
            );
            false
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_at(x0: f32, y0: f32, x1: f32, y1: f32) -> Element {
        Element::text("t", BBox::new(x0, y0, x1, y1), 12.0, false)
    }

    #[test]
    fn test_inside_table_dropped_outside_kept() {
        let tables = [BBox::new(0.0, 0.0, 100.0, 50.0)];
        let out = filter_overlapping(
            vec![text_at(10.0, 10.0, 90.0, 40.0), text_at(0.0, 60.0, 100.0, 80.0)],
            &tables,
            OVERLAP_MARGIN,
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].bbox, BBox::new(0.0, 60.0, 100.0, 80.0));
    }

    #[test]
    fn test_margin_boundary() {
        let tables = [BBox::new(0.0, 0.0, 100.0, 50.0)];
        // Exactly on the expanded edge: y0 = 55 touches 50 + 5.
        assert!(overlaps_any(&BBox::new(0.0, 55.0, 10.0, 60.0), &tables, 5.0));
        assert!(!overlaps_any(&BBox::new(0.0, 55.1, 10.0, 60.0), &tables, 5.0));
        assert!(!overlaps_any(&BBox::new(0.0, 55.0, 10.0, 60.0), &tables, 0.0));
        // Left side.
        assert!(overlaps_any(&BBox::new(-20.0, 10.0, -5.0, 20.0), &tables, 5.0));
        assert!(!overlaps_any(&BBox::new(-20.0, 10.0, -5.5, 20.0), &tables, 5.0));
    }

    #[test]
    fn test_partial_overlap_dropped() {
        let tables = [BBox::new(0.0, 0.0, 100.0, 50.0)];
        let out = filter_overlapping(vec![text_at(90.0, 40.0, 200.0, 70.0)], &tables, 5.0);
        assert!(out.is_empty());
    }

    #[test]
    fn test_non_text_elements_pass() {
        let tables = [BBox::new(0.0, 0.0, 100.0, 50.0)];
        let elements = vec![
            Element::table("#### Table\n", BBox::new(0.0, 0.0, 100.0, 50.0)),
            Element::image("![Image 0](x.png)", BBox::new(10.0, 10.0, 20.0, 20.0)),
        ];
        assert_eq!(filter_overlapping(elements, &tables, 5.0).len(), 2);
    }

    #[test]
    fn test_order_preserved_and_order_independent() {
        let tables = [
            BBox::new(0.0, 0.0, 100.0, 50.0),
            BBox::new(0.0, 300.0, 100.0, 350.0),
        ];
        let elements = vec![
            text_at(0.0, 400.0, 10.0, 410.0),
            text_at(0.0, 310.0, 10.0, 320.0),
            text_at(0.0, 200.0, 10.0, 210.0),
            text_at(0.0, 10.0, 10.0, 20.0),
        ];
        let forward = filter_overlapping(elements.clone(), &tables, 5.0);
        let reversed_tables = [tables[1], tables[0]];
        let backward = filter_overlapping(elements, &reversed_tables, 5.0);
        assert_eq!(forward, backward);
        assert_eq!(forward.len(), 2);
        assert_eq!(forward[0].bbox.y1, 410.0);
        assert_eq!(forward[1].bbox.y1, 210.0);
    }

    #[test]
    fn test_no_tables_is_identity() {
        let elements = vec![text_at(0.0, 0.0, 1.0, 1.0)];
        assert_eq!(filter_overlapping(elements.clone(), &[], 5.0), elements);
    }
}
