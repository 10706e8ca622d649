//! Heading inference from font-size statistics.
//!
//! The most frequent size on a page is taken as body text; every larger size
//! is a heading candidate, ranked from largest (level 1) downward.

use crate::config::DEFAULT_MAX_HEADING_LEVEL;
use crate::model::Element;

/// Assigns heading levels from the font sizes observed on one page.
#[derive(Debug, Clone, Copy)]
pub struct HeadingClassifier {
    max_level: u8,
}

impl HeadingClassifier {
    /// Create a classifier capping levels at `max_level` (at least 1).
    pub fn new(max_level: u8) -> Self {
        Self {
            max_level: max_level.max(1),
        }
    }

    /// Deepest level this classifier assigns.
    pub fn max_level(&self) -> u8 {
        self.max_level
    }

    /// Build the size histogram and derive body size and heading levels.
    pub fn classify<I>(&self, sizes: I) -> Classification
    where
        I: IntoIterator<Item = f32>,
    {
        // Distinct sizes in first-encounter order with their counts.
        let mut histogram: Vec<(f32, usize)> = Vec::new();
        for size in sizes {
            if size.is_nan() {
                continue;
            }
            match histogram.iter_mut().find(|(s, _)| *s == size) {
                Some((_, count)) => *count += 1,
                None => histogram.push((size, 1)),
            }
        }

        // Ties go to the size seen first.
        let mut body: Option<(f32, usize)> = None;
        for &(size, count) in &histogram {
            if body.map_or(true, |(_, best)| count > best) {
                body = Some((size, count));
            }
        }

        let Some((body_size, _)) = body else {
            return Classification::default();
        };

        let mut heading_sizes: Vec<f32> = histogram
            .iter()
            .map(|(s, _)| *s)
            .filter(|s| *s > body_size)
            .collect();
        heading_sizes.sort_by(|a, b| b.total_cmp(a));

        let levels = heading_sizes
            .into_iter()
            .enumerate()
            .map(|(i, size)| (size, ((i + 1).min(self.max_level as usize)) as u8))
            .collect::<Vec<_>>();

        log::debug!(
            "Heading classification: body={} headings={:?}",
            body_size,
            levels
        );

        Classification {
            body_size: Some(body_size),
            levels,
        }
    }
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_HEADING_LEVEL)
    }
}

/// Result of classifying one page's font sizes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    body_size: Option<f32>,
    levels: Vec<(f32, u8)>,
}

impl Classification {
    /// The body text size, if the page had any text.
    pub fn body_size(&self) -> Option<f32> {
        self.body_size
    }

    /// Heading sizes, largest first, with their level.
    pub fn levels(&self) -> &[(f32, u8)] {
        &self.levels
    }

    /// Level mapped to `size`, regardless of boldness.
    pub fn level_of(&self, size: f32) -> Option<u8> {
        self.levels
            .iter()
            .find(|(s, _)| *s == size)
            .map(|(_, level)| *level)
    }

    /// Heading level for a run of the given size and weight.
    ///
    /// A run is a heading when its size is in the map and it is either larger
    /// than body text or bold.
    pub fn heading_level(&self, size: f32, is_bold: bool) -> Option<u8> {
        let level = self.level_of(size)?;
        let larger = self.body_size.is_some_and(|body| size > body);
        (larger || is_bold).then_some(level)
    }

    /// Promote qualifying text elements to headings; other elements pass through.
    pub fn apply(&self, elements: Vec<Element>) -> Vec<Element> {
        elements
            .into_iter()
            .map(|element| {
                if !element.is_text() {
                    return element;
                }
                let size = element.font_size.unwrap_or(0.0);
                let bold = element.is_bold.unwrap_or(false);
                match self.heading_level(size, bold) {
                    Some(level) => element.into_heading(level),
                    None => element,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BBox, ElementKind};

    #[test]
    fn test_body_is_most_frequent() {
        let c = HeadingClassifier::default().classify([12.0, 12.0, 18.0, 12.0, 14.0]);
        assert_eq!(c.body_size(), Some(12.0));
        assert_eq!(c.levels(), &[(18.0, 1), (14.0, 2)]);
    }

    #[test]
    fn test_ties_broken_by_first_encounter() {
        let c = HeadingClassifier::default().classify([14.0, 10.0, 10.0, 14.0]);
        assert_eq!(c.body_size(), Some(14.0));
        assert!(c.levels().is_empty());

        let c = HeadingClassifier::default().classify([10.0, 14.0, 14.0, 10.0]);
        assert_eq!(c.body_size(), Some(10.0));
        assert_eq!(c.levels(), &[(14.0, 1)]);
    }

    #[test]
    fn test_levels_capped() {
        let sizes = [10.0, 10.0, 10.0, 30.0, 26.0, 22.0, 18.0, 14.0, 12.0];
        let c = HeadingClassifier::new(4).classify(sizes);
        assert_eq!(c.level_of(30.0), Some(1));
        assert_eq!(c.level_of(26.0), Some(2));
        assert_eq!(c.level_of(22.0), Some(3));
        assert_eq!(c.level_of(18.0), Some(4));
        assert_eq!(c.level_of(14.0), Some(4));
        assert_eq!(c.level_of(12.0), Some(4));
        assert_eq!(c.level_of(10.0), None);
    }

    #[test]
    fn test_monotonic_levels() {
        let sizes = [9.0, 9.0, 9.0, 9.5, 11.0, 13.0, 24.0, 16.0, 13.0, 40.0];
        for max in 1..=5 {
            let c = HeadingClassifier::new(max).classify(sizes);
            let levels = c.levels();
            for pair in levels.windows(2) {
                assert!(pair[0].0 > pair[1].0);
                assert!(pair[0].1 <= pair[1].1);
            }
        }
    }

    #[test]
    fn test_empty_page() {
        let c = HeadingClassifier::default().classify(std::iter::empty());
        assert_eq!(c.body_size(), None);
        assert!(c.levels().is_empty());
        assert_eq!(c.heading_level(20.0, true), None);
    }

    #[test]
    fn test_bold_body_text_is_not_heading() {
        let c = HeadingClassifier::default().classify([12.0, 12.0, 16.0]);
        assert_eq!(c.heading_level(12.0, true), None);
        assert_eq!(c.heading_level(16.0, false), Some(1));
        assert_eq!(c.heading_level(16.0, true), Some(1));
    }

    #[test]
    fn test_apply_promotes_text_only() {
        let elements = vec![
            Element::text("Title", BBox::new(0.0, 700.0, 100.0, 720.0), 18.0, false),
            Element::text("body", BBox::new(0.0, 600.0, 100.0, 612.0), 12.0, false),
            Element::text("more", BBox::new(0.0, 580.0, 100.0, 592.0), 12.0, false),
            Element::image("![Image 0](a.png)", BBox::default()),
        ];
        let c = HeadingClassifier::default().classify([18.0, 12.0, 12.0]);
        let out = c.apply(elements);
        assert_eq!(out[0].content, "## Title");
        assert_eq!(out[0].kind, ElementKind::Heading(1));
        assert_eq!(out[1].content, "body");
        assert_eq!(out[3].kind, ElementKind::Image);
    }
}
