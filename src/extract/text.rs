//! Text box construction.
//!
//! Spans sharing a baseline become lines; lines stacked closely with a
//! common left edge and size become one box, which is emitted as a
//! [`TextRun`].

use unicode_normalization::UnicodeNormalization;

use crate::model::{BBox, TextRun};

use super::content::{is_spaceless_script_char, TextSpan};

/// Baseline tolerance for spans on one line, as a fraction of the size.
const LINE_TOLERANCE: f32 = 0.3;

/// Horizontal gap, in multiples of the size, that splits one baseline
/// into separate lines.
const LINE_SPLIT_GAP: f32 = 2.0;

/// Largest whitespace between stacked lines of one box, in multiples of
/// the size.
const BOX_LINE_GAP: f32 = 1.2;

/// Largest left-edge difference between lines of one box, in points.
const BOX_INDENT: f32 = 20.0;

/// Largest size difference between lines of one box, in points.
const BOX_SIZE_DELTA: f32 = 1.0;

#[derive(Debug, Clone)]
struct Line {
    text: String,
    bbox: BBox,
    font_size: f32,
    is_bold: bool,
}

impl Line {
    fn from_spans(spans: &[TextSpan]) -> Option<Self> {
        let first = spans.first()?;
        let mut bbox = first.bbox();
        let mut font_size = first.font_size;
        let mut is_bold = false;
        for span in spans {
            bbox = bbox.union(&span.bbox());
            font_size = font_size.max(span.font_size);
            is_bold |= span.is_bold;
        }
        Some(Self {
            text: join_spans(spans),
            bbox,
            font_size,
            is_bold,
        })
    }
}

/// Build text runs from a page's spans, top to bottom.
pub fn group_runs(spans: Vec<TextSpan>) -> Vec<TextRun> {
    let lines = group_lines(spans);
    let mut boxes: Vec<Vec<Line>> = Vec::new();

    for line in lines {
        let target = boxes.iter_mut().rev().find(|lines| {
            lines
                .last()
                .is_some_and(|last| continues_box(last, &line))
        });
        match target {
            Some(lines) => lines.push(line),
            None => boxes.push(vec![line]),
        }
    }

    boxes.into_iter().filter_map(|lines| into_run(&lines)).collect()
}

fn continues_box(above: &Line, line: &Line) -> bool {
    let size = above.font_size.max(line.font_size);
    let gap = above.bbox.y0 - line.bbox.y1;
    line.bbox.y1 < above.bbox.y1
        && gap <= BOX_LINE_GAP * size
        && (above.bbox.x0 - line.bbox.x0).abs() <= BOX_INDENT
        && (above.font_size - line.font_size).abs() <= BOX_SIZE_DELTA
}

fn into_run(lines: &[Line]) -> Option<TextRun> {
    let first = lines.first()?;
    let mut bbox = first.bbox;
    let mut font_size = first.font_size;
    let mut is_bold = false;
    for line in lines {
        bbox = bbox.union(&line.bbox);
        font_size = font_size.max(line.font_size);
        is_bold |= line.is_bold;
    }

    let text: String = lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
        .nfc()
        .collect();

    Some(TextRun::new(text, bbox, font_size, is_bold))
}

fn group_lines(mut spans: Vec<TextSpan>) -> Vec<Line> {
    spans.sort_by(|a, b| b.y.total_cmp(&a.y).then_with(|| a.x.total_cmp(&b.x)));

    let mut baselines: Vec<Vec<TextSpan>> = Vec::new();
    let mut anchor: Option<f32> = None;
    for span in spans {
        match anchor {
            Some(y) if (span.y - y).abs() <= span.font_size * LINE_TOLERANCE => {
                if let Some(current) = baselines.last_mut() {
                    current.push(span);
                }
            }
            _ => {
                anchor = Some(span.y);
                baselines.push(vec![span]);
            }
        }
    }

    let mut lines = Vec::new();
    for mut spans in baselines {
        spans.sort_by(|a, b| a.x.total_cmp(&b.x));
        let mut start = 0;
        for i in 1..=spans.len() {
            let split = i == spans.len() || {
                let (prev, next) = (&spans[i - 1], &spans[i]);
                next.x - prev.right() > LINE_SPLIT_GAP * prev.font_size.max(next.font_size)
            };
            if split {
                lines.extend(Line::from_spans(&spans[start..i]));
                start = i;
            }
        }
    }
    lines
}

/// Concatenate spans of one line, inserting spaces at visible gaps.
fn join_spans(spans: &[TextSpan]) -> String {
    let mut out = String::new();
    for (i, span) in spans.iter().enumerate() {
        if i > 0 {
            let prev = &spans[i - 1];
            if needs_space(prev, span) {
                out.push(' ');
            }
        }
        out.push_str(&span.text);
    }
    out
}

fn needs_space(prev: &TextSpan, next: &TextSpan) -> bool {
    if prev.text.ends_with([' ', '\u{00A0}']) || next.text.starts_with([' ', '\u{00A0}']) {
        return false;
    }

    let chars = next.text.chars().count();
    let char_width = if chars > 0 && next.width > 0.0 {
        next.width / chars as f32
    } else {
        next.font_size * 0.5
    };
    if next.x - prev.right() <= char_width * 0.2 {
        return false;
    }

    let both_spaceless = prev.text.chars().last().is_some_and(is_spaceless_script_char)
        && next.text.chars().next().is_some_and(is_spaceless_script_char);
    !both_spaceless
}
