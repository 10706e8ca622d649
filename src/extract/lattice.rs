//! Table detection from ruling lines ("lattice" mode).
//!
//! Painted horizontal and vertical segments are merged into rulings,
//! grouped by intersection, and every group spanning at least two rows
//! or columns of cells becomes a table whose cells collect the spans
//! centred inside them.

use crate::model::{BBox, TableRegion};

use super::content::{Segment, TextSpan};

/// Positions closer than this are the same ruling.
const TOLERANCE: f32 = 2.0;

/// Segments shorter than this are ignored.
const MIN_RULING_LENGTH: f32 = 4.0;

/// An axis-aligned ruling: `pos` is y for horizontals and x for verticals;
/// `start..end` is the extent along the other axis.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Ruling {
    pos: f32,
    start: f32,
    end: f32,
}

impl Ruling {
    fn crosses(&self, other: &Ruling) -> bool {
        self.pos >= other.start - TOLERANCE
            && self.pos <= other.end + TOLERANCE
            && other.pos >= self.start - TOLERANCE
            && other.pos <= self.end + TOLERANCE
    }
}

/// Find ruled tables on a page.
pub fn detect(segments: &[Segment], spans: &[TextSpan]) -> Vec<TableRegion> {
    let (horizontal, vertical) = rulings(segments);
    if horizontal.len() < 2 || vertical.len() < 2 {
        return Vec::new();
    }

    let mut tables = Vec::new();
    for (hs, vs) in components(&horizontal, &vertical) {
        let mut ys = cluster(hs.iter().map(|r| r.pos));
        let xs = cluster(vs.iter().map(|r| r.pos));
        if ys.len() < 2 || xs.len() < 2 {
            continue;
        }
        ys.reverse();

        let (rows, cols) = (ys.len() - 1, xs.len() - 1);
        if rows * cols < 2 {
            log::debug!("Lattice tables: ignoring single-cell frame");
            continue;
        }

        let bbox = BBox::new(xs[0], ys[rows], xs[cols], ys[0]);
        tables.push(TableRegion::new(bbox, fill_cells(&xs, &ys, spans)));
    }

    tables.sort_by(|a, b| b.bbox.y1.total_cmp(&a.bbox.y1));
    log::debug!("Lattice tables: {} detected", tables.len());
    tables
}

fn rulings(segments: &[Segment]) -> (Vec<Ruling>, Vec<Ruling>) {
    let mut horizontal = Vec::new();
    let mut vertical = Vec::new();
    for seg in segments {
        if seg.is_horizontal(1.0) {
            horizontal.push(Ruling {
                pos: (seg.y0 + seg.y1) / 2.0,
                start: seg.x0.min(seg.x1),
                end: seg.x0.max(seg.x1),
            });
        } else if seg.is_vertical(1.0) {
            vertical.push(Ruling {
                pos: (seg.x0 + seg.x1) / 2.0,
                start: seg.y0.min(seg.y1),
                end: seg.y0.max(seg.y1),
            });
        }
    }
    (merge_collinear(horizontal), merge_collinear(vertical))
}

/// Join rulings that continue each other along the same line.
fn merge_collinear(mut rulings: Vec<Ruling>) -> Vec<Ruling> {
    rulings.retain(|r| r.end - r.start >= MIN_RULING_LENGTH);
    rulings.sort_by(|a, b| a.pos.total_cmp(&b.pos).then_with(|| a.start.total_cmp(&b.start)));

    let mut merged: Vec<Ruling> = Vec::with_capacity(rulings.len());
    for ruling in rulings {
        match merged.last_mut() {
            Some(last)
                if (ruling.pos - last.pos).abs() <= TOLERANCE
                    && ruling.start <= last.end + TOLERANCE =>
            {
                last.end = last.end.max(ruling.end);
            }
            _ => merged.push(ruling),
        }
    }
    merged
}

/// Groups of horizontals and verticals connected through intersections.
fn components(horizontal: &[Ruling], vertical: &[Ruling]) -> Vec<(Vec<Ruling>, Vec<Ruling>)> {
    let n = horizontal.len();
    let mut parent: Vec<usize> = (0..n + vertical.len()).collect();

    for (i, h) in horizontal.iter().enumerate() {
        for (j, v) in vertical.iter().enumerate() {
            if h.crosses(v) {
                let (a, b) = (find(&mut parent, i), find(&mut parent, n + j));
                if a != b {
                    parent[b] = a;
                }
            }
        }
    }

    let mut groups: Vec<(usize, Vec<Ruling>, Vec<Ruling>)> = Vec::new();
    for idx in 0..parent.len() {
        let root = find(&mut parent, idx);
        let slot = match groups.iter().position(|(r, _, _)| *r == root) {
            Some(pos) => pos,
            None => {
                groups.push((root, Vec::new(), Vec::new()));
                groups.len() - 1
            }
        };
        if idx < n {
            groups[slot].1.push(horizontal[idx]);
        } else {
            groups[slot].2.push(vertical[idx - n]);
        }
    }

    groups
        .into_iter()
        .filter(|(_, hs, vs)| hs.len() >= 2 && vs.len() >= 2)
        .map(|(_, hs, vs)| (hs, vs))
        .collect()
}

fn find(parent: &mut [usize], mut i: usize) -> usize {
    while parent[i] != i {
        parent[i] = parent[parent[i]];
        i = parent[i];
    }
    i
}

/// Distinct positions, ascending, with near duplicates averaged.
fn cluster(positions: impl Iterator<Item = f32>) -> Vec<f32> {
    let mut sorted: Vec<f32> = positions.collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let mut groups: Vec<Vec<f32>> = Vec::new();
    for p in sorted {
        match groups.last_mut() {
            Some(group) if group.last().is_some_and(|&last| p - last <= TOLERANCE) => group.push(p),
            _ => groups.push(vec![p]),
        }
    }
    groups
        .iter()
        .map(|g| g.iter().sum::<f32>() / g.len() as f32)
        .collect()
}

/// Assign spans to cells by their centre. `ys` runs top to bottom.
fn fill_cells(xs: &[f32], ys: &[f32], spans: &[TextSpan]) -> Vec<Vec<String>> {
    let mut ordered: Vec<&TextSpan> = spans.iter().collect();
    ordered.sort_by(|a, b| b.y.total_cmp(&a.y).then_with(|| a.x.total_cmp(&b.x)));

    let mut cells: Vec<Vec<Vec<&str>>> = vec![vec![Vec::new(); xs.len() - 1]; ys.len() - 1];
    for span in ordered {
        let (cx, cy) = span.bbox().center();
        let col = xs.windows(2).position(|w| cx >= w[0] && cx < w[1]);
        let row = ys.windows(2).position(|w| cy <= w[0] && cy > w[1]);
        if let (Some(row), Some(col)) = (row, col) {
            cells[row][col].push(span.text.trim());
        }
    }

    cells
        .into_iter()
        .map(|row| row.into_iter().map(|parts| parts.join(" ")).collect())
        .collect()
}
