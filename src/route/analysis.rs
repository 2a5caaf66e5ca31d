// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Geometry quality checks over a finished solution.

use serde::Serialize;

use crate::model::{Connection, ConnectionKey, GridPoint, Solution};

/// Crossing point of a horizontal and a vertical segment, strictly inside both.
pub fn orthogonal_intersection(
    a: GridPoint,
    b: GridPoint,
    c: GridPoint,
    d: GridPoint,
) -> Option<GridPoint> {
    let first_horizontal = a.y() == b.y();
    let second_horizontal = c.y() == d.y();
    if first_horizontal == second_horizontal {
        return None;
    }
    let ((h0, h1), (v0, v1)) = if first_horizontal { ((a, b), (c, d)) } else { ((c, d), (a, b)) };
    let (hx0, hx1) = (h0.x().min(h1.x()), h0.x().max(h1.x()));
    let (vy0, vy1) = (v0.y().min(v1.y()), v0.y().max(v1.y()));
    let (ix, iy) = (v0.x(), h0.y());
    (ix > hx0 && ix < hx1 && iy > vy0 && iy < vy1).then(|| GridPoint::new(ix, iy))
}

/// Whether two axis-aligned segments share at least one point.
fn segments_touch(a: GridPoint, b: GridPoint, c: GridPoint, d: GridPoint) -> bool {
    let (ax0, ax1) = (a.x().min(b.x()), a.x().max(b.x()));
    let (ay0, ay1) = (a.y().min(b.y()), a.y().max(b.y()));
    let (cx0, cx1) = (c.x().min(d.x()), c.x().max(d.x()));
    let (cy0, cy1) = (c.y().min(d.y()), c.y().max(d.y()));
    ax0 <= cx1 && cx0 <= ax1 && ay0 <= cy1 && cy0 <= ay1
}

/// Whether two segments run along the same line and share a stretch of positive length.
pub fn collinear_overlap(a: GridPoint, b: GridPoint, c: GridPoint, d: GridPoint) -> bool {
    let horizontal = a.y() == b.y() && c.y() == d.y() && a.y() == c.y() && a.x() != b.x();
    let vertical = a.x() == b.x() && c.x() == d.x() && a.x() == c.x() && a.y() != b.y();
    let (lo, hi, other_lo, other_hi) = if horizontal {
        (a.x().min(b.x()), a.x().max(b.x()), c.x().min(d.x()), c.x().max(d.x()))
    } else if vertical {
        (a.y().min(b.y()), a.y().max(b.y()), c.y().min(d.y()), c.y().max(d.y()))
    } else {
        return false;
    };
    lo.max(other_lo) < hi.min(other_hi)
}

pub fn is_orthogonal(points: &[GridPoint]) -> bool {
    points.windows(2).all(|w| w[0].x() == w[1].x() || w[0].y() == w[1].y())
}

/// Whether any two non-adjacent segments of the polyline meet.
pub fn self_crosses(points: &[GridPoint]) -> bool {
    let segments: Vec<(GridPoint, GridPoint)> = points.windows(2).map(|w| (w[0], w[1])).collect();
    for i in 0..segments.len() {
        for j in 0..i.saturating_sub(1) {
            let (a, b) = segments[i];
            let (c, d) = segments[j];
            if segments_touch(a, b, c, d) {
                return true;
            }
        }
    }
    false
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GeometryReport {
    pub non_orthogonal: Vec<ConnectionKey>,
    pub self_crossing: Vec<ConnectionKey>,
    /// Pairs of unrelated wires sharing a collinear stretch.
    pub overlaps: Vec<(ConnectionKey, ConnectionKey)>,
}

impl GeometryReport {
    pub fn is_clean(&self) -> bool {
        self.non_orthogonal.is_empty() && self.self_crossing.is_empty() && self.overlaps.is_empty()
    }
}

pub fn analyze(solution: &Solution, connections: &[Connection]) -> GeometryReport {
    let mut report = GeometryReport::default();
    let routed: Vec<(&Connection, &[GridPoint])> = connections
        .iter()
        .filter_map(|conn| solution.wire(conn.key().as_str()).map(|w| (conn, w.points.as_slice())))
        .collect();

    for (conn, points) in &routed {
        if !is_orthogonal(points) {
            report.non_orthogonal.push(conn.key().clone());
        }
        if self_crosses(points) {
            report.self_crossing.push(conn.key().clone());
        }
    }

    for (i, (first, first_points)) in routed.iter().enumerate() {
        for (second, second_points) in &routed[i + 1..] {
            if first.is_sibling_of(second) {
                continue;
            }
            let overlapping = first_points.windows(2).any(|s| {
                second_points.windows(2).any(|t| collinear_overlap(s[0], s[1], t[0], t[1]))
            });
            if overlapping {
                report.overlaps.push((first.key().clone(), second.key().clone()));
            }
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::{analyze, collinear_overlap, orthogonal_intersection, self_crosses};
    use crate::model::{Connection, GridPoint, PortId, Solution, Wire};

    fn gp(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    #[test]
    fn intersection_requires_strict_interior_crossing() {
        assert_eq!(
            orthogonal_intersection(gp(0, 0), gp(4, 0), gp(2, -2), gp(2, 2)),
            Some(gp(2, 0))
        );
        assert_eq!(orthogonal_intersection(gp(0, 0), gp(4, 0), gp(4, -2), gp(4, 2)), None);
        assert_eq!(orthogonal_intersection(gp(0, 0), gp(4, 0), gp(1, 0), gp(3, 0)), None);
    }

    #[test]
    fn overlap_needs_positive_length() {
        assert!(collinear_overlap(gp(0, 0), gp(4, 0), gp(3, 0), gp(9, 0)));
        assert!(!collinear_overlap(gp(0, 0), gp(4, 0), gp(4, 0), gp(9, 0)));
        assert!(!collinear_overlap(gp(0, 0), gp(4, 0), gp(0, 1), gp(4, 1)));
    }

    #[test]
    fn detects_self_crossing() {
        assert!(self_crosses(&[gp(0, 0), gp(6, 0), gp(6, 3), gp(3, 3), gp(3, -3)]));
        assert!(!self_crosses(&[gp(0, 0), gp(6, 0), gp(6, 3), gp(9, 3)]));
    }

    #[test]
    fn report_flags_only_unrelated_overlaps() {
        let pid = |v: &str| PortId::new(v).unwrap();
        let ab = Connection::with_index_key(pid("a:out:0"), pid("b:in:0"), 0);
        let ac = Connection::with_index_key(pid("a:out:0"), pid("c:in:0"), 1);
        let xy = Connection::with_index_key(pid("x:out:0"), pid("y:in:0"), 2);

        let mut solution = Solution::default();
        solution.wires.insert(ab.key().clone(), Wire::from_points(vec![gp(0, 0), gp(10, 0)]));
        solution.wires.insert(ac.key().clone(), Wire::from_points(vec![gp(0, 0), gp(8, 0), gp(8, 4)]));
        solution.wires.insert(xy.key().clone(), Wire::from_points(vec![gp(5, 0), gp(12, 0)]));

        let report = analyze(&solution, &[ab.clone(), ac.clone(), xy.clone()]);
        assert!(report.non_orthogonal.is_empty());
        assert_eq!(
            report.overlaps,
            vec![(ab.key().clone(), xy.key().clone()), (ac.key().clone(), xy.key().clone())]
        );
        assert!(!report.is_clean());
    }
}
