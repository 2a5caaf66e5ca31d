// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Path post-processing: polyline compression, port stubs, simplification, shortening, and
//! shared-source junction normalization.

use std::collections::HashSet;

use super::analysis::orthogonal_intersection;
use super::grid::ObstacleGrid;
use super::occupancy::{densify, Occupancy, PointView, SearchGuard};
use super::search::Endpoints;
use crate::model::{Direction, GridPoint, Orientation};

/// Keeps only the first point, the corners, and the last point of a unit-step path.
pub fn compress(path: &[GridPoint]) -> Vec<GridPoint> {
    match path.len() {
        0 => Vec::new(),
        1 => vec![path[0]],
        2 => vec![path[0], path[1]],
        _ => {
            let mut points = Vec::<GridPoint>::new();
            points.push(path[0]);

            let mut prev_dir = path[0].direction_to(path[1]);
            for idx in 1..path.len() - 1 {
                let dir = path[idx].direction_to(path[idx + 1]);
                if dir != prev_dir {
                    points.push(path[idx]);
                    prev_dir = dir;
                }
            }

            if let Some(last) = path.last() {
                points.push(*last);
            }
            points
        }
    }
}

pub fn dedupe(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut out: Vec<GridPoint> = Vec::with_capacity(points.len());
    for &point in points {
        if out.last() != Some(&point) {
            out.push(point);
        }
    }
    out
}

/// Drops interior points lying on a straight line through their neighbours, including
/// points where the path doubles back on itself. Duplicates are dropped as well.
pub fn remove_collinear(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut out: Vec<GridPoint> = Vec::with_capacity(points.len());
    for &point in points {
        if out.last() == Some(&point) {
            continue;
        }
        out.push(point);
        while out.len() >= 3 {
            let n = out.len();
            let (prev, curr, next) = (out[n - 3], out[n - 2], out[n - 1]);
            let vertical = prev.x() == curr.x() && curr.x() == next.x();
            let horizontal = prev.y() == curr.y() && curr.y() == next.y();
            if !(vertical || horizontal) {
                break;
            }
            out.remove(n - 2);
        }
    }
    out
}

/// Removes loops: when a segment crosses an earlier non-adjacent one, the path is cut at the
/// crossing and everything in between is dropped.
pub fn cut_loops(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut result = remove_collinear(points);
    let mut changed = true;
    while changed && result.len() >= 4 {
        changed = false;
        'scan: for i in 0..result.len() - 1 {
            let (a, b) = (result[i], result[i + 1]);
            for j in 0..i.saturating_sub(1) {
                let (c, d) = (result[j], result[j + 1]);
                let Some(hit) = orthogonal_intersection(a, b, c, d) else {
                    continue;
                };
                let mut joined = result[..=j].to_vec();
                joined.push(hit);
                joined.extend_from_slice(&result[i + 1..]);
                result = remove_collinear(&joined);
                changed = true;
                break 'scan;
            }
        }
    }
    result
}

pub fn simplify(points: &[GridPoint]) -> Vec<GridPoint> {
    cut_loops(points)
}

pub fn path_length(points: &[GridPoint]) -> u32 {
    points.windows(2).map(|w| w[0].manhattan(w[1])).sum()
}

/// Whether `other` lies at least one cell away from `port` straight along `dir`.
fn stub_is_valid(port: GridPoint, other: GridPoint, dir: Direction) -> bool {
    match dir {
        Direction::Right => other.y() == port.y() && other.x() > port.x(),
        Direction::Left => other.y() == port.y() && other.x() < port.x(),
        Direction::Down => other.x() == port.x() && other.y() > port.y(),
        Direction::Up => other.x() == port.x() && other.y() < port.y(),
    }
}

/// Corner joining `stub` to `other` so the segment leaving the stub keeps the stub's axis.
fn stub_corner(stub: GridPoint, other: GridPoint, dir: Direction) -> GridPoint {
    match dir.orientation() {
        Orientation::Horizontal => GridPoint::new(stub.x(), other.y()),
        Orientation::Vertical => GridPoint::new(other.x(), stub.y()),
    }
}

/// Makes the polyline start and end exactly at its ports with a straight stub of at least one
/// cell in each port's direction, inserting an L detour where the path turns too early.
pub fn enforce_port_stubs(points: &[GridPoint], endpoints: &Endpoints) -> Vec<GridPoint> {
    let mut out = dedupe(points);
    if out.first() != Some(&endpoints.start) {
        out.insert(0, endpoints.start);
    }
    if out.last() != Some(&endpoints.end) {
        out.push(endpoints.end);
    }
    if out.len() < 2 {
        return out;
    }

    let start_stub = endpoints.start_step;
    if !stub_is_valid(endpoints.start, out[1], endpoints.exit) {
        out.insert(1, start_stub);
        let after = out[2];
        if start_stub.x() != after.x() && start_stub.y() != after.y() {
            out.insert(2, stub_corner(start_stub, after, endpoints.exit));
        }
    }

    let end_dir = endpoints.entry.reverse();
    let end_stub = endpoints.end_step;
    let prev = out[out.len() - 2];
    if !stub_is_valid(endpoints.end, prev, end_dir) {
        let at = out.len() - 1;
        if end_stub.x() != prev.x() && end_stub.y() != prev.y() {
            out.insert(at, stub_corner(end_stub, prev, end_dir));
        }
        out.insert(out.len() - 1, end_stub);
    }

    simplify(&out)
}

/// Hard legality of a finished polyline against the current obstacles and occupancy.
#[derive(Debug, Clone, Copy)]
pub struct PathCheck<'a> {
    pub obstacles: &'a ObstacleGrid,
    pub occupancy: &'a Occupancy,
    pub guard: &'a SearchGuard<'a>,
    pub endpoints: &'a Endpoints,
}

impl PathCheck<'_> {
    pub fn accepts(&self, points: &[GridPoint]) -> bool {
        let n = points.len();
        if n < 2 || points[0] != self.endpoints.start || points[n - 1] != self.endpoints.end {
            return false;
        }
        if !points.windows(2).all(|w| w[0].direction_to(w[1]).is_some()) {
            return false;
        }
        if !stub_is_valid(self.endpoints.start, points[1], self.endpoints.exit)
            || !stub_is_valid(self.endpoints.end, points[n - 2], self.endpoints.entry.reverse())
        {
            return false;
        }

        let cells = densify(points);
        let mut seen = HashSet::with_capacity(cells.len());
        if !cells.iter().all(|cell| seen.insert(*cell)) {
            return false;
        }

        for (idx, &cell) in cells.iter().enumerate() {
            if self.obstacles.is_blocked(cell) && !self.guard.allows(cell) {
                return false;
            }
            if idx > 0 && self.occupancy.edge_blocked(cells[idx - 1], cell, self.guard) {
                return false;
            }
            if let PointView::Occupied(info) = self.occupancy.point_view(cell, self.guard) {
                let prev = idx.checked_sub(1).map(|p| cells[p]);
                let next = cells.get(idx + 1).copied();
                let (Some(prev), Some(next)) = (prev, next) else {
                    return false;
                };
                let (Some(dir_in), Some(dir_out)) = (prev.direction_to(cell), cell.direction_to(next))
                else {
                    return false;
                };
                let crosses = match dir_in.orientation() {
                    Orientation::Horizontal => info.vertical,
                    Orientation::Vertical => info.horizontal,
                };
                if dir_in != dir_out || !crosses {
                    return false;
                }
            }
        }
        true
    }
}

/// Replaces three-segment windows by an L or a straight line while that makes the path
/// shorter (or equally long with fewer corners) and the result stays legal.
pub fn shorten(points: &[GridPoint], check: &PathCheck<'_>) -> Vec<GridPoint> {
    let mut best = points.to_vec();
    loop {
        let score = (path_length(&best), best.len());
        let mut improved = None;

        'windows: for i in 0..best.len().saturating_sub(3) {
            let (a, d) = (best[i], best[i + 3]);
            let middles: Vec<Option<GridPoint>> = if a.x() == d.x() || a.y() == d.y() {
                vec![None]
            } else {
                vec![Some(GridPoint::new(d.x(), a.y())), Some(GridPoint::new(a.x(), d.y()))]
            };
            for middle in middles {
                let mut candidate = best[..=i].to_vec();
                candidate.extend(middle);
                candidate.extend_from_slice(&best[i + 3..]);
                let candidate = simplify(&candidate);
                if (path_length(&candidate), candidate.len()) < score && check.accepts(&candidate) {
                    improved = Some(candidate);
                    break 'windows;
                }
            }
        }

        match improved {
            Some(candidate) => best = candidate,
            None => return best,
        }
    }
}

/// A freshly routed wire taking part in shared-source junction normalization.
#[derive(Debug, Clone)]
pub struct JunctionMember<'a> {
    pub points: Vec<GridPoint>,
    pub endpoints: Endpoints,
    pub guard: SearchGuard<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    Straight,
    /// Stub, perpendicular run, entering the port; the bend column is pinned.
    Anchored(i32),
    /// Stub, one perpendicular jog, straight on to the port.
    Jog { column: i32, far: i32 },
}

fn along(p: GridPoint, axis: Orientation) -> i32 {
    match axis {
        Orientation::Horizontal => p.x(),
        Orientation::Vertical => p.y(),
    }
}

fn across(p: GridPoint, axis: Orientation) -> i32 {
    match axis {
        Orientation::Horizontal => p.y(),
        Orientation::Vertical => p.x(),
    }
}

fn at(column: i32, row: i32, axis: Orientation) -> GridPoint {
    match axis {
        Orientation::Horizontal => GridPoint::new(column, row),
        Orientation::Vertical => GridPoint::new(row, column),
    }
}

fn classify(points: &[GridPoint], exit: Direction) -> Option<Shape> {
    let axis = exit.orientation();
    if points.len() < 2 || points[0].direction_to(points[1]) != Some(exit) {
        return None;
    }
    match points.len() {
        2 => Some(Shape::Straight),
        3 => {
            let turn = points[1].direction_to(points[2])?;
            (turn.orientation() != axis).then_some(Shape::Anchored(along(points[1], axis)))
        }
        4 => {
            let jog = points[1].direction_to(points[2])?;
            let run = points[2].direction_to(points[3])?;
            (jog.orientation() != axis && run == exit).then(|| Shape::Jog {
                column: along(points[1], axis),
                far: along(points[3], axis),
            })
        }
        _ => None,
    }
}

/// Snaps the bends of wires leaving one source port to a single shared column (or row).
///
/// Only handles groups whose members are straight, a single stub-then-turn L, or a
/// stub-jog-straight Z; any other shape leaves the whole group untouched. Returns whether the
/// members were rewritten.
pub fn normalize_junctions(
    members: &mut [JunctionMember<'_>],
    obstacles: &ObstacleGrid,
    occupancy: &Occupancy,
    preferred_stub: u32,
) -> bool {
    let Some(first) = members.first() else {
        return false;
    };
    let start = first.endpoints.start;
    let exit = first.endpoints.exit;
    if members.iter().any(|m| m.endpoints.start != start || m.endpoints.exit != exit) {
        return false;
    }

    let Some(shapes) = members
        .iter()
        .map(|m| classify(&m.points, exit))
        .collect::<Option<Vec<_>>>()
    else {
        return false;
    };

    let axis = exit.orientation();
    let sign = match exit {
        Direction::Right | Direction::Down => 1,
        Direction::Left | Direction::Up => -1,
    };
    let origin = along(start, axis);

    let mut anchors = shapes.iter().filter_map(|s| match s {
        Shape::Anchored(column) => Some(*column),
        _ => None,
    });
    let anchor = anchors.next();
    if anchors.any(|other| Some(other) != anchor) {
        return false;
    }

    let columns: Vec<i32> = shapes
        .iter()
        .filter_map(|s| match s {
            Shape::Anchored(column) | Shape::Jog { column, .. } => Some(*column),
            Shape::Straight => None,
        })
        .collect();
    if columns.len() < 2 || columns.iter().all(|c| *c == columns[0]) {
        return false;
    }

    // Furthest usable column: every jog keeps at least one cell before its port.
    let reach = shapes
        .iter()
        .filter_map(|s| match s {
            Shape::Jog { far, .. } => Some(sign * (far - origin) - 1),
            _ => None,
        })
        .min()
        .unwrap_or(0);

    let candidates: Vec<i32> = match anchor {
        Some(column) => vec![sign * (column - origin)],
        None => {
            let preferred = (preferred_stub.max(1) as i32).min(reach.max(1));
            (preferred..=reach).chain((1..preferred).rev()).collect()
        }
    };

    for distance in candidates {
        if distance < 1 || distance > reach {
            continue;
        }
        let column = origin + sign * distance;
        let rewritten: Option<Vec<Vec<GridPoint>>> = members
            .iter()
            .zip(&shapes)
            .map(|(member, shape)| match shape {
                Shape::Jog { .. } => {
                    let end = member.endpoints.end;
                    let points = vec![
                        start,
                        at(column, across(start, axis), axis),
                        at(column, across(end, axis), axis),
                        end,
                    ];
                    let check = PathCheck {
                        obstacles,
                        occupancy,
                        guard: &member.guard,
                        endpoints: &member.endpoints,
                    };
                    check.accepts(&points).then_some(points)
                }
                _ => Some(member.points.clone()),
            })
            .collect();

        if let Some(rewritten) = rewritten {
            for (member, points) in members.iter_mut().zip(rewritten) {
                member.points = points;
            }
            return true;
        }
    }
    false
}
