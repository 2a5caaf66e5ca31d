// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Reachability recovery for connections the costed search could not route.

use std::time::{Duration, Instant};

use super::grid::{ObstacleGrid, RoutingGrid};
use super::occupancy::{Occupancy, SearchGuard};
use crate::model::{Direction, GridPoint};

const TIME_CHECK_INTERVAL: usize = 256;

#[derive(Debug, Default)]
pub struct BfsScratch {
    grid: Option<RoutingGrid>,
    visit_gen: Vec<u32>,
    came_from: Vec<i32>,
    queue: Vec<GridPoint>,
    queue_head: usize,
    gen: u32,
}

impl BfsScratch {
    fn configure(&mut self, grid: RoutingGrid) {
        let len = grid.len();
        if self.grid != Some(grid) {
            self.grid = Some(grid);
            self.visit_gen = vec![0u32; len];
            self.came_from = vec![-1i32; len];
            self.gen = 0;
        }
        let reserve_hint = len.min(4096);
        self.queue.reserve(reserve_hint.saturating_sub(self.queue.len()));
    }

    fn begin(&mut self) -> u32 {
        self.gen = self.gen.wrapping_add(1);
        if self.gen == 0 {
            self.visit_gen.fill(0);
            self.gen = 1;
        }
        self.queue.clear();
        self.queue_head = 0;
        self.gen
    }

    fn visit(&mut self, idx: usize, gen: u32, came_from: i32) -> bool {
        if self.visit_gen[idx] == gen {
            return false;
        }

        self.visit_gen[idx] = gen;
        self.came_from[idx] = came_from;
        true
    }
}

/// Headings ordered so the goal-facing ones come first.
fn directions_towards(current: GridPoint, goal: GridPoint) -> [Direction; 4] {
    let dx = goal.x() - current.x();
    let dy = goal.y() - current.y();

    let primary_x = match dx.signum() {
        1 => Some(Direction::Right),
        -1 => Some(Direction::Left),
        _ => None,
    };
    let primary_y = match dy.signum() {
        1 => Some(Direction::Down),
        -1 => Some(Direction::Up),
        _ => None,
    };

    let mut out = [Direction::Right; 4];
    let mut idx = 0usize;
    for dir in [primary_x, primary_y].into_iter().flatten() {
        out[idx] = dir;
        idx += 1;
    }

    // Vertical detours before moving horizontally away from the goal.
    for dir in [Direction::Down, Direction::Up, Direction::Right, Direction::Left] {
        if primary_x == Some(dir) || primary_y == Some(dir) {
            continue;
        }
        out[idx] = dir;
        idx += 1;
    }

    debug_assert_eq!(idx, 4);
    out
}

/// Breadth-first cell path from `start` to `goal`.
///
/// Ignores every cost and only respects obstacles (except the guard's allowed cells), edges
/// drawn by unrelated wires and the `avoid` cells, which are never entered. Returns `None`
/// when the goal is unreachable or `budget` expires.
#[allow(clippy::too_many_arguments)]
pub fn reachability_path(
    start: GridPoint,
    goal: GridPoint,
    avoid: &[GridPoint],
    obstacles: &ObstacleGrid,
    occupancy: &Occupancy,
    guard: &SearchGuard<'_>,
    scratch: &mut BfsScratch,
    budget: Duration,
) -> Option<Vec<GridPoint>> {
    if start == goal {
        return Some(vec![start]);
    }

    let started = Instant::now();
    let grid = obstacles.grid();
    scratch.configure(grid);
    let start_idx = grid.idx_of(start)?;
    let goal_idx = grid.idx_of(goal)?;

    let gen = scratch.begin();
    for &cell in avoid {
        if cell == start || cell == goal {
            continue;
        }
        if let Some(idx) = grid.idx_of(cell) {
            scratch.visit(idx, gen, -1);
        }
    }
    scratch.visit(start_idx, gen, -1);
    scratch.queue.push(start);

    while let Some(&current) = scratch.queue.get(scratch.queue_head) {
        scratch.queue_head += 1;
        if scratch.queue_head % TIME_CHECK_INTERVAL == 0 && started.elapsed() > budget {
            return None;
        }

        if current == goal {
            let mut path = vec![goal];
            let mut cursor_idx = goal_idx;
            while cursor_idx != start_idx {
                let prev_idx = scratch.came_from[cursor_idx];
                if prev_idx < 0 {
                    return None;
                }
                let prev_idx = prev_idx as usize;
                path.push(grid.point_of(prev_idx));
                cursor_idx = prev_idx;
            }
            path.reverse();
            return Some(path);
        }

        let current_idx = grid.idx_of(current)?;
        for dir in directions_towards(current, goal) {
            let next = current.step(dir);
            let Some(next_idx) = grid.idx_of(next) else {
                continue;
            };
            if obstacles.is_blocked_idx(next_idx) && !guard.allows(next) {
                continue;
            }
            if occupancy.edge_blocked(current, next, guard) {
                continue;
            }
            if scratch.visit(next_idx, gen, current_idx as i32) {
                scratch.queue.push(next);
            }
        }
    }

    None
}

/// Last-resort polyline ignoring obstacles: straight when aligned, otherwise one bend
/// (vertical first, then horizontal).
pub fn fallback_polyline(start: GridPoint, goal: GridPoint) -> Vec<GridPoint> {
    if start == goal {
        return vec![start];
    }
    if start.x() == goal.x() || start.y() == goal.y() {
        return vec![start, goal];
    }
    vec![start, GridPoint::new(start.x(), goal.y()), goal]
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{directions_towards, fallback_polyline, reachability_path, BfsScratch};
    use crate::model::{Connection, Direction, GridPoint, ObstacleRect, PortId};
    use crate::route::grid::{GridBounds, ObstacleGrid, RoutingGrid};
    use crate::route::occupancy::{Occupancy, SearchGuard, WireOwner};

    fn gp(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    fn owner(from: &str, to: &str) -> WireOwner {
        WireOwner::of(&Connection::with_index_key(
            PortId::new(from).unwrap(),
            PortId::new(to).unwrap(),
            0,
        ))
    }

    fn grid() -> RoutingGrid {
        RoutingGrid::new(GridBounds { min_x: -5, max_x: 15, min_y: -5, max_y: 15 })
    }

    #[test]
    fn bfs_goes_around_obstacles() {
        let obstacles = ObstacleGrid::build(grid(), &[ObstacleRect::new(5, -3, 5, 3)]);
        let occupancy = Occupancy::new(grid());
        let me = owner("a", "b");
        let guard = SearchGuard::new(&me, []);
        let mut scratch = BfsScratch::default();
        let path = reachability_path(
            gp(0, 0),
            gp(10, 0),
            &[],
            &obstacles,
            &occupancy,
            &guard,
            &mut scratch,
            Duration::from_secs(5),
        )
        .expect("reachable");

        assert_eq!(path.first(), Some(&gp(0, 0)));
        assert_eq!(path.last(), Some(&gp(10, 0)));
        assert!(path.iter().all(|p| !obstacles.is_blocked(*p)));
        assert!(path.windows(2).all(|w| w[0].manhattan(w[1]) == 1));
        assert_eq!(path.len(), 19, "shortest detour around a seven cell wall");
    }

    #[test]
    fn bfs_respects_foreign_edges_but_not_sibling_edges() {
        let mut occupancy = Occupancy::new(grid());
        occupancy.add_wire(owner("x", "y"), &[gp(0, 0), gp(3, 0)]);
        let obstacles = ObstacleGrid::build(grid(), &[]);
        let mut scratch = BfsScratch::default();

        let stranger = owner("a", "b");
        let guard = SearchGuard::new(&stranger, []);
        let path = reachability_path(
            gp(0, 0),
            gp(3, 0),
            &[],
            &obstacles,
            &occupancy,
            &guard,
            &mut scratch,
            Duration::from_secs(5),
        )
        .expect("reachable");
        assert!(path.len() > 4, "must leave the occupied row");

        let sibling = owner("x", "z");
        let guard = SearchGuard::new(&sibling, []);
        let path = reachability_path(
            gp(0, 0),
            gp(3, 0),
            &[],
            &obstacles,
            &occupancy,
            &guard,
            &mut scratch,
            Duration::from_secs(5),
        )
        .expect("reachable");
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn bfs_returns_none_when_sealed() {
        let obstacles = ObstacleGrid::build(
            grid(),
            &[
                ObstacleRect::new(8, -1, 12, -1),
                ObstacleRect::new(8, 1, 12, 1),
                ObstacleRect::new(8, 0, 8, 0),
                ObstacleRect::new(12, 0, 12, 0),
            ],
        );
        let occupancy = Occupancy::new(grid());
        let me = owner("a", "b");
        let guard = SearchGuard::new(&me, []);
        let mut scratch = BfsScratch::default();
        let path = reachability_path(
            gp(0, 0),
            gp(10, 0),
            &[],
            &obstacles,
            &occupancy,
            &guard,
            &mut scratch,
            Duration::from_secs(5),
        );
        assert_eq!(path, None);
    }

    #[test]
    fn bfs_never_enters_avoided_cells() {
        let obstacles = ObstacleGrid::build(
            grid(),
            &[ObstacleRect::new(5, -5, 5, -1), ObstacleRect::new(5, 1, 5, 15)],
        );
        let occupancy = Occupancy::new(grid());
        let me = owner("a", "b");
        let guard = SearchGuard::new(&me, []);
        let mut scratch = BfsScratch::default();
        let mut search = |avoid: &[GridPoint]| {
            reachability_path(
                gp(0, 0),
                gp(10, 0),
                avoid,
                &obstacles,
                &occupancy,
                &guard,
                &mut scratch,
                Duration::from_secs(5),
            )
        };

        let through_gap = search(&[]).expect("gap is open");
        assert!(through_gap.contains(&gp(5, 0)));
        assert_eq!(search(&[gp(5, 0)]), None);
        assert!(search(&[gp(0, 0), gp(10, 0)]).is_some(), "endpoints are never avoided");
    }

    #[test]
    fn goal_facing_directions_come_first() {
        let order = directions_towards(gp(0, 0), gp(3, -2));
        assert_eq!(order, [Direction::Right, Direction::Up, Direction::Down, Direction::Left]);
    }

    #[test]
    fn fallback_bends_once() {
        assert_eq!(fallback_polyline(gp(0, 0), gp(0, 0)), vec![gp(0, 0)]);
        assert_eq!(fallback_polyline(gp(0, 0), gp(5, 0)), vec![gp(0, 0), gp(5, 0)]);
        assert_eq!(
            fallback_polyline(gp(0, 0), gp(5, 3)),
            vec![gp(0, 0), gp(0, 3), gp(5, 3)]
        );
    }
}
