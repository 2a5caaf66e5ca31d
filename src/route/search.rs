// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Cost-guided state-space search.
//!
//! A state is a grid cell plus the heading the wire arrived with plus a one-step hop lock.
//! States are stored in dense arrays through a bijective index, `(cell * 4 + heading) * 2 +
//! hop_lock`, and the arrays are reused across searches with generation stamps so a batch of
//! connections only allocates once.
//!
//! Only g-costs and parent links are kept per state. The cost breakdown of the winning path is
//! recomputed by replaying its steps, which evaluates exactly the same step function.

use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use smallvec::SmallVec;

use super::grid::{NearMap, ObstacleGrid, RoutingGrid};
use super::occupancy::{Occupancy, PointView, SearchGuard};
use super::settings::RouterSettings;
use crate::model::{
    ComponentId, Direction, FailureReason, GridPoint, NearBreakdown, Orientation, PortNode,
    WireCost,
};

const NO_PARENT: u32 = u32::MAX;
const TIME_CHECK_INTERVAL: u32 = 64;

/// Resolved endpoint geometry of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Endpoints {
    pub start: GridPoint,
    pub start_step: GridPoint,
    /// Heading of the first step, the source port's exit direction.
    pub exit: Direction,
    pub end: GridPoint,
    pub end_step: GridPoint,
    /// Heading of the last step, opposite to the destination port's direction.
    pub entry: Direction,
}

impl Endpoints {
    pub fn resolve(from: &PortNode, to: &PortNode) -> Result<Self, FailureReason> {
        let (Some(exit), Some(end_dir)) = (from.dir(), to.dir()) else {
            return Err(FailureReason::BadDirection);
        };
        let start = from.point();
        let end = to.point();
        Ok(Self {
            start,
            start_step: start.step(exit),
            exit,
            end,
            end_step: end.step(end_dir),
            entry: end_dir.reverse(),
        })
    }

    /// Cells a connection may always use regardless of obstacles and occupancy.
    pub fn allowed(&self) -> [GridPoint; 4] {
        [self.start, self.end, self.start_step, self.end_step]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchFailure {
    pub reason: FailureReason,
    pub blocked_by: Option<ComponentId>,
}

impl From<FailureReason> for SearchFailure {
    fn from(reason: FailureReason) -> Self {
        Self { reason, blocked_by: None }
    }
}

/// Read-only inputs shared by every search of one solve.
#[derive(Debug, Clone, Copy)]
pub struct SearchContext<'a> {
    pub obstacles: &'a ObstacleGrid,
    pub obstacle_near: &'a NearMap,
    pub occupancy: &'a Occupancy,
    pub settings: &'a RouterSettings,
}

impl SearchContext<'_> {
    pub fn grid(&self) -> RoutingGrid {
        self.obstacles.grid()
    }

    /// Rejects connections whose stub cells sit inside a foreign component.
    pub fn check_stubs(
        &self,
        endpoints: &Endpoints,
        from_component: &ComponentId,
        to_component: &ComponentId,
    ) -> Result<(), SearchFailure> {
        let checks = [
            (endpoints.start_step, from_component, FailureReason::BlockedStartStep),
            (endpoints.end_step, to_component, FailureReason::BlockedEndStep),
        ];
        for (cell, own, reason) in checks {
            if !self.grid().bounds().contains(cell) {
                return Err(reason.into());
            }
            if !self.obstacles.is_blocked(cell) {
                continue;
            }
            let owner = self.obstacles.owner_at(cell);
            if owner != Some(own) {
                return Err(SearchFailure { reason, blocked_by: owner.cloned() });
            }
        }
        Ok(())
    }

    fn is_blocked(&self, idx: usize, point: GridPoint, guard: &SearchGuard<'_>) -> bool {
        self.obstacles.is_blocked_idx(idx) && !guard.allows(point)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchState {
    pub cell: usize,
    pub heading: Direction,
    pub hop_lock: bool,
}

impl SearchState {
    pub const PER_CELL: usize = 8;

    pub fn index(self) -> usize {
        (self.cell * 4 + self.heading.index()) * 2 + usize::from(self.hop_lock)
    }

    pub fn from_index(idx: usize) -> Self {
        let cell = idx / Self::PER_CELL;
        let rem = idx % Self::PER_CELL;
        let heading = Direction::from_index(rem / 2).expect("heading index below four");
        Self { cell, heading, hop_lock: rem % 2 == 1 }
    }
}

/// Cost of a single grid step.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct StepCost {
    total: u32,
    length: u32,
    turned: bool,
    hopped: bool,
    near: u32,
    breakdown: NearBreakdown,
}

#[derive(Debug, Clone, Copy)]
struct Step {
    state: SearchState,
    point: GridPoint,
    cost: StepCost,
}

#[derive(Debug, Default)]
pub struct SearchScratch {
    grid: Option<RoutingGrid>,
    gen: u32,
    dist_gen: Vec<u32>,
    dist_cost: Vec<u32>,
    came_from: Vec<u32>,
    heap: BinaryHeap<Reverse<(u32, u32, u32, u32)>>,
    expanded: usize,
}

impl SearchScratch {
    pub fn configure(&mut self, grid: RoutingGrid) {
        let len = grid.len() * SearchState::PER_CELL;
        if self.grid != Some(grid) {
            self.grid = Some(grid);
            self.dist_gen = vec![0u32; len];
            self.dist_cost = vec![0u32; len];
            self.came_from = vec![NO_PARENT; len];
            self.gen = 0;
        }
        let reserve_hint = len.min(4096);
        self.heap.reserve(reserve_hint.saturating_sub(self.heap.len()));
    }

    fn begin(&mut self) -> u32 {
        self.gen = self.gen.wrapping_add(1);
        if self.gen == 0 {
            self.dist_gen.fill(0);
            self.gen = 1;
        }
        self.heap.clear();
        self.expanded = 0;
        self.gen
    }

    fn dist(&self, idx: usize, gen: u32) -> u32 {
        if self.dist_gen[idx] == gen {
            self.dist_cost[idx]
        } else {
            u32::MAX
        }
    }

    fn set_dist(&mut self, idx: usize, gen: u32, cost: u32, came_from: u32) {
        self.dist_gen[idx] = gen;
        self.dist_cost[idx] = cost;
        self.came_from[idx] = came_from;
    }

    /// States popped by the last search.
    pub fn expanded(&self) -> usize {
        self.expanded
    }
}

/// A path found by the search: every unit step from the source to the destination port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRoute {
    pub cells: Vec<GridPoint>,
    pub cost: WireCost,
}

pub fn find_route(
    ctx: &SearchContext<'_>,
    scratch: &mut SearchScratch,
    endpoints: &Endpoints,
    guard: &SearchGuard<'_>,
    budget: Duration,
) -> Result<RawRoute, FailureReason> {
    let started = Instant::now();
    let grid = ctx.grid();
    scratch.configure(grid);

    let (Some(start_cell), Some(end_cell)) = (grid.idx_of(endpoints.start), grid.idx_of(endpoints.end))
    else {
        return Err(FailureReason::NoPath);
    };

    let gen = scratch.begin();
    let start = SearchState { cell: start_cell, heading: endpoints.exit, hop_lock: false };
    let start_idx = start.index();
    scratch.set_dist(start_idx, gen, 0, NO_PARENT);

    let mut seq = 0u32;
    let h0 = heuristic(ctx.settings, endpoints.start, endpoints.end);
    scratch.heap.push(Reverse((h0, seq, 0, start_idx as u32)));

    let mut pops = 0u32;
    while let Some(Reverse((_, _, g, idx))) = scratch.heap.pop() {
        pops = pops.wrapping_add(1);
        if pops % TIME_CHECK_INTERVAL == 0 && started.elapsed() > budget {
            return Err(FailureReason::Timeout);
        }

        let idx = idx as usize;
        if g > scratch.dist(idx, gen) {
            continue;
        }
        scratch.expanded += 1;

        let state = SearchState::from_index(idx);
        if state.cell == end_cell && state.heading == endpoints.entry {
            let states = reconstruct(scratch, idx);
            return Ok(replay(ctx, endpoints, guard, &states));
        }

        let point = grid.point_of(state.cell);
        for step in expand(ctx, endpoints, guard, state, point) {
            let next_idx = step.state.index();
            let next_g = g.saturating_add(step.cost.total);
            if next_g >= scratch.dist(next_idx, gen) {
                continue;
            }
            scratch.set_dist(next_idx, gen, next_g, idx as u32);
            seq = seq.wrapping_add(1);
            let f = next_g.saturating_add(heuristic(ctx.settings, step.point, endpoints.end));
            scratch.heap.push(Reverse((f, seq, next_g, next_idx as u32)));
        }
    }

    if started.elapsed() > budget {
        return Err(FailureReason::Timeout);
    }
    Err(FailureReason::NoPath)
}

fn heuristic(settings: &RouterSettings, from: GridPoint, to: GridPoint) -> u32 {
    from.manhattan(to).saturating_mul(settings.length_cost)
}

fn reconstruct(scratch: &SearchScratch, goal_idx: usize) -> Vec<SearchState> {
    let mut states = Vec::new();
    let mut cursor = goal_idx as u32;
    while cursor != NO_PARENT {
        states.push(SearchState::from_index(cursor as usize));
        cursor = scratch.came_from[cursor as usize];
    }
    states.reverse();
    states
}

fn replay(
    ctx: &SearchContext<'_>,
    endpoints: &Endpoints,
    guard: &SearchGuard<'_>,
    states: &[SearchState],
) -> RawRoute {
    let grid = ctx.grid();
    let mut cells = Vec::with_capacity(states.len());
    let mut cost = WireCost::default();

    for (i, state) in states.iter().enumerate() {
        let point = grid.point_of(state.cell);
        cells.push(point);
        let Some(prev) = i.checked_sub(1).map(|p| states[p]) else {
            continue;
        };
        let prev_point = grid.point_of(prev.cell);
        if let Some(step) = advance(ctx, endpoints, guard, prev, prev_point, state.heading) {
            cost.total += step.cost.total;
            cost.length += step.cost.length;
            cost.turns += u32::from(step.cost.turned);
            cost.hops += u32::from(step.cost.hopped);
            cost.near += step.cost.near;
            cost.breakdown.add(&step.cost.breakdown);
        }
    }

    RawRoute { cells, cost }
}

fn expand(
    ctx: &SearchContext<'_>,
    endpoints: &Endpoints,
    guard: &SearchGuard<'_>,
    state: SearchState,
    point: GridPoint,
) -> SmallVec<[Step; 4]> {
    let mut out = SmallVec::new();
    for dir in Direction::ALL {
        if let Some(next) = advance(ctx, endpoints, guard, state, point, dir) {
            out.push(next);
        }
    }
    out
}

/// One move from `state` (located at `point`) towards `dir`, or `None` when illegal.
fn advance(
    ctx: &SearchContext<'_>,
    endpoints: &Endpoints,
    guard: &SearchGuard<'_>,
    state: SearchState,
    point: GridPoint,
    dir: Direction,
) -> Option<Step> {
    if dir == state.heading.reverse() {
        return None;
    }
    if state.hop_lock && dir != state.heading {
        return None;
    }
    if point == endpoints.start && dir != state.heading {
        return None;
    }

    let grid = ctx.grid();
    let next = point.step(dir);
    let next_cell = grid.idx_of(next)?;

    if next == endpoints.end && (dir != endpoints.entry || point != endpoints.end_step) {
        return None;
    }
    if ctx.is_blocked(next_cell, next, guard) {
        return None;
    }
    if ctx.occupancy.edge_blocked(point, next, guard) {
        return None;
    }

    let settings = ctx.settings;
    let mut cost = StepCost::default();

    if let PointView::Occupied(info) = ctx.occupancy.point_view(next, guard) {
        let crosses = match dir.orientation() {
            Orientation::Horizontal => info.vertical,
            Orientation::Vertical => info.horizontal,
        };
        if !crosses {
            return None;
        }
        cost.hopped = true;
        cost.total += settings.hop_cost;
    }

    if !ctx.occupancy.edge_drawn(point, next) {
        cost.length = 1;
        cost.total += settings.length_cost;
    }

    if dir != state.heading {
        cost.turned = true;
        cost.total += settings.turn_cost;
        cost.total += settings.near_port_turn_cost(point.manhattan(endpoints.start));
        cost.total += settings.near_port_turn_cost(point.manhattan(endpoints.end));
        if ctx.occupancy.is_trunk_passthrough(point, guard) {
            cost.total += settings.junction_penalty;
        }
    }

    let (wire1, wire2) = ctx.occupancy.wire_proximity(next, guard);
    let (obs1, obs2) = match ctx.obstacle_near.code_idx(next_cell) {
        1 => (1, 0),
        2 => (0, 1),
        _ => (0, 0),
    };
    cost.breakdown = NearBreakdown { wire1, wire2, obs1, obs2 };
    cost.near = wire1 * settings.near_wire_penalty1
        + wire2 * settings.near_wire_penalty2
        + obs1 * settings.near_obstacle_penalty1
        + obs2 * settings.near_obstacle_penalty2;
    cost.total += cost.near;

    Some(Step {
        state: SearchState { cell: next_cell, heading: dir, hop_lock: cost.hopped },
        point: next,
        cost,
    })
}
