// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Batch entry point: routes every dirty connection in input order against a shared occupancy.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::analysis::analyze;
use super::fallback::{reachability_path, BfsScratch};
use super::grid::{GridBounds, NearMap, ObstacleGrid, RoutingGrid};
use super::occupancy::{Occupancy, SearchGuard, WireOwner};
use super::postprocess::{
    compress, enforce_port_stubs, normalize_junctions, path_length, shorten, JunctionMember,
    PathCheck,
};
use super::schedule::Schedule;
use super::search::{find_route, Endpoints, SearchContext, SearchScratch};
use super::settings::RouterSettings;
use crate::model::{
    ComponentId, Connection, FailureEndpoint, FailureReason, GridPoint, ObstacleRect, PortId,
    PortNode, RouteFailure, Solution, Wire, WireCost, WireQuality,
};

/// Everything one solve reads, rebuilt by the caller each time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouteInput {
    pub ports: Vec<PortNode>,
    pub connections: Vec<Connection>,
    pub obstacles: Vec<ObstacleRect>,
}

/// Counters describing the most recent solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSnapshot {
    pub nodes: usize,
    pub connections: usize,
    pub prev_wires: usize,
    pub dirty: usize,
    /// Connections dirty before sibling expansion.
    pub changed: usize,
    pub expanded: usize,
}

/// A routing session. Keeps the search scratch buffers alive between solves.
#[derive(Debug, Default)]
pub struct Router {
    settings: RouterSettings,
    search: SearchScratch,
    bfs: BfsScratch,
    last_run: Option<RunSnapshot>,
}

/// A wire routed during the current solve, before it is written to the solution.
struct Fresh {
    owner: WireOwner,
    endpoints: Endpoints,
    points: Vec<GridPoint>,
    cost: WireCost,
    quality: WireQuality,
}

impl Router {
    pub fn new(settings: RouterSettings) -> Self {
        Self { settings, ..Self::default() }
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    pub fn last_run(&self) -> Option<&RunSnapshot> {
        self.last_run.as_ref()
    }

    pub fn solve(&mut self, input: &RouteInput, prev: Option<&Solution>) -> Solution {
        self.run(&input.ports, &input.connections, &input.obstacles, prev)
    }

    fn run(
        &mut self,
        nodes: &[PortNode],
        connections: &[Connection],
        obstacles: &[ObstacleRect],
        prev: Option<&Solution>,
    ) -> Solution {
        let started = Instant::now();
        let budget = self.settings.batch_budget();

        let ports: HashMap<&str, &PortNode> =
            nodes.iter().map(|node| (node.id().as_str(), node)).collect();
        let component_of = |port: &PortId| -> ComponentId {
            ports.get(port.as_str()).map_or_else(|| port.component_prefix(), |node| node.component())
        };
        let owner_of =
            |conn: &Connection| WireOwner::new(conn, component_of(conn.from()), component_of(conn.to()));

        let grid = RoutingGrid::new(GridBounds::covering(nodes, obstacles, self.settings.padding()));
        let obstacle_grid = ObstacleGrid::build(grid, obstacles);
        let obstacle_near = NearMap::from_obstacles(&obstacle_grid);

        let prev = prev.filter(|_| self.settings.incremental && !self.settings.full_optimize);
        let schedule = Schedule::plan(connections, prev, &self.settings, component_of);

        let kept: Vec<(&Connection, &Wire)> = connections
            .iter()
            .enumerate()
            .filter(|(idx, _)| !schedule.is_dirty(*idx))
            .filter_map(|(_, conn)| prev.and_then(|p| p.wires.get(conn.key())).map(|wire| (conn, wire)))
            .collect();
        let mut occupancy = Occupancy::from_wires(
            grid,
            kept.iter().map(|&(conn, wire)| (owner_of(conn), wire.points.as_slice())),
        );

        let mut solution = Solution::default();
        for (conn, wire) in kept {
            solution.cost.absorb(&wire.cost);
            solution.wires.insert(conn.key().clone(), wire.clone());
        }

        let mut fresh: Vec<(usize, Fresh)> = Vec::new();
        let mut expanded = 0usize;

        for (idx, conn) in connections.iter().enumerate() {
            if !schedule.is_dirty(idx) {
                continue;
            }

            let from = ports.get(conn.from().as_str()).copied();
            let to = ports.get(conn.to().as_str()).copied();
            let fail = |reason: FailureReason, blocked_by: Option<ComponentId>| {
                debug!(key = %conn.key(), %reason, "connection failed");
                failure(conn, from, to, reason, blocked_by)
            };

            let (Some(from), Some(to)) = (from, to) else {
                solution.failures.push(fail(FailureReason::UnknownPort, None));
                continue;
            };
            let endpoints = match Endpoints::resolve(from, to) {
                Ok(endpoints) => endpoints,
                Err(reason) => {
                    solution.failures.push(fail(reason, None));
                    continue;
                }
            };
            let remaining = budget.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                solution.failures.push(fail(FailureReason::Timeout, None));
                continue;
            }

            let owner = WireOwner::new(conn, from.component(), to.component());
            let guard = SearchGuard::new(&owner, endpoints.allowed());
            let ctx = SearchContext {
                obstacles: &obstacle_grid,
                obstacle_near: &obstacle_near,
                occupancy: &occupancy,
                settings: &self.settings,
            };
            if let Err(blocked) = ctx.check_stubs(&endpoints, &owner.from_component, &owner.to_component) {
                solution.failures.push(fail(blocked.reason, blocked.blocked_by));
                continue;
            }

            let searched = find_route(&ctx, &mut self.search, &endpoints, &guard, remaining);
            expanded += self.search.expanded();
            let check = PathCheck {
                obstacles: &obstacle_grid,
                occupancy: &occupancy,
                guard: &guard,
                endpoints: &endpoints,
            };
            let (points, cost, quality) = match searched {
                Ok(route) => {
                    let mut points = enforce_port_stubs(&compress(&route.cells), &endpoints);
                    if self.settings.shorten_paths {
                        points = shorten(&points, &check);
                    }
                    (points, route.cost, WireQuality::Routed)
                }
                Err(reason) if self.settings.bfs_fallback => {
                    let Some(points) = recover_path(&check, &mut self.bfs, &self.settings) else {
                        solution.failures.push(fail(reason, None));
                        continue;
                    };
                    warn!(key = %conn.key(), %reason, "costed search failed, kept reachability path");
                    let cost = geometric_cost(&points, &self.settings);
                    (points, cost, WireQuality::Reachability)
                }
                Err(reason) => {
                    solution.failures.push(fail(reason, None));
                    continue;
                }
            };

            debug!(
                key = %conn.key(),
                points = points.len(),
                total = cost.total,
                ?quality,
                "connection routed"
            );
            occupancy.add_wire(owner.clone(), &points);
            fresh.push((idx, Fresh { owner, endpoints, points, cost, quality }));
        }

        if self.settings.normalize_junctions {
            let mut groups: BTreeMap<&PortId, Vec<usize>> = BTreeMap::new();
            for (slot, (idx, _)) in fresh.iter().enumerate() {
                groups.entry(connections[*idx].from()).or_default().push(slot);
            }
            for (port, slots) in groups {
                if slots.len() < 2 {
                    continue;
                }
                let normalized = {
                    let mut members: Vec<JunctionMember<'_>> = slots
                        .iter()
                        .map(|&slot| {
                            let wire = &fresh[slot].1;
                            JunctionMember {
                                points: wire.points.clone(),
                                endpoints: wire.endpoints,
                                guard: SearchGuard::new(&wire.owner, wire.endpoints.allowed()),
                            }
                        })
                        .collect();
                    normalize_junctions(
                        &mut members,
                        &obstacle_grid,
                        &occupancy,
                        self.settings.preferred_port_stub_cells,
                    )
                    .then(|| members.into_iter().map(|m| m.points).collect::<Vec<_>>())
                };
                let Some(normalized) = normalized else {
                    continue;
                };
                debug!(%port, members = slots.len(), "junction normalized");
                for (&slot, points) in slots.iter().zip(normalized) {
                    let wire = &mut fresh[slot].1;
                    occupancy.remove_wire(&wire.owner.key);
                    wire.points = points;
                    occupancy.add_wire(wire.owner.clone(), &wire.points);
                }
            }
        }

        let routed = fresh.len();
        for (idx, wire) in fresh {
            solution.cost.absorb(&wire.cost);
            solution.wires.insert(
                connections[idx].key().clone(),
                Wire { points: wire.points, cost: wire.cost, quality: wire.quality },
            );
        }
        solution.cost.failed = u32::try_from(solution.failures.len()).unwrap_or(u32::MAX);
        solution.duration_ms = millis(started.elapsed());

        if tracing::enabled!(tracing::Level::DEBUG) {
            let report = analyze(&solution, connections);
            if !report.is_clean() {
                debug!(?report, "geometry report");
            }
        }

        let snapshot = RunSnapshot {
            nodes: nodes.len(),
            connections: connections.len(),
            prev_wires: prev.map_or(0, |p| p.wires.len()),
            dirty: schedule.dirty_count(),
            changed: schedule.seed_count(),
            expanded,
        };
        info!(
            connections = snapshot.connections,
            dirty = snapshot.dirty,
            routed,
            failed = solution.cost.failed,
            duration_ms = solution.duration_ms,
            "solve finished"
        );
        self.last_run = Some(snapshot);
        solution
    }
}

/// One-shot solve with a throwaway [`Router`].
pub fn solve(
    nodes: &[PortNode],
    connections: &[Connection],
    obstacles: &[ObstacleRect],
    prev: Option<&Solution>,
    settings: &RouterSettings,
) -> Solution {
    Router::new(settings.clone()).run(nodes, connections, obstacles, prev)
}

fn failure(
    conn: &Connection,
    from: Option<&PortNode>,
    to: Option<&PortNode>,
    reason: FailureReason,
    blocked_by: Option<ComponentId>,
) -> RouteFailure {
    let endpoint = |node: &PortNode| FailureEndpoint {
        x: node.point().x(),
        y: node.point().y(),
        dir: node.dir(),
    };
    RouteFailure {
        key: conn.key().clone(),
        from: conn.from().clone(),
        to: conn.to().clone(),
        reason,
        start: from.map(endpoint),
        end: to.map(endpoint),
        blocked_by,
    }
}

/// Length and corner cost of a polyline that did not come out of the costed search.
/// Stub-to-stub reachability path between the checked endpoints, post-processed like a
/// searched route and kept only when it still obeys every routing rule.
fn recover_path(
    check: &PathCheck<'_>,
    scratch: &mut BfsScratch,
    settings: &RouterSettings,
) -> Option<Vec<GridPoint>> {
    let ends = check.endpoints;
    let steps = reachability_path(
        ends.start_step,
        ends.end_step,
        &[ends.start, ends.end],
        check.obstacles,
        check.occupancy,
        check.guard,
        scratch,
        settings.fallback_budget(),
    )?;
    let mut cells = Vec::with_capacity(steps.len() + 2);
    cells.push(ends.start);
    cells.extend(steps);
    cells.push(ends.end);

    let mut points = enforce_port_stubs(&compress(&cells), ends);
    if settings.shorten_paths {
        points = shorten(&points, check);
    }
    check.accepts(&points).then_some(points)
}

fn geometric_cost(points: &[GridPoint], settings: &RouterSettings) -> WireCost {
    let length = path_length(points);
    let turns = u32::try_from(points.len().saturating_sub(2)).unwrap_or(u32::MAX);
    WireCost {
        total: length * settings.length_cost + turns * settings.turn_cost,
        length,
        turns,
        ..WireCost::default()
    }
}

fn millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}
