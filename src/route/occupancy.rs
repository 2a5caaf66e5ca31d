// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Occupancy model: which accepted wires use each grid point and unit edge.
//!
//! Every query takes a [`SearchGuard`] describing the connection being routed. Points and
//! edges owned by that connection or by one of its siblings (shared source or destination
//! port) read as free, and so do the four cells right at its own ports.

use std::collections::{BTreeSet, HashMap};

use smallvec::SmallVec;

use super::grid::{ring1, ring2, NearMap, RoutingGrid};
use crate::model::{ComponentId, Connection, ConnectionKey, Direction, GridPoint, PortId};

/// Identity of an accepted wire as recorded in the occupancy indexes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireOwner {
    pub from: PortId,
    pub to: PortId,
    pub key: ConnectionKey,
    pub from_component: ComponentId,
    pub to_component: ComponentId,
}

impl WireOwner {
    pub fn new(connection: &Connection, from_component: ComponentId, to_component: ComponentId) -> Self {
        Self {
            from: connection.from().clone(),
            to: connection.to().clone(),
            key: connection.key().clone(),
            from_component,
            to_component,
        }
    }

    /// Owner whose components are taken from the port id prefixes.
    pub fn of(connection: &Connection) -> Self {
        Self::new(
            connection,
            connection.from().component_prefix(),
            connection.to().component_prefix(),
        )
    }
}

/// Per-search query parameter: who is asking, and which near-port cells are exempt.
#[derive(Debug, Clone)]
pub struct SearchGuard<'a> {
    owner: &'a WireOwner,
    allowed: SmallVec<[GridPoint; 4]>,
}

impl<'a> SearchGuard<'a> {
    pub fn new(owner: &'a WireOwner, allowed: impl IntoIterator<Item = GridPoint>) -> Self {
        Self { owner, allowed: allowed.into_iter().collect() }
    }

    /// Guard without exempt cells, used when validating finished geometry.
    pub fn strict(owner: &'a WireOwner) -> Self {
        Self { owner, allowed: SmallVec::new() }
    }

    pub fn allows(&self, point: GridPoint) -> bool {
        self.allowed.contains(&point)
    }

    fn owns_point(&self, info: &PointInfo) -> bool {
        info.owners.contains(&self.owner.from)
            || info.owners.contains(&self.owner.to)
            || info.keys.contains(&self.owner.key)
    }

    fn owns_edge(&self, owners: &EdgeOwners) -> bool {
        owners.ports.contains(&self.owner.from)
            || owners.ports.contains(&self.owner.to)
            || owners.keys.contains(&self.owner.key)
    }

    /// A wire between the same two components counts as the same trunk.
    fn same_trunk(&self, info: &PointInfo) -> bool {
        info.components.contains(&self.owner.from_component)
            && info.components.contains(&self.owner.to_component)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PointInfo {
    pub owners: BTreeSet<PortId>,
    pub components: BTreeSet<ComponentId>,
    pub keys: BTreeSet<ConnectionKey>,
    /// Mid-run of a horizontal segment.
    pub horizontal: bool,
    /// Mid-run of a vertical segment.
    pub vertical: bool,
}

impl PointInfo {
    pub fn is_passthrough(&self) -> bool {
        self.horizontal || self.vertical
    }
}

/// A grid point as seen by one connection.
#[derive(Debug, Clone, Copy)]
pub enum PointView<'o> {
    Free,
    /// Used only by this connection or its siblings.
    Shared(&'o PointInfo),
    Occupied(&'o PointInfo),
}

#[derive(Debug, Clone, Default)]
struct EdgeOwners {
    ports: BTreeSet<PortId>,
    keys: BTreeSet<ConnectionKey>,
}

/// Unit edge between two 4-adjacent points, stored lower point first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct UnitEdge {
    a: GridPoint,
    b: GridPoint,
}

impl UnitEdge {
    fn new(p: GridPoint, q: GridPoint) -> Self {
        if p <= q {
            Self { a: p, b: q }
        } else {
            Self { a: q, b: p }
        }
    }
}

#[derive(Debug, Clone)]
pub struct Occupancy {
    points: HashMap<GridPoint, PointInfo>,
    edges: HashMap<UnitEdge, EdgeOwners>,
    near: NearMap,
    wires: Vec<(WireOwner, Vec<GridPoint>)>,
}

impl Occupancy {
    pub fn new(grid: RoutingGrid) -> Self {
        Self {
            points: HashMap::new(),
            edges: HashMap::new(),
            near: NearMap::empty(grid),
            wires: Vec::new(),
        }
    }

    pub fn from_wires<'w, I>(grid: RoutingGrid, wires: I) -> Self
    where
        I: IntoIterator<Item = (WireOwner, &'w [GridPoint])>,
    {
        let mut occupancy = Self::new(grid);
        for (owner, points) in wires {
            occupancy.add_wire(owner, points);
        }
        occupancy
    }

    pub fn wire_count(&self) -> usize {
        self.wires.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Indexes a polyline; corner-only polylines are expanded to unit steps first.
    pub fn add_wire(&mut self, owner: WireOwner, points: &[GridPoint]) {
        let steps = densify(points);
        self.index_steps(&owner, &steps);
        self.wires.push((owner, steps));
    }

    /// Drops every wire recorded under `key` and rebuilds the indexes.
    pub fn remove_wire(&mut self, key: &ConnectionKey) -> bool {
        let before = self.wires.len();
        self.wires.retain(|(owner, _)| &owner.key != key);
        if self.wires.len() == before {
            return false;
        }

        let wires = std::mem::take(&mut self.wires);
        self.points.clear();
        self.edges.clear();
        self.near = NearMap::empty(self.near_grid());
        for (owner, steps) in &wires {
            self.index_steps(owner, steps);
        }
        self.wires = wires;
        true
    }

    fn near_grid(&self) -> RoutingGrid {
        self.near.grid()
    }

    fn index_steps(&mut self, owner: &WireOwner, steps: &[GridPoint]) {
        for (i, &point) in steps.iter().enumerate() {
            let info = self.points.entry(point).or_default();
            info.owners.insert(owner.from.clone());
            info.owners.insert(owner.to.clone());
            info.components.insert(owner.from_component.clone());
            info.components.insert(owner.to_component.clone());
            info.keys.insert(owner.key.clone());

            if i > 0 && i + 1 < steps.len() {
                let prev = steps[i - 1];
                let next = steps[i + 1];
                if prev.x() == point.x() && point.x() == next.x() {
                    info.vertical = true;
                }
                if prev.y() == point.y() && point.y() == next.y() {
                    info.horizontal = true;
                }
            }

            if i > 0 {
                let edge = self.edges.entry(UnitEdge::new(steps[i - 1], point)).or_default();
                edge.ports.insert(owner.from.clone());
                edge.ports.insert(owner.to.clone());
                edge.keys.insert(owner.key.clone());
            }

            self.near.mark_rings(point);
        }
    }

    pub fn raw_point(&self, point: GridPoint) -> Option<&PointInfo> {
        self.points.get(&point)
    }

    pub fn point_view(&self, point: GridPoint, guard: &SearchGuard<'_>) -> PointView<'_> {
        if guard.allows(point) {
            return PointView::Free;
        }
        match self.points.get(&point) {
            None => PointView::Free,
            Some(info) if guard.owns_point(info) => PointView::Shared(info),
            Some(info) => PointView::Occupied(info),
        }
    }

    /// True when the unit edge `a`-`b` is drawn by a wire unrelated to the guard.
    pub fn edge_blocked(&self, a: GridPoint, b: GridPoint, guard: &SearchGuard<'_>) -> bool {
        if guard.allows(a) || guard.allows(b) {
            return false;
        }
        match self.edges.get(&UnitEdge::new(a, b)) {
            None => false,
            Some(owners) => !guard.owns_edge(owners),
        }
    }

    pub fn edge_drawn(&self, a: GridPoint, b: GridPoint) -> bool {
        self.edges.contains_key(&UnitEdge::new(a, b))
    }

    /// Whether `point` sits mid-run on a wire of the same trunk, so turning there would
    /// sprout a branch in the middle of a straight segment.
    pub fn is_trunk_passthrough(&self, point: GridPoint, guard: &SearchGuard<'_>) -> bool {
        self.points.get(&point).is_some_and(|info| {
            info.is_passthrough() && (guard.owns_point(info) || guard.same_trunk(info))
        })
    }

    fn is_foreign_wire_at(&self, point: GridPoint, guard: &SearchGuard<'_>) -> bool {
        self.points.get(&point).is_some_and(|info| {
            !info.keys.is_empty()
                && !info.owners.contains(&guard.owner.from)
                && !info.owners.contains(&guard.owner.to)
        })
    }

    /// Proximity to unrelated wires: `(1, 0)` next to one, `(0, 1)` two cells away.
    pub fn wire_proximity(&self, point: GridPoint, guard: &SearchGuard<'_>) -> (u32, u32) {
        match self.near.code(point) {
            0 => (0, 0),
            code => {
                if code == 1 && ring1(point).any(|p| self.is_foreign_wire_at(p, guard)) {
                    (1, 0)
                } else if ring2(point).any(|p| self.is_foreign_wire_at(p, guard)) {
                    (0, 1)
                } else {
                    (0, 0)
                }
            }
        }
    }

    pub fn near_code(&self, point: GridPoint) -> u8 {
        self.near.code(point)
    }
}

/// Expands a polyline into unit steps. Diagonal segments (only found in stale caller data)
/// are walked horizontally first.
pub fn densify(points: &[GridPoint]) -> Vec<GridPoint> {
    let mut out = Vec::with_capacity(points.len());
    let Some(&first) = points.first() else {
        return out;
    };
    out.push(first);
    let mut cursor = first;
    for &target in &points[1..] {
        while cursor.x() != target.x() {
            let dir = if target.x() > cursor.x() { Direction::Right } else { Direction::Left };
            cursor = cursor.step(dir);
            out.push(cursor);
        }
        while cursor.y() != target.y() {
            let dir = if target.y() > cursor.y() { Direction::Down } else { Direction::Up };
            cursor = cursor.step(dir);
            out.push(cursor);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{densify, Occupancy, PointView, SearchGuard, WireOwner};
    use crate::model::{Connection, GridPoint, PortId};
    use crate::route::grid::{GridBounds, RoutingGrid};

    fn gp(x: i32, y: i32) -> GridPoint {
        GridPoint::new(x, y)
    }

    fn owner(from: &str, to: &str, index: usize) -> WireOwner {
        WireOwner::of(&Connection::with_index_key(
            PortId::new(from).unwrap(),
            PortId::new(to).unwrap(),
            index,
        ))
    }

    fn grid(max: i32) -> RoutingGrid {
        RoutingGrid::new(GridBounds { min_x: 0, max_x: max, min_y: 0, max_y: max })
    }

    #[test]
    fn densify_expands_corner_polylines() {
        let steps = densify(&[gp(0, 0), gp(2, 0), gp(2, 2)]);
        assert_eq!(steps, vec![gp(0, 0), gp(1, 0), gp(2, 0), gp(2, 1), gp(2, 2)]);
        assert!(densify(&[]).is_empty());
    }

    #[test]
    fn passthrough_flags_follow_straight_runs_only() {
        let mut occ = Occupancy::new(grid(9));
        occ.add_wire(owner("a:out:0", "b:in:0", 0), &[gp(0, 1), gp(3, 1), gp(3, 4)]);

        let mid = occ.raw_point(gp(1, 1)).unwrap();
        assert!(mid.horizontal && !mid.vertical);
        let corner = occ.raw_point(gp(3, 1)).unwrap();
        assert!(!corner.is_passthrough());
        let vertical = occ.raw_point(gp(3, 2)).unwrap();
        assert!(vertical.vertical);
        assert!(!occ.raw_point(gp(0, 1)).unwrap().is_passthrough());
    }

    #[test]
    fn siblings_and_allowed_cells_read_as_free() {
        let mut occ = Occupancy::new(grid(9));
        occ.add_wire(owner("a:out:0", "b:in:0", 0), &[gp(0, 1), gp(5, 1)]);

        let sibling = owner("a:out:0", "c:in:0", 1);
        let guard = SearchGuard::new(&sibling, []);
        assert!(matches!(occ.point_view(gp(2, 1), &guard), PointView::Shared(_)));
        assert!(!occ.edge_blocked(gp(2, 1), gp(3, 1), &guard));

        let stranger = owner("x:out:0", "y:in:0", 2);
        let guard = SearchGuard::new(&stranger, [gp(4, 1)]);
        assert!(matches!(occ.point_view(gp(2, 1), &guard), PointView::Occupied(_)));
        assert!(occ.edge_blocked(gp(2, 1), gp(3, 1), &guard));
        assert!(!occ.edge_blocked(gp(3, 1), gp(4, 1), &guard));
        assert!(matches!(occ.point_view(gp(4, 1), &guard), PointView::Free));
        assert!(occ.edge_drawn(gp(3, 1), gp(4, 1)));
    }

    #[test]
    fn wire_near_map_skips_the_occupied_point() {
        let mut occ = Occupancy::new(grid(4));
        occ.add_wire(owner("a:out:0", "b:in:0", 0), &[gp(2, 2)]);

        assert_eq!(occ.near_code(gp(2, 2)), 0);
        assert_eq!(occ.near_code(gp(2, 3)), 1);
        assert_eq!(occ.near_code(gp(3, 3)), 2);
        assert_eq!(occ.near_code(gp(4, 4)), 0);

        let stranger = owner("x:out:0", "y:in:0", 1);
        let guard = SearchGuard::strict(&stranger);
        assert_eq!(occ.wire_proximity(gp(2, 3), &guard), (1, 0));
        assert_eq!(occ.wire_proximity(gp(3, 3), &guard), (0, 1));

        let sibling = owner("x:out:0", "b:in:0", 2);
        let guard = SearchGuard::strict(&sibling);
        assert_eq!(occ.wire_proximity(gp(2, 3), &guard), (0, 0));
    }

    #[test]
    fn from_wires_matches_adding_one_by_one() {
        let wires = [
            (owner("a:out:0", "b:in:0", 0), vec![gp(0, 1), gp(5, 1)]),
            (owner("c:out:0", "d:in:0", 1), vec![gp(3, 0), gp(3, 6)]),
        ];
        let seeded = Occupancy::from_wires(
            grid(9),
            wires.iter().map(|(owner, points)| (owner.clone(), points.as_slice())),
        );

        assert_eq!(seeded.wire_count(), 2);
        assert!(seeded.edge_drawn(gp(1, 1), gp(2, 1)));
        assert!(seeded.edge_drawn(gp(3, 4), gp(3, 5)));
        let crossing = seeded.raw_point(gp(3, 1)).expect("both wires pass");
        assert!(crossing.horizontal && crossing.vertical);
    }

    #[test]
    fn remove_wire_rebuilds_indexes() {
        let mut occ = Occupancy::new(grid(9));
        let first = owner("a:out:0", "b:in:0", 0);
        let key = first.key.clone();
        occ.add_wire(first, &[gp(0, 1), gp(5, 1)]);
        occ.add_wire(owner("c:out:0", "d:in:0", 1), &[gp(0, 5), gp(5, 5)]);

        assert!(occ.remove_wire(&key));
        assert!(!occ.remove_wire(&key));
        assert!(occ.raw_point(gp(2, 1)).is_none());
        assert!(!occ.edge_drawn(gp(1, 1), gp(2, 1)));
        assert_eq!(occ.near_code(gp(2, 2)), 0);
        assert_eq!(occ.near_code(gp(2, 4)), 1);
        assert_eq!(occ.wire_count(), 1);
    }

    #[test]
    fn same_component_pair_counts_as_trunk() {
        let mut occ = Occupancy::new(grid(9));
        occ.add_wire(owner("a:out:0", "b:in:0", 0), &[gp(0, 1), gp(5, 1)]);

        let parallel = owner("a:out:1", "b:in:1", 1);
        let guard = SearchGuard::strict(&parallel);
        assert!(occ.is_trunk_passthrough(gp(2, 1), &guard));
        assert!(!occ.is_trunk_passthrough(gp(0, 1), &guard));

        let stranger = owner("x:out:0", "y:in:0", 2);
        assert!(!occ.is_trunk_passthrough(gp(2, 1), &SearchGuard::strict(&stranger)));
    }
}
