// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Grid/obstacle model: search bounds, dense cell indexing, blocked cells, and the
//! obstacle proximity map read on every expanded search state.

use crate::model::{ComponentId, GridPoint, ObstacleRect, PortNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridBounds {
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
}

impl GridBounds {
    /// Union of all port and obstacle extents, expanded by `padding`.
    pub fn covering(ports: &[PortNode], obstacles: &[ObstacleRect], padding: i32) -> Self {
        let mut bounds: Option<Self> = None;
        let mut include = |x0: i32, y0: i32, x1: i32, y1: i32| {
            bounds = Some(match bounds {
                None => Self { min_x: x0, max_x: x1, min_y: y0, max_y: y1 },
                Some(b) => Self {
                    min_x: b.min_x.min(x0),
                    max_x: b.max_x.max(x1),
                    min_y: b.min_y.min(y0),
                    max_y: b.max_y.max(y1),
                },
            });
        };
        for port in ports {
            let p = port.point();
            include(p.x(), p.y(), p.x(), p.y());
        }
        for rect in obstacles {
            include(rect.x0, rect.y0, rect.x1, rect.y1);
        }
        bounds
            .unwrap_or(Self { min_x: 0, max_x: 0, min_y: 0, max_y: 0 })
            .expand(padding.max(0))
    }

    pub fn contains(&self, p: GridPoint) -> bool {
        p.x() >= self.min_x && p.x() <= self.max_x && p.y() >= self.min_y && p.y() <= self.max_y
    }

    pub fn expand(&self, margin: i32) -> Self {
        Self {
            min_x: self.min_x - margin,
            max_x: self.max_x + margin,
            min_y: self.min_y - margin,
            max_y: self.max_y + margin,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoutingGrid {
    min_x: i32,
    min_y: i32,
    width: usize,
    height: usize,
}

impl RoutingGrid {
    pub fn new(bounds: GridBounds) -> Self {
        let width = (bounds.max_x - bounds.min_x + 1).max(1) as usize;
        let height = (bounds.max_y - bounds.min_y + 1).max(1) as usize;
        Self { min_x: bounds.min_x, min_y: bounds.min_y, width, height }
    }

    pub fn len(&self) -> usize {
        self.width.checked_mul(self.height).expect("routing grid area overflow")
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn bounds(&self) -> GridBounds {
        GridBounds {
            min_x: self.min_x,
            max_x: self.min_x + self.width as i32 - 1,
            min_y: self.min_y,
            max_y: self.min_y + self.height as i32 - 1,
        }
    }

    pub fn idx_of(&self, point: GridPoint) -> Option<usize> {
        let x = point.x() - self.min_x;
        let y = point.y() - self.min_y;
        if x < 0 || y < 0 {
            return None;
        }
        let (x, y) = (x as usize, y as usize);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y * self.width + x)
    }

    pub fn point_of(&self, idx: usize) -> GridPoint {
        let x = (idx % self.width) as i32 + self.min_x;
        let y = (idx / self.width) as i32 + self.min_y;
        GridPoint::new(x, y)
    }
}

const FREE: u32 = 0;

/// Blocked grid cells, each remembering the component whose rectangle covers it.
#[derive(Debug, Clone)]
pub struct ObstacleGrid {
    grid: RoutingGrid,
    slots: Vec<u32>,
    owners: Vec<Option<ComponentId>>,
    blocked_count: usize,
}

impl ObstacleGrid {
    pub fn build(grid: RoutingGrid, obstacles: &[ObstacleRect]) -> Self {
        let mut slots = vec![FREE; grid.len()];
        let mut owners = Vec::with_capacity(obstacles.len());
        let mut blocked_count = 0usize;

        for rect in obstacles {
            owners.push(rect.owner.clone());
            let slot = owners.len() as u32;
            for cell in rect.cells() {
                let Some(idx) = grid.idx_of(cell) else {
                    continue;
                };
                if slots[idx] == FREE {
                    blocked_count += 1;
                }
                slots[idx] = slot;
            }
        }

        Self { grid, slots, owners, blocked_count }
    }

    pub fn grid(&self) -> RoutingGrid {
        self.grid
    }

    pub fn blocked_count(&self) -> usize {
        self.blocked_count
    }

    pub fn is_blocked(&self, point: GridPoint) -> bool {
        self.grid.idx_of(point).is_some_and(|idx| self.slots[idx] != FREE)
    }

    pub(crate) fn is_blocked_idx(&self, idx: usize) -> bool {
        self.slots[idx] != FREE
    }

    /// Owner of the obstacle covering `point`, if it is blocked and the obstacle has one.
    pub fn owner_at(&self, point: GridPoint) -> Option<&ComponentId> {
        let idx = self.grid.idx_of(point)?;
        let slot = self.slots[idx];
        if slot == FREE {
            return None;
        }
        self.owners.get(slot as usize - 1)?.as_ref()
    }
}

/// Dense distance classification: 0 = clear, 1 = on or next to a marked cell,
/// 2 = two steps away (axis) or diagonal.
#[derive(Debug, Clone)]
pub struct NearMap {
    grid: RoutingGrid,
    codes: Vec<u8>,
}

const RING1: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const RING2: [(i32, i32); 8] =
    [(2, 0), (-2, 0), (0, 2), (0, -2), (1, 1), (1, -1), (-1, 1), (-1, -1)];

impl NearMap {
    pub fn empty(grid: RoutingGrid) -> Self {
        Self { grid, codes: vec![0; grid.len()] }
    }

    /// Proximity to blocked cells; a blocked cell itself counts as distance 1.
    pub fn from_obstacles(obstacles: &ObstacleGrid) -> Self {
        let grid = obstacles.grid();
        let mut map = Self::empty(grid);
        for idx in 0..grid.len() {
            if !obstacles.is_blocked_idx(idx) {
                continue;
            }
            let p = grid.point_of(idx);
            map.mark(p, 1);
            map.mark_rings(p);
        }
        map
    }

    /// Marks the distance-1 and distance-2 rings around `p` (not `p` itself).
    pub(crate) fn mark_rings(&mut self, p: GridPoint) {
        for (dx, dy) in RING1 {
            self.mark(p.offset(dx, dy), 1);
        }
        for (dx, dy) in RING2 {
            self.mark(p.offset(dx, dy), 2);
        }
    }

    fn mark(&mut self, p: GridPoint, code: u8) {
        let Some(idx) = self.grid.idx_of(p) else {
            return;
        };
        let current = self.codes[idx];
        if current == 0 || code < current {
            self.codes[idx] = code;
        }
    }

    pub fn grid(&self) -> RoutingGrid {
        self.grid
    }

    pub fn code(&self, p: GridPoint) -> u8 {
        self.grid.idx_of(p).map_or(0, |idx| self.codes[idx])
    }

    pub(crate) fn code_idx(&self, idx: usize) -> u8 {
        self.codes[idx]
    }
}

pub(crate) fn ring1(p: GridPoint) -> impl Iterator<Item = GridPoint> {
    RING1.into_iter().map(move |(dx, dy)| p.offset(dx, dy))
}

pub(crate) fn ring2(p: GridPoint) -> impl Iterator<Item = GridPoint> {
    RING2.into_iter().map(move |(dx, dy)| p.offset(dx, dy))
}
