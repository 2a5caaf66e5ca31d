// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Router configuration.
//!
//! Every field has a default, so a settings object can be decoded from a partial JSON
//! document (`{"turnCost": 8}`) and still be complete:
//!
//! | option | default | meaning |
//! |---|---|---|
//! | `maxTimeMs` | 200 | wall-clock budget of one solve; each search gets what remains |
//! | `fallbackTimeMs` | 50 | wall-clock cap of each reachability search |
//! | `lengthCost` | 1 | cost per grid step |
//! | `turnCost` | 6 | cost per heading change |
//! | `hopCost` | 20 | cost per perpendicular crossing of another wire |
//! | `nearWirePenalty1` / `2` | 6 / 2 | step at distance 1 / 2 of a non-sibling wire |
//! | `nearObstaclePenalty1` / `2` | 10 / 4 | step at distance 1 / 2 of an obstacle |
//! | `junctionPenalty` | 8 | turning off the straight run of a sibling wire |
//! | `nearPortTurnPenalty` | 12 | scaled by the squared stub shortfall of a turn near a port |
//! | `preferredPortStubCells` | 2 | straight run wanted at each port before turning |
//! | `searchPadding` | 20 | cells added around the diagram extent, at most [`MAX_SEARCH_PADDING`] |
//! | `incremental` | false | reuse the previous solution for clean connections |
//! | `fullOptimize` | true | treat every connection as dirty |
//! | `bfsFallback` | true | run the reachability search when the costed search fails |
//! | `shortenPaths` | true | try strictly shorter rewrites after routing |
//! | `normalizeJunctions` | true | align branch points of wires sharing a source port |
//! | `changedConnections` | `[]` | connection keys to reroute |
//! | `changedNodes` | `[]` | port or component ids whose connections reroute |

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Editor grid pitch in pixels; grid coordinates times this are screen coordinates.
pub const GRID_SIZE: i32 = 10;

/// Upper bound on the padding a search grid is grown by.
pub const MAX_SEARCH_PADDING: i32 = 400;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterSettings {
    pub max_time_ms: u64,
    pub fallback_time_ms: u64,
    pub length_cost: u32,
    pub turn_cost: u32,
    pub hop_cost: u32,
    pub near_wire_penalty1: u32,
    pub near_wire_penalty2: u32,
    pub near_obstacle_penalty1: u32,
    pub near_obstacle_penalty2: u32,
    pub junction_penalty: u32,
    pub near_port_turn_penalty: u32,
    pub preferred_port_stub_cells: u32,
    pub search_padding: i32,
    pub incremental: bool,
    pub full_optimize: bool,
    pub bfs_fallback: bool,
    pub shorten_paths: bool,
    pub normalize_junctions: bool,
    pub changed_connections: BTreeSet<String>,
    pub changed_nodes: BTreeSet<String>,
}

impl Default for RouterSettings {
    fn default() -> Self {
        Self {
            max_time_ms: 200,
            fallback_time_ms: 50,
            length_cost: 1,
            turn_cost: 6,
            hop_cost: 20,
            near_wire_penalty1: 6,
            near_wire_penalty2: 2,
            near_obstacle_penalty1: 10,
            near_obstacle_penalty2: 4,
            junction_penalty: 8,
            near_port_turn_penalty: 12,
            preferred_port_stub_cells: 2,
            search_padding: 20,
            incremental: false,
            full_optimize: true,
            bfs_fallback: true,
            shorten_paths: true,
            normalize_junctions: true,
            changed_connections: BTreeSet::new(),
            changed_nodes: BTreeSet::new(),
        }
    }
}

impl RouterSettings {
    /// Full relayout of a canvas of `width` x `height` pixels, as run by the route worker.
    pub fn relayout(width: u32, height: u32) -> Self {
        let extent = i64::from(width.max(height));
        let pitch = i64::from(GRID_SIZE);
        let cells = (extent + pitch - 1) / pitch;
        let padding = (cells + 5).clamp(20, i64::from(MAX_SEARCH_PADDING));
        Self {
            max_time_ms: 4000,
            search_padding: i32::try_from(padding).unwrap_or(MAX_SEARCH_PADDING),
            ..Self::default()
        }
    }

    /// Incremental re-solve that only reroutes the given connections (plus their siblings).
    pub fn incremental_for<I, S>(changed_connections: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            incremental: true,
            full_optimize: false,
            changed_connections: changed_connections.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    pub fn with_changed_nodes<I, S>(mut self, changed_nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.changed_nodes.extend(changed_nodes.into_iter().map(Into::into));
        self
    }

    pub fn with_time_limit_ms(mut self, max_time_ms: u64) -> Self {
        self.max_time_ms = max_time_ms;
        self
    }

    pub fn batch_budget(&self) -> Duration {
        Duration::from_millis(self.max_time_ms)
    }

    pub fn fallback_budget(&self) -> Duration {
        Duration::from_millis(self.fallback_time_ms)
    }

    /// `search_padding` clamped to `0..=MAX_SEARCH_PADDING`.
    pub fn padding(&self) -> i32 {
        self.search_padding.clamp(0, MAX_SEARCH_PADDING)
    }

    /// Extra cost of turning `distance` cells away from a port.
    pub(crate) fn near_port_turn_cost(&self, distance: u32) -> u32 {
        let stub = self.preferred_port_stub_cells;
        if distance >= stub {
            return 0;
        }
        let shortfall = stub - distance;
        self.near_port_turn_penalty.saturating_mul(shortfall.saturating_mul(shortfall))
    }
}
