// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::geom::{Direction, GridPoint};
use super::ids::{ComponentId, ConnectionKey, PortId};

/// Proximity hits accumulated along a wire (one per step that was near something).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NearBreakdown {
    pub wire1: u32,
    pub wire2: u32,
    pub obs1: u32,
    pub obs2: u32,
}

impl NearBreakdown {
    pub fn add(&mut self, other: &NearBreakdown) {
        self.wire1 += other.wire1;
        self.wire2 += other.wire2;
        self.obs1 += other.obs1;
        self.obs2 += other.obs2;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireCost {
    pub total: u32,
    pub length: u32,
    pub turns: u32,
    pub hops: u32,
    pub near: u32,
    pub breakdown: NearBreakdown,
}

/// How a wire was obtained.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WireQuality {
    /// Found by the cost-guided search.
    #[default]
    Routed,
    /// Recovered by the plain reachability search after the costed search failed.
    Reachability,
}

/// A routed wire: an orthogonal polyline (corner points only) plus its cost.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wire {
    pub points: Vec<GridPoint>,
    #[serde(default)]
    pub cost: WireCost,
    #[serde(default)]
    pub quality: WireQuality,
}

impl Wire {
    pub fn new(points: Vec<GridPoint>, cost: WireCost) -> Self {
        Self { points, cost, quality: WireQuality::Routed }
    }

    /// A wire known only by its geometry, e.g. reloaded from a saved diagram.
    pub fn from_points(points: Vec<GridPoint>) -> Self {
        Self { points, cost: WireCost::default(), quality: WireQuality::Routed }
    }

    pub fn turns(&self) -> usize {
        self.points.len().saturating_sub(2)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    BadDirection,
    BlockedStartStep,
    BlockedEndStep,
    NoPath,
    Timeout,
    UnknownPort,
}

impl FailureReason {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::BadDirection => "bad_direction",
            Self::BlockedStartStep => "blocked_start_step",
            Self::BlockedEndStep => "blocked_end_step",
            Self::NoPath => "no_path",
            Self::Timeout => "timeout",
            Self::UnknownPort => "unknown_port",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a failed connection wanted to start or end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureEndpoint {
    pub x: i32,
    pub y: i32,
    pub dir: Option<Direction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteFailure {
    pub key: ConnectionKey,
    pub from: PortId,
    pub to: PortId,
    pub reason: FailureReason,
    pub start: Option<FailureEndpoint>,
    pub end: Option<FailureEndpoint>,
    /// Component whose obstacle covers a blocked stub cell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_by: Option<ComponentId>,
}

/// Aggregate cost over every connection routed in one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteCost {
    pub total: u32,
    pub length: u32,
    pub turns: u32,
    pub hops: u32,
    pub near: u32,
    pub failed: u32,
    pub breakdown: NearBreakdown,
}

impl RouteCost {
    pub fn absorb(&mut self, cost: &WireCost) {
        self.total += cost.total;
        self.length += cost.length;
        self.turns += cost.turns;
        self.hops += cost.hops;
        self.near += cost.near;
        self.breakdown.add(&cost.breakdown);
    }
}

/// The full output of one solve; pass it back as the previous solution for incremental solves.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Solution {
    pub wires: BTreeMap<ConnectionKey, Wire>,
    #[serde(default)]
    pub cost: RouteCost,
    #[serde(default)]
    pub failures: Vec<RouteFailure>,
    #[serde(default)]
    pub duration_ms: u64,
}

impl Solution {
    pub fn wire(&self, key: &str) -> Option<&Wire> {
        self.wires.get(key)
    }

    pub fn failure(&self, key: &str) -> Option<&RouteFailure> {
        self.failures.iter().find(|failure| failure.key.as_str() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::{FailureEndpoint, FailureReason, RouteCost, RouteFailure, Wire, WireCost};
    use crate::model::{ConnectionKey, Direction, GridPoint, PortId};

    #[test]
    fn failure_reasons_serialize_as_snake_case() {
        let json = serde_json::to_string(&FailureReason::BlockedStartStep).unwrap();
        assert_eq!(json, "\"blocked_start_step\"");
        assert_eq!(FailureReason::Timeout.to_string(), "timeout");
    }

    #[test]
    fn failures_decode_what_they_encode() {
        let failure = RouteFailure {
            key: ConnectionKey::new("a:0->b:0:0").unwrap(),
            from: PortId::new("a:out:0").unwrap(),
            to: PortId::new("b:in:0").unwrap(),
            reason: FailureReason::BlockedEndStep,
            start: Some(FailureEndpoint { x: 1, y: 2, dir: Some(Direction::Right) }),
            end: Some(FailureEndpoint { x: 9, y: 2, dir: None }),
            blocked_by: None,
        };
        let json = serde_json::to_value(&failure).unwrap();
        assert_eq!(json["start"]["dir"], "right");
        assert!(json.get("blocked_by").is_none());
        let back: RouteFailure = serde_json::from_value(json).unwrap();
        assert_eq!(back, failure);
    }

    #[test]
    fn aggregate_cost_sums_wire_costs() {
        let mut total = RouteCost::default();
        let mut cost = WireCost { total: 10, length: 4, turns: 1, ..WireCost::default() };
        cost.breakdown.obs1 = 2;
        total.absorb(&cost);
        total.absorb(&cost);
        assert_eq!(total.total, 20);
        assert_eq!(total.turns, 2);
        assert_eq!(total.breakdown.obs1, 4);
    }

    #[test]
    fn wire_turns_count_corners() {
        let wire = Wire::from_points(vec![
            GridPoint::new(0, 0),
            GridPoint::new(2, 0),
            GridPoint::new(2, 3),
            GridPoint::new(5, 3),
        ]);
        assert_eq!(wire.turns(), 2);
    }
}
