// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use serde::{Deserialize, Deserializer, Serialize};

use super::geom::{lenient_direction, Direction, GridPoint};
use super::ids::{ComponentId, ConnectionKey, PortId};

/// A fixed connection point with a mandatory exit direction, in grid units.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortNode {
    id: PortId,
    x: i32,
    y: i32,
    #[serde(default, deserialize_with = "lenient_direction")]
    dir: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    component: Option<ComponentId>,
}

impl PortNode {
    pub fn new(id: PortId, x: i32, y: i32, dir: Direction) -> Self {
        Self { id, x, y, dir: Some(dir), component: None }
    }

    /// A port whose direction could not be interpreted; routing it fails with `bad_direction`.
    pub fn without_direction(id: PortId, x: i32, y: i32) -> Self {
        Self { id, x, y, dir: None, component: None }
    }

    pub fn with_component(mut self, component: ComponentId) -> Self {
        self.component = Some(component);
        self
    }

    pub fn id(&self) -> &PortId {
        &self.id
    }

    pub fn point(&self) -> GridPoint {
        GridPoint::new(self.x, self.y)
    }

    pub fn dir(&self) -> Option<Direction> {
        self.dir
    }

    pub fn component(&self) -> ComponentId {
        self.component.clone().unwrap_or_else(|| self.id.component_prefix())
    }
}

/// Fractional cell coordinates are floored.
fn floored<'de, D>(deserializer: D) -> Result<i32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(f64::deserialize(deserializer)?.floor() as i32)
}

/// A blocked rectangle of grid cells, bounds inclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObstacleRect {
    #[serde(deserialize_with = "floored")]
    pub x0: i32,
    #[serde(deserialize_with = "floored")]
    pub y0: i32,
    #[serde(deserialize_with = "floored")]
    pub x1: i32,
    #[serde(deserialize_with = "floored")]
    pub y1: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<ComponentId>,
}

impl ObstacleRect {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32) -> Self {
        Self { x0: x0.min(x1), y0: y0.min(y1), x1: x0.max(x1), y1: y0.max(y1), owner: None }
    }

    pub fn cell(point: GridPoint) -> Self {
        Self::new(point.x(), point.y(), point.x(), point.y())
    }

    pub fn owned_by(mut self, owner: ComponentId) -> Self {
        self.owner = Some(owner);
        self
    }

    pub fn contains(&self, point: GridPoint) -> bool {
        point.x() >= self.x0 && point.x() <= self.x1 && point.y() >= self.y0 && point.y() <= self.y1
    }

    pub fn cells(&self) -> impl Iterator<Item = GridPoint> + '_ {
        (self.y0..=self.y1).flat_map(move |y| (self.x0..=self.x1).map(move |x| GridPoint::new(x, y)))
    }
}

/// A point-to-point connection between two ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    from: PortId,
    to: PortId,
    key: ConnectionKey,
}

impl Connection {
    pub fn new(from: PortId, to: PortId, key: ConnectionKey) -> Self {
        Self { from, to, key }
    }

    /// Connection keyed `"{from}->{to}:{index}"`, for callers without their own identity.
    pub fn with_index_key(from: PortId, to: PortId, index: usize) -> Self {
        let mut buf = itoa::Buffer::new();
        let raw = format!("{from}->{to}:{}", buf.format(index));
        let key = ConnectionKey::new(raw).expect("joined port ids form a valid key");
        Self { from, to, key }
    }

    pub fn from(&self) -> &PortId {
        &self.from
    }

    pub fn to(&self) -> &PortId {
        &self.to
    }

    pub fn key(&self) -> &ConnectionKey {
        &self.key
    }

    /// Sibling connections share a source port or a destination port.
    pub fn is_sibling_of(&self, other: &Connection) -> bool {
        self.from == other.from || self.to == other.to
    }
}
