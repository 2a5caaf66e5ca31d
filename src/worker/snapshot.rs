// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Editor snapshot (blocks in pixels) to router input (ports and obstacles in grid cells).
//!
//! Port ids follow `<block>:<in|out>:<index>` and connection keys
//! `<from>:<fromIndex>-><to>:<toIndex>:<position>`, so keys stay unique even when the same pair
//! of pins is connected twice.

use std::collections::BTreeSet;

use super::protocol::{BlockSnapshot, PortKind, Snapshot};
use crate::model::{ComponentId, Connection, ConnectionKey, Direction, ObstacleRect, PortId, PortNode};
use crate::route::{RouteInput, GRID_SIZE};

/// Clearance drawn around every pin when blocking its block.
pub const PORT_RADIUS: f64 = 6.0;

/// Router input plus, per snapshot connection, the key its wire is stored under.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SnapshotInput {
    pub input: RouteInput,
    pub keys: Vec<Option<ConnectionKey>>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSide {
    Left,
    Right,
    Top,
    Bottom,
}

impl PortSide {
    pub fn direction(self) -> Direction {
        match self {
            Self::Left => Direction::Left,
            Self::Right => Direction::Right,
            Self::Top => Direction::Up,
            Self::Bottom => Direction::Down,
        }
    }
}

fn quarter_turns(block: &BlockSnapshot) -> Option<u8> {
    let angle = block.rotation.rem_euclid(360.0);
    if angle == 0.0 {
        Some(0)
    } else if angle == 90.0 {
        Some(1)
    } else if angle == 180.0 {
        Some(2)
    } else if angle == 270.0 {
        Some(3)
    } else {
        None
    }
}

fn center(block: &BlockSnapshot) -> (f64, f64) {
    (block.x + block.width / 2.0, block.y + block.height / 2.0)
}

/// Rotates an absolute pixel position about the block center. Angles other than multiples of
/// 90 degrees leave the point unrotated.
pub fn rotate_point(block: &BlockSnapshot, x: f64, y: f64) -> (f64, f64) {
    let (cx, cy) = center(block);
    let (dx, dy) = (x - cx, y - cy);
    match quarter_turns(block) {
        Some(1) => (cx - dy, cy + dx),
        Some(2) => (cx - dx, cy - dy),
        Some(3) => (cx + dy, cy - dx),
        _ => (x, y),
    }
}

pub fn rotated_bounds(block: &BlockSnapshot) -> PixelRect {
    let (cx, cy) = center(block);
    let swap = matches!(quarter_turns(block), Some(1 | 3));
    let (w, h) = if swap { (block.height, block.width) } else { (block.width, block.height) };
    PixelRect {
        left: cx - w / 2.0,
        right: cx + w / 2.0,
        top: cy - h / 2.0,
        bottom: cy + h / 2.0,
    }
}

/// Side of the block a rotated pin sits on; horizontal wins ties.
pub fn port_side(block: &BlockSnapshot, x: f64, y: f64) -> PortSide {
    let (cx, cy) = center(block);
    let (dx, dy) = (x - cx, y - cy);
    if dx.abs() >= dy.abs() {
        if dx < 0.0 {
            PortSide::Left
        } else {
            PortSide::Right
        }
    } else if dy < 0.0 {
        PortSide::Top
    } else {
        PortSide::Bottom
    }
}

fn to_cell(pixels: f64) -> i32 {
    (pixels / f64::from(GRID_SIZE) + 0.5).floor() as i32
}

fn floor_cell(pixels: f64) -> i32 {
    (pixels / f64::from(GRID_SIZE)).floor() as i32
}

/// Blocked cells of a block: its rotated body grown to cover every pin plus [`PORT_RADIUS`].
pub fn block_obstacle(block: &BlockSnapshot, owner: ComponentId) -> ObstacleRect {
    let mut rect = rotated_bounds(block);
    for port in &block.ports {
        let (x, y) = rotate_point(block, block.x + port.x, block.y + port.y);
        rect.left = rect.left.min(x - PORT_RADIUS);
        rect.right = rect.right.max(x + PORT_RADIUS);
        rect.top = rect.top.min(y - PORT_RADIUS);
        rect.bottom = rect.bottom.max(y + PORT_RADIUS);
    }
    ObstacleRect::new(
        floor_cell(rect.left),
        floor_cell(rect.top),
        floor_cell(rect.right),
        floor_cell(rect.bottom),
    )
    .owned_by(owner)
}

fn port_node(block: &BlockSnapshot, kind: PortKind, index: u32) -> Option<PortNode> {
    let port = block.ports.iter().find(|p| p.kind == kind && p.index == index)?;
    let id = PortId::new(port_id(&block.id, kind, index)).ok()?;
    let component = ComponentId::new(&block.id).ok()?;
    let (x, y) = rotate_point(block, block.x + port.x, block.y + port.y);
    let dir = port_side(block, x, y).direction();
    Some(PortNode::new(id, to_cell(x), to_cell(y), dir).with_component(component))
}

fn port_id(block: &str, kind: PortKind, index: u32) -> String {
    let mut buf = itoa::Buffer::new();
    format!("{block}:{}:{}", kind.as_str(), buf.format(index))
}

pub fn build_route_input(snapshot: &Snapshot) -> SnapshotInput {
    let mut out = SnapshotInput::default();
    let mut seen: BTreeSet<PortId> = BTreeSet::new();

    for (position, conn) in snapshot.connections.iter().enumerate() {
        let from_block = snapshot.blocks.iter().find(|b| b.id == conn.from);
        let to_block = snapshot.blocks.iter().find(|b| b.id == conn.to);
        let ends = [
            (from_block, PortKind::Out, conn.from_index),
            (to_block, PortKind::In, conn.to_index),
        ];
        for (block, kind, index) in ends {
            let Some(node) = block.and_then(|b| port_node(b, kind, index)) else {
                continue;
            };
            if seen.insert(node.id().clone()) {
                out.input.ports.push(node);
            }
        }

        let from = PortId::new(port_id(&conn.from, PortKind::Out, conn.from_index));
        let to = PortId::new(port_id(&conn.to, PortKind::In, conn.to_index));
        let key = ConnectionKey::new(format!(
            "{}:{}->{}:{}:{}",
            conn.from, conn.from_index, conn.to, conn.to_index, position
        ));
        match (from, to, key) {
            (Ok(from), Ok(to), Ok(key)) => {
                out.input.connections.push(Connection::new(from, to, key.clone()));
                out.keys.push(Some(key));
            }
            _ => out.keys.push(None),
        }
    }

    for block in &snapshot.blocks {
        if let Ok(owner) = ComponentId::new(&block.id) {
            out.input.obstacles.push(block_obstacle(block, owner));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{build_route_input, port_side, rotate_point, rotated_bounds, PortSide};
    use crate::model::{Direction, GridPoint, ObstacleRect};
    use crate::worker::protocol::{BlockSnapshot, ConnectionSnapshot, PortKind, PortSnapshot, Snapshot};

    fn block(id: &str, x: f64, rotation: f64, ports: Vec<PortSnapshot>) -> BlockSnapshot {
        BlockSnapshot { id: id.into(), x, y: 40.0, width: 60.0, height: 40.0, rotation, ports }
    }

    fn pin(kind: PortKind, x: f64, y: f64) -> PortSnapshot {
        PortSnapshot { kind, index: 0, x, y }
    }

    fn link(from: &str, to: &str) -> ConnectionSnapshot {
        ConnectionSnapshot { from: from.into(), to: to.into(), from_index: 0, to_index: 0 }
    }

    #[rstest]
    #[case(0.0, (160.0, 60.0), PortSide::Right)]
    #[case(90.0, (130.0, 90.0), PortSide::Bottom)]
    #[case(180.0, (100.0, 60.0), PortSide::Left)]
    #[case(-90.0, (130.0, 30.0), PortSide::Top)]
    fn output_pin_follows_rotation(
        #[case] rotation: f64,
        #[case] expected: (f64, f64),
        #[case] side: PortSide,
    ) {
        let b = block("b1", 100.0, rotation, vec![pin(PortKind::Out, 60.0, 20.0)]);
        let (x, y) = rotate_point(&b, 160.0, 60.0);
        assert_eq!((x, y), expected);
        assert_eq!(port_side(&b, x, y), side);
    }

    #[test]
    fn quarter_rotation_swaps_bounds() {
        let b = block("b1", 100.0, 90.0, vec![]);
        let rect = rotated_bounds(&b);
        assert_eq!((rect.left, rect.right, rect.top, rect.bottom), (110.0, 150.0, 30.0, 90.0));
    }

    #[test]
    fn snapshot_becomes_ports_obstacles_and_keys() {
        let snapshot = Snapshot {
            blocks: vec![
                block("b1", 100.0, 0.0, vec![pin(PortKind::Out, 60.0, 20.0)]),
                block("b2", 300.0, 90.0, vec![pin(PortKind::In, 0.0, 20.0)]),
            ],
            connections: vec![link("b1", "b2"), link("b1", "ghost")],
        };
        let built = build_route_input(&snapshot);

        let ports = &built.input.ports;
        assert_eq!(ports.len(), 2);
        assert_eq!(ports[0].id().as_str(), "b1:out:0");
        assert_eq!(ports[0].point(), GridPoint::new(16, 6));
        assert_eq!(ports[0].dir(), Some(Direction::Right));
        assert_eq!(ports[0].component().as_str(), "b1");
        // (300, 60) rotated a quarter turn about (330, 60) lands on the top edge.
        assert_eq!(ports[1].point(), GridPoint::new(33, 3));
        assert_eq!(ports[1].dir(), Some(Direction::Up));

        let obstacle = &built.input.obstacles[0];
        assert_eq!(
            (obstacle.x0, obstacle.y0, obstacle.x1, obstacle.y1),
            (10, 4, 16, 8),
            "pin radius widens the block to the right"
        );
        assert_eq!(obstacle.owner.as_ref().map(|o| o.as_str()), Some("b1"));
        assert_eq!(built.input.obstacles[1], {
            let owner = crate::model::ComponentId::new("b2").unwrap();
            ObstacleRect::new(31, 2, 35, 9).owned_by(owner)
        });

        assert_eq!(built.keys.len(), 2);
        assert_eq!(built.keys[0].as_ref().unwrap().as_str(), "b1:0->b2:0:0");
        assert_eq!(built.keys[1].as_ref().unwrap().as_str(), "b1:0->ghost:0:1");
        assert_eq!(built.input.connections[1].to().as_str(), "ghost:in:0");
    }
}
