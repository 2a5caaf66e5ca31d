// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

#![allow(dead_code)]

// Shared deterministic benchmark fixtures (no RNG).

use wirerouter::model::{ComponentId, Connection, Direction, ObstacleRect, PortId, PortNode};
use wirerouter::route::RouteInput;
use wirerouter::worker::{
    BlockSnapshot, ConnectionSnapshot, PortKind, PortSnapshot, RouteRequest, Snapshot,
};

#[derive(Debug, Clone, Copy)]
pub struct LatticeParams {
    pub cols: i32,
    pub rows: i32,
    /// Cells between block origins.
    pub pitch_x: i32,
    pub pitch_y: i32,
}

impl LatticeParams {
    pub const fn new(cols: i32, rows: i32) -> Self {
        Self { cols, rows, pitch_x: 12, pitch_y: 10 }
    }

    pub const fn tight(mut self) -> Self {
        self.pitch_x = 8;
        self.pitch_y = 7;
        self
    }
}

fn block_name(col: i32, row: i32) -> String {
    format!("b{col}_{row}")
}

fn pid(raw: String) -> PortId {
    PortId::new(raw).expect("valid port id")
}

/// Blocks on a lattice; every block feeds the block to its right on the same row and, through
/// the same output pin, the block to its right one row down (wrapping), so every source port
/// fans out twice.
pub fn lattice(params: LatticeParams) -> RouteInput {
    let mut input = RouteInput::default();
    for row in 0..params.rows {
        for col in 0..params.cols {
            let name = block_name(col, row);
            let component = ComponentId::new(&name).expect("valid component id");
            let (x0, y0) = (col * params.pitch_x, row * params.pitch_y);
            let (x1, y1) = (x0 + 4, y0 + 4);
            input.obstacles.push(ObstacleRect::new(x0, y0, x1, y1).owned_by(component.clone()));
            input.ports.push(
                PortNode::new(pid(format!("{name}:out:0")), x1, y0 + 2, Direction::Right)
                    .with_component(component.clone()),
            );
            input.ports.push(
                PortNode::new(pid(format!("{name}:in:0")), x0, y0 + 2, Direction::Left)
                    .with_component(component.clone()),
            );
            input.ports.push(
                PortNode::new(pid(format!("{name}:in:1")), x0 + 2, y0, Direction::Up)
                    .with_component(component),
            );
        }
    }

    for row in 0..params.rows {
        for col in 0..params.cols - 1 {
            let from = pid(format!("{}:out:0", block_name(col, row)));
            let next_row = (row + 1) % params.rows;
            let targets = [
                pid(format!("{}:in:0", block_name(col + 1, row))),
                pid(format!("{}:in:1", block_name(col + 1, next_row))),
            ];
            for to in targets {
                let index = input.connections.len();
                input.connections.push(Connection::with_index_key(from.clone(), to, index));
            }
        }
    }
    input
}

/// The same lattice as an editor snapshot in pixels.
pub fn lattice_request(params: LatticeParams, job_id: u64) -> RouteRequest {
    let pixels = |cells: i32| f64::from(cells * 10);
    let mut snapshot = Snapshot::default();
    for row in 0..params.rows {
        for col in 0..params.cols {
            snapshot.blocks.push(BlockSnapshot {
                id: block_name(col, row),
                x: pixels(col * params.pitch_x),
                y: pixels(row * params.pitch_y),
                width: 40.0,
                height: 40.0,
                rotation: 0.0,
                ports: vec![
                    PortSnapshot { kind: PortKind::Out, index: 0, x: 40.0, y: 20.0 },
                    PortSnapshot { kind: PortKind::In, index: 0, x: 0.0, y: 20.0 },
                    PortSnapshot { kind: PortKind::In, index: 1, x: 20.0, y: 0.0 },
                ],
            });
        }
    }
    for row in 0..params.rows {
        for col in 0..params.cols - 1 {
            for (to_row, to_index) in [(row, 0), ((row + 1) % params.rows, 1)] {
                snapshot.connections.push(ConnectionSnapshot {
                    from: block_name(col, row),
                    to: block_name(col + 1, to_row),
                    from_index: 0,
                    to_index,
                });
            }
        }
    }

    let width = u32::try_from(params.cols * params.pitch_x * 10).unwrap_or(1);
    let height = u32::try_from(params.rows * params.pitch_y * 10).unwrap_or(1);
    RouteRequest {
        job_id,
        snapshot,
        width,
        height,
        time_limit_ms: Some(4_000),
        fallback_lines: false,
    }
}

pub fn checksum_points<'a>(polylines: impl IntoIterator<Item = &'a [wirerouter::model::GridPoint]>) -> u64 {
    let mut acc = 0u64;
    for points in polylines {
        acc = acc.wrapping_mul(131).wrapping_add(points.len() as u64);
        for point in points {
            acc = acc.wrapping_add(point.x().unsigned_abs() as u64);
            acc = acc.wrapping_add(point.y().unsigned_abs() as u64);
        }
    }
    acc
}
