// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Router input and output records.
//!
//! Inputs (ports, obstacles, connections) are rebuilt by the caller on every solve;
//! outputs (wires, solutions) are plain serializable values.

pub mod geom;
pub mod ids;
pub mod port;
pub mod solution;

pub use geom::{Direction, DirectionError, GridPoint, Orientation};
pub use ids::{ComponentId, ConnectionKey, Id, IdError, PortId};
pub use port::{Connection, ObstacleRect, PortNode};
pub use solution::{
    FailureEndpoint, FailureReason, NearBreakdown, RouteCost, RouteFailure, Solution, Wire,
    WireCost, WireQuality,
};
