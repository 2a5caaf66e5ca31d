// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Request/response records of the route worker, in the editor's pixel space.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteRequest {
    pub job_id: u64,
    #[serde(default)]
    pub snapshot: Snapshot,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_limit_ms: Option<u64>,
    /// Draw a one-bend line for connections whose ports exist but that could not be routed.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub fallback_lines: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Snapshot {
    #[serde(default)]
    pub blocks: Vec<BlockSnapshot>,
    #[serde(default)]
    pub connections: Vec<ConnectionSnapshot>,
}

/// A placed block: top-left corner, unrotated size, rotation in degrees about its center.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct BlockSnapshot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub ports: Vec<PortSnapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum PortKind {
    In,
    Out,
}

impl PortKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::In => "in",
            Self::Out => "out",
        }
    }
}

/// A pin relative to its block's unrotated top-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PortSnapshot {
    #[serde(rename = "type")]
    pub kind: PortKind,
    #[serde(default)]
    pub index: u32,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionSnapshot {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub from_index: u32,
    #[serde(default)]
    pub to_index: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PixelPoint {
    pub x: i32,
    pub y: i32,
}

/// `routes[i]` belongs to `snapshot.connections[i]`; `null` marks a connection that could not
/// be routed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub job_id: u64,
    pub ok: bool,
    pub routes: Option<Vec<Option<Vec<PixelPoint>>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RouteResponse {
    pub fn routed(job_id: u64, routes: Vec<Option<Vec<PixelPoint>>>) -> Self {
        Self { job_id, ok: true, routes: Some(routes), error: None }
    }

    pub fn failed(job_id: u64, error: impl Into<String>) -> Self {
        Self { job_id, ok: false, routes: None, error: Some(error.into()) }
    }
}
