// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use std::collections::HashMap;

use tracing::{debug, warn};

use super::protocol::{PixelPoint, RouteRequest, RouteResponse};
use super::snapshot::build_route_input;
use super::WorkerError;
use crate::model::{Connection, GridPoint, PortNode};
use crate::route::{fallback_polyline, Router, RouterSettings, GRID_SIZE};

/// Settings for a worker job: a full relayout sized to the canvas, with an optional budget.
pub fn job_settings(request: &RouteRequest, time_limit_override: Option<u64>) -> RouterSettings {
    let settings = RouterSettings::relayout(request.width.max(1), request.height.max(1));
    match time_limit_override.or(request.time_limit_ms) {
        Some(ms) => settings.with_time_limit_ms(ms),
        None => settings,
    }
}

fn to_pixels(points: &[GridPoint]) -> Vec<PixelPoint> {
    points
        .iter()
        .map(|p| PixelPoint { x: p.x() * GRID_SIZE, y: p.y() * GRID_SIZE })
        .collect()
}

/// Routes a snapshot synchronously; `routes[i]` is `None` when connection `i` has no wire
/// (unless the request asks for fallback lines and both of its ports exist).
pub fn route_snapshot(
    request: &RouteRequest,
    time_limit_override: Option<u64>,
) -> Vec<Option<Vec<PixelPoint>>> {
    let built = build_route_input(&request.snapshot);
    let mut router = Router::new(job_settings(request, time_limit_override));
    let solution = router.solve(&built.input, None);
    debug!(
        job_id = request.job_id,
        wires = solution.wires.len(),
        failed = solution.cost.failed,
        duration_ms = solution.duration_ms,
        "route job solved"
    );

    let ports: HashMap<&str, &PortNode> =
        built.input.ports.iter().map(|port| (port.id().as_str(), port)).collect();
    let connections: HashMap<&str, &Connection> =
        built.input.connections.iter().map(|conn| (conn.key().as_str(), conn)).collect();
    let fallback = |key: &str| {
        let conn = connections.get(key)?;
        let from = ports.get(conn.from().as_str())?;
        let to = ports.get(conn.to().as_str())?;
        let points = fallback_polyline(from.point(), to.point());
        (points.len() >= 2).then(|| to_pixels(&points))
    };

    built
        .keys
        .iter()
        .map(|key| {
            let key = key.as_ref()?.as_str();
            match solution.wire(key) {
                Some(wire) if wire.points.len() >= 2 => Some(to_pixels(&wire.points)),
                _ if request.fallback_lines => fallback(key),
                _ => None,
            }
        })
        .collect()
}

/// Runs one job on the blocking pool. A panic inside the router becomes `ok: false`.
pub async fn run_route_job(request: RouteRequest, time_limit_override: Option<u64>) -> RouteResponse {
    let job_id = request.job_id;
    let joined = tokio::task::spawn_blocking(move || route_snapshot(&request, time_limit_override))
        .await
        .map_err(WorkerError::from);
    match joined {
        Ok(routes) => RouteResponse::routed(job_id, routes),
        Err(err) => {
            warn!(job_id, error = %err, "route job failed");
            RouteResponse::failed(job_id, err.to_string())
        }
    }
}

/// Decodes one JSON request and runs it. Undecodable input is answered with `ok: false`, echoing
/// `jobId` when it can be recovered.
pub async fn handle_request_json(raw: &str, time_limit_override: Option<u64>) -> RouteResponse {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => return RouteResponse::failed(0, WorkerError::Decode(err).to_string()),
    };
    let job_id = value.get("jobId").and_then(serde_json::Value::as_u64).unwrap_or(0);
    match serde_json::from_value::<RouteRequest>(value) {
        Ok(request) => run_route_job(request, time_limit_override).await,
        Err(err) => {
            warn!(job_id, error = %err, "rejected route request");
            RouteResponse::failed(job_id, WorkerError::Decode(err).to_string())
        }
    }
}
