// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Route worker: one-shot batch jobs over an immutable editor snapshot.
//!
//! The editor posts a [`RouteRequest`], keeps working, and later applies the
//! [`RouteResponse`] only if its [`RouteJobGuard`] still accepts it.

pub mod guard;
pub mod job;
pub mod protocol;
pub mod snapshot;

use tokio::task::JoinError;

pub use guard::{connection_signature, RouteJobGuard};
pub use job::{handle_request_json, route_snapshot, run_route_job};
pub use protocol::{
    BlockSnapshot, ConnectionSnapshot, PixelPoint, PortKind, PortSnapshot, RouteRequest,
    RouteResponse, Snapshot,
};
pub use snapshot::{build_route_input, SnapshotInput};

#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("invalid route request: {0}")]
    Decode(#[source] serde_json::Error),
    #[error("failed to encode route response: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
    #[error("route job panicked: {0}")]
    Panicked(String),
    #[error("route job was cancelled")]
    Cancelled,
}

impl From<JoinError> for WorkerError {
    fn from(err: JoinError) -> Self {
        if !err.is_panic() {
            return Self::Cancelled;
        }
        let payload = err.into_panic();
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_owned());
        Self::Panicked(message)
    }
}

/// JSON schema of [`RouteRequest`], as printed by `wirerouter --schema`.
pub fn request_schema() -> serde_json::Value {
    serde_json::to_value(schemars::schema_for!(RouteRequest)).unwrap_or_default()
}

pub fn encode_response(response: &RouteResponse) -> Result<String, WorkerError> {
    serde_json::to_string(response).map_err(WorkerError::Encode)
}
