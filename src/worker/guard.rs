// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Accept/discard gate for worker responses that may arrive after the diagram changed.

use super::protocol::{ConnectionSnapshot, RouteResponse};

/// Structural signature of a connection list: `from:fi->to:ti` joined by `|`, in order.
pub fn connection_signature(connections: &[ConnectionSnapshot]) -> String {
    let mut out = String::new();
    let mut buf = itoa::Buffer::new();
    for (idx, conn) in connections.iter().enumerate() {
        if idx > 0 {
            out.push('|');
        }
        out.push_str(&conn.from);
        out.push(':');
        out.push_str(buf.format(conn.from_index));
        out.push_str("->");
        out.push_str(&conn.to);
        out.push(':');
        out.push_str(buf.format(conn.to_index));
    }
    out
}

/// What the caller captured when it submitted a job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteJobGuard {
    job_id: u64,
    epoch: u64,
    signature: String,
}

impl RouteJobGuard {
    pub fn capture(job_id: u64, epoch: u64, connections: &[ConnectionSnapshot]) -> Self {
        Self { job_id, epoch, signature: connection_signature(connections) }
    }

    pub fn job_id(&self) -> u64 {
        self.job_id
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Whether `response` may be applied to the caller's current state.
    pub fn accepts(
        &self,
        response: &RouteResponse,
        current_epoch: u64,
        current: &[ConnectionSnapshot],
    ) -> bool {
        if !response.ok || response.job_id != self.job_id {
            return false;
        }
        let Some(routes) = &response.routes else {
            return false;
        };
        routes.len() == current.len()
            && self.epoch == current_epoch
            && self.signature == connection_signature(current)
    }
}

#[cfg(test)]
mod tests {
    use super::{connection_signature, RouteJobGuard};
    use crate::worker::protocol::{ConnectionSnapshot, RouteResponse};

    fn link(from: &str, fi: u32, to: &str, ti: u32) -> ConnectionSnapshot {
        ConnectionSnapshot { from: from.into(), to: to.into(), from_index: fi, to_index: ti }
    }

    fn connections() -> Vec<ConnectionSnapshot> {
        vec![link("b1", 0, "b2", 1), link("b2", 0, "b3", 0)]
    }

    #[test]
    fn signature_joins_pins_in_order() {
        assert_eq!(connection_signature(&connections()), "b1:0->b2:1|b2:0->b3:0");
        assert_eq!(connection_signature(&[]), "");
    }

    #[test]
    fn matching_response_is_accepted() {
        let guard = RouteJobGuard::capture(5, 2, &connections());
        let response = RouteResponse::routed(5, vec![None, None]);
        assert!(guard.accepts(&response, 2, &connections()));
    }

    #[test]
    fn stale_epoch_is_discarded() {
        let guard = RouteJobGuard::capture(5, 2, &connections());
        let response = RouteResponse::routed(5, vec![None, None]);
        assert!(!guard.accepts(&response, 3, &connections()));
    }

    #[test]
    fn edited_connections_are_discarded() {
        let guard = RouteJobGuard::capture(5, 2, &connections());
        let response = RouteResponse::routed(5, vec![None, None]);
        let mut edited = connections();
        edited[1].to_index = 1;
        assert!(!guard.accepts(&response, 2, &edited));
    }

    #[test]
    fn route_count_must_match() {
        let guard = RouteJobGuard::capture(5, 2, &connections());
        assert!(!guard.accepts(&RouteResponse::routed(5, vec![None]), 2, &connections()));
        assert!(!guard.accepts(&RouteResponse::failed(5, "boom"), 2, &connections()));
        assert!(!guard.accepts(&RouteResponse::routed(6, vec![None, None]), 2, &connections()));
    }
}
