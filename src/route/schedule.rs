// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Incremental scheduling: which connections are rerouted and which keep their geometry.

use std::collections::{BTreeMap, VecDeque};

use super::settings::RouterSettings;
use crate::model::{ComponentId, Connection, PortId, Solution};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    dirty: Vec<bool>,
    seeds: usize,
}

impl Schedule {
    /// Marks every connection dirty.
    pub fn everything(len: usize) -> Self {
        Self { dirty: vec![true; len], seeds: len }
    }

    /// Seeds the dirty set from the settings and the previous solution, then closes it over
    /// shared source ports and shared destination ports.
    pub fn plan<F>(
        connections: &[Connection],
        prev: Option<&Solution>,
        settings: &RouterSettings,
        component_of: F,
    ) -> Self
    where
        F: Fn(&PortId) -> ComponentId,
    {
        let Some(prev) = prev.filter(|_| settings.incremental && !settings.full_optimize) else {
            return Self::everything(connections.len());
        };

        let changed_node = |port: &PortId| {
            settings.changed_nodes.contains(port.as_str())
                || settings.changed_nodes.contains(component_of(port).as_str())
        };

        let mut dirty: Vec<bool> = connections
            .iter()
            .map(|conn| {
                settings.changed_connections.contains(conn.key().as_str())
                    || changed_node(conn.from())
                    || changed_node(conn.to())
                    || !prev.wires.contains_key(conn.key())
            })
            .collect();
        let seeds = dirty.iter().filter(|d| **d).count();

        let mut by_from: BTreeMap<&PortId, Vec<usize>> = BTreeMap::new();
        let mut by_to: BTreeMap<&PortId, Vec<usize>> = BTreeMap::new();
        for (idx, conn) in connections.iter().enumerate() {
            by_from.entry(conn.from()).or_default().push(idx);
            by_to.entry(conn.to()).or_default().push(idx);
        }

        let mut queue: VecDeque<usize> =
            dirty.iter().enumerate().filter(|(_, d)| **d).map(|(idx, _)| idx).collect();
        while let Some(idx) = queue.pop_front() {
            let conn = &connections[idx];
            let siblings = by_from[conn.from()].iter().chain(by_to[conn.to()].iter());
            for &sibling in siblings {
                if !dirty[sibling] {
                    dirty[sibling] = true;
                    queue.push_back(sibling);
                }
            }
        }

        Self { dirty, seeds }
    }

    pub fn is_dirty(&self, idx: usize) -> bool {
        self.dirty.get(idx).copied().unwrap_or(true)
    }

    pub fn dirty_count(&self) -> usize {
        self.dirty.iter().filter(|d| **d).count()
    }

    /// Connections dirty before sibling expansion.
    pub fn seed_count(&self) -> usize {
        self.seeds
    }
}
