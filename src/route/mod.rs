// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Orthogonal wire routing.
//!
//! Connections are routed one at a time, greedily in input order: each accepted wire is added
//! to the occupancy that the next search reads. An optional previous [`Solution`] supplies
//! static geometry for connections the incremental scheduler leaves clean.
//!
//! [`Solution`]: crate::model::Solution

pub mod analysis;
pub mod fallback;
pub mod grid;
pub mod occupancy;
pub mod postprocess;
pub mod schedule;
pub mod search;
pub mod settings;
pub mod solver;

pub use analysis::{analyze, GeometryReport};
pub use fallback::fallback_polyline;
pub use settings::{RouterSettings, GRID_SIZE, MAX_SEARCH_PADDING};
pub use solver::{solve, RouteInput, Router, RunSnapshot};
