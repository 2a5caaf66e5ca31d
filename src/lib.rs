// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Wirerouter-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Wirerouter and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Wirerouter: orthogonal wire routing for block-diagram editors.
//!
//! [`route::solve`] turns ports, obstacles and connections into Manhattan polylines;
//! [`worker`] wraps it in the editor's request/response protocol.

pub mod model;
pub mod route;
pub mod worker;

pub use route::{solve, RouteInput, Router, RouterSettings};
