// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Treesync: transactional persistence and replay for object graphs.
//!
//! Local graph mutations become operation records, records travel as JSON batches, and a
//! receiver replays each batch atomically into its own copy of the graph. An undo coordinator
//! listens to the same notifications and keeps a history of compound edits.

pub mod codec;
pub mod config;
pub mod convert;
pub mod helpers;
pub mod model;
pub mod ops;
pub mod persist;
pub mod render;
pub mod schema;
pub mod telemetry;
pub mod undo;
