// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Core data model.
//!
//! A [`Graph`] owns every [`Node`] by id; structure and property changes are announced to
//! [`GraphListener`]s as [`GraphEvent`]s.

pub mod event;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod graph;
pub mod ids;
pub mod node;
pub mod value;

pub use event::{GraphEvent, GraphListener};
pub use graph::{Graph, GraphError, NodeLookup, Removal};
pub use ids::{IdError, NodeId, PropertyName, TypeTag};
pub use node::{Node, Subtree};
pub use value::{Color, EnumType, EnumValue, Point, Rect, Size, Value, ValueKind};
