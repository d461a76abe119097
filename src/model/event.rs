// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use super::ids::{NodeId, PropertyName};
use super::node::Subtree;
use super::value::Value;

/// Change notification raised by a [`Graph`](super::Graph) after it has been mutated.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphEvent {
    ChildAdded {
        parent: NodeId,
        /// Position among siblings of the same type.
        index: usize,
        child: Subtree,
    },
    ChildRemoved {
        parent: NodeId,
        index: usize,
        /// Position among all children of `parent`.
        position: usize,
        child: Subtree,
    },
    PropertyChanged {
        node: NodeId,
        name: PropertyName,
        old: Value,
        new: Value,
    },
    IdChanged {
        old: NodeId,
        new: NodeId,
    },
    TransactionStarted {
        message: String,
    },
    TransactionEnded,
    TransactionRolledBack {
        message: String,
    },
    LoadingStarted,
    LoadingFinished,
}

impl GraphEvent {
    /// Node the event is about, if any.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::ChildAdded { child, .. } | Self::ChildRemoved { child, .. } => Some(&child.id),
            Self::PropertyChanged { node, .. } => Some(node),
            Self::IdChanged { new, .. } => Some(new),
            Self::TransactionStarted { .. }
            | Self::TransactionEnded
            | Self::TransactionRolledBack { .. }
            | Self::LoadingStarted
            | Self::LoadingFinished => None,
        }
    }
}

/// Observer of graph notifications.
///
/// Listeners run synchronously on the mutating thread, after the mutation took effect.
pub trait GraphListener: Send + Sync {
    fn on_event(&self, event: &GraphEvent);
}
