// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Transactional persisters: the sender that turns mutations into wire batches and the
//! receiver that replays batches against a live graph.
//!
//! Both sides share the same contract ([`Persister`]): mutating calls are only legal inside a
//! transaction, transactions nest, and only the outermost `commit` does any work. `rollback`
//! is always safe and discards everything buffered at any depth.

#[cfg(test)]
pub(crate) mod fixtures;
mod forward;
mod message;
mod session;
mod transport;
mod txn;

use thiserror::Error;

use crate::codec::CodecError;
use crate::convert::{ConversionError, WireKind, WirePrimitive};
use crate::helpers::{HelperError, RegistryError};
use crate::model::{GraphError, NodeId, PropertyName, TypeTag};
use crate::ops::Method;

pub use forward::PersisterForwarder;
pub use message::MessagePersister;
pub use session::SessionPersister;
pub use transport::{apply_incoming, ChannelTransport, LocalTransport, Transport};
pub use txn::TxnBuffer;

pub trait Persister: Send + Sync {
    fn begin(&self) -> Result<(), PersistError>;

    /// Closes one nesting level; the outermost commit flushes (sender) or replays (receiver).
    fn commit(&self) -> Result<(), PersistError>;

    /// Drops every buffered record and resets the nesting depth to zero.
    fn rollback(&self);

    fn create_node(
        &self,
        parent_id: NodeId,
        type_tag: TypeTag,
        node_id: NodeId,
        index: usize,
    ) -> Result<(), PersistError>;

    fn set_property(
        &self,
        node_id: NodeId,
        name: PropertyName,
        kind: WireKind,
        value: WirePrimitive,
    ) -> Result<(), PersistError>;

    fn set_property_conditional(
        &self,
        node_id: NodeId,
        name: PropertyName,
        kind: WireKind,
        old_value: WirePrimitive,
        new_value: WirePrimitive,
    ) -> Result<(), PersistError>;

    fn remove_node(&self, parent_id: NodeId, node_id: NodeId) -> Result<(), PersistError>;
}

/// Why a creation, property or removal could not be resolved during replay.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    #[error("no helper registered for type {type_tag:?}")]
    UnknownType { type_tag: TypeTag },
    #[error("parent {parent_id} does not exist")]
    MissingParent { parent_id: NodeId },
    #[error("constructor property {property:?} was not supplied")]
    MissingConstructorProperty { property: PropertyName },
    #[error("mandatory child of type {type_tag:?} was not supplied")]
    MissingMandatoryChild { type_tag: TypeTag },
    #[error("reference to {target} never resolved")]
    UnresolvedReference { target: NodeId },
    #[error("{parent_type:?} does not accept children of type {child_type:?}")]
    IncompatibleChild { parent_type: TypeTag, child_type: TypeTag },
    #[error("node does not exist")]
    UnknownNode,
    #[error("type {type_tag:?} has no property {property:?}")]
    UnknownProperty { type_tag: TypeTag, property: PropertyName },
    #[error("node is not a child of {expected}")]
    ParentMismatch { expected: NodeId },
    #[error("{pending} record(s) wait on nodes that are never created")]
    Stalled { pending: usize },
}

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("{operation} called outside of a transaction")]
    NotInTransaction { operation: Method },
    #[error("conflict on {property:?} (id={node_id}): expected {expected}, live {actual}")]
    Conflict {
        node_id: NodeId,
        property: PropertyName,
        expected: WirePrimitive,
        actual: WirePrimitive,
    },
    #[error("unresolved dependency (id={node_id}): {reason}")]
    Dependency { node_id: NodeId, reason: DependencyError },
    #[error("cannot convert {property:?} (id={node_id}): {source}")]
    Conversion {
        node_id: NodeId,
        property: PropertyName,
        #[source]
        source: ConversionError,
    },
    #[error("helper rejected the change (id={node_id}): {source}")]
    Helper {
        node_id: NodeId,
        #[source]
        source: HelperError,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error("transport failed: {0}")]
    Transport(#[from] TransportError),
}

impl PersistError {
    /// The node the failure is about, when known.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::NotInTransaction { .. } => None,
            Self::Conflict { node_id, .. }
            | Self::Dependency { node_id, .. }
            | Self::Conversion { node_id, .. }
            | Self::Helper { node_id, .. } => Some(node_id),
            Self::Graph(err) => Some(err.node_id()),
            Self::Transport(err) => err.node_id(),
        }
    }

    pub(crate) fn dependency(node_id: &NodeId, reason: DependencyError) -> Self {
        Self::Dependency { node_id: node_id.clone(), reason }
    }

    /// Attributes a helper failure to `node_id`, classifying missing pieces as dependencies.
    pub(crate) fn from_helper(node_id: &NodeId, err: HelperError) -> Self {
        let reason = match err {
            HelperError::Registry(RegistryError::UnknownType { type_tag }) => {
                DependencyError::UnknownType { type_tag }
            }
            HelperError::UnknownProperty { type_tag, property } => {
                DependencyError::UnknownProperty { type_tag, property }
            }
            HelperError::MissingConstructorProperty { property, .. } => {
                DependencyError::MissingConstructorProperty { property }
            }
            HelperError::MissingMandatoryChild { child_type, .. } => {
                DependencyError::MissingMandatoryChild { type_tag: child_type }
            }
            HelperError::NotReady { waiting_for } => {
                DependencyError::UnresolvedReference { target: waiting_for }
            }
            HelperError::Conversion {
                source: ConversionError::UnresolvedReference { node_id: target },
                ..
            } => DependencyError::UnresolvedReference { target },
            HelperError::Conversion { property, source } => {
                return Self::Conversion { node_id: node_id.clone(), property, source };
            }
            HelperError::Graph(err) => return Self::Graph(err),
            other => return Self::Helper { node_id: node_id.clone(), source: other },
        };
        Self::dependency(node_id, reason)
    }
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("channel closed")]
    Closed,
    #[error("receiver rejected the batch: {0}")]
    Rejected(#[source] CodecError),
    #[error("{0}")]
    Failed(String),
}

impl TransportError {
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::Rejected(err) => err.node_id(),
            Self::Closed | Self::Failed(_) => None,
        }
    }
}
