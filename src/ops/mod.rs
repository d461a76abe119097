// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Operation records: the atomic entries of the persistence log.
//!
//! A transaction is a `Begin`, any number of structural/property records, and a matching
//! `Commit` (or a `Rollback`). Records carry wire-level values; conversion to domain values
//! happens on the receiving side, once the target property's declared kind is known.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::convert::{WireKind, WirePrimitive};
use crate::model::{NodeId, PropertyName, TypeTag};
use crate::persist::{PersistError, Persister};

/// Record discriminator as it appears on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Method {
    #[serde(rename = "begin")]
    Begin,
    #[serde(rename = "commit")]
    Commit,
    #[serde(rename = "rollback")]
    Rollback,
    #[serde(rename = "persistObject")]
    CreateNode,
    #[serde(rename = "persistProperty")]
    SetProperty,
    #[serde(rename = "changeProperty")]
    SetPropertyConditional,
    #[serde(rename = "removeObject")]
    RemoveNode,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Begin => "begin",
            Self::Commit => "commit",
            Self::Rollback => "rollback",
            Self::CreateNode => "persistObject",
            Self::SetProperty => "persistProperty",
            Self::SetPropertyConditional => "changeProperty",
            Self::RemoveNode => "removeObject",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum OperationRecord {
    Begin,
    Commit,
    Rollback,
    CreateNode {
        parent_id: NodeId,
        type_tag: TypeTag,
        node_id: NodeId,
        /// Position among the parent's children of the same type.
        index: usize,
    },
    SetProperty {
        node_id: NodeId,
        name: PropertyName,
        kind: WireKind,
        value: WirePrimitive,
    },
    /// Applied only if the live value still equals `old_value`.
    SetPropertyConditional {
        node_id: NodeId,
        name: PropertyName,
        kind: WireKind,
        old_value: WirePrimitive,
        new_value: WirePrimitive,
    },
    RemoveNode {
        parent_id: NodeId,
        node_id: NodeId,
    },
}

impl OperationRecord {
    pub fn method(&self) -> Method {
        match self {
            Self::Begin => Method::Begin,
            Self::Commit => Method::Commit,
            Self::Rollback => Method::Rollback,
            Self::CreateNode { .. } => Method::CreateNode,
            Self::SetProperty { .. } => Method::SetProperty,
            Self::SetPropertyConditional { .. } => Method::SetPropertyConditional,
            Self::RemoveNode { .. } => Method::RemoveNode,
        }
    }

    /// Node the record targets; `None` for transaction boundaries.
    pub fn node_id(&self) -> Option<&NodeId> {
        match self {
            Self::Begin | Self::Commit | Self::Rollback => None,
            Self::CreateNode { node_id, .. }
            | Self::SetProperty { node_id, .. }
            | Self::SetPropertyConditional { node_id, .. }
            | Self::RemoveNode { node_id, .. } => Some(node_id),
        }
    }

    pub fn is_boundary(&self) -> bool {
        matches!(self, Self::Begin | Self::Commit | Self::Rollback)
    }

    /// Unconditional property set; the wire kind is taken from the value.
    pub fn set_property(
        node_id: NodeId,
        name: impl Into<PropertyName>,
        value: WirePrimitive,
    ) -> Self {
        Self::SetProperty { node_id, name: name.into(), kind: value.kind(), value }
    }

    /// Conditional property set; the wire kind is taken from whichever value is not null.
    pub fn set_property_conditional(
        node_id: NodeId,
        name: impl Into<PropertyName>,
        old_value: WirePrimitive,
        new_value: WirePrimitive,
    ) -> Self {
        let kind = match new_value.kind() {
            WireKind::Null => old_value.kind(),
            kind => kind,
        };
        Self::SetPropertyConditional { node_id, name: name.into(), kind, old_value, new_value }
    }
}

/// Feeds one record into `persister`.
pub fn dispatch<P: Persister + ?Sized>(
    persister: &P,
    record: OperationRecord,
) -> Result<(), PersistError> {
    match record {
        OperationRecord::Begin => persister.begin(),
        OperationRecord::Commit => persister.commit(),
        OperationRecord::Rollback => {
            persister.rollback();
            Ok(())
        }
        OperationRecord::CreateNode { parent_id, type_tag, node_id, index } => {
            persister.create_node(parent_id, type_tag, node_id, index)
        }
        OperationRecord::SetProperty { node_id, name, kind, value } => {
            persister.set_property(node_id, name, kind, value)
        }
        OperationRecord::SetPropertyConditional { node_id, name, kind, old_value, new_value } => {
            persister.set_property_conditional(node_id, name, kind, old_value, new_value)
        }
        OperationRecord::RemoveNode { parent_id, node_id } => {
            persister.remove_node(parent_id, node_id)
        }
    }
}
