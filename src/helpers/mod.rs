// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Per-type node helpers and the registry that dispatches on type tags.
//!
//! A helper knows how to construct one node type from buffered values, how to apply and read
//! single properties, and how to describe a node as operation records. Helpers are looked up by
//! type tag; nothing is resolved by name at call time beyond that lookup.

mod snapshot;
mod table;

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;

use crate::convert::{ConversionError, TypeConverter};
use crate::model::{
    Graph, GraphError, Node, NodeId, PropertyName, Subtree, TypeTag, Value, ValueKind,
};
use crate::ops::OperationRecord;

pub use snapshot::{emit_subtree, persist_snapshot, snapshot_records};
pub use table::{NodeType, PropertySpec, TableHelper};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("no helper registered for type {type_tag:?}")]
    UnknownType { type_tag: TypeTag },
    #[error("a helper for type {type_tag:?} is already registered")]
    Duplicate { type_tag: TypeTag },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HelperError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("type {type_tag:?} has no property {property:?}")]
    UnknownProperty { type_tag: TypeTag, property: PropertyName },
    #[error("property {property:?} expects {expected:?}, got {found}")]
    WrongKind { property: PropertyName, expected: ValueKind, found: String },
    #[error("{type_tag:?} needs constructor property {property:?}")]
    MissingConstructorProperty { type_tag: TypeTag, property: PropertyName },
    #[error("{type_tag:?} needs a mandatory child of type {child_type:?}")]
    MissingMandatoryChild { type_tag: TypeTag, child_type: TypeTag },
    /// Construction needs a node that is still waiting to be created.
    #[error("waiting for {waiting_for}")]
    NotReady { waiting_for: NodeId },
    #[error("cannot convert {property:?}: {source}")]
    Conversion {
        property: PropertyName,
        #[source]
        source: ConversionError,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Source of buffered values while a node is being constructed.
///
/// Whatever is taken is consumed: the caller will not apply it again as an ordinary property
/// or creation.
pub trait ConstructionContext {
    /// The buffered value for `name` on the node under construction, decoded as `kind`.
    fn take_property(&mut self, name: &str, kind: ValueKind) -> Result<Option<Value>, HelperError>;

    /// A fully constructed child of type `type_tag` announced for the node under construction.
    fn take_child(&mut self, type_tag: &str) -> Result<Option<Subtree>, HelperError>;
}

pub trait NodeHelper: Send + Sync {
    fn type_tag(&self) -> &str;

    /// Declared kind of `name`, `None` if the type has no such property.
    fn property_kind(&self, name: &str) -> Option<ValueKind>;

    fn allows_child(&self, type_tag: &str) -> bool;

    fn mandatory_children(&self) -> &[TypeTag];

    fn construct(
        &self,
        id: &NodeId,
        ctx: &mut dyn ConstructionContext,
    ) -> Result<Subtree, HelperError>;

    /// Validates and stores one property; returns the previous value.
    fn apply_property(
        &self,
        graph: &mut Graph,
        id: &NodeId,
        name: &str,
        value: Value,
    ) -> Result<Value, HelperError>;

    fn read_property(&self, node: &Node, name: &str) -> Result<Value, HelperError>;

    /// Property records describing the persistable state of `subtree`'s root.
    fn emit_properties(
        &self,
        subtree: &Subtree,
        converter: &TypeConverter,
    ) -> Result<Vec<OperationRecord>, HelperError>;

    /// Creation record followed by the property records. Children are not included.
    fn emit(
        &self,
        parent: &NodeId,
        index: usize,
        subtree: &Subtree,
        converter: &TypeConverter,
    ) -> Result<Vec<OperationRecord>, HelperError> {
        let mut records = vec![OperationRecord::CreateNode {
            parent_id: parent.clone(),
            type_tag: subtree.type_tag.clone(),
            node_id: subtree.id.clone(),
            index,
        }];
        records.extend(self.emit_properties(subtree, converter)?);
        Ok(records)
    }

    /// Builds a detached node locally, mandatory children included.
    fn build(
        &self,
        id: NodeId,
        properties: Vec<(PropertyName, Value)>,
        registry: &HelperRegistry,
    ) -> Result<Subtree, HelperError>;
}

#[derive(Default)]
pub struct HelperRegistry {
    helpers: HashMap<TypeTag, Arc<dyn NodeHelper>>,
}

impl std::fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut tags = self.helpers.keys().collect::<Vec<_>>();
        tags.sort();
        f.debug_struct("HelperRegistry").field("types", &tags).finish()
    }
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, helper: Arc<dyn NodeHelper>) -> Result<(), RegistryError> {
        let type_tag = TypeTag::from(helper.type_tag());
        if self.helpers.contains_key(&type_tag) {
            return Err(RegistryError::Duplicate { type_tag });
        }
        self.helpers.insert(type_tag, helper);
        Ok(())
    }

    /// Registers a [`TableHelper`] for `node_type`.
    pub fn register_type(&mut self, node_type: NodeType) -> Result<(), RegistryError> {
        self.register(Arc::new(TableHelper::new(node_type)))
    }

    pub fn get(&self, type_tag: &str) -> Result<&Arc<dyn NodeHelper>, RegistryError> {
        self.helpers
            .get(type_tag)
            .ok_or_else(|| RegistryError::UnknownType { type_tag: type_tag.into() })
    }

    pub fn contains(&self, type_tag: &str) -> bool {
        self.helpers.contains_key(type_tag)
    }

    /// Builds a detached subtree of type `type_tag` through its helper.
    pub fn build(
        &self,
        type_tag: &str,
        id: NodeId,
        properties: Vec<(PropertyName, Value)>,
    ) -> Result<Subtree, HelperError> {
        self.get(type_tag)?.build(id, properties, self)
    }
}
