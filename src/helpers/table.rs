// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use tracing::debug;

use super::{ConstructionContext, HelperError, HelperRegistry, NodeHelper};
use crate::convert::TypeConverter;
use crate::model::{Graph, Node, NodeId, PropertyName, Subtree, TypeTag, Value, ValueKind};
use crate::ops::OperationRecord;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySpec {
    pub name: PropertyName,
    pub kind: ValueKind,
    /// Supplied at construction time rather than set afterwards.
    pub constructor: bool,
    /// Construction fails without it. Only meaningful for constructor properties.
    pub required: bool,
}

/// Property table and child rules of one node type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeType {
    pub tag: TypeTag,
    pub properties: Vec<PropertySpec>,
    pub allowed_children: Vec<TypeTag>,
    pub mandatory_children: Vec<TypeTag>,
}

impl NodeType {
    pub fn new(tag: impl Into<TypeTag>) -> Self {
        Self {
            tag: tag.into(),
            properties: Vec::new(),
            allowed_children: Vec::new(),
            mandatory_children: Vec::new(),
        }
    }

    pub fn property(mut self, name: impl Into<PropertyName>, kind: ValueKind) -> Self {
        self.properties.push(PropertySpec {
            name: name.into(),
            kind,
            constructor: false,
            required: false,
        });
        self
    }

    pub fn constructor(
        mut self,
        name: impl Into<PropertyName>,
        kind: ValueKind,
        required: bool,
    ) -> Self {
        self.properties.push(PropertySpec { name: name.into(), kind, constructor: true, required });
        self
    }

    pub fn child(mut self, tag: impl Into<TypeTag>) -> Self {
        self.allowed_children.push(tag.into());
        self
    }

    /// A child created together with every node of this type.
    pub fn mandatory_child(mut self, tag: impl Into<TypeTag>) -> Self {
        let tag = tag.into();
        if !self.allowed_children.contains(&tag) {
            self.allowed_children.push(tag.clone());
        }
        self.mandatory_children.push(tag);
        self
    }

    pub fn spec(&self, name: &str) -> Option<&PropertySpec> {
        self.properties.iter().find(|spec| spec.name == name)
    }
}

/// [`NodeHelper`] driven by a [`NodeType`] table.
#[derive(Debug, Clone)]
pub struct TableHelper {
    ty: NodeType,
}

impl TableHelper {
    pub fn new(ty: NodeType) -> Self {
        Self { ty }
    }

    pub fn node_type(&self) -> &NodeType {
        &self.ty
    }

    fn declared(&self, name: &str) -> Result<&PropertySpec, HelperError> {
        self.ty.spec(name).ok_or_else(|| HelperError::UnknownProperty {
            type_tag: self.ty.tag.clone(),
            property: name.into(),
        })
    }

    fn check_kind(spec: &PropertySpec, value: &Value) -> Result<(), HelperError> {
        if value.matches_kind(spec.kind) {
            return Ok(());
        }
        Err(HelperError::WrongKind {
            property: spec.name.clone(),
            expected: spec.kind,
            found: value.to_string(),
        })
    }

    fn child_id(id: &NodeId, child_type: &str) -> Result<NodeId, HelperError> {
        let raw = format!("{id}.{}", child_type.to_lowercase());
        NodeId::new(raw).map_err(|_| HelperError::MissingMandatoryChild {
            type_tag: child_type.into(),
            child_type: child_type.into(),
        })
    }
}

impl NodeHelper for TableHelper {
    fn type_tag(&self) -> &str {
        &self.ty.tag
    }

    fn property_kind(&self, name: &str) -> Option<ValueKind> {
        self.ty.spec(name).map(|spec| spec.kind)
    }

    fn allows_child(&self, type_tag: &str) -> bool {
        self.ty.allowed_children.iter().any(|allowed| allowed == type_tag)
    }

    fn mandatory_children(&self) -> &[TypeTag] {
        &self.ty.mandatory_children
    }

    fn construct(
        &self,
        id: &NodeId,
        ctx: &mut dyn ConstructionContext,
    ) -> Result<Subtree, HelperError> {
        let mut subtree = Subtree::new(id.clone(), self.ty.tag.clone());
        for spec in self.ty.properties.iter().filter(|spec| spec.constructor) {
            match ctx.take_property(&spec.name, spec.kind)? {
                Some(value) if !value.is_null() => {
                    subtree.properties.insert(spec.name.clone(), value);
                }
                _ if spec.required => {
                    return Err(HelperError::MissingConstructorProperty {
                        type_tag: self.ty.tag.clone(),
                        property: spec.name.clone(),
                    });
                }
                _ => {}
            }
        }
        for child_type in &self.ty.mandatory_children {
            let child = ctx.take_child(child_type)?.ok_or_else(|| {
                HelperError::MissingMandatoryChild {
                    type_tag: self.ty.tag.clone(),
                    child_type: child_type.clone(),
                }
            })?;
            subtree.children.push(child);
        }
        Ok(subtree)
    }

    fn apply_property(
        &self,
        graph: &mut Graph,
        id: &NodeId,
        name: &str,
        value: Value,
    ) -> Result<Value, HelperError> {
        let spec = self.declared(name)?;
        Self::check_kind(spec, &value)?;
        Ok(graph.set_property(id, spec.name.clone(), value)?)
    }

    fn read_property(&self, node: &Node, name: &str) -> Result<Value, HelperError> {
        let spec = self.declared(name)?;
        Ok(node.property(&spec.name).cloned().unwrap_or_default())
    }

    fn emit_properties(
        &self,
        subtree: &Subtree,
        converter: &TypeConverter,
    ) -> Result<Vec<OperationRecord>, HelperError> {
        let mut records = Vec::with_capacity(subtree.properties.len());
        for spec in &self.ty.properties {
            let Some(value) = subtree.properties.get(&spec.name) else {
                continue;
            };
            let (_, primitive) = converter.to_wire(value).map_err(|source| {
                HelperError::Conversion { property: spec.name.clone(), source }
            })?;
            records.push(OperationRecord::set_property(
                subtree.id.clone(),
                spec.name.clone(),
                primitive,
            ));
        }
        for name in subtree.properties.keys().filter(|name| self.ty.spec(name).is_none()) {
            debug!(node_id = %subtree.id, property = %name, "skipping undeclared property");
        }
        Ok(records)
    }

    fn build(
        &self,
        id: NodeId,
        properties: Vec<(PropertyName, Value)>,
        registry: &HelperRegistry,
    ) -> Result<Subtree, HelperError> {
        let mut subtree = Subtree::new(id, self.ty.tag.clone());
        for (name, value) in properties {
            let spec = self.declared(&name)?;
            Self::check_kind(spec, &value)?;
            if !value.is_null() {
                subtree.properties.insert(spec.name.clone(), value);
            }
        }
        if let Some(missing) = self
            .ty
            .properties
            .iter()
            .find(|spec| spec.required && !subtree.properties.contains_key(&spec.name))
        {
            return Err(HelperError::MissingConstructorProperty {
                type_tag: self.ty.tag.clone(),
                property: missing.name.clone(),
            });
        }
        for child_type in &self.ty.mandatory_children {
            let child_id = Self::child_id(&subtree.id, child_type)?;
            subtree.children.push(registry.build(child_type, child_id, Vec::new())?);
        }
        Ok(subtree)
    }
}
