// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use thiserror::Error;

use crate::convert::{UnknownWireKind, WireKind, WirePrimitive};
use crate::model::{IdError, NodeId};
use crate::ops::{Method, OperationRecord};

/// One record as it travels on the wire.
///
/// `uuid` is always written, as `null` for transaction boundaries. `type` holds the node type
/// tag for `persistObject` and the wire kind for property records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WireRecord {
    pub method: Method,
    pub uuid: Option<String>,
    #[serde(rename = "parentUUID", default, skip_serializing_if = "Option::is_none")]
    pub parent_uuid: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub property_name: Option<String>,
    #[serde(default, skip_serializing_if = "Json::is_null")]
    pub new_value: Json,
    #[serde(default, skip_serializing_if = "Json::is_null")]
    pub old_value: Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{method} record lacks {field:?}")]
    MissingField { method: Method, field: &'static str },
    #[error("invalid node id in {field:?}: {source}")]
    InvalidId {
        field: &'static str,
        #[source]
        source: IdError,
    },
    #[error(transparent)]
    UnknownKind(#[from] UnknownWireKind),
    #[error("{field:?} is not a valid {kind} value: {reason}")]
    BadValue { field: &'static str, kind: WireKind, reason: &'static str },
}

impl WireRecord {
    fn boundary(method: Method) -> Self {
        Self {
            method,
            uuid: None,
            parent_uuid: None,
            type_name: None,
            index: None,
            property_name: None,
            new_value: Json::Null,
            old_value: Json::Null,
        }
    }

    fn for_node(method: Method, node_id: &NodeId) -> Self {
        Self { uuid: Some(node_id.as_str().to_owned()), ..Self::boundary(method) }
    }

    pub fn from_record(record: &OperationRecord) -> Self {
        match record {
            OperationRecord::Begin | OperationRecord::Commit | OperationRecord::Rollback => {
                Self::boundary(record.method())
            }
            OperationRecord::CreateNode { parent_id, type_tag, node_id, index } => Self {
                parent_uuid: Some(parent_id.as_str().to_owned()),
                type_name: Some(type_tag.to_string()),
                index: Some(*index),
                ..Self::for_node(Method::CreateNode, node_id)
            },
            OperationRecord::SetProperty { node_id, name, kind, value } => Self {
                type_name: Some(kind.as_str().to_owned()),
                property_name: Some(name.to_string()),
                new_value: primitive_to_json(value),
                ..Self::for_node(Method::SetProperty, node_id)
            },
            OperationRecord::SetPropertyConditional {
                node_id,
                name,
                kind,
                old_value,
                new_value,
            } => Self {
                type_name: Some(kind.as_str().to_owned()),
                property_name: Some(name.to_string()),
                new_value: primitive_to_json(new_value),
                old_value: primitive_to_json(old_value),
                ..Self::for_node(Method::SetPropertyConditional, node_id)
            },
            OperationRecord::RemoveNode { parent_id, node_id } => Self {
                parent_uuid: Some(parent_id.as_str().to_owned()),
                ..Self::for_node(Method::RemoveNode, node_id)
            },
        }
    }

    pub fn into_record(self) -> Result<OperationRecord, RecordError> {
        let method = self.method;
        let record = match method {
            Method::Begin => OperationRecord::Begin,
            Method::Commit => OperationRecord::Commit,
            Method::Rollback => OperationRecord::Rollback,
            Method::CreateNode => OperationRecord::CreateNode {
                parent_id: node_id(method, "parentUUID", self.parent_uuid)?,
                type_tag: required(method, "type", self.type_name)?.into(),
                node_id: node_id(method, "uuid", self.uuid)?,
                index: required(method, "index", self.index)?,
            },
            Method::SetProperty => {
                let kind: WireKind = required(method, "type", self.type_name)?.parse()?;
                OperationRecord::SetProperty {
                    node_id: node_id(method, "uuid", self.uuid)?,
                    name: required(method, "propertyName", self.property_name)?.into(),
                    kind,
                    value: primitive_from_json("newValue", kind, &self.new_value)?,
                }
            }
            Method::SetPropertyConditional => {
                let kind: WireKind = required(method, "type", self.type_name)?.parse()?;
                OperationRecord::SetPropertyConditional {
                    node_id: node_id(method, "uuid", self.uuid)?,
                    name: required(method, "propertyName", self.property_name)?.into(),
                    kind,
                    old_value: primitive_from_json("oldValue", kind, &self.old_value)?,
                    new_value: primitive_from_json("newValue", kind, &self.new_value)?,
                }
            }
            Method::RemoveNode => OperationRecord::RemoveNode {
                parent_id: node_id(method, "parentUUID", self.parent_uuid)?,
                node_id: node_id(method, "uuid", self.uuid)?,
            },
        };
        Ok(record)
    }
}

fn required<T>(method: Method, field: &'static str, value: Option<T>) -> Result<T, RecordError> {
    value.ok_or(RecordError::MissingField { method, field })
}

fn node_id(
    method: Method,
    field: &'static str,
    value: Option<String>,
) -> Result<NodeId, RecordError> {
    NodeId::new(required(method, field, value)?)
        .map_err(|source| RecordError::InvalidId { field, source })
}

const NAN: &str = "NaN";
const INFINITY: &str = "Infinity";
const NEG_INFINITY: &str = "-Infinity";

fn float_to_json(value: f64) -> Json {
    if value.is_nan() {
        Json::from(NAN)
    } else if value == f64::INFINITY {
        Json::from(INFINITY)
    } else if value == f64::NEG_INFINITY {
        Json::from(NEG_INFINITY)
    } else {
        Json::from(value)
    }
}

pub(crate) fn primitive_to_json(primitive: &WirePrimitive) -> Json {
    match primitive {
        WirePrimitive::Null => Json::Null,
        WirePrimitive::String(text) | WirePrimitive::Reference(text) => Json::from(text.as_str()),
        WirePrimitive::Integer(v) => Json::from(*v),
        WirePrimitive::Long(v) => Json::from(*v),
        WirePrimitive::Short(v) => Json::from(*v),
        WirePrimitive::Float(v) => float_to_json(f64::from(*v)),
        WirePrimitive::Double(v) => float_to_json(*v),
        WirePrimitive::Boolean(v) => Json::from(*v),
        WirePrimitive::Binary(bytes) => Json::from(STANDARD.encode(bytes)),
    }
}

pub(crate) fn primitive_from_json(
    field: &'static str,
    kind: WireKind,
    json: &Json,
) -> Result<WirePrimitive, RecordError> {
    let bad = |reason| RecordError::BadValue { field, kind, reason };
    if json.is_null() {
        return Ok(WirePrimitive::Null);
    }

    let primitive = match kind {
        WireKind::Null => return Err(bad("expected null")),
        WireKind::String => {
            WirePrimitive::String(text(json).ok_or_else(|| bad("expected a string"))?)
        }
        WireKind::Reference => {
            WirePrimitive::Reference(text(json).ok_or_else(|| bad("expected a node id"))?)
        }
        WireKind::Integer => {
            let value = json.as_i64().ok_or_else(|| bad("expected an integer"))?;
            WirePrimitive::Integer(i32::try_from(value).map_err(|_| bad("out of range"))?)
        }
        WireKind::Short => {
            let value = json.as_i64().ok_or_else(|| bad("expected an integer"))?;
            WirePrimitive::Short(i16::try_from(value).map_err(|_| bad("out of range"))?)
        }
        WireKind::Long => {
            WirePrimitive::Long(json.as_i64().ok_or_else(|| bad("expected an integer"))?)
        }
        WireKind::Float => {
            let value = float_from_json(json).ok_or_else(|| bad("expected a number"))?;
            WirePrimitive::Float(value as f32)
        }
        WireKind::Double => {
            WirePrimitive::Double(float_from_json(json).ok_or_else(|| bad("expected a number"))?)
        }
        WireKind::Boolean => {
            WirePrimitive::Boolean(json.as_bool().ok_or_else(|| bad("expected a boolean"))?)
        }
        WireKind::Binary => {
            let encoded = json.as_str().ok_or_else(|| bad("expected base64 text"))?;
            WirePrimitive::Binary(STANDARD.decode(encoded).map_err(|_| bad("invalid base64"))?)
        }
    };
    Ok(primitive)
}

fn text(json: &Json) -> Option<String> {
    json.as_str().map(str::to_owned)
}

fn float_from_json(json: &Json) -> Option<f64> {
    match json.as_str() {
        Some(NAN) => Some(f64::NAN),
        Some(INFINITY) => Some(f64::INFINITY),
        Some(NEG_INFINITY) => Some(f64::NEG_INFINITY),
        Some(_) => None,
        None => json.as_f64(),
    }
}
