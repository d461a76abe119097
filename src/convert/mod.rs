// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Bidirectional mapping between domain [`Value`]s and wire-safe primitives.
//!
//! Scalars pass through; everything else travels as text (see [`composite`] for the per-kind
//! encodings). Cross-references travel as the referenced node id and are checked against a
//! [`NodeLookup`] when decoded.

mod composite;

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use chrono::{DateTime, SecondsFormat, Utc};
use regex::Regex;
use thiserror::Error;

use crate::model::{NodeId, NodeLookup, Value, ValueKind};

/// Primitive categories carried on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    String,
    Integer,
    Long,
    Short,
    Float,
    Double,
    Boolean,
    Binary,
    Reference,
    Null,
}

impl WireKind {
    pub const ALL: [WireKind; 10] = [
        Self::String,
        Self::Integer,
        Self::Long,
        Self::Short,
        Self::Float,
        Self::Double,
        Self::Boolean,
        Self::Binary,
        Self::Reference,
        Self::Null,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Long => "LONG",
            Self::Short => "SHORT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Boolean => "BOOLEAN",
            Self::Binary => "BINARY",
            Self::Reference => "REFERENCE",
            Self::Null => "NULL",
        }
    }
}

impl fmt::Display for WireKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown wire kind {0:?}")]
pub struct UnknownWireKind(pub String);

impl FromStr for WireKind {
    type Err = UnknownWireKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| UnknownWireKind(s.to_owned()))
    }
}

/// A wire-safe value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WirePrimitive {
    #[default]
    Null,
    String(String),
    Integer(i32),
    Long(i64),
    Short(i16),
    Float(f32),
    Double(f64),
    Boolean(bool),
    Binary(Vec<u8>),
    Reference(String),
}

impl WirePrimitive {
    pub fn kind(&self) -> WireKind {
        match self {
            Self::Null => WireKind::Null,
            Self::String(_) => WireKind::String,
            Self::Integer(_) => WireKind::Integer,
            Self::Long(_) => WireKind::Long,
            Self::Short(_) => WireKind::Short,
            Self::Float(_) => WireKind::Float,
            Self::Double(_) => WireKind::Double,
            Self::Boolean(_) => WireKind::Boolean,
            Self::Binary(_) => WireKind::Binary,
            Self::Reference(_) => WireKind::Reference,
        }
    }
}

impl fmt::Display for WirePrimitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::String(text) => write!(f, "{text:?}"),
            Self::Integer(v) => write!(f, "{v}"),
            Self::Long(v) => write!(f, "{v}L"),
            Self::Short(v) => write!(f, "{v}S"),
            Self::Float(v) => write!(f, "{v}f"),
            Self::Double(v) => write!(f, "{v}"),
            Self::Boolean(v) => write!(f, "{v}"),
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::Reference(id) => write!(f, "&{id}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    #[error("cannot read {found} as {expected:?}")]
    KindMismatch { expected: ValueKind, found: WireKind },
    #[error("invalid {kind:?} text {text:?}: {reason}")]
    InvalidText { kind: ValueKind, text: String, reason: &'static str },
    #[error("unknown symbol {symbol:?} for enum {enum_name}")]
    UnknownSymbol { enum_name: &'static str, symbol: String },
    #[error("reference to unknown node (id={node_id})")]
    UnresolvedReference { node_id: NodeId },
    #[error("list does not survive a round trip: {reason}")]
    AmbiguousList { reason: &'static str },
    #[error("lists may only hold integers or strings (found {found})")]
    UnsupportedListElement { found: String },
}

/// Converts property values to and from their wire representation.
///
/// Stateless: reference resolution goes through the [`NodeLookup`] passed to
/// [`TypeConverter::from_wire`].
#[derive(Debug, Default, Clone, Copy)]
pub struct TypeConverter;

impl TypeConverter {
    pub fn new() -> Self {
        Self
    }

    pub fn to_wire(&self, value: &Value) -> Result<(WireKind, WirePrimitive), ConversionError> {
        let primitive = match value {
            Value::Null => WirePrimitive::Null,
            Value::String(text) => WirePrimitive::String(text.clone()),
            Value::Integer(v) => WirePrimitive::Integer(*v),
            Value::Long(v) => WirePrimitive::Long(*v),
            Value::Short(v) => WirePrimitive::Short(*v),
            Value::Float(v) => WirePrimitive::Float(*v),
            Value::Double(v) => WirePrimitive::Double(*v),
            Value::Boolean(v) => WirePrimitive::Boolean(*v),
            Value::Binary(bytes) => WirePrimitive::Binary(bytes.clone()),
            Value::BigDecimal(text)
            | Value::BigInteger(text)
            | Value::ClassRef(text)
            | Value::Locale(text) => WirePrimitive::String(text.clone()),
            Value::DateTime(at) => {
                WirePrimitive::String(at.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            }
            Value::Color(color) => WirePrimitive::String(composite::color::encode(color)),
            Value::Point(point) => WirePrimitive::String(composite::point::encode(point)),
            Value::Rect(rect) => WirePrimitive::String(composite::rect::encode(rect)),
            Value::Size(size) => WirePrimitive::String(composite::size::encode(size)),
            Value::Enum(value) => WirePrimitive::String(value.symbol().to_owned()),
            Value::Reference(id) => WirePrimitive::Reference(id.as_str().to_owned()),
            Value::List(items) => WirePrimitive::String(composite::list::encode(items)?),
        };
        Ok((primitive.kind(), primitive))
    }

    /// Decodes `primitive` into a value of the declared `target` kind.
    ///
    /// `Null` decodes to [`Value::Null`] for every kind. References must name a node known to
    /// `lookup`.
    pub fn from_wire(
        &self,
        primitive: &WirePrimitive,
        target: ValueKind,
        lookup: &dyn NodeLookup,
    ) -> Result<Value, ConversionError> {
        use WirePrimitive as P;

        let value = match (target, primitive) {
            (_, P::Null) => Value::Null,
            (ValueKind::String, P::String(text)) => Value::String(text.clone()),
            (ValueKind::Integer, P::Integer(v)) => Value::Integer(*v),
            (ValueKind::Integer, P::Short(v)) => Value::Integer(i32::from(*v)),
            (ValueKind::Long, P::Long(v)) => Value::Long(*v),
            (ValueKind::Long, P::Integer(v)) => Value::Long(i64::from(*v)),
            (ValueKind::Long, P::Short(v)) => Value::Long(i64::from(*v)),
            (ValueKind::Short, P::Short(v)) => Value::Short(*v),
            (ValueKind::Float, P::Float(v)) => Value::Float(*v),
            (ValueKind::Double, P::Double(v)) => Value::Double(*v),
            (ValueKind::Double, P::Float(v)) => Value::Double(f64::from(*v)),
            (ValueKind::Boolean, P::Boolean(v)) => Value::Boolean(*v),
            (ValueKind::Binary, P::Binary(bytes)) => Value::Binary(bytes.clone()),
            (ValueKind::BigDecimal, P::String(text)) => {
                validate(target, text, big_decimal_re(), "not a decimal number")?;
                Value::BigDecimal(text.clone())
            }
            (ValueKind::BigInteger, P::String(text)) => {
                validate(target, text, big_integer_re(), "not an integer")?;
                Value::BigInteger(text.clone())
            }
            (ValueKind::BigInteger, P::Long(v)) => Value::BigInteger(v.to_string()),
            (ValueKind::DateTime, P::String(text)) => {
                let parsed = DateTime::parse_from_rfc3339(text).map_err(|_| {
                    ConversionError::InvalidText {
                        kind: target,
                        text: text.clone(),
                        reason: "not an RFC 3339 timestamp",
                    }
                })?;
                Value::DateTime(parsed.with_timezone(&Utc))
            }
            (ValueKind::Color, P::String(text)) => Value::Color(composite::color::decode(text)?),
            (ValueKind::Point, P::String(text)) => Value::Point(composite::point::decode(text)?),
            (ValueKind::Rect, P::String(text)) => Value::Rect(composite::rect::decode(text)?),
            (ValueKind::Size, P::String(text)) => Value::Size(composite::size::decode(text)?),
            (ValueKind::Enum(ty), P::String(symbol)) => {
                Value::Enum(ty.symbol(symbol).ok_or_else(|| ConversionError::UnknownSymbol {
                    enum_name: ty.name,
                    symbol: symbol.clone(),
                })?)
            }
            (ValueKind::ClassRef, P::String(text)) => {
                validate(target, text, class_ref_re(), "not a qualified type name")?;
                Value::ClassRef(text.clone())
            }
            (ValueKind::Locale, P::String(text)) => {
                validate(target, text, locale_re(), "not a locale tag")?;
                Value::Locale(text.clone())
            }
            (ValueKind::Reference, P::Reference(text) | P::String(text)) => {
                let node_id = NodeId::new(text.clone()).map_err(|_| {
                    ConversionError::InvalidText {
                        kind: target,
                        text: text.clone(),
                        reason: "not a node id",
                    }
                })?;
                if !lookup.contains_node(&node_id) {
                    return Err(ConversionError::UnresolvedReference { node_id });
                }
                Value::Reference(node_id)
            }
            (ValueKind::List, P::String(text)) => Value::List(composite::list::decode(text)?),
            (expected, other) => {
                return Err(ConversionError::KindMismatch { expected, found: other.kind() })
            }
        };
        Ok(value)
    }
}

fn validate(
    kind: ValueKind,
    text: &str,
    re: &Regex,
    reason: &'static str,
) -> Result<(), ConversionError> {
    if re.is_match(text) {
        return Ok(());
    }
    Err(ConversionError::InvalidText { kind, text: text.to_owned(), reason })
}

fn static_regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex"))
}

fn big_decimal_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^[+-]?(\d+(\.\d*)?|\.\d+)([eE][+-]?\d+)?$")
}

fn big_integer_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^[+-]?\d+$")
}

fn class_ref_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^[A-Za-z_][A-Za-z0-9_]*((\.|::)[A-Za-z_][A-Za-z0-9_$]*)*$")
}

fn locale_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    static_regex(&RE, r"^[A-Za-z]{2,8}([-_][A-Za-z0-9]{1,8})*$")
}

#[cfg(test)]
mod tests;
