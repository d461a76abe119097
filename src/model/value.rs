// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Domain property values held by graph nodes.

use std::fmt;

use chrono::{DateTime, Utc};

use super::ids::NodeId;

/// A closed enumeration declared by the schema.
///
/// Enum values travel as their symbol; decoding needs the declaring type to validate it.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub name: &'static str,
    pub symbols: &'static [&'static str],
}

impl EnumType {
    pub fn symbol(&'static self, symbol: &str) -> Option<EnumValue> {
        self.symbols
            .iter()
            .find(|candidate| **candidate == symbol)
            .map(|symbol| EnumValue { ty: self, symbol })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumValue {
    ty: &'static EnumType,
    symbol: &'static str,
}

impl EnumValue {
    pub fn enum_type(&self) -> &'static EnumType {
        self.ty
    }

    pub fn symbol(&self) -> &'static str {
        self.symbol
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Declared kind of a property, as listed in a node type's property table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    String,
    Integer,
    Long,
    Short,
    Float,
    Double,
    Boolean,
    Binary,
    BigDecimal,
    BigInteger,
    DateTime,
    Color,
    Point,
    Rect,
    Size,
    Enum(&'static EnumType),
    ClassRef,
    Locale,
    Reference,
    List,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
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
    /// Arbitrary-precision decimal in its canonical textual form.
    BigDecimal(String),
    BigInteger(String),
    DateTime(DateTime<Utc>),
    Color(Color),
    Point(Point),
    Rect(Rect),
    Size(Size),
    Enum(EnumValue),
    /// Fully-qualified type name.
    ClassRef(String),
    /// BCP-47-ish locale tag (`en`, `en-US`, `de_CH`).
    Locale(String),
    Reference(NodeId),
    /// Homogeneous list of `Integer` or `String` elements.
    List(Vec<Value>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Whether this value may be stored in a property declared as `kind`.
    ///
    /// `Null` is accepted for every kind.
    pub fn matches_kind(&self, kind: ValueKind) -> bool {
        match (self, kind) {
            (Self::Null, _) => true,
            (Self::String(_), ValueKind::String)
            | (Self::Integer(_), ValueKind::Integer)
            | (Self::Long(_), ValueKind::Long)
            | (Self::Short(_), ValueKind::Short)
            | (Self::Float(_), ValueKind::Float)
            | (Self::Double(_), ValueKind::Double)
            | (Self::Boolean(_), ValueKind::Boolean)
            | (Self::Binary(_), ValueKind::Binary)
            | (Self::BigDecimal(_), ValueKind::BigDecimal)
            | (Self::BigInteger(_), ValueKind::BigInteger)
            | (Self::DateTime(_), ValueKind::DateTime)
            | (Self::Color(_), ValueKind::Color)
            | (Self::Point(_), ValueKind::Point)
            | (Self::Rect(_), ValueKind::Rect)
            | (Self::Size(_), ValueKind::Size)
            | (Self::ClassRef(_), ValueKind::ClassRef)
            | (Self::Locale(_), ValueKind::Locale)
            | (Self::Reference(_), ValueKind::Reference)
            | (Self::List(_), ValueKind::List) => true,
            (Self::Enum(value), ValueKind::Enum(ty)) => value.enum_type() == ty,
            _ => false,
        }
    }

    pub fn as_reference(&self) -> Option<&NodeId> {
        match self {
            Self::Reference(id) => Some(id),
            _ => None,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<NodeId> for Value {
    fn from(value: NodeId) -> Self {
        Self::Reference(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::String(value) => write!(f, "{value:?}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Long(value) => write!(f, "{value}L"),
            Self::Short(value) => write!(f, "{value}S"),
            Self::Float(value) => write!(f, "{value}f"),
            Self::Double(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::Binary(bytes) => write!(f, "<{} bytes>", bytes.len()),
            Self::BigDecimal(value) | Self::BigInteger(value) => f.write_str(value),
            Self::DateTime(value) => write!(f, "{}", value.to_rfc3339()),
            Self::Color(c) => write!(f, "rgba({},{},{},{})", c.r, c.g, c.b, c.a),
            Self::Point(p) => write!(f, "({},{})", p.x, p.y),
            Self::Rect(r) => write!(f, "[{},{} {}x{}]", r.x, r.y, r.width, r.height),
            Self::Size(s) => write!(f, "{}x{}", s.width, s.height),
            Self::Enum(value) => write!(f, "{}::{}", value.enum_type().name, value.symbol()),
            Self::ClassRef(value) | Self::Locale(value) => f.write_str(value),
            Self::Reference(id) => write!(f, "&{id}"),
            Self::List(items) => {
                f.write_str("[")?;
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
        }
    }
}
