// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Text encodings for composite values: one `encode`/`decode` pair per kind.

use super::ConversionError;
use crate::model::{Value, ValueKind};

fn join_ints(values: &[i64]) -> String {
    let mut buf = itoa::Buffer::new();
    let mut out = String::with_capacity(values.len() * 4);
    for (idx, value) in values.iter().enumerate() {
        if idx > 0 {
            out.push(',');
        }
        out.push_str(buf.format(*value));
    }
    out
}

fn split_ints<const N: usize>(kind: ValueKind, text: &str) -> Result<[i64; N], ConversionError> {
    let invalid = |reason| ConversionError::InvalidText { kind, text: text.to_owned(), reason };

    let mut out = [0i64; N];
    let mut parts = text.split(',');
    for slot in &mut out {
        let part = parts.next().ok_or_else(|| invalid("too few components"))?;
        *slot = part.trim().parse().map_err(|_| invalid("component is not an integer"))?;
    }
    if parts.next().is_some() {
        return Err(invalid("too many components"));
    }
    Ok(out)
}

fn narrow<T: TryFrom<i64>>(kind: ValueKind, text: &str, value: i64) -> Result<T, ConversionError> {
    T::try_from(value).map_err(|_| ConversionError::InvalidText {
        kind,
        text: text.to_owned(),
        reason: "component out of range",
    })
}

pub(super) mod color {
    use super::{join_ints, narrow, split_ints, ConversionError};
    use crate::model::{Color, ValueKind};

    pub(crate) fn encode(color: &Color) -> String {
        join_ints(&[color.r.into(), color.g.into(), color.b.into(), color.a.into()])
    }

    pub(crate) fn decode(text: &str) -> Result<Color, ConversionError> {
        let kind = ValueKind::Color;
        let [r, g, b, a] = split_ints::<4>(kind, text)?;
        Ok(Color {
            r: narrow(kind, text, r)?,
            g: narrow(kind, text, g)?,
            b: narrow(kind, text, b)?,
            a: narrow(kind, text, a)?,
        })
    }
}

pub(super) mod point {
    use super::{join_ints, narrow, split_ints, ConversionError};
    use crate::model::{Point, ValueKind};

    pub(crate) fn encode(point: &Point) -> String {
        join_ints(&[point.x.into(), point.y.into()])
    }

    pub(crate) fn decode(text: &str) -> Result<Point, ConversionError> {
        let kind = ValueKind::Point;
        let [x, y] = split_ints::<2>(kind, text)?;
        Ok(Point { x: narrow(kind, text, x)?, y: narrow(kind, text, y)? })
    }
}

pub(super) mod size {
    use super::{join_ints, narrow, split_ints, ConversionError};
    use crate::model::{Size, ValueKind};

    pub(crate) fn encode(size: &Size) -> String {
        join_ints(&[size.width.into(), size.height.into()])
    }

    pub(crate) fn decode(text: &str) -> Result<Size, ConversionError> {
        let kind = ValueKind::Size;
        let [width, height] = split_ints::<2>(kind, text)?;
        Ok(Size { width: narrow(kind, text, width)?, height: narrow(kind, text, height)? })
    }
}

pub(super) mod rect {
    use super::{join_ints, narrow, split_ints, ConversionError};
    use crate::model::{Rect, ValueKind};

    pub(crate) fn encode(rect: &Rect) -> String {
        join_ints(&[rect.x.into(), rect.y.into(), rect.width.into(), rect.height.into()])
    }

    pub(crate) fn decode(text: &str) -> Result<Rect, ConversionError> {
        let kind = ValueKind::Rect;
        let [x, y, width, height] = split_ints::<4>(kind, text)?;
        Ok(Rect {
            x: narrow(kind, text, x)?,
            y: narrow(kind, text, y)?,
            width: narrow(kind, text, width)?,
            height: narrow(kind, text, height)?,
        })
    }
}

/// `[a,b,c]` with `\` escaping `\`, `,`, `[` and `]` inside string elements.
///
/// Element kinds are not written out: decoding reads every element as an integer when all of
/// them parse as one, and as strings otherwise. Lists that would not read back identically are
/// refused at encode time.
pub(super) mod list {
    use super::ConversionError;
    use crate::model::{Value, ValueKind};

    pub(crate) fn encode(items: &[Value]) -> Result<String, ConversionError> {
        let mut out = String::from("[");
        if items.iter().all(|item| matches!(item, Value::Integer(_))) {
            let mut buf = itoa::Buffer::new();
            for (idx, item) in items.iter().enumerate() {
                if let Value::Integer(value) = item {
                    if idx > 0 {
                        out.push(',');
                    }
                    out.push_str(buf.format(*value));
                }
            }
            out.push(']');
            return Ok(out);
        }

        let mut strings = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::String(text) => strings.push(text.as_str()),
                Value::Integer(_) => {
                    return Err(ConversionError::AmbiguousList { reason: "mixed element types" })
                }
                other => {
                    return Err(ConversionError::UnsupportedListElement {
                        found: other.to_string(),
                    })
                }
            }
        }
        if strings.iter().all(|text| text.parse::<i32>().is_ok()) {
            return Err(ConversionError::AmbiguousList {
                reason: "every string element reads back as an integer",
            });
        }
        if strings == [""] {
            return Err(ConversionError::AmbiguousList {
                reason: "a single empty string reads back as an empty list",
            });
        }

        for (idx, text) in strings.iter().enumerate() {
            if idx > 0 {
                out.push(',');
            }
            for ch in text.chars() {
                if matches!(ch, '\\' | ',' | '[' | ']') {
                    out.push('\\');
                }
                out.push(ch);
            }
        }
        out.push(']');
        Ok(out)
    }

    pub(crate) fn decode(text: &str) -> Result<Vec<Value>, ConversionError> {
        let invalid = |reason| ConversionError::InvalidText {
            kind: ValueKind::List,
            text: text.to_owned(),
            reason,
        };

        let inner = text
            .strip_prefix('[')
            .and_then(|rest| rest.strip_suffix(']'))
            .ok_or_else(|| invalid("missing brackets"))?;
        if inner.is_empty() {
            return Ok(Vec::new());
        }

        let elements = split_escaped(inner).ok_or_else(|| invalid("dangling escape"))?;
        let integers = elements
            .iter()
            .map(|element| element.parse::<i32>())
            .collect::<Result<Vec<_>, _>>();
        Ok(match integers {
            Ok(integers) => integers.into_iter().map(Value::Integer).collect(),
            Err(_) => elements.into_iter().map(Value::String).collect(),
        })
    }

    fn split_escaped(inner: &str) -> Option<Vec<String>> {
        let bytes = inner.as_bytes();
        let mut elements = Vec::new();
        let mut current = String::new();
        let mut pos = 0;
        while let Some(offset) = memchr::memchr2(b'\\', b',', &bytes[pos..]) {
            let at = pos + offset;
            current.push_str(&inner[pos..at]);
            if bytes[at] == b',' {
                elements.push(std::mem::take(&mut current));
                pos = at + 1;
            } else {
                let escaped = inner[at + 1..].chars().next()?;
                current.push(escaped);
                pos = at + 1 + escaped.len_utf8();
            }
        }
        current.push_str(&inner[pos..]);
        elements.push(current);
        Some(elements)
    }
}
