// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Nereid-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Treesync and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

use chrono::{TimeZone, Timelike, Utc};
use rstest::rstest;

use super::{ConversionError, TypeConverter, WireKind, WirePrimitive};
use crate::model::fixtures::{nid, small_tree};
use crate::model::{Color, EnumType, Graph, Point, Rect, Size, Value, ValueKind};

static ALIGNMENT: EnumType = EnumType { name: "Alignment", symbols: &["LEFT", "CENTER", "RIGHT"] };

fn round_trip(value: Value, kind: ValueKind, graph: &Graph) -> (WireKind, Value) {
    let converter = TypeConverter::new();
    let (wire_kind, primitive) = converter.to_wire(&value).expect("to_wire");
    let decoded = converter.from_wire(&primitive, kind, graph).expect("from_wire");
    (wire_kind, decoded)
}

#[rstest]
#[case(Value::from("Age"), ValueKind::String, WireKind::String)]
#[case(Value::Integer(42), ValueKind::Integer, WireKind::Integer)]
#[case(Value::Long(1 << 40), ValueKind::Long, WireKind::Long)]
#[case(Value::Short(-7), ValueKind::Short, WireKind::Short)]
#[case(Value::Float(1.5), ValueKind::Float, WireKind::Float)]
#[case(Value::Double(2.25), ValueKind::Double, WireKind::Double)]
#[case(Value::Boolean(true), ValueKind::Boolean, WireKind::Boolean)]
#[case(Value::Binary(vec![0, 159, 255]), ValueKind::Binary, WireKind::Binary)]
#[case(Value::BigDecimal("-12.500e3".into()), ValueKind::BigDecimal, WireKind::String)]
#[case(Value::BigInteger("1234567890123456789012".into()), ValueKind::BigInteger, WireKind::String)]
#[case(Value::Color(Color { r: 10, g: 20, b: 30, a: 40 }), ValueKind::Color, WireKind::String)]
#[case(Value::Point(Point { x: 3, y: -2 }), ValueKind::Point, WireKind::String)]
#[case(Value::Rect(Rect { x: 0, y: 0, width: 10, height: 5 }), ValueKind::Rect, WireKind::String)]
#[case(Value::Size(Size { width: 8, height: 9 }), ValueKind::Size, WireKind::String)]
#[case(Value::ClassRef("reports::BarRenderer".into()), ValueKind::ClassRef, WireKind::String)]
#[case(Value::Locale("de_CH".into()), ValueKind::Locale, WireKind::String)]
#[case(Value::List(vec![Value::from("a"), Value::from("b")]), ValueKind::List, WireKind::String)]
#[case(Value::Null, ValueKind::Color, WireKind::Null)]
fn values_survive_the_wire(#[case] value: Value, #[case] kind: ValueKind, #[case] wire: WireKind) {
    let graph = small_tree();
    let (wire_kind, decoded) = round_trip(value.clone(), kind, &graph);
    assert_eq!(wire_kind, wire);
    assert_eq!(decoded, value);
}

#[rstest]
#[case(0, "2024-02-29T13:05:09Z")]
#[case(250_000_000, "2024-02-29T13:05:09.250Z")]
#[case(123_456_000, "2024-02-29T13:05:09.123456Z")]
#[case(123_456_789, "2024-02-29T13:05:09.123456789Z")]
fn date_times_keep_their_sub_second_precision(#[case] nanos: u32, #[case] text: &str) {
    let graph = small_tree();
    let at = Utc
        .with_ymd_and_hms(2024, 2, 29, 13, 5, 9)
        .single()
        .and_then(|at| at.with_nanosecond(nanos))
        .expect("timestamp");
    let (_, primitive) = TypeConverter::new().to_wire(&Value::DateTime(at)).expect("to_wire");
    assert_eq!(primitive, WirePrimitive::String(text.to_owned()));

    let (_, decoded) = round_trip(Value::DateTime(at), ValueKind::DateTime, &graph);
    assert_eq!(decoded, Value::DateTime(at));
}

#[test]
fn enums_need_their_declaring_type() {
    let graph = small_tree();
    let center = ALIGNMENT.symbol("CENTER").expect("symbol");
    let (_, decoded) = round_trip(Value::Enum(center), ValueKind::Enum(&ALIGNMENT), &graph);
    assert_eq!(decoded, Value::Enum(center));

    let err = TypeConverter::new()
        .from_wire(&WirePrimitive::String("JUSTIFY".into()), ValueKind::Enum(&ALIGNMENT), &graph)
        .unwrap_err();
    assert_eq!(
        err,
        ConversionError::UnknownSymbol { enum_name: "Alignment", symbol: "JUSTIFY".into() }
    );
}

#[test]
fn references_resolve_against_the_graph() {
    let graph = small_tree();
    let converter = TypeConverter::new();

    let (kind, primitive) = converter.to_wire(&Value::Reference(nid("c1"))).expect("to_wire");
    assert_eq!(kind, WireKind::Reference);
    assert_eq!(primitive, WirePrimitive::Reference("c1".into()));
    assert_eq!(
        converter.from_wire(&primitive, ValueKind::Reference, &graph).expect("resolve"),
        Value::Reference(nid("c1"))
    );

    let err = converter
        .from_wire(&WirePrimitive::Reference("later".into()), ValueKind::Reference, &graph)
        .unwrap_err();
    assert_eq!(err, ConversionError::UnresolvedReference { node_id: nid("later") });
}

#[test]
fn narrower_numbers_widen_on_decode() {
    let graph = small_tree();
    let converter = TypeConverter::new();
    assert_eq!(
        converter.from_wire(&WirePrimitive::Short(5), ValueKind::Long, &graph).expect("widen"),
        Value::Long(5)
    );
    assert_eq!(
        converter.from_wire(&WirePrimitive::Float(0.5), ValueKind::Double, &graph).expect("widen"),
        Value::Double(0.5)
    );
    let err = converter
        .from_wire(&WirePrimitive::Long(5), ValueKind::Integer, &graph)
        .unwrap_err();
    assert_eq!(
        err,
        ConversionError::KindMismatch { expected: ValueKind::Integer, found: WireKind::Long }
    );
}

#[rstest]
#[case(ValueKind::BigDecimal, "1.2.3")]
#[case(ValueKind::BigInteger, "12a")]
#[case(ValueKind::ClassRef, "not a class")]
#[case(ValueKind::Locale, "e")]
#[case(ValueKind::DateTime, "yesterday")]
fn malformed_text_is_rejected(#[case] kind: ValueKind, #[case] text: &str) {
    let graph = small_tree();
    let err = TypeConverter::new()
        .from_wire(&WirePrimitive::String(text.to_owned()), kind, &graph)
        .unwrap_err();
    assert!(matches!(err, ConversionError::InvalidText { .. }), "{err:?}");
}

#[test]
fn wire_kind_names_parse_back() {
    for kind in WireKind::ALL {
        assert_eq!(kind.as_str().parse::<WireKind>().expect("parse"), kind);
    }
    assert!("COLOR".parse::<WireKind>().is_err());
}
