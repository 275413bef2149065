use std::collections::BTreeMap;

use assert_matches::assert_matches;
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};

use crate::{
    doc,
    from_bson,
    from_document,
    oid::ObjectId,
    spec::BinarySubtype,
    tests::LOCK,
    to_bson,
    to_document,
    Binary,
    Bson,
    DateTime,
    ErrorKind,
    JavaScriptCodeWithScope,
    Regex,
    Timestamp,
};

#[test]
#[allow(clippy::float_cmp)]
fn floating_point() {
    let _guard = LOCK.run_concurrently();
    let obj = Bson::Double(240.5);
    let f: f64 = from_bson(obj.clone()).unwrap();
    assert_eq!(f, 240.5);

    let deser: Bson = to_bson(&f).unwrap();
    assert_eq!(obj, deser);
}

#[test]
fn string() {
    let _guard = LOCK.run_concurrently();
    let obj = Bson::String("avocado".to_owned());
    let s: String = from_bson(obj.clone()).unwrap();
    assert_eq!(s, "avocado");

    let deser: Bson = to_bson(&s).unwrap();
    assert_eq!(obj, deser);
}

#[test]
fn arr() {
    let _guard = LOCK.run_concurrently();
    let obj = Bson::Array(vec![
        Bson::Int32(0),
        Bson::Int32(1),
        Bson::Int32(2),
        Bson::Int32(3),
    ]);
    let arr: Vec<i32> = from_bson(obj.clone()).unwrap();
    assert_eq!(arr, vec![0i32, 1i32, 2i32, 3i32]);

    let deser: Bson = to_bson(&arr).unwrap();
    assert_eq!(deser, obj);
}

#[test]
fn boolean() {
    let _guard = LOCK.run_concurrently();
    let obj = Bson::Boolean(true);
    let b: bool = from_bson(obj.clone()).unwrap();
    assert!(b);

    let deser: Bson = to_bson(&b).unwrap();
    assert_eq!(deser, obj);
}

#[test]
fn int32() {
    let _guard = LOCK.run_concurrently();
    let obj = Bson::Int32(101);
    let i: i32 = from_bson(obj.clone()).unwrap();
    assert_eq!(i, 101);

    let deser: Bson = to_bson(&i).unwrap();
    assert_eq!(deser, obj);
}

#[test]
fn int64() {
    let _guard = LOCK.run_concurrently();
    let obj = Bson::Int64(101);
    let i: i64 = from_bson(obj.clone()).unwrap();
    assert_eq!(i, 101);

    let deser: Bson = to_bson(&i).unwrap();
    assert_eq!(deser, obj);
}

#[test]
fn unsigned_widening() {
    let _guard = LOCK.run_concurrently();
    assert_eq!(to_bson(&7u8).unwrap(), Bson::Int32(7));
    assert_eq!(to_bson(&7u16).unwrap(), Bson::Int32(7));
    assert_eq!(to_bson(&7u32).unwrap(), Bson::Int64(7));
    assert_eq!(to_bson(&7u64).unwrap(), Bson::Int64(7));

    let err = to_bson(&u64::MAX).unwrap_err();
    assert_matches!(err.kind, ErrorKind::InvalidArgument { .. });
}

#[test]
fn map_requires_string_keys() {
    let _guard = LOCK.run_concurrently();
    let mut map = BTreeMap::new();
    map.insert(1i32, "one");

    let err = to_bson(&map).unwrap_err();
    assert_matches!(err.kind, ErrorKind::InvalidArgument { .. });
}

#[test]
fn struct_round_trip() {
    let _guard = LOCK.run_concurrently();

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Inner {
        label: String,
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Outer {
        count: i32,
        big: i64,
        ratio: f64,
        on: bool,
        name: String,
        tags: Vec<String>,
        inner: Inner,
        maybe: Option<i32>,
        missing: Option<i32>,
    }

    let outer = Outer {
        count: 3,
        big: 5_000_000_000,
        ratio: 0.5,
        on: true,
        name: "thing".to_owned(),
        tags: vec!["a".to_owned(), "b".to_owned()],
        inner: Inner {
            label: "nested".to_owned(),
        },
        maybe: Some(7),
        missing: None,
    };

    let doc = to_document(&outer).unwrap();
    assert_eq!(
        doc,
        doc! {
            "count": 3i32,
            "big": 5_000_000_000i64,
            "ratio": 0.5,
            "on": true,
            "name": "thing",
            "tags": ["a", "b"],
            "inner": { "label": "nested" },
            "maybe": 7i32,
            "missing": Bson::Null,
        }
    );

    let back: Outer = from_document(doc).unwrap();
    assert_eq!(back, outer);
}

#[test]
fn type_mismatch_reports_key() {
    let _guard = LOCK.run_concurrently();

    #[derive(Debug, Deserialize)]
    #[allow(dead_code)]
    struct Shape {
        a: i32,
    }

    let err = from_document::<Shape>(doc! { "a": "not a number" }).unwrap_err();
    assert_matches!(err.kind, ErrorKind::TypeMismatch { .. });
    assert_eq!(err.key.as_deref(), Some("a"));
}

#[test]
fn bson_values_cross_the_bridge_unchanged() {
    let _guard = LOCK.run_concurrently();
    // pins the resolution of every variant an "any" target can receive
    let values = vec![
        Bson::Null,
        Bson::String("s".to_owned()),
        Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: vec![1, 2, 3],
        }),
        Bson::Binary(Binary {
            subtype: BinarySubtype::Md5,
            bytes: vec![0xAB; 16],
        }),
        Bson::ObjectId(ObjectId::from_bytes([7; 12])),
        Bson::Boolean(false),
        Bson::RegularExpression(Regex::new("^x", "m")),
        Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
            code: "function() {}".to_owned(),
            scope: doc! { "y": 1i32 },
        }),
        Bson::Int32(42),
        Bson::Int64(-42),
        Bson::Double(1.25),
        Bson::MinKey,
        Bson::MaxKey,
        Bson::Document(doc! { "plain": true }),
        Bson::Timestamp(Timestamp {
            time: 10,
            increment: 20,
        }),
        Bson::Undefined,
        Bson::JavaScriptCode("function() {}".to_owned()),
        Bson::Symbol("sym".to_owned()),
        Bson::DateTime(DateTime::from_millis(1_000)),
        Bson::Array(vec![Bson::Int32(1), Bson::Null]),
    ];

    for value in values {
        let serialized = to_bson(&value).unwrap();
        assert_eq!(serialized, value);

        let deserialized: Bson = from_bson(value.clone()).unwrap();
        assert_eq!(deserialized, value);
    }
}

#[test]
fn object_id_field() {
    let _guard = LOCK.run_concurrently();

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Record {
        id: ObjectId,
    }

    let record = Record {
        id: ObjectId::parse_str("53e37d08776f724e42000000").unwrap(),
    };

    let doc = to_document(&record).unwrap();
    assert_eq!(doc.get_object_id("id").unwrap(), record.id);

    let back: Record = from_document(doc).unwrap();
    assert_eq!(back, record);
}

#[test]
fn byte_fields_become_generic_binary() {
    let _guard = LOCK.run_concurrently();

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Blob {
        #[serde(with = "serde_bytes")]
        data: Vec<u8>,
    }

    let blob = Blob {
        data: vec![1, 2, 3, 4],
    };

    let doc = to_document(&blob).unwrap();
    assert_eq!(doc.get_binary_generic("data").unwrap(), &vec![1, 2, 3, 4]);

    let back: Blob = from_document(doc).unwrap();
    assert_eq!(back, blob);
}

#[test]
fn enum_round_trips() {
    let _guard = LOCK.run_concurrently();

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    enum Shape {
        Empty,
        Wrapped(i32),
        Pair(i32, i32),
        Named { x: i32 },
    }

    let cases = vec![
        (Shape::Empty, Bson::String("Empty".to_owned())),
        (
            Shape::Wrapped(5),
            Bson::Document(doc! { "Wrapped": 5i32 }),
        ),
        (
            Shape::Pair(1, 2),
            Bson::Document(doc! { "Pair": [1i32, 2i32] }),
        ),
        (
            Shape::Named { x: 3 },
            Bson::Document(doc! { "Named": { "x": 3i32 } }),
        ),
    ];

    for (shape, expected) in cases {
        let serialized = to_bson(&shape).unwrap();
        assert_eq!(serialized, expected);

        let back: Shape = from_bson(serialized).unwrap();
        assert_eq!(back, shape);
    }
}

#[test]
fn datetime_field() {
    let _guard = LOCK.run_concurrently();

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Event {
        at: DateTime,
    }

    let event = Event {
        at: DateTime::from_millis(1_577_836_800_000),
    };

    let doc = to_document(&event).unwrap();
    assert_eq!(doc.get_datetime("at").unwrap(), &event.at);

    let back: Event = from_document(doc).unwrap();
    assert_eq!(back, event);
}
