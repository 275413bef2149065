use pretty_assertions::assert_eq;

use crate::{
    bson,
    doc,
    oid::ObjectId,
    spec::BinarySubtype,
    tests::LOCK,
    Binary,
    Bson,
    Timestamp,
};

#[test]
fn standalone_bson() {
    let _guard = LOCK.run_concurrently();
    assert_eq!(bson!(null), Bson::Null);
    assert_eq!(bson!(5), Bson::Int32(5));
    assert_eq!(bson!(5i64), Bson::Int64(5));
    assert_eq!(bson!("hello"), Bson::String("hello".to_owned()));
    assert_eq!(bson!([]), Bson::Array(vec![]));
    assert_eq!(bson!({}), Bson::Document(crate::Document::new()));
}

#[test]
fn nested_literals() {
    let _guard = LOCK.run_concurrently();
    let value = bson!({
        "code": 200,
        "success": true,
        "payload": {
            "some": [
                "pay",
                "loads",
            ]
        }
    });

    let doc = match value {
        Bson::Document(doc) => doc,
        other => panic!("expected document, got {:?}", other),
    };

    assert_eq!(doc.get_i32("code").unwrap(), 200);
    assert!(doc.get_bool("success").unwrap());
    assert_eq!(
        doc.get_document("payload").unwrap().get_array("some").unwrap(),
        &vec![bson!("pay"), bson!("loads")]
    );
}

#[test]
fn arbitrary_expressions_as_values() {
    let _guard = LOCK.run_concurrently();
    let oid = ObjectId::new();
    let doc = doc! {
        "sum": 1 + 2,
        "oid": oid,
        "binary": Binary { subtype: BinarySubtype::Generic, bytes: vec![1, 2] },
        "timestamp": Timestamp { time: 1, increment: 2 },
    };

    assert_eq!(doc.get_i32("sum").unwrap(), 3);
    assert_eq!(doc.get_object_id("oid").unwrap(), oid);
    assert_eq!(doc.get_binary_generic("binary").unwrap(), &vec![1, 2]);
    assert_eq!(
        doc.get_timestamp("timestamp").unwrap(),
        Timestamp { time: 1, increment: 2 }
    );
}

#[test]
fn non_literal_keys() {
    let _guard = LOCK.run_concurrently();
    let key = "dynamic".to_owned();
    let doc = doc! { (key.clone()): 1i32, "static": 2i32 };

    assert_eq!(doc.get_i32(&key).unwrap(), 1);
    assert_eq!(doc.get_i32("static").unwrap(), 2);
}

#[test]
fn trailing_commas() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "a": 1i32, "b": [1, 2,], };
    assert_eq!(doc.get_i32("a").unwrap(), 1);
    assert_eq!(
        doc.get_array("b").unwrap(),
        &vec![Bson::Int32(1), Bson::Int32(2)]
    );
}

#[test]
fn nested_arrays() {
    let _guard = LOCK.run_concurrently();
    let value = bson!([[1, 2], [], [null], [{ "a": true }]]);
    let arr = match value {
        Bson::Array(arr) => arr,
        other => panic!("expected array, got {:?}", other),
    };

    assert_eq!(arr.len(), 4);
    assert_eq!(arr[0], bson!([1, 2]));
    assert_eq!(arr[1], Bson::Array(vec![]));
    assert_eq!(arr[2], Bson::Array(vec![Bson::Null]));
    assert_eq!(arr[3], bson!([{ "a": true }]));
}
