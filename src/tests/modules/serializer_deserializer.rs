use assert_matches::assert_matches;
use pretty_assertions::assert_eq;

use crate::{
    doc,
    oid::ObjectId,
    spec::BinarySubtype,
    tests::LOCK,
    Binary,
    Bson,
    DateTime,
    Document,
    ErrorKind,
    JavaScriptCodeWithScope,
    Regex,
    Timestamp,
};

#[test]
fn test_serialize_deserialize_empty_document() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! {};
    let dst = vec![5, 0, 0, 0, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_int32() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "a": 1i32 };
    let dst = vec![12, 0, 0, 0, 0x10, 0x61, 0, 1, 0, 0, 0, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_int64() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "n": 0x2_0000_0000i64 };
    let dst = vec![16, 0, 0, 0, 0x12, 0x6E, 0, 0, 0, 0, 0, 2, 0, 0, 0, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_floating_point() {
    let _guard = LOCK.run_concurrently();
    let src = 1020.123;
    let dst = vec![
        18, 0, 0, 0, 1, 107, 101, 121, 0, 68, 139, 108, 231, 251, 224, 143, 64, 0,
    ];

    let doc = doc! { "key": src };

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_utf8_string() {
    let _guard = LOCK.run_concurrently();
    let src = "test你好吗".to_owned();
    let dst = vec![
        28, 0, 0, 0, 2, 107, 101, 121, 0, 14, 0, 0, 0, 116, 101, 115, 116, 228, 189, 160, 229,
        165, 189, 229, 144, 151, 0, 0,
    ];

    let doc = doc! { "key": src };

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_short_string() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "s": "hi" };
    let dst = vec![
        15, 0, 0, 0, 2, 0x73, 0, 3, 0, 0, 0, 0x68, 0x69, 0, 0,
    ];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_array() {
    let _guard = LOCK.run_concurrently();
    let src = vec![Bson::Double(1.01), Bson::String("xyz".to_owned())];
    let dst = vec![
        37, 0, 0, 0, 4, 107, 101, 121, 0, 27, 0, 0, 0, 1, 48, 0, 41, 92, 143, 194, 245, 40, 240,
        63, 2, 49, 0, 4, 0, 0, 0, 120, 121, 122, 0, 0, 0,
    ];

    let doc = doc! { "key": src };

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_int32_array() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "arr": [1i32, 2i32] };
    let dst = vec![
        29, 0, 0, 0, 4, 0x61, 0x72, 0x72, 0, 19, 0, 0, 0, 0x10, 0x30, 0, 1, 0, 0, 0, 0x10, 0x31,
        0, 2, 0, 0, 0, 0, 0,
    ];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_deserialize_degenerate_array_keys() {
    let _guard = LOCK.run_concurrently();
    // inner document carries keys "5" and "foo"; values are taken in order
    // and the keys ignored
    let degenerate = vec![
        31, 0, 0, 0, 4, 0x61, 0x72, 0x72, 0, 21, 0, 0, 0, 0x10, 0x35, 0, 1, 0, 0, 0, 0x10, 0x66,
        0x6F, 0x6F, 0, 2, 0, 0, 0, 0, 0,
    ];

    let doc = Document::from_bytes(&degenerate).unwrap();
    assert_eq!(doc, doc! { "arr": [1i32, 2i32] });

    // re-encoding normalizes to canonical "0", "1" keys
    let canonical = vec![
        29, 0, 0, 0, 4, 0x61, 0x72, 0x72, 0, 19, 0, 0, 0, 0x10, 0x30, 0, 1, 0, 0, 0, 0x10, 0x31,
        0, 2, 0, 0, 0, 0, 0,
    ];
    assert_eq!(doc.to_vec().unwrap(), canonical);
}

#[test]
fn test_serialize_deserialize_doc() {
    let _guard = LOCK.run_concurrently();
    let src = doc! { "subkey": 1i32 };
    let dst = vec![
        27, 0, 0, 0, 3, 107, 101, 121, 0, 17, 0, 0, 0, 16, 115, 117, 98, 107, 101, 121, 0, 1, 0,
        0, 0, 0, 0,
    ];

    let doc = doc! { "key": src };

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_boolean() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "b": true };
    let dst = vec![9, 0, 0, 0, 8, 0x62, 0, 1, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_null() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "x": Bson::Null };
    let dst = vec![8, 0, 0, 0, 0x0A, 0x78, 0, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_sort_sentinels_and_undefined() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "min": Bson::MinKey, "max": Bson::MaxKey, "und": Bson::Undefined };
    let dst = vec![
        20, 0, 0, 0, 0xFF, 0x6D, 0x69, 0x6E, 0, 0x7F, 0x6D, 0x61, 0x78, 0, 0x06, 0x75, 0x6E,
        0x64, 0, 0,
    ];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_object_id() {
    let _guard = LOCK.run_concurrently();
    let oid = ObjectId::from_bytes([1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12]);
    let doc = doc! { "_id": oid };
    let dst = vec![
        22, 0, 0, 0, 7, 0x5F, 0x69, 0x64, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 0,
    ];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_datetime() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "when": DateTime::from_millis(-47_000) };

    let mut dst = vec![19, 0, 0, 0, 9, 0x77, 0x68, 0x65, 0x6E, 0];
    dst.extend_from_slice(&(-47_000i64).to_le_bytes());
    dst.push(0);

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_timestamp() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "ts": Timestamp { time: 100, increment: 2 } };
    // the increment field is encoded before the time field
    let dst = vec![17, 0, 0, 0, 0x11, 0x74, 0x73, 0, 2, 0, 0, 0, 100, 0, 0, 0, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_binary_generic() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "d": Binary { subtype: BinarySubtype::Generic, bytes: vec![1, 2, 3] } };
    let dst = vec![16, 0, 0, 0, 5, 0x64, 0, 3, 0, 0, 0, 0, 1, 2, 3, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_user_defined_binary() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "d": Binary { subtype: BinarySubtype::UserDefined(0x80), bytes: vec![7] } };
    let dst = vec![14, 0, 0, 0, 5, 0x64, 0, 1, 0, 0, 0, 0x80, 7, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_regex() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "r": Regex::new("ab", "im") };
    let dst = vec![14, 0, 0, 0, 0x0B, 0x72, 0, 0x61, 0x62, 0, 0x69, 0x6D, 0, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_deserialize_regex_options_are_sorted() {
    let _guard = LOCK.run_concurrently();
    // same regex with its options stored out of order
    let degenerate = vec![14, 0, 0, 0, 0x0B, 0x72, 0, 0x61, 0x62, 0, 0x6D, 0x69, 0, 0];
    let canonical = vec![14, 0, 0, 0, 0x0B, 0x72, 0, 0x61, 0x62, 0, 0x69, 0x6D, 0, 0];

    let doc = Document::from_bytes(&degenerate).unwrap();
    assert_eq!(doc, doc! { "r": Regex::new("ab", "mi") });
    assert_eq!(doc.to_vec().unwrap(), canonical);
}

#[test]
fn test_serialize_deserialize_code() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! { "c": Bson::JavaScriptCode("x".to_owned()) };
    let dst = vec![14, 0, 0, 0, 0x0D, 0x63, 0, 2, 0, 0, 0, 0x78, 0, 0];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_serialize_deserialize_code_with_scope() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! {
        "c": JavaScriptCodeWithScope { code: "x".to_owned(), scope: doc! {} }
    };
    let dst = vec![
        23, 0, 0, 0, 0x0F, 0x63, 0, 15, 0, 0, 0, 2, 0, 0, 0, 0x78, 0, 5, 0, 0, 0, 0, 0,
    ];

    assert_eq!(doc.to_vec().unwrap(), dst);
    assert_eq!(Document::from_bytes(&dst).unwrap(), doc);
}

#[test]
fn test_deserialize_symbol_round_trips() {
    let _guard = LOCK.run_concurrently();
    // symbols cannot be constructed from user input; they only come in from
    // bytes and must survive a round trip
    let src = vec![14, 0, 0, 0, 0x0E, 0x73, 0, 2, 0, 0, 0, 0x78, 0, 0];

    let doc = Document::from_bytes(&src).unwrap();
    assert_eq!(doc.get("s"), Some(&Bson::Symbol("x".to_owned())));
    assert_eq!(doc.to_vec().unwrap(), src);
}

#[test]
fn test_deserialize_db_pointer_round_trips() {
    let _guard = LOCK.run_concurrently();
    let mut src = vec![29, 0, 0, 0, 0x0C, 0x70, 0, 5, 0, 0, 0, 0x64, 0x62, 0x2E, 0x63, 0];
    src.extend_from_slice(&[0; 12]);
    src.push(0);

    let doc = Document::from_bytes(&src).unwrap();
    assert_matches!(doc.get("p"), Some(Bson::DbPointer(_)));
    assert_eq!(doc.to_vec().unwrap(), src);
}

#[test]
fn test_duplicate_keys_are_preserved() {
    let _guard = LOCK.run_concurrently();
    let src = vec![
        19, 0, 0, 0, 0x10, 0x61, 0, 1, 0, 0, 0, 0x10, 0x61, 0, 2, 0, 0, 0, 0,
    ];

    let doc = Document::from_bytes(&src).unwrap();
    assert_eq!(doc.len(), 2);
    // key-based access resolves to the first occurrence
    assert_eq!(doc.get("a"), Some(&Bson::Int32(1)));

    let entries: Vec<_> = doc.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    assert_eq!(
        entries,
        vec![
            ("a".to_owned(), Bson::Int32(1)),
            ("a".to_owned(), Bson::Int32(2)),
        ]
    );

    assert_eq!(doc.to_vec().unwrap(), src);
}

#[test]
fn test_early_terminator_tolerated() {
    let _guard = LOCK.run_concurrently();
    // a null tag before the final byte ends iteration
    let src = vec![10, 0, 0, 0, 0, 1, 1, 1, 1, 0];
    let doc = Document::from_bytes(&src).unwrap();
    assert!(doc.is_empty());
}

#[test]
fn test_encoded_framing_invariants() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! {
        "a": 1i32,
        "b": { "c": [1i64, 2.5, "s"] },
        "d": Bson::Null,
    };

    let bytes = doc.to_vec().unwrap();
    let prefix = i32::from_le_bytes(bytes[0..4].try_into().unwrap());
    assert_eq!(prefix as usize, bytes.len());
    assert_eq!(*bytes.last().unwrap(), 0);
}

#[test]
fn test_decode_encode_round_trip() {
    let _guard = LOCK.run_concurrently();
    let doc = doc! {
        "double": 2.71,
        "string": "pi",
        "doc": { "nested": [1i32, { "deep": true }] },
        "array": [7i32, 8i32],
        "binary": Binary { subtype: BinarySubtype::Md5, bytes: vec![0xAA; 16] },
        "oid": ObjectId::from_bytes([9; 12]),
        "bool": false,
        "datetime": DateTime::from_millis(1_577_836_800_000),
        "null": Bson::Null,
        "regex": Regex::new("^a.*b$", "xsi"),
        "code": Bson::JavaScriptCode("function() {}".to_owned()),
        "code_w_scope": JavaScriptCodeWithScope {
            code: "function(x) { return x; }".to_owned(),
            scope: doc! { "x": 1i32 },
        },
        "int32": -1i32,
        "timestamp": Timestamp { time: 1, increment: 2 },
        "int64": i64::MIN,
        "min": Bson::MinKey,
        "max": Bson::MaxKey,
        "undefined": Bson::Undefined,
    };

    let bytes = doc.to_vec().unwrap();
    let decoded = Document::from_bytes(&bytes).unwrap();
    assert_eq!(decoded, doc);
    // the canonical byte form is a fixed point
    assert_eq!(decoded.to_vec().unwrap(), bytes);
}

#[test]
fn test_decode_invalid_length_prefixes() {
    let _guard = LOCK.run_concurrently();

    // too short to be a document at all
    assert!(Document::from_bytes([4u8, 0, 0, 0])
        .unwrap_err()
        .is_invalid_bson());

    // length does not match the buffer
    assert!(Document::from_bytes([6u8, 0, 0, 0, 0])
        .unwrap_err()
        .is_invalid_bson());

    // trailing garbage after the declared length
    assert!(Document::from_bytes([5u8, 0, 0, 0, 0, 42])
        .unwrap_err()
        .is_invalid_bson());

    // negative length
    assert!(Document::from_bytes([0xFFu8, 0xFF, 0xFF, 0xFF, 0])
        .unwrap_err()
        .is_invalid_bson());
}

#[test]
fn test_decode_missing_document_terminator() {
    let _guard = LOCK.run_concurrently();
    assert!(Document::from_bytes([5u8, 0, 0, 0, 1])
        .unwrap_err()
        .is_invalid_bson());
}

#[test]
fn test_decode_truncated_value() {
    let _guard = LOCK.run_concurrently();
    // int32 element with only two payload bytes
    let src = vec![10u8, 0, 0, 0, 0x10, 0x61, 0, 1, 0, 0];
    let err = Document::from_bytes(&src).unwrap_err();
    assert!(err.is_invalid_bson());
    assert_eq!(err.key.as_deref(), Some("a"));
}

#[test]
fn test_decode_unrecognized_element_type() {
    let _guard = LOCK.run_concurrently();
    let src = vec![8u8, 0, 0, 0, 0x42, 0x61, 0, 0];
    let err = Document::from_bytes(&src).unwrap_err();
    assert_matches!(err.kind, ErrorKind::InvalidBson { ref message } if message.contains("unrecognized"));
}

#[test]
fn test_decode_decimal128_is_unsupported() {
    let _guard = LOCK.run_concurrently();
    let mut src = vec![24u8, 0, 0, 0, 0x13, 0x64, 0];
    src.extend_from_slice(&[0; 16]);
    src.push(0);

    let err = Document::from_bytes(&src).unwrap_err();
    assert_matches!(
        err.kind,
        ErrorKind::UnsupportedType {
            element_type: 0x13
        }
    );
}

#[test]
fn test_decode_invalid_boolean_byte() {
    let _guard = LOCK.run_concurrently();
    let src = vec![9u8, 0, 0, 0, 8, 0x62, 0, 2, 0];
    assert!(Document::from_bytes(&src).unwrap_err().is_invalid_bson());
}

#[test]
fn test_decode_negative_binary_length() {
    let _guard = LOCK.run_concurrently();
    let src = vec![13u8, 0, 0, 0, 5, 0x64, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0, 0];
    assert!(Document::from_bytes(&src).unwrap_err().is_invalid_bson());
}

#[test]
fn test_decode_reserved_binary_subtype() {
    let _guard = LOCK.run_concurrently();
    let src = vec![16u8, 0, 0, 0, 5, 0x64, 0, 3, 0, 0, 0, 0x06, 1, 2, 3, 0];
    assert!(Document::from_bytes(&src).unwrap_err().is_invalid_bson());
}

#[test]
fn test_decode_uuid_binary_requires_16_bytes() {
    let _guard = LOCK.run_concurrently();
    let src = vec![16u8, 0, 0, 0, 5, 0x64, 0, 3, 0, 0, 0, 0x04, 1, 2, 3, 0];
    assert!(Document::from_bytes(&src).unwrap_err().is_invalid_bson());
}

#[test]
fn test_decode_string_framing_errors() {
    let _guard = LOCK.run_concurrently();

    // declared length not covering a null terminator
    let zero_len = vec![14u8, 0, 0, 0, 2, 0x73, 0, 0, 0, 0, 0, 0x68, 0x69, 0];
    assert!(Document::from_bytes(&zero_len)
        .unwrap_err()
        .is_invalid_bson());

    // negative declared length
    let negative = vec![15u8, 0, 0, 0, 2, 0x73, 0, 0xFF, 0xFF, 0xFF, 0xFF, 0x68, 0x69, 0, 0];
    assert!(Document::from_bytes(&negative)
        .unwrap_err()
        .is_invalid_bson());

    // the length-th byte is not the null terminator
    let unterminated = vec![15u8, 0, 0, 0, 2, 0x73, 0, 3, 0, 0, 0, 0x68, 0x69, 0x78, 0];
    assert!(Document::from_bytes(&unterminated)
        .unwrap_err()
        .is_invalid_bson());

    // invalid UTF-8 in the text
    let invalid_utf8 = vec![15u8, 0, 0, 0, 2, 0x73, 0, 3, 0, 0, 0, 0x80, 0xAE, 0, 0];
    assert!(Document::from_bytes(&invalid_utf8)
        .unwrap_err()
        .is_invalid_bson());
}

#[test]
fn test_decode_key_without_terminator() {
    let _guard = LOCK.run_concurrently();
    let src = vec![8u8, 0, 0, 0, 0x10, 0x61, 0x62, 0];
    // the key consumes the trailing null, leaving no room for the payload
    assert!(Document::from_bytes(&src).unwrap_err().is_invalid_bson());
}
