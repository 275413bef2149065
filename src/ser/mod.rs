// The MIT License (MIT)

// Copyright (c) 2015 Y. T. Chung <zonyitoo@gmail.com>

// Permission is hereby granted, free of charge, to any person obtaining a copy of
// this software and associated documentation files (the "Software"), to deal in
// the Software without restriction, including without limitation the rights to
// use, copy, modify, merge, publish, distribute, sublicense, and/or sell copies of
// the Software, and to permit persons to whom the Software is furnished to do so,
// subject to the following conditions:

// The above copyright notice and this permission notice shall be included in all
// copies or substantial portions of the Software.

// THE SOFTWARE IS PROVIDED "AS IS", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR
// IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY, FITNESS
// FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE AUTHORS OR
// COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER LIABILITY, WHETHER
// IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM, OUT OF OR IN
// CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE SOFTWARE.

//! Serializer

mod serde;

pub use self::serde::Serializer;

use ::serde::Serialize;

use crate::{
    binary::Binary,
    bson::{Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    document::Document,
    error::{Error, Result},
};

// The encoder builds into plain `Vec<u8>` buffers. Writes are infallible;
// the only encode-time failure is an interior null byte in data that the
// format frames as a c-string.

#[inline]
pub(crate) fn write_i32(buf: &mut Vec<u8>, val: i32) {
    buf.extend_from_slice(&val.to_le_bytes());
}

#[inline]
fn write_i64(buf: &mut Vec<u8>, val: i64) {
    buf.extend_from_slice(&val.to_le_bytes());
}

#[inline]
fn write_u32(buf: &mut Vec<u8>, val: u32) {
    buf.extend_from_slice(&val.to_le_bytes());
}

#[inline]
fn write_f64(buf: &mut Vec<u8>, val: f64) {
    buf.extend_from_slice(&val.to_le_bytes());
}

fn write_string(buf: &mut Vec<u8>, s: &str) {
    write_i32(buf, s.len() as i32 + 1);
    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
}

fn write_cstring(buf: &mut Vec<u8>, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::invalid_argument(format!(
            "cstring cannot contain a null byte: {:?}",
            s
        )));
    }

    buf.extend_from_slice(s.as_bytes());
    buf.push(0);
    Ok(())
}

fn serialize_array(buf: &mut Vec<u8>, arr: &[Bson]) -> Result<()> {
    let mut body = Vec::new();
    for (key, val) in arr.iter().enumerate() {
        serialize_bson(&mut body, &key.to_string(), val).map_err(|e| e.with_index(key))?;
    }

    write_i32(buf, body.len() as i32 + 4 + 1);
    buf.extend_from_slice(&body);
    buf.push(0);
    Ok(())
}

/// Encodes a document into its serialized byte form: the element body built
/// first, then the total length prefix and the trailing null.
pub(crate) fn encode_document(doc: &Document) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    encode_document_into(&mut buf, doc)?;
    Ok(buf)
}

pub(crate) fn encode_document_into(buf: &mut Vec<u8>, doc: &Document) -> Result<()> {
    let mut body = Vec::new();
    for (key, val) in doc {
        serialize_bson(&mut body, key, val).map_err(|e| e.with_key(key))?;
    }

    write_i32(buf, body.len() as i32 + 4 + 1);
    buf.extend_from_slice(&body);
    buf.push(0);
    Ok(())
}

pub(crate) fn serialize_bson(buf: &mut Vec<u8>, key: &str, val: &Bson) -> Result<()> {
    buf.push(val.element_type() as u8);
    write_cstring(buf, key)?;

    match *val {
        Bson::Double(v) => {
            write_f64(buf, v);
            Ok(())
        }
        Bson::String(ref v) => {
            write_string(buf, v);
            Ok(())
        }
        Bson::Array(ref v) => serialize_array(buf, v),
        Bson::Document(ref v) => encode_document_into(buf, v),
        Bson::Boolean(v) => {
            buf.push(v as u8);
            Ok(())
        }
        Bson::RegularExpression(Regex {
            ref pattern,
            ref options,
        }) => {
            write_cstring(buf, pattern)?;
            write_cstring(buf, options)
        }
        Bson::JavaScriptCode(ref code) => {
            write_string(buf, code);
            Ok(())
        }
        Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
            ref code,
            ref scope,
        }) => {
            let mut body = Vec::new();
            write_string(&mut body, code);
            encode_document_into(&mut body, scope)?;

            write_i32(buf, body.len() as i32 + 4);
            buf.extend_from_slice(&body);
            Ok(())
        }
        Bson::Int32(v) => {
            write_i32(buf, v);
            Ok(())
        }
        Bson::Int64(v) => {
            write_i64(buf, v);
            Ok(())
        }
        Bson::Timestamp(Timestamp { time, increment }) => {
            write_u32(buf, increment);
            write_u32(buf, time);
            Ok(())
        }
        Bson::Binary(Binary { subtype, ref bytes }) => {
            write_i32(buf, bytes.len() as i32);
            buf.push(subtype.into());
            buf.extend_from_slice(bytes);
            Ok(())
        }
        Bson::ObjectId(ref id) => {
            buf.extend_from_slice(&id.bytes());
            Ok(())
        }
        Bson::DateTime(dt) => {
            write_i64(buf, dt.timestamp_millis());
            Ok(())
        }
        Bson::Null => Ok(()),
        Bson::Symbol(ref v) => {
            write_string(buf, v);
            Ok(())
        }
        Bson::Undefined => Ok(()),
        Bson::MinKey => Ok(()),
        Bson::MaxKey => Ok(()),
        Bson::DbPointer(DbPointer {
            ref namespace,
            ref id,
        }) => {
            write_string(buf, namespace);
            buf.extend_from_slice(&id.bytes());
            Ok(())
        }
    }
}

/// Encode a `T` Serializable into a BSON `Value`.
pub fn to_bson<T: ?Sized>(value: &T) -> Result<Bson>
where
    T: Serialize,
{
    value.serialize(Serializer::new())
}

/// Encode a `T` Serializable into a BSON `Document`.
pub fn to_document<T: ?Sized>(value: &T) -> Result<Document>
where
    T: Serialize,
{
    match to_bson(value)? {
        Bson::Document(doc) => Ok(doc),
        bson => Err(Error::invalid_argument(format!(
            "expected a struct or map at the top level, got {:?}",
            bson.element_type()
        ))),
    }
}
