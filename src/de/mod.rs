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

//! Deserializer

mod cursor;
mod serde;

pub use self::serde::Deserializer;

use ::serde::de::DeserializeOwned;

use self::cursor::ByteCursor;
use crate::{
    bson::{Array, Bson, Regex},
    document::Document,
    error::{Error, Result},
    spec::{BinarySubtype, ElementType},
};

// 4 bytes for the length prefix, one byte for the trailing null
pub(crate) const MIN_BSON_DOCUMENT_SIZE: i32 = 4 + 1;

/// Decodes a document from its serialized byte form.
pub(crate) fn decode_document(bytes: &[u8]) -> Result<Document> {
    let mut doc = Document::new();
    for element in Elements::new(bytes)? {
        let (key, value) = element?;
        // duplicate keys are preserved in decode order
        doc.push(key.to_owned(), value);
    }
    Ok(doc)
}

fn decode_array(bytes: &[u8]) -> Result<Array> {
    let mut arr = Array::new();
    // the keys of an array document are ignored; values are taken in
    // iteration order, so degenerate encodings with missing or unordered
    // keys still decode
    for (index, element) in Elements::new(bytes)?.enumerate() {
        let (_key, value) = element.map_err(|e| e.with_index(index))?;
        arr.push(value);
    }
    Ok(arr)
}

fn decode_bson<'a>(cursor: &mut ByteCursor<'a>, tag: u8) -> Result<Bson> {
    use crate::spec::ElementType::*;
    match ElementType::from(tag) {
        Some(Double) => Ok(Bson::Double(cursor.read_f64()?)),
        Some(String) => cursor.read_string().map(|s| Bson::String(s.to_owned())),
        Some(EmbeddedDocument) => {
            let sub = take_embedded_document(cursor)?;
            decode_document(sub).map(Bson::Document)
        }
        Some(Array) => {
            let sub = take_embedded_document(cursor)?;
            decode_array(sub).map(Bson::Array)
        }
        Some(Binary) => {
            let len = cursor.read_i32()?;
            if len < 0 {
                return Err(Error::invalid_bson(format!(
                    "binary length must be non-negative, got {}",
                    len
                )));
            }

            let subtype_byte = cursor.read_u8()?;
            let subtype = BinarySubtype::from_u8(subtype_byte).ok_or_else(|| {
                Error::invalid_bson(format!(
                    "unrecognized binary subtype {:#04x}",
                    subtype_byte
                ))
            })?;

            let bytes = cursor.take(len as usize)?.to_vec();
            if matches!(subtype, BinarySubtype::Uuid | BinarySubtype::UuidOld) && bytes.len() != 16
            {
                return Err(Error::invalid_bson(format!(
                    "binary data with the {:?} subtype must be 16 bytes long, got {} byte(s)",
                    subtype,
                    bytes.len()
                )));
            }

            Ok(Bson::Binary(crate::Binary { subtype, bytes }))
        }
        Some(Undefined) => Ok(Bson::Undefined),
        Some(ObjectId) => {
            // advance by exactly the 12 ObjectId bytes, once
            let bytes: [u8; 12] = cursor
                .take(12)?
                .try_into()
                .map_err(|_| Error::internal("sized take returned a wrongly sized slice"))?;
            Ok(Bson::ObjectId(crate::oid::ObjectId::from_bytes(bytes)))
        }
        Some(Boolean) => match cursor.read_u8()? {
            0 => Ok(Bson::Boolean(false)),
            1 => Ok(Bson::Boolean(true)),
            b => Err(Error::invalid_bson(format!(
                "boolean must be stored as 0 or 1, got {}",
                b
            ))),
        },
        Some(DateTime) => Ok(Bson::DateTime(crate::DateTime::from_millis(
            cursor.read_i64()?,
        ))),
        Some(Null) => Ok(Bson::Null),
        Some(RegularExpression) => {
            let pattern = cursor.read_cstring()?;
            let options = cursor.read_cstring()?;
            Ok(Bson::RegularExpression(Regex::new(pattern, options)))
        }
        Some(DbPointer) => {
            let namespace = cursor.read_string()?.to_owned();
            let id: [u8; 12] = cursor
                .take(12)?
                .try_into()
                .map_err(|_| Error::internal("sized take returned a wrongly sized slice"))?;
            Ok(Bson::DbPointer(crate::bson::DbPointer {
                namespace,
                id: crate::oid::ObjectId::from_bytes(id),
            }))
        }
        Some(JavaScriptCode) => cursor
            .read_string()
            .map(|code| Bson::JavaScriptCode(code.to_owned())),
        Some(Symbol) => cursor.read_string().map(|s| Bson::Symbol(s.to_owned())),
        Some(JavaScriptCodeWithScope) => {
            // the total is informational; the inner framing is
            // self-delimiting
            let total = cursor.read_i32()?;
            if total < 0 {
                return Err(Error::invalid_bson(format!(
                    "code with scope length must be non-negative, got {}",
                    total
                )));
            }

            let code = cursor.read_string()?.to_owned();
            let scope = decode_document(take_embedded_document(cursor)?)?;
            Ok(Bson::JavaScriptCodeWithScope(
                crate::bson::JavaScriptCodeWithScope { code, scope },
            ))
        }
        Some(Int32) => Ok(Bson::Int32(cursor.read_i32()?)),
        Some(Timestamp) => {
            let increment = cursor.read_u32()?;
            let time = cursor.read_u32()?;
            Ok(Bson::Timestamp(crate::Timestamp { time, increment }))
        }
        Some(Int64) => Ok(Bson::Int64(cursor.read_i64()?)),
        Some(Decimal128) => Err(Error::unsupported_type(tag)),
        Some(MaxKey) => Ok(Bson::MaxKey),
        Some(MinKey) => Ok(Bson::MinKey),
        None => Err(Error::invalid_bson(format!(
            "unrecognized BSON type {:#04x}",
            tag
        ))),
    }
}

// Slices the next embedded document (or array) off the cursor head, using
// the document's own length prefix.
fn take_embedded_document<'a>(cursor: &mut ByteCursor<'a>) -> Result<&'a [u8]> {
    let length = cursor.peek_i32()?;
    if length < MIN_BSON_DOCUMENT_SIZE {
        return Err(Error::invalid_bson(format!(
            "document length must be at least {}, got {}",
            MIN_BSON_DOCUMENT_SIZE, length
        )));
    }

    cursor.take(length as usize)
}

/// An iterator over the elements of a serialized document.
///
/// The iterator is single-pass: a decoding failure poisons it, and all
/// subsequent calls return `None`. Obtain a fresh iterator to re-scan.
pub struct Elements<'a> {
    cursor: ByteCursor<'a>,
    valid: bool,
}

impl<'a> Elements<'a> {
    /// Validates the outer framing of `bytes` (length prefix equal to the
    /// buffer length, trailing null) and returns an iterator positioned at
    /// the first element.
    pub fn new(bytes: &'a [u8]) -> Result<Self> {
        let mut cursor = ByteCursor::new(bytes);

        let length = cursor.read_i32()?;
        if length < MIN_BSON_DOCUMENT_SIZE {
            return Err(Error::invalid_bson(format!(
                "document length must be at least {}, got {}",
                MIN_BSON_DOCUMENT_SIZE, length
            )));
        }
        if length as usize != bytes.len() {
            return Err(Error::invalid_bson(format!(
                "document length {} does not match buffer length {}",
                length,
                bytes.len()
            )));
        }
        if bytes[bytes.len() - 1] != 0 {
            return Err(Error::invalid_bson("document is not null terminated"));
        }

        Ok(Self {
            cursor,
            valid: true,
        })
    }

    fn next_element(&mut self) -> Result<Option<(&'a str, Bson)>> {
        let tag = self.cursor.read_u8()?;
        if tag == 0 {
            // end of document; a null tag before the final byte still ends
            // iteration
            return Ok(None);
        }

        let key = self.cursor.read_cstring()?;
        let value = decode_bson(&mut self.cursor, tag).map_err(|e| e.with_key(key))?;
        Ok(Some((key, value)))
    }
}

impl<'a> Iterator for Elements<'a> {
    type Item = Result<(&'a str, Bson)>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.valid {
            return None;
        }

        match self.next_element() {
            Ok(Some(element)) => Some(Ok(element)),
            Ok(None) => {
                self.valid = false;
                None
            }
            Err(e) => {
                self.valid = false;
                Some(Err(e))
            }
        }
    }
}

/// Decode a BSON `Value` into a `T` Deserializable.
pub fn from_bson<T>(bson: Bson) -> Result<T>
where
    T: DeserializeOwned,
{
    T::deserialize(Deserializer::new(bson))
}

/// Decode a BSON `Document` into a `T` Deserializable.
pub fn from_document<T>(doc: Document) -> Result<T>
where
    T: DeserializeOwned,
{
    from_bson(Bson::Document(doc))
}
