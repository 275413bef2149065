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

//! BSON, short for Binary JSON, is a binary-encoded serialization of JSON-like documents.
//! Like JSON, BSON supports the embedding of documents and arrays within other documents
//! and arrays. BSON also contains extensions that allow representation of data types that
//! are not part of the JSON spec. For example, BSON has a datetime type and a binary data type.
//!
//! ```text
//! // JSON equivalent
//! {"hello": "world"}
//!
//! // BSON encoding
//! \x16\x00\x00\x00                   // total document size
//! \x02                               // 0x02 = type String
//! hello\x00                          // field name
//! \x06\x00\x00\x00world\x00          // field value
//! \x00                               // 0x00 = type EOO ('end of object')
//! ```
//!
//! For more information about BSON itself, see [bsonspec.org](http://bsonspec.org).
//!
//! ## BSON values
//!
//! Many different types can be represented as a BSON value, including 32-bit and 64-bit signed
//! integers, 64-bit floating point numbers, strings, datetimes, embedded documents, and more. The
//! possible BSON values are modeled in this crate by the [`Bson`] enum.
//!
//! ### Creating [`Bson`] instances
//!
//! [`Bson`] values can be instantiated directly or via the [`bson!`] macro:
//!
//! ```rust
//! use wirebson::{bson, Bson};
//!
//! let string = Bson::String("hello world".to_string());
//! let int = Bson::Int32(5);
//! let array = Bson::Array(vec![Bson::Int32(5), Bson::Boolean(false)]);
//!
//! let string: Bson = "hello world".into();
//! let int: Bson = 5i32.into();
//!
//! let string = bson!("hello world");
//! let int = bson!(5);
//! let array = bson!([5, false]);
//! ```
//!
//! ## BSON documents
//!
//! BSON documents are ordered maps of UTF-8 encoded strings to BSON values. They are logically
//! similar to JSON objects in that they can contain subdocuments, arrays, and values of several
//! different types. This crate models BSON documents via the [`Document`] struct, which preserves
//! insertion order and caches its serialized byte form.
//!
//! ### Creating [`Document`]s
//!
//! [`Document`]s can be created directly either from raw BSON bytes or via the [`doc!`] macro:
//!
//! ```rust
//! use wirebson::{doc, Document};
//!
//! let bytes = b"\x16\x00\x00\x00\x02hello\x00\x06\x00\x00\x00world\x00\x00";
//! let doc = Document::from_bytes(&bytes[..]).unwrap();
//!
//! let doc = doc! {
//!    "hello": "world",
//! };
//! assert_eq!(doc.to_vec().unwrap(), bytes);
//! ```
//!
//! ## BSON to and from Rust types
//!
//! The [`to_bson`]/[`to_document`] and [`from_bson`]/[`from_document`] functions translate between
//! any type implementing [`serde::Serialize`]/[`serde::Deserialize`] and the BSON value model,
//! field by field:
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use wirebson::{doc, from_document, to_document};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Person {
//!     name: String,
//!     age: i32,
//! }
//!
//! # fn main() -> wirebson::Result<()> {
//! let person = Person {
//!     name: "Alice".to_string(),
//!     age: 33,
//! };
//!
//! let doc = to_document(&person)?;
//! assert_eq!(doc, doc! { "name": "Alice", "age": 33 });
//!
//! let back: Person = from_document(doc)?;
//! assert_eq!(back, person);
//! # Ok(())
//! # }
//! ```
//!
//! ## Extended JSON
//!
//! Every BSON value renders to its canonical [Extended JSON](https://www.mongodb.com/docs/manual/reference/mongodb-extended-json/)
//! shape via [`Bson::into_canonical_extjson`], with a lossier "relaxed" form available from
//! [`Bson::into_relaxed_extjson`]:
//!
//! ```rust
//! use serde_json::json;
//! use wirebson::bson;
//!
//! let value = bson!({ "code": 200i64 });
//! assert_eq!(
//!     value.into_canonical_extjson(),
//!     json!({ "code": { "$numberLong": "200" } }),
//! );
//! ```

#[macro_use]
mod macros;

mod base64;
mod binary;
mod bson;
mod datetime;
pub mod de;
mod document;
mod error;
mod extjson;
pub mod oid;
pub mod ser;
pub mod spec;


pub use self::{
    binary::Binary,
    bson::{Array, Bson, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
    datetime::DateTime,
    de::{from_bson, from_document, Deserializer, Elements},
    document::{Document, ValueAccessError, ValueAccessResult},
    error::{Error, ErrorKind, Result},
    oid::ObjectId,
    ser::{to_bson, to_document, Serializer},
    spec::{BinarySubtype, ElementType},
};
