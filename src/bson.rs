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

//! BSON definition

use std::{
    convert::TryFrom,
    fmt::{self, Debug, Display},
};

use crate::{
    binary::Binary,
    datetime::DateTime,
    document::Document,
    oid::{self, ObjectId},
    spec::{BinarySubtype, ElementType},
};

/// Possible BSON value types.
///
/// The `Decimal128` element type has no variant here: its tag is recognized
/// by the decoder, which reports it as unsupported, but no value of that type
/// can be constructed. `Symbol` is likewise never produced from user input;
/// it only arises from decoding and round-trips faithfully.
#[derive(Clone, PartialEq)]
pub enum Bson {
    /// 64-bit binary floating point
    Double(f64),
    /// UTF-8 string
    String(String),
    /// Array
    Array(Array),
    /// Embedded document
    Document(Document),
    /// Boolean value
    Boolean(bool),
    /// Null value
    Null,
    /// Regular expression
    RegularExpression(Regex),
    /// JavaScript code
    JavaScriptCode(String),
    /// JavaScript code with scope
    JavaScriptCodeWithScope(JavaScriptCodeWithScope),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Timestamp
    Timestamp(Timestamp),
    /// Binary data
    Binary(Binary),
    /// [ObjectId](http://dochub.mongodb.org/core/objectids)
    ObjectId(oid::ObjectId),
    /// UTC datetime
    DateTime(DateTime),
    /// Deprecated. Symbol
    Symbol(String),
    /// Deprecated. Undefined (value)
    Undefined,
    /// Max key
    MaxKey,
    /// Min key
    MinKey,
    /// Deprecated. DBPointer
    DbPointer(DbPointer),
}

/// Alias for `Vec<Bson>`.
pub type Array = Vec<Bson>;

impl Default for Bson {
    fn default() -> Self {
        Bson::Null
    }
}

impl Debug for Bson {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bson::Double(p) => write!(f, "Double({:?})", p),
            Bson::String(s) => write!(f, "String({:?})", s),
            Bson::Array(vec) => {
                write!(f, "Array(")?;
                Debug::fmt(vec, f)?;
                write!(f, ")")
            }
            Bson::Document(doc) => Debug::fmt(doc, f),
            Bson::Boolean(b) => write!(f, "Boolean({:?})", b),
            Bson::Null => write!(f, "Null"),
            Bson::RegularExpression(regex) => Debug::fmt(regex, f),
            Bson::JavaScriptCode(s) => write!(f, "JavaScriptCode({:?})", s),
            Bson::JavaScriptCodeWithScope(code) => Debug::fmt(code, f),
            Bson::Int32(v) => write!(f, "Int32({:?})", v),
            Bson::Int64(v) => write!(f, "Int64({:?})", v),
            Bson::Timestamp(t) => Debug::fmt(t, f),
            Bson::Binary(b) => Debug::fmt(b, f),
            Bson::ObjectId(id) => Debug::fmt(id, f),
            Bson::DateTime(dt) => Debug::fmt(dt, f),
            Bson::Symbol(s) => write!(f, "Symbol({:?})", s),
            Bson::Undefined => write!(f, "Undefined"),
            Bson::MinKey => write!(f, "MinKey"),
            Bson::MaxKey => write!(f, "MaxKey"),
            Bson::DbPointer(p) => Debug::fmt(p, f),
        }
    }
}

impl Display for Bson {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Bson::Double(f) if f.fract() == 0.0 && f.is_finite() => write!(fmt, "{}.0", f),
            Bson::Double(f) => write!(fmt, "{}", f),
            Bson::String(s) => write!(fmt, "\"{}\"", s),
            Bson::Array(vec) => {
                fmt.write_str("[")?;

                let mut first = true;
                for bson in vec {
                    if !first {
                        fmt.write_str(", ")?;
                    }

                    write!(fmt, "{}", bson)?;
                    first = false;
                }

                fmt.write_str("]")
            }
            Bson::Document(doc) => write!(fmt, "{}", doc),
            Bson::Boolean(b) => write!(fmt, "{}", b),
            Bson::Null => write!(fmt, "null"),
            Bson::RegularExpression(regex) => write!(fmt, "{}", regex),
            Bson::JavaScriptCode(code)
            | Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, .. }) => {
                fmt.write_str(code)
            }
            Bson::Int32(i) => write!(fmt, "{}", i),
            Bson::Int64(i) => write!(fmt, "{}", i),
            Bson::Timestamp(t) => write!(fmt, "{}", t),
            Bson::Binary(b) => write!(fmt, "{}", b),
            Bson::ObjectId(id) => write!(fmt, "ObjectId(\"{}\")", id),
            Bson::DateTime(dt) => write!(fmt, "DateTime(\"{}\")", dt),
            Bson::Symbol(s) => write!(fmt, "Symbol(\"{}\")", s),
            Bson::Undefined => write!(fmt, "undefined"),
            Bson::MinKey => write!(fmt, "MinKey"),
            Bson::MaxKey => write!(fmt, "MaxKey"),
            Bson::DbPointer(p) => write!(fmt, "{}", p),
        }
    }
}

impl From<f32> for Bson {
    fn from(a: f32) -> Bson {
        Bson::Double(a.into())
    }
}

impl From<f64> for Bson {
    fn from(a: f64) -> Bson {
        Bson::Double(a)
    }
}

impl From<&str> for Bson {
    fn from(s: &str) -> Bson {
        Bson::String(s.to_owned())
    }
}

impl From<String> for Bson {
    fn from(a: String) -> Bson {
        Bson::String(a)
    }
}

impl From<&String> for Bson {
    fn from(a: &String) -> Bson {
        Bson::String(a.to_owned())
    }
}

impl From<bool> for Bson {
    fn from(a: bool) -> Bson {
        Bson::Boolean(a)
    }
}

impl From<i32> for Bson {
    fn from(a: i32) -> Bson {
        Bson::Int32(a)
    }
}

impl From<i64> for Bson {
    fn from(a: i64) -> Bson {
        Bson::Int64(a)
    }
}

impl From<u8> for Bson {
    fn from(a: u8) -> Bson {
        Bson::Int32(a.into())
    }
}

impl From<u16> for Bson {
    fn from(a: u16) -> Bson {
        Bson::Int32(a.into())
    }
}

impl From<u32> for Bson {
    fn from(a: u32) -> Bson {
        Bson::Int64(a.into())
    }
}

impl From<Document> for Bson {
    fn from(a: Document) -> Bson {
        Bson::Document(a)
    }
}

impl From<Binary> for Bson {
    fn from(a: Binary) -> Bson {
        Bson::Binary(a)
    }
}

impl From<Regex> for Bson {
    fn from(a: Regex) -> Bson {
        Bson::RegularExpression(a)
    }
}

impl From<Timestamp> for Bson {
    fn from(a: Timestamp) -> Bson {
        Bson::Timestamp(a)
    }
}

impl From<DateTime> for Bson {
    fn from(a: DateTime) -> Bson {
        Bson::DateTime(a)
    }
}

impl From<oid::ObjectId> for Bson {
    fn from(a: oid::ObjectId) -> Bson {
        Bson::ObjectId(a)
    }
}

impl From<DbPointer> for Bson {
    fn from(a: DbPointer) -> Bson {
        Bson::DbPointer(a)
    }
}

impl From<JavaScriptCodeWithScope> for Bson {
    fn from(a: JavaScriptCodeWithScope) -> Bson {
        Bson::JavaScriptCodeWithScope(a)
    }
}

impl<T: Into<Bson>> From<Vec<T>> for Bson {
    fn from(v: Vec<T>) -> Bson {
        Bson::Array(v.into_iter().map(|val| val.into()).collect())
    }
}

impl<T: Into<Bson>> From<Option<T>> for Bson {
    fn from(a: Option<T>) -> Bson {
        match a {
            None => Bson::Null,
            Some(t) => t.into(),
        }
    }
}

impl Bson {
    /// Get the [`ElementType`] of this value.
    pub fn element_type(&self) -> ElementType {
        match self {
            Bson::Double(..) => ElementType::Double,
            Bson::String(..) => ElementType::String,
            Bson::Array(..) => ElementType::Array,
            Bson::Document(..) => ElementType::EmbeddedDocument,
            Bson::Boolean(..) => ElementType::Boolean,
            Bson::Null => ElementType::Null,
            Bson::RegularExpression(..) => ElementType::RegularExpression,
            Bson::JavaScriptCode(..) => ElementType::JavaScriptCode,
            Bson::JavaScriptCodeWithScope(..) => ElementType::JavaScriptCodeWithScope,
            Bson::Int32(..) => ElementType::Int32,
            Bson::Int64(..) => ElementType::Int64,
            Bson::Timestamp(..) => ElementType::Timestamp,
            Bson::Binary(..) => ElementType::Binary,
            Bson::ObjectId(..) => ElementType::ObjectId,
            Bson::DateTime(..) => ElementType::DateTime,
            Bson::Symbol(..) => ElementType::Symbol,
            Bson::Undefined => ElementType::Undefined,
            Bson::MaxKey => ElementType::MaxKey,
            Bson::MinKey => ElementType::MinKey,
            Bson::DbPointer(..) => ElementType::DbPointer,
        }
    }

    /// If the value is a `Double`, returns the associated `f64`. Returns
    /// `None` otherwise.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Bson::Double(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is a `String`, returns the associated `str`. Returns
    /// `None` otherwise.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Bson::String(s) => Some(s),
            _ => None,
        }
    }

    /// If the value is an `Array`, returns the associated slice. Returns
    /// `None` otherwise.
    pub fn as_array(&self) -> Option<&Array> {
        match self {
            Bson::Array(v) => Some(v),
            _ => None,
        }
    }

    /// If the value is a `Document`, returns the associated [`Document`].
    /// Returns `None` otherwise.
    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Bson::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// If the value is a `Boolean`, returns the associated `bool`. Returns
    /// `None` otherwise.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Bson::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is an `Int32`, returns the associated `i32`. Returns
    /// `None` otherwise.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Bson::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is an `Int64`, returns the associated `i64`. Returns
    /// `None` otherwise.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Bson::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is an `ObjectId`, returns the associated [`ObjectId`].
    /// Returns `None` otherwise.
    pub fn as_object_id(&self) -> Option<oid::ObjectId> {
        match self {
            Bson::ObjectId(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is a `DateTime`, returns the associated [`DateTime`].
    /// Returns `None` otherwise.
    pub fn as_datetime(&self) -> Option<&DateTime> {
        match self {
            Bson::DateTime(v) => Some(v),
            _ => None,
        }
    }

    /// If the value is a `Timestamp`, returns the associated [`Timestamp`].
    /// Returns `None` otherwise.
    pub fn as_timestamp(&self) -> Option<Timestamp> {
        match self {
            Bson::Timestamp(v) => Some(*v),
            _ => None,
        }
    }

    /// If the value is a `Null`, returns `()`. Returns `None` otherwise.
    pub fn as_null(&self) -> Option<()> {
        match self {
            Bson::Null => Some(()),
            _ => None,
        }
    }

    /// Converts this value to the canonical extended document form of its
    /// type. Panics for the types that have a native JSON shape; callers
    /// dispatch only the wrapped ones here.
    pub(crate) fn to_extended_document(&self) -> Document {
        match self {
            Bson::RegularExpression(Regex { pattern, options }) => {
                doc! {
                    "$regularExpression": {
                        "pattern": pattern.clone(),
                        "options": options.clone(),
                    }
                }
            }
            Bson::JavaScriptCode(code) => {
                doc! {
                    "$code": code.clone(),
                }
            }
            Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope { code, scope }) => {
                doc! {
                    "$code": code.clone(),
                    "$scope": scope.clone(),
                }
            }
            Bson::Timestamp(Timestamp { time, increment }) => {
                doc! {
                    "$timestamp": {
                        "t": i64::from(*time),
                        "i": i64::from(*increment),
                    }
                }
            }
            Bson::Binary(Binary { subtype, bytes }) => {
                let tval: u8 = From::from(*subtype);
                doc! {
                    "$binary": {
                        "base64": crate::base64::encode(bytes),
                        "subType": hex::encode([tval]),
                    }
                }
            }
            Bson::ObjectId(v) => {
                doc! {
                    "$oid": v.to_hex(),
                }
            }
            Bson::DateTime(v) => {
                doc! {
                    "$date": {
                        "$numberLong": v.timestamp_millis().to_string(),
                    }
                }
            }
            Bson::Symbol(v) => {
                doc! {
                    "$symbol": v.clone(),
                }
            }
            Bson::Undefined => {
                doc! {
                    "$undefined": true,
                }
            }
            Bson::MinKey => {
                doc! {
                    "$minKey": 1,
                }
            }
            Bson::MaxKey => {
                doc! {
                    "$maxKey": 1,
                }
            }
            Bson::DbPointer(DbPointer { namespace, id }) => {
                doc! {
                    "$dbPointer": {
                        "$ref": namespace.clone(),
                        "$id": {
                            "$oid": id.to_hex(),
                        }
                    }
                }
            }
            _ => panic!("type has a native representation: {:?}", self),
        }
    }

    /// Recognizes the canonical extended document shapes produced by
    /// [`to_extended_document`](Bson::to_extended_document) and folds them
    /// back into their value forms. Anything unrecognized stays a plain
    /// document.
    pub(crate) fn from_extended_document(doc: Document) -> Bson {
        if doc.len() > 2 {
            return Bson::Document(doc);
        }

        // keys are copied out so that no borrow of `doc` outlives the
        // fallthrough move below
        let mut owned_keys: Vec<String> = doc.keys().map(|s| s.to_owned()).collect();
        owned_keys.sort_unstable();
        let keys: Vec<&str> = owned_keys.iter().map(|s| s.as_str()).collect();

        match keys.as_slice() {
            ["$oid"] => {
                if let Some(oid) = doc
                    .get_str("$oid")
                    .ok()
                    .and_then(|h| ObjectId::parse_str(h).ok())
                {
                    return Bson::ObjectId(oid);
                }
            }
            ["$symbol"] => {
                if let Ok(symbol) = doc.get_str("$symbol") {
                    return Bson::Symbol(symbol.to_owned());
                }
            }
            ["$code"] => {
                if let Ok(code) = doc.get_str("$code") {
                    return Bson::JavaScriptCode(code.to_owned());
                }
            }
            ["$code", "$scope"] => {
                if let (Ok(code), Ok(scope)) = (doc.get_str("$code"), doc.get_document("$scope")) {
                    return Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                        code: code.to_owned(),
                        scope: scope.clone(),
                    });
                }
            }
            ["$date"] => {
                if let Some(millis) = doc
                    .get_document("$date")
                    .ok()
                    .and_then(|d| d.get_str("$numberLong").ok())
                    .and_then(|s| s.parse::<i64>().ok())
                {
                    return Bson::DateTime(DateTime::from_millis(millis));
                }
            }
            ["$timestamp"] => {
                if let Ok(body) = doc.get_document("$timestamp") {
                    let time = body.get_i64("t").ok().and_then(|t| u32::try_from(t).ok());
                    let increment = body.get_i64("i").ok().and_then(|i| u32::try_from(i).ok());
                    if let (Some(time), Some(increment)) = (time, increment) {
                        return Bson::Timestamp(Timestamp { time, increment });
                    }
                }
            }
            ["$binary"] => {
                if let Some(binary) = Binary::from_extended_doc(&doc) {
                    return Bson::Binary(binary);
                }
            }
            ["$regularExpression"] => {
                if let Ok(body) = doc.get_document("$regularExpression") {
                    if let (Ok(pattern), Ok(options)) =
                        (body.get_str("pattern"), body.get_str("options"))
                    {
                        return Bson::RegularExpression(Regex::new(pattern, options));
                    }
                }
            }
            ["$dbPointer"] => {
                if let Ok(body) = doc.get_document("$dbPointer") {
                    let namespace = body.get_str("$ref").ok();
                    let id = body
                        .get_document("$id")
                        .ok()
                        .and_then(|id| id.get_str("$oid").ok())
                        .and_then(|hex| ObjectId::parse_str(hex).ok());
                    if let (Some(namespace), Some(id)) = (namespace, id) {
                        return Bson::DbPointer(DbPointer {
                            namespace: namespace.to_owned(),
                            id,
                        });
                    }
                }
            }
            ["$undefined"] => {
                if doc.get_bool("$undefined") == Ok(true) {
                    return Bson::Undefined;
                }
            }
            ["$minKey"] => {
                if doc.get_i32("$minKey") == Ok(1) || doc.get_i64("$minKey") == Ok(1) {
                    return Bson::MinKey;
                }
            }
            ["$maxKey"] => {
                if doc.get_i32("$maxKey") == Ok(1) || doc.get_i64("$maxKey") == Ok(1) {
                    return Bson::MaxKey;
                }
            }
            _ => {}
        }

        Bson::Document(doc)
    }
}

impl Binary {
    pub(crate) fn from_extended_doc(doc: &Document) -> Option<Self> {
        let binary_doc = doc.get_document("$binary").ok()?;

        let bytes = crate::base64::decode(binary_doc.get_str("base64").ok()?).ok()?;
        let subtype = hex::decode(binary_doc.get_str("subType").ok()?).ok()?;
        if subtype.len() != 1 {
            return None;
        }

        Binary::new(bytes, BinarySubtype::from_u8(subtype[0])?).ok()
    }
}

/// Represents a BSON timestamp value.
#[derive(Debug, Eq, PartialEq, Ord, PartialOrd, Clone, Copy, Hash)]
pub struct Timestamp {
    /// The number of seconds since the Unix epoch.
    pub time: u32,

    /// An incrementing value to order timestamps with the same number of
    /// seconds in the `time` field.
    pub increment: u32,
}

impl Display for Timestamp {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "Timestamp({}, {})", self.time, self.increment)
    }
}

/// Represents a BSON regular expression value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Regex {
    /// The regex pattern to match.
    pub pattern: String,

    /// The options for the regex. Stored sorted so that equal sets of options
    /// compare equal regardless of the order they were written in.
    pub options: String,
}

impl Regex {
    /// Creates a new [`Regex`], sorting the option characters.
    ///
    /// Option characters outside the documented set (`i`, `l`, `m`, `s`,
    /// `u`, `x`) are preserved, not validated.
    pub fn new(pattern: impl Into<String>, options: impl Into<String>) -> Self {
        let mut chars: Vec<_> = options.into().chars().collect();
        chars.sort_unstable();

        Self {
            pattern: pattern.into(),
            options: chars.into_iter().collect(),
        }
    }
}

impl Display for Regex {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "/{}/{}", self.pattern, self.options)
    }
}

/// Represents a BSON code with scope value.
#[derive(Debug, Clone, PartialEq)]
pub struct JavaScriptCodeWithScope {
    /// The JavaScript code.
    pub code: String,

    /// The scope document containing variable bindings.
    pub scope: Document,
}

impl Display for JavaScriptCodeWithScope {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        fmt.write_str(&self.code)
    }
}

/// Represents a DBPointer. (Deprecated)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DbPointer {
    pub(crate) namespace: String,
    pub(crate) id: ObjectId,
}

impl Display for DbPointer {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(fmt, "DBPointer({}, {})", self.namespace, self.id)
    }
}
