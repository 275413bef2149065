//! A BSON document represented as an ordered list of key/value entries.

use std::{
    error,
    fmt::{self, Debug, Display, Formatter},
    iter::{Extend, FromIterator, IntoIterator},
};

use once_cell::sync::OnceCell;

use crate::{
    bson::{Array, Bson, Timestamp},
    datetime::DateTime,
    oid::ObjectId,
    spec::BinarySubtype,
};

/// Error to indicate that either a value was empty or it contained an
/// unexpected type, for use with the direct getters.
#[derive(PartialEq, Eq, Clone)]
#[non_exhaustive]
pub enum ValueAccessError {
    /// Cannot find the expected field with the specified key
    NotPresent,
    /// Found a value with the specified key, but not with the expected type
    UnexpectedType,
}

/// Result of accessing a value in a document.
pub type ValueAccessResult<T> = Result<T, ValueAccessError>;

impl Debug for ValueAccessError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            ValueAccessError::NotPresent => write!(f, "ValueAccessError: field is not present"),
            ValueAccessError::UnexpectedType => {
                write!(f, "ValueAccessError: field does not have the expected type")
            }
        }
    }
}

impl Display for ValueAccessError {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match *self {
            ValueAccessError::NotPresent => write!(f, "field is not present"),
            ValueAccessError::UnexpectedType => write!(f, "field does not have the expected type"),
        }
    }
}

impl error::Error for ValueAccessError {}

/// A BSON document: an ordered sequence of key/value entries.
///
/// Keys may repeat, as BSON permits; iteration reveals every entry in
/// insertion order, and the key-based accessors operate on the first
/// occurrence of a key. The document caches its serialized byte form; any
/// mutation invalidates the cache and the next call to
/// [`to_vec`](Document::to_vec) rebuilds it.
#[derive(Clone)]
pub struct Document {
    entries: Vec<(String, Bson)>,
    cached: OnceCell<Vec<u8>>,
}

impl Default for Document {
    fn default() -> Self {
        Document::new()
    }
}

impl PartialEq for Document {
    // Entry-list equality coincides with byte-form equality: the byte form is
    // a pure function of the ordered entries.
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Display for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        fmt.write_str("{")?;

        let mut first = true;
        for (k, v) in self {
            if first {
                first = false;
                fmt.write_str(" ")?;
            } else {
                fmt.write_str(", ")?;
            }

            write!(fmt, "\"{}\": {}", k, v)?;
        }

        write!(fmt, "{}}}", if !first { " " } else { "" })
    }
}

impl Debug for Document {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "Document(")?;
        fmt.debug_map().entries(self.iter()).finish()?;
        write!(fmt, ")")
    }
}

/// An owning iterator over Document entries.
pub struct IntoIter {
    inner: std::vec::IntoIter<(String, Bson)>,
}

/// An iterator over Document entries.
pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (String, Bson)>,
}

/// An iterator over a Document's keys.
pub struct Keys<'a> {
    inner: std::slice::Iter<'a, (String, Bson)>,
}

/// An iterator over a Document's values.
pub struct Values<'a> {
    inner: std::slice::Iter<'a, (String, Bson)>,
}

impl<'a> Iterator for Keys<'a> {
    type Item = &'a String;

    fn next(&mut self) -> Option<&'a String> {
        self.inner.next().map(|(k, _)| k)
    }
}

impl<'a> Iterator for Values<'a> {
    type Item = &'a Bson;

    fn next(&mut self) -> Option<&'a Bson> {
        self.inner.next().map(|(_, v)| v)
    }
}

impl Iterator for IntoIter {
    type Item = (String, Bson);

    fn next(&mut self) -> Option<(String, Bson)> {
        self.inner.next()
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a String, &'a Bson);

    fn next(&mut self) -> Option<(&'a String, &'a Bson)> {
        self.inner.next().map(|(k, v)| (k, v))
    }
}

impl IntoIterator for Document {
    type Item = (String, Bson);
    type IntoIter = IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.entries.into_iter(),
        }
    }
}

impl<'a> IntoIterator for &'a Document {
    type Item = (&'a String, &'a Bson);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        Iter {
            inner: self.entries.iter(),
        }
    }
}

impl<K: Into<String>, V: Into<Bson>> FromIterator<(K, V)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut doc = Document::new();
        for (k, v) in iter {
            doc.insert(k, v);
        }
        doc
    }
}

impl Document {
    /// Creates a new empty Document.
    pub fn new() -> Document {
        Document {
            entries: Vec::new(),
            cached: OnceCell::new(),
        }
    }

    /// Decodes a Document from its serialized byte form.
    ///
    /// The leading length prefix must equal the length of `bytes` exactly.
    pub fn from_bytes(bytes: impl AsRef<[u8]>) -> crate::error::Result<Document> {
        crate::de::decode_document(bytes.as_ref())
    }

    /// Returns the serialized byte form of this document, rebuilding the
    /// cached form if a mutation invalidated it.
    ///
    /// Fails with `InvalidArgument` only when a key, regex pattern, or regex
    /// option string contains an interior null byte; valid value trees always
    /// encode.
    pub fn to_vec(&self) -> crate::error::Result<Vec<u8>> {
        let bytes = self
            .cached
            .get_or_try_init(|| crate::ser::encode_document(self))?;
        Ok(bytes.clone())
    }

    fn invalidate(&mut self) {
        self.cached.take();
    }

    /// Gets an iterator over the entries of the document.
    pub fn iter(&self) -> Iter {
        self.into_iter()
    }

    /// Clears the document, removing all entries.
    pub fn clear(&mut self) {
        self.invalidate();
        self.entries.clear();
    }

    /// Returns a reference to the value corresponding to the first occurrence
    /// of the key.
    pub fn get(&self, key: impl AsRef<str>) -> Option<&Bson> {
        let key = key.as_ref();
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Gets a mutable reference to the value corresponding to the first
    /// occurrence of the key.
    pub fn get_mut(&mut self, key: impl AsRef<str>) -> Option<&mut Bson> {
        let key = key.as_ref();
        self.invalidate();
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Get a floating point value for this key if it exists and has the
    /// correct type.
    pub fn get_f64(&self, key: impl AsRef<str>) -> ValueAccessResult<f64> {
        match self.get(key) {
            Some(&Bson::Double(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get a string slice for this key if it exists and has the correct type.
    pub fn get_str(&self, key: impl AsRef<str>) -> ValueAccessResult<&str> {
        match self.get(key) {
            Some(Bson::String(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get an array reference for this key if it exists and has the correct
    /// type.
    pub fn get_array(&self, key: impl AsRef<str>) -> ValueAccessResult<&Array> {
        match self.get(key) {
            Some(Bson::Array(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get a document reference for this key if it exists and has the correct
    /// type.
    pub fn get_document(&self, key: impl AsRef<str>) -> ValueAccessResult<&Document> {
        match self.get(key) {
            Some(Bson::Document(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get a bool value for this key if it exists and has the correct type.
    pub fn get_bool(&self, key: impl AsRef<str>) -> ValueAccessResult<bool> {
        match self.get(key) {
            Some(&Bson::Boolean(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get an i32 value for this key if it exists and has the correct type.
    pub fn get_i32(&self, key: impl AsRef<str>) -> ValueAccessResult<i32> {
        match self.get(key) {
            Some(&Bson::Int32(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get an i64 value for this key if it exists and has the correct type.
    pub fn get_i64(&self, key: impl AsRef<str>) -> ValueAccessResult<i64> {
        match self.get(key) {
            Some(&Bson::Int64(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get a datetime value for this key if it exists and has the correct
    /// type.
    pub fn get_datetime(&self, key: impl AsRef<str>) -> ValueAccessResult<&DateTime> {
        match self.get(key) {
            Some(Bson::DateTime(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get a timestamp value for this key if it exists and has the correct
    /// type.
    pub fn get_timestamp(&self, key: impl AsRef<str>) -> ValueAccessResult<Timestamp> {
        match self.get(key) {
            Some(&Bson::Timestamp(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get an object id value for this key if it exists and has the correct
    /// type.
    pub fn get_object_id(&self, key: impl AsRef<str>) -> ValueAccessResult<ObjectId> {
        match self.get(key) {
            Some(&Bson::ObjectId(v)) => Ok(v),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Get a generic binary value for this key if it exists and has the
    /// correct type.
    pub fn get_binary_generic(&self, key: impl AsRef<str>) -> ValueAccessResult<&Vec<u8>> {
        match self.get(key) {
            Some(Bson::Binary(crate::Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            })) => Ok(bytes),
            Some(_) => Err(ValueAccessError::UnexpectedType),
            None => Err(ValueAccessError::NotPresent),
        }
    }

    /// Returns true if the document contains an entry with the given key.
    pub fn contains_key(&self, key: impl AsRef<str>) -> bool {
        let key = key.as_ref();
        self.entries.iter().any(|(k, _)| k == key)
    }

    /// Gets a collection of keys in insertion order.
    pub fn keys(&self) -> Keys {
        Keys {
            inner: self.entries.iter(),
        }
    }

    /// Gets a collection of values in insertion order.
    pub fn values(&self) -> Values {
        Values {
            inner: self.entries.iter(),
        }
    }

    /// Returns the number of entries in the document.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the document contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sets the value of the entry with the given key.
    ///
    /// If the key is already present, the first occurrence is replaced in
    /// place and the displaced value returned; otherwise the entry is
    /// appended.
    pub fn insert(&mut self, key: impl Into<String>, val: impl Into<Bson>) -> Option<Bson> {
        self.invalidate();
        let key = key.into();
        let val = val.into();

        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, slot)) => Some(std::mem::replace(slot, val)),
            None => {
                self.entries.push((key, val));
                None
            }
        }
    }

    /// Takes the value of the entry with the first occurrence of the key out
    /// of the document.
    pub fn remove(&mut self, key: impl AsRef<str>) -> Option<Bson> {
        let key = key.as_ref();
        self.invalidate();
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    // Appends an entry without looking for an existing occurrence of the key.
    // Decoding uses this to preserve duplicate keys.
    pub(crate) fn push(&mut self, key: String, val: Bson) {
        self.invalidate();
        self.entries.push((key, val));
    }
}

impl<K: Into<String>, V: Into<Bson>> Extend<(K, V)> for Document {
    fn extend<T: IntoIterator<Item = (K, V)>>(&mut self, iter: T) {
        for (k, v) in iter {
            self.insert(k, v);
        }
    }
}
