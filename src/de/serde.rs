use std::fmt;

use serde::de::{
    self,
    Deserialize,
    DeserializeSeed,
    EnumAccess,
    Error as _,
    MapAccess,
    SeqAccess,
    Unexpected,
    VariantAccess,
    Visitor,
};

use crate::{
    bson::Bson,
    binary::Binary,
    datetime::DateTime,
    document::Document,
    error::{Error, Result},
    oid::ObjectId,
    spec::BinarySubtype,
};

pub(crate) struct BsonVisitor;

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer
            .deserialize_any(BsonVisitor)
            .and_then(|bson| match bson {
                Bson::String(oid) => ObjectId::parse_str(&oid).map_err(de::Error::custom),
                Bson::ObjectId(oid) => Ok(oid),
                _ => {
                    let err = format!(
                        "expected objectId extended document or hex string, found {}",
                        bson
                    );
                    Err(de::Error::invalid_type(Unexpected::Map, &&err[..]))
                }
            })
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_map(BsonVisitor).and_then(|bson| {
            if let Bson::Document(doc) = bson {
                Ok(doc)
            } else {
                let err = format!("expected document, found extended JSON data type: {}", bson);
                Err(de::Error::invalid_type(Unexpected::Map, &&err[..]))
            }
        })
    }
}

impl<'de> Deserialize<'de> for DateTime {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer
            .deserialize_any(BsonVisitor)
            .and_then(|bson| match bson {
                Bson::DateTime(dt) => Ok(dt),
                _ => {
                    let err = format!("expected datetime extended document, found {}", bson);
                    Err(de::Error::invalid_type(Unexpected::Map, &&err[..]))
                }
            })
    }
}

impl<'de> Deserialize<'de> for Bson {
    #[inline]
    fn deserialize<D>(deserializer: D) -> std::result::Result<Bson, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(BsonVisitor)
    }
}

impl<'de> Visitor<'de> for BsonVisitor {
    type Value = Bson;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("expecting a Bson")
    }

    #[inline]
    fn visit_bool<E>(self, value: bool) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Boolean(value))
    }

    #[inline]
    fn visit_i8<E>(self, value: i8) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Int32(value as i32))
    }

    #[inline]
    fn visit_u8<E>(self, value: u8) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Int32(value as i32))
    }

    #[inline]
    fn visit_i16<E>(self, value: i16) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Int32(value as i32))
    }

    #[inline]
    fn visit_u16<E>(self, value: u16) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Int32(value as i32))
    }

    #[inline]
    fn visit_i32<E>(self, value: i32) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Int32(value))
    }

    #[inline]
    fn visit_u32<E>(self, value: u32) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Int64(value as i64))
    }

    #[inline]
    fn visit_i64<E>(self, value: i64) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        Ok(Bson::Int64(value))
    }

    #[inline]
    fn visit_u64<E>(self, value: u64) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        match i64::try_from(value) {
            Ok(value) => Ok(Bson::Int64(value)),
            Err(_) => Err(E::custom(format!(
                "cannot represent {} as a signed BSON integer",
                value
            ))),
        }
    }

    #[inline]
    fn visit_f64<E>(self, value: f64) -> std::result::Result<Bson, E> {
        Ok(Bson::Double(value))
    }

    #[inline]
    fn visit_str<E>(self, value: &str) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        self.visit_string(value.to_string())
    }

    #[inline]
    fn visit_string<E>(self, value: String) -> std::result::Result<Bson, E> {
        Ok(Bson::String(value))
    }

    #[inline]
    fn visit_bytes<E>(self, value: &[u8]) -> std::result::Result<Bson, E>
    where
        E: de::Error,
    {
        self.visit_byte_buf(value.to_vec())
    }

    #[inline]
    fn visit_byte_buf<E>(self, value: Vec<u8>) -> std::result::Result<Bson, E> {
        Ok(Bson::Binary(Binary {
            subtype: BinarySubtype::Generic,
            bytes: value,
        }))
    }

    #[inline]
    fn visit_none<E>(self) -> std::result::Result<Bson, E> {
        Ok(Bson::Null)
    }

    #[inline]
    fn visit_some<D>(self, deserializer: D) -> std::result::Result<Bson, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        deserializer.deserialize_any(self)
    }

    #[inline]
    fn visit_unit<E>(self) -> std::result::Result<Bson, E> {
        Ok(Bson::Null)
    }

    #[inline]
    fn visit_seq<V>(self, mut visitor: V) -> std::result::Result<Bson, V::Error>
    where
        V: SeqAccess<'de>,
    {
        let mut values = Vec::new();
        while let Some(elem) = visitor.next_element()? {
            values.push(elem);
        }
        Ok(Bson::Array(values))
    }

    #[inline]
    fn visit_map<V>(self, mut visitor: V) -> std::result::Result<Bson, V::Error>
    where
        V: MapAccess<'de>,
    {
        let mut doc = Document::new();
        while let Some((key, value)) = visitor.next_entry::<String, Bson>()? {
            doc.insert(key, value);
        }
        Ok(Bson::from_extended_document(doc))
    }
}

/// Serde Deserializer
pub struct Deserializer {
    value: Option<Bson>,
}

impl Deserializer {
    /// Construct a new `Deserializer` over the given value.
    pub fn new(value: Bson) -> Deserializer {
        Deserializer { value: Some(value) }
    }
}

impl<'de> de::Deserializer<'de> for Deserializer {
    type Error = Error;

    // The match arms are ordered to pin the resolution priority for targets
    // that accept any value.
    fn deserialize_any<V>(mut self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let value = match self.value.take() {
            Some(value) => value,
            None => return Err(Error::internal("deserializer value already consumed")),
        };

        match value {
            Bson::Null => visitor.visit_unit(),
            Bson::String(v) => visitor.visit_string(v),
            Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes,
            }) => visitor.visit_byte_buf(bytes),
            binary @ Bson::Binary(..) => {
                let doc = binary.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            oid @ Bson::ObjectId(..) => {
                let doc = oid.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            Bson::Boolean(v) => visitor.visit_bool(v),
            regex @ Bson::RegularExpression(..) => {
                let doc = regex.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            code @ Bson::JavaScriptCodeWithScope(..) => {
                let doc = code.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            Bson::Int32(v) => visitor.visit_i32(v),
            Bson::Int64(v) => visitor.visit_i64(v),
            Bson::Double(v) => visitor.visit_f64(v),
            min_key @ Bson::MinKey => {
                let doc = min_key.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            max_key @ Bson::MaxKey => {
                let doc = max_key.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            Bson::Document(v) => visitor.visit_map(MapDeserializer::new(v)),
            timestamp @ Bson::Timestamp(..) => {
                let doc = timestamp.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            undefined @ Bson::Undefined => {
                let doc = undefined.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            pointer @ Bson::DbPointer(..) => {
                let doc = pointer.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            code @ Bson::JavaScriptCode(..) => {
                let doc = code.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            symbol @ Bson::Symbol(..) => {
                let doc = symbol.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            datetime @ Bson::DateTime(..) => {
                let doc = datetime.to_extended_document();
                visitor.visit_map(MapDeserializer::new(doc))
            }
            Bson::Array(v) => {
                let len = v.len();
                visitor.visit_seq(SeqDeserializer {
                    iter: v.into_iter(),
                    index: 0,
                    len,
                })
            }
        }
    }

    #[inline]
    fn deserialize_option<V>(self, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        match self.value {
            Some(Bson::Null) => visitor.visit_none(),
            Some(_) => visitor.visit_some(self),
            None => Err(Error::internal("deserializer value already consumed")),
        }
    }

    #[inline]
    fn deserialize_enum<V>(
        mut self,
        _name: &str,
        _variants: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let value = match self.value.take() {
            Some(Bson::Document(value)) => value,
            Some(Bson::String(variant)) => {
                return visitor.visit_enum(EnumDeserializer {
                    val: Bson::String(variant),
                    deserializer: VariantDeserializer { val: None },
                });
            }
            Some(v) => {
                return Err(Error::type_mismatch(format!(
                    "expected an enum, got {:?}",
                    v.element_type()
                )));
            }
            None => return Err(Error::internal("deserializer value already consumed")),
        };

        let mut iter = value.into_iter();

        let (variant, value) = match iter.next() {
            Some(v) => v,
            None => {
                return Err(Error::invalid_value(
                    Unexpected::Other("empty document"),
                    &"variant name",
                ))
            }
        };

        // enums are encoded as maps with a single key:value pair
        match iter.next() {
            Some((k, _)) => Err(Error::invalid_value(
                Unexpected::Map,
                &format!("expected map with a single key, got extra key \"{}\"", k).as_str(),
            )),
            None => visitor.visit_enum(EnumDeserializer {
                val: Bson::String(variant),
                deserializer: VariantDeserializer { val: Some(value) },
            }),
        }
    }

    #[inline]
    fn deserialize_newtype_struct<V>(self, _name: &'static str, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        visitor.visit_newtype_struct(self)
    }

    serde::forward_to_deserialize_any! {
        bool u8 u16 u32 u64 i8 i16 i32 i64 f32 f64 char str string unit seq
        bytes byte_buf map unit_struct tuple_struct struct tuple identifier
        ignored_any
    }
}

struct EnumDeserializer {
    val: Bson,
    deserializer: VariantDeserializer,
}

impl<'de> EnumAccess<'de> for EnumDeserializer {
    type Error = Error;
    type Variant = VariantDeserializer;

    fn variant_seed<V>(self, seed: V) -> Result<(V::Value, Self::Variant)>
    where
        V: DeserializeSeed<'de>,
    {
        let variant = seed.deserialize(Deserializer::new(self.val))?;
        Ok((variant, self.deserializer))
    }
}

struct VariantDeserializer {
    val: Option<Bson>,
}

impl<'de> VariantAccess<'de> for VariantDeserializer {
    type Error = Error;

    fn unit_variant(mut self) -> Result<()> {
        match self.val.take() {
            None => Ok(()),
            Some(val) => {
                Bson::deserialize(Deserializer::new(val)).map(|_| ())
            }
        }
    }

    fn newtype_variant_seed<T>(mut self, seed: T) -> Result<T::Value>
    where
        T: DeserializeSeed<'de>,
    {
        let val = self
            .val
            .take()
            .ok_or_else(|| Error::type_mismatch("expected a newtype variant"))?;
        seed.deserialize(Deserializer::new(val))
    }

    fn tuple_variant<V>(mut self, _len: usize, visitor: V) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let val = self
            .val
            .take()
            .ok_or_else(|| Error::type_mismatch("expected a tuple variant"))?;
        de::Deserializer::deserialize_any(Deserializer::new(val), visitor)
    }

    fn struct_variant<V>(
        mut self,
        _fields: &'static [&'static str],
        visitor: V,
    ) -> Result<V::Value>
    where
        V: Visitor<'de>,
    {
        let val = self
            .val
            .take()
            .ok_or_else(|| Error::type_mismatch("expected a struct variant"))?;
        de::Deserializer::deserialize_any(Deserializer::new(val), visitor)
    }
}

struct SeqDeserializer {
    iter: std::vec::IntoIter<Bson>,
    index: usize,
    len: usize,
}

impl<'de> SeqAccess<'de> for SeqDeserializer {
    type Error = Error;

    fn next_element_seed<T>(&mut self, seed: T) -> Result<Option<T::Value>>
    where
        T: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            None => Ok(None),
            Some(value) => {
                let index = self.index;
                self.index += 1;
                seed.deserialize(Deserializer::new(value))
                    .map(Some)
                    .map_err(|e| e.with_index(index))
            }
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len)
    }
}

struct MapDeserializer {
    iter: crate::document::IntoIter,
    value: Option<Bson>,
    key: Option<String>,
    len: usize,
}

impl MapDeserializer {
    fn new(doc: Document) -> Self {
        let len = doc.len();
        MapDeserializer {
            iter: doc.into_iter(),
            value: None,
            key: None,
            len,
        }
    }
}

impl<'de> MapAccess<'de> for MapDeserializer {
    type Error = Error;

    fn next_key_seed<K>(&mut self, seed: K) -> Result<Option<K::Value>>
    where
        K: DeserializeSeed<'de>,
    {
        match self.iter.next() {
            None => Ok(None),
            Some((key, value)) => {
                self.value = Some(value);
                self.key = Some(key.clone());
                seed.deserialize(Deserializer::new(Bson::String(key))).map(Some)
            }
        }
    }

    fn next_value_seed<V>(&mut self, seed: V) -> Result<V::Value>
    where
        V: DeserializeSeed<'de>,
    {
        let value = self
            .value
            .take()
            .ok_or_else(|| Error::internal("map value requested before its key"))?;
        let result = seed.deserialize(Deserializer::new(value));
        match self.key.take() {
            Some(key) => result.map_err(|e| e.with_key(key)),
            None => result,
        }
    }

    fn size_hint(&self) -> Option<usize> {
        Some(self.len)
    }
}
