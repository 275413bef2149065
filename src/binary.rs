use std::fmt::{self, Display};

use crate::{
    error::{Error, Result},
    spec::BinarySubtype,
};

/// Represents a BSON binary value.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Binary {
    /// The subtype of the bytes.
    pub subtype: BinarySubtype,

    /// The binary bytes.
    pub bytes: Vec<u8>,
}

impl Display for Binary {
    fn fmt(&self, fmt: &mut fmt::Formatter) -> fmt::Result {
        write!(
            fmt,
            "Binary({:#x}, {})",
            u8::from(self.subtype),
            crate::base64::encode(&self.bytes)
        )
    }
}

impl fmt::Debug for Binary {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("Binary")
            .field("subtype", &self.subtype)
            .field("bytes", &crate::base64::encode(&self.bytes))
            .finish()
    }
}

impl Binary {
    /// Creates a [`Binary`] from the given bytes and subtype.
    ///
    /// The UUID subtypes require the data to be exactly 16 bytes long; any
    /// other length fails with an `InvalidArgument` error.
    pub fn new(bytes: Vec<u8>, subtype: BinarySubtype) -> Result<Self> {
        if matches!(subtype, BinarySubtype::Uuid | BinarySubtype::UuidOld) && bytes.len() != 16 {
            return Err(Error::invalid_argument(format!(
                "binary data with the {:?} subtype must be 16 bytes long, got {} byte(s)",
                subtype,
                bytes.len()
            )));
        }

        Ok(Self { subtype, bytes })
    }

    /// Creates a [`Binary`] with the `Uuid` subtype from the given UUID.
    pub fn from_uuid(uuid: uuid::Uuid) -> Self {
        Self {
            subtype: BinarySubtype::Uuid,
            bytes: uuid.as_bytes().to_vec(),
        }
    }

    /// Interprets this [`Binary`] as a UUID.
    ///
    /// Fails with an `InvalidArgument` error if the subtype is not `Uuid`.
    pub fn to_uuid(&self) -> Result<uuid::Uuid> {
        if self.subtype != BinarySubtype::Uuid {
            return Err(Error::invalid_argument(format!(
                "expected binary with the Uuid subtype, got {:?}",
                self.subtype
            )));
        }

        uuid::Uuid::from_slice(&self.bytes).map_err(|e| {
            // Binary::new rejects non-16-byte UUID data, so a Uuid-subtype
            // value built through the public surface cannot get here.
            Error::internal(format!("UUID binary data is malformed: {}", e))
        })
    }

    /// Creates a [`Binary`] from a base64 string and optional subtype. If
    /// `subtype` is `None`, the [`Binary`] defaults to
    /// [`BinarySubtype::Generic`].
    pub fn from_base64(
        input: impl AsRef<str>,
        subtype: impl Into<Option<BinarySubtype>>,
    ) -> Result<Self> {
        let bytes = crate::base64::decode(input.as_ref()).map_err(|e| {
            Error::invalid_argument(format!("failed to decode base64 string: {}", e))
        })?;
        let subtype = subtype.into().unwrap_or(BinarySubtype::Generic);
        Binary::new(bytes, subtype)
    }
}

impl From<uuid::Uuid> for Binary {
    fn from(uuid: uuid::Uuid) -> Self {
        Binary::from_uuid(uuid)
    }
}
