use crate::error::{Error, Result};

/// A head-consuming view over a byte buffer.
///
/// Every read is bounds-checked against the remaining bytes and fails with
/// `InvalidBson` rather than reading past the end of the buffer.
pub(crate) struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub(crate) fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// The number of bytes not yet consumed.
    pub(crate) fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// Slices `n` bytes off the head and advances past them.
    pub(crate) fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or_else(|| Error::invalid_bson("length overflows buffer addressing"))?;
        let slice = self.bytes.get(self.pos..end).ok_or_else(|| {
            Error::invalid_bson(format!(
                "length exceeds remaining length of buffer: {} vs {}",
                n,
                self.remaining()
            ))
        })?;
        self.pos = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        // take() already sized the slice, so the conversion cannot fail
        Ok(self
            .take(N)?
            .try_into()
            .map_err(|_| Error::internal("sized take returned a wrongly sized slice"))?)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take_array::<1>()?[0])
    }

    pub(crate) fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.take_array()?))
    }

    pub(crate) fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take_array()?))
    }

    /// Reads the little-endian `i32` at the head without consuming it.
    pub(crate) fn peek_i32(&self) -> Result<i32> {
        let slice = self
            .bytes
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| Error::invalid_bson("not enough bytes for a length prefix"))?;
        // the slice is statically 4 bytes long
        Ok(i32::from_le_bytes(slice.try_into().unwrap()))
    }

    /// Consumes bytes up to the next null byte, which must exist within the
    /// remaining buffer, validates them as UTF-8, and advances past the null.
    pub(crate) fn read_cstring(&mut self) -> Result<&'a str> {
        let remainder = &self.bytes[self.pos..];
        let end = remainder
            .iter()
            .position(|b| *b == 0)
            .ok_or_else(|| Error::invalid_bson("cstring is missing its null terminator"))?;

        let s = std::str::from_utf8(&remainder[..end])
            .map_err(|_| Error::invalid_bson("cstring contains invalid UTF-8"))?;
        self.pos += end + 1;
        Ok(s)
    }

    /// Reads a length-prefixed string: an `i32` length covering the text and
    /// its null terminator, the text itself, and the terminator.
    pub(crate) fn read_string(&mut self) -> Result<&'a str> {
        let len = self.read_i32()?;
        if len < 1 {
            return Err(Error::invalid_bson(format!(
                "string length must be at least 1 to cover the null terminator, got {}",
                len
            )));
        }

        let bytes = self.take(len as usize)?;
        if bytes[len as usize - 1] != 0 {
            return Err(Error::invalid_bson("string is missing its null terminator"));
        }

        std::str::from_utf8(&bytes[..len as usize - 1])
            .map_err(|_| Error::invalid_bson("string contains invalid UTF-8"))
    }
}
