//! Big-endian primitives for the catalog wire format.
//!
//! The format has no padding and no alignment: every value is read or
//! written in stream order at the current cursor.

use crate::ProtocolError;

/// Sequential big-endian decoder over an in-memory buffer.
///
/// Every read is bounds checked; a read that would run past the end leaves
/// the cursor untouched and reports [`ProtocolError::UnexpectedEof`].
#[derive(Clone, Debug)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ByteReader<'a> {
    /// Creates a reader positioned at the start of the buffer.
    #[must_use]
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    /// Current cursor position measured from the start of the buffer.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Number of unread bytes.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.bytes.len().saturating_sub(self.offset)
    }

    /// Advances the cursor past `count` bytes without decoding them.
    pub fn skip(&mut self, count: usize) -> Result<(), ProtocolError> {
        let _ = self.take(count)?;
        Ok(())
    }

    /// Reads `count` raw bytes.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8], ProtocolError> {
        self.take(count)
    }

    /// Reads one unsigned byte.
    pub fn read_u8(&mut self) -> Result<u8, ProtocolError> {
        Ok(self.array::<1>()?[0])
    }

    /// Reads one byte and interprets any non-zero value as `true`.
    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        Ok(self.read_u8()? != 0)
    }

    /// Reads a big-endian unsigned 16-bit integer.
    pub fn read_u16(&mut self) -> Result<u16, ProtocolError> {
        Ok(u16::from_be_bytes(self.array()?))
    }

    /// Reads a big-endian unsigned 32-bit integer.
    pub fn read_u32(&mut self) -> Result<u32, ProtocolError> {
        Ok(u32::from_be_bytes(self.array()?))
    }

    /// Reads a big-endian signed 32-bit integer.
    pub fn read_i32(&mut self) -> Result<i32, ProtocolError> {
        Ok(i32::from_be_bytes(self.array()?))
    }

    /// Reads a big-endian IEEE 754 single precision float.
    pub fn read_f32(&mut self) -> Result<f32, ProtocolError> {
        Ok(f32::from_be_bytes(self.array()?))
    }

    /// Reads a string prefixed by its big-endian 16-bit byte length.
    ///
    /// Invalid UTF-8 sequences are replaced rather than rejected; names are
    /// informational only.
    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        let length = usize::from(self.read_u16()?);
        let bytes = self.take(length)?;
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], ProtocolError> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8], ProtocolError> {
        let remaining = self.remaining();
        if count > remaining {
            return Err(ProtocolError::UnexpectedEof {
                offset: self.offset,
                needed: count,
                remaining,
            });
        }
        let start = self.offset;
        self.offset += count;
        Ok(&self.bytes[start..self.offset])
    }
}

/// Growable big-endian encoder, the inverse of [`ByteReader`].
#[derive(Clone, Debug, Default)]
pub struct ByteWriter {
    bytes: Vec<u8>,
}

impl ByteWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bytes written so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Reports whether nothing has been written yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Appends one unsigned byte.
    pub fn write_u8(&mut self, value: u8) {
        self.bytes.push(value);
    }

    /// Appends `true` as `1` and `false` as `0`.
    pub fn write_bool(&mut self, value: bool) {
        self.write_u8(u8::from(value));
    }

    /// Appends a big-endian unsigned 16-bit integer.
    pub fn write_u16(&mut self, value: u16) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian unsigned 32-bit integer.
    pub fn write_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian signed 32-bit integer.
    pub fn write_i32(&mut self, value: i32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a big-endian IEEE 754 single precision float.
    pub fn write_f32(&mut self, value: f32) {
        self.bytes.extend_from_slice(&value.to_be_bytes());
    }

    /// Appends a string prefixed by its 16-bit byte length.
    ///
    /// Strings longer than `u16::MAX` bytes are truncated at a character
    /// boundary so the prefix always matches the payload.
    pub fn write_string(&mut self, value: &str) {
        let mut end = value.len().min(usize::from(u16::MAX));
        while !value.is_char_boundary(end) {
            end -= 1;
        }
        let payload = &value.as_bytes()[..end];
        self.write_u16(payload.len() as u16);
        self.bytes.extend_from_slice(payload);
    }

    /// Consumes the writer, yielding the encoded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_big_endian_primitives_in_order() {
        let bytes = [
            0x01, 0x02, 0x03, 0xde, 0xad, 0xbe, 0xef, 0xff, 0xff, 0xff, 0xfe, 0x3f, 0x80, 0x00,
            0x00,
        ];
        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_u8().expect("u8"), 0x01);
        assert_eq!(reader.read_u16().expect("u16"), 0x0203);
        assert_eq!(reader.read_u32().expect("u32"), 0xdead_beef);
        assert_eq!(reader.read_i32().expect("i32"), -2);
        assert_eq!(reader.read_f32().expect("f32"), 1.0);
        assert_eq!(reader.remaining(), 0);
    }

    #[test]
    fn eof_reports_offset_and_keeps_cursor() {
        let bytes = [0x00, 0x01, 0x02];
        let mut reader = ByteReader::new(&bytes);
        reader.skip(1).expect("skip");
        let error = reader.read_u32().expect_err("truncated read");
        assert_eq!(
            error,
            ProtocolError::UnexpectedEof {
                offset: 1,
                needed: 4,
                remaining: 2,
            }
        );
        assert_eq!(reader.offset(), 1);
        assert_eq!(reader.read_u16().expect("u16"), 0x0102);
    }

    #[test]
    fn skip_past_end_is_eof() {
        let mut reader = ByteReader::new(&[0x00]);
        assert!(reader.skip(2).is_err());
    }

    #[test]
    fn nonzero_bytes_read_as_true() {
        let mut reader = ByteReader::new(&[0x00, 0x01, 0x7f]);
        assert!(!reader.read_bool().expect("false"));
        assert!(reader.read_bool().expect("true"));
        assert!(reader.read_bool().expect("true"));
    }

    #[test]
    fn strings_use_sixteen_bit_length_prefix() {
        let mut writer = ByteWriter::new();
        writer.write_string("Sand");
        let bytes = writer.into_bytes();
        assert_eq!(&bytes[..2], &[0x00, 0x04]);

        let mut reader = ByteReader::new(&bytes);
        assert_eq!(reader.read_string().expect("string"), "Sand");
    }

    #[test]
    fn writer_emits_big_endian_floats() {
        let mut writer = ByteWriter::new();
        writer.write_f32(1.6);
        writer.write_i32(-1);
        assert_eq!(writer.len(), 8);
        assert_eq!(
            writer.into_bytes(),
            vec![0x3f, 0xcc, 0xcc, 0xcd, 0xff, 0xff, 0xff, 0xff]
        );
    }
}
