use std::fmt;

use byteorder::{ByteOrder, LittleEndian};
use serde::Serialize;

use crate::error::{ACTUAL_BYTES_LEN, DecodeError, TextError};

/// Length-prefixed, NUL-terminated text as stored in the files.
///
/// `declared_len` is the on-disk length including the terminator; material
/// version detection depends on it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SizedString {
    pub text: String,
    pub declared_len: u32,
}

impl SizedString {
    /// Builds the value a well-formed file would carry for `text`.
    pub fn new(text: impl Into<String>) -> Self {
        let text = text.into();
        let declared_len = u32::try_from(text.len() + 1).unwrap_or(u32::MAX);
        SizedString { text, declared_len }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl fmt::Display for SizedString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

/// Little-endian reader over a model buffer. A failed read leaves the
/// position where it was.
#[derive(Debug, Clone)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        ByteCursor { bytes, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    pub fn read_bytes(&mut self, len: usize, expected: &'static str) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::Bounds {
                offset: self.pos,
                expected,
                wanted: len,
                remaining: self.remaining(),
                actual: self.snapshot(self.pos),
            });
        }
        let start = self.pos;
        self.pos += len;
        Ok(&self.bytes[start..self.pos])
    }

    pub fn read_u8(&mut self, expected: &'static str) -> Result<u8, DecodeError> {
        Ok(self.read_bytes(1, expected)?[0])
    }

    pub fn read_u16(&mut self, expected: &'static str) -> Result<u16, DecodeError> {
        Ok(LittleEndian::read_u16(self.read_bytes(2, expected)?))
    }

    pub fn read_u32(&mut self, expected: &'static str) -> Result<u32, DecodeError> {
        Ok(LittleEndian::read_u32(self.read_bytes(4, expected)?))
    }

    pub fn read_f32(&mut self, expected: &'static str) -> Result<f32, DecodeError> {
        Ok(LittleEndian::read_f32(self.read_bytes(4, expected)?))
    }

    pub fn read_f32_array<const N: usize>(
        &mut self,
        expected: &'static str,
    ) -> Result<[f32; N], DecodeError> {
        let raw = self.read_bytes(N * 4, expected)?;
        let mut values = [0.0f32; N];
        LittleEndian::read_f32_into(raw, &mut values);
        Ok(values)
    }

    pub fn read_u32_array<const N: usize>(
        &mut self,
        expected: &'static str,
    ) -> Result<[u32; N], DecodeError> {
        let raw = self.read_bytes(N * 4, expected)?;
        let mut values = [0u32; N];
        LittleEndian::read_u32_into(raw, &mut values);
        Ok(values)
    }

    pub fn read_u16_array<const N: usize>(
        &mut self,
        expected: &'static str,
    ) -> Result<[u16; N], DecodeError> {
        let raw = self.read_bytes(N * 2, expected)?;
        let mut values = [0u16; N];
        LittleEndian::read_u16_into(raw, &mut values);
        Ok(values)
    }

    /// Three unsigned bytes in R, G, B order.
    pub fn read_rgb24(&mut self, expected: &'static str) -> Result<[u8; 3], DecodeError> {
        let raw = self.read_bytes(3, expected)?;
        Ok([raw[0], raw[1], raw[2]])
    }

    /// Four 32-bit floats in R, G, B, A order.
    pub fn read_rgba32f(&mut self, expected: &'static str) -> Result<[f32; 4], DecodeError> {
        self.read_f32_array::<4>(expected)
    }

    /// Reads a u32 element count.
    pub fn read_count(&mut self, expected: &'static str) -> Result<usize, DecodeError> {
        let offset = self.pos;
        let raw = self.read_u32(expected)?;
        usize::try_from(raw).map_err(|_| {
            self.pos = offset;
            self.format_error(offset, expected, format!("count {raw} does not fit usize"))
        })
    }

    /// Reads a u32 length followed by that many raw bytes.
    pub fn read_sized_bytes(&mut self, expected: &'static str) -> Result<&'a [u8], DecodeError> {
        let start = self.pos;
        let len = self.read_count(expected)?;
        self.read_bytes(len, expected).inspect_err(|_| self.pos = start)
    }

    pub fn read_sized_string(&mut self, expected: &'static str) -> Result<SizedString, DecodeError> {
        let start = self.pos;
        let raw = self.read_sized_bytes(expected)?;
        let text = decode_text(raw, start + 4, expected).inspect_err(|_| self.pos = start)?;
        Ok(SizedString {
            text,
            declared_len: raw.len() as u32,
        })
    }

    /// Reads `count` elements of roughly `element_size` bytes each.
    ///
    /// The up-front reservation never exceeds what the rest of the buffer
    /// could hold, so an absurd count fails with a bounds error instead of a
    /// huge allocation.
    pub fn read_list<T>(
        &mut self,
        count: usize,
        element_size: usize,
        mut read: impl FnMut(&mut Self) -> Result<T, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let start = self.pos;
        let mut values = Vec::with_capacity(self.capacity_hint(count, element_size));
        for _ in 0..count {
            match read(self) {
                Ok(value) => values.push(value),
                Err(err) => {
                    self.pos = start;
                    return Err(err);
                }
            }
        }
        Ok(values)
    }

    pub fn capacity_hint(&self, count: usize, element_size: usize) -> usize {
        count.min(self.remaining() / element_size.max(1))
    }

    /// Builds a format error pointing at `offset`, which must be a position
    /// this cursor has already passed or is at.
    pub fn format_error(
        &self,
        offset: usize,
        expected: &'static str,
        detail: impl Into<String>,
    ) -> DecodeError {
        DecodeError::Format {
            offset,
            expected,
            detail: detail.into(),
            actual: self.snapshot(offset),
        }
    }

    fn snapshot(&self, offset: usize) -> Vec<u8> {
        let start = offset.min(self.bytes.len());
        let end = (start + ACTUAL_BYTES_LEN).min(self.bytes.len());
        self.bytes[start..end].to_vec()
    }
}

/// Decodes the raw bytes of a sized string. The final byte must be NUL and is
/// dropped; the rest must be UTF-8.
pub fn decode_text(raw: &[u8], offset: usize, expected: &'static str) -> Result<String, DecodeError> {
    let text_error = |source: TextError| DecodeError::Text {
        offset,
        expected,
        source,
        actual: raw[..raw.len().min(ACTUAL_BYTES_LEN)].to_vec(),
    };
    let Some((&0, body)) = raw.split_last() else {
        return Err(text_error(TextError::MissingTerminator));
    };
    let text = std::str::from_utf8(body).map_err(|err| text_error(err.into()))?;
    Ok(text.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sized(text: &[u8]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&(text.len() as u32).to_le_bytes());
        data.extend_from_slice(text);
        data
    }

    #[test]
    fn reads_little_endian_scalars_in_order() {
        let mut data = Vec::new();
        data.push(0x7f);
        data.extend_from_slice(&0xBEEFu16.to_le_bytes());
        data.extend_from_slice(&0xDEADBEEFu32.to_le_bytes());
        data.extend_from_slice(&1.5f32.to_le_bytes());

        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_u8("byte").unwrap(), 0x7f);
        assert_eq!(cursor.read_u16("short").unwrap(), 0xBEEF);
        assert_eq!(cursor.read_u32("word").unwrap(), 0xDEADBEEF);
        assert_eq!(cursor.read_f32("float").unwrap(), 1.5);
        assert!(cursor.is_exhausted());
    }

    #[test]
    fn reads_vectors_and_colors() {
        let mut data = Vec::new();
        for value in [1.0f32, 2.0, 3.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        for value in [7u16, 8, 9] {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data.extend_from_slice(&[10, 20, 30]);
        for value in [0.25f32, 0.5, 0.75, 1.0] {
            data.extend_from_slice(&value.to_le_bytes());
        }

        let mut cursor = ByteCursor::new(&data);
        assert_eq!(cursor.read_f32_array::<3>("vec3").unwrap(), [1.0, 2.0, 3.0]);
        assert_eq!(cursor.read_u16_array::<3>("indices").unwrap(), [7, 8, 9]);
        assert_eq!(cursor.read_rgb24("color").unwrap(), [10, 20, 30]);
        assert_eq!(cursor.read_rgba32f("color").unwrap(), [0.25, 0.5, 0.75, 1.0]);
    }

    #[test]
    fn overrun_reports_offset_and_does_not_advance() {
        let data = [1u8, 2, 3, 4, 5, 6];
        let mut cursor = ByteCursor::new(&data);
        cursor.read_u32("first").unwrap();

        let err = cursor.read_u32("second word").unwrap_err();
        match &err {
            DecodeError::Bounds {
                offset,
                wanted,
                remaining,
                ..
            } => {
                assert_eq!(*offset, 4);
                assert_eq!(*wanted, 4);
                assert_eq!(*remaining, 2);
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(err.expected(), "second word");
        assert_eq!(err.actual(), &[5, 6]);
        assert_eq!(cursor.position(), 4);
    }

    #[test]
    fn sized_string_drops_terminator() {
        let data = sized(b"RSB_MODEL_START\0");
        let mut cursor = ByteCursor::new(&data);
        let text = cursor.read_sized_string("header").unwrap();
        assert_eq!(text.as_str(), "RSB_MODEL_START");
        assert_eq!(text.declared_len, 16);
        assert_eq!(text, SizedString::new("RSB_MODEL_START"));
    }

    #[test]
    fn sized_string_without_terminator_is_rejected() {
        let data = sized(b"abc");
        let err = ByteCursor::new(&data).read_sized_string("name").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Text {
                offset: 4,
                source: TextError::MissingTerminator,
                ..
            }
        ));

        let empty = sized(b"");
        let err = ByteCursor::new(&empty).read_sized_string("name").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Text {
                source: TextError::MissingTerminator,
                ..
            }
        ));
    }

    #[test]
    fn sized_string_with_invalid_utf8_is_rejected() {
        let data = sized(&[0xff, 0xfe, 0x00]);
        let err = ByteCursor::new(&data).read_sized_string("name").unwrap_err();
        assert!(matches!(
            err,
            DecodeError::Text {
                source: TextError::InvalidUtf8(_),
                ..
            }
        ));
    }

    #[test]
    fn sized_string_longer_than_buffer_is_a_bounds_error() {
        let mut data = Vec::new();
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(b"short\0");
        let err = ByteCursor::new(&data).read_sized_string("name").unwrap_err();
        assert!(matches!(err, DecodeError::Bounds { wanted: 100, .. }));
    }

    #[test]
    fn failed_sized_reads_keep_the_length_prefix_unread() {
        let mut data = Vec::new();
        data.extend_from_slice(&100u32.to_le_bytes());
        data.extend_from_slice(b"short\0");
        let mut cursor = ByteCursor::new(&data);
        cursor.read_sized_bytes("blob").unwrap_err();
        assert_eq!(cursor.position(), 0);
        cursor.read_sized_string("name").unwrap_err();
        assert_eq!(cursor.position(), 0);

        let bad_text = sized(&[0xff, 0x00]);
        let mut cursor = ByteCursor::new(&bad_text);
        cursor.read_sized_string("name").unwrap_err();
        assert_eq!(cursor.position(), 0);
        // The length prefix is still there to read.
        assert_eq!(cursor.read_u32("length").unwrap(), 2);
    }

    #[test]
    fn failed_list_rewinds_to_its_start() {
        let mut data = Vec::new();
        data.extend_from_slice(&1u32.to_le_bytes());
        data.extend_from_slice(&2u32.to_le_bytes());
        let mut cursor = ByteCursor::new(&data);
        cursor
            .read_list(3, 4, |cursor| cursor.read_u32("value"))
            .unwrap_err();
        assert_eq!(cursor.position(), 0);
    }

    #[test]
    fn huge_counts_do_not_preallocate() {
        let mut data = Vec::new();
        data.extend_from_slice(&u32::MAX.to_le_bytes());
        data.extend_from_slice(&[0u8; 8]);
        let mut cursor = ByteCursor::new(&data);
        let count = cursor.read_count("count").unwrap();
        assert_eq!(cursor.capacity_hint(count, 4), 2);
        let err = cursor
            .read_list(count, 4, |cursor| cursor.read_u32("value"))
            .unwrap_err();
        assert!(matches!(err, DecodeError::Bounds { offset: 12, .. }));
    }
}
