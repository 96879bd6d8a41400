//! Primitive wire encodings: little-endian fixed-width integers, unsigned
//! LEB128 varints, and fixed or varint-prefixed byte strings.
//!
//! `Reader` bounds-checks every read before handing off to `bytes::Buf`, so a
//! short buffer surfaces as `BufferTooShort` instead of a panic.

use crate::error::CodecError;
use bytes::{Buf, BufMut, BytesMut};

/// Longest LEB128 encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

/// Cursor over an input byte slice.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    buf: &'a [u8],
    consumed: usize,
}

impl<'a> Reader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, consumed: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Bytes consumed so far.
    pub fn position(&self) -> usize {
        self.consumed
    }

    fn ensure(&self, needed: usize) -> Result<(), CodecError> {
        if self.buf.remaining() < needed {
            return Err(CodecError::BufferTooShort {
                needed,
                remaining: self.buf.remaining(),
            });
        }
        Ok(())
    }

    fn advance_by(&mut self, n: usize) {
        self.consumed += n;
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        self.ensure(1)?;
        self.advance_by(1);
        Ok(self.buf.get_u8())
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        self.ensure(2)?;
        self.advance_by(2);
        Ok(self.buf.get_u16_le())
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        self.ensure(4)?;
        self.advance_by(4);
        Ok(self.buf.get_u32_le())
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        self.ensure(8)?;
        self.advance_by(8);
        Ok(self.buf.get_u64_le())
    }

    pub fn read_i8(&mut self) -> Result<i8, CodecError> {
        self.ensure(1)?;
        self.advance_by(1);
        Ok(self.buf.get_i8())
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        self.ensure(2)?;
        self.advance_by(2);
        Ok(self.buf.get_i16_le())
    }

    pub fn read_i32(&mut self) -> Result<i32, CodecError> {
        self.ensure(4)?;
        self.advance_by(4);
        Ok(self.buf.get_i32_le())
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        self.ensure(8)?;
        self.advance_by(8);
        Ok(self.buf.get_i64_le())
    }

    /// Decode an unsigned LEB128 varint.
    ///
    /// An empty buffer is a short buffer. Running out of input while the
    /// continuation bit is set is a malformed varint.
    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        self.ensure(1)?;
        let mut result: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            if self.buf.is_empty() {
                return Err(CodecError::MalformedVarint);
            }
            let byte = self.buf.get_u8();
            self.advance_by(1);

            let low = u64::from(byte & 0x7f);
            let shift = 7 * i as u32;
            // 10th byte may only carry the top bit of a u64
            if i == MAX_VARINT_LEN - 1 && low > 1 {
                return Err(CodecError::MalformedVarint);
            }
            result |= low << shift;
            if byte & 0x80 == 0 {
                return Ok(result);
            }
        }
        Err(CodecError::MalformedVarint)
    }

    /// Read exactly `len` raw bytes.
    pub fn read_bytes(&mut self, len: usize) -> Result<Vec<u8>, CodecError> {
        self.ensure(len)?;
        self.advance_by(len);
        let out = self.buf[..len].to_vec();
        self.buf.advance(len);
        Ok(out)
    }

    /// Read a varint length followed by that many bytes.
    pub fn read_prefixed_bytes(&mut self) -> Result<Vec<u8>, CodecError> {
        let len = self.read_length()?;
        self.read_bytes(len)
    }

    /// Read `len` bytes and validate them as UTF-8.
    pub fn read_string(&mut self, len: usize) -> Result<String, CodecError> {
        let raw = self.read_bytes(len)?;
        Ok(String::from_utf8(raw)?)
    }

    pub fn read_prefixed_string(&mut self) -> Result<String, CodecError> {
        let len = self.read_length()?;
        self.read_string(len)
    }

    /// Varint length prefix, clamped so a hostile prefix cannot exceed `usize`.
    pub fn read_length(&mut self) -> Result<usize, CodecError> {
        let len = self.read_varint()?;
        usize::try_from(len).map_err(|_| CodecError::BufferTooShort {
            needed: usize::MAX,
            remaining: self.remaining(),
        })
    }
}

/// Growable output buffer.
#[derive(Debug, Default)]
pub struct Writer {
    buf: BytesMut,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn write_u8(&mut self, v: u8) {
        self.buf.put_u8(v);
    }

    pub fn write_u16(&mut self, v: u16) {
        self.buf.put_u16_le(v);
    }

    pub fn write_u32(&mut self, v: u32) {
        self.buf.put_u32_le(v);
    }

    pub fn write_u64(&mut self, v: u64) {
        self.buf.put_u64_le(v);
    }

    pub fn write_i8(&mut self, v: i8) {
        self.buf.put_i8(v);
    }

    pub fn write_i16(&mut self, v: i16) {
        self.buf.put_i16_le(v);
    }

    pub fn write_i32(&mut self, v: i32) {
        self.buf.put_i32_le(v);
    }

    pub fn write_i64(&mut self, v: i64) {
        self.buf.put_i64_le(v);
    }

    /// Encode an unsigned LEB128 varint.
    pub fn write_varint(&mut self, mut v: u64) {
        loop {
            let byte = (v & 0x7f) as u8;
            v >>= 7;
            if v == 0 {
                self.buf.put_u8(byte);
                break;
            }
            self.buf.put_u8(byte | 0x80);
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.put_slice(bytes);
    }

    pub fn write_prefixed_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.write_bytes(bytes);
    }

    pub fn write_prefixed_str(&mut self, s: &str) {
        self.write_prefixed_bytes(s.as_bytes());
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.buf.to_vec()
    }
}
