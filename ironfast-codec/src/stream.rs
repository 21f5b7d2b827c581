/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Stop-bit encoded primitives.
//!
//! Every byte carries 7 payload bits; bit 7 is set on the last byte of a
//! value. Nullable integers are shifted by one so that `0x80` is null.
//!
//! - [`FastReader`]: pulls primitives byte by byte from any [`Read`] source
//! - [`FastWriter`]: appends primitives to a reusable [`BytesMut`] buffer

use crate::config::CodecConfig;
use crate::pmap::PresenceMap;
use bytes::{BufMut, BytesMut};
use ironfast_core::{FastError, Result};
use smallvec::SmallVec;
use std::io::Read;

/// Maximum bytes of a 64-bit stop-bit integer (nullable `u64::MAX` needs all ten).
pub const MAX_INTEGER_BYTES: usize = 10;

const STOP_BIT: u8 = 0x80;
const PAYLOAD: u8 = 0x7F;
const SIGN_BIT: u8 = 0x40;

/// Stop-bit primitive reader.
///
/// Reads one byte at a time; wrap unbuffered sources in a `BufReader`.
#[derive(Debug)]
pub struct FastReader<R> {
    inner: R,
    consumed: usize,
    strict: bool,
    max_field_len: usize,
    max_pmap_bytes: usize,
}

impl<R: Read> FastReader<R> {
    /// Creates a reader with the default configuration.
    #[must_use]
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, &CodecConfig::default())
    }

    /// Creates a reader honouring the strictness and limits of `config`.
    #[must_use]
    pub fn with_config(inner: R, config: &CodecConfig) -> Self {
        Self {
            inner,
            consumed: 0,
            strict: config.strict,
            max_field_len: config.max_field_len,
            max_pmap_bytes: config.max_pmap_bytes,
        }
    }

    /// Returns the number of bytes consumed so far.
    #[inline]
    #[must_use]
    pub const fn consumed(&self) -> usize {
        self.consumed
    }

    /// Returns the underlying source.
    pub fn into_inner(self) -> R {
        self.inner
    }

    #[inline]
    fn read_byte(&mut self) -> Result<u8> {
        let mut byte = [0u8; 1];
        self.inner.read_exact(&mut byte)?;
        self.consumed += 1;
        Ok(byte[0])
    }

    /// Reads the raw groups of one stop-bit value (at most `limit` bytes).
    fn read_groups(&mut self, limit: usize, overflow: FastError) -> Result<SmallVec<[u8; 10]>> {
        let mut groups = SmallVec::new();
        loop {
            if groups.len() == limit {
                return Err(overflow);
            }
            let byte = self.read_byte()?;
            groups.push(byte);
            if byte & STOP_BIT != 0 {
                return Ok(groups);
            }
        }
    }

    /// Reads an unsigned stop-bit integer without the nullable shift.
    fn read_uint_raw(&mut self) -> Result<u128> {
        let groups = self.read_groups(MAX_INTEGER_BYTES, FastError::IntegerOverflow)?;
        if self.strict && groups.len() > 1 && groups[0] == 0 {
            return Err(FastError::OverlongInteger);
        }
        Ok(groups
            .iter()
            .fold(0u128, |acc, b| (acc << 7) | u128::from(b & PAYLOAD)))
    }

    /// Reads a signed stop-bit integer without the nullable shift.
    fn read_int_raw(&mut self) -> Result<i128> {
        let groups = self.read_groups(MAX_INTEGER_BYTES, FastError::IntegerOverflow)?;
        if self.strict && groups.len() > 1 {
            let (first, second) = (groups[0] & PAYLOAD, groups[1] & SIGN_BIT);
            if (first == 0 && second == 0) || (first == PAYLOAD && second != 0) {
                return Err(FastError::OverlongInteger);
            }
        }
        let seed: i128 = if groups[0] & SIGN_BIT != 0 { -1 } else { 0 };
        Ok(groups
            .iter()
            .fold(seed, |acc, b| (acc << 7) | i128::from(b & PAYLOAD)))
    }

    /// Reads an unsigned integer.
    ///
    /// # Arguments
    /// * `nullable` - Whether `0x80` means null and other values are shifted by one
    ///
    /// # Returns
    /// `None` for null.
    ///
    /// # Errors
    /// Returns `FastError::IntegerOverflow` if the value exceeds 64 bits.
    pub fn read_uint(&mut self, nullable: bool) -> Result<Option<u64>> {
        let raw = self.read_uint_raw()?;
        let value = match (nullable, raw) {
            (true, 0) => return Ok(None),
            (true, v) => v - 1,
            (false, v) => v,
        };
        u64::try_from(value)
            .map(Some)
            .map_err(|_| FastError::IntegerOverflow)
    }

    /// Reads a signed integer of up to 65 significant bits.
    ///
    /// Delta differences between 64-bit values need the extra bit.
    ///
    /// # Errors
    /// Returns `FastError::IntegerOverflow` if the encoding exceeds ten bytes.
    pub fn read_int_wide(&mut self, nullable: bool) -> Result<Option<i128>> {
        let raw = self.read_int_raw()?;
        Ok(match (nullable, raw) {
            (true, 0) => None,
            (true, v) if v > 0 => Some(v - 1),
            (_, v) => Some(v),
        })
    }

    /// Reads a signed 64-bit integer.
    ///
    /// # Errors
    /// Returns `FastError::IntegerOverflow` if the value exceeds 64 bits.
    pub fn read_int(&mut self, nullable: bool) -> Result<Option<i64>> {
        self.read_int_wide(nullable)?
            .map(|v| i64::try_from(v).map_err(|_| FastError::IntegerOverflow))
            .transpose()
    }

    /// Reads an ASCII string.
    ///
    /// Mandatory: `80` is `""`, `00 80` is `"\0"`.
    /// Nullable: `80` is null, `00 80` is `""`, `00 00 80` is `"\0"`.
    /// Any other encoding starting with `00` is overlong.
    ///
    /// # Errors
    /// Returns `FastError::OverlongString` or `FastError::FieldTooLong`.
    pub fn read_ascii(&mut self, nullable: bool) -> Result<Option<String>> {
        let mut bytes = Vec::new();
        loop {
            let byte = self.read_byte()?;
            bytes.push(byte & PAYLOAD);
            if bytes.len() > self.max_field_len {
                return Err(FastError::FieldTooLong {
                    len: bytes.len() as u64,
                    max: self.max_field_len,
                });
            }
            if byte & STOP_BIT != 0 {
                break;
            }
        }

        let value: &[u8] = match (nullable, bytes.as_slice()) {
            (true, [0]) => return Ok(None),
            (false, [0]) | (true, [0, 0]) => &[],
            (false, [0, 0]) | (true, [0, 0, 0]) => &[0],
            (_, [0, ..]) => return Err(FastError::OverlongString),
            (_, other) => other,
        };
        // every byte is masked to 7 bits
        Ok(Some(value.iter().map(|b| char::from(*b)).collect()))
    }

    /// Reads a length-prefixed byte vector.
    ///
    /// # Errors
    /// Returns `FastError::FieldTooLong` if the declared length exceeds the limit.
    pub fn read_bytes(&mut self, nullable: bool) -> Result<Option<Vec<u8>>> {
        let Some(len) = self.read_uint(nullable)? else {
            return Ok(None);
        };
        if len > self.max_field_len as u64 {
            return Err(FastError::FieldTooLong {
                len,
                max: self.max_field_len,
            });
        }
        // bounded by max_field_len
        let mut bytes = vec![0u8; len as usize];
        self.inner.read_exact(&mut bytes)?;
        self.consumed += bytes.len();
        Ok(Some(bytes))
    }

    /// Reads a presence map.
    ///
    /// # Errors
    /// Returns `FastError::InvalidPresenceMap` if it exceeds the configured length, or
    /// `FastError::OverlongPresenceMap` in strict mode if it ends in zero groups.
    pub fn read_pmap(&mut self) -> Result<PresenceMap> {
        let groups = self.read_groups(self.max_pmap_bytes, FastError::InvalidPresenceMap)?;
        if self.strict && groups.len() > 1 && groups[groups.len() - 1] & PAYLOAD == 0 {
            return Err(FastError::OverlongPresenceMap);
        }
        Ok(PresenceMap::from_wire(&groups))
    }
}

/// Stop-bit primitive writer over a reusable buffer.
#[derive(Debug, Default)]
pub struct FastWriter {
    buffer: BytesMut,
}

impl FastWriter {
    /// Creates an empty writer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a writer with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: BytesMut::with_capacity(capacity),
        }
    }

    /// Writes the null marker `0x80`.
    #[inline]
    pub fn write_null(&mut self) {
        self.buffer.put_u8(STOP_BIT);
    }

    fn write_groups_unsigned(&mut self, value: u128) {
        let mut groups = 1;
        while groups < 19 && value >> (7 * groups) != 0 {
            groups += 1;
        }
        for i in (0..groups).rev() {
            // masked to 7 bits
            let byte = ((value >> (7 * i)) as u8) & PAYLOAD;
            self.buffer
                .put_u8(if i == 0 { byte | STOP_BIT } else { byte });
        }
    }

    /// Writes an unsigned integer.
    ///
    /// # Arguments
    /// * `value` - The value to encode
    /// * `nullable` - Whether to apply the nullable shift
    pub fn write_uint(&mut self, value: u64, nullable: bool) {
        let shifted = u128::from(value) + u128::from(nullable);
        self.write_groups_unsigned(shifted);
    }

    /// Writes a signed integer with the minimal number of groups.
    ///
    /// Non-negative values are shifted by one when `nullable`.
    pub fn write_int(&mut self, value: i128, nullable: bool) {
        let value = if nullable && value >= 0 { value + 1 } else { value };
        let mut groups = 1u32;
        // smallest n with -2^(7n-1) <= value < 2^(7n-1)
        while groups < 18 {
            let bound = 1i128 << (7 * groups - 1);
            if value >= -bound && value < bound {
                break;
            }
            groups += 1;
        }
        for i in (0..groups).rev() {
            // two's complement low bits, masked to 7 bits
            let byte = ((value >> (7 * i)) as u8) & PAYLOAD;
            self.buffer
                .put_u8(if i == 0 { byte | STOP_BIT } else { byte });
        }
    }

    /// Writes an ASCII string.
    ///
    /// Callers validate the bytes first: all below `0x80`, and no leading NUL
    /// unless the string is exactly `"\0"`.
    pub fn write_ascii(&mut self, value: &[u8], nullable: bool) {
        match value {
            [] if nullable => self.buffer.put_slice(&[0x00, STOP_BIT]),
            [] => self.buffer.put_u8(STOP_BIT),
            [0] if nullable => self.buffer.put_slice(&[0x00, 0x00, STOP_BIT]),
            [0] => self.buffer.put_slice(&[0x00, STOP_BIT]),
            [rest @ .., last] => {
                self.buffer.put_slice(rest);
                self.buffer.put_u8(last | STOP_BIT);
            }
        }
    }

    /// Writes a length-prefixed byte vector.
    pub fn write_bytes(&mut self, value: &[u8], nullable: bool) {
        self.write_uint(value.len() as u64, nullable);
        self.buffer.put_slice(value);
    }

    /// Writes a presence map.
    pub fn write_pmap(&mut self, pmap: &PresenceMap) {
        pmap.encode_into(&mut self.buffer);
    }

    /// Appends already encoded bytes.
    #[inline]
    pub fn append(&mut self, bytes: &[u8]) {
        self.buffer.put_slice(bytes);
    }

    /// Returns the encoded bytes.
    #[inline]
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    /// Returns the current buffer length.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// Returns true if the buffer is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Returns the allocated capacity.
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.capacity()
    }

    /// Clears the buffer for reuse, keeping its allocation.
    #[inline]
    pub fn clear(&mut self) {
        self.buffer.clear();
    }
}
