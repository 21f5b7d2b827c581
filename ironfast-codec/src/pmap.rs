/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! FAST presence map handling.
//!
//! The presence map (PMAP) is a bitmap that indicates which optional fields
//! are present in a FAST message. It uses stop-bit encoding where the high
//! bit of each byte marks the last byte. Bits are consumed most significant
//! first; bits beyond the transmitted ones read as zero.

use bytes::{BufMut, BytesMut};
use smallvec::SmallVec;
use std::fmt;

/// FAST presence map with a bit cursor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PresenceMap {
    /// 7-bit groups, most significant first.
    groups: SmallVec<[u8; 4]>,
    /// Index of the next bit to test or set.
    cursor: usize,
}

impl PresenceMap {
    /// Creates an empty presence map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a presence map from wire bytes (stop bit on the last byte or not).
    #[must_use]
    pub fn from_wire(bytes: &[u8]) -> Self {
        Self {
            groups: bytes.iter().map(|b| b & 0x7F).collect(),
            cursor: 0,
        }
    }

    /// Consumes the next bit.
    ///
    /// # Returns
    /// `true` if the bit is set; `false` once the map is exhausted.
    #[inline]
    pub fn is_next_bit_set(&mut self) -> bool {
        let (group, shift) = (self.cursor / 7, 6 - self.cursor % 7);
        self.cursor += 1;
        self.groups
            .get(group)
            .is_some_and(|g| (g >> shift) & 1 == 1)
    }

    /// Appends the next bit.
    ///
    /// # Arguments
    /// * `bit` - Whether the bit is set
    #[inline]
    pub fn set_next_bit(&mut self, bit: bool) {
        let (group, shift) = (self.cursor / 7, 6 - self.cursor % 7);
        if group >= self.groups.len() {
            self.groups.resize(group + 1, 0);
        }
        if bit {
            self.groups[group] |= 1 << shift;
        }
        self.cursor += 1;
    }

    /// Returns the number of bits consumed or set so far.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> usize {
        self.cursor
    }

    /// Returns the number of transmitted groups.
    #[inline]
    #[must_use]
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Returns true if a set bit lies beyond the cursor.
    #[must_use]
    pub fn has_unconsumed_bits(&self) -> bool {
        self.groups.iter().enumerate().any(|(i, g)| {
            let first = i * 7;
            let consumed = self.cursor.saturating_sub(first).min(7);
            // bits of this group at positions >= consumed
            let mask = 0x7Fu8 >> consumed;
            g & mask != 0
        })
    }

    /// Returns the number of bytes [`encode_into`](Self::encode_into) writes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        self.significant_groups().len().max(1)
    }

    /// Writes the presence map with stop-bit encoding.
    ///
    /// Trailing all-zero groups are dropped; an all-zero map is the single byte `0x80`.
    pub fn encode_into(&self, buf: &mut BytesMut) {
        match self.significant_groups().split_last() {
            Some((last, rest)) => {
                buf.put_slice(rest);
                buf.put_u8(last | 0x80);
            }
            None => buf.put_u8(0x80),
        }
    }

    /// Encodes the presence map to bytes.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf.to_vec()
    }

    fn significant_groups(&self) -> &[u8] {
        let len = self
            .groups
            .iter()
            .rposition(|g| *g != 0)
            .map_or(0, |i| i + 1);
        &self.groups[..len]
    }
}

impl fmt::Display for PresenceMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, g) in self.groups.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{g:07b}")?;
        }
        Ok(())
    }
}

/// Stack of presence-map scopes.
///
/// Every message, group, and sequence element pushes one entry. Scopes that
/// declare no bits push `None` and share the nearest enclosing map.
#[derive(Debug, Clone, Default)]
pub struct PresenceMapStack {
    maps: Vec<Option<PresenceMap>>,
}

impl PresenceMapStack {
    /// Creates an empty stack.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enters a scope, with its own map or sharing the parent's.
    pub fn enter(&mut self, map: Option<PresenceMap>) {
        self.maps.push(map);
    }

    /// Leaves the innermost scope, returning its own map if it had one.
    pub fn leave(&mut self) -> Option<PresenceMap> {
        self.maps.pop().flatten()
    }

    /// Returns the map fields of the innermost scope read and write.
    #[must_use]
    pub fn active(&self) -> Option<&PresenceMap> {
        self.maps.iter().rev().find_map(Option::as_ref)
    }

    /// Returns the active map mutably.
    pub fn active_mut(&mut self) -> Option<&mut PresenceMap> {
        self.maps.iter_mut().rev().find_map(Option::as_mut)
    }

    /// Returns the number of entered scopes.
    #[inline]
    #[must_use]
    pub fn depth(&self) -> usize {
        self.maps.len()
    }

    /// Drops every scope.
    pub fn clear(&mut self) {
        self.maps.clear();
    }
}
