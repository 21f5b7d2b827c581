/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Codec configuration.
//!
//! This module provides the limits and strictness switches shared by
//! [`Decoder`](crate::Decoder) and [`Encoder`](crate::Encoder).

use serde::{Deserialize, Serialize};

/// Configuration for a FAST decoder or encoder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Reject overlong integers and presence maps, and unconsumed presence bits.
    pub strict: bool,
    /// Omit the template id when it repeats the previous message's id.
    pub copy_template_id: bool,
    /// Maximum group / sequence nesting depth.
    pub max_depth: usize,
    /// Maximum presence-map length in bytes.
    pub max_pmap_bytes: usize,
    /// Maximum string or byte-vector length in bytes.
    pub max_field_len: usize,
    /// Maximum number of sequence elements.
    pub max_sequence_len: usize,
}

impl CodecConfig {
    /// Creates the default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            strict: true,
            copy_template_id: false,
            max_depth: 16,
            max_pmap_bytes: 16,
            max_field_len: 1024 * 1024, // 1MB
            max_sequence_len: 65_536,
        }
    }

    /// Sets strict wire checking.
    #[must_use]
    pub const fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Sets whether repeated template ids are omitted on encode.
    #[must_use]
    pub const fn with_copy_template_id(mut self, copy: bool) -> Self {
        self.copy_template_id = copy;
        self
    }

    /// Sets the maximum nesting depth.
    #[must_use]
    pub const fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Sets the maximum presence-map length in bytes.
    #[must_use]
    pub const fn with_max_pmap_bytes(mut self, bytes: usize) -> Self {
        self.max_pmap_bytes = bytes;
        self
    }

    /// Sets the maximum string or byte-vector length.
    #[must_use]
    pub const fn with_max_field_len(mut self, len: usize) -> Self {
        self.max_field_len = len;
        self
    }

    /// Sets the maximum number of sequence elements.
    #[must_use]
    pub const fn with_max_sequence_len(mut self, len: usize) -> Self {
        self.max_sequence_len = len;
        self
    }
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CodecConfig::default();
        assert!(config.strict);
        assert!(!config.copy_template_id);
        assert_eq!(config.max_depth, 16);
        assert_eq!(config.max_field_len, 1024 * 1024);
    }

    #[test]
    fn test_config_builder() {
        let config = CodecConfig::new()
            .with_strict(false)
            .with_copy_template_id(true)
            .with_max_depth(4)
            .with_max_sequence_len(10);
        assert!(!config.strict);
        assert!(config.copy_template_id);
        assert_eq!(config.max_depth, 4);
        assert_eq!(config.max_sequence_len, 10);
        assert_eq!(config.max_pmap_bytes, 16);
    }
}
