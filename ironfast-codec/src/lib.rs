/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! # IronFast Codec
//!
//! FAST (FIX Adapted for STreaming) encoding and decoding.
//!
//! FAST is a binary encoding protocol used for high-performance market data feeds.
//! It uses techniques like stop-bit encoding, presence maps, and field operators
//! to achieve high compression ratios.
//!
//! ## Features
//!
//! - **Stop-bit encoding**: Integer, string, and byte-vector primitives with
//!   FAST 1.1 null rules
//! - **Presence maps**: Nested presence-map scopes for groups and sequence elements
//! - **Field operators**: Constant, Default, Copy, Increment, Delta, Tail
//! - **Session dictionary**: Previous values per field, resettable between sessions
//! - **Trace hooks**: Zero-cost [`Observer`] with `tracing` and in-memory sinks
//!
//! ## Example
//!
//! ```rust,ignore
//! use ironfast_codec::{Decoder, Encoder};
//!
//! let mut encoder = Encoder::new(registry.clone());
//! let bytes = encoder.encode_to_vec(&mut message)?;
//!
//! let mut decoder = Decoder::new(registry);
//! let (decoded, consumed) = decoder.decode_message(&bytes)?;
//! ```

pub mod config;
pub mod decoder;
pub mod dictionary;
pub mod encoder;
pub mod operators;
pub mod pmap;
pub mod stream;
pub mod trace;

#[cfg(test)]
mod fixtures;

pub use config::CodecConfig;
pub use decoder::Decoder;
pub use dictionary::Dictionary;
pub use encoder::Encoder;
pub use operators::FieldCodec;
pub use pmap::{PresenceMap, PresenceMapStack};
pub use stream::{FastReader, FastWriter};
pub use trace::{Observer, TraceEvent, TraceRecorder, TracingObserver};
