/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! # IronFast Core
//!
//! Core types, traits, and error definitions for the IronFast FAST codec.
//!
//! This crate provides the fundamental building blocks used across all IronFast crates:
//! - **Error types**: `SchemaError` and `FastError` with `thiserror`
//! - **Value model**: the closed `Value` union and the exact `Decimal`
//! - **Schema vocabulary**: `InstructionType`, `Operator`, `Presence`, `DictionaryScope`
//! - **Binder traits**: `MessageReceiver` and `MessageSender`, plus the generic `Message`
//!
//! ## Value Model
//!
//! Field values are a tagged union with an explicit `Absent` variant, so every
//! operator handles null and each wire type by exhaustive matching.

pub mod binder;
pub mod decimal;
pub mod error;
pub mod field;
pub mod message;
pub mod types;
pub mod value;

pub use binder::{MessageReceiver, MessageSender};
pub use decimal::Decimal;
pub use error::{FastError, Result, SchemaError};
pub use field::Field;
pub use message::{Entry, Message, Segment};
pub use types::{DictionaryScope, InstructionType, Operator, Presence};
pub use value::Value;
