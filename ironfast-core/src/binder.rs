/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! Message-binder traits.
//!
//! The codec never owns application messages. On decode it hands each field to a
//! [`MessageReceiver`]; on encode it pulls each field from a [`MessageSender`].
//! Groups and sequence elements are bracketed by `lock` / `unlock`.

use crate::error::Result;
use crate::field::Field;
use crate::value::Value;

/// Decode-direction binder: receives values as the decoder produces them.
pub trait MessageReceiver {
    /// Called once per message with the resolved template id.
    fn set_template_id(&mut self, template_id: u32);

    /// Receives one decoded scalar field.
    ///
    /// Absent optional fields are delivered with [`Value::Absent`].
    ///
    /// # Errors
    /// Implementations may reject a value; the error aborts the message.
    fn set_value(&mut self, field: &Field<'_>) -> Result<()>;

    /// Pre-sizes a sequence before its elements are delivered.
    ///
    /// # Arguments
    /// * `field` - The sequence field (value is the decoded length)
    /// * `length` - Number of elements that follow
    fn set_length(&mut self, field: &Field<'_>, length: usize);

    /// Enters a group (`field.index` is `None`) or one sequence element.
    ///
    /// Returning `false` means the binder does not know this field; the decoder
    /// still consumes its bytes but delivers nothing until the matching scope ends.
    fn lock(&mut self, field: &Field<'_>) -> bool;

    /// Leaves the scope entered by the last successful [`lock`](Self::lock).
    fn unlock(&mut self);
}

/// Encode-direction binder: supplies values as the encoder asks for them.
pub trait MessageSender {
    /// Returns the template id of the message to encode.
    fn template_id(&self) -> u32;

    /// Returns the value of one scalar field, or [`Value::Absent`] if unset.
    ///
    /// # Errors
    /// Implementations may fail to produce a value; the error aborts the message.
    fn value(&mut self, field: &Field<'_>) -> Result<Value>;

    /// Returns the number of elements of a sequence, or `None` if it is absent.
    fn length(&mut self, field: &Field<'_>) -> Option<usize>;

    /// Enters a group (`field.index` is `None`) or one sequence element.
    ///
    /// Returning `false` for a group means the group is absent.
    fn lock(&mut self, field: &Field<'_>) -> bool;

    /// Leaves the scope entered by the last successful [`lock`](Self::lock).
    fn unlock(&mut self);
}
