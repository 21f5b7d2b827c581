/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! # IronFast
//!
//! A FAST (FIX Adapted for STreaming) codec engine for Rust.
//!
//! IronFast encodes typed messages into the compact, template-driven FAST wire
//! format used by market-data feeds, and decodes them back.
//!
//! ## Features
//!
//! - **Exact values**: Decimals travel as mantissa and exponent, never as floats
//! - **All operators**: Constant, Default, Copy, Increment, Delta, Tail
//! - **Nested structure**: Groups and sequences with their own presence maps
//! - **Bounded decoding**: Limits on nesting, field length, and sequence length
//! - **Pluggable binders**: Decode into your own types through `MessageReceiver`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use ironfast::prelude::*;
//!
//! let template = Template::new(1, "Quote", vec![
//!     Instruction::ascii(55, "Symbol").with_operator(Operator::Copy),
//!     Instruction::decimal(270, "Px").with_operator(Operator::Delta),
//! ])?;
//! let registry = TemplateRegistry::from_templates([template])?;
//!
//! let mut message = Message::new(1)
//!     .with_value("Symbol", "EURUSD")
//!     .with_value("Px", Decimal::new(108_512, -5));
//! let bytes = Encoder::new(registry.clone()).encode_to_vec(&mut message)?;
//! let (decoded, _) = Decoder::new(registry).decode_message(&bytes)?;
//! ```
//!
//! ## Crate Organization
//!
//! - [`core`]: Value model, binder traits, and error definitions
//! - [`template`]: Instructions, templates, and the template registry
//! - [`codec`]: Stop-bit primitives, presence maps, operators, encoder and decoder

pub mod core {
    //! Value model, binder traits, and error definitions.
    pub use ironfast_core::*;
}

pub mod template {
    //! Instructions, templates, and the template registry.
    pub use ironfast_template::*;
}

pub mod codec {
    //! FAST encoding and decoding.
    pub use ironfast_codec::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Core types
    pub use ironfast_core::{
        Decimal, DictionaryScope, FastError, Field, InstructionType, Message, MessageReceiver,
        MessageSender, Operator, Presence, Result, SchemaError, Segment, Value,
    };

    // Templates
    pub use ironfast_template::{Instruction, Template, TemplateRegistry};

    // Codec
    pub use ironfast_codec::{CodecConfig, Decoder, Encoder, Observer, TracingObserver};
}

#[cfg(test)]
mod tests {
    use super::prelude::*;

    #[test]
    fn test_prelude_round_trip() {
        let template = Template::new(
            1,
            "Quote",
            vec![
                Instruction::ascii(55, "Symbol").with_operator(Operator::Copy),
                Instruction::decimal(270, "Px").with_operator(Operator::Delta),
            ],
        )
        .unwrap();
        let registry = TemplateRegistry::from_templates([template]).unwrap();

        let mut message = Message::new(1)
            .with_value("Symbol", "EURUSD")
            .with_value("Px", Decimal::new(108_512, -5));
        let bytes = Encoder::new(registry.clone())
            .encode_to_vec(&mut message)
            .unwrap();
        let (decoded, consumed) = Decoder::new(registry).decode_message(&bytes).unwrap();
        assert_eq!(decoded, message);
        assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn test_config_defaults() {
        let config = CodecConfig::default();
        assert!(config.strict);
        assert!(!config.copy_template_id);
    }
}
