/******************************************************************************
   Author: Joaquín Béjar García
   Email: jb@taunais.com
   Date: 16/10/26
******************************************************************************/

//! # IronFast Template
//!
//! FAST template model and schema analysis for the IronFast codec.
//!
//! This crate provides:
//! - **Instructions**: Typed field and structural nodes with presence and operator
//! - **Templates**: Validated instruction lists with derived dictionary keys and
//!   presence-map bit counts
//! - **Registry**: Id-keyed, shareable template lookup
//!
//! Templates are built in code; parsing a textual template description is left
//! to the application.

pub mod registry;
pub mod schema;

pub use registry::TemplateRegistry;
pub use schema::{Instruction, Template};
