//! Shared types for the airformula parser and compiler: the array-notation
//! [`Formula`] value, the injected [`Registry`] of function names and operator
//! symbols, and structural validation of formula values.

pub mod formula;
pub mod registry;
pub mod schema;

pub use formula::*;
pub use registry::*;
pub use schema::*;
