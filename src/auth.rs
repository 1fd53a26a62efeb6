//! Auth-domain models: scope sets and token records.

pub mod scope;
pub mod token;

pub use scope::*;
pub use token::{record::*, secret::*};
