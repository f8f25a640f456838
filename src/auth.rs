//! Auth-domain identifiers, scope sets, secrets, and the records the token authority issues.

pub mod client;
pub mod scope;
pub mod token;

pub use client::*;
pub use scope::*;
pub use token::{record::*, secret::*};
