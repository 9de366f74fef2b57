//! Auth-domain identifiers, client registrations, secrets, and token records.

pub mod client;
pub mod id;
pub mod token;

pub use client::*;
pub use id::*;
pub use token::{record::*, secret::*};
