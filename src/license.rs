//! Administrator-approved license lifecycle: requests, signing, and checks.

pub mod manager;
pub mod record;
pub mod request;
pub mod signer;

pub use manager::*;
pub use record::*;
pub use request::*;
pub use signer::*;
