//! Credential records minted by the token engine and the secrets they carry.

pub mod record;
pub mod secret;
