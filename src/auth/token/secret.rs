//! Secure token secret wrapper that redacts sensitive material.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Draws `bytes` bytes from the thread CSPRNG and encodes them as unpadded base64url.
	pub fn generate(bytes: usize) -> Self {
		Self(random_url_safe(bytes))
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Compares a presented value against this secret through fixed-size digests.
	pub fn matches(&self, presented: &str) -> bool {
		Sha256::digest(self.0.as_bytes()) == Sha256::digest(presented.as_bytes())
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

pub(crate) fn random_bytes(bytes: usize) -> Vec<u8> {
	let mut buf = vec![0_u8; bytes];

	rand::rng().fill_bytes(&mut buf);

	buf
}

pub(crate) fn random_url_safe(bytes: usize) -> String {
	URL_SAFE_NO_PAD.encode(random_bytes(bytes))
}
