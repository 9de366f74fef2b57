//! Static OAuth client registrations.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, UserId, token::secret::TokenSecret},
};

/// Registered OAuth client and the user it acts for.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Client {
	/// Public client identifier.
	pub id: ClientId,
	/// Shared client secret.
	pub secret: TokenSecret,
	/// Owner of the registration.
	pub user_id: UserId,
}
impl Client {
	/// Creates a client registration.
	pub fn new(id: ClientId, secret: impl Into<String>, user_id: UserId) -> Self {
		Self { id, secret: TokenSecret::new(secret), user_id }
	}

	/// Returns `true` when the presented secret matches the registered one.
	pub fn authenticate(&self, presented_secret: &str) -> bool {
		self.secret.matches(presented_secret)
	}
}
