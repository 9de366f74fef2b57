//! OAuth-style token issuance: authorization codes, exchange, rotation, and introspection.
//!
//! [`TokenEngine`] keeps no state of its own beyond counters; every read-modify-write
//! sequence (code redemption, refresh rotation) is a single atomic store call, so the
//! engine can be cloned freely across tasks.

mod authorize;
mod exchange;
mod introspect;
mod metrics;
mod refresh;
mod revoke;
mod sweep;

pub use introspect::*;
pub use metrics::*;
pub use sweep::*;

// self
use crate::{
	_prelude::*,
	auth::{Client, ClientId, PairDraft},
	clock::{Clock, SystemClock},
	config::EngineConfig,
	store::CredentialStore,
};

/// Issues and validates authorization codes and token pairs.
#[derive(Clone)]
pub struct TokenEngine {
	store: Arc<dyn CredentialStore>,
	clock: Arc<dyn Clock>,
	config: EngineConfig,
	/// Shared counters for exchange and refresh outcomes.
	pub metrics: Arc<GrantMetrics>,
}
impl TokenEngine {
	/// Creates an engine backed by the system clock.
	pub fn new(store: Arc<dyn CredentialStore>, config: EngineConfig) -> Self {
		Self::with_clock(store, Arc::new(SystemClock), config)
	}

	/// Creates an engine reading time from `clock`.
	pub fn with_clock(
		store: Arc<dyn CredentialStore>,
		clock: Arc<dyn Clock>,
		config: EngineConfig,
	) -> Self {
		Self { store, clock, config, metrics: Default::default() }
	}

	/// Active configuration.
	pub fn config(&self) -> &EngineConfig {
		&self.config
	}

	/// Backing credential store.
	pub fn store(&self) -> &Arc<dyn CredentialStore> {
		&self.store
	}

	/// Authenticates a client by identifier and shared secret.
	pub async fn authenticate_client(&self, client_id: &ClientId, secret: &str) -> Result<Client> {
		let client = self.registered_client(client_id).await?;

		if !client.authenticate(secret) {
			return Err(Error::InvalidClient);
		}

		Ok(client)
	}

	async fn registered_client(&self, client_id: &ClientId) -> Result<Client> {
		self.store.fetch_client(client_id).await?.ok_or(Error::InvalidClient)
	}

	fn draft_pair(&self, now: OffsetDateTime) -> PairDraft {
		PairDraft::mint(
			self.config.token_bytes,
			now,
			self.config.access_token_ttl,
			self.config.refresh_token_ttl,
		)
	}
}
