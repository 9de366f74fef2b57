// self
use crate::{_prelude::*, config::EngineConfig, error::ConfigError};

/// Builder for [`EngineConfig`] values.
#[derive(Debug)]
pub struct EngineConfigBuilder {
	config: EngineConfig,
}
impl EngineConfigBuilder {
	/// Creates a builder seeded with [`EngineConfig::default`].
	pub fn new() -> Self {
		Self { config: EngineConfig::default() }
	}

	/// Sets the authorization code lifetime.
	pub fn authorization_code_ttl(mut self, ttl: Duration) -> Self {
		self.config.authorization_code_ttl = ttl;

		self
	}

	/// Sets the access token lifetime.
	pub fn access_token_ttl(mut self, ttl: Duration) -> Self {
		self.config.access_token_ttl = ttl;

		self
	}

	/// Sets the refresh token lifetime.
	pub fn refresh_token_ttl(mut self, ttl: Duration) -> Self {
		self.config.refresh_token_ttl = ttl;

		self
	}

	/// Sets the number of random bytes behind each code and token.
	pub fn token_bytes(mut self, bytes: usize) -> Self {
		self.config.token_bytes = bytes;

		self
	}

	/// Sets the background sweep cadence.
	pub fn sweep_interval(mut self, interval: Duration) -> Self {
		self.config.sweep_interval = interval;

		self
	}

	/// Sets the delay between license polls.
	pub fn poll_interval(mut self, interval: Duration) -> Self {
		self.config.poll_interval = interval;

		self
	}

	/// Sets how long a poller waits for a decision.
	pub fn poll_deadline(mut self, deadline: Duration) -> Self {
		self.config.poll_deadline = deadline;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<EngineConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}
impl Default for EngineConfigBuilder {
	fn default() -> Self {
		Self::new()
	}
}
