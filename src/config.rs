//! Engine lifetimes, entropy, and polling cadence.

/// Builder API for engine configuration.
pub mod builder;

pub use builder::*;

// self
use crate::{_prelude::*, error::ConfigError};

/// Minimum number of random bytes behind every code and token.
pub const MIN_TOKEN_BYTES: usize = 32;
/// Longest lifetime or interval the engine accepts.
pub const MAX_DURATION: Duration = Duration::days(365);

/// Validated engine settings shared by the license, token, and polling layers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EngineConfig {
	/// Authorization code lifetime.
	pub authorization_code_ttl: Duration,
	/// Access token lifetime; advertised through `expires_in`.
	pub access_token_ttl: Duration,
	/// Refresh token lifetime.
	pub refresh_token_ttl: Duration,
	/// Random bytes drawn for every code and token.
	pub token_bytes: usize,
	/// Cadence of the background expiry sweep.
	pub sweep_interval: Duration,
	/// Delay between license status polls.
	pub poll_interval: Duration,
	/// Total time a poller waits for an administrator decision.
	pub poll_deadline: Duration,
}
impl EngineConfig {
	/// Returns a builder seeded with the defaults.
	pub fn builder() -> EngineConfigBuilder {
		EngineConfigBuilder::new()
	}

	/// Parses a JSON document whose durations are expressed in whole seconds.
	///
	/// Every field is optional and falls back to its default; unknown fields are rejected.
	pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(document);
		let raw: RawConfig = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::Parse { source })?;

		raw.into_builder().build()
	}

	/// Validates the invariants every engine component relies on.
	pub fn validate(&self) -> Result<(), ConfigError> {
		for (field, value) in [
			("authorization_code_ttl", self.authorization_code_ttl),
			("access_token_ttl", self.access_token_ttl),
			("refresh_token_ttl", self.refresh_token_ttl),
			("sweep_interval", self.sweep_interval),
			("poll_interval", self.poll_interval),
			("poll_deadline", self.poll_deadline),
		] {
			if !value.is_positive() {
				return Err(ConfigError::NonPositiveDuration { field });
			}
			if value > MAX_DURATION {
				return Err(ConfigError::DurationTooLarge { field, max: MAX_DURATION });
			}
		}
		if self.token_bytes < MIN_TOKEN_BYTES {
			return Err(ConfigError::InsufficientEntropy {
				min: MIN_TOKEN_BYTES,
				actual: self.token_bytes,
			});
		}
		if self.refresh_token_ttl < self.access_token_ttl {
			return Err(ConfigError::RefreshShorterThanAccess);
		}

		Ok(())
	}
}
impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			authorization_code_ttl: Duration::minutes(5),
			access_token_ttl: Duration::hours(1),
			refresh_token_ttl: Duration::hours(24),
			token_bytes: MIN_TOKEN_BYTES,
			sweep_interval: Duration::seconds(60),
			poll_interval: Duration::seconds(10),
			poll_deadline: Duration::minutes(5),
		}
	}
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
	authorization_code_ttl: Option<i64>,
	access_token_ttl: Option<i64>,
	refresh_token_ttl: Option<i64>,
	token_bytes: Option<usize>,
	sweep_interval: Option<i64>,
	poll_interval: Option<i64>,
	poll_deadline: Option<i64>,
}
impl RawConfig {
	fn into_builder(self) -> EngineConfigBuilder {
		let mut builder = EngineConfig::builder();

		if let Some(secs) = self.authorization_code_ttl {
			builder = builder.authorization_code_ttl(Duration::seconds(secs));
		}
		if let Some(secs) = self.access_token_ttl {
			builder = builder.access_token_ttl(Duration::seconds(secs));
		}
		if let Some(secs) = self.refresh_token_ttl {
			builder = builder.refresh_token_ttl(Duration::seconds(secs));
		}
		if let Some(bytes) = self.token_bytes {
			builder = builder.token_bytes(bytes);
		}
		if let Some(secs) = self.sweep_interval {
			builder = builder.sweep_interval(Duration::seconds(secs));
		}
		if let Some(secs) = self.poll_interval {
			builder = builder.poll_interval(Duration::seconds(secs));
		}
		if let Some(secs) = self.poll_deadline {
			builder = builder.poll_deadline(Duration::seconds(secs));
		}

		builder
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn defaults_match_documented_lifetimes() {
		let config = EngineConfig::default();

		assert_eq!(config.authorization_code_ttl, Duration::minutes(5));
		assert_eq!(config.access_token_ttl.whole_seconds(), 3_600);
		assert_eq!(config.refresh_token_ttl, Duration::hours(24));
		assert_eq!(config.poll_interval, Duration::seconds(10));
		config.validate().expect("Default configuration should validate.");
	}

	#[test]
	fn json_overrides_only_present_fields() {
		let config = EngineConfig::from_json_str(r#"{"access_token_ttl":900,"token_bytes":48}"#)
			.expect("Partial JSON configuration should parse.");

		assert_eq!(config.access_token_ttl, Duration::minutes(15));
		assert_eq!(config.token_bytes, 48);
		assert_eq!(config.refresh_token_ttl, Duration::hours(24));
	}

	#[test]
	fn json_errors_report_the_offending_path() {
		let err = EngineConfig::from_json_str(r#"{"poll_interval":"ten"}"#)
			.expect_err("String durations should be rejected.");

		match err {
			ConfigError::Parse { source } => assert_eq!(source.path().to_string(), "poll_interval"),
			other => panic!("Unexpected error: {other:?}."),
		}
		assert!(matches!(
			EngineConfig::from_json_str(r#"{"unknown":1}"#),
			Err(ConfigError::Parse { .. })
		));
	}

	#[test]
	fn validation_rejects_weak_or_inconsistent_settings() {
		assert!(matches!(
			EngineConfig::from_json_str(r#"{"token_bytes":16}"#),
			Err(ConfigError::InsufficientEntropy { min: 32, actual: 16 })
		));
		assert!(matches!(
			EngineConfig::from_json_str(r#"{"poll_deadline":0}"#),
			Err(ConfigError::NonPositiveDuration { field: "poll_deadline" })
		));
		assert!(matches!(
			EngineConfig::from_json_str(r#"{"refresh_token_ttl":60}"#),
			Err(ConfigError::RefreshShorterThanAccess)
		));
	}

	#[test]
	fn validation_caps_every_duration() {
		assert!(matches!(
			EngineConfig::from_json_str(r#"{"refresh_token_ttl":9223372036854775807}"#),
			Err(ConfigError::DurationTooLarge { field: "refresh_token_ttl", .. })
		));
		assert!(matches!(
			EngineConfig::builder().authorization_code_ttl(Duration::days(366)).build(),
			Err(ConfigError::DurationTooLarge { field: "authorization_code_ttl", .. })
		));
		assert!(matches!(
			EngineConfig::from_json_str(r#"{"poll_deadline":9223372036854775807}"#),
			Err(ConfigError::DurationTooLarge { field: "poll_deadline", .. })
		));

		let config = EngineConfig::builder()
			.access_token_ttl(MAX_DURATION)
			.refresh_token_ttl(MAX_DURATION)
			.build()
			.expect("Durations at the cap should validate.");

		assert_eq!(config.refresh_token_ttl, Duration::days(365));
	}
}
