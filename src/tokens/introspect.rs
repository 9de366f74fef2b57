//! Read-only token introspection and bearer validation.

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, RefreshToken, TokenStatus, TokenType, UserId},
	obs::{self, FlowKind},
	tokens::TokenEngine,
};

/// Kind of token an introspection response describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
	/// Access token.
	AccessToken,
	/// Refresh token.
	RefreshToken,
}

/// RFC 7662 style introspection response.
///
/// Inactive responses carry only `active: false`, whether the token is unknown or expired.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Introspection {
	/// Whether the token is currently active.
	pub active: bool,
	/// Client the token was issued to.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_id: Option<String>,
	/// Resource owner.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub sub: Option<String>,
	/// Token type (`Bearer`).
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_type: Option<String>,
	/// Expiry as a Unix timestamp.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub exp: Option<i64>,
	/// Issue instant as a Unix timestamp.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub iat: Option<i64>,
	/// Whether the token is an access or a refresh token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub token_kind: Option<TokenKind>,
}
impl Introspection {
	/// Response for unknown or expired tokens.
	pub fn inactive() -> Self {
		Self {
			active: false,
			client_id: None,
			sub: None,
			token_type: None,
			exp: None,
			iat: None,
			token_kind: None,
		}
	}

	fn from_access(token: &AccessToken) -> Self {
		Self {
			active: true,
			client_id: Some(token.client_id.to_string()),
			sub: Some(token.user_id.to_string()),
			token_type: Some(token.token_type.to_string()),
			exp: Some(token.expires_at.unix_timestamp()),
			iat: Some(token.issued_at.unix_timestamp()),
			token_kind: Some(TokenKind::AccessToken),
		}
	}

	fn from_refresh(token: &RefreshToken) -> Self {
		Self {
			active: true,
			client_id: Some(token.client_id.to_string()),
			sub: Some(token.user_id.to_string()),
			token_type: Some(TokenType::Bearer.to_string()),
			exp: Some(token.expires_at.unix_timestamp()),
			iat: Some(token.issued_at.unix_timestamp()),
			token_kind: Some(TokenKind::RefreshToken),
		}
	}
}

impl TokenEngine {
	/// Describes an access or refresh token without revealing why an inactive one is inactive.
	pub async fn introspect(&self, token: &str) -> Result<Introspection> {
		obs::observe(FlowKind::Introspect, "introspect", async move {
			let now = self.clock.now();

			if let Some(access) = self.store.fetch_access_token(token).await? {
				return Ok(match access.status_at(now) {
					TokenStatus::Active => Introspection::from_access(&access),
					_ => Introspection::inactive(),
				});
			}
			if let Some(refresh) = self.store.fetch_refresh_token(token).await? {
				return Ok(match refresh.status_at(now) {
					TokenStatus::Active => Introspection::from_refresh(&refresh),
					_ => Introspection::inactive(),
				});
			}

			Ok(Introspection::inactive())
		})
		.await
	}

	/// Returns the owner of an unexpired access token.
	///
	/// Expired tokens are rejected whether or not a sweep has removed them yet.
	pub async fn validate_access_token(&self, token: &str) -> Result<Option<UserId>> {
		let now = self.clock.now();

		Ok(self
			.store
			.fetch_access_token(token)
			.await?
			.filter(|access| access.status_at(now) == TokenStatus::Active)
			.map(|access| access.user_id))
	}
}
