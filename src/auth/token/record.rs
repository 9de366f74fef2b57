//! Authorization code and token records plus the drafts used to mint them.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, UserId, token::secret::TokenSecret},
};

/// Current lifecycle status for a time-bounded credential.
///
/// Only the expiry instant decides; an instant before `issued_at` (a wall clock stepped
/// backwards after issuance) still counts as active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenStatus {
	/// Credential is currently valid.
	Active,
	/// Credential reached its expiry instant.
	Expired,
}

/// Token type advertised to clients.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenType {
	/// RFC 6750 bearer token.
	#[default]
	Bearer,
}
impl TokenType {
	/// Returns the wire spelling of the token type.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Bearer => "Bearer",
		}
	}
}
impl Display for TokenType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

fn status_until(expires_at: OffsetDateTime, instant: OffsetDateTime) -> TokenStatus {
	if instant >= expires_at {
		return TokenStatus::Expired;
	}

	TokenStatus::Active
}

/// Single-use authorization code bound to a client and redirect URI.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthorizationCode {
	/// Code value handed to the user agent.
	pub code: TokenSecret,
	/// Client the code was issued to.
	pub client_id: ClientId,
	/// User that granted the authorization.
	pub user_id: UserId,
	/// Redirect URI the code must be exchanged with, compared verbatim.
	pub redirect_uri: String,
	/// Issued-at instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
}
impl AuthorizationCode {
	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		status_until(self.expires_at, instant)
	}

	/// Returns `true` if the code has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for AuthorizationCode {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationCode")
			.field("code", &"<redacted>")
			.field("client_id", &self.client_id)
			.field("user_id", &self.user_id)
			.field("redirect_uri", &self.redirect_uri)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Bearer access token issued through a code exchange or a refresh.
#[derive(Clone, Serialize, Deserialize)]
pub struct AccessToken {
	/// Access token secret; callers must avoid logging it.
	pub token: TokenSecret,
	/// Resource owner.
	pub user_id: UserId,
	/// Client the token was issued to.
	pub client_id: ClientId,
	/// Advertised token type.
	pub token_type: TokenType,
	/// Issued-at instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
	/// Refresh token minted alongside this access token.
	pub refresh_token: Option<TokenSecret>,
}
impl AccessToken {
	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		status_until(self.expires_at, instant)
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}

	/// Total lifetime between issuance and expiry.
	pub fn lifetime(&self) -> Duration {
		self.expires_at - self.issued_at
	}
}
impl Debug for AccessToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AccessToken")
			.field("token", &"<redacted>")
			.field("user_id", &self.user_id)
			.field("client_id", &self.client_id)
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}

/// Rotating refresh token.
#[derive(Clone, Serialize, Deserialize)]
pub struct RefreshToken {
	/// Refresh token secret; callers must avoid logging it.
	pub token: TokenSecret,
	/// Resource owner.
	pub user_id: UserId,
	/// Client the token was issued to.
	pub client_id: ClientId,
	/// Issued-at instant.
	pub issued_at: OffsetDateTime,
	/// Expiry instant.
	pub expires_at: OffsetDateTime,
}
impl RefreshToken {
	/// Computes the lifecycle status at a given instant.
	pub fn status_at(&self, instant: OffsetDateTime) -> TokenStatus {
		status_until(self.expires_at, instant)
	}

	/// Returns `true` if the token has expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}
impl Debug for RefreshToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshToken")
			.field("token", &"<redacted>")
			.field("user_id", &self.user_id)
			.field("client_id", &self.client_id)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Access/refresh pair returned by a successful exchange or rotation.
#[derive(Clone, Debug)]
pub struct IssuedTokens {
	/// Newly issued access token.
	pub access_token: AccessToken,
	/// Newly issued refresh token.
	pub refresh_token: RefreshToken,
}
impl IssuedTokens {
	/// Access token lifetime in whole seconds, as advertised through `expires_in`.
	pub fn expires_in(&self) -> i64 {
		self.access_token.lifetime().whole_seconds()
	}

	/// Advertised token type.
	pub fn token_type(&self) -> TokenType {
		self.access_token.token_type
	}
}

/// Unbound token pair; the store attaches the owner taken from the consumed grant.
#[derive(Clone)]
pub struct PairDraft {
	/// Access token value.
	pub access_token: TokenSecret,
	/// Refresh token value.
	pub refresh_token: TokenSecret,
	/// Advertised token type.
	pub token_type: TokenType,
	/// Issued-at instant shared by both tokens.
	pub issued_at: OffsetDateTime,
	/// Access token expiry.
	pub access_expires_at: OffsetDateTime,
	/// Refresh token expiry.
	pub refresh_expires_at: OffsetDateTime,
}
impl PairDraft {
	/// Mints a draft with fresh random values.
	pub fn mint(
		token_bytes: usize,
		issued_at: OffsetDateTime,
		access_ttl: Duration,
		refresh_ttl: Duration,
	) -> Self {
		Self {
			access_token: TokenSecret::generate(token_bytes),
			refresh_token: TokenSecret::generate(token_bytes),
			token_type: TokenType::Bearer,
			issued_at,
			access_expires_at: issued_at + access_ttl,
			refresh_expires_at: issued_at + refresh_ttl,
		}
	}

	/// Binds the draft to its owner, producing the records to persist.
	pub fn bind(self, user_id: UserId, client_id: ClientId) -> IssuedTokens {
		let refresh_token = RefreshToken {
			token: self.refresh_token.clone(),
			user_id: user_id.clone(),
			client_id: client_id.clone(),
			issued_at: self.issued_at,
			expires_at: self.refresh_expires_at,
		};
		let access_token = AccessToken {
			token: self.access_token,
			user_id,
			client_id,
			token_type: self.token_type,
			issued_at: self.issued_at,
			expires_at: self.access_expires_at,
			refresh_token: Some(self.refresh_token),
		};

		IssuedTokens { access_token, refresh_token }
	}
}
impl Debug for PairDraft {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PairDraft")
			.field("token_type", &self.token_type)
			.field("issued_at", &self.issued_at)
			.field("access_expires_at", &self.access_expires_at)
			.field("refresh_expires_at", &self.refresh_expires_at)
			.finish_non_exhaustive()
	}
}

/// Values an authorization code must match at redemption time.
#[derive(Clone, Debug)]
pub struct CodeBinding {
	/// Authenticated client presenting the code.
	pub client_id: ClientId,
	/// Redirect URI presented with the code.
	pub redirect_uri: String,
	/// Instant the redemption is evaluated at.
	pub now: OffsetDateTime,
}
