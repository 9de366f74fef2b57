//! Storage contracts and built-in store implementations for credential records.

pub mod file;
pub mod memory;

mod state;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, Client, ClientId, CodeBinding, IssuedTokens, PairDraft,
		RefreshToken, RequestId, UserId,
	},
	license::{License, LicenseRequest, RequestStatus},
};

/// Boxed future returned by every [`CredentialStore`] operation.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for licenses, requests, clients, codes, and tokens.
///
/// Every operation is atomic with respect to every other operation on the same store.
/// Missing entries yield `None` rather than a default value.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces a client registration.
	fn save_client(&self, client: Client) -> StoreFuture<'_, ()>;

	/// Fetches a client registration.
	fn fetch_client<'a>(&'a self, id: &'a ClientId) -> StoreFuture<'a, Option<Client>>;

	/// Inserts `request` unless its user already has a pending request.
	fn insert_request_if_idle(&self, request: LicenseRequest)
	-> StoreFuture<'_, PendingInsertOutcome>;

	/// Fetches a license request by identifier.
	fn fetch_request<'a>(&'a self, id: &'a RequestId) -> StoreFuture<'a, Option<LicenseRequest>>;

	/// Returns the most recently created request of a user.
	fn latest_request_for<'a>(&'a self, user: &'a UserId)
	-> StoreFuture<'a, Option<LicenseRequest>>;

	/// Lists pending requests, newest first.
	fn pending_requests(&self) -> StoreFuture<'_, Vec<LicenseRequest>>;

	/// Moves a request from `expected` to `new` if it is currently `expected`.
	fn compare_status_and_set<'a>(
		&'a self,
		id: &'a RequestId,
		expected: RequestStatus,
		new: RequestStatus,
	) -> StoreFuture<'a, StatusSwapOutcome>;

	/// Marks `license.request_id` approved and stores `license`, only if the request is pending.
	fn approve_with_license(&self, license: License) -> StoreFuture<'_, StatusSwapOutcome>;

	/// Returns the most recently issued license of a user.
	fn latest_license_for<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<License>>;

	/// Persists a freshly issued authorization code.
	fn save_authorization_code(&self, code: AuthorizationCode) -> StoreFuture<'_, ()>;

	/// Consumes `code` and stores the pair drawn from `draft` in one step.
	///
	/// Succeeds only when the code exists, is unexpired at `binding.now`, and was issued
	/// to `binding.client_id` for exactly `binding.redirect_uri`. An expired code is
	/// removed. On failure nothing is inserted and `None` is returned.
	fn redeem_authorization_code<'a>(
		&'a self,
		code: &'a str,
		binding: CodeBinding,
		draft: PairDraft,
	) -> StoreFuture<'a, Option<IssuedTokens>>;

	/// Replaces a refresh token (and the access tokens minted with it) by the pair in `draft`.
	///
	/// Succeeds only when the token exists, is unexpired at `draft.issued_at`, and belongs
	/// to `client`. An expired token is removed. On failure nothing is inserted.
	fn rotate_refresh_token<'a>(
		&'a self,
		token: &'a str,
		client: &'a ClientId,
		draft: PairDraft,
	) -> StoreFuture<'a, Option<IssuedTokens>>;

	/// Fetches an access token record.
	fn fetch_access_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<AccessToken>>;

	/// Fetches a refresh token record.
	fn fetch_refresh_token<'a>(&'a self, token: &'a str)
	-> StoreFuture<'a, Option<RefreshToken>>;

	/// Deletes an access or refresh token; returns `true` when something was removed.
	///
	/// Revoking a refresh token also removes the access tokens minted with it.
	fn revoke_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, bool>;

	/// Removes every code and token whose expiry is at or before `now`.
	fn sweep_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, SweepReport>;
}

/// Result of an "insert unless pending" attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PendingInsertOutcome {
	/// The request was stored.
	Inserted,
	/// The user already has the given pending request; nothing was stored.
	PendingExists(RequestId),
}

/// Result of a request status compare-and-set attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatusSwapOutcome {
	/// The status matched and was replaced.
	Updated,
	/// The request exists in a different status.
	StatusMismatch(RequestStatus),
	/// No request matched the identifier.
	Missing,
}

/// Number of entries removed by a sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
	/// Expired authorization codes removed.
	pub authorization_codes: usize,
	/// Expired access tokens removed.
	pub access_tokens: usize,
	/// Expired refresh tokens removed.
	pub refresh_tokens: usize,
}
impl SweepReport {
	/// Total entries removed.
	pub fn total(&self) -> usize {
		self.authorization_codes + self.access_tokens + self.refresh_tokens
	}
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}
