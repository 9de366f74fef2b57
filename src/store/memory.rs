//! Thread-safe in-memory [`CredentialStore`] implementation for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, Client, ClientId, CodeBinding, IssuedTokens, PairDraft,
		RefreshToken, RequestId, UserId,
	},
	license::{License, LicenseRequest, RequestStatus},
	store::{
		CredentialStore, PendingInsertOutcome, StatusSwapOutcome, StoreFuture, SweepReport,
		state::StoreState,
	},
};

/// Thread-safe storage backend that keeps records in-process for tests and demos.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Arc<RwLock<StoreState>>);
impl MemoryStore {
	fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
		f(&self.0.read())
	}

	fn write<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> T {
		f(&mut self.0.write())
	}
}
impl CredentialStore for MemoryStore {
	fn save_client(&self, client: Client) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.write(|state| state.save_client(client));

			Ok(())
		})
	}

	fn fetch_client<'a>(&'a self, id: &'a ClientId) -> StoreFuture<'a, Option<Client>> {
		Box::pin(async move { Ok(self.read(|state| state.client(id))) })
	}

	fn insert_request_if_idle(
		&self,
		request: LicenseRequest,
	) -> StoreFuture<'_, PendingInsertOutcome> {
		Box::pin(async move { Ok(self.write(|state| state.insert_request_if_idle(request))) })
	}

	fn fetch_request<'a>(&'a self, id: &'a RequestId) -> StoreFuture<'a, Option<LicenseRequest>> {
		Box::pin(async move { Ok(self.read(|state| state.request(id))) })
	}

	fn latest_request_for<'a>(
		&'a self,
		user: &'a UserId,
	) -> StoreFuture<'a, Option<LicenseRequest>> {
		Box::pin(async move { Ok(self.read(|state| state.latest_request_for(user))) })
	}

	fn pending_requests(&self) -> StoreFuture<'_, Vec<LicenseRequest>> {
		Box::pin(async move { Ok(self.read(StoreState::pending_requests)) })
	}

	fn compare_status_and_set<'a>(
		&'a self,
		id: &'a RequestId,
		expected: RequestStatus,
		new: RequestStatus,
	) -> StoreFuture<'a, StatusSwapOutcome> {
		Box::pin(
			async move { Ok(self.write(|state| state.compare_status_and_set(id, expected, new))) },
		)
	}

	fn approve_with_license(&self, license: License) -> StoreFuture<'_, StatusSwapOutcome> {
		Box::pin(async move { Ok(self.write(|state| state.approve_with_license(license))) })
	}

	fn latest_license_for<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<License>> {
		Box::pin(async move { Ok(self.read(|state| state.latest_license_for(user))) })
	}

	fn save_authorization_code(&self, code: AuthorizationCode) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.write(|state| state.save_authorization_code(code));

			Ok(())
		})
	}

	fn redeem_authorization_code<'a>(
		&'a self,
		code: &'a str,
		binding: CodeBinding,
		draft: PairDraft,
	) -> StoreFuture<'a, Option<IssuedTokens>> {
		Box::pin(async move {
			Ok(self.write(|state| state.redeem_authorization_code(code, binding, draft)))
		})
	}

	fn rotate_refresh_token<'a>(
		&'a self,
		token: &'a str,
		client: &'a ClientId,
		draft: PairDraft,
	) -> StoreFuture<'a, Option<IssuedTokens>> {
		Box::pin(
			async move { Ok(self.write(|state| state.rotate_refresh_token(token, client, draft))) },
		)
	}

	fn fetch_access_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move { Ok(self.read(|state| state.access_token(token))) })
	}

	fn fetch_refresh_token<'a>(
		&'a self,
		token: &'a str,
	) -> StoreFuture<'a, Option<RefreshToken>> {
		Box::pin(async move { Ok(self.read(|state| state.refresh_token(token))) })
	}

	fn revoke_token<'a>(&'a self, token: &'a str) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.write(|state| state.revoke_token(token))) })
	}

	fn sweep_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, SweepReport> {
		Box::pin(async move { Ok(self.write(|state| state.sweep_expired(now))) })
	}
}
