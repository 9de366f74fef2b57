//! Lock-free core shared by the built-in stores; callers hold the lock around every call.

// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, Client, ClientId, CodeBinding, IssuedTokens, PairDraft,
		RefreshToken, RequestId, UserId,
	},
	license::{License, LicenseRequest, RequestStatus},
	store::{PendingInsertOutcome, StatusSwapOutcome, SweepReport},
};

/// Every record a built-in store owns.
///
/// Requests and licenses are kept in insertion order so "latest" never depends on
/// timestamp resolution.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct StoreState {
	clients: HashMap<ClientId, Client>,
	requests: Vec<LicenseRequest>,
	licenses: Vec<License>,
	authorization_codes: HashMap<String, AuthorizationCode>,
	access_tokens: HashMap<String, AccessToken>,
	refresh_tokens: HashMap<String, RefreshToken>,
}
impl StoreState {
	pub(crate) fn save_client(&mut self, client: Client) {
		self.clients.insert(client.id.clone(), client);
	}

	pub(crate) fn client(&self, id: &ClientId) -> Option<Client> {
		self.clients.get(id).cloned()
	}

	pub(crate) fn insert_request_if_idle(
		&mut self,
		request: LicenseRequest,
	) -> PendingInsertOutcome {
		if let Some(pending) =
			self.requests.iter().find(|r| r.user_id == request.user_id && r.is_pending())
		{
			return PendingInsertOutcome::PendingExists(pending.id.clone());
		}

		self.requests.push(request);

		PendingInsertOutcome::Inserted
	}

	pub(crate) fn request(&self, id: &RequestId) -> Option<LicenseRequest> {
		self.requests.iter().find(|r| &r.id == id).cloned()
	}

	pub(crate) fn latest_request_for(&self, user: &UserId) -> Option<LicenseRequest> {
		self.requests.iter().rev().find(|r| &r.user_id == user).cloned()
	}

	pub(crate) fn pending_requests(&self) -> Vec<LicenseRequest> {
		self.requests.iter().rev().filter(|r| r.is_pending()).cloned().collect()
	}

	pub(crate) fn compare_status_and_set(
		&mut self,
		id: &RequestId,
		expected: RequestStatus,
		new: RequestStatus,
	) -> StatusSwapOutcome {
		match self.requests.iter_mut().find(|r| &r.id == id) {
			Some(request) if request.status == expected => {
				request.status = new;

				StatusSwapOutcome::Updated
			},
			Some(request) => StatusSwapOutcome::StatusMismatch(request.status),
			None => StatusSwapOutcome::Missing,
		}
	}

	pub(crate) fn approve_with_license(&mut self, license: License) -> StatusSwapOutcome {
		let outcome = self.compare_status_and_set(
			&license.request_id,
			RequestStatus::Pending,
			RequestStatus::Approved,
		);

		if outcome == StatusSwapOutcome::Updated {
			self.licenses.push(license);
		}

		outcome
	}

	pub(crate) fn latest_license_for(&self, user: &UserId) -> Option<License> {
		self.licenses.iter().rev().find(|l| &l.user_id == user).cloned()
	}

	pub(crate) fn save_authorization_code(&mut self, code: AuthorizationCode) {
		self.authorization_codes.insert(code.code.expose().to_owned(), code);
	}

	pub(crate) fn redeem_authorization_code(
		&mut self,
		code: &str,
		binding: CodeBinding,
		draft: PairDraft,
	) -> Option<IssuedTokens> {
		let stored = self.authorization_codes.get(code)?;

		if stored.is_expired_at(binding.now) {
			self.authorization_codes.remove(code);

			return None;
		}
		if stored.client_id != binding.client_id || stored.redirect_uri != binding.redirect_uri {
			return None;
		}

		let stored = self.authorization_codes.remove(code)?;
		let issued = draft.bind(stored.user_id, stored.client_id);

		self.insert_pair(&issued);

		Some(issued)
	}

	pub(crate) fn rotate_refresh_token(
		&mut self,
		token: &str,
		client: &ClientId,
		draft: PairDraft,
	) -> Option<IssuedTokens> {
		let stored = self.refresh_tokens.get(token)?;

		if stored.is_expired_at(draft.issued_at) {
			self.remove_refresh_family(token);

			return None;
		}
		if &stored.client_id != client {
			return None;
		}

		let stored = self.remove_refresh_family(token)?;
		let issued = draft.bind(stored.user_id, stored.client_id);

		self.insert_pair(&issued);

		Some(issued)
	}

	pub(crate) fn access_token(&self, token: &str) -> Option<AccessToken> {
		self.access_tokens.get(token).cloned()
	}

	pub(crate) fn refresh_token(&self, token: &str) -> Option<RefreshToken> {
		self.refresh_tokens.get(token).cloned()
	}

	pub(crate) fn revoke_token(&mut self, token: &str) -> bool {
		if self.access_tokens.remove(token).is_some() {
			return true;
		}

		self.remove_refresh_family(token).is_some()
	}

	pub(crate) fn sweep_expired(&mut self, now: OffsetDateTime) -> SweepReport {
		let codes = self.authorization_codes.len();
		let access = self.access_tokens.len();
		let refresh = self.refresh_tokens.len();

		self.authorization_codes.retain(|_, code| !code.is_expired_at(now));
		self.access_tokens.retain(|_, token| !token.is_expired_at(now));
		self.refresh_tokens.retain(|_, token| !token.is_expired_at(now));

		SweepReport {
			authorization_codes: codes - self.authorization_codes.len(),
			access_tokens: access - self.access_tokens.len(),
			refresh_tokens: refresh - self.refresh_tokens.len(),
		}
	}

	fn insert_pair(&mut self, issued: &IssuedTokens) {
		self.access_tokens
			.insert(issued.access_token.token.expose().to_owned(), issued.access_token.clone());
		self.refresh_tokens
			.insert(issued.refresh_token.token.expose().to_owned(), issued.refresh_token.clone());
	}

	// Drops a refresh token together with every access token that back-references it.
	fn remove_refresh_family(&mut self, token: &str) -> Option<RefreshToken> {
		let removed = self.refresh_tokens.remove(token)?;

		self.access_tokens
			.retain(|_, access| access.refresh_token.as_ref().map(|r| r.expose()) != Some(token));

		Some(removed)
	}
}
