//! License request lifecycle: create, approve or reject, and check.
//!
//! Approvals are serialized per request through a singleflight guard, then committed with a
//! single store compare-and-set that flips the request to approved and stores the signed
//! license together. A signing failure therefore leaves the request pending, and two
//! concurrent approvals of one request produce exactly one license.

// crates.io
use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::{
	_prelude::*,
	auth::{LicenseId, RequestId, UserId, token::secret},
	clock::{Clock, SystemClock},
	error::ValidationError,
	license::{
		License, LicenseCheck, LicenseRequest, LicenseSigner, LicenseState, LicenseStatus,
		RequestStatus,
	},
	obs::{self, FlowKind},
	store::{CredentialStore, PendingInsertOutcome, StatusSwapOutcome},
};

const LICENSE_KEY_SALT_BYTES: usize = 32;

type GuardMap = Arc<Mutex<HashMap<RequestId, Arc<AsyncMutex<()>>>>>;

/// Drives license requests through their lifecycle.
#[derive(Clone)]
pub struct LicenseManager {
	store: Arc<dyn CredentialStore>,
	signer: Arc<dyn LicenseSigner>,
	clock: Arc<dyn Clock>,
	approval_guards: GuardMap,
}
impl LicenseManager {
	/// Creates a manager backed by the system clock.
	pub fn new(store: Arc<dyn CredentialStore>, signer: Arc<dyn LicenseSigner>) -> Self {
		Self::with_clock(store, signer, Arc::new(SystemClock))
	}

	/// Creates a manager reading time from `clock`.
	pub fn with_clock(
		store: Arc<dyn CredentialStore>,
		signer: Arc<dyn LicenseSigner>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self { store, signer, clock, approval_guards: Default::default() }
	}

	/// Records a pending license request for `user_id`.
	///
	/// Fails with [`Error::DuplicatePendingRequest`] while an earlier request of the same
	/// user awaits a decision.
	pub async fn create_request(
		&self,
		user_id: &UserId,
		public_key: &str,
	) -> Result<LicenseRequest> {
		obs::observe(FlowKind::CreateRequest, "create_request", async move {
			if public_key.trim().is_empty() {
				return Err(Error::from(ValidationError::EmptyPublicKey));
			}

			let request = LicenseRequest::pending(user_id.clone(), public_key, self.clock.now());

			match self.store.insert_request_if_idle(request.clone()).await? {
				PendingInsertOutcome::Inserted => Ok(request),
				PendingInsertOutcome::PendingExists(id) =>
					Err(Error::DuplicatePendingRequest { user: user_id.clone(), request: id }),
			}
		})
		.await
	}

	/// Approves a pending request and issues its signed license.
	pub async fn approve(&self, request_id: &RequestId) -> Result<License> {
		obs::observe(FlowKind::Approve, "approve", async move {
			let guard = self.approval_guard(request_id);
			let result = {
				let _singleflight = guard.lock().await;

				self.approve_locked(request_id).await
			};

			self.release_approval_guard(request_id, &guard);

			result
		})
		.await
	}

	/// Rejects a pending request.
	pub async fn reject(&self, request_id: &RequestId) -> Result<()> {
		obs::observe(FlowKind::Reject, "reject", async move {
			let outcome = self
				.store
				.compare_status_and_set(request_id, RequestStatus::Pending, RequestStatus::Rejected)
				.await?;

			settle(request_id, outcome)
		})
		.await
	}

	/// Reports the license state of `user_id`.
	///
	/// A license counts only when its signature verifies against the current public key;
	/// otherwise the latest request decides between `pending`, `rejected`, and `none`.
	pub async fn check_license(&self, user_id: &UserId) -> Result<LicenseCheck> {
		obs::observe(FlowKind::CheckLicense, "check_license", async move {
			if let Some(license) = self.store.latest_license_for(user_id).await?
				&& self.license_verifies(&license)
			{
				return Ok(LicenseCheck::from_state(LicenseState::Active));
			}

			let state = match self.store.latest_request_for(user_id).await? {
				Some(request) => match request.status {
					RequestStatus::Pending => LicenseState::Pending,
					RequestStatus::Rejected => LicenseState::Rejected,
					RequestStatus::Approved => LicenseState::None,
				},
				None => LicenseState::None,
			};

			Ok(LicenseCheck::from_state(state))
		})
		.await
	}

	/// Lists requests awaiting a decision, newest first.
	pub async fn pending_requests(&self) -> Result<Vec<LicenseRequest>> {
		Ok(self.store.pending_requests().await?)
	}

	/// Fetches a single request.
	pub async fn request(&self, request_id: &RequestId) -> Result<LicenseRequest> {
		self.store
			.fetch_request(request_id)
			.await?
			.ok_or(Error::NotFound { entity: "license request" })
	}

	async fn approve_locked(&self, request_id: &RequestId) -> Result<License> {
		let request = self.request(request_id).await?;

		if request.status.is_terminal() {
			return Err(Error::AlreadyProcessed { request: request.id, status: request.status });
		}

		let license_key = derive_license_key(&request.public_key);
		let signature = self.signer.sign(&license_key)?;
		let license = License {
			id: LicenseId::generate(),
			request_id: request.id,
			user_id: request.user_id,
			license_key,
			signature,
			status: LicenseStatus::Approved,
			issued_at: self.clock.now(),
		};
		let outcome = self.store.approve_with_license(license.clone()).await?;

		settle(request_id, outcome)?;

		Ok(license)
	}

	fn license_verifies(&self, license: &License) -> bool {
		if license.status != LicenseStatus::Approved {
			return false;
		}

		match self.signer.verify(&license.license_key, &license.signature) {
			Ok(true) => true,
			Ok(false) => {
				obs::warn_event(
					FlowKind::CheckLicense,
					"verify_signature",
					&format_args!("License {} failed signature verification.", license.id),
				);

				false
			},
			Err(e) => {
				obs::warn_event(
					FlowKind::CheckLicense,
					"verify_signature",
					&format_args!("License {} carries an unusable signature: {e}", license.id),
				);

				false
			},
		}
	}

	fn approval_guard(&self, request_id: &RequestId) -> Arc<AsyncMutex<()>> {
		let mut guards = self.approval_guards.lock();

		guards.entry(request_id.clone()).or_insert_with(|| Arc::new(AsyncMutex::new(()))).clone()
	}

	// Drops the map entry once no other approval holds a handle to it.
	fn release_approval_guard(&self, request_id: &RequestId, guard: &Arc<AsyncMutex<()>>) {
		let mut guards = self.approval_guards.lock();

		if Arc::strong_count(guard) <= 2 {
			guards.remove(request_id);
		}
	}
}

fn settle(request_id: &RequestId, outcome: StatusSwapOutcome) -> Result<()> {
	match outcome {
		StatusSwapOutcome::Updated => Ok(()),
		StatusSwapOutcome::StatusMismatch(status) =>
			Err(Error::AlreadyProcessed { request: request_id.clone(), status }),
		StatusSwapOutcome::Missing => Err(Error::NotFound { entity: "license request" }),
	}
}

/// Derives an opaque license key scoped to the requester's public key.
///
/// The key is the unpadded base64url SHA-256 digest of the public key followed by
/// fresh random bytes, so two approvals never share a key.
pub fn derive_license_key(public_key: &str) -> String {
	let mut hasher = Sha256::new();

	hasher.update(public_key.as_bytes());
	hasher.update(secret::random_bytes(LICENSE_KEY_SALT_BYTES));

	URL_SAFE_NO_PAD.encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn license_keys_are_unique_per_derivation() {
		let a = derive_license_key("pk-42");
		let b = derive_license_key("pk-42");

		assert_eq!(a.len(), 43);
		assert_ne!(a, b);
	}
}
