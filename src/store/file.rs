//! Simple file-backed [`CredentialStore`] for lightweight deployments.

// std
use std::{
	fs::{self, File},
	io::Write,
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, Client, ClientId, CodeBinding, IssuedTokens, PairDraft,
		RefreshToken, RequestId, UserId,
	},
	license::{License, LicenseRequest, RequestStatus},
	store::{
		CredentialStore, PendingInsertOutcome, StatusSwapOutcome, StoreError, StoreFuture,
		SweepReport, state::StoreState,
	},
};

/// Persists every credential record to a JSON snapshot after each mutation.
///
/// Writers are serialized by an async mutex. A mutation is applied to a copy of the
/// state, written to a temporary file, synced, and renamed over the snapshot; only then
/// is the in-memory state swapped. Readers never wait on disk I/O.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<StoreState>>,
	writer: Arc<AsyncMutex<()>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self {
			path,
			inner: Arc::new(RwLock::new(snapshot)),
			writer: Arc::new(AsyncMutex::new(())),
		})
	}

	/// Location of the JSON snapshot.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<StoreState, StoreError> {
		if !path.exists() {
			return Ok(StoreState::default());
		}

		let metadata = path.metadata().map_err(|e| StoreError::Backend {
			message: format!("Failed to inspect {}: {e}", path.display()),
		})?;

		if metadata.len() == 0 {
			return Ok(StoreState::default());
		}

		let bytes = fs::read(path).map_err(|e| StoreError::Backend {
			message: format!("Failed to read {}: {e}", path.display()),
		})?;

		serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
			message: format!("Failed to parse {}: {e}", path.display()),
		})
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist(&self, state: &StoreState) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized = serde_json::to_vec_pretty(state).map_err(|e| StoreError::Serialization {
			message: format!("Failed to serialize store snapshot: {e}"),
		})?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
		f(&self.inner.read())
	}

	async fn commit<T>(&self, f: impl FnOnce(&mut StoreState) -> T) -> Result<T, StoreError> {
		self.commit_if(f, |_| true).await
	}

	// Readers keep seeing the previous state until the snapshot is on disk.
	async fn commit_if<T>(
		&self,
		f: impl FnOnce(&mut StoreState) -> T,
		changed: impl FnOnce(&T) -> bool,
	) -> Result<T, StoreError> {
		let _writer = self.writer.lock().await;
		let mut next = self.inner.read().clone();
		let result = f(&mut next);

		if changed(&result) {
			self.persist(&next)?;

			*self.inner.write() = next;
		}

		Ok(result)
	}
}
impl CredentialStore for FileStore {
	fn save_client(&self, client: Client) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.commit(|state| state.save_client(client)).await })
	}

	fn fetch_client<'a>(&'a self, id: &'a ClientId) -> StoreFuture<'a, Option<Client>> {
		Box::pin(async move { Ok(self.read(|state| state.client(id))) })
	}

	fn insert_request_if_idle(
		&self,
		request: LicenseRequest,
	) -> StoreFuture<'_, PendingInsertOutcome> {
		Box::pin(
			async move { self.commit(|state| state.insert_request_if_idle(request)).await },
		)
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
		Box::pin(async move {
			self.commit(|state| state.compare_status_and_set(id, expected, new)).await
		})
	}

	fn approve_with_license(&self, license: License) -> StoreFuture<'_, StatusSwapOutcome> {
		Box::pin(async move { self.commit(|state| state.approve_with_license(license)).await })
	}

	fn latest_license_for<'a>(&'a self, user: &'a UserId) -> StoreFuture<'a, Option<License>> {
		Box::pin(async move { Ok(self.read(|state| state.latest_license_for(user))) })
	}

	fn save_authorization_code(&self, code: AuthorizationCode) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.commit(|state| state.save_authorization_code(code)).await })
	}

	fn redeem_authorization_code<'a>(
		&'a self,
		code: &'a str,
		binding: CodeBinding,
		draft: PairDraft,
	) -> StoreFuture<'a, Option<IssuedTokens>> {
		Box::pin(async move {
			self.commit(|state| state.redeem_authorization_code(code, binding, draft)).await
		})
	}

	fn rotate_refresh_token<'a>(
		&'a self,
		token: &'a str,
		client: &'a ClientId,
		draft: PairDraft,
	) -> StoreFuture<'a, Option<IssuedTokens>> {
		Box::pin(async move {
			self.commit(|state| state.rotate_refresh_token(token, client, draft)).await
		})
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
		Box::pin(async move { self.commit(|state| state.revoke_token(token)).await })
	}

	fn sweep_expired(&self, now: OffsetDateTime) -> StoreFuture<'_, SweepReport> {
		Box::pin(async move {
			self.commit_if(|state| state.sweep_expired(now), |report| report.total() > 0).await
		})
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::{env, process};
	// crates.io
	use tokio::runtime::Runtime;
	// self
	use super::*;
	use crate::auth::TokenSecret;

	fn temp_path() -> PathBuf {
		let unique = format!(
			"credential_broker_file_store_{}_{}.json",
			process::id(),
			OffsetDateTime::now_utc().unix_timestamp_nanos(),
		);

		env::temp_dir().join(unique)
	}

	fn user() -> UserId {
		UserId::new("42").expect("User fixture should be valid.")
	}

	#[test]
	fn requests_and_clients_survive_reopen() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let request = LicenseRequest::pending(user(), "pk-42", OffsetDateTime::now_utc());
		let client = Client::new(
			ClientId::new("c1").expect("Client fixture should be valid."),
			"s1",
			UserId::new("u1").expect("User fixture should be valid."),
		);

		rt.block_on(store.insert_request_if_idle(request.clone()))
			.expect("Failed to insert request into file store.");
		rt.block_on(store.save_client(client.clone())).expect("Failed to save client.");
		drop(store);

		let reopened = FileStore::open(&path).expect("Failed to reopen file store snapshot.");
		let fetched = rt
			.block_on(reopened.latest_request_for(&user()))
			.expect("Failed to fetch request from file store.")
			.expect("File store lost request after reopen.");
		let fetched_client = rt
			.block_on(reopened.fetch_client(&client.id))
			.expect("Failed to fetch client from file store.")
			.expect("File store lost client after reopen.");

		assert_eq!(fetched, request);
		assert!(fetched_client.authenticate("s1"));
		assert_eq!(
			rt.block_on(reopened.insert_request_if_idle(LicenseRequest::pending(
				user(),
				"pk-42",
				OffsetDateTime::now_utc(),
			)))
			.expect("Duplicate insert should not fail at the storage layer."),
			PendingInsertOutcome::PendingExists(request.id),
		);

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn failed_persist_leaves_state_untouched() {
		let dir = temp_path();
		let path = dir.join("store.json");
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");

		// Replace the snapshot location with a directory so the rename fails.
		fs::create_dir_all(&path).expect("Failed to create blocking directory.");

		let result = rt.block_on(store.insert_request_if_idle(LicenseRequest::pending(
			user(),
			"pk-42",
			OffsetDateTime::now_utc(),
		)));

		assert!(matches!(result, Err(StoreError::Backend { .. })));
		assert!(
			rt.block_on(store.latest_request_for(&user()))
				.expect("Reads should still succeed.")
				.is_none()
		);

		fs::remove_dir_all(&dir).unwrap_or_else(|e| {
			panic!("Failed to remove temporary directory {}: {e}", dir.display())
		});
	}

	#[test]
	fn empty_sweep_does_not_rewrite_snapshot() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let now = OffsetDateTime::now_utc();

		let report = rt.block_on(store.sweep_expired(now)).expect("Empty sweep should succeed.");

		assert_eq!(report.total(), 0);
		assert!(!path.exists());

		rt.block_on(store.save_authorization_code(AuthorizationCode {
			code: TokenSecret::new("abc"),
			client_id: ClientId::new("c1").expect("Client fixture should be valid."),
			user_id: user(),
			redirect_uri: "https://a/cb".into(),
			issued_at: now - Duration::minutes(10),
			expires_at: now - Duration::minutes(5),
		}))
		.expect("Failed to save authorization code.");
		fs::remove_file(&path).expect("Failed to remove snapshot before sweeping.");

		let report = rt.block_on(store.sweep_expired(now)).expect("Sweep should succeed.");

		assert_eq!(report.authorization_codes, 1);
		assert!(path.exists());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}

	#[test]
	fn reads_proceed_while_a_writer_holds_the_commit_lock() {
		let path = temp_path();
		let store = FileStore::open(&path).expect("Failed to open file store snapshot.");
		let rt = Runtime::new().expect("Failed to build Tokio runtime for file store test.");
		let request = LicenseRequest::pending(user(), "pk-42", OffsetDateTime::now_utc());

		rt.block_on(store.insert_request_if_idle(request.clone()))
			.expect("Failed to insert request into file store.");

		let writer = rt.block_on(store.writer.lock());
		let fetched = rt
			.block_on(store.latest_request_for(&user()))
			.expect("Reads should not wait for the writer.")
			.expect("Request should be visible.");

		assert_eq!(fetched, request);
		assert!(store.writer.try_lock().is_none());

		drop(writer);

		assert!(store.writer.try_lock().is_some());

		fs::remove_file(&path).unwrap_or_else(|e| {
			panic!("Failed to remove temporary file store snapshot {}: {e}", path.display())
		});
	}
}
