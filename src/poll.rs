//! Client-side contract for waiting on an administrator's license decision.
//!
//! A [`LicensePoller`] asks a [`LicenseAuthority`] for the license state at a fixed
//! interval until the license is active, the request is rejected, or the deadline
//! passes. The authority is either a [`LicenseManager`] in the same process or a
//! remote license server reached through [`ReqwestLicenseClient`].

#[cfg(feature = "reqwest")] pub mod http;
#[cfg(feature = "reqwest")] pub use http::ReqwestLicenseClient;

// crates.io
use tokio::time::{Instant, sleep};
// self
use crate::{
	_prelude::*,
	auth::{RequestId, UserId},
	config::{EngineConfig, MAX_DURATION},
	license::{LicenseCheck, LicenseManager, LicenseState},
	obs::{self, FlowKind, FlowSpan},
};

/// Boxed future returned by [`LicenseAuthority`] operations.
pub type AuthorityFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Source of truth a polling client asks about license state.
pub trait LicenseAuthority
where
	Self: Send + Sync,
{
	/// Reports the license state of `user`.
	fn check_license<'a>(&'a self, user: &'a UserId) -> AuthorityFuture<'a, LicenseCheck>;

	/// Submits a license request for `user`.
	///
	/// A request that is already pending is reported as [`RequestReceipt::AlreadyPending`]
	/// rather than as an error.
	fn request_license<'a>(
		&'a self,
		user: &'a UserId,
		public_key: &'a str,
	) -> AuthorityFuture<'a, RequestReceipt>;
}
impl LicenseAuthority for LicenseManager {
	fn check_license<'a>(&'a self, user: &'a UserId) -> AuthorityFuture<'a, LicenseCheck> {
		Box::pin(LicenseManager::check_license(self, user))
	}

	fn request_license<'a>(
		&'a self,
		user: &'a UserId,
		public_key: &'a str,
	) -> AuthorityFuture<'a, RequestReceipt> {
		Box::pin(async move {
			match self.create_request(user, public_key).await {
				Ok(request) => Ok(RequestReceipt::Submitted(request.id)),
				Err(Error::DuplicatePendingRequest { request, .. }) =>
					Ok(RequestReceipt::AlreadyPending(request)),
				Err(e) => Err(e),
			}
		})
	}
}

/// Outcome of submitting a license request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RequestReceipt {
	/// A new request was recorded.
	Submitted(RequestId),
	/// An earlier request is still awaiting a decision.
	AlreadyPending(RequestId),
}
impl RequestReceipt {
	/// Request the client is now waiting on.
	pub fn request_id(&self) -> &RequestId {
		match self {
			Self::Submitted(id) | Self::AlreadyPending(id) => id,
		}
	}
}

/// Final state observed by a [`LicensePoller`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PollOutcome {
	/// The license is active.
	Approved(LicenseCheck),
	/// The administrator rejected the request.
	Rejected,
	/// No decision arrived before the deadline.
	TimedOut {
		/// Number of checks performed.
		attempts: u32,
	},
}

/// Polls a [`LicenseAuthority`] until a decision or the deadline.
#[derive(Clone)]
pub struct LicensePoller {
	authority: Arc<dyn LicenseAuthority>,
	interval: Duration,
	deadline: Duration,
}
impl LicensePoller {
	/// Creates a poller with the default interval (10 s) and deadline (5 min).
	pub fn new(authority: Arc<dyn LicenseAuthority>) -> Self {
		Self::from_config(authority, &EngineConfig::default())
	}

	/// Creates a poller using the configured interval and deadline.
	pub fn from_config(authority: Arc<dyn LicenseAuthority>, config: &EngineConfig) -> Self {
		Self { authority, interval: config.poll_interval, deadline: config.poll_deadline }
	}

	/// Overrides the pause between checks, clamped to `0..=MAX_DURATION`.
	pub fn with_interval(mut self, interval: Duration) -> Self {
		self.interval = interval.clamp(Duration::ZERO, MAX_DURATION);

		self
	}

	/// Overrides how long to wait for a decision, clamped to `0..=MAX_DURATION`.
	pub fn with_deadline(mut self, deadline: Duration) -> Self {
		self.deadline = deadline.clamp(Duration::ZERO, MAX_DURATION);

		self
	}

	/// Checks the license state until it is active, rejected, or the deadline passes.
	///
	/// Failed checks are logged and retried on the next tick.
	pub async fn wait_for_decision(&self, user: &UserId) -> PollOutcome {
		FlowSpan::new(FlowKind::Poll, "wait_for_decision").instrument(self.poll(user)).await
	}

	/// Checks once, submits a request unless the license is already decided, then waits.
	pub async fn request_and_wait(&self, user: &UserId, public_key: &str) -> Result<PollOutcome> {
		obs::observe(FlowKind::Poll, "request_and_wait", async move {
			let check = self.authority.check_license(user).await?;

			if let Some(outcome) = decided(check) {
				return Ok(outcome);
			}
			if check.status != LicenseState::Pending {
				let receipt = self.authority.request_license(user, public_key).await?;

				obs::info_event(
					FlowKind::Poll,
					"request_license",
					&format_args!("Waiting on license request {}.", receipt.request_id()),
				);
			}

			Ok(self.poll(user).await)
		})
		.await
	}

	async fn poll(&self, user: &UserId) -> PollOutcome {
		let deadline = Instant::now() + self.deadline.unsigned_abs();
		let interval = self.interval.unsigned_abs();
		let mut attempts = 0;

		loop {
			attempts += 1;

			match self.authority.check_license(user).await {
				Ok(check) =>
					if let Some(outcome) = decided(check) {
						return outcome;
					},
				Err(e) => obs::warn_event(FlowKind::Poll, "check_license", &e),
			}

			let now = Instant::now();

			if now >= deadline {
				obs::warn_event(
					FlowKind::Poll,
					"deadline",
					&format_args!("No license decision after {attempts} checks."),
				);

				return PollOutcome::TimedOut { attempts };
			}

			sleep(interval.min(deadline - now)).await;
		}
	}
}

fn decided(check: LicenseCheck) -> Option<PollOutcome> {
	match check.status {
		LicenseState::Active => Some(PollOutcome::Approved(check)),
		LicenseState::Rejected => Some(PollOutcome::Rejected),
		LicenseState::None | LicenseState::Pending => None,
	}
}
