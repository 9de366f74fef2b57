//! Optional observability helpers for engine operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `credential_broker.flow` with the `flow`
//!   (operation) and `stage` (call site) fields, plus warning/info events for notable conditions.
//! - Enable `metrics` to increment the `credential_broker_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Engine operations observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// License request creation.
	CreateRequest,
	/// Administrator approval.
	Approve,
	/// Administrator rejection.
	Reject,
	/// License status check.
	CheckLicense,
	/// Authorization code issuance.
	AuthorizationCode,
	/// Authorization code exchange.
	ExchangeCode,
	/// Refresh token rotation.
	Refresh,
	/// Token introspection.
	Introspect,
	/// Token revocation.
	Revoke,
	/// Expiry sweep.
	Sweep,
	/// Client-side license polling.
	Poll,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::CreateRequest => "create_request",
			FlowKind::Approve => "approve",
			FlowKind::Reject => "reject",
			FlowKind::CheckLicense => "check_license",
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::ExchangeCode => "exchange_code",
			FlowKind::Refresh => "refresh",
			FlowKind::Introspect => "introspect",
			FlowKind::Revoke => "revoke",
			FlowKind::Sweep => "sweep",
			FlowKind::Poll => "poll",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an engine operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a [`FlowSpan`] and records attempt plus success/failure outcomes.
pub(crate) async fn observe<T, E, Fut>(
	kind: FlowKind,
	stage: &'static str,
	fut: Fut,
) -> Result<T, E>
where
	Fut: Future<Output = Result<T, E>>,
{
	let span = FlowSpan::new(kind, stage);

	record_flow_outcome(kind, FlowOutcome::Attempt);

	let result = span.instrument(fut).await;

	record_flow_outcome(
		kind,
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure },
	);

	result
}
