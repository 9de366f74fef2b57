//! License requests awaiting or carrying an administrator decision.

// self
use crate::{
	_prelude::*,
	auth::{RequestId, UserId},
};

/// Lifecycle status of a license request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
	/// Awaiting an administrator decision.
	Pending,
	/// Approved; a license was issued.
	Approved,
	/// Rejected by an administrator.
	Rejected,
}
impl RequestStatus {
	/// Returns the persisted spelling of the status.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Pending => "pending",
			Self::Approved => "approved",
			Self::Rejected => "rejected",
		}
	}

	/// Returns `true` once an administrator has decided the request.
	pub fn is_terminal(self) -> bool {
		!matches!(self, Self::Pending)
	}
}
impl Display for RequestStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// A user's request for a license, bound to the public key the license will be issued for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRequest {
	/// Opaque request identifier.
	pub id: RequestId,
	/// Requesting user.
	pub user_id: UserId,
	/// Requester's public key, stored verbatim.
	pub public_key: String,
	/// Current lifecycle status.
	pub status: RequestStatus,
	/// Creation instant.
	pub created_at: OffsetDateTime,
}
impl LicenseRequest {
	/// Creates a pending request with a fresh identifier.
	pub fn pending(
		user_id: UserId,
		public_key: impl Into<String>,
		created_at: OffsetDateTime,
	) -> Self {
		Self {
			id: RequestId::generate(),
			user_id,
			public_key: public_key.into(),
			status: RequestStatus::Pending,
			created_at,
		}
	}

	/// Returns `true` while the request awaits a decision.
	pub fn is_pending(&self) -> bool {
		self.status == RequestStatus::Pending
	}
}
