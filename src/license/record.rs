//! Issued licenses and the status view reported back to requesters.

// self
use crate::{
	_prelude::*,
	auth::{LicenseId, RequestId, UserId},
};

/// Status carried by an issued license.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
	/// Issued through an administrator approval.
	#[default]
	Approved,
}

/// Base64 (standard alphabet) text of a detached Ed25519 signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseSignature(String);
impl LicenseSignature {
	/// Wraps stored signature text without decoding it.
	pub fn new(encoded: impl Into<String>) -> Self {
		Self(encoded.into())
	}

	/// Returns the encoded signature text.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for LicenseSignature {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Immutable license issued as the side effect of approving one request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
	/// Opaque license identifier.
	pub id: LicenseId,
	/// Request whose approval produced this license.
	pub request_id: RequestId,
	/// License holder.
	pub user_id: UserId,
	/// Opaque license key covered by the signature.
	pub license_key: String,
	/// Signature over `license_key`.
	pub signature: LicenseSignature,
	/// License status.
	pub status: LicenseStatus,
	/// Issue instant.
	pub issued_at: OffsetDateTime,
}

/// License state reported to a requester.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseState {
	/// No license and no pending or rejected request.
	None,
	/// The latest request awaits a decision.
	Pending,
	/// The latest request was rejected.
	Rejected,
	/// A license verified against the current public key.
	Active,
}

/// Result of a license check, rendered as `{"hasLicense": .., "status": ..}`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseCheck {
	/// `true` only when `status` is [`LicenseState::Active`].
	pub has_license: bool,
	/// Reported state.
	pub status: LicenseState,
}
impl LicenseCheck {
	/// Builds a check result from a state.
	pub fn from_state(status: LicenseState) -> Self {
		Self { has_license: status == LicenseState::Active, status }
	}

	/// Returns `true` when the requester holds a verified license.
	pub fn is_active(&self) -> bool {
		self.has_license
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn check_serializes_with_camel_case_keys() {
		let body = serde_json::to_string(&LicenseCheck::from_state(LicenseState::Active))
			.expect("License check should serialize.");

		assert_eq!(body, r#"{"hasLicense":true,"status":"active"}"#);

		let pending: LicenseCheck =
			serde_json::from_str(r#"{"hasLicense":false,"status":"pending"}"#)
				.expect("Pending check should deserialize.");

		assert_eq!(pending, LicenseCheck::from_state(LicenseState::Pending));
		assert!(!pending.is_active());
	}
}
