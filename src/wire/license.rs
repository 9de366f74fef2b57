//! License endpoint boundary: JSON bodies, query parsing, and replies.

// crates.io
use serde::de::DeserializeOwned;
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{RequestId, UserId},
	error::ValidationError,
	license::{LicenseManager, RequestStatus},
	wire::Reply,
};

/// `POST /api/create-license-request` body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateLicenseRequestBody {
	/// Requesting user.
	pub user_id: UserId,
	/// Requester's public key.
	pub public_key: String,
}

/// Acknowledgement returned when a request is created, found pending, or decided.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRequestAck {
	/// Request the acknowledgement refers to.
	pub request_id: RequestId,
	/// Request status after the call.
	pub status: RequestStatus,
	/// Human-readable summary.
	pub message: String,
}
impl LicenseRequestAck {
	fn new(request_id: RequestId, status: RequestStatus, message: &str) -> Self {
		Self { request_id, status, message: message.to_owned() }
	}
}

/// Administrator approve or reject body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionBody {
	/// Request to decide.
	pub id: RequestId,
}

/// Parses a JSON request body, reporting the failing path on error.
pub fn parse_json<T>(body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| Error::Validation(ValidationError::MalformedBody { source }))
}

/// Extracts `user_id` from a `check-license` query string.
pub fn check_license_query(query: &str) -> Result<UserId> {
	let user_id = form_urlencoded::parse(query.trim_start_matches('?').as_bytes())
		.find(|(key, _)| key == "user_id")
		.map(|(_, value)| value.into_owned())
		.filter(|value| !value.is_empty())
		.ok_or(Error::Validation(ValidationError::MissingParameter { name: "user_id" }))?;

	Ok(UserId::new(user_id)?)
}

impl LicenseManager {
	/// Handles a create-license-request body.
	///
	/// Answers 201 with the new request, or 409 naming the request that is still pending.
	pub async fn handle_create_request(&self, body: &[u8]) -> Reply {
		let body = match parse_json::<CreateLicenseRequestBody>(body) {
			Ok(body) => body,
			Err(e) => return Reply::from_error(&e),
		};

		match self.create_request(&body.user_id, &body.public_key).await {
			Ok(request) => Reply::json(
				201,
				&LicenseRequestAck::new(
					request.id,
					request.status,
					"License request submitted for approval.",
				),
			),
			Err(Error::DuplicatePendingRequest { request, .. }) => Reply::json(
				409,
				&LicenseRequestAck::new(
					request,
					RequestStatus::Pending,
					"A license request is already pending.",
				),
			),
			Err(e) => Reply::from_error(&e),
		}
	}

	/// Handles a check-license query string such as `user_id=42`.
	pub async fn handle_check_license(&self, query: &str) -> Reply {
		let result = match check_license_query(query) {
			Ok(user_id) => self.check_license(&user_id).await,
			Err(e) => Err(e),
		};

		match result {
			Ok(check) => Reply::json(200, &check),
			Err(e) => Reply::from_error(&e),
		}
	}

	/// Handles an administrator approval body.
	pub async fn handle_approve(&self, body: &[u8]) -> Reply {
		let result = match parse_json::<DecisionBody>(body) {
			Ok(decision) => self.approve(&decision.id).await.map(|license| license.request_id),
			Err(e) => Err(e),
		};

		decision_reply(result, RequestStatus::Approved, "License request approved.")
	}

	/// Handles an administrator rejection body.
	pub async fn handle_reject(&self, body: &[u8]) -> Reply {
		let result = match parse_json::<DecisionBody>(body) {
			Ok(decision) => self.reject(&decision.id).await.map(|()| decision.id),
			Err(e) => Err(e),
		};

		decision_reply(result, RequestStatus::Rejected, "License request rejected.")
	}

	/// Lists pending requests for the administrator view.
	pub async fn handle_pending_requests(&self) -> Reply {
		match self.pending_requests().await {
			Ok(requests) => Reply::json(200, &requests),
			Err(e) => Reply::from_error(&e),
		}
	}
}

fn decision_reply(result: Result<RequestId>, status: RequestStatus, message: &str) -> Reply {
	match result {
		Ok(request_id) => Reply::json(200, &LicenseRequestAck::new(request_id, status, message)),
		Err(e) => Reply::from_error(&e),
	}
}
