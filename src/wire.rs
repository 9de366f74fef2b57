//! Request parsing and response rendering for an HTTP binding.
//!
//! Routing, TLS, and process bootstrap stay with the embedding server; these helpers turn
//! raw form or JSON bodies into engine calls and engine results into a status code plus a
//! JSON body.

pub mod license;
pub mod token;

pub use license::*;
pub use token::*;

// crates.io
use oauth2::{
	StandardErrorResponse,
	basic::{BasicErrorResponse, BasicErrorResponseType},
};
// self
use crate::{_prelude::*, error::ErrorKind};

/// HTTP status and JSON body an HTTP binding writes back.
#[derive(Clone, Debug, PartialEq)]
pub struct Reply {
	/// HTTP status code.
	pub status: u16,
	/// JSON response body.
	pub body: serde_json::Value,
}
impl Reply {
	/// Serializes `body` with the given status.
	pub fn json<T>(status: u16, body: &T) -> Self
	where
		T: ?Sized + Serialize,
	{
		match serde_json::to_value(body) {
			Ok(body) => Self { status, body },
			Err(_) => Self::server_error(),
		}
	}

	/// Renders an engine error as a terse OAuth-style error body.
	pub fn from_error(err: &Error) -> Self {
		let body = ErrorBody::from_error(err);

		match serde_json::to_value(&body.response) {
			Ok(json) => Self { status: body.status, body: json },
			Err(_) => Self::server_error(),
		}
	}

	fn server_error() -> Self {
		Self { status: 500, body: serde_json::json!({ "error": "server_error" }) }
	}
}

/// Terse error response carrying only the `error` code.
///
/// The body never names the field that failed or carries internal error detail.
#[derive(Clone, Debug)]
pub struct ErrorBody {
	/// HTTP status the binding should answer with.
	pub status: u16,
	/// Serialized as `{"error": "<code>"}`.
	pub response: BasicErrorResponse,
}
impl ErrorBody {
	/// Maps an engine error onto an error code and status.
	pub fn from_error(err: &Error) -> Self {
		let code = match err {
			Error::UnsupportedGrantType { .. } => BasicErrorResponseType::UnsupportedGrantType,
			_ => match err.kind() {
				ErrorKind::Validation => BasicErrorResponseType::InvalidRequest,
				ErrorKind::InvalidClient => BasicErrorResponseType::InvalidClient,
				ErrorKind::InvalidGrant => BasicErrorResponseType::InvalidGrant,
				ErrorKind::NotFound => BasicErrorResponseType::Extension("not_found".into()),
				ErrorKind::Conflict => BasicErrorResponseType::Extension("conflict".into()),
				ErrorKind::Crypto | ErrorKind::Internal =>
					BasicErrorResponseType::Extension("server_error".into()),
			},
		};

		Self { status: err.http_status(), response: StandardErrorResponse::new(code, None, None) }
	}
}
