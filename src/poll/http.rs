//! Remote [`LicenseAuthority`] speaking to a license server over HTTP.

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::{StatusCode, redirect::Policy};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::UserId,
	error::{ConfigError, TransientError, TransportError},
	license::LicenseCheck,
	obs::{self, FlowKind},
	poll::{AuthorityFuture, LicenseAuthority, RequestReceipt},
	wire::{CreateLicenseRequestBody, LicenseRequestAck},
};

const REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Calls `GET {base}/api/check-license` and `POST {base}/api/create-license-request`.
///
/// Redirects are not followed. Non-success statuses and unparsable bodies surface as
/// [`TransientError`]; connection failures surface as [`TransportError`].
#[derive(Clone, Debug)]
pub struct ReqwestLicenseClient {
	http: ReqwestClient,
	base: Url,
}
impl ReqwestLicenseClient {
	/// Builds a client for the license server at `base`.
	pub fn new(base: &str) -> Result<Self> {
		let http = ReqwestClient::builder()
			.timeout(REQUEST_TIMEOUT)
			.redirect(Policy::none())
			.build()
			.map_err(ConfigError::http_client_build)?;

		Self::with_client(http, base)
	}

	/// Wraps an existing reqwest client.
	pub fn with_client(http: ReqwestClient, base: &str) -> Result<Self> {
		let mut base = Url::parse(base).map_err(|source| ConfigError::InvalidEndpoint { source })?;

		// Relative joins keep any path prefix only when it ends with a slash.
		if !base.path().ends_with('/') {
			let path = format!("{}/", base.path());

			base.set_path(&path);
		}

		Ok(Self { http, base })
	}

	/// License server base URL.
	pub fn base(&self) -> &Url {
		&self.base
	}

	fn endpoint(&self, path: &str) -> Result<Url> {
		Ok(self.base.join(path).map_err(|source| ConfigError::InvalidEndpoint { source })?)
	}

	async fn check(&self, user: &UserId) -> Result<LicenseCheck> {
		let mut url = self.endpoint("api/check-license")?;

		url.query_pairs_mut().append_pair("user_id", user);

		let response = self.http.get(url).send().await.map_err(TransportError::from)?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::from)?;

		if !status.is_success() {
			return Err(unexpected("check-license", status));
		}

		parse_body(&body, status)
	}

	async fn submit(&self, user: &UserId, public_key: &str) -> Result<RequestReceipt> {
		let url = self.endpoint("api/create-license-request")?;
		let payload =
			CreateLicenseRequestBody { user_id: user.clone(), public_key: public_key.to_owned() };
		let response =
			self.http.post(url).json(&payload).send().await.map_err(TransportError::from)?;
		let status = response.status();
		let body = response.bytes().await.map_err(TransportError::from)?;

		match status {
			StatusCode::CREATED | StatusCode::OK => {
				let ack: LicenseRequestAck = parse_body(&body, status)?;

				Ok(RequestReceipt::Submitted(ack.request_id))
			},
			StatusCode::CONFLICT => {
				let ack: LicenseRequestAck = parse_body(&body, status)?;

				Ok(RequestReceipt::AlreadyPending(ack.request_id))
			},
			_ => Err(unexpected("create-license-request", status)),
		}
	}
}
impl LicenseAuthority for ReqwestLicenseClient {
	fn check_license<'a>(&'a self, user: &'a UserId) -> AuthorityFuture<'a, LicenseCheck> {
		Box::pin(obs::observe(FlowKind::Poll, "http_check_license", self.check(user)))
	}

	fn request_license<'a>(
		&'a self,
		user: &'a UserId,
		public_key: &'a str,
	) -> AuthorityFuture<'a, RequestReceipt> {
		let submit = self.submit(user, public_key);

		Box::pin(obs::observe(FlowKind::Poll, "http_request_license", submit))
	}
}

fn unexpected(endpoint: &str, status: StatusCode) -> Error {
	TransientError::Endpoint {
		message: format!("{endpoint} answered with HTTP {}", status.as_u16()),
		status: Some(status.as_u16()),
	}
	.into()
}

fn parse_body<T>(body: &[u8], status: StatusCode) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de).map_err(|source| {
		TransientError::ResponseParse { source, status: Some(status.as_u16()) }.into()
	})
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn base_gains_a_trailing_slash() {
		let client = ReqwestLicenseClient::new("https://licenses.example.com/tenant")
			.expect("Client should build.");

		assert_eq!(client.base().as_str(), "https://licenses.example.com/tenant/");
		assert_eq!(
			client.endpoint("api/check-license").expect("Endpoint should join.").as_str(),
			"https://licenses.example.com/tenant/api/check-license"
		);
	}

	#[test]
	fn invalid_base_is_a_config_error() {
		assert!(matches!(
			ReqwestLicenseClient::new("not a url"),
			Err(Error::Config(ConfigError::InvalidEndpoint { .. }))
		));
	}
}
