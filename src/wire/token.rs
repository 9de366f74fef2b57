//! OAuth2 token endpoint boundary: form parsing and token responses.

// crates.io
use oauth2::{
	AccessToken as OAuthAccessToken, EmptyExtraTokenFields, RefreshToken as OAuthRefreshToken,
	StandardErrorResponse, StandardTokenResponse,
	basic::{BasicErrorResponseType, BasicTokenResponse, BasicTokenType},
};
use url::form_urlencoded;
// self
use crate::{
	_prelude::*,
	auth::{ClientId, IssuedTokens, TokenSecret, UserId},
	error::ValidationError,
	tokens::TokenEngine,
	wire::Reply,
};

/// Parsed `application/x-www-form-urlencoded` token request.
#[derive(Clone, Debug)]
pub enum TokenRequest {
	/// `grant_type=authorization_code`.
	AuthorizationCode {
		/// Authorization code issued to the client.
		code: TokenSecret,
		/// Redirect URI the code was issued for.
		redirect_uri: String,
		/// Client identifier.
		client_id: ClientId,
		/// Client secret.
		client_secret: TokenSecret,
	},
	/// `grant_type=refresh_token`.
	RefreshToken {
		/// Refresh token to rotate.
		refresh_token: TokenSecret,
		/// Client identifier.
		client_id: ClientId,
		/// Client secret.
		client_secret: TokenSecret,
	},
}
impl TokenRequest {
	/// Parses a form-encoded token request body.
	///
	/// Grant types other than `authorization_code` and `refresh_token` fail with
	/// [`Error::UnsupportedGrantType`]; absent, empty, or repeated parameters fail validation.
	pub fn from_form(body: &[u8]) -> Result<Self> {
		let mut params: HashMap<String, String> = HashMap::new();

		for (name, value) in form_urlencoded::parse(body).into_owned() {
			if params.contains_key(&name) {
				return Err(ValidationError::DuplicateParameter { name }.into());
			}

			params.insert(name, value);
		}

		let client_id =
			|| -> Result<ClientId> { Ok(ClientId::new(required(&params, "client_id")?)?) };
		let client_secret = || required(&params, "client_secret").map(TokenSecret::new);

		match required(&params, "grant_type")? {
			"authorization_code" => Ok(Self::AuthorizationCode {
				code: TokenSecret::new(required(&params, "code")?),
				redirect_uri: required(&params, "redirect_uri")?.to_owned(),
				client_id: client_id()?,
				client_secret: client_secret()?,
			}),
			"refresh_token" => Ok(Self::RefreshToken {
				refresh_token: TokenSecret::new(required(&params, "refresh_token")?),
				client_id: client_id()?,
				client_secret: client_secret()?,
			}),
			other => Err(Error::UnsupportedGrantType { grant: other.to_owned() }),
		}
	}

	/// Client the request authenticates as.
	pub fn client_id(&self) -> &ClientId {
		match self {
			Self::AuthorizationCode { client_id, .. } | Self::RefreshToken { client_id, .. } =>
				client_id,
		}
	}
}

fn required<'a>(params: &'a HashMap<String, String>, name: &'static str) -> Result<&'a str> {
	params
		.get(name)
		.map(String::as_str)
		.filter(|value| !value.is_empty())
		.ok_or(Error::Validation(ValidationError::MissingParameter { name }))
}

/// Renders an issued pair as `{access_token, refresh_token, token_type, expires_in}`.
pub fn token_response(issued: &IssuedTokens) -> BasicTokenResponse {
	let mut response = StandardTokenResponse::new(
		OAuthAccessToken::new(issued.access_token.token.expose().to_owned()),
		BasicTokenType::Bearer,
		EmptyExtraTokenFields {},
	);

	response.set_expires_in(Some(&issued.access_token.lifetime().unsigned_abs()));
	response.set_refresh_token(Some(OAuthRefreshToken::new(
		issued.refresh_token.token.expose().to_owned(),
	)));

	response
}

/// Identity resolved from a bearer token.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
	/// Owner of the presented access token.
	pub sub: UserId,
}

/// Extracts the credential from an `Authorization: Bearer <token>` header value.
pub fn bearer_token(authorization: &str) -> Option<&str> {
	let (scheme, token) = authorization.trim().split_once(' ')?;
	let token = token.trim();

	(scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl TokenEngine {
	/// Authenticates the client and runs the requested grant.
	pub async fn handle_token_request(&self, request: TokenRequest) -> Result<BasicTokenResponse> {
		let issued = match &request {
			TokenRequest::AuthorizationCode { code, redirect_uri, client_id, client_secret } =>
				self.exchange_code(code.expose(), client_id, client_secret.expose(), redirect_uri)
					.await?,
			TokenRequest::RefreshToken { refresh_token, client_id, client_secret } => {
				self.authenticate_client(client_id, client_secret.expose()).await?;

				self.refresh(refresh_token.expose(), client_id).await?
			},
		};

		Ok(token_response(&issued))
	}

	/// Parses a token endpoint body and renders the outcome.
	pub async fn handle_token_form(&self, body: &[u8]) -> Reply {
		let result = match TokenRequest::from_form(body) {
			Ok(request) => self.handle_token_request(request).await,
			Err(e) => Err(e),
		};

		match result {
			Ok(response) => Reply::json(200, &response),
			Err(e) => Reply::from_error(&e),
		}
	}

	/// Resolves the owner of a bearer token presented in an `Authorization` header.
	///
	/// Missing, malformed, unknown, and expired credentials all answer 401 with
	/// `invalid_token`.
	pub async fn handle_userinfo(&self, authorization: Option<&str>) -> Reply {
		let token = authorization.and_then(bearer_token);
		let user = match token {
			Some(token) => self.validate_access_token(token).await,
			None => Ok(None),
		};

		match user {
			Ok(Some(sub)) => Reply::json(200, &UserInfo { sub }),
			Ok(None) => Reply::json(
				401,
				&StandardErrorResponse::new(
					BasicErrorResponseType::Extension("invalid_token".into()),
					None,
					None,
				),
			),
			Err(e) => Reply::from_error(&e),
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::ErrorKind;

	#[test]
	fn form_parsing_covers_both_grants() {
		let request = TokenRequest::from_form(
			b"grant_type=authorization_code&code=abc&redirect_uri=https%3A%2F%2Fa%2Fcb&client_id=c1&client_secret=s1",
		)
		.expect("Authorization code form should parse.");

		match &request {
			TokenRequest::AuthorizationCode { code, redirect_uri, client_secret, .. } => {
				assert_eq!(code.expose(), "abc");
				assert_eq!(redirect_uri, "https://a/cb");
				assert_eq!(client_secret.expose(), "s1");
			},
			other => panic!("Unexpected request: {other:?}."),
		}
		assert_eq!(request.client_id().to_string(), "c1");

		let refresh = TokenRequest::from_form(
			b"grant_type=refresh_token&refresh_token=r1&client_id=c1&client_secret=s1",
		)
		.expect("Refresh form should parse.");

		assert!(matches!(refresh, TokenRequest::RefreshToken { .. }));
	}

	#[test]
	fn form_parsing_rejects_unknown_grants_and_missing_fields() {
		assert!(matches!(
			TokenRequest::from_form(b"grant_type=password&username=u&password=p"),
			Err(Error::UnsupportedGrantType { grant }) if grant == "password"
		));
		assert!(matches!(
			TokenRequest::from_form(b"grant_type=refresh_token&client_id=c1&client_secret=s1"),
			Err(Error::Validation(ValidationError::MissingParameter { name: "refresh_token" }))
		));
		assert!(matches!(
			TokenRequest::from_form(b"code=abc"),
			Err(Error::Validation(ValidationError::MissingParameter { name: "grant_type" }))
		));
	}

	#[test]
	fn form_parsing_rejects_repeated_parameters() {
		let err = TokenRequest::from_form(
			b"grant_type=refresh_token&refresh_token=r1&refresh_token=r2&client_id=c1",
		)
		.expect_err("Repeated parameters should be rejected.");

		match &err {
			Error::Validation(ValidationError::DuplicateParameter { name }) =>
				assert_eq!(name, "refresh_token"),
			other => panic!("Unexpected error: {other:?}."),
		}
		assert_eq!(err.kind(), ErrorKind::Validation);
	}

	#[test]
	fn secrets_stay_out_of_debug_output() {
		let request = TokenRequest::from_form(
			b"grant_type=refresh_token&refresh_token=r-secret&client_id=c1&client_secret=s-secret",
		)
		.expect("Refresh form should parse.");
		let rendered = format!("{request:?}");

		assert!(!rendered.contains("r-secret"));
		assert!(!rendered.contains("s-secret"));
	}

	#[test]
	fn bearer_header_parsing() {
		assert_eq!(bearer_token("Bearer abc"), Some("abc"));
		assert_eq!(bearer_token("bearer  abc "), Some("abc"));
		assert_eq!(bearer_token("Basic abc"), None);
		assert_eq!(bearer_token("Bearer"), None);
	}
}
