//! Engine-level error types shared across the license, token, store, and polling layers.

// std
use std::path::PathBuf;
// self
use crate::{
	_prelude::*,
	auth::{IdentifierError, RequestId, UserId},
	license::RequestStatus,
};

/// Engine-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn StdError + Send + Sync>;

/// Canonical engine error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Signing, verification, or key material failure.
	#[error(transparent)]
	Crypto(#[from] CryptoError),
	/// Caller supplied malformed input.
	#[error(transparent)]
	Validation(#[from] ValidationError),
	/// Temporary upstream failure; retry with backoff.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Referenced entity does not exist.
	#[error("The requested {entity} does not exist.")]
	NotFound {
		/// Entity label (e.g., `license request`).
		entity: &'static str,
	},
	/// The user already has a request awaiting an administrator decision.
	#[error("User {user} already has pending license request {request}.")]
	DuplicatePendingRequest {
		/// User that attempted to create the request.
		user: UserId,
		/// Identifier of the request that is still pending.
		request: RequestId,
	},
	/// The request already left the pending state.
	#[error("License request {request} was already {status}.")]
	AlreadyProcessed {
		/// Identifier of the processed request.
		request: RequestId,
		/// Terminal status the request is in.
		status: RequestStatus,
	},
	/// Client authentication failed or the client is unknown.
	#[error("Client authentication failed.")]
	InvalidClient,
	/// Authorization code or refresh token is unknown, expired, or bound elsewhere.
	#[error("The authorization grant is invalid.")]
	InvalidGrant,
	/// The `grant_type` parameter names a grant the engine does not issue.
	#[error("Grant type `{grant}` is not supported.")]
	UnsupportedGrantType {
		/// Grant type supplied by the caller.
		grant: String,
	},
}
impl Error {
	/// Classifies the error into the coarse taxonomy exposed to bindings.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::Validation(_) => ErrorKind::Validation,
			Self::NotFound { .. } => ErrorKind::NotFound,
			Self::DuplicatePendingRequest { .. } | Self::AlreadyProcessed { .. } =>
				ErrorKind::Conflict,
			Self::InvalidClient => ErrorKind::InvalidClient,
			Self::InvalidGrant | Self::UnsupportedGrantType { .. } => ErrorKind::InvalidGrant,
			Self::Crypto(_) => ErrorKind::Crypto,
			Self::Storage(_) | Self::Config(_) | Self::Transient(_) | Self::Transport(_) =>
				ErrorKind::Internal,
		}
	}

	/// HTTP status an HTTP binding should answer with.
	pub fn http_status(&self) -> u16 {
		match self {
			Self::Transient(_) | Self::Transport(_) => 502,
			_ => match self.kind() {
				ErrorKind::Validation | ErrorKind::InvalidGrant => 400,
				ErrorKind::InvalidClient => 401,
				ErrorKind::NotFound => 404,
				ErrorKind::Conflict => 409,
				ErrorKind::Crypto | ErrorKind::Internal => 500,
			},
		}
	}
}
impl From<IdentifierError> for Error {
	fn from(e: IdentifierError) -> Self {
		ValidationError::from(e).into()
	}
}

/// Coarse error taxonomy shared by every operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Malformed input.
	Validation,
	/// Unknown id, token, or code.
	NotFound,
	/// Duplicate pending request or already-processed request.
	Conflict,
	/// OAuth client authentication failure.
	InvalidClient,
	/// OAuth grant failure.
	InvalidGrant,
	/// Signing, verification, or key load failure.
	Crypto,
	/// Store, configuration, or transport failure.
	Internal,
}

/// Configuration and validation failures raised while building engine settings.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A lifetime or interval was zero or negative.
	#[error("The {field} duration must be positive.")]
	NonPositiveDuration {
		/// Configuration field that failed validation.
		field: &'static str,
	},
	/// A lifetime or interval exceeds the supported maximum.
	#[error("The {field} duration must not exceed {max}.")]
	DurationTooLarge {
		/// Configuration field that failed validation.
		field: &'static str,
		/// Largest accepted duration.
		max: Duration,
	},
	/// Random token length is below the supported minimum.
	#[error("Random tokens need at least {min} bytes of entropy, got {actual}.")]
	InsufficientEntropy {
		/// Minimum supported byte count.
		min: usize,
		/// Configured byte count.
		actual: usize,
	},
	/// Refresh tokens must outlive the access tokens they renew.
	#[error("The refresh token lifetime must not be shorter than the access token lifetime.")]
	RefreshShorterThanAccess,
	/// Configuration document could not be parsed.
	#[error("Engine configuration is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// License server endpoint URL cannot be joined or parsed.
	#[error("License server endpoint is invalid.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Signing, verification, and key material failures.
#[derive(Debug, ThisError)]
pub enum CryptoError {
	/// Key material could not be loaded.
	#[error(transparent)]
	KeyLoad(#[from] KeyLoadError),
	/// Signature text is not base64-encoded Ed25519 signature bytes.
	#[error("License signature encoding is malformed.")]
	MalformedSignature,
	/// The signing backend failed to produce a signature.
	#[error("License signing failed: {message}.")]
	Signing {
		/// Backend-supplied failure description.
		message: String,
	},
}

/// Failures raised while loading the signing key pair.
#[derive(Debug, ThisError)]
pub enum KeyLoadError {
	/// Key file could not be read.
	#[error("Failed to read key file {}.", .path.display())]
	Read {
		/// Path that failed to load.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Private key PEM is not a PKCS#8 Ed25519 key.
	#[error("Private key is malformed: {message}.")]
	PrivateKey {
		/// Decoder failure description.
		message: String,
	},
	/// Public key PEM is not an SPKI Ed25519 key.
	#[error("Public key is malformed: {message}.")]
	PublicKey {
		/// Decoder failure description.
		message: String,
	},
	/// The configured public key does not belong to the private key.
	#[error("Public key does not match the private key.")]
	KeyPairMismatch,
}

/// Malformed caller input.
#[derive(Debug, ThisError)]
pub enum ValidationError {
	/// Identifier failed validation.
	#[error(transparent)]
	Identifier(#[from] IdentifierError),
	/// License requests must carry the requester's public key.
	#[error("Public key cannot be empty.")]
	EmptyPublicKey,
	/// Redirect URI cannot be parsed.
	#[error("Redirect URI is invalid.")]
	InvalidRedirect {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required request parameter is absent or empty.
	#[error("Request is missing the `{name}` parameter.")]
	MissingParameter {
		/// Parameter name.
		name: &'static str,
	},
	/// A form parameter appeared more than once.
	#[error("Request repeats the `{name}` parameter.")]
	DuplicateParameter {
		/// Parameter name.
		name: String,
	},
	/// JSON request body could not be parsed.
	#[error("Request body is malformed.")]
	MalformedBody {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

/// Temporary failure variants (safe to retry).
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// License server returned an unexpected but non-fatal response.
	#[error("License server returned an unexpected response: {message}.")]
	Endpoint {
		/// Summary of the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// License server responded with JSON that could not be parsed.
	#[error("License server returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the license server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + StdError) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
