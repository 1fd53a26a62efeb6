//! SDK-level error types shared across flows, the request pipeline, stores, and resources.

// self
use crate::_prelude::*;

/// SDK-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical SDK error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem or PKCE sequencing violation.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Retryable upstream failure whose retry budget ran out.
	#[error(transparent)]
	Transient(#[from] TransientError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Document search task did not produce a result.
	#[error(transparent)]
	SearchTask(#[from] SearchTaskError),

	/// Identity provider rejected the authorization code exchange.
	#[error("Token exchange failed: {reason}.")]
	AuthExchange {
		/// Provider error description, OAuth error code, or transport message.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Refresh was requested but no refresh token is stored.
	#[error("No refresh token is available.")]
	NoRefreshToken,
	/// Identity provider rejected the refresh grant; stored credentials were cleared.
	#[error("Token refresh failed: {reason}.")]
	RefreshFailed {
		/// Provider error description, OAuth error code, or transport message.
		reason: String,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// No usable access token and no way to obtain one without user interaction.
	#[error("No valid access token is available; run the authorization flow again.")]
	NotAuthenticated,
	/// The API kept rejecting the credentials after a refresh attempt.
	#[error("Authentication failed; re-authentication is required.")]
	ReauthenticationRequired,
	/// Resource API answered with a non-retryable error status.
	#[error("API Error ({}): {message}", display_status(.status))]
	Api {
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Most specific message extracted from the response.
		message: String,
	},
	/// Request body could not be serialized to JSON.
	#[error("Request body could not be encoded.")]
	Encode {
		/// Underlying serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Response body did not match the expected JSON shape.
	#[error("Response body could not be decoded.")]
	Decode {
		/// Structured parsing failure including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// HTTP status associated with the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::AuthExchange { status, .. }
			| Self::RefreshFailed { status, .. }
			| Self::Api { status, .. } => *status,
			Self::Transient(TransientError::RetriesExhausted { status, .. }) => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and validation failures raised by the SDK.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// One or more required settings were not supplied.
	#[error("Missing required settings: {}.", .names.join(", "))]
	MissingSettings {
		/// Every missing setting, in declaration order.
		names: Vec<&'static str>,
	},
	/// A URL-valued setting cannot be parsed.
	#[error("Setting `{setting}` is not a valid URL.")]
	InvalidUrl {
		/// Name of the offending setting.
		setting: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Environment tag is neither `sandbox` nor `production`.
	#[error("Environment `{value}` is not one of sandbox, production.")]
	InvalidEnvironment {
		/// Supplied value.
		value: String,
	},
	/// Agreement list contract tag is not recognized.
	#[error("Agreement list contract `{value}` is not one of user_agreement_list, data.")]
	InvalidAgreementListContract {
		/// Supplied value.
		value: String,
	},
	/// Requested scopes cannot be normalized.
	#[error("Requested scopes are invalid.")]
	InvalidScope(#[from] crate::auth::ScopeValidationError),
	/// Code exchange was attempted without a pending PKCE verifier.
	#[error("Code verifier missing; call build_authorization_url first.")]
	MissingVerifier,
	/// Agreement calls need an account identifier.
	#[error("Account ID is required for agreement API calls.")]
	MissingAccountId,
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Retryable failure variants surfaced once the retry budget is spent.
#[derive(Debug, ThisError)]
pub enum TransientError {
	/// Rate limiting (429) or server errors (5xx) persisted across every allowed attempt.
	#[error("API Error ({status}): {message} (gave up after {attempts} attempts).")]
	RetriesExhausted {
		/// Status of the last response.
		status: u16,
		/// Total number of sends, including the first one.
		attempts: u32,
		/// Most specific message extracted from the last response.
		message: String,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {endpoint}.")]
	Network {
		/// Short label of the endpoint being called.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred during transport.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error raised while calling `endpoint`.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Document search-task failures.
#[derive(Debug, ThisError)]
pub enum SearchTaskError {
	/// Task creation response carried neither `Id` nor `Href`.
	#[error("Search task response did not include a task ID.")]
	MissingTaskId,
	/// Task reported a terminal failure status.
	#[error("Search task failed with status: {status}.")]
	Failed {
		/// Status string reported by the API.
		status: String,
	},
	/// Task did not complete within the polling window.
	#[error("Search task timed out after {waited:?}.")]
	TimedOut {
		/// How long the poller waited.
		waited: std::time::Duration,
	},
}

fn display_status(status: &Option<u16>) -> String {
	status.map(|code| code.to_string()).unwrap_or_else(|| "Unknown".into())
}
