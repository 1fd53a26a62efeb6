//! Internal OAuth client facade over the `oauth2` crate.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken, RequestTokenError,
	TokenResponse, TokenUrl,
	basic::{BasicClient, BasicRequestTokenError, BasicTokenResponse, BasicTokenType},
};
// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, TokenRecord},
	config::ClientConfig,
	http::{self, ResponseMetadataSlot, TokenHttpClient},
};

/// Longest lifetime kept from a token response; larger values are clamped.
const MAX_TOKEN_LIFETIME_SECS: i64 = 365 * 24 * 60 * 60;

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeFuture<'a, T> =
	Pin<Box<dyn Future<Output = Result<T, TokenEndpointFailure>> + 'a + Send>>;

/// Why a token endpoint call did not produce a record.
///
/// Callers translate it into the grant-specific SDK error.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TokenEndpointFailure {
	/// Provider `error_description`, OAuth `error` code, or transport message.
	pub(crate) reason: String,
	/// HTTP status, when a response arrived.
	pub(crate) status: Option<u16>,
}
impl TokenEndpointFailure {
	fn new(reason: impl Into<String>, status: Option<u16>) -> Self {
		Self { reason: reason.into(), status }
	}
}

pub(crate) struct BasicFacade<C>
where
	C: ?Sized + TokenHttpClient,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
}
impl<C> BasicFacade<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Builds a `client_secret_post` client pointed at the configured token endpoint.
	pub(crate) fn from_config(config: &ClientConfig, http_client: Arc<C>) -> Result<Self> {
		let auth_url = AuthUrl::from_url(config.authorization_endpoint()?);
		let token_url = TokenUrl::from_url(config.token_endpoint()?);
		let redirect_url = RedirectUrl::from_url(config.redirect_uri.clone());
		let oauth_client = BasicClient::new(ClientId::new(config.client_id.clone()))
			.set_client_secret(ClientSecret::new(config.client_secret.clone()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url)
			.set_redirect_uri(redirect_url)
			.set_auth_type(AuthType::RequestBody);

		Ok(Self { oauth_client, http_client })
	}

	/// Runs `grant_type=authorization_code` with the PKCE verifier.
	pub(crate) fn exchange_authorization_code<'a>(
		&'a self,
		code: String,
		verifier: String,
		requested_scope: &'a ScopeSet,
	) -> FacadeFuture<'a, TokenRecord> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code))
				.set_pkce_verifier(PkceCodeVerifier::new(verifier))
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take_status(), err))?;

			map_token_response(requested_scope, response, meta.take_status())
		})
	}

	/// Runs `grant_type=refresh_token`.
	pub(crate) fn refresh_token<'a>(
		&'a self,
		refresh_token: &'a str,
		requested_scope: &'a ScopeSet,
	) -> FacadeFuture<'a, TokenRecord> {
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take_status(), err))?;

			map_token_response(requested_scope, response, meta.take_status())
		})
	}
}

fn map_token_response(
	requested_scope: &ScopeSet,
	response: BasicTokenResponse,
	status: Option<u16>,
) -> Result<TokenRecord, TokenEndpointFailure> {
	let expires_in = response
		.expires_in()
		.ok_or_else(|| TokenEndpointFailure::new("token response is missing expires_in", status))?
		.as_secs();
	let expires_in = i64::try_from(expires_in).unwrap_or(i64::MAX).min(MAX_TOKEN_LIFETIME_SECS);
	let scope = match response.scopes() {
		Some(scopes) if !scopes.is_empty() =>
			scopes.iter().map(|scope| scope.as_str()).collect::<Vec<_>>().join(" "),
		_ => requested_scope.normalized(),
	};
	let mut builder = TokenRecord::builder()
		.access_token(response.access_token().secret().to_owned())
		.token_type(token_type_label(response.token_type()))
		.expires_in(expires_in)
		.scope(scope);

	if let Some(refresh) = response.refresh_token() {
		builder = builder.refresh_token(refresh.secret().to_owned());
	}

	builder.build().map_err(|e| TokenEndpointFailure::new(e.to_string(), status))
}

fn token_type_label(token_type: &BasicTokenType) -> String {
	match token_type {
		BasicTokenType::Bearer => "Bearer".into(),
		BasicTokenType::Mac => "MAC".into(),
		other => other.as_ref().to_owned(),
	}
}

fn map_request_error<E>(
	status: Option<u16>,
	err: BasicRequestTokenError<HttpClientError<E>>,
) -> TokenEndpointFailure
where
	E: 'static + Send + Sync + StdError,
{
	match err {
		RequestTokenError::ServerResponse(response) => {
			let reason = response
				.error_description()
				.filter(|description| !description.is_empty())
				.cloned()
				.unwrap_or_else(|| response.error().as_ref().to_owned());

			TokenEndpointFailure::new(reason, status)
		},
		RequestTokenError::Request(error) =>
			TokenEndpointFailure::new(http::describe_transport_error(&error), status),
		RequestTokenError::Parse(error, _body) => TokenEndpointFailure::new(
			format!("token endpoint returned an unreadable body: {error}"),
			status,
		),
		RequestTokenError::Other(message) => TokenEndpointFailure::new(message, status),
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use oauth2::{
		AccessToken, EmptyExtraTokenFields, Scope, StandardErrorResponse, StandardTokenResponse,
		basic::BasicErrorResponseType,
	};
	// self
	use super::*;
	use crate::http::ReqwestHttpClient;

	fn config() -> ClientConfig {
		ClientConfig::builder()
			.client_id("client")
			.client_secret("secret")
			.redirect_uri("http://localhost:3000/auth/callback")
			.environment(crate::config::Environment::Sandbox)
			.auth_base_url("https://account-d.example.com")
			.agreements_base_url("https://api-d.example.com")
			.documents_base_url("https://clm.example.com")
			.build()
			.expect("Facade test configuration should build.")
	}

	#[test]
	fn builds_request_body_client() {
		let result = <BasicFacade<ReqwestHttpClient>>::from_config(
			&config(),
			Arc::new(ReqwestHttpClient::default()),
		);

		assert!(result.is_ok());
	}

	#[test]
	fn scope_falls_back_to_requested() {
		let requested = ScopeSet::required();
		let mut response = StandardTokenResponse::new(
			AccessToken::new("access".into()),
			BasicTokenType::Bearer,
			EmptyExtraTokenFields {},
		);

		response.set_expires_in(Some(&std::time::Duration::from_secs(3600)));

		let record = map_token_response(&requested, response.clone(), Some(200))
			.expect("Token response should map.");

		assert_eq!(record.scope, requested.normalized());
		assert_eq!(record.token_type, "Bearer");
		assert_eq!(record.expires_in, 3600);
		assert!(record.refresh_token.is_none());

		response.set_scopes(Some(vec![Scope::new("signature".into())]));

		let record =
			map_token_response(&requested, response, Some(200)).expect("Token response should map.");

		assert_eq!(record.scope, "signature");
	}

	#[test]
	fn oversized_lifetime_is_clamped() {
		let mut response = StandardTokenResponse::new(
			AccessToken::new("access".into()),
			BasicTokenType::Bearer,
			EmptyExtraTokenFields {},
		);

		response.set_expires_in(Some(&std::time::Duration::from_secs(u64::MAX)));

		let record = map_token_response(&ScopeSet::required(), response, Some(200))
			.expect("Oversized lifetime should be clamped, not rejected.");

		assert_eq!(record.expires_in, MAX_TOKEN_LIFETIME_SECS);
		assert!(!record.is_stale_at(record.obtained_at));
	}

	#[test]
	fn missing_lifetime_is_a_failure() {
		let response = StandardTokenResponse::new(
			AccessToken::new("access".into()),
			BasicTokenType::Bearer,
			EmptyExtraTokenFields {},
		);
		let failure = map_token_response(&ScopeSet::required(), response, Some(200))
			.expect_err("Missing expires_in must fail.");

		assert_eq!(failure.status, Some(200));
	}

	#[test]
	fn server_errors_prefer_description() {
		let described = StandardErrorResponse::new(
			BasicErrorResponseType::InvalidGrant,
			Some("code expired".into()),
			None,
		);
		let failure = map_request_error::<ReqwestError>(
			Some(400),
			RequestTokenError::ServerResponse(described),
		);

		assert_eq!(failure, TokenEndpointFailure::new("code expired", Some(400)));

		let bare = StandardErrorResponse::new(BasicErrorResponseType::InvalidClient, None, None);
		let failure =
			map_request_error::<ReqwestError>(Some(401), RequestTokenError::ServerResponse(bare));

		assert_eq!(failure, TokenEndpointFailure::new("invalid_client", Some(401)));
	}
}
