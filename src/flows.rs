//! Token lifecycle orchestration: PKCE sign-in, refresh, and the "give me a usable token" entry
//! point that the request pipeline relies on.

pub mod auth_code_pkce;
pub mod refresh;

pub use auth_code_pkce::*;
pub use refresh::*;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config::ClientConfig,
	http::TokenHttpClient,
	obs,
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::{error::ConfigError, http::ReqwestHttpClient};

#[cfg(feature = "reqwest")]
/// Flow specialized for the crate's default reqwest transport.
pub type ReqwestAuthorizationFlow = AuthorizationFlow<ReqwestHttpClient>;

/// Coordinates the OAuth lifecycle of one client session.
///
/// The flow owns the configuration, the HTTP transport, the pending PKCE verifier, and a shared
/// handle to the [`CredentialStore`]. Refreshes started through
/// [`get_valid_access_token`](Self::get_valid_access_token) or the pipeline's 401 handling are
/// single-flight: concurrent callers wait on one async mutex and reuse the token the winner
/// stored.
pub struct AuthorizationFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	config: ClientConfig,
	credentials: Arc<CredentialStore>,
	http_client: Arc<C>,
	verifier: Mutex<Option<String>>,
	refresh_guard: AsyncMutex<()>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
}
impl<C> AuthorizationFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Creates a flow that reuses the caller-provided transport.
	pub fn with_http_client(
		config: ClientConfig,
		credentials: Arc<CredentialStore>,
		http_client: impl Into<Arc<C>>,
	) -> Self {
		Self {
			config,
			credentials,
			http_client: http_client.into(),
			verifier: Mutex::new(None),
			refresh_guard: AsyncMutex::new(()),
			refresh_metrics: Default::default(),
		}
	}

	/// Configuration the flow was built with.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Shared credential store.
	pub fn credentials(&self) -> &Arc<CredentialStore> {
		&self.credentials
	}

	/// Transport shared with the request pipelines.
	pub fn http_client(&self) -> Arc<C> {
		self.http_client.clone()
	}

	/// `true` when a usable access token is stored.
	pub fn is_authenticated(&self) -> bool {
		self.credentials.is_authenticated()
	}

	/// Returns a usable access token, refreshing it first when it is stale.
	///
	/// Fails with [`Error::NotAuthenticated`] without any network call when the stored record is
	/// stale and no refresh token exists.
	pub async fn get_valid_access_token(&self) -> Result<TokenSecret> {
		if let Some(token) = self.credentials.current_access_token() {
			return Ok(token);
		}
		if !self.credentials.needs_refresh() {
			return Err(Error::NotAuthenticated);
		}

		let _singleflight = self.refresh_guard.lock().await;

		if let Some(token) = self.credentials.current_access_token() {
			return Ok(token);
		}
		if !self.credentials.needs_refresh() {
			return Err(Error::NotAuthenticated);
		}

		self.refresh_locked().await.map(|record| record.access_token)
	}

	/// Drops stored credentials and any pending PKCE verifier.
	pub async fn logout(&self) {
		self.verifier.lock().take();
		self.credentials.clear().await;

		obs::log_credentials_cleared("logout");
	}
}
#[cfg(feature = "reqwest")]
impl AuthorizationFlow<ReqwestHttpClient> {
	/// Creates a flow that provisions its own reqwest transport bounded by the configured
	/// timeout.
	pub fn new(config: ClientConfig, credentials: Arc<CredentialStore>) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(config.timeout)?;

		Ok(Self::with_http_client(config, credentials, http_client))
	}
}
impl<C> Debug for AuthorizationFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AuthorizationFlow")
			.field("config", &self.config)
			.field("credentials", &self.credentials)
			.field("awaiting_code", &self.verifier.lock().is_some())
			.finish()
	}
}
