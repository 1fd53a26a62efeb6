//! Async SDK for the agreements and document-management APIs: PKCE sign-in, expiry-aware token
//! caching, and a bearer-token request pipeline that retries throttled and failing calls.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
#[cfg(feature = "reqwest")] pub mod client;
pub mod config;
pub mod error;
pub mod flows;
pub mod http;
pub mod oauth;
pub mod obs;
pub mod pipeline;
pub mod resources;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::{ClientConfig, Environment},
		flows::AuthorizationFlow,
		http::ReqwestHttpClient,
		store::{CredentialStore, MemorySink, TokenSink},
	};

	/// Flow type alias used by reqwest-backed integration tests.
	pub type ReqwestTestFlow = AuthorizationFlow<ReqwestHttpClient>;

	/// Client identifier used by [`test_config`].
	pub const TEST_CLIENT_ID: &str = "client-it";
	/// Client secret used by [`test_config`].
	pub const TEST_CLIENT_SECRET: &str = "secret-it";
	/// Redirect URI used by [`test_config`].
	pub const TEST_REDIRECT_URI: &str = "http://localhost:3000/auth/callback";

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client() -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Builds a configuration whose three base URLs all point at `base_url` (typically an
	/// `httpmock` server) and whose account identifier is `acct-1`.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder()
			.client_id(TEST_CLIENT_ID)
			.client_secret(TEST_CLIENT_SECRET)
			.redirect_uri(TEST_REDIRECT_URI)
			.environment(Environment::Sandbox)
			.auth_base_url(base_url)
			.agreements_base_url(base_url)
			.documents_base_url(base_url)
			.account_id("acct-1")
			.build()
			.expect("Test configuration should build successfully.")
	}

	/// Constructs an [`AuthorizationFlow`] backed by an in-memory sink and the reqwest transport
	/// used across integration tests. The sink may be pre-seeded by the caller.
	pub async fn build_reqwest_test_flow(
		config: ClientConfig,
		sink: Arc<MemorySink>,
	) -> Arc<ReqwestTestFlow> {
		let dyn_sink: Arc<dyn TokenSink> = sink;
		let credentials = Arc::new(CredentialStore::load(dyn_sink).await);

		Arc::new(AuthorizationFlow::with_http_client(config, credentials, test_reqwest_http_client()))
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
