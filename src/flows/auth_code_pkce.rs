//! Authorization Code + PKCE: authorization URL construction and code exchange.

mod session;

pub use session::{PkceCodeChallengeMethod, compute_pkce_challenge};

// self
use crate::{
	_prelude::*,
	auth::TokenRecord,
	error::ConfigError,
	flows::AuthorizationFlow,
	http::TokenHttpClient,
	oauth::BasicFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};
use session::PkcePair;

impl<C> AuthorizationFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Builds the URL the end-user must visit to grant consent.
	///
	/// A fresh PKCE verifier replaces any pending one, so only the most recently issued URL can be
	/// completed with [`exchange_code`](Self::exchange_code).
	pub fn build_authorization_url(&self, state: Option<&str>) -> Result<Url> {
		let pkce = PkcePair::generate();
		let mut url = self.config.authorization_endpoint()?;

		{
			let mut pairs = url.query_pairs_mut();

			pairs.append_pair("response_type", "code");
			pairs.append_pair("scope", &self.config.scopes.normalized());
			pairs.append_pair("client_id", &self.config.client_id);
			pairs.append_pair("redirect_uri", self.config.redirect_uri.as_str());
			pairs.append_pair("code_challenge", &pkce.challenge);
			pairs.append_pair("code_challenge_method", pkce.method.as_str());

			if let Some(state) = state {
				pairs.append_pair("state", state);
			}
		}

		*self.verifier.lock() = Some(pkce.verifier);

		Ok(url)
	}

	/// `true` between [`build_authorization_url`](Self::build_authorization_url) and the next
	/// exchange attempt.
	pub fn is_awaiting_code(&self) -> bool {
		self.verifier.lock().is_some()
	}

	/// Exchanges the authorization `code` for a token record and stores it.
	///
	/// The pending verifier is consumed before the request is sent, so it is gone afterwards
	/// whether the exchange succeeded, failed, or was cancelled.
	pub async fn exchange_code(&self, code: &str) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::AuthorizationCode;

		let span = FlowSpan::new(KIND, "exchange_code");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				let verifier = self.verifier.lock().take().ok_or(ConfigError::MissingVerifier)?;
				let facade = <BasicFacade<C>>::from_config(&self.config, self.http_client.clone())?;
				let record = facade
					.exchange_authorization_code(code.to_owned(), verifier, &self.config.scopes)
					.await
					.map_err(|failure| Error::AuthExchange {
						reason: failure.reason,
						status: failure.status,
					})?;

				Ok(self.credentials.set_record(record).await)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
