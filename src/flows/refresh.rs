//! Refresh token orchestration with a single-flight guard and metrics.
//!
//! [`AuthorizationFlow::refresh`] always contacts the provider. The internal entry points used by
//! [`AuthorizationFlow::get_valid_access_token`] and the request pipeline first wait on the
//! flow's guard and then re-check the store, so a burst of callers holding a stale token results
//! in one `grant_type=refresh_token` call.

mod metrics;

pub use metrics::RefreshMetrics;

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	flows::AuthorizationFlow,
	http::TokenHttpClient,
	oauth::BasicFacade,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
};

impl<C> AuthorizationFlow<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Exchanges the stored refresh token for a new record.
	///
	/// When the provider omits a new refresh token the previous one is kept. On failure every
	/// stored credential is cleared and [`Error::RefreshFailed`] is returned.
	pub async fn refresh(&self) -> Result<TokenRecord> {
		let _singleflight = self.refresh_guard.lock().await;

		self.refresh_locked().await
	}

	/// Refreshes after the API rejected `rejected`, unless another caller already replaced it.
	pub(crate) async fn refresh_after_rejection(&self, rejected: &TokenSecret) -> Result<TokenSecret> {
		let _singleflight = self.refresh_guard.lock().await;

		if let Some(token) = self.credentials.current_access_token()
			&& token != *rejected
		{
			return Ok(token);
		}

		self.refresh_locked().await.map(|record| record.access_token)
	}

	/// Performs the refresh grant; callers must hold `refresh_guard`.
	pub(super) async fn refresh_locked(&self) -> Result<TokenRecord> {
		const KIND: FlowKind = FlowKind::Refresh;

		let span = FlowSpan::new(KIND, "refresh");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span
			.instrument(async move {
				self.refresh_metrics.record_attempt();

				let refresh_token = self.credentials.current_refresh_token().ok_or_else(|| {
					self.refresh_metrics.record_failure();

					Error::NoRefreshToken
				})?;
				let facade = <BasicFacade<C>>::from_config(&self.config, self.http_client.clone())
					.inspect_err(|_| {
						self.refresh_metrics.record_failure();
					})?;
				let mut record =
					match facade.refresh_token(refresh_token.expose(), &self.config.scopes).await {
						Ok(record) => record,
						Err(failure) => {
							self.credentials.clear().await;
							self.refresh_metrics.record_failure();

							obs::log_credentials_cleared("refresh_failed");

							return Err(Error::RefreshFailed {
								reason: failure.reason,
								status: failure.status,
							});
						},
					};

				if record.refresh_token.is_none() {
					record.refresh_token = Some(refresh_token);
				}

				let stored = self.credentials.set_record(record).await;

				self.refresh_metrics.record_success();

				Ok(stored)
			})
			.await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}
}
