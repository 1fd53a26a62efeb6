//! Optional observability helpers for SDK flows and API calls.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `contract_sdk.flow` with the `flow` and
//!   `stage` (call site) fields, plus events for retry waits, persistence failures, and
//!   credential clearing.
//! - Enable `metrics` to increment the `contract_sdk_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`, and `contract_sdk_retry_total`
//!   labeled by `reason`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the SDK.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authorization Code + PKCE exchange.
	AuthorizationCode,
	/// Refresh token grant.
	Refresh,
	/// Authenticated resource API call.
	ApiRequest,
	/// Document search-task creation and polling.
	DocumentSearch,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::AuthorizationCode => "authorization_code",
			FlowKind::Refresh => "refresh",
			FlowKind::ApiRequest => "api_request",
			FlowKind::DocumentSearch => "document_search",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to an SDK operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Why the request pipeline scheduled another send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RetryReason {
	/// The API answered 429.
	RateLimited,
	/// The API answered with a 5xx status.
	ServerError,
	/// The API answered 401 and the token was refreshed.
	Unauthorized,
}
impl RetryReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RetryReason::RateLimited => "rate_limited",
			RetryReason::ServerError => "server_error",
			RetryReason::Unauthorized => "unauthorized",
		}
	}
}
impl Display for RetryReason {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
