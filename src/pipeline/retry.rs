//! Retry budget and backoff formulas for throttled and failing API calls.

// std
use std::time::Duration as StdDuration;
// self
use crate::_prelude::*;

/// Bounded retry policy for 429 and 5xx responses.
///
/// The first send is attempt 1. A retry is allowed while `attempt < max_retries`, so the default
/// policy sends a request at most four times.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Number of resends allowed after the first send.
	pub max_retries: u32,
	/// Unit delay that both backoff formulas scale.
	pub base_delay: StdDuration,
}
impl RetryPolicy {
	/// Default number of resends.
	pub const DEFAULT_MAX_RETRIES: u32 = 3;
	/// Default unit delay.
	pub const DEFAULT_BASE_DELAY: StdDuration = StdDuration::from_millis(1_000);

	/// Creates a policy with explicit limits.
	pub const fn new(max_retries: u32, base_delay: StdDuration) -> Self {
		Self { max_retries, base_delay }
	}

	/// `true` while another resend fits in the budget.
	pub const fn allows_retry(&self, attempt: u32) -> bool {
		attempt <= self.max_retries
	}

	/// Exponential wait after a 429 on `attempt`: `base * 2^(attempt - 1)`.
	pub fn rate_limit_delay(&self, attempt: u32) -> StdDuration {
		let exponent = attempt.saturating_sub(1).min(31);

		self.base_delay.saturating_mul(1_u32 << exponent)
	}

	/// Linear wait after a 5xx on `attempt`: `base * attempt`.
	pub fn server_error_delay(&self, attempt: u32) -> StdDuration {
		self.base_delay.saturating_mul(attempt.max(1))
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MAX_RETRIES, Self::DEFAULT_BASE_DELAY)
	}
}

/// Per-call retry bookkeeping, discarded once the call resolves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RetryContext {
	/// Number of 429/5xx-driven sends so far, starting at 1.
	pub(crate) attempt: u32,
	/// Total sends, including 401 replays.
	pub(crate) sends: u32,
	/// Set once the 401 refresh-and-replay has been used.
	pub(crate) auth_retried: bool,
}
impl Default for RetryContext {
	fn default() -> Self {
		Self { attempt: 1, sends: 0, auth_retried: false }
	}
}
