// std
use std::time::Duration as StdDuration;
// self
use crate::{
	_prelude::*,
	obs::{FlowKind, RetryReason},
	store::StoreError,
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// A span builder used by SDK flows and pipeline calls.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided flow kind + stage.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("contract_sdk.flow", flow = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits a warning when the token sink fails; the in-memory state stays authoritative.
pub fn log_persistence_failure(operation: &'static str, error: &StoreError) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(operation, error = %error, "token sink operation failed");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (operation, error);
	}
}

/// Emits an event whenever stored credentials are dropped.
pub fn log_credentials_cleared(reason: &'static str) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(reason, "stored credentials cleared");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}

/// Emits an event before the pipeline waits and resends a request.
pub fn log_retry_scheduled(reason: RetryReason, status: u16, attempt: u32, delay: StdDuration) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(
			reason = reason.as_str(),
			status,
			attempt,
			delay_ms = delay.as_millis() as u64,
			"retrying API request"
		);
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (reason, status, attempt, delay);
	}
}
