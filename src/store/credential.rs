//! Live token record plus its time-bounded validity policy.

// self
use crate::{
	_prelude::*,
	auth::{TokenRecord, TokenSecret},
	obs,
	store::TokenSink,
};

/// Owns the current [`TokenRecord`] and mirrors every change into a [`TokenSink`].
///
/// The lock is synchronous and never held across `.await`; sink calls run after the in-memory
/// state has been updated, and their failures are logged rather than surfaced.
pub struct CredentialStore {
	record: RwLock<Option<TokenRecord>>,
	sink: Arc<dyn TokenSink>,
}
impl CredentialStore {
	/// Restores a previously persisted record from `sink`.
	///
	/// Unreadable or corrupt content is treated as absent. A record that is already stale and has
	/// no refresh token can never be used again, so it is dropped and deleted from the sink.
	pub async fn load(sink: Arc<dyn TokenSink>) -> Self {
		let loaded = match sink.load().await {
			Ok(record) => record,
			Err(e) => {
				obs::log_persistence_failure("load", &e);

				None
			},
		};
		let record = match loaded {
			Some(record) if record.is_stale() && !record.has_refresh_token() => {
				if let Err(e) = sink.delete().await {
					obs::log_persistence_failure("delete", &e);
				}

				obs::log_credentials_cleared("expired_without_refresh_token");

				None
			},
			other => other,
		};

		Self { record: RwLock::new(record), sink }
	}

	/// Creates an empty store that persists through `sink` without reading it first.
	pub fn empty(sink: Arc<dyn TokenSink>) -> Self {
		Self { record: RwLock::new(None), sink }
	}

	/// Stores `record`, stamping `obtained_at` with the current clock, and persists it.
	///
	/// Returns the stamped record.
	pub async fn set_record(&self, record: TokenRecord) -> TokenRecord {
		let stamped = record.stamped(OffsetDateTime::now_utc());

		*self.record.write() = Some(stamped.clone());

		if let Err(e) = self.sink.save(stamped.clone()).await {
			obs::log_persistence_failure("save", &e);
		}

		stamped
	}

	/// Access token if a record exists and is not stale.
	pub fn current_access_token(&self) -> Option<TokenSecret> {
		self.current_access_token_at(OffsetDateTime::now_utc())
	}

	/// Access token if a record exists and is not stale at `instant`.
	pub fn current_access_token_at(&self, instant: OffsetDateTime) -> Option<TokenSecret> {
		self.record
			.read()
			.as_ref()
			.filter(|record| !record.is_stale_at(instant))
			.map(|record| record.access_token.clone())
	}

	/// Stored refresh token, regardless of staleness.
	pub fn current_refresh_token(&self) -> Option<TokenSecret> {
		self.record.read().as_ref().and_then(|record| record.refresh_token.clone())
	}

	/// `true` when no record exists or the current one is inside the staleness buffer.
	pub fn is_stale(&self) -> bool {
		self.is_stale_at(OffsetDateTime::now_utc())
	}

	/// [`is_stale`](Self::is_stale) evaluated at `instant`.
	pub fn is_stale_at(&self, instant: OffsetDateTime) -> bool {
		self.record.read().as_ref().is_none_or(|record| record.is_stale_at(instant))
	}

	/// `true` iff the record is stale and a refresh token is available.
	pub fn needs_refresh(&self) -> bool {
		self.is_stale() && self.current_refresh_token().is_some()
	}

	/// `true` when a usable access token is held.
	pub fn is_authenticated(&self) -> bool {
		!self.is_stale()
	}

	/// Snapshot of the current record.
	pub fn record(&self) -> Option<TokenRecord> {
		self.record.read().clone()
	}

	/// Nominal expiry of the current record.
	pub fn expires_at(&self) -> Option<OffsetDateTime> {
		self.record.read().as_ref().map(TokenRecord::expires_at)
	}

	/// Drops the in-memory record and deletes it from the sink.
	pub async fn clear(&self) {
		self.record.write().take();

		if let Err(e) = self.sink.delete().await {
			obs::log_persistence_failure("delete", &e);
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("CredentialStore").field("record", &*self.record.read()).finish()
	}
}
