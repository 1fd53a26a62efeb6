//! Token records issued by the identity provider, their staleness rule, and a builder.

// crates.io
use time::PrimitiveDateTime;
// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Safety margin subtracted from the nominal expiry before a token is treated as stale.
pub const STALENESS_BUFFER: Duration = Duration::minutes(5);

/// Errors produced by [`TokenRecordBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum TokenRecordBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no `expires_in` was configured.
	#[error("Token lifetime must be supplied via expires_in.")]
	MissingExpiresIn,
}

/// Token set returned by the identity provider plus the instant it was obtained.
///
/// Records are replaced wholesale on every refresh; nothing mutates one in place.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenRecord {
	/// Access token presented as the bearer credential.
	pub access_token: TokenSecret,
	/// Token type reported by the provider (normally `Bearer`).
	pub token_type: String,
	/// Lifetime in seconds, relative to [`obtained_at`](Self::obtained_at).
	pub expires_in: i64,
	/// Refresh token, if the provider issued one.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh_token: Option<TokenSecret>,
	/// Space-delimited scopes granted to the token.
	#[serde(default)]
	pub scope: String,
	/// Instant the record was stored.
	#[serde(with = "time::serde::timestamp")]
	pub obtained_at: OffsetDateTime,
}
impl TokenRecord {
	/// Returns a builder for assembling records from token endpoint responses.
	pub fn builder() -> TokenRecordBuilder {
		TokenRecordBuilder::default()
	}

	/// Nominal expiry instant (`obtained_at + expires_in`).
	///
	/// Lifetimes beyond the representable range saturate to the latest (or earliest) instant.
	pub fn expires_at(&self) -> OffsetDateTime {
		let lifetime = Duration::seconds(self.expires_in);

		self.obtained_at.checked_add(lifetime).unwrap_or_else(|| saturated(lifetime))
	}

	/// First instant at which the record counts as stale.
	pub fn stale_from(&self) -> OffsetDateTime {
		self.expires_at()
			.checked_sub(STALENESS_BUFFER)
			.unwrap_or_else(|| saturated(-STALENESS_BUFFER))
	}

	/// Returns `true` once `instant` falls inside the staleness buffer or past expiry.
	pub fn is_stale_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.stale_from()
	}

	/// Convenience helper that checks staleness using the current UTC instant.
	pub fn is_stale(&self) -> bool {
		self.is_stale_at(OffsetDateTime::now_utc())
	}

	/// Returns `true` if the provider issued a refresh token.
	pub fn has_refresh_token(&self) -> bool {
		self.refresh_token.is_some()
	}

	/// Copy of the record with `obtained_at` replaced by `instant`.
	pub fn stamped(mut self, instant: OffsetDateTime) -> Self {
		self.obtained_at = instant;

		self
	}
}
impl Debug for TokenRecord {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenRecord")
			.field("access_token", &"<redacted>")
			.field("token_type", &self.token_type)
			.field("expires_in", &self.expires_in)
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("scope", &self.scope)
			.field("obtained_at", &self.obtained_at)
			.finish()
	}
}

fn saturated(offset: Duration) -> OffsetDateTime {
	if offset.is_negative() {
		PrimitiveDateTime::MIN.assume_utc()
	} else {
		PrimitiveDateTime::MAX.assume_utc()
	}
}

/// Builder for [`TokenRecord`].
#[derive(Clone, Debug, Default)]
pub struct TokenRecordBuilder {
	access_token: Option<TokenSecret>,
	token_type: Option<String>,
	expires_in: Option<i64>,
	refresh_token: Option<TokenSecret>,
	scope: Option<String>,
	obtained_at: Option<OffsetDateTime>,
}
impl TokenRecordBuilder {
	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the token type (defaults to `Bearer`).
	pub fn token_type(mut self, token_type: impl Into<String>) -> Self {
		self.token_type = Some(token_type.into());

		self
	}

	/// Sets the lifetime in seconds.
	pub fn expires_in(mut self, seconds: i64) -> Self {
		self.expires_in = Some(seconds);

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Sets the space-delimited granted scope string.
	pub fn scope(mut self, scope: impl Into<String>) -> Self {
		self.scope = Some(scope.into());

		self
	}

	/// Sets the obtained-at instant (defaults to the current clock).
	pub fn obtained_at(mut self, instant: OffsetDateTime) -> Self {
		self.obtained_at = Some(instant);

		self
	}

	/// Consumes the builder and produces a [`TokenRecord`].
	pub fn build(self) -> Result<TokenRecord, TokenRecordBuilderError> {
		let access_token = self.access_token.ok_or(TokenRecordBuilderError::MissingAccessToken)?;
		let expires_in = self.expires_in.ok_or(TokenRecordBuilderError::MissingExpiresIn)?;

		Ok(TokenRecord {
			access_token,
			token_type: self.token_type.unwrap_or_else(|| "Bearer".into()),
			expires_in,
			refresh_token: self.refresh_token,
			scope: self.scope.unwrap_or_default(),
			obtained_at: self.obtained_at.unwrap_or_else(OffsetDateTime::now_utc),
		})
	}
}
