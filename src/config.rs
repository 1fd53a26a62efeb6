//! Client configuration: credentials, endpoints, and tunables.

// std
use std::{env, time::Duration as StdDuration};
// self
use crate::{_prelude::*, auth::ScopeSet, error::ConfigError, pipeline::RetryPolicy};

/// Prefix shared by every environment variable [`ClientConfig::from_env`] reads.
pub const ENV_PREFIX: &str = "CONTRACT_SDK_";
/// Default per-attempt transport timeout.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

/// Deployment tag of the identity provider account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Environment {
	/// Developer sandbox.
	Sandbox,
	/// Live accounts.
	Production,
}
impl Environment {
	/// Returns the lowercase tag used in configuration sources.
	pub const fn as_str(self) -> &'static str {
		match self {
			Environment::Sandbox => "sandbox",
			Environment::Production => "production",
		}
	}
}
impl Display for Environment {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Environment {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"sandbox" => Ok(Self::Sandbox),
			"production" => Ok(Self::Production),
			_ => Err(ConfigError::InvalidEnvironment { value: s.to_owned() }),
		}
	}
}

/// Response shape returned by the agreement listing endpoint of a deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AgreementListContract {
	/// `{ "userAgreementList": [...], "page": { "nextCursor": ".." } }`.
	#[default]
	UserAgreementList,
	/// `{ "data": [...], "response_metadata": { "page_token_next": ".." } }`.
	DataWithPageToken,
}
impl AgreementListContract {
	/// Returns the tag used in configuration sources.
	pub const fn as_str(self) -> &'static str {
		match self {
			AgreementListContract::UserAgreementList => "user_agreement_list",
			AgreementListContract::DataWithPageToken => "data",
		}
	}
}
impl FromStr for AgreementListContract {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim() {
			"user_agreement_list" => Ok(Self::UserAgreementList),
			"data" => Ok(Self::DataWithPageToken),
			_ => Err(ConfigError::InvalidAgreementListContract { value: s.to_owned() }),
		}
	}
}

/// Validated SDK configuration.
#[derive(Clone)]
pub struct ClientConfig {
	/// OAuth client identifier (integration key).
	pub client_id: String,
	/// OAuth client secret, sent in the token request body.
	pub client_secret: String,
	/// Redirect URI registered with the identity provider.
	pub redirect_uri: Url,
	/// Deployment tag.
	pub environment: Environment,
	/// Identity provider base URL; `/oauth/auth` and `/oauth/token` hang off it.
	pub auth_base_url: Url,
	/// Agreements API base URL.
	pub agreements_base_url: Url,
	/// Document-management API base URL.
	pub documents_base_url: Url,
	/// Account used by agreement calls.
	pub account_id: Option<String>,
	/// Response shape of the agreement listing endpoint.
	pub agreement_list_contract: AgreementListContract,
	/// Scopes requested in the authorization URL.
	pub scopes: ScopeSet,
	/// Retry budget for 429/5xx responses.
	pub retry: RetryPolicy,
	/// Per-attempt transport timeout.
	pub timeout: StdDuration,
}
impl ClientConfig {
	/// Returns a builder that validates every required setting at once.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Reads the configuration from `CONTRACT_SDK_*` process environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|name| env::var(name).ok())
	}

	/// Reads the configuration through `lookup`, which receives full variable names such as
	/// `CONTRACT_SDK_CLIENT_ID`. Empty values count as missing.
	pub fn from_lookup<F>(mut lookup: F) -> Result<Self, ConfigError>
	where
		F: FnMut(&str) -> Option<String>,
	{
		let mut read = |suffix: &str| {
			lookup(&format!("{ENV_PREFIX}{suffix}")).filter(|value| !value.trim().is_empty())
		};
		let mut builder = ClientConfigBuilder {
			client_id: read("CLIENT_ID"),
			client_secret: read("CLIENT_SECRET"),
			redirect_uri: read("REDIRECT_URI"),
			environment: None,
			auth_base_url: read("AUTH_BASE_URL"),
			agreements_base_url: read("AGREEMENTS_BASE_URL"),
			documents_base_url: read("DOCUMENTS_BASE_URL"),
			account_id: read("ACCOUNT_ID"),
			..Default::default()
		};

		builder.raw_environment = read("ENVIRONMENT");

		if let Some(contract) = read("AGREEMENT_LIST_CONTRACT") {
			builder.agreement_list_contract = Some(contract.parse()?);
		}

		builder.build()
	}

	/// Authorization endpoint (`{auth_base}/oauth/auth`).
	pub fn authorization_endpoint(&self) -> Result<Url, ConfigError> {
		join_url("auth_base_url", &self.auth_base_url, "/oauth/auth")
	}

	/// Token endpoint (`{auth_base}/oauth/token`).
	pub fn token_endpoint(&self) -> Result<Url, ConfigError> {
		join_url("auth_base_url", &self.auth_base_url, "/oauth/token")
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri.as_str())
			.field("environment", &self.environment)
			.field("auth_base_url", &self.auth_base_url.as_str())
			.field("agreements_base_url", &self.agreements_base_url.as_str())
			.field("documents_base_url", &self.documents_base_url.as_str())
			.field("account_id", &self.account_id)
			.field("agreement_list_contract", &self.agreement_list_contract)
			.field("scopes", &self.scopes)
			.field("retry", &self.retry)
			.field("timeout", &self.timeout)
			.finish()
	}
}

/// Builder for [`ClientConfig`].
#[derive(Clone, Debug, Default)]
pub struct ClientConfigBuilder {
	client_id: Option<String>,
	client_secret: Option<String>,
	redirect_uri: Option<String>,
	environment: Option<Environment>,
	raw_environment: Option<String>,
	auth_base_url: Option<String>,
	agreements_base_url: Option<String>,
	documents_base_url: Option<String>,
	account_id: Option<String>,
	agreement_list_contract: Option<AgreementListContract>,
	scopes: Option<ScopeSet>,
	retry: Option<RetryPolicy>,
	timeout: Option<StdDuration>,
}
impl ClientConfigBuilder {
	/// Sets the OAuth client identifier.
	pub fn client_id(mut self, value: impl Into<String>) -> Self {
		self.client_id = Some(value.into());

		self
	}

	/// Sets the OAuth client secret.
	pub fn client_secret(mut self, value: impl Into<String>) -> Self {
		self.client_secret = Some(value.into());

		self
	}

	/// Sets the registered redirect URI.
	pub fn redirect_uri(mut self, value: impl Into<String>) -> Self {
		self.redirect_uri = Some(value.into());

		self
	}

	/// Sets the deployment tag.
	pub fn environment(mut self, value: Environment) -> Self {
		self.environment = Some(value);
		self.raw_environment = None;

		self
	}

	/// Sets the identity provider base URL.
	pub fn auth_base_url(mut self, value: impl Into<String>) -> Self {
		self.auth_base_url = Some(value.into());

		self
	}

	/// Sets the agreements API base URL.
	pub fn agreements_base_url(mut self, value: impl Into<String>) -> Self {
		self.agreements_base_url = Some(value.into());

		self
	}

	/// Sets the document-management API base URL.
	pub fn documents_base_url(mut self, value: impl Into<String>) -> Self {
		self.documents_base_url = Some(value.into());

		self
	}

	/// Sets the account used by agreement calls.
	pub fn account_id(mut self, value: impl Into<String>) -> Self {
		self.account_id = Some(value.into());

		self
	}

	/// Selects the agreement listing response shape.
	pub fn agreement_list_contract(mut self, value: AgreementListContract) -> Self {
		self.agreement_list_contract = Some(value);

		self
	}

	/// Overrides the requested scopes (defaults to [`ScopeSet::required`]).
	pub fn scopes(mut self, value: ScopeSet) -> Self {
		self.scopes = Some(value);

		self
	}

	/// Overrides the retry policy.
	pub fn retry(mut self, value: RetryPolicy) -> Self {
		self.retry = Some(value);

		self
	}

	/// Overrides the per-attempt transport timeout.
	pub fn timeout(mut self, value: StdDuration) -> Self {
		self.timeout = Some(value);

		self
	}

	/// Validates the settings and produces a [`ClientConfig`].
	///
	/// Every missing required setting is reported in a single
	/// [`ConfigError::MissingSettings`].
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut missing = Vec::new();

		if self.client_id.is_none() {
			missing.push("client_id");
		}
		if self.client_secret.is_none() {
			missing.push("client_secret");
		}
		if self.redirect_uri.is_none() {
			missing.push("redirect_uri");
		}
		if self.environment.is_none() && self.raw_environment.is_none() {
			missing.push("environment");
		}
		if self.auth_base_url.is_none() {
			missing.push("auth_base_url");
		}
		if self.agreements_base_url.is_none() {
			missing.push("agreements_base_url");
		}
		if self.documents_base_url.is_none() {
			missing.push("documents_base_url");
		}

		let (
			Some(client_id),
			Some(client_secret),
			Some(redirect_uri),
			Some(auth_base_url),
			Some(agreements_base_url),
			Some(documents_base_url),
		) = (
			self.client_id,
			self.client_secret,
			self.redirect_uri,
			self.auth_base_url,
			self.agreements_base_url,
			self.documents_base_url,
		)
		else {
			return Err(ConfigError::MissingSettings { names: missing });
		};

		if !missing.is_empty() {
			return Err(ConfigError::MissingSettings { names: missing });
		}

		let environment = match (self.environment, self.raw_environment) {
			(Some(environment), _) => environment,
			(None, Some(raw)) => raw.parse()?,
			(None, None) => return Err(ConfigError::MissingSettings { names: missing }),
		};

		Ok(ClientConfig {
			client_id,
			client_secret,
			redirect_uri: parse_url("redirect_uri", &redirect_uri)?,
			environment,
			auth_base_url: parse_url("auth_base_url", &auth_base_url)?,
			agreements_base_url: parse_url("agreements_base_url", &agreements_base_url)?,
			documents_base_url: parse_url("documents_base_url", &documents_base_url)?,
			account_id: self.account_id,
			agreement_list_contract: self.agreement_list_contract.unwrap_or_default(),
			scopes: self.scopes.unwrap_or_else(ScopeSet::required),
			retry: self.retry.unwrap_or_default(),
			timeout: self.timeout.unwrap_or(DEFAULT_TIMEOUT),
		})
	}
}

fn parse_url(setting: &'static str, raw: &str) -> Result<Url, ConfigError> {
	Url::parse(raw.trim()).map_err(|source| ConfigError::InvalidUrl { setting, source })
}

/// Appends `path` to `base`, keeping any path prefix the base already carries.
pub(crate) fn join_url(setting: &'static str, base: &Url, path: &str) -> Result<Url, ConfigError> {
	parse_url(setting, &format!("{}{path}", base.as_str().trim_end_matches('/')))
}
