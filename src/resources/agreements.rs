//! Agreements API client.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	config::AgreementListContract,
	error::ConfigError,
	http::TokenHttpClient,
	pipeline::{RequestOptions, RequestPipeline},
	resources,
};

/// Default page size when neither `limit` nor `page_size` is supplied.
pub const DEFAULT_LIMIT: u32 = 20;
/// Default sort field.
pub const DEFAULT_SORT: &str = "metadata.created_at";
/// Default sort direction.
pub const DEFAULT_DIRECTION: SortDirection = SortDirection::Desc;

/// Sort direction accepted by the listing endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
	/// Ascending.
	Asc,
	/// Descending.
	Desc,
}
impl SortDirection {
	/// Query-string value.
	pub const fn as_str(self) -> &'static str {
		match self {
			SortDirection::Asc => "asc",
			SortDirection::Desc => "desc",
		}
	}
}

/// Listing parameters; unset fields fall back to the documented defaults.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListAgreementsParams {
	/// Page size.
	pub limit: Option<u32>,
	/// Alternate spelling of `limit`, used only when `limit` is unset.
	pub page_size: Option<u32>,
	/// Sort field.
	pub sort: Option<String>,
	/// Sort direction.
	pub direction: Option<SortDirection>,
	/// Opaque cursor returned by a previous page.
	pub cursor: Option<String>,
	/// Free-text search.
	pub query: Option<String>,
	/// Status filters, sent as repeated `status` pairs.
	pub status: Vec<String>,
}
impl ListAgreementsParams {
	fn into_options(self) -> RequestOptions {
		let limit = self.limit.or(self.page_size).unwrap_or(DEFAULT_LIMIT);
		let options = RequestOptions::new()
			.query("limit", limit.to_string())
			.query("sort", self.sort.unwrap_or_else(|| DEFAULT_SORT.into()))
			.query("direction", self.direction.unwrap_or(DEFAULT_DIRECTION).as_str())
			.query_opt("cursor", self.cursor)
			.query_opt("query", self.query);

		self.status.into_iter().fold(options, |options, status| options.query("status", status))
	}
}

/// One agreement as returned by the API; fields beyond the identifiers are kept verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Agreement {
	/// Agreement identifier.
	#[serde(default, alias = "agreementId", skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Lifecycle status.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// `{ "userAgreementList": [...], "page": { "nextCursor": ".." } }` page.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAgreementListPage {
	/// Agreements on this page.
	#[serde(default)]
	pub user_agreement_list: Vec<Agreement>,
	/// Cursor information.
	#[serde(default)]
	pub page: Option<CursorPage>,
}

/// Cursor block of a [`UserAgreementListPage`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CursorPage {
	/// Cursor of the next page, absent on the last page.
	#[serde(default)]
	pub next_cursor: Option<String>,
	/// Page size echoed by the API.
	#[serde(default)]
	pub page_size: Option<u32>,
}

/// `{ "data": [...], "response_metadata": { "page_token_next": ".." } }` page.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct DataPage {
	/// Agreements on this page.
	#[serde(default)]
	pub data: Vec<Agreement>,
	/// Pagination metadata.
	#[serde(default)]
	pub response_metadata: Option<PageTokenMetadata>,
}

/// Pagination block of a [`DataPage`].
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PageTokenMetadata {
	/// Token of the next page, absent on the last page.
	#[serde(default)]
	pub page_token_next: Option<String>,
}

/// One page of agreements in the shape the deployment's [`AgreementListContract`] selects.
#[derive(Clone, Debug, PartialEq)]
pub enum AgreementList {
	/// Parsed with [`AgreementListContract::UserAgreementList`].
	UserAgreementList(UserAgreementListPage),
	/// Parsed with [`AgreementListContract::DataWithPageToken`].
	DataWithPageToken(DataPage),
}
impl AgreementList {
	/// Agreements on this page.
	pub fn agreements(&self) -> &[Agreement] {
		match self {
			AgreementList::UserAgreementList(page) => &page.user_agreement_list,
			AgreementList::DataWithPageToken(page) => &page.data,
		}
	}

	/// Cursor to pass as `cursor` for the next page; `None` on the last page.
	pub fn next_cursor(&self) -> Option<&str> {
		match self {
			AgreementList::UserAgreementList(page) =>
				page.page.as_ref().and_then(|p| p.next_cursor.as_deref()),
			AgreementList::DataWithPageToken(page) =>
				page.response_metadata.as_ref().and_then(|m| m.page_token_next.as_deref()),
		}
	}

	/// Consumes the page and returns its agreements.
	pub fn into_agreements(self) -> Vec<Agreement> {
		match self {
			AgreementList::UserAgreementList(page) => page.user_agreement_list,
			AgreementList::DataWithPageToken(page) => page.data,
		}
	}
}

/// Client for `/v1/accounts/{account}/agreements`.
pub struct AgreementsClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	pipeline: RequestPipeline<C>,
	account_id: RwLock<Option<String>>,
	contract: AgreementListContract,
}
impl<C> AgreementsClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps a pipeline bound to the agreements base URL.
	///
	/// The account id and list contract come from the flow's configuration.
	pub fn new(pipeline: RequestPipeline<C>) -> Self {
		let config = pipeline.flow().config();
		let account_id = config.account_id.clone();
		let contract = config.agreement_list_contract;

		Self { pipeline, account_id: RwLock::new(account_id), contract }
	}

	/// Replaces the account used by subsequent calls.
	pub fn set_account_id(&self, account_id: impl Into<String>) {
		*self.account_id.write() = Some(account_id.into());
	}

	/// Account used by agreement calls, if configured.
	pub fn account_id(&self) -> Option<String> {
		self.account_id.read().clone()
	}

	/// Response shape this client parses.
	pub fn contract(&self) -> AgreementListContract {
		self.contract
	}

	/// Lists agreements with defaults applied to unset parameters.
	pub async fn list_agreements(&self, params: ListAgreementsParams) -> Result<AgreementList> {
		let path = format!("{}/agreements", self.account_path()?);
		let options = params.into_options();

		match self.contract {
			AgreementListContract::UserAgreementList => self
				.pipeline
				.get::<UserAgreementListPage>(&path, options)
				.await
				.map(|response| AgreementList::UserAgreementList(response.body)),
			AgreementListContract::DataWithPageToken => self
				.pipeline
				.get::<DataPage>(&path, options)
				.await
				.map(|response| AgreementList::DataWithPageToken(response.body)),
		}
	}

	/// Fetches one agreement.
	pub async fn get_agreement(&self, agreement_id: &str) -> Result<Agreement> {
		let path =
			format!("{}/agreements/{}", self.account_path()?, resources::segment(agreement_id));

		Ok(self.pipeline.get(&path, RequestOptions::new()).await?.into_body())
	}

	/// Lists agreements matching free-text `query`.
	pub async fn search_agreements(
		&self,
		query: impl Into<String>,
		params: ListAgreementsParams,
	) -> Result<AgreementList> {
		self.list_agreements(ListAgreementsParams { query: Some(query.into()), ..params }).await
	}

	/// Lists agreements in any of `statuses`.
	pub async fn agreements_by_status<I, S>(
		&self,
		statuses: I,
		params: ListAgreementsParams,
	) -> Result<AgreementList>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let status = statuses.into_iter().map(Into::into).collect();

		self.list_agreements(ListAgreementsParams { status, ..params }).await
	}

	fn account_path(&self) -> Result<String, ConfigError> {
		self.account_id
			.read()
			.as_deref()
			.filter(|id| !id.is_empty())
			.map(|id| format!("/v1/accounts/{}", resources::segment(id)))
			.ok_or(ConfigError::MissingAccountId)
	}
}
impl<C> Debug for AgreementsClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("AgreementsClient")
			.field("pipeline", &self.pipeline)
			.field("account_id", &*self.account_id.read())
			.field("contract", &self.contract)
			.finish()
	}
}
