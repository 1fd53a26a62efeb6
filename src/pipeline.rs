//! Authenticated request pipeline bound to one API base URL.
//!
//! Every call obtains a usable token from the [`AuthorizationFlow`], attaches it as a bearer
//! credential, and classifies the response:
//!
//! 1. `401`: one refresh-and-replay per call; a refresh failure or a second `401` surfaces as
//!    [`Error::ReauthenticationRequired`].
//! 2. `429`: exponential backoff within the [`RetryPolicy`] budget.
//! 3. `5xx`: linear backoff within the same budget.
//!
//! A spent budget becomes [`TransientError::RetriesExhausted`]; any other non-2xx status becomes
//! [`Error::Api`]. Transport failures are returned immediately.

pub mod response;
pub mod retry;

pub use response::ApiResponse;
pub use retry::RetryPolicy;

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{Method, Request, StatusCode, header},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	config,
	error::{ConfigError, TransientError},
	flows::AuthorizationFlow,
	http::{self, ResponseMetadataSlot, TokenHttpClient},
	obs::{self, FlowKind, FlowOutcome, FlowSpan, RetryReason},
	pipeline::retry::RetryContext,
};

const APPLICATION_JSON: &str = "application/json";

/// Query pairs and extra headers attached to one call.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestOptions {
	/// Query pairs appended in order; repeated keys are allowed.
	pub query: Vec<(String, String)>,
	/// Additional request headers.
	pub headers: Vec<(String, String)>,
}
impl RequestOptions {
	/// Empty options.
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a query pair.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Appends a query pair when `value` is present.
	pub fn query_opt(self, key: impl Into<String>, value: Option<impl Into<String>>) -> Self {
		match value {
			Some(value) => self.query(key, value),
			None => self,
		}
	}

	/// Appends a request header.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.push((name.into(), value.into()));

		self
	}
}

struct RawResponse {
	status: StatusCode,
	body: Vec<u8>,
}

/// Bearer-token HTTP pipeline for one API base URL.
pub struct RequestPipeline<C>
where
	C: ?Sized + TokenHttpClient,
{
	flow: Arc<AuthorizationFlow<C>>,
	base_url: Url,
	label: &'static str,
	retry: RetryPolicy,
}
impl<C> RequestPipeline<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Binds a pipeline to `base_url`; `label` names the API in transport errors and logs.
	///
	/// The retry policy comes from the flow's configuration.
	pub fn new(flow: Arc<AuthorizationFlow<C>>, base_url: Url, label: &'static str) -> Self {
		let retry = flow.config().retry;

		Self { flow, base_url, label, retry }
	}

	/// Overrides the retry policy.
	pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
		self.retry = retry;

		self
	}

	/// Base URL every path is appended to.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Flow that supplies tokens to this pipeline.
	pub fn flow(&self) -> &Arc<AuthorizationFlow<C>> {
		&self.flow
	}

	/// `GET {base}{path}`.
	pub async fn get<T>(&self, path: &str, options: RequestOptions) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		self.send_json(Method::GET, path, None, &options).await
	}

	/// `POST {base}{path}` with an optional JSON body.
	pub async fn post<B, T>(
		&self,
		path: &str,
		body: Option<&B>,
		options: RequestOptions,
	) -> Result<ApiResponse<T>>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.send_json(Method::POST, path, encode_body(body)?, &options).await
	}

	/// `PUT {base}{path}` with an optional JSON body.
	pub async fn put<B, T>(
		&self,
		path: &str,
		body: Option<&B>,
		options: RequestOptions,
	) -> Result<ApiResponse<T>>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.send_json(Method::PUT, path, encode_body(body)?, &options).await
	}

	/// `PATCH {base}{path}` with an optional JSON body.
	pub async fn patch<B, T>(
		&self,
		path: &str,
		body: Option<&B>,
		options: RequestOptions,
	) -> Result<ApiResponse<T>>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.send_json(Method::PATCH, path, encode_body(body)?, &options).await
	}

	/// `DELETE {base}{path}`.
	pub async fn delete<T>(&self, path: &str, options: RequestOptions) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		self.send_json(Method::DELETE, path, None, &options).await
	}

	/// `GET {base}{path}` returning the raw body, for binary downloads.
	pub async fn get_bytes(
		&self,
		path: &str,
		options: RequestOptions,
	) -> Result<ApiResponse<Vec<u8>>> {
		let raw = self.execute(Method::GET, path, None, &options).await?;

		Ok(ApiResponse { status: raw.status.as_u16(), body: raw.body })
	}

	async fn send_json<T>(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
		options: &RequestOptions,
	) -> Result<ApiResponse<T>>
	where
		T: DeserializeOwned,
	{
		let raw = self.execute(method, path, body, options).await?;

		Ok(ApiResponse { status: raw.status.as_u16(), body: response::decode_body(&raw.body)? })
	}

	async fn execute(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
		options: &RequestOptions,
	) -> Result<RawResponse> {
		const KIND: FlowKind = FlowKind::ApiRequest;

		let span = FlowSpan::new(KIND, self.label);

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.execute_inner(method, path, body, options)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	async fn execute_inner(
		&self,
		method: Method,
		path: &str,
		body: Option<Vec<u8>>,
		options: &RequestOptions,
	) -> Result<RawResponse> {
		let url = self.url_for(path, options)?;
		let mut token = self.flow.get_valid_access_token().await?;
		let mut ctx = RetryContext::default();

		loop {
			let request = build_request(&method, &url, &token, body.as_deref(), options)?;
			let handle = self.flow.http_client().with_metadata(ResponseMetadataSlot::default());

			ctx.sends += 1;

			let response = handle
				.call(request)
				.await
				.map_err(|e| http::map_transport_error(self.label, e))?;
			let status = response.status();

			if status.is_success() {
				return Ok(RawResponse { status, body: response.into_body() });
			}
			if status == StatusCode::UNAUTHORIZED {
				if ctx.auth_retried {
					return Err(Error::ReauthenticationRequired);
				}

				ctx.auth_retried = true;

				match self.flow.refresh_after_rejection(&token).await {
					Ok(fresh) => {
						obs::record_retry(RetryReason::Unauthorized);

						token = fresh;

						continue;
					},
					Err(_) => {
						self.flow.credentials().clear().await;

						obs::log_credentials_cleared("reauthentication_required");

						return Err(Error::ReauthenticationRequired);
					},
				}
			}

			let message = response::error_message(status, response.body());
			let reason = if status == StatusCode::TOO_MANY_REQUESTS {
				Some(RetryReason::RateLimited)
			} else if status.is_server_error() {
				Some(RetryReason::ServerError)
			} else {
				None
			};

			match reason {
				Some(reason) if self.retry.allows_retry(ctx.attempt) => {
					let delay = match reason {
						RetryReason::RateLimited => self.retry.rate_limit_delay(ctx.attempt),
						_ => self.retry.server_error_delay(ctx.attempt),
					};

					obs::log_retry_scheduled(reason, status.as_u16(), ctx.attempt, delay);
					obs::record_retry(reason);
					tokio::time::sleep(delay).await;

					ctx.attempt += 1;
				},
				Some(_) =>
					return Err(TransientError::RetriesExhausted {
						status: status.as_u16(),
						attempts: ctx.sends,
						message,
					}
					.into()),
				None => return Err(Error::Api { status: Some(status.as_u16()), message }),
			}
		}
	}

	fn url_for(&self, path: &str, options: &RequestOptions) -> Result<Url, ConfigError> {
		let mut url = config::join_url(self.label, &self.base_url, path)?;

		if !options.query.is_empty() {
			url.query_pairs_mut().extend_pairs(options.query.iter());
		}

		Ok(url)
	}
}
impl<C> Clone for RequestPipeline<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn clone(&self) -> Self {
		Self {
			flow: self.flow.clone(),
			base_url: self.base_url.clone(),
			label: self.label,
			retry: self.retry,
		}
	}
}
impl<C> Debug for RequestPipeline<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestPipeline")
			.field("base_url", &self.base_url.as_str())
			.field("label", &self.label)
			.field("retry", &self.retry)
			.finish()
	}
}

fn encode_body<B>(body: Option<&B>) -> Result<Option<Vec<u8>>>
where
	B: ?Sized + Serialize,
{
	body.map(serde_json::to_vec).transpose().map_err(|source| Error::Encode { source })
}

fn build_request(
	method: &Method,
	url: &Url,
	token: &TokenSecret,
	body: Option<&[u8]>,
	options: &RequestOptions,
) -> Result<Request<Vec<u8>>, ConfigError> {
	let mut builder = Request::builder()
		.method(method.clone())
		.uri(url.as_str())
		.header(header::AUTHORIZATION, token.bearer_header())
		.header(header::ACCEPT, APPLICATION_JSON);

	if body.is_some() {
		builder = builder.header(header::CONTENT_TYPE, APPLICATION_JSON);
	}
	for (name, value) in &options.headers {
		builder = builder.header(name.as_str(), value.as_str());
	}

	Ok(builder.body(body.map(<[u8]>::to_vec).unwrap_or_default())?)
}
