//! Document-management API client, including the asynchronous search-task poller.

// std
use std::time::Duration as StdDuration;
// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	error::SearchTaskError,
	http::TokenHttpClient,
	obs::{self, FlowKind, FlowOutcome, FlowSpan},
	pipeline::{RequestOptions, RequestPipeline},
	resources,
};

/// Page size reported when the caller did not set a limit.
pub const DEFAULT_PAGE_SIZE: u32 = 20;
/// Interval between search task polls.
pub const DEFAULT_POLL_INTERVAL: StdDuration = StdDuration::from_secs(1);
/// Maximum time spent polling one search task.
pub const DEFAULT_SEARCH_TIMEOUT: StdDuration = StdDuration::from_secs(10);

const SEARCH_TASKS_PATH: &str = "/documentsearchtasks";

/// Filters for [`DocumentsClient::list_documents`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListDocumentsParams {
	/// Restricts the search to one folder (and its subfolders).
	pub folder_id: Option<String>,
	/// Offset echoed back in the result.
	pub offset: Option<u32>,
	/// Page size echoed back in the result.
	pub limit: Option<u32>,
	/// Free-text search (`AnyWords`).
	pub query: Option<String>,
}

/// Reference to a parent folder.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRef {
	/// Folder resource URL.
	#[serde(rename = "Href", default, skip_serializing_if = "Option::is_none")]
	pub href: Option<String>,
}

/// Document as returned by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Document {
	/// Document identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub uid: Option<String>,
	/// File name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Free-form description.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub description: Option<String>,
	/// Creation timestamp as sent by the API.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_date: Option<String>,
	/// Last update timestamp as sent by the API.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub updated_date: Option<String>,
	/// Size in bytes.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub native_file_size: Option<u64>,
	/// File extension.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub extension: Option<String>,
	/// Resource URL.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub href: Option<String>,
	/// Containing folder.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent_folder: Option<FolderRef>,
	/// Attribute groups, present when requested with `expand=AttributeGroups`.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub attribute_groups: Option<Map<String, Value>>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Folder as returned by the API.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
	/// Folder identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub id: Option<String>,
	/// Display name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	/// Path from the root folder.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub path: Option<String>,
	/// Parent folder identifier.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent_id: Option<String>,
	/// Creation timestamp as sent by the API.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub created_date: Option<String>,
	/// Last modification timestamp as sent by the API.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub modified_date: Option<String>,
	/// Remaining fields.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// One page of documents produced by a completed search task.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentList {
	/// Matching documents.
	pub documents: Vec<Document>,
	/// Total match count reported by the task, or the number of returned documents.
	pub total_count: u64,
	/// Requested page size.
	pub page_size: u32,
	/// Requested offset.
	pub offset: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
struct SearchTaskRequest<'a> {
	include_sub_folders: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	any_words: Option<&'a str>,
	#[serde(skip_serializing_if = "Option::is_none")]
	in_folder: Option<FolderId<'a>>,
}

#[derive(Debug, Serialize)]
struct FolderId<'a> {
	#[serde(rename = "Id")]
	id: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchTaskCreated {
	#[serde(default)]
	id: Option<String>,
	#[serde(default)]
	href: Option<String>,
}
impl SearchTaskCreated {
	fn task_id(self) -> Result<String, SearchTaskError> {
		self.id
			.filter(|id| !id.is_empty())
			.or_else(|| {
				self.href.as_deref().and_then(|href| {
					href.trim_end_matches('/')
						.rsplit('/')
						.next()
						.filter(|segment| !segment.is_empty())
						.map(str::to_owned)
				})
			})
			.ok_or(SearchTaskError::MissingTaskId)
	}
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchTaskStatus {
	#[serde(default)]
	status: Option<String>,
	#[serde(default)]
	result: Option<SearchTaskResult>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct SearchTaskResult {
	#[serde(default)]
	objects: Vec<Document>,
	#[serde(default)]
	total_count: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct FolderList {
	#[serde(default)]
	folders: Vec<Folder>,
}

enum TaskState {
	Done(SearchTaskResult),
	Failed(String),
	Pending,
}

fn classify(task: SearchTaskStatus) -> TaskState {
	match task.status.as_deref() {
		Some("Complete" | "Completed") => TaskState::Done(task.result.unwrap_or_default()),
		Some(status @ ("Failed" | "Error")) => TaskState::Failed(status.to_owned()),
		_ => TaskState::Pending,
	}
}

/// Client for the document-management API.
pub struct DocumentsClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	pipeline: RequestPipeline<C>,
	poll_interval: StdDuration,
	search_timeout: StdDuration,
}
impl<C> DocumentsClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	/// Wraps a pipeline bound to the documents base URL.
	pub fn new(pipeline: RequestPipeline<C>) -> Self {
		Self {
			pipeline,
			poll_interval: DEFAULT_POLL_INTERVAL,
			search_timeout: DEFAULT_SEARCH_TIMEOUT,
		}
	}

	/// Overrides the search task poll interval and deadline.
	pub fn with_search_timing(mut self, poll_interval: StdDuration, timeout: StdDuration) -> Self {
		self.poll_interval = poll_interval;
		self.search_timeout = timeout;

		self
	}

	/// Runs a search task and waits for its result.
	pub async fn list_documents(&self, params: ListDocumentsParams) -> Result<DocumentList> {
		const KIND: FlowKind = FlowKind::DocumentSearch;

		let span = FlowSpan::new(KIND, "list_documents");

		obs::record_flow_outcome(KIND, FlowOutcome::Attempt);

		let result = span.instrument(self.run_search(params)).await;

		match &result {
			Ok(_) => obs::record_flow_outcome(KIND, FlowOutcome::Success),
			Err(_) => obs::record_flow_outcome(KIND, FlowOutcome::Failure),
		}

		result
	}

	/// Lists documents under `folder_id`.
	pub async fn documents_in_folder(
		&self,
		folder_id: impl Into<String>,
		params: ListDocumentsParams,
	) -> Result<DocumentList> {
		self.list_documents(ListDocumentsParams { folder_id: Some(folder_id.into()), ..params }).await
	}

	/// Lists documents matching any word of `query`.
	pub async fn search_documents(
		&self,
		query: impl Into<String>,
		params: ListDocumentsParams,
	) -> Result<DocumentList> {
		self.list_documents(ListDocumentsParams { query: Some(query.into()), ..params }).await
	}

	/// Fetches one document with its attribute groups expanded.
	pub async fn get_document(&self, document_id: &str) -> Result<Document> {
		let path = format!("/documents/{}", resources::segment(document_id));
		let options = RequestOptions::new().query("expand", "AttributeGroups");

		Ok(self.pipeline.get(&path, options).await?.into_body())
	}

	/// Lists every folder visible to the account.
	pub async fn folders(&self) -> Result<Vec<Folder>> {
		let list: FolderList = self.pipeline.get("/folders", RequestOptions::new()).await?.into_body();

		Ok(list.folders)
	}

	/// Fetches one folder.
	pub async fn folder(&self, folder_id: &str) -> Result<Folder> {
		let path = format!("/folders/{}", resources::segment(folder_id));

		Ok(self.pipeline.get(&path, RequestOptions::new()).await?.into_body())
	}

	/// Downloads the document's content.
	pub async fn download_document(&self, document_id: &str) -> Result<Vec<u8>> {
		let path = format!("/documents/{}/download", resources::segment(document_id));

		Ok(self.pipeline.get_bytes(&path, RequestOptions::new()).await?.into_body())
	}

	async fn run_search(&self, params: ListDocumentsParams) -> Result<DocumentList> {
		let request = SearchTaskRequest {
			include_sub_folders: true,
			any_words: params.query.as_deref(),
			in_folder: params.folder_id.as_deref().map(|id| FolderId { id }),
		};
		let created: Option<SearchTaskCreated> = self
			.pipeline
			.post(SEARCH_TASKS_PATH, Some(&request), RequestOptions::new())
			.await?
			.into_body();
		let task_id = created.unwrap_or_default().task_id()?;
		let result = self.poll_search_task(&task_id).await?;
		let total_count = result.total_count.unwrap_or(result.objects.len() as u64);

		Ok(DocumentList {
			documents: result.objects,
			total_count,
			page_size: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
			offset: params.offset.unwrap_or(0),
		})
	}

	async fn poll_search_task(&self, task_id: &str) -> Result<SearchTaskResult> {
		let path = format!("{SEARCH_TASKS_PATH}/{}", resources::segment(task_id));
		let started = tokio::time::Instant::now();

		while started.elapsed() < self.search_timeout {
			let task: SearchTaskStatus =
				self.pipeline.get(&path, RequestOptions::new()).await?.into_body();

			match classify(task) {
				TaskState::Done(result) => return Ok(result),
				TaskState::Failed(status) => return Err(SearchTaskError::Failed { status }.into()),
				TaskState::Pending => tokio::time::sleep(self.poll_interval).await,
			}
		}

		Err(SearchTaskError::TimedOut { waited: started.elapsed() }.into())
	}
}
impl<C> Debug for DocumentsClient<C>
where
	C: ?Sized + TokenHttpClient,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("DocumentsClient")
			.field("pipeline", &self.pipeline)
			.field("poll_interval", &self.poll_interval)
			.field("search_timeout", &self.search_timeout)
			.finish()
	}
}
