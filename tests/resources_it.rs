#![cfg(feature = "reqwest")]

// std
use std::time::Duration as StdDuration;
// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use contract_sdk::{
	_preludet::*,
	auth::TokenRecord,
	config::{AgreementListContract, ClientConfig},
	error::{ConfigError, SearchTaskError},
	http::ReqwestHttpClient,
	pipeline::RequestPipeline,
	resources::{
		AgreementList, AgreementsClient, DocumentsClient, ListAgreementsParams,
		ListDocumentsParams,
	},
	store::MemorySink,
};

fn signed_in_sink() -> Arc<MemorySink> {
	let record = TokenRecord::builder()
		.access_token("access-1")
		.refresh_token("refresh-1")
		.expires_in(3600)
		.build()
		.expect("Signed-in record fixture should build.");

	Arc::new(MemorySink::with_record(record))
}

async fn agreements(config: ClientConfig) -> AgreementsClient<ReqwestHttpClient> {
	let base_url = config.agreements_base_url.clone();
	let flow = build_reqwest_test_flow(config, signed_in_sink()).await;

	AgreementsClient::new(RequestPipeline::new(flow, base_url, "agreements"))
}

async fn documents(server: &MockServer) -> DocumentsClient<ReqwestHttpClient> {
	let config = test_config(&server.base_url());
	let base_url = config.documents_base_url.clone();
	let flow = build_reqwest_test_flow(config, signed_in_sink()).await;

	DocumentsClient::new(RequestPipeline::new(flow, base_url, "documents"))
		.with_search_timing(StdDuration::from_millis(10), StdDuration::from_millis(200))
}

#[tokio::test]
async fn listing_applies_defaults_and_reads_the_cursor() {
	let server = MockServer::start_async().await;
	let client = agreements(test_config(&server.base_url())).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/accounts/acct-1/agreements")
				.header("authorization", "Bearer access-1")
				.query_param("limit", "20")
				.query_param("sort", "metadata.created_at")
				.query_param("direction", "desc");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"userAgreementList": [{ "agreementId": "a-1", "name": "NDA", "status": "active" }],
				"page": { "nextCursor": "cursor-2", "pageSize": 20 }
			}));
		})
		.await;
	let list = client
		.list_agreements(ListAgreementsParams::default())
		.await
		.expect("Listing should succeed.");

	mock.assert_async().await;

	assert!(matches!(list, AgreementList::UserAgreementList(_)));
	assert_eq!(list.next_cursor(), Some("cursor-2"));
	assert_eq!(list.agreements()[0].id.as_deref(), Some("a-1"));
	assert_eq!(list.agreements()[0].name.as_deref(), Some("NDA"));
}

#[tokio::test]
async fn configured_contract_selects_the_response_shape() {
	let server = MockServer::start_async().await;
	let mut config = test_config(&server.base_url());

	config.agreement_list_contract = AgreementListContract::DataWithPageToken;

	let client = agreements(config).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/accounts/acct-1/agreements")
				.query_param("query", "lease")
				.query_param("status", "active")
				.query_param("status", "pending");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"data": [{ "id": "a-9", "status": "pending" }],
				"response_metadata": { "page_token_next": "token-2" }
			}));
		})
		.await;
	let list = client
		.agreements_by_status(
			["active", "pending"],
			ListAgreementsParams { query: Some("lease".into()), ..Default::default() },
		)
		.await
		.expect("Listing should succeed.");

	mock.assert_async().await;

	assert_eq!(list.next_cursor(), Some("token-2"));
	assert_eq!(list.into_agreements()[0].id.as_deref(), Some("a-9"));
}

#[tokio::test]
async fn default_contract_ignores_the_other_shape() {
	let server = MockServer::start_async().await;
	let client = agreements(test_config(&server.base_url())).await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/accounts/acct-1/agreements");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "data": [{ "id": "a-9" }] }));
		})
		.await;

	let list = client
		.search_agreements("nda", ListAgreementsParams::default())
		.await
		.expect("Listing should succeed.");

	assert!(list.agreements().is_empty());
	assert_eq!(list.next_cursor(), None);
}

#[tokio::test]
async fn missing_account_fails_before_any_request() {
	let server = MockServer::start_async().await;
	let mut config = test_config(&server.base_url());

	config.account_id = None;

	let client = agreements(config).await;
	let mock = server
		.mock_async(|when, then| {
			when.any_request();
			then.status(200);
		})
		.await;
	let err = client.get_agreement("a-1").await.expect_err("An account id is required.");

	assert!(matches!(err, Error::Config(ConfigError::MissingAccountId)));

	mock.assert_calls_async(0).await;
	mock.delete_async().await;

	let detail = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/accounts/acct-7/agreements/a-1");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "a-1", "parties": [] }));
		})
		.await;

	client.set_account_id("acct-7");

	let agreement = client.get_agreement("a-1").await.expect("Lookup should succeed.");

	detail.assert_async().await;

	assert_eq!(agreement.id.as_deref(), Some("a-1"));
	assert!(agreement.extra.contains_key("parties"));
}

#[tokio::test]
async fn search_task_with_href_only_id_completes() {
	let server = MockServer::start_async().await;
	let client = documents(&server).await;
	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/documentsearchtasks").json_body(json!({
				"IncludeSubFolders": true,
				"InFolder": { "Id": "folder-1" }
			}));
			then.status(201).header("content-type", "application/json").json_body(json!({
				"Href": format!("{}/documentsearchtasks/task-7", server.base_url())
			}));
		})
		.await;
	let poll = server
		.mock_async(|when, then| {
			when.method(GET).path("/documentsearchtasks/task-7");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"Status": "Completed",
				"Result": {
					"Objects": [{ "Uid": "doc-1", "Name": "Lease.pdf", "NativeFileSize": 2048 }],
					"TotalCount": 12
				}
			}));
		})
		.await;
	let list = client
		.documents_in_folder("folder-1", ListDocumentsParams { offset: Some(40), ..Default::default() })
		.await
		.expect("Search should complete.");

	create.assert_async().await;
	poll.assert_async().await;

	assert_eq!(list.documents.len(), 1);
	assert_eq!(list.documents[0].uid.as_deref(), Some("doc-1"));
	assert_eq!(list.total_count, 12);
	assert_eq!(list.page_size, 20);
	assert_eq!(list.offset, 40);
}

#[tokio::test]
async fn failed_search_task_is_reported() {
	let server = MockServer::start_async().await;
	let client = documents(&server).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/documentsearchtasks").json_body(json!({
				"IncludeSubFolders": true,
				"AnyWords": "lease"
			}));
			then.status(200).header("content-type", "application/json").json_body(json!({ "Id": "task-f" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/documentsearchtasks/task-f");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "Status": "Failed" }));
		})
		.await;

	let err = client
		.search_documents("lease", ListDocumentsParams::default())
		.await
		.expect_err("Failed tasks must surface.");

	assert!(matches!(
		err,
		Error::SearchTask(SearchTaskError::Failed { ref status }) if status == "Failed"
	));
}

#[tokio::test]
async fn search_task_that_never_finishes_times_out() {
	let server = MockServer::start_async().await;
	let client = documents(&server).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/documentsearchtasks");
			then.status(200).header("content-type", "application/json").json_body(json!({ "Id": "task-slow" }));
		})
		.await;

	let poll = server
		.mock_async(|when, then| {
			when.method(GET).path("/documentsearchtasks/task-slow");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "Status": "Running" }));
		})
		.await;
	let err = client
		.list_documents(ListDocumentsParams::default())
		.await
		.expect_err("Polling must give up.");

	match err {
		Error::SearchTask(SearchTaskError::TimedOut { waited }) =>
			assert!(waited >= StdDuration::from_millis(200)),
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(poll.calls_async().await >= 2);
}

#[tokio::test]
async fn search_task_without_identifier_is_rejected() {
	let server = MockServer::start_async().await;
	let client = documents(&server).await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/documentsearchtasks");
			then.status(200).header("content-type", "application/json").json_body(json!({}));
		})
		.await;

	let err = client
		.list_documents(ListDocumentsParams::default())
		.await
		.expect_err("A task id is required.");

	assert!(matches!(err, Error::SearchTask(SearchTaskError::MissingTaskId)));
}

#[tokio::test]
async fn documents_folders_and_downloads() {
	let server = MockServer::start_async().await;
	let client = documents(&server).await;
	let document = server
		.mock_async(|when, then| {
			when.method(GET).path("/documents/doc-1").query_param("expand", "AttributeGroups");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"Uid": "doc-1",
				"AttributeGroups": { "contract": { "value": 10 } }
			}));
		})
		.await;
	let folders = server
		.mock_async(|when, then| {
			when.method(GET).path("/folders");
			then.status(200).header("content-type", "application/json").json_body(json!({
				"folders": [{ "id": "f-1", "name": "Leases", "parentId": "root" }]
			}));
		})
		.await;
	let folder = server
		.mock_async(|when, then| {
			when.method(GET).path("/folders/f-1");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "f-1", "path": "/Leases" }));
		})
		.await;
	let download = server
		.mock_async(|when, then| {
			when.method(GET).path("/documents/doc-1/download");
			then.status(200).header("content-type", "application/pdf").body(b"%PDF-1.7".to_vec());
		})
		.await;
	let fetched = client.get_document("doc-1").await.expect("Document should load.");
	let listed = client.folders().await.expect("Folders should load.");
	let single = client.folder("f-1").await.expect("Folder should load.");
	let bytes = client.download_document("doc-1").await.expect("Download should succeed.");

	document.assert_async().await;
	folders.assert_async().await;
	folder.assert_async().await;
	download.assert_async().await;

	assert!(fetched.attribute_groups.is_some_and(|groups| groups.contains_key("contract")));
	assert_eq!(listed[0].parent_id.as_deref(), Some("root"));
	assert_eq!(single.path.as_deref(), Some("/Leases"));
	assert_eq!(bytes, b"%PDF-1.7");
}

#[tokio::test]
async fn identifiers_are_encoded_as_single_path_segments() {
	let server = MockServer::start_async().await;
	let client = documents(&server).await;
	let document = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/documents/a%3Fb")
				.query_param("expand", "AttributeGroups")
				.query_param_missing("b");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "Uid": "a?b" }));
		})
		.await;
	let agreement = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/accounts/acct-1/agreements/x%2Fy%23z");
			then.status(200)
				.header("content-type", "application/json")
				.json_body(json!({ "id": "x/y#z" }));
		})
		.await;
	let agreements = agreements(test_config(&server.base_url())).await;

	client.get_document("a?b").await.expect("Encoded document id should resolve.");

	let fetched = agreements.get_agreement("x/y#z").await.expect("Encoded agreement id should resolve.");

	document.assert_async().await;
	agreement.assert_async().await;

	assert_eq!(fetched.id.as_deref(), Some("x/y#z"));
}
