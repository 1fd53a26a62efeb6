#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use contract_sdk::{_preludet::*, auth::TokenRecord, store::MemorySink};

fn stale_record(refresh: Option<&str>) -> TokenRecord {
	let mut builder = TokenRecord::builder()
		.access_token("access-old")
		.expires_in(3600)
		.obtained_at(OffsetDateTime::now_utc() - Duration::hours(2));

	if let Some(refresh) = refresh {
		builder = builder.refresh_token(refresh);
	}

	builder.build().expect("Stale record fixture should build.")
}

#[tokio::test]
async fn stale_token_is_refreshed_and_keeps_the_old_refresh_token() {
	let server = MockServer::start_async().await;
	let sink = Arc::new(MemorySink::with_record(stale_record(Some("refresh-old"))));
	let flow = build_reqwest_test_flow(test_config(&server.base_url()), sink.clone()).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/token")
				.body_includes("grant_type=refresh_token")
				.body_includes("refresh_token=refresh-old");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"access-new\",\"token_type\":\"bearer\",\"expires_in\":3600}");
		})
		.await;

	assert!(!flow.is_authenticated());

	let token = flow.get_valid_access_token().await.expect("Refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(token.expose(), "access-new");
	assert!(flow.is_authenticated());

	let persisted = sink.snapshot().expect("Refreshed record should be persisted.");

	assert_eq!(persisted.refresh_token.as_ref().map(|t| t.expose()), Some("refresh-old"));
	assert!(!persisted.is_stale());
	assert_eq!(flow.refresh_metrics.attempts(), 1);
	assert_eq!(flow.refresh_metrics.successes(), 1);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
	let server = MockServer::start_async().await;
	let sink = Arc::new(MemorySink::with_record(stale_record(Some("refresh-old"))));
	let flow = build_reqwest_test_flow(test_config(&server.base_url()), sink).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-singleflight\",\"refresh_token\":\"refresh-new\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let (first, second, third) = tokio::join!(
		flow.get_valid_access_token(),
		flow.get_valid_access_token(),
		flow.get_valid_access_token()
	);

	for token in [first, second, third] {
		assert_eq!(token.expect("Every caller should get a token.").expose(), "access-singleflight");
	}

	mock.assert_calls_async(1).await;

	assert_eq!(flow.refresh_metrics.attempts(), 1);
}

#[tokio::test]
async fn explicit_refresh_rotates_tokens() {
	let server = MockServer::start_async().await;
	let record = TokenRecord::builder()
		.access_token("access-old")
		.refresh_token("refresh-old")
		.expires_in(3600)
		.build()
		.expect("Fresh record fixture should build.");
	let sink = Arc::new(MemorySink::with_record(record));
	let flow = build_reqwest_test_flow(test_config(&server.base_url()), sink.clone()).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token").body_includes("refresh_token=refresh-old");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"access-rotated\",\"refresh_token\":\"refresh-rotated\",\"token_type\":\"bearer\",\"expires_in\":1800,\"scope\":\"signature\"}",
				);
		})
		.await;
	let record = flow.refresh().await.expect("Explicit refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(record.access_token.expose(), "access-rotated");
	assert_eq!(record.refresh_token.as_ref().map(|t| t.expose()), Some("refresh-rotated"));
	assert_eq!(record.scope, "signature");
	assert_eq!(record.expires_in, 1800);
	assert_eq!(sink.snapshot(), Some(record));
}

#[tokio::test]
async fn failed_refresh_clears_every_credential() {
	let server = MockServer::start_async().await;
	let sink = Arc::new(MemorySink::with_record(stale_record(Some("refresh-revoked"))));
	let flow = build_reqwest_test_flow(test_config(&server.base_url()), sink.clone()).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\"}");
		})
		.await;
	let err = flow.get_valid_access_token().await.expect_err("Revoked refresh token must fail.");

	mock.assert_async().await;

	match err {
		Error::RefreshFailed { reason, status } => {
			assert_eq!(reason, "invalid_grant");
			assert_eq!(status, Some(400));
		},
		other => panic!("Unexpected error: {other:?}."),
	}

	assert!(flow.credentials().record().is_none());
	assert!(sink.snapshot().is_none());
	assert_eq!(flow.refresh_metrics.failures(), 1);

	let err = flow.get_valid_access_token().await.expect_err("Nothing is left to refresh.");

	assert!(matches!(err, Error::NotAuthenticated));
}

#[tokio::test]
async fn stale_token_without_refresh_token_needs_sign_in() {
	let server = MockServer::start_async().await;
	let sink = Arc::new(MemorySink::with_record(stale_record(None)));
	let flow = build_reqwest_test_flow(test_config(&server.base_url()), sink.clone()).await;
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/token");
			then.status(500);
		})
		.await;
	let err = flow.get_valid_access_token().await.expect_err("No refresh is possible.");

	assert!(matches!(err, Error::NotAuthenticated));
	assert!(sink.snapshot().is_none(), "Unusable records are dropped on load.");

	let err = flow.refresh().await.expect_err("Explicit refresh needs a refresh token.");

	assert!(matches!(err, Error::NoRefreshToken));

	mock.assert_calls_async(0).await;
}
