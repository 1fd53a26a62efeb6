#![cfg(feature = "reqwest")]

// std
use std::{env, fs, path::PathBuf, process};
// crates.io
use time::macros;
// self
use contract_sdk::{
	_preludet::*,
	auth::TokenRecord,
	store::{CredentialStore, FileSink, TokenSink},
};

fn temp_path(tag: &str) -> PathBuf {
	env::temp_dir().join(format!(
		"contract_sdk_store_it_{tag}_{}_{}.json",
		process::id(),
		OffsetDateTime::now_utc().unix_timestamp_nanos(),
	))
}

fn remove(path: &PathBuf) {
	let _ = fs::remove_file(path);
}

#[tokio::test]
async fn session_survives_a_restart() {
	let path = temp_path("restart");
	let sink: Arc<dyn TokenSink> =
		Arc::new(FileSink::open(&path).expect("File sink should open."));
	let store = CredentialStore::load(sink).await;
	let record = TokenRecord::builder()
		.access_token("access-file")
		.refresh_token("refresh-file")
		.expires_in(3600)
		.scope("signature")
		.build()
		.expect("Record fixture should build.");
	let stored = store.set_record(record).await;

	drop(store);

	let reopened: Arc<dyn TokenSink> =
		Arc::new(FileSink::open(&path).expect("File sink should reopen."));
	let store = CredentialStore::load(reopened).await;

	assert!(store.is_authenticated());
	assert_eq!(store.current_access_token().map(|t| t.expose().to_owned()).as_deref(), Some("access-file"));
	assert_eq!(
		store.record().map(|r| r.obtained_at.unix_timestamp()),
		Some(stored.obtained_at.unix_timestamp())
	);

	store.clear().await;

	assert!(!path.exists());
}

#[tokio::test]
async fn corrupt_file_loads_as_signed_out() {
	let path = temp_path("corrupt");

	fs::write(&path, b"{ not json").expect("Corrupt fixture should be written.");

	let sink: Arc<dyn TokenSink> = Arc::new(FileSink::open(&path).expect("File sink should open."));
	let store = CredentialStore::load(sink).await;

	assert!(store.record().is_none());
	assert!(!store.is_authenticated());

	remove(&path);
}

#[tokio::test]
async fn unusable_record_is_deleted_on_load() {
	let path = temp_path("expired");
	let sink = FileSink::open(&path).expect("File sink should open.");
	let record = TokenRecord::builder()
		.access_token("access-expired")
		.expires_in(3600)
		.obtained_at(macros::datetime!(2025-01-01 00:00 UTC))
		.build()
		.expect("Expired record fixture should build.");

	sink.save(record).await.expect("Expired record should be saved.");

	assert!(path.exists());

	let store = CredentialStore::load(Arc::new(sink)).await;

	assert!(store.record().is_none());
	assert!(!path.exists());
}

#[tokio::test]
async fn stale_record_with_refresh_token_is_kept_for_refresh() {
	let path = temp_path("refreshable");
	let sink = FileSink::open(&path).expect("File sink should open.");
	let record = TokenRecord::builder()
		.access_token("access-expired")
		.refresh_token("refresh-live")
		.expires_in(3600)
		.obtained_at(macros::datetime!(2025-01-01 00:00 UTC))
		.build()
		.expect("Refreshable record fixture should build.");

	sink.save(record).await.expect("Refreshable record should be saved.");

	let store = CredentialStore::load(Arc::new(sink)).await;

	assert!(store.is_stale());
	assert!(store.needs_refresh());
	assert!(store.current_access_token().is_none());
	assert_eq!(store.current_refresh_token().map(|t| t.expose().to_owned()).as_deref(), Some("refresh-live"));

	remove(&path);
}
