//! Signs in with Authorization Code + PKCE, persists the session to a JSON file, and lists the
//! first page of agreements.
//!
//! Reads `CONTRACT_SDK_*` variables for configuration. When the stored session cannot be used or
//! refreshed, prints the consent URL and waits for the `code` query parameter of the redirect on
//! stdin.

// std
use std::{env, io, sync::Arc};
// crates.io
use color_eyre::Result;
// self
use contract_sdk::{
	client::ContractClient,
	config::ClientConfig,
	resources::ListAgreementsParams,
	store::{FileSink, TokenSink},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = ClientConfig::from_env()?;
	let path = env::var("CONTRACT_SDK_TOKEN_FILE")
		.unwrap_or_else(|_| env::temp_dir().join("contract_sdk_demo_token.json").display().to_string());
	let sink: Arc<dyn TokenSink> = Arc::new(FileSink::open(path)?);
	let client = ContractClient::connect(config, sink).await?;

	if client.flow().get_valid_access_token().await.is_err() {
		let url = client.flow().build_authorization_url(Some("demo"))?;
		let mut code = String::new();

		println!("Open {url} and paste the `code` from the redirect:");
		io::stdin().read_line(&mut code)?;

		let record = client.flow().exchange_code(code.trim()).await?;

		println!("Signed in; token expires at {}.", record.expires_at());
	}

	let page = client.agreements().list_agreements(ListAgreementsParams::default()).await?;

	for agreement in page.agreements() {
		println!(
			"{} {}",
			agreement.id.as_deref().unwrap_or("<no id>"),
			agreement.name.as_deref().unwrap_or("<unnamed>")
		);
	}
	if let Some(cursor) = page.next_cursor() {
		println!("More results: pass cursor `{cursor}`.");
	}

	Ok(())
}
