//! Ready-made entry point wiring one authorization flow into both resource clients.

// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	flows::AuthorizationFlow,
	http::ReqwestHttpClient,
	pipeline::RequestPipeline,
	resources::{AgreementsClient, DocumentsClient},
	store::{CredentialStore, TokenSink},
};

/// SDK client backed by the default reqwest transport.
///
/// Both resource clients share one [`AuthorizationFlow`], so a refresh triggered by either API
/// is visible to the other.
#[derive(Debug)]
pub struct ContractClient {
	flow: Arc<AuthorizationFlow<ReqwestHttpClient>>,
	agreements: AgreementsClient<ReqwestHttpClient>,
	documents: DocumentsClient<ReqwestHttpClient>,
}
impl ContractClient {
	/// Loads any persisted credentials from `sink` and builds the resource clients.
	pub async fn connect(config: ClientConfig, sink: Arc<dyn TokenSink>) -> Result<Self> {
		let credentials = Arc::new(CredentialStore::load(sink).await);
		let flow = Arc::new(AuthorizationFlow::new(config, credentials)?);

		Ok(Self::from_flow(flow))
	}

	/// Builds the resource clients on top of an existing flow.
	pub fn from_flow(flow: Arc<AuthorizationFlow<ReqwestHttpClient>>) -> Self {
		let config = flow.config();
		let agreements = AgreementsClient::new(RequestPipeline::new(
			flow.clone(),
			config.agreements_base_url.clone(),
			"agreements",
		));
		let documents = DocumentsClient::new(RequestPipeline::new(
			flow.clone(),
			config.documents_base_url.clone(),
			"documents",
		));

		Self { flow, agreements, documents }
	}

	/// Shared authorization flow, used for sign-in and logout.
	pub fn flow(&self) -> &Arc<AuthorizationFlow<ReqwestHttpClient>> {
		&self.flow
	}

	/// Agreements API client.
	pub fn agreements(&self) -> &AgreementsClient<ReqwestHttpClient> {
		&self.agreements
	}

	/// Document-management API client.
	pub fn documents(&self) -> &DocumentsClient<ReqwestHttpClient> {
		&self.documents
	}

	/// `true` when a usable access token is stored.
	pub fn is_authenticated(&self) -> bool {
		self.flow.is_authenticated()
	}
}
