//! Catalog browsing. Catalog paths are global, not shop-scoped.

// self
use crate::{_prelude::*, api::PrintifyClient};

impl PrintifyClient {
	/// Lists all product blueprints.
	pub async fn list_blueprints(&self) -> Result<Value> {
		self.get("/v1/catalog/blueprints.json", None).await
	}

	/// Fetches one blueprint.
	pub async fn get_blueprint(&self, blueprint_id: u64) -> Result<Value> {
		self.get(format!("/v1/catalog/blueprints/{blueprint_id}.json"), None).await
	}

	/// Lists print providers offering a blueprint.
	pub async fn get_print_providers(&self, blueprint_id: u64) -> Result<Value> {
		self.get(format!("/v1/catalog/blueprints/{blueprint_id}/print_providers.json"), None).await
	}

	/// Lists variants for a blueprint and print provider.
	pub async fn get_variants(&self, blueprint_id: u64, provider_id: u64) -> Result<Value> {
		self.get(
			format!(
				"/v1/catalog/blueprints/{blueprint_id}/print_providers/{provider_id}/variants.json"
			),
			None,
		)
		.await
	}
}
