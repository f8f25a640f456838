//! Shop-scoped product operations.

// self
use crate::{
	_prelude::*,
	api::{Page, PrintifyClient, path_segment},
};

impl PrintifyClient {
	/// Lists products in the shop.
	pub async fn list_products(&self, shop_id: Option<&str>, page: Page) -> Result<Value> {
		self.get(self.shop_path(shop_id, "products.json")?, Some(page)).await
	}

	/// Fetches one product, including mockup image URLs.
	pub async fn get_product(&self, shop_id: Option<&str>, product_id: &str) -> Result<Value> {
		let product_id = path_segment(product_id)?;
		let path = self.shop_path(shop_id, &format!("products/{product_id}.json"))?;

		self.get(path, None).await
	}

	/// Creates a product from an upstream-shaped payload.
	pub async fn create_product(&self, shop_id: Option<&str>, data: Value) -> Result<Value> {
		self.post(self.shop_path(shop_id, "products.json")?, Some(data)).await
	}

	/// Updates a product.
	pub async fn update_product(
		&self,
		shop_id: Option<&str>,
		product_id: &str,
		data: Value,
	) -> Result<Value> {
		let product_id = path_segment(product_id)?;
		let path = self.shop_path(shop_id, &format!("products/{product_id}.json"))?;

		self.put(path, data).await
	}

	/// Deletes a product.
	pub async fn delete_product(&self, shop_id: Option<&str>, product_id: &str) -> Result<Value> {
		let product_id = path_segment(product_id)?;
		let path = self.shop_path(shop_id, &format!("products/{product_id}.json"))?;

		self.delete(path).await
	}

	/// Publishes a product to the shop's sales channels.
	pub async fn publish_product(
		&self,
		shop_id: Option<&str>,
		product_id: &str,
		data: Value,
	) -> Result<Value> {
		let product_id = path_segment(product_id)?;
		let path = self.shop_path(shop_id, &format!("products/{product_id}/publish.json"))?;

		self.post(path, Some(data)).await
	}
}
