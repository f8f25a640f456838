//! Shop-scoped order operations.

// self
use crate::{
	_prelude::*,
	api::{Page, PrintifyClient, path_segment},
};

impl PrintifyClient {
	/// Lists orders in the shop.
	pub async fn list_orders(&self, shop_id: Option<&str>, page: Page) -> Result<Value> {
		self.get(self.shop_path(shop_id, "orders.json")?, Some(page)).await
	}

	/// Fetches one order with line items and shipping status.
	pub async fn get_order(&self, shop_id: Option<&str>, order_id: &str) -> Result<Value> {
		let order_id = path_segment(order_id)?;
		let path = self.shop_path(shop_id, &format!("orders/{order_id}.json"))?;

		self.get(path, None).await
	}

	/// Sends an order to production. The upstream cannot undo this.
	pub async fn submit_order(&self, shop_id: Option<&str>, order_id: &str) -> Result<Value> {
		let order_id = path_segment(order_id)?;
		let path = self.shop_path(shop_id, &format!("orders/{order_id}/send_to_production.json"))?;

		self.post(path, None).await
	}
}
