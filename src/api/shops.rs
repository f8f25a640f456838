//! Shop listing and lookup.

// self
use crate::{_prelude::*, api::PrintifyClient};

impl PrintifyClient {
	/// Lists every shop in the account.
	pub async fn list_shops(&self) -> Result<Value> {
		self.get("/v1/shops.json", None).await
	}

	/// Finds a shop by identifier among [`list_shops`](Self::list_shops).
	///
	/// Identifiers match whether the upstream renders them as numbers or strings.
	pub async fn get_shop(&self, shop_id: &str) -> Result<Option<Value>> {
		let shops = self.list_shops().await?;
		let Value::Array(shops) = shops else { return Ok(None) };

		Ok(shops.into_iter().find(|shop| shop.get("id").is_some_and(|id| id_matches(id, shop_id))))
	}
}

fn id_matches(id: &Value, wanted: &str) -> bool {
	match id {
		Value::String(id) => id == wanted,
		Value::Number(id) => id.to_string() == wanted,
		_ => false,
	}
}
