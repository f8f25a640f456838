//! Tool registry exposing the upstream API as named, JSON-argument tools.
//!
//! Tool failures are data, not faults: every error is rendered as
//! `{"error": true, "status_code": .., "message": .., "details": ..}` and returned to the caller
//! with the error flag set.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	api::{ImageSource, Page, PrintifyClient},
	obs::{self, Operation, OperationSpan, Outcome},
};

/// Published description of a tool.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
	/// Unique tool name.
	pub name: &'static str,
	/// Human-readable description.
	pub description: &'static str,
	/// JSON Schema of the arguments object.
	pub input_schema: Value,
}

/// Result of a tool invocation.
#[derive(Clone, Debug, PartialEq)]
pub struct ToolOutput {
	/// JSON result or rendered error.
	pub value: Value,
	/// Whether `value` is a rendered error.
	pub is_error: bool,
}
impl ToolOutput {
	fn ok(value: Value) -> Self {
		Self { value, is_error: false }
	}

	fn error(error: &Error) -> Self {
		Self { value: render_error(error), is_error: true }
	}
}

/// Dispatches tool calls into a [`PrintifyClient`].
#[derive(Clone, Debug)]
pub struct ToolRegistry {
	client: PrintifyClient,
}
impl ToolRegistry {
	/// Creates a registry over `client`.
	pub fn new(client: PrintifyClient) -> Self {
		Self { client }
	}

	/// Every tool the registry answers to.
	pub fn definitions(&self) -> Vec<ToolDefinition> {
		definitions()
	}

	/// Runs the named tool. Unknown names and malformed arguments are rendered errors.
	pub async fn call(&self, name: &str, arguments: Value) -> ToolOutput {
		let span = OperationSpan::new(Operation::ToolCall, "call");
		let result = span.instrument(self.dispatch(name, arguments)).await;

		match result {
			Ok(value) => {
				obs::record_operation(Operation::ToolCall, Outcome::Success);

				ToolOutput::ok(value)
			},
			Err(e) => {
				obs::record_operation(Operation::ToolCall, Outcome::Failure);
				tracing::warn!(tool = name, error = %e, "Tool call failed.");

				ToolOutput::error(&e)
			},
		}
	}

	async fn dispatch(&self, name: &str, arguments: Value) -> Result<Value> {
		let client = &self.client;

		match name {
			"list_shops" => client.list_shops().await,
			"get_shop" => {
				let args: ShopArgs = decode(arguments)?;

				Ok(client
					.get_shop(&args.shop_id)
					.await?
					.unwrap_or_else(|| Value::String(format!("Shop {} not found", args.shop_id))))
			},
			"list_products" => {
				let args: PageArgs = decode(arguments)?;

				client.list_products(args.shop_id.as_deref(), args.page).await
			},
			"get_product" => {
				let args: ProductArgs = decode(arguments)?;

				client.get_product(args.shop_id.as_deref(), &args.product_id).await
			},
			"create_product" => {
				let args: DataArgs = decode(arguments)?;

				client.create_product(args.shop_id.as_deref(), args.data).await
			},
			"update_product" => {
				let args: ProductDataArgs = decode(arguments)?;

				client.update_product(args.shop_id.as_deref(), &args.product_id, args.data).await
			},
			"delete_product" => {
				let args: ProductArgs = decode(arguments)?;

				client.delete_product(args.shop_id.as_deref(), &args.product_id).await
			},
			"publish_product" => {
				let args: ProductDataArgs = decode(arguments)?;

				client.publish_product(args.shop_id.as_deref(), &args.product_id, args.data).await
			},
			"list_blueprints" => client.list_blueprints().await,
			"get_blueprint" => {
				let args: BlueprintArgs = decode(arguments)?;

				client.get_blueprint(args.blueprint_id).await
			},
			"get_print_providers" => {
				let args: BlueprintArgs = decode(arguments)?;

				client.get_print_providers(args.blueprint_id).await
			},
			"get_variants" => {
				let args: VariantArgs = decode(arguments)?;

				client.get_variants(args.blueprint_id, args.provider_id).await
			},
			"upload_image" => {
				let args: ImageArgs = decode(arguments)?;
				let source = ImageSource::resolve(args.url, args.contents)?;

				client.upload_image(&args.file_name, source).await
			},
			"list_orders" => {
				let args: PageArgs = decode(arguments)?;

				client.list_orders(args.shop_id.as_deref(), args.page).await
			},
			"get_order" => {
				let args: OrderArgs = decode(arguments)?;

				client.get_order(args.shop_id.as_deref(), &args.order_id).await
			},
			"submit_order" => {
				let args: OrderArgs = decode(arguments)?;

				client.submit_order(args.shop_id.as_deref(), &args.order_id).await
			},
			_ => Err(Error::input_invalid(format!("Unknown tool: {name}."))),
		}
	}
}

/// Renders an error as the structured payload returned to tool callers.
pub fn render_error(error: &Error) -> Value {
	let (status_code, details) = match error {
		Error::Upstream(e) => (e.status, e.details.clone()),
		Error::InputInvalid { .. } | Error::Decode { .. } => (400, json!({})),
		Error::Transport(_) => (502, json!({})),
		Error::Config(_) | Error::Io(_) => (500, json!({})),
	};

	json!({
		"error": true,
		"status_code": status_code,
		"message": error.to_string(),
		"details": details,
	})
}

/// Tool definitions in registration order.
pub fn definitions() -> Vec<ToolDefinition> {
	vec![
		tool("list_shops", "List all Printify shops in your account.", object(json!({}), &[])),
		tool(
			"get_shop",
			"Get details for a specific shop by ID.",
			object(json!({ "shop_id": string("Shop identifier.") }), &["shop_id"]),
		),
		tool(
			"list_products",
			"List products in the current shop. Supports pagination.",
			object(paged(), &[]),
		),
		tool(
			"get_product",
			"Get detailed product info including mockup image URLs.",
			object(with_shop(json!({ "product_id": string("Product identifier.") })), &[
				"product_id",
			]),
		),
		tool(
			"create_product",
			"Create a new product. Requires title, blueprint_id, print_provider_id, variants, and print_areas.",
			object(with_shop(json!({ "data": data("Product payload.") })), &["data"]),
		),
		tool(
			"update_product",
			"Update an existing product's properties.",
			object(
				with_shop(json!({
					"product_id": string("Product identifier."),
					"data": data("Fields to update."),
				})),
				&["product_id", "data"],
			),
		),
		tool(
			"delete_product",
			"Delete a product from the shop.",
			object(with_shop(json!({ "product_id": string("Product identifier.") })), &[
				"product_id",
			]),
		),
		tool(
			"publish_product",
			"Publish a product to sales channels. Data should specify which fields to publish (title, description, images, variants, tags).",
			object(
				with_shop(json!({
					"product_id": string("Product identifier."),
					"data": data("Fields to publish."),
				})),
				&["product_id", "data"],
			),
		),
		tool(
			"list_blueprints",
			"List all available product blueprints (templates) from Printify catalog.",
			object(json!({}), &[]),
		),
		tool(
			"get_blueprint",
			"Get details for a specific blueprint including available images and description.",
			object(json!({ "blueprint_id": integer("Blueprint identifier.") }), &["blueprint_id"]),
		),
		tool(
			"get_print_providers",
			"List print providers available for a specific blueprint.",
			object(json!({ "blueprint_id": integer("Blueprint identifier.") }), &["blueprint_id"]),
		),
		tool(
			"get_variants",
			"List variants (sizes, colors) for a blueprint and print provider combination.",
			object(
				json!({
					"blueprint_id": integer("Blueprint identifier."),
					"provider_id": integer("Print provider identifier."),
				}),
				&["blueprint_id", "provider_id"],
			),
		),
		tool(
			"upload_image",
			"Upload an image to Printify. Provide either a URL or base64-encoded contents.",
			object(
				json!({
					"file_name": string("File name stored in the media library."),
					"url": string("Public image URL."),
					"contents": string("Base64-encoded image contents."),
				}),
				&["file_name"],
			),
		),
		tool(
			"list_orders",
			"List orders in the current shop. Supports pagination.",
			object(paged(), &[]),
		),
		tool(
			"get_order",
			"Get detailed order information including line items and shipping status.",
			object(with_shop(json!({ "order_id": string("Order identifier.") })), &["order_id"]),
		),
		tool(
			"submit_order",
			"Send an order to production. This action cannot be undone.",
			object(with_shop(json!({ "order_id": string("Order identifier.") })), &["order_id"]),
		),
	]
}

#[derive(Debug, Deserialize)]
struct ShopArgs {
	shop_id: String,
}

#[derive(Debug, Deserialize)]
struct PageArgs {
	#[serde(default)]
	shop_id: Option<String>,
	#[serde(flatten)]
	page: Page,
}

#[derive(Debug, Deserialize)]
struct ProductArgs {
	#[serde(default)]
	shop_id: Option<String>,
	product_id: String,
}

#[derive(Debug, Deserialize)]
struct DataArgs {
	#[serde(default)]
	shop_id: Option<String>,
	data: Value,
}

#[derive(Debug, Deserialize)]
struct ProductDataArgs {
	#[serde(default)]
	shop_id: Option<String>,
	product_id: String,
	data: Value,
}

#[derive(Debug, Deserialize)]
struct BlueprintArgs {
	blueprint_id: u64,
}

#[derive(Debug, Deserialize)]
struct VariantArgs {
	blueprint_id: u64,
	provider_id: u64,
}

#[derive(Debug, Deserialize)]
struct ImageArgs {
	file_name: String,
	#[serde(default)]
	url: Option<String>,
	#[serde(default)]
	contents: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OrderArgs {
	#[serde(default)]
	shop_id: Option<String>,
	order_id: String,
}

// Missing arguments decode like an empty object.
fn decode<T>(arguments: Value) -> Result<T>
where
	T: DeserializeOwned,
{
	let arguments = if arguments.is_null() { json!({}) } else { arguments };

	serde_path_to_error::deserialize(arguments)
		.map_err(|e| Error::input_invalid(format!("Invalid arguments: {e}.")))
}

fn tool(name: &'static str, description: &'static str, input_schema: Value) -> ToolDefinition {
	ToolDefinition { name, description, input_schema }
}

fn object(properties: Value, required: &[&str]) -> Value {
	json!({ "type": "object", "properties": properties, "required": required })
}

fn with_shop(mut properties: Value) -> Value {
	if let Some(map) = properties.as_object_mut() {
		map.insert("shop_id".into(), string("Shop identifier; defaults to PRINTIFY_SHOP_ID."));
	}

	properties
}

fn paged() -> Value {
	with_shop(json!({
		"page": { "type": "integer", "minimum": 1, "default": 1 },
		"limit": { "type": "integer", "minimum": 1, "default": 10 },
	}))
}

fn string(description: &str) -> Value {
	json!({ "type": "string", "description": description })
}

fn integer(description: &str) -> Value {
	json!({ "type": "integer", "description": description })
}

fn data(description: &str) -> Value {
	json!({ "type": "object", "description": description })
}
