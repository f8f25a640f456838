//! JSON-RPC 2.0 tool protocol over HTTP and stdio.

// crates.io
use axum::{
	Json,
	body::Bytes,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::Deserializer;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
// self
use crate::{_prelude::*, tools::ToolRegistry};

/// Protocol revision answered when the client does not name one.
pub const PROTOCOL_VERSION: &str = "2025-06-18";
/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "Printify MCP Server";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

/// Incoming JSON-RPC message. A missing `id` marks a notification.
#[derive(Clone, Debug, Deserialize)]
pub struct RpcRequest {
	/// Request identifier echoed in the response; `Some(Value::Null)` for an explicit `null`.
	#[serde(default, deserialize_with = "present")]
	pub id: Option<Value>,
	/// Method name.
	pub method: String,
	/// Method parameters.
	#[serde(default)]
	pub params: Value,
}

#[derive(Debug, Deserialize)]
struct CallParams {
	name: String,
	#[serde(default)]
	arguments: Value,
}

/// Routes JSON-RPC methods to the tool registry.
#[derive(Clone, Debug)]
pub struct Dispatcher {
	tools: ToolRegistry,
}
impl Dispatcher {
	/// Creates a dispatcher over `tools`.
	pub fn new(tools: ToolRegistry) -> Self {
		Self { tools }
	}

	/// Handles one message, returning the response or `None` for notifications.
	pub async fn handle(&self, request: RpcRequest) -> Option<Value> {
		let id = request.id?;
		let outcome = match request.method.as_str() {
			"initialize" => Ok(initialize_result(&request.params)),
			"ping" => Ok(json!({})),
			"tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
			"tools/call" => self.call_tool(request.params).await,
			method => Err((METHOD_NOT_FOUND, format!("Method not found: {method}."))),
		};

		Some(match outcome {
			Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
			Err((code, message)) => error_response(id, code, &message),
		})
	}

	/// Parses and handles one raw message.
	pub async fn handle_raw(&self, raw: &[u8]) -> Option<Value> {
		let message = match serde_json::from_slice::<Value>(raw) {
			Ok(message) => message,
			Err(e) => return Some(error_response(Value::Null, PARSE_ERROR, &e.to_string())),
		};
		let id = message.get("id").cloned().unwrap_or(Value::Null);

		match serde_json::from_value::<RpcRequest>(message) {
			Ok(request) => self.handle(request).await,
			Err(e) => Some(error_response(id, INVALID_REQUEST, &e.to_string())),
		}
	}

	async fn call_tool(&self, params: Value) -> Result<Value, (i64, String)> {
		let params = serde_json::from_value::<CallParams>(params)
			.map_err(|e| (INVALID_PARAMS, format!("Invalid tools/call params: {e}.")))?;
		let output = self.tools.call(&params.name, params.arguments).await;
		let text = match output.value {
			Value::String(text) => text,
			value => value.to_string(),
		};

		Ok(json!({
			"content": [{ "type": "text", "text": text }],
			"isError": output.is_error,
		}))
	}
}

/// `POST /mcp` handler.
pub async fn handle_http(State(dispatcher): State<Dispatcher>, body: Bytes) -> Response {
	match dispatcher.handle_raw(&body).await {
		Some(response) if response["error"]["code"] == PARSE_ERROR =>
			(StatusCode::BAD_REQUEST, Json(response)).into_response(),
		Some(response) => (StatusCode::OK, Json(response)).into_response(),
		None => StatusCode::ACCEPTED.into_response(),
	}
}

/// Serves newline-delimited JSON-RPC on stdin/stdout until stdin closes.
pub async fn serve_stdio(dispatcher: Dispatcher) -> Result<()> {
	let mut lines = BufReader::new(tokio::io::stdin()).lines();
	let mut stdout = tokio::io::stdout();

	tracing::info!("Printify gateway serving on stdio.");

	while let Some(line) = lines.next_line().await? {
		if line.trim().is_empty() {
			continue;
		}

		if let Some(response) = dispatcher.handle_raw(line.as_bytes()).await {
			let mut frame = response.to_string();

			frame.push('\n');
			stdout.write_all(frame.as_bytes()).await?;
			stdout.flush().await?;
		}
	}

	tracing::info!("Stdin closed; stopping.");

	Ok(())
}

// Runs only when the field exists, so an explicit `null` is still a request.
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
	D: Deserializer<'de>,
{
	Value::deserialize(deserializer).map(Some)
}

fn initialize_result(params: &Value) -> Value {
	let version = params.get("protocolVersion").and_then(Value::as_str).unwrap_or(PROTOCOL_VERSION);

	json!({
		"protocolVersion": version,
		"capabilities": { "tools": { "listChanged": false } },
		"serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
	})
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
	json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::_preludet::{ScriptedTransport, build_scripted_client, json_response};

	fn dispatcher(transport: ScriptedTransport) -> Dispatcher {
		let (client, _) = build_scripted_client(transport, Some("1"));

		Dispatcher::new(ToolRegistry::new(client))
	}

	#[tokio::test]
	async fn notifications_have_no_response() {
		let dispatcher = dispatcher(ScriptedTransport::default());

		assert!(
			dispatcher
				.handle_raw(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
				.await
				.is_none()
		);
	}

	#[tokio::test]
	async fn null_ids_are_requests_not_notifications() {
		let dispatcher = dispatcher(ScriptedTransport::default());
		let response = dispatcher
			.handle_raw(br#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
			.await
			.expect("A null id still expects a response.");

		assert_eq!(response["id"], Value::Null);
		assert_eq!(response["result"], json!({}));
	}

	#[tokio::test]
	async fn unknown_methods_are_rejected() {
		let dispatcher = dispatcher(ScriptedTransport::default());
		let response = dispatcher
			.handle_raw(br#"{"jsonrpc":"2.0","id":7,"method":"resources/list"}"#)
			.await
			.expect("Requests with an id should be answered.");

		assert_eq!(response["id"], 7);
		assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
	}

	#[tokio::test]
	async fn parse_errors_are_reported() {
		let dispatcher = dispatcher(ScriptedTransport::default());
		let response = dispatcher.handle_raw(b"{not json").await.expect("Parse errors answer.");

		assert_eq!(response["error"]["code"], PARSE_ERROR);
		assert_eq!(response["id"], Value::Null);
	}

	#[tokio::test]
	async fn initialize_echoes_requested_version() {
		let dispatcher = dispatcher(ScriptedTransport::default());
		let response = dispatcher
			.handle_raw(
				br#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2025-03-26"}}"#,
			)
			.await
			.expect("Initialize should answer.");

		assert_eq!(response["result"]["protocolVersion"], "2025-03-26");
		assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
	}

	#[tokio::test]
	async fn tool_results_are_wrapped_as_text_content() {
		let dispatcher = dispatcher(ScriptedTransport::new([json_response(
			200,
			json!([{"id": 1, "title": "Main"}]),
			&[],
		)]));
		let response = dispatcher
			.handle_raw(br#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"get_shop","arguments":{"shop_id":"2"}}}"#)
			.await
			.expect("Tool calls should answer.");

		assert_eq!(response["result"]["isError"], false);
		assert_eq!(response["result"]["content"][0]["text"], "Shop 2 not found");
	}
}
