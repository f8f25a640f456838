// crates.io
use axum::{
	Router,
	body::Body,
	http::{Request, Response, StatusCode, header},
};
use http_body_util::BodyExt;
use tower::ServiceExt;
// self
use printify_gateway::{
	_preludet::*,
	gateway::{self, AuthMode},
	tools::ToolRegistry,
	url::form_urlencoded,
};

const ISSUER: &str = "http://gw.test";

fn oauth_router(transport: ScriptedTransport) -> Router {
	let (authority, _) = build_test_authority();
	let (client, _) = build_scripted_client(transport, Some("42"));
	let mode = AuthMode::OAuth { authority, issuer: url(ISSUER) };

	gateway::router(ToolRegistry::new(client), &mode)
}

fn rpc(method: &str, params: Value, bearer: Option<&str>) -> Request<Body> {
	let mut builder = Request::builder()
		.method("POST")
		.uri("/mcp")
		.header(header::CONTENT_TYPE, "application/json");

	if let Some(token) = bearer {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}

	let payload = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": params });

	builder.body(Body::from(payload.to_string())).expect("Request should build.")
}

fn form(uri: &str, pairs: &[(&str, &str)]) -> Request<Body> {
	let body = form_urlencoded::Serializer::new(String::new()).extend_pairs(pairs).finish();

	Request::builder()
		.method("POST")
		.uri(uri)
		.header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
		.body(Body::from(body))
		.expect("Request should build.")
}

fn register(metadata: Value) -> Request<Body> {
	Request::builder()
		.method("POST")
		.uri("/register")
		.header(header::CONTENT_TYPE, "application/json")
		.body(Body::from(metadata.to_string()))
		.expect("Request should build.")
}

fn get(uri: &str) -> Request<Body> {
	Request::builder().uri(uri).body(Body::empty()).expect("Request should build.")
}

async fn json_body(response: Response<Body>) -> Value {
	let bytes = response.into_body().collect().await.expect("Body should collect.").to_bytes();

	serde_json::from_slice(&bytes).expect("Body should be JSON.")
}

async fn send(router: &Router, request: Request<Body>) -> Response<Body> {
	router.clone().oneshot(request).await.expect("Router is infallible.")
}

#[tokio::test]
async fn health_is_public() {
	let router = oauth_router(ScriptedTransport::default());
	let response = send(&router, get("/health")).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({ "status": "ok" }));
}

#[tokio::test]
async fn tool_endpoint_rejects_missing_or_unknown_bearers() {
	let router = oauth_router(ScriptedTransport::default());

	for bearer in [None, Some("nope")] {
		let response = send(&router, rpc("tools/list", json!({}), bearer)).await;

		assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
		assert_eq!(
			response.headers().get(header::WWW_AUTHENTICATE).map(|v| v.as_bytes()),
			Some(&b"Bearer"[..])
		);
		assert_eq!(json_body(response).await, json!({ "error": "Unauthorized" }));
	}
}

#[tokio::test]
async fn bearer_scheme_is_case_sensitive() {
	let router = oauth_router(ScriptedTransport::default());
	let request = Request::builder()
		.method("POST")
		.uri("/mcp")
		.header(header::AUTHORIZATION, format!("bearer {TEST_STATIC_SECRET}"))
		.body(Body::from(json!({ "jsonrpc": "2.0", "id": 1, "method": "ping" }).to_string()))
		.expect("Request should build.");

	assert_eq!(send(&router, request).await.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn static_bearer_reaches_tools() {
	let router = oauth_router(ScriptedTransport::default());
	let response = send(&router, rpc("tools/list", json!({}), Some(TEST_STATIC_SECRET))).await;

	assert_eq!(response.status(), StatusCode::OK);

	let body = json_body(response).await;
	let names = body["result"]["tools"]
		.as_array()
		.expect("Tool list should be an array.")
		.iter()
		.filter_map(|tool| tool["name"].as_str())
		.collect::<Vec<_>>();

	assert_eq!(names.len(), 16);
	assert!(names.contains(&"list_shops"));
	assert!(names.contains(&"submit_order"));
}

#[tokio::test]
async fn open_mode_skips_authentication() {
	let (client, _) = build_scripted_client(ScriptedTransport::default(), None);
	let router = gateway::router(ToolRegistry::new(client), &AuthMode::Open);
	let response = send(&router, rpc("ping", json!({}), None)).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(
		send(&router, get("/.well-known/oauth-authorization-server")).await.status(),
		StatusCode::NOT_FOUND
	);
}

#[tokio::test]
async fn discovery_documents_name_endpoints() {
	let router = oauth_router(ScriptedTransport::default());
	let server = json_body(send(&router, get("/.well-known/oauth-authorization-server")).await).await;

	assert_eq!(server["issuer"], ISSUER);
	assert_eq!(server["token_endpoint"], "http://gw.test/token");
	assert_eq!(server["code_challenge_methods_supported"], json!(["S256"]));

	let resource = json_body(send(&router, get("/.well-known/oauth-protected-resource")).await).await;

	assert_eq!(resource["resource"], "http://gw.test/mcp");
	assert_eq!(resource["authorization_servers"], json!([ISSUER]));
}

#[tokio::test]
async fn authorization_code_flow_unlocks_tools() {
	let router = oauth_router(ScriptedTransport::new([json_response(
		200,
		json!([{ "id": 42, "title": "Main" }]),
		&[],
	)]));
	let registered =
		send(&router, register(json!({ "redirect_uris": [TEST_REDIRECT_URI] }))).await;

	assert_eq!(registered.status(), StatusCode::CREATED);

	let client = json_body(registered).await;
	let client_id = client["client_id"].as_str().expect("Client id should be issued.").to_owned();
	let query = form_urlencoded::Serializer::new(String::new())
		.extend_pairs([
			("response_type", "code"),
			("client_id", client_id.as_str()),
			("redirect_uri", TEST_REDIRECT_URI),
			("code_challenge", "challenge123"),
			("code_challenge_method", "S256"),
			("state", "xyz"),
			("scope", "read"),
		])
		.finish();
	let authorized = send(&router, get(&format!("/authorize?{query}"))).await;

	assert_eq!(authorized.status(), StatusCode::FOUND);

	let location = authorized
		.headers()
		.get(header::LOCATION)
		.and_then(|value| value.to_str().ok())
		.map(url)
		.expect("Redirect should carry a location.");

	assert!(location.query_pairs().any(|(k, v)| k == "state" && v == "xyz"));

	let code = code_from_redirect(&location);
	let exchanged = send(
		&router,
		form("/token", &[
			("grant_type", "authorization_code"),
			("client_id", client_id.as_str()),
			("code", code.as_str()),
			("redirect_uri", TEST_REDIRECT_URI),
		]),
	)
	.await;

	assert_eq!(exchanged.status(), StatusCode::OK);
	assert_eq!(
		exchanged.headers().get(header::CACHE_CONTROL).map(|v| v.as_bytes()),
		Some(&b"no-store"[..])
	);

	let tokens = json_body(exchanged).await;
	let access = tokens["access_token"].as_str().expect("Access token should be issued.");

	assert_eq!(tokens["token_type"], "Bearer");
	assert_eq!(tokens["scope"], "read");

	let replay = send(
		&router,
		form("/token", &[
			("grant_type", "authorization_code"),
			("client_id", client_id.as_str()),
			("code", code.as_str()),
			("redirect_uri", TEST_REDIRECT_URI),
		]),
	)
	.await;

	assert_eq!(replay.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(replay).await["error"], "invalid_grant");

	let called = send(
		&router,
		rpc(
			"tools/call",
			json!({ "name": "get_shop", "arguments": { "shop_id": "42" } }),
			Some(access),
		),
	)
	.await;

	assert_eq!(called.status(), StatusCode::OK);

	let result = json_body(called).await;
	let text = result["result"]["content"][0]["text"].as_str().expect("Content should be text.");

	assert_eq!(result["result"]["isError"], false);
	assert_eq!(
		serde_json::from_str::<Value>(text).expect("Text should be JSON."),
		json!({ "id": 42, "title": "Main" })
	);

	let revoked = send(&router, form("/revoke", &[("token", access)])).await;

	assert_eq!(revoked.status(), StatusCode::OK);
	assert_eq!(
		send(&router, rpc("ping", json!({}), Some(access))).await.status(),
		StatusCode::UNAUTHORIZED
	);
}

#[tokio::test]
async fn authorize_rejects_unknown_clients_and_plain_challenges() {
	let router = oauth_router(ScriptedTransport::default());
	let unknown = send(&router, get("/authorize?response_type=code&client_id=ghost")).await;

	assert_eq!(unknown.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(unknown).await["error"], "invalid_client");

	let registered =
		send(&router, register(json!({ "redirect_uris": [TEST_REDIRECT_URI] }))).await;
	let client_id = json_body(registered).await["client_id"].as_str().map(str::to_owned);
	let query = form_urlencoded::Serializer::new(String::new())
		.extend_pairs([
			("response_type", "code"),
			("client_id", client_id.as_deref().unwrap_or_default()),
			("code_challenge", "abc"),
			("code_challenge_method", "plain"),
		])
		.finish();
	let plain = send(&router, get(&format!("/authorize?{query}"))).await;

	assert_eq!(plain.status(), StatusCode::BAD_REQUEST);
	assert_eq!(json_body(plain).await["error"], "invalid_request");
}

#[tokio::test]
async fn revoke_always_succeeds() {
	let router = oauth_router(ScriptedTransport::default());
	let response = send(&router, form("/revoke", &[("token", "never-issued")])).await;

	assert_eq!(response.status(), StatusCode::OK);
	assert_eq!(json_body(response).await, json!({}));
}

#[tokio::test]
async fn registration_cannot_claim_an_existing_client_id() {
	let (authority, _) = build_test_authority();
	let existing = register_test_client(&authority).await;
	let (client, _) = build_scripted_client(ScriptedTransport::default(), None);
	let mode = AuthMode::OAuth { authority: authority.clone(), issuer: url(ISSUER) };
	let router = gateway::router(ToolRegistry::new(client), &mode);
	let response = send(
		&router,
		register(json!({
			"client_id": TEST_CLIENT_ID,
			"redirect_uris": ["https://evil.example/cb"],
		})),
	)
	.await;

	assert_eq!(response.status(), StatusCode::CREATED);

	let issued = json_body(response).await;

	assert_ne!(issued["client_id"], TEST_CLIENT_ID);
	assert_eq!(
		authority.get_client(TEST_CLIENT_ID).await,
		Some(existing),
		"A registration request must not replace another client's metadata."
	);
}
