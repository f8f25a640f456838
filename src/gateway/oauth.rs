//! Authorization-code endpoints backed by the [`TokenAuthority`].
//!
//! Clients are public (`token_endpoint_auth_method = none`) and identify themselves with
//! `client_id` alone. `/authorize` redirects immediately without a consent step.

// crates.io
use axum::{
	Form, Json, Router,
	extract::{
		Query, State,
		rejection::{FormRejection, JsonRejection},
	},
	http::{HeaderValue, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, post},
};
// self
use crate::{
	_prelude::*,
	auth::{ClientInfo, ClientRegistration, RevocableToken, ScopeSet},
	authority::{AuthorizationParams, TokenAuthority, TokenResponse},
};

#[derive(Clone, Debug)]
struct OAuthState {
	authority: TokenAuthority,
	issuer: Url,
}
impl OAuthState {
	fn issuer(&self) -> &str {
		self.issuer.as_str().trim_end_matches('/')
	}

	fn endpoint(&self, path: &str) -> String {
		format!("{}/{path}", self.issuer())
	}
}

#[derive(Debug, Deserialize)]
struct AuthorizeQuery {
	response_type: Option<String>,
	client_id: Option<String>,
	redirect_uri: Option<String>,
	state: Option<String>,
	scope: Option<String>,
	code_challenge: Option<String>,
	code_challenge_method: Option<String>,
	resource: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenForm {
	grant_type: Option<String>,
	client_id: Option<String>,
	code: Option<String>,
	redirect_uri: Option<String>,
	refresh_token: Option<String>,
	scope: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RevokeForm {
	token: Option<String>,
	token_type_hint: Option<String>,
	client_id: Option<String>,
}

/// Routes for discovery, registration, authorization, token, and revocation.
pub fn routes(authority: TokenAuthority, issuer: Url) -> Router {
	Router::new()
		.route("/.well-known/oauth-authorization-server", get(authorization_server_metadata))
		.route("/.well-known/oauth-protected-resource", get(protected_resource_metadata))
		.route("/register", post(register))
		.route("/authorize", get(authorize))
		.route("/token", post(token))
		.route("/revoke", post(revoke))
		.with_state(OAuthState { authority, issuer })
}

async fn authorization_server_metadata(State(state): State<OAuthState>) -> Json<Value> {
	Json(json!({
		"issuer": state.issuer(),
		"authorization_endpoint": state.endpoint("authorize"),
		"token_endpoint": state.endpoint("token"),
		"registration_endpoint": state.endpoint("register"),
		"revocation_endpoint": state.endpoint("revoke"),
		"response_types_supported": ["code"],
		"grant_types_supported": ["authorization_code", "refresh_token"],
		"token_endpoint_auth_methods_supported": ["none"],
		"revocation_endpoint_auth_methods_supported": ["none"],
		"code_challenge_methods_supported": ["S256"],
	}))
}

async fn protected_resource_metadata(State(state): State<OAuthState>) -> Json<Value> {
	Json(json!({
		"resource": state.endpoint("mcp"),
		"authorization_servers": [state.issuer()],
		"bearer_methods_supported": ["header"],
	}))
}

async fn register(
	State(state): State<OAuthState>,
	payload: Result<Json<ClientRegistration>, JsonRejection>,
) -> Response {
	let mut registration = match payload {
		Ok(Json(registration)) => registration,
		Err(e) => return oauth_error("invalid_client_metadata", Some(&e.body_text())),
	};

	// Identifiers are always server-assigned here; a requested one would replace another client.
	registration.client_id = None;

	if registration.redirect_uris.is_empty() {
		return oauth_error("invalid_redirect_uri", Some("At least one redirect URI is required."));
	}

	let client = state.authority.register_client(registration).await;

	(StatusCode::CREATED, Json(client)).into_response()
}

async fn authorize(
	State(state): State<OAuthState>,
	Query(query): Query<AuthorizeQuery>,
) -> Response {
	let Some(client) = find_client(&state.authority, query.client_id.as_deref()).await else {
		return oauth_error("invalid_client", Some("Unknown client."));
	};
	let requested = match query.redirect_uri.as_deref().map(Url::parse).transpose() {
		Ok(requested) => requested,
		Err(_) => return oauth_error("invalid_request", Some("Malformed redirect_uri.")),
	};
	let Some(redirect_uri) = client.validate_redirect_uri(requested.as_ref()) else {
		return oauth_error("invalid_request", Some("Unregistered redirect_uri."));
	};

	if query.response_type.as_deref() != Some("code") {
		return oauth_error("unsupported_response_type", None);
	}
	if query.code_challenge_method.as_deref().is_some_and(|method| method != "S256") {
		return oauth_error("invalid_request", Some("Only S256 code challenges are supported."));
	}

	let Some(code_challenge) = query.code_challenge.filter(|c| !c.is_empty()) else {
		return oauth_error("invalid_request", Some("code_challenge is required."));
	};
	let scopes = match query.scope.as_deref().map(ScopeSet::from_str).transpose() {
		Ok(scopes) => scopes.unwrap_or_default(),
		Err(e) => return oauth_error("invalid_scope", Some(&e.to_string())),
	};
	let mut params = AuthorizationParams::new(redirect_uri, scopes, code_challenge)
		.with_redirect_uri_provided_explicitly(requested.is_some());

	if let Some(value) = query.state {
		params = params.with_state(value);
	}
	if let Some(resource) = query.resource {
		params = params.with_resource(resource);
	}

	let target = state.authority.authorize(&client, params).await;

	match HeaderValue::from_str(target.as_str()) {
		Ok(location) =>
			(StatusCode::FOUND, [(header::LOCATION, location), no_store()]).into_response(),
		Err(_) => oauth_error("invalid_request", Some("Redirect target is not a valid header.")),
	}
}

async fn token(
	State(state): State<OAuthState>,
	form: Result<Form<TokenForm>, FormRejection>,
) -> Response {
	let Ok(Form(form)) = form else {
		return oauth_error("invalid_request", Some("Malformed token request."));
	};
	let Some(client) = find_client(&state.authority, form.client_id.as_deref()).await else {
		return oauth_error("invalid_client", None);
	};

	match form.grant_type.as_deref() {
		Some("authorization_code") => exchange_code(&state.authority, &client, form).await,
		Some("refresh_token") => exchange_refresh(&state.authority, &client, form).await,
		Some(_) => oauth_error("unsupported_grant_type", None),
		None => oauth_error("invalid_request", Some("grant_type is required.")),
	}
}

async fn exchange_code(
	authority: &TokenAuthority,
	client: &ClientInfo,
	form: TokenForm,
) -> Response {
	let Some(code) = form.code else {
		return oauth_error("invalid_request", Some("code is required."));
	};
	let Some(record) = authority.load_authorization_code(client, &code).await else {
		return oauth_error("invalid_grant", Some("Authorization code is invalid or expired."));
	};

	// A redirect URI named at authorization must be repeated verbatim.
	if record.redirect_uri_provided_explicitly
		&& form.redirect_uri.as_deref().and_then(|uri| Url::parse(uri).ok()).as_ref()
			!= Some(&record.redirect_uri)
	{
		return oauth_error("invalid_request", Some("redirect_uri does not match."));
	}

	match authority.exchange_authorization_code(client, &record).await {
		Some(response) => token_response(response),
		None => oauth_error("invalid_grant", Some("Authorization code is invalid or expired.")),
	}
}

async fn exchange_refresh(
	authority: &TokenAuthority,
	client: &ClientInfo,
	form: TokenForm,
) -> Response {
	let Some(refresh_token) = form.refresh_token else {
		return oauth_error("invalid_request", Some("refresh_token is required."));
	};
	let scopes = match form.scope.as_deref().map(ScopeSet::from_str).transpose() {
		Ok(scopes) => scopes.unwrap_or_default(),
		Err(e) => return oauth_error("invalid_scope", Some(&e.to_string())),
	};
	let Some(record) = authority.load_refresh_token(client, &refresh_token).await else {
		return oauth_error("invalid_grant", Some("Refresh token is invalid or expired."));
	};

	match authority.exchange_refresh_token(client, &record, scopes).await {
		Some(response) => token_response(response),
		None => oauth_error("invalid_grant", Some("Refresh token is invalid or expired.")),
	}
}

// Revocation always answers 200 so callers cannot probe which tokens exist.
async fn revoke(
	State(state): State<OAuthState>,
	form: Result<Form<RevokeForm>, FormRejection>,
) -> Response {
	let Ok(Form(form)) = form else { return (StatusCode::OK, Json(json!({}))).into_response() };

	if let Some(token) = form.token.as_deref() {
		let client = find_client(&state.authority, form.client_id.as_deref()).await;
		let refresh_first = form.token_type_hint.as_deref() == Some("refresh_token");

		if let Some(target) =
			resolve_revocable(&state.authority, client.as_ref(), token, refresh_first).await
		{
			state.authority.revoke_token(&target).await;
		}
	}

	(StatusCode::OK, Json(json!({}))).into_response()
}

async fn resolve_revocable(
	authority: &TokenAuthority,
	client: Option<&ClientInfo>,
	token: &str,
	refresh_first: bool,
) -> Option<RevocableToken> {
	if refresh_first {
		match find_refresh(authority, client, token).await {
			Some(found) => Some(found),
			None => find_access(authority, client, token).await,
		}
	} else {
		match find_access(authority, client, token).await {
			Some(found) => Some(found),
			None => find_refresh(authority, client, token).await,
		}
	}
}

// Refresh tokens are client-scoped, so an unidentified caller cannot revoke one.
async fn find_refresh(
	authority: &TokenAuthority,
	client: Option<&ClientInfo>,
	token: &str,
) -> Option<RevocableToken> {
	authority.load_refresh_token(client?, token).await.map(RevocableToken::Refresh)
}

async fn find_access(
	authority: &TokenAuthority,
	client: Option<&ClientInfo>,
	token: &str,
) -> Option<RevocableToken> {
	authority
		.load_access_token(token)
		.await
		.filter(|record| !record.is_static())
		.filter(|record| client.is_none_or(|client| client.client_id == record.client_id))
		.map(RevocableToken::Access)
}

async fn find_client(authority: &TokenAuthority, client_id: Option<&str>) -> Option<ClientInfo> {
	authority.get_client(client_id.filter(|id| !id.is_empty())?).await
}

fn token_response(response: TokenResponse) -> Response {
	(StatusCode::OK, [no_store()], Json(response)).into_response()
}

fn oauth_error(code: &str, description: Option<&str>) -> Response {
	let body = match description {
		Some(description) => json!({ "error": code, "error_description": description }),
		None => json!({ "error": code }),
	};

	(StatusCode::BAD_REQUEST, Json(body)).into_response()
}

fn no_store() -> (header::HeaderName, HeaderValue) {
	(header::CACHE_CONTROL, HeaderValue::from_static("no-store"))
}
