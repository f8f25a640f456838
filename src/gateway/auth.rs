//! Bearer authentication for the tool endpoint.

// crates.io
use axum::{
	Json,
	extract::{Request, State},
	http::{HeaderMap, HeaderValue, StatusCode, header},
	middleware::Next,
	response::{IntoResponse, Response},
};
// self
use crate::{_prelude::*, authority::TokenAuthority};

/// Middleware admitting requests whose bearer the authority recognizes.
///
/// On success the verified [`AccessToken`](crate::auth::AccessToken) is inserted into the
/// request extensions. Every failure answers 401 with the same body.
pub async fn require_bearer(
	State(authority): State<TokenAuthority>,
	mut request: Request,
	next: Next,
) -> Response {
	let Some(token) = bearer_token(request.headers()) else { return unauthorized() };

	match authority.load_access_token(&token).await {
		Some(record) => {
			request.extensions_mut().insert(record);

			next.run(request).await
		},
		None => unauthorized(),
	}
}

/// Extracts the credential from an `Authorization: Bearer <token>` header.
///
/// The scheme must be spelled exactly `Bearer` followed by one space.
pub fn bearer_token(headers: &HeaderMap) -> Option<String> {
	let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
	let token = value.strip_prefix("Bearer ")?;

	if token.is_empty() {
		return None;
	}

	Some(token.to_owned())
}

fn unauthorized() -> Response {
	let mut response =
		(StatusCode::UNAUTHORIZED, Json(json!({ "error": "Unauthorized" }))).into_response();

	response.headers_mut().insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));

	response
}
