//! HTTP and stdio front ends for the tool registry.
//!
//! The HTTP router always serves `GET /health` without authentication. The JSON-RPC tool
//! endpoint at `POST /mcp` is guarded according to [`AuthMode`]:
//!
//! - [`AuthMode::OAuth`] mounts the authorization endpoints and accepts issued tokens plus the
//!   optional static bearer.
//! - [`AuthMode::StaticOnly`] accepts only the static bearer.
//! - [`AuthMode::Open`] leaves the tool endpoint unauthenticated.

pub mod auth;
pub mod oauth;
pub mod rpc;

// crates.io
use axum::{
	Json, Router, middleware,
	routing::{get, post},
};
use tokio::net::TcpListener;
// self
use crate::{
	_prelude::*,
	authority::TokenAuthority,
	store::MemoryStore,
	tools::ToolRegistry,
};

/// How inbound tool calls are authenticated.
#[derive(Clone, Debug)]
pub enum AuthMode {
	/// Authorization endpoints mounted under `issuer`; issued tokens and the static bearer pass.
	OAuth {
		/// Authority backing the endpoints and the bearer check.
		authority: TokenAuthority,
		/// Public issuer URL.
		issuer: Url,
	},
	/// Only the static bearer passes.
	StaticOnly(TokenAuthority),
	/// No authentication.
	Open,
}
impl AuthMode {
	/// Picks the mode from the configured issuer and static bearer secret.
	pub fn from_settings(issuer: Option<Url>, static_token: Option<&str>) -> Self {
		let static_token = static_token.filter(|token| !token.is_empty());
		let authority = || {
			let authority = TokenAuthority::new(Arc::new(MemoryStore::default()));

			match static_token {
				Some(token) => authority.with_static_secret(token),
				None => authority,
			}
		};

		match (issuer, static_token) {
			(Some(issuer), _) => Self::OAuth { authority: authority(), issuer },
			(None, Some(_)) => Self::StaticOnly(authority()),
			(None, None) => Self::Open,
		}
	}

	/// Authority guarding the tool endpoint, if any.
	pub fn authority(&self) -> Option<&TokenAuthority> {
		match self {
			Self::OAuth { authority, .. } | Self::StaticOnly(authority) => Some(authority),
			Self::Open => None,
		}
	}

	/// Logs which mode is active.
	pub fn announce(&self) {
		match self {
			Self::OAuth { issuer, authority } => tracing::info!(
				%issuer,
				static_fallback = authority.has_static_secret(),
				"OAuth enabled."
			),
			Self::StaticOnly(_) => tracing::info!("OAuth disabled; static bearer token required."),
			Self::Open => tracing::warn!(
				"OAuth disabled and no static bearer token set; the tool endpoint is unauthenticated."
			),
		}
	}
}

/// Builds the HTTP router.
pub fn router(tools: ToolRegistry, mode: &AuthMode) -> Router {
	let mut mcp = Router::new()
		.route("/mcp", post(rpc::handle_http))
		.with_state(rpc::Dispatcher::new(tools));

	if let Some(authority) = mode.authority() {
		mcp = mcp.route_layer(middleware::from_fn_with_state(authority.clone(), auth::require_bearer));
	}

	let mut router = Router::new().route("/health", get(health)).merge(mcp);

	if let AuthMode::OAuth { authority, issuer } = mode {
		router = router.merge(oauth::routes(authority.clone(), issuer.clone()));
	}

	router
}

/// Serves `router` on `listener` until Ctrl-C.
pub async fn serve(listener: TcpListener, router: Router) -> Result<()> {
	tracing::info!(addr = %listener.local_addr()?, "Printify gateway starting.");
	axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;
	tracing::info!("Printify gateway stopped.");

	Ok(())
}

async fn health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}

async fn shutdown_signal() {
	if let Err(e) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %e, "Failed to listen for shutdown signal.");
	}
}
