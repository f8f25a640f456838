//! In-memory OAuth-style token authority with a static bearer fallback.
//!
//! The authority issues authorization codes, exchanges them for access/refresh pairs, rotates
//! refresh tokens, verifies bearers, and revokes. All state lives in an injected [`TokenStore`].
//!
//! # Operator notice
//!
//! There is no consent step. [`TokenAuthority::authorize`] grants a code to any registered
//! client immediately, which only suits single-operator deployments. The PKCE `code_challenge`
//! is stored with the code but never compared against a `code_verifier`; verification is left
//! to whatever front end sits ahead of the authority.
//!
//! Every lookup answers with `Option`. Unknown, expired, and foreign-client credentials all
//! collapse into `None` so callers cannot probe which case applied.

// std
use std::borrow::Cow;
// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, ClientId, ClientInfo, ClientRegistration, RefreshToken,
		RevocableToken, ScopeSet, SecretDigest, TokenSecret,
	},
	obs::{self, Operation, Outcome},
	store::TokenStore,
};

/// Lifetime of an authorization code.
pub const AUTHORIZATION_CODE_TTL: Duration = Duration::minutes(10);
/// Lifetime of an access token.
pub const ACCESS_TOKEN_TTL: Duration = Duration::hours(1);
/// Lifetime of a refresh token.
pub const REFRESH_TOKEN_TTL: Duration = Duration::days(30);

/// Source of the current instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Current UTC instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall clock.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Validated authorization request.
#[derive(Clone, Debug)]
pub struct AuthorizationParams {
	/// Redirect URI the code is delivered to.
	pub redirect_uri: Url,
	/// Whether the client named the redirect URI explicitly.
	pub redirect_uri_provided_explicitly: bool,
	/// Requested scopes.
	pub scopes: ScopeSet,
	/// PKCE challenge, stored verbatim.
	pub code_challenge: String,
	/// Opaque state echoed back on the redirect.
	pub state: Option<String>,
	/// Resource indicator.
	pub resource: Option<String>,
}
impl AuthorizationParams {
	/// Creates parameters with an explicitly provided redirect URI.
	pub fn new(redirect_uri: Url, scopes: ScopeSet, code_challenge: impl Into<String>) -> Self {
		Self {
			redirect_uri,
			redirect_uri_provided_explicitly: true,
			scopes,
			code_challenge: code_challenge.into(),
			state: None,
			resource: None,
		}
	}

	/// Records whether the redirect URI came from the request or the registration.
	pub fn with_redirect_uri_provided_explicitly(mut self, explicit: bool) -> Self {
		self.redirect_uri_provided_explicitly = explicit;

		self
	}

	/// Sets the state echoed back on the redirect.
	pub fn with_state(mut self, state: impl Into<String>) -> Self {
		self.state = Some(state.into());

		self
	}

	/// Sets the resource indicator.
	pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
		self.resource = Some(resource.into());

		self
	}
}

/// Token endpoint response body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TokenResponse {
	/// Newly minted access token.
	pub access_token: TokenSecret,
	/// Always `Bearer`.
	pub token_type: Cow<'static, str>,
	/// Access token lifetime in seconds.
	pub expires_in: i64,
	/// Newly minted refresh token.
	pub refresh_token: TokenSecret,
	/// Space-joined scopes; omitted when empty.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub scope: Option<String>,
}

/// Issues, verifies, rotates, and revokes credentials for registered clients.
#[derive(Clone)]
pub struct TokenAuthority {
	store: Arc<dyn TokenStore>,
	static_secret: Option<TokenSecret>,
	clock: Arc<dyn Clock>,
}
impl TokenAuthority {
	/// Creates an authority over the provided store with no static fallback.
	pub fn new(store: Arc<dyn TokenStore>) -> Self {
		Self { store, static_secret: None, clock: Arc::new(SystemClock) }
	}

	/// Accepts `secret` as a non-expiring bearer. Empty secrets disable the fallback.
	pub fn with_static_secret(mut self, secret: impl Into<String>) -> Self {
		let secret = secret.into();

		self.static_secret = if secret.is_empty() { None } else { Some(TokenSecret::new(secret)) };

		self
	}

	/// Replaces the clock.
	pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
		self.clock = clock;

		self
	}

	/// Returns `true` when a static bearer secret is configured.
	pub fn has_static_secret(&self) -> bool {
		self.static_secret.is_some()
	}

	/// Fetches a registered client.
	pub async fn get_client(&self, client_id: &str) -> Option<ClientInfo> {
		self.store.client(client_id).await
	}

	/// Registers a client, assigning an identifier when none was requested.
	///
	/// Re-registering an existing identifier replaces the previous entry.
	pub async fn register_client(&self, registration: ClientRegistration) -> ClientInfo {
		let client_id = registration.client_id.clone().unwrap_or_else(ClientId::generate);
		let client = registration.into_client_info(client_id, self.clock.now());

		self.store.put_client(client.clone()).await;
		obs::record_operation(Operation::RegisterClient, Outcome::Success);
		tracing::info!(client_id = %client.client_id, "OAuth client registered.");

		client
	}

	/// Issues an authorization code and returns the redirect target carrying it.
	///
	/// Existing query parameters on the redirect URI are preserved; `code` and `state` replace
	/// any values already present. `state` is only added when supplied.
	pub async fn authorize(&self, client: &ClientInfo, params: AuthorizationParams) -> Url {
		let code = TokenSecret::generate();
		let redirect = construct_redirect_uri(
			&params.redirect_uri,
			&[("code", Some(code.expose())), ("state", params.state.as_deref())],
		);
		let record = AuthorizationCode {
			code,
			client_id: client.client_id.clone(),
			scopes: params.scopes,
			redirect_uri: params.redirect_uri,
			redirect_uri_provided_explicitly: params.redirect_uri_provided_explicitly,
			code_challenge: params.code_challenge,
			resource: params.resource,
			expires_at: self.clock.now() + AUTHORIZATION_CODE_TTL,
		};

		self.store.put_code(record).await;
		obs::record_operation(Operation::Authorize, Outcome::Success);
		tracing::info!(client_id = %client.client_id, "Authorization code issued.");

		redirect
	}

	/// Looks up a live code issued to `client` without consuming it.
	pub async fn load_authorization_code(
		&self,
		client: &ClientInfo,
		code: &str,
	) -> Option<AuthorizationCode> {
		self.store.lookup_code(&SecretDigest::of(code), &client.client_id, self.clock.now()).await
	}

	/// Consumes `code` and mints an access/refresh pair carrying its scopes and resource.
	///
	/// The code is removed before anything is minted. When a concurrent exchange already
	/// removed it, this call mints nothing and returns `None`.
	pub async fn exchange_authorization_code(
		&self,
		client: &ClientInfo,
		code: &AuthorizationCode,
	) -> Option<TokenResponse> {
		obs::record_operation(Operation::ExchangeCode, Outcome::Attempt);

		let Some(consumed) = self.store.take_code(&code.code.digest()).await else {
			obs::record_operation(Operation::ExchangeCode, Outcome::Failure);
			tracing::warn!(client_id = %client.client_id, "Authorization code already consumed.");

			return None;
		};
		let response =
			self.mint_pair(&client.client_id, consumed.scopes, consumed.resource).await;

		obs::record_operation(Operation::ExchangeCode, Outcome::Success);
		tracing::info!(client_id = %client.client_id, "Tokens issued.");

		Some(response)
	}

	/// Looks up a live refresh token issued to `client` without consuming it.
	pub async fn load_refresh_token(
		&self,
		client: &ClientInfo,
		token: &str,
	) -> Option<RefreshToken> {
		self.store.lookup_refresh(&SecretDigest::of(token), &client.client_id, self.clock.now()).await
	}

	/// Rotates `token` into a brand-new access/refresh pair.
	///
	/// A non-empty `scopes` replaces the previous scope set; an empty one inherits it. The
	/// presented refresh token is removed first and never becomes valid again.
	pub async fn exchange_refresh_token(
		&self,
		client: &ClientInfo,
		token: &RefreshToken,
		scopes: ScopeSet,
	) -> Option<TokenResponse> {
		obs::record_operation(Operation::ExchangeRefresh, Outcome::Attempt);

		let Some(consumed) = self.store.take_refresh(&token.token.digest()).await else {
			obs::record_operation(Operation::ExchangeRefresh, Outcome::Failure);
			tracing::warn!(client_id = %client.client_id, "Refresh token already rotated.");

			return None;
		};
		let effective = if scopes.is_empty() { consumed.scopes } else { scopes };
		let response = self.mint_pair(&client.client_id, effective, None).await;

		obs::record_operation(Operation::ExchangeRefresh, Outcome::Success);
		tracing::info!(client_id = %client.client_id, "Refresh token rotated.");

		Some(response)
	}

	/// Verifies a presented bearer.
	///
	/// Issued access tokens are checked first. Only when none matches is the secret compared
	/// in constant time against the static fallback, which always yields the same minimal
	/// record: the `static-bearer` client, no scopes, no expiry.
	pub async fn load_access_token(&self, token: &str) -> Option<AccessToken> {
		let found = match self.store.lookup_access(&SecretDigest::of(token), self.clock.now()).await
		{
			Some(record) => Some(record),
			None => self.static_fallback(token),
		};

		obs::record_operation(Operation::VerifyAccess, Outcome::of_presence(found.is_some()));

		found
	}

	/// Removes the matching record. Unknown tokens are ignored.
	pub async fn revoke_token(&self, token: &RevocableToken) {
		let removed = match token {
			RevocableToken::Access(record) =>
				self.store.take_access(&record.token.digest()).await.is_some(),
			RevocableToken::Refresh(record) =>
				self.store.take_refresh(&record.token.digest()).await.is_some(),
		};

		obs::record_operation(Operation::Revoke, Outcome::of_presence(removed));

		if removed {
			tracing::info!("Token revoked.");
		}
	}

	async fn mint_pair(
		&self,
		client_id: &ClientId,
		scopes: ScopeSet,
		resource: Option<String>,
	) -> TokenResponse {
		let now = self.clock.now();
		let access_token = TokenSecret::generate();
		let refresh_token = TokenSecret::generate();
		let scope = scopes.to_scope_param();

		self.store
			.put_access(AccessToken {
				token: access_token.clone(),
				client_id: client_id.clone(),
				scopes: scopes.clone(),
				expires_at: Some(now + ACCESS_TOKEN_TTL),
				resource,
			})
			.await;
		self.store
			.put_refresh(RefreshToken {
				token: refresh_token.clone(),
				client_id: client_id.clone(),
				scopes,
				expires_at: now + REFRESH_TOKEN_TTL,
			})
			.await;

		TokenResponse {
			access_token,
			token_type: Cow::Borrowed("Bearer"),
			expires_in: ACCESS_TOKEN_TTL.whole_seconds(),
			refresh_token,
			scope,
		}
	}

	fn static_fallback(&self, token: &str) -> Option<AccessToken> {
		let secret = self.static_secret.as_ref()?;

		if !secret.ct_eq(token) {
			return None;
		}

		Some(AccessToken {
			token: TokenSecret::new(token),
			client_id: ClientId::static_bearer(),
			scopes: ScopeSet::default(),
			expires_at: None,
			resource: None,
		})
	}
}
impl Debug for TokenAuthority {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenAuthority")
			.field("static_secret", &self.static_secret)
			.finish_non_exhaustive()
	}
}

/// Appends `params` to `base`, keeping unrelated query parameters in place.
///
/// A key already present keeps its first position and collapses to the new value; absent
/// values leave the URI untouched for that key.
pub fn construct_redirect_uri(base: &Url, params: &[(&str, Option<&str>)]) -> Url {
	let mut pairs = base.query_pairs().into_owned().collect::<Vec<(String, String)>>();

	for (key, value) in params {
		let Some(value) = value else { continue };

		match pairs.iter().position(|(existing, _)| existing == key) {
			Some(first) => {
				pairs[first].1 = (*value).to_owned();

				let mut index = 0;

				pairs.retain(|(existing, _)| {
					let keep = index <= first || existing != key;

					index += 1;

					keep
				});
			},
			None => pairs.push(((*key).to_owned(), (*value).to_owned())),
		}
	}

	let mut redirect = base.clone();

	if pairs.is_empty() {
		redirect.set_query(None);
	} else {
		redirect.query_pairs_mut().clear().extend_pairs(pairs);
	}

	redirect
}
