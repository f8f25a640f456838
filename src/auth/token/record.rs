//! Fixed-shape records for every credential kind the authority issues.
//!
//! Records are immutable once stored. Their lifecycle is presence in the store: issuing inserts,
//! and exchange, revocation, rotation, or expiry remove.

// self
use crate::{
	_prelude::*,
	auth::{ClientId, ScopeSet, token::secret::TokenSecret},
};

/// Shared view over stored credentials used by the store for client scoping and lazy eviction.
pub trait Credential
where
	Self: 'static + Clone + Send + Sync,
{
	/// Plaintext secret carried by the record.
	fn secret(&self) -> &TokenSecret;

	/// Client the credential was issued to.
	fn client_id(&self) -> &ClientId;

	/// Absolute expiry, or `None` for credentials that never expire.
	fn expires_at(&self) -> Option<OffsetDateTime>;

	/// Returns `true` once `now` is strictly past the expiry instant.
	fn is_expired_at(&self, now: OffsetDateTime) -> bool {
		self.expires_at().is_some_and(|expires_at| now > expires_at)
	}
}

/// One-time code issued by `authorize` and consumed by exchange.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuthorizationCode {
	/// Code secret.
	pub code: TokenSecret,
	/// Client the code was issued to.
	pub client_id: ClientId,
	/// Scopes granted by the authorization request.
	pub scopes: ScopeSet,
	/// Redirect URI the code was delivered to.
	pub redirect_uri: Url,
	/// Whether the client named the redirect URI explicitly.
	pub redirect_uri_provided_explicitly: bool,
	/// PKCE challenge, stored verbatim. It is not checked against a verifier at exchange.
	pub code_challenge: String,
	/// Resource indicator (RFC 8707), if requested.
	pub resource: Option<String>,
	/// Absolute expiry.
	pub expires_at: OffsetDateTime,
}
impl Credential for AuthorizationCode {
	fn secret(&self) -> &TokenSecret {
		&self.code
	}

	fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	fn expires_at(&self) -> Option<OffsetDateTime> {
		Some(self.expires_at)
	}
}

/// Bearer credential presented on inbound calls.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessToken {
	/// Token secret.
	pub token: TokenSecret,
	/// Client the token was issued to.
	pub client_id: ClientId,
	/// Scopes carried by the token.
	pub scopes: ScopeSet,
	/// Absolute expiry; `None` only for the static bearer fallback.
	pub expires_at: Option<OffsetDateTime>,
	/// Resource indicator inherited from the authorization code.
	pub resource: Option<String>,
}
impl AccessToken {
	/// Returns `true` when this record was synthesized for the static bearer secret.
	pub fn is_static(&self) -> bool {
		self.expires_at.is_none() && self.client_id == ClientId::static_bearer()
	}
}
impl Credential for AccessToken {
	fn secret(&self) -> &TokenSecret {
		&self.token
	}

	fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	fn expires_at(&self) -> Option<OffsetDateTime> {
		self.expires_at
	}
}

/// Rotating credential used to mint a fresh access/refresh pair.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RefreshToken {
	/// Token secret.
	pub token: TokenSecret,
	/// Client the token was issued to.
	pub client_id: ClientId,
	/// Scopes carried forward on rotation.
	pub scopes: ScopeSet,
	/// Absolute expiry.
	pub expires_at: OffsetDateTime,
}
impl Credential for RefreshToken {
	fn secret(&self) -> &TokenSecret {
		&self.token
	}

	fn client_id(&self) -> &ClientId {
		&self.client_id
	}

	fn expires_at(&self) -> Option<OffsetDateTime> {
		Some(self.expires_at)
	}
}

/// Token accepted by revocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RevocableToken {
	/// Revoke an access token.
	Access(AccessToken),
	/// Revoke a refresh token.
	Refresh(RefreshToken),
}
impl From<AccessToken> for RevocableToken {
	fn from(value: AccessToken) -> Self {
		Self::Access(value)
	}
}
impl From<RefreshToken> for RevocableToken {
	fn from(value: RefreshToken) -> Self {
		Self::Refresh(value)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros::datetime;
	// self
	use super::*;

	fn refresh(expires_at: OffsetDateTime) -> RefreshToken {
		RefreshToken {
			token: TokenSecret::new("refresh"),
			client_id: ClientId::new("client").expect("Client fixture should be valid."),
			scopes: ScopeSet::default(),
			expires_at,
		}
	}

	#[test]
	fn expiry_is_strictly_after_the_deadline() {
		let deadline = datetime!(2025-01-01 00:10 UTC);
		let record = refresh(deadline);

		assert!(!record.is_expired_at(deadline - Duration::seconds(1)));
		assert!(!record.is_expired_at(deadline));
		assert!(record.is_expired_at(deadline + Duration::milliseconds(1)));
	}

	#[test]
	fn static_access_tokens_never_expire() {
		let record = AccessToken {
			token: TokenSecret::new("static"),
			client_id: ClientId::static_bearer(),
			scopes: ScopeSet::default(),
			expires_at: None,
			resource: None,
		};

		assert!(record.is_static());
		assert!(!record.is_expired_at(datetime!(9999-12-31 23:59 UTC)));
	}

	#[test]
	fn record_debug_redacts_secrets() {
		let rendered = format!("{:?}", refresh(datetime!(2025-01-01 0:00 UTC)));

		assert!(rendered.contains("<redacted>"));
		assert!(!rendered.contains("\"refresh\""));
	}
}
