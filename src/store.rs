//! Storage contract and the in-memory store backing the token authority.
//!
//! Every credential is indexed by the [`SecretDigest`] of its secret, never by the plaintext.
//! Lookups that can evict run as a single critical section so two concurrent callers cannot
//! both observe a record that one of them is about to remove.

pub mod memory;

pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{AccessToken, AuthorizationCode, ClientId, ClientInfo, RefreshToken, SecretDigest},
};

/// Future returned by [`TokenStore`] operations. Stores are infallible from the caller's view.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a + Send>>;

/// Storage backend contract implemented by token stores.
///
/// `lookup_*` returns `None` when the record is absent, belongs to another client, or is
/// expired at `now`; expired records are removed as part of the same lookup. `take_*` removes
/// unconditionally and returns what was removed, which makes it the single-use gate.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Persists or replaces a client registration.
	fn put_client(&self, client: ClientInfo) -> StoreFuture<'_, ()>;

	/// Fetches a client by identifier.
	fn client<'a>(&'a self, client_id: &'a str) -> StoreFuture<'a, Option<ClientInfo>>;

	/// Stores a freshly issued authorization code.
	fn put_code(&self, record: AuthorizationCode) -> StoreFuture<'_, ()>;

	/// Finds a live code issued to `client_id`.
	fn lookup_code<'a>(
		&'a self,
		digest: &'a SecretDigest,
		client_id: &'a ClientId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<AuthorizationCode>>;

	/// Removes a code, returning it if it was still present.
	fn take_code<'a>(&'a self, digest: &'a SecretDigest)
	-> StoreFuture<'a, Option<AuthorizationCode>>;

	/// Stores a freshly issued access token.
	fn put_access(&self, record: AccessToken) -> StoreFuture<'_, ()>;

	/// Finds a live access token regardless of client.
	fn lookup_access<'a>(
		&'a self,
		digest: &'a SecretDigest,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<AccessToken>>;

	/// Removes an access token, returning it if it was still present.
	fn take_access<'a>(&'a self, digest: &'a SecretDigest) -> StoreFuture<'a, Option<AccessToken>>;

	/// Stores a freshly issued refresh token.
	fn put_refresh(&self, record: RefreshToken) -> StoreFuture<'_, ()>;

	/// Finds a live refresh token issued to `client_id`.
	fn lookup_refresh<'a>(
		&'a self,
		digest: &'a SecretDigest,
		client_id: &'a ClientId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<RefreshToken>>;

	/// Removes a refresh token, returning it if it was still present.
	fn take_refresh<'a>(&'a self, digest: &'a SecretDigest)
	-> StoreFuture<'a, Option<RefreshToken>>;
}
