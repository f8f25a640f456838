//! Thread-safe in-memory [`TokenStore`] implementation.
//!
//! Each credential kind lives in its own mutex-guarded map. Nothing is persisted, so every
//! issued credential is gone when the process stops.

// self
use crate::{
	_prelude::*,
	auth::{
		AccessToken, AuthorizationCode, ClientId, ClientInfo, Credential, RefreshToken,
		SecretDigest,
	},
	store::{StoreFuture, TokenStore},
};

/// Process-lifetime storage backend for clients and issued credentials.
#[derive(Debug, Default)]
pub struct MemoryStore {
	clients: RwLock<HashMap<ClientId, ClientInfo>>,
	codes: DigestMap<AuthorizationCode>,
	access: DigestMap<AccessToken>,
	refresh: DigestMap<RefreshToken>,
}
impl TokenStore for MemoryStore {
	fn put_client(&self, client: ClientInfo) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.clients.write().insert(client.client_id.clone(), client);
		})
	}

	fn client<'a>(&'a self, client_id: &'a str) -> StoreFuture<'a, Option<ClientInfo>> {
		Box::pin(async move { self.clients.read().get(client_id).cloned() })
	}

	fn put_code(&self, record: AuthorizationCode) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.codes.insert(record) })
	}

	fn lookup_code<'a>(
		&'a self,
		digest: &'a SecretDigest,
		client_id: &'a ClientId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<AuthorizationCode>> {
		Box::pin(async move { self.codes.lookup(digest, Some(client_id), now) })
	}

	fn take_code<'a>(
		&'a self,
		digest: &'a SecretDigest,
	) -> StoreFuture<'a, Option<AuthorizationCode>> {
		Box::pin(async move { self.codes.take(digest) })
	}

	fn put_access(&self, record: AccessToken) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.access.insert(record) })
	}

	fn lookup_access<'a>(
		&'a self,
		digest: &'a SecretDigest,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move { self.access.lookup(digest, None, now) })
	}

	fn take_access<'a>(&'a self, digest: &'a SecretDigest) -> StoreFuture<'a, Option<AccessToken>> {
		Box::pin(async move { self.access.take(digest) })
	}

	fn put_refresh(&self, record: RefreshToken) -> StoreFuture<'_, ()> {
		Box::pin(async move { self.refresh.insert(record) })
	}

	fn lookup_refresh<'a>(
		&'a self,
		digest: &'a SecretDigest,
		client_id: &'a ClientId,
		now: OffsetDateTime,
	) -> StoreFuture<'a, Option<RefreshToken>> {
		Box::pin(async move { self.refresh.lookup(digest, Some(client_id), now) })
	}

	fn take_refresh<'a>(
		&'a self,
		digest: &'a SecretDigest,
	) -> StoreFuture<'a, Option<RefreshToken>> {
		Box::pin(async move { self.refresh.take(digest) })
	}
}

#[derive(Debug)]
struct DigestMap<R>(Mutex<HashMap<SecretDigest, R>>);
impl<R> Default for DigestMap<R> {
	fn default() -> Self {
		Self(Mutex::new(HashMap::new()))
	}
}
impl<R> DigestMap<R>
where
	R: Credential,
{
	fn insert(&self, record: R) {
		let digest = record.secret().digest();

		self.0.lock().insert(digest, record);
	}

	// Client mismatch leaves the record in place; only expiry evicts.
	fn lookup(
		&self,
		digest: &SecretDigest,
		client_id: Option<&ClientId>,
		now: OffsetDateTime,
	) -> Option<R> {
		let mut guard = self.0.lock();
		let expired = {
			let record = guard.get(digest)?;

			if client_id.is_some_and(|expected| record.client_id() != expected) {
				return None;
			}

			record.is_expired_at(now)
		};

		if expired {
			guard.remove(digest);

			return None;
		}

		guard.get(digest).cloned()
	}

	fn take(&self, digest: &SecretDigest) -> Option<R> {
		self.0.lock().remove(digest)
	}

	#[cfg(test)]
	fn len(&self) -> usize {
		self.0.lock().len()
	}
}
