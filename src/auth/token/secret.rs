//! Redacted token secrets and the one-way digests used to index them.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
// self
use crate::_prelude::*;

const SECRET_BYTES: usize = 32;

/// Redacted token secret wrapper keeping sensitive material out of logs.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSecret(String);
impl TokenSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Mints a fresh URL-safe secret carrying 256 bits of entropy.
	pub fn generate() -> Self {
		let mut bytes = [0_u8; SECRET_BYTES];

		rand::rng().fill_bytes(&mut bytes);

		Self(URL_SAFE_NO_PAD.encode(bytes))
	}

	/// Returns the inner token value. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Irreversible digest used as the storage key for this secret.
	pub fn digest(&self) -> SecretDigest {
		SecretDigest::of(&self.0)
	}

	/// Compares against a presented value without short-circuiting on the first differing byte.
	pub fn ct_eq(&self, presented: &str) -> bool {
		self.0.as_bytes().ct_eq(presented.as_bytes()).into()
	}
}
impl AsRef<str> for TokenSecret {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("TokenSecret").field(&"<redacted>").finish()
	}
}
impl Display for TokenSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// SHA-256 digest (base64url, no padding) of a secret; the only form secrets take as map keys.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SecretDigest(String);
impl SecretDigest {
	/// Hashes a presented secret.
	pub fn of(secret: &str) -> Self {
		let mut hasher = Sha256::new();

		hasher.update(secret.as_bytes());

		Self(URL_SAFE_NO_PAD.encode(hasher.finalize()))
	}

	/// Encoded digest value.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for SecretDigest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SecretDigest").field(&self.0).finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn secret_formatters_redact() {
		let secret = TokenSecret::new("super-secret");

		assert_eq!(format!("{secret:?}"), "TokenSecret(\"<redacted>\")");
		assert_eq!(format!("{secret}"), "<redacted>");
	}

	#[test]
	fn generated_secrets_are_url_safe_and_distinct() {
		let first = TokenSecret::generate();
		let second = TokenSecret::generate();

		assert_ne!(first, second);
		// 32 bytes encode to 43 base64url characters without padding.
		assert_eq!(first.expose().len(), 43);
		assert!(
			first.expose().chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'),
			"Secret must only contain URL-safe characters."
		);
	}

	#[test]
	fn digest_is_stable_and_hides_the_secret() {
		let secret = TokenSecret::new("plaintext-value");

		assert_eq!(secret.digest(), SecretDigest::of("plaintext-value"));
		assert_ne!(secret.digest(), SecretDigest::of("plaintext-valuf"));
		assert!(!secret.digest().as_str().contains("plaintext"));
	}

	#[test]
	fn constant_time_comparison_matches_equality() {
		let secret = TokenSecret::new("static-secret");

		assert!(secret.ct_eq("static-secret"));
		assert!(!secret.ct_eq("static-secreT"));
		assert!(!secret.ct_eq("static"));
		assert!(!secret.ct_eq(""));
	}
}
