//! Registered client identities.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const IDENTIFIER_MAX_LEN: usize = 128;
const STATIC_BEARER_CLIENT_ID: &str = "static-bearer";

/// Error returned when client identifier validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum IdentifierError {
	/// The identifier was empty.
	#[error("Client identifier cannot be empty.")]
	Empty,
	/// The identifier contains whitespace characters.
	#[error("Client identifier contains whitespace.")]
	ContainsWhitespace,
	/// The identifier exceeded the allowed character count.
	#[error("Client identifier exceeds {max} characters.")]
	TooLong {
		/// Maximum permitted character count.
		max: usize,
	},
}

/// Unique identifier of a registered client.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClientId(String);
impl ClientId {
	/// Creates a new identifier after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, IdentifierError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Assigns a fresh, globally unique identifier.
	pub fn generate() -> Self {
		Self(uuid::Uuid::new_v4().to_string())
	}

	/// Fixed identity attached to requests authenticated with the static bearer secret.
	pub fn static_bearer() -> Self {
		Self(STATIC_BEARER_CLIENT_ID.to_owned())
	}
}
impl Deref for ClientId {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for ClientId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for ClientId {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<ClientId> for String {
	fn from(value: ClientId) -> Self {
		value.0
	}
}
impl TryFrom<String> for ClientId {
	type Error = IdentifierError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl Debug for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Client({})", self.0)
	}
}
impl Display for ClientId {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Dynamic client registration request (RFC 7591 subset).
///
/// `client_id` is normally absent; the authority assigns one.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientRegistration {
	/// Caller-chosen identifier, if any.
	#[serde(default)]
	pub client_id: Option<ClientId>,
	/// Redirect URIs the client may use.
	pub redirect_uris: Vec<Url>,
	/// Grant types the client intends to use.
	#[serde(default = "default_grant_types")]
	pub grant_types: Vec<String>,
	/// Response types the client intends to use.
	#[serde(default = "default_response_types")]
	pub response_types: Vec<String>,
	/// Client authentication method at the token endpoint.
	#[serde(default = "default_auth_method")]
	pub token_endpoint_auth_method: String,
	/// Optional human-readable name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_name: Option<String>,
}
impl ClientRegistration {
	/// Creates a registration for the provided redirect URIs with default grants.
	pub fn new(redirect_uris: Vec<Url>) -> Self {
		Self {
			client_id: None,
			redirect_uris,
			grant_types: default_grant_types(),
			response_types: default_response_types(),
			token_endpoint_auth_method: default_auth_method(),
			client_name: None,
		}
	}

	/// Requests a specific client identifier.
	pub fn with_client_id(mut self, client_id: ClientId) -> Self {
		self.client_id = Some(client_id);

		self
	}

	/// Overrides the grant types.
	pub fn with_grant_types<I, S>(mut self, grants: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.grant_types = grants.into_iter().map(Into::into).collect();

		self
	}

	/// Overrides the token endpoint authentication method.
	pub fn with_token_endpoint_auth_method(mut self, method: impl Into<String>) -> Self {
		self.token_endpoint_auth_method = method.into();

		self
	}

	/// Stamps the registration into an immutable [`ClientInfo`].
	pub fn into_client_info(self, client_id: ClientId, issued_at: OffsetDateTime) -> ClientInfo {
		ClientInfo {
			client_id,
			client_id_issued_at: issued_at.unix_timestamp(),
			redirect_uris: self.redirect_uris,
			grant_types: self.grant_types,
			response_types: self.response_types,
			token_endpoint_auth_method: self.token_endpoint_auth_method,
			client_name: self.client_name,
		}
	}
}

/// Registered client as stored by the authority; immutable after registration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
	/// Assigned identifier.
	pub client_id: ClientId,
	/// Registration instant (Unix seconds).
	pub client_id_issued_at: i64,
	/// Redirect URIs the client may use.
	pub redirect_uris: Vec<Url>,
	/// Grant types the client registered.
	pub grant_types: Vec<String>,
	/// Response types the client registered.
	pub response_types: Vec<String>,
	/// Client authentication method at the token endpoint.
	pub token_endpoint_auth_method: String,
	/// Optional human-readable name.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub client_name: Option<String>,
}
impl ClientInfo {
	/// Resolves the redirect URI for an authorization request.
	///
	/// An explicit URI must be registered; an omitted one is only allowed when exactly one
	/// URI was registered.
	pub fn validate_redirect_uri(&self, requested: Option<&Url>) -> Option<Url> {
		match requested {
			Some(uri) => self.redirect_uris.iter().find(|registered| *registered == uri).cloned(),
			None if self.redirect_uris.len() == 1 => self.redirect_uris.first().cloned(),
			None => None,
		}
	}
}

fn default_grant_types() -> Vec<String> {
	vec!["authorization_code".into(), "refresh_token".into()]
}

fn default_response_types() -> Vec<String> {
	vec!["code".into()]
}

// No client secrets are issued, so public clients are the only kind.
fn default_auth_method() -> String {
	"none".into()
}

fn validate_view(view: &str) -> Result<(), IdentifierError> {
	if view.is_empty() {
		return Err(IdentifierError::Empty);
	}
	if view.chars().any(char::is_whitespace) {
		return Err(IdentifierError::ContainsWhitespace);
	}
	if view.len() > IDENTIFIER_MAX_LEN {
		return Err(IdentifierError::TooLong { max: IDENTIFIER_MAX_LEN });
	}

	Ok(())
}
