//! Gateway-level error types shared by the upstream client, the tool layer, and the binary.
//!
//! The token authority never produces these: its lookups answer with `Option` so callers
//! cannot tell a wrong client from an expired or unknown credential.

// self
use crate::_prelude::*;

/// Gateway-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical gateway error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Upstream API answered with a non-success status.
	#[error(transparent)]
	Upstream(#[from] UpstreamError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Underlying IO failure (listener, stdio).
	#[error(transparent)]
	Io(#[from] std::io::Error),

	/// Caller-supplied input cannot be used (missing shop id, missing image source, bad arguments).
	#[error("{message}")]
	InputInvalid {
		/// Human-readable reason surfaced to the tool caller.
		message: String,
	},
	/// Upstream answered with a success status whose body is not valid JSON.
	#[error("Upstream returned malformed JSON (HTTP {status}).")]
	Decode {
		/// HTTP status of the response that failed to parse.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Builds an [`Error::InputInvalid`] from any displayable reason.
	pub fn input_invalid(message: impl Into<String>) -> Self {
		Self::InputInvalid { message: message.into() }
	}
}

/// Configuration and startup failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Upstream API key contains characters that cannot be sent in a header.
	#[error("Upstream API key is not a valid header value.")]
	InvalidApiKey,
	/// Base URL or issuer URL cannot be used.
	#[error("{name} is not a valid base URL: {value}.")]
	InvalidUrl {
		/// Setting name.
		name: &'static str,
		/// Offending value.
		value: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Non-success response from the upstream API, kept after retries are exhausted or when the
/// status is not retryable.
#[derive(Clone, Debug, ThisError)]
#[error("{message}")]
pub struct UpstreamError {
	/// HTTP status code returned by the upstream API.
	pub status: u16,
	/// Human-readable summary including status, method, and path.
	pub message: String,
	/// Parsed JSON error body, or an empty object when absent or unparsable.
	pub details: Value,
}
impl UpstreamError {
	/// Builds an error for `method path` answered with `status`.
	pub fn new(status: u16, method: &str, path: &str, details: Value) -> Self {
		let reason = reqwest::StatusCode::from_u16(status)
			.ok()
			.and_then(|code| code.canonical_reason())
			.unwrap_or("Unknown Status");
		let kind = match status {
			100..=199 => "Informational response",
			300..=399 => "Redirect response",
			400..=499 => "Client error",
			_ => "Server error",
		};
		let message = format!("{kind} '{status} {reason}' for {method} {path}.");

		Self { status, message, details }
	}

	/// Returns `true` when the upstream throttled the request.
	pub fn is_rate_limited(&self) -> bool {
		self.status == 429
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the upstream API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The upstream call did not complete within the configured timeout.
	#[error("Upstream API call timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::Timeout { source: Box::new(e) } } else { Self::network(e) }
	}
}
