//! Transport primitives for upstream API calls.
//!
//! [`UpstreamTransport`] is the client's only dependency on an HTTP stack. The bundled
//! [`ReqwestTransport`] injects the fixed authentication, user-agent, and content-type headers
//! on every request; tests substitute scripted transports to drive retry sequences.
//! [`ResponseMetadata`] extracts the throttling hints the retry and pacing policies act on.

// crates.io
use reqwest::{
	Method,
	header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, RETRY_AFTER},
};
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, TransportError},
};

/// Default upstream host.
pub const DEFAULT_BASE_URL: &str = "https://api.printify.com";
/// Client identifier sent as the user-agent.
pub const USER_AGENT: &str = "printify-mcp-server/0.1.0";
/// Header carrying the remaining request quota.
pub const RATE_LIMIT_REMAINING: &str = "x-ratelimit-remaining";
/// Header carrying the seconds until the quota resets.
pub const RATE_LIMIT_RESET: &str = "x-ratelimit-reset";

/// Future returned by [`UpstreamTransport::send`].
pub type TransportFuture<'a> =
	Pin<Box<dyn Future<Output = Result<UpstreamResponse, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP stacks able to execute one upstream request.
///
/// Implementations must be shareable across concurrent calls; connection reuse happens inside
/// the transport and no per-call state may leak between requests.
pub trait UpstreamTransport
where
	Self: 'static + Send + Sync,
{
	/// Executes a single attempt. Non-success statuses are responses, not errors.
	fn send(&self, request: UpstreamRequest) -> TransportFuture<'_>;
}

/// Request envelope: method, path relative to the base host, query, and optional JSON body.
#[derive(Clone, Debug, PartialEq)]
pub struct UpstreamRequest {
	/// HTTP method.
	pub method: Method,
	/// Absolute path such as `/v1/shops.json`.
	pub path: String,
	/// Query parameters, in order.
	pub query: Vec<(String, String)>,
	/// JSON body, if any.
	pub body: Option<Value>,
}
impl UpstreamRequest {
	/// Creates a request without query or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), query: Vec::new(), body: None }
	}

	/// Appends a query parameter.
	pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
		self.query.push((key.into(), value.to_string()));

		self
	}

	/// Attaches a JSON body.
	pub fn with_body(mut self, body: Value) -> Self {
		self.body = Some(body);

		self
	}
}

/// Fully buffered upstream response.
#[derive(Clone, Debug)]
pub struct UpstreamResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl UpstreamResponse {
	/// Creates a response with no headers.
	pub fn new(status: u16, body: Vec<u8>) -> Self {
		Self { status, headers: HeaderMap::new(), body }
	}

	/// Adds a header, returning `false` when the name or value is not valid HTTP.
	pub fn insert_header(&mut self, name: &str, value: &str) -> bool {
		match (HeaderName::from_bytes(name.as_bytes()), HeaderValue::from_str(value)) {
			(Ok(name), Ok(value)) => {
				self.headers.insert(name, value);

				true
			},
			_ => false,
		}
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns `true` when the content type announces JSON.
	pub fn is_json(&self) -> bool {
		self.headers
			.get(CONTENT_TYPE)
			.and_then(|value| value.to_str().ok())
			.is_some_and(|value| value.starts_with("application/json"))
	}

	/// Parsed JSON error body, or `{}` when the body is not JSON or fails to parse.
	pub fn error_details(&self) -> Value {
		if !self.is_json() {
			return json!({});
		}

		serde_json::from_slice(&self.body).unwrap_or_else(|_| json!({}))
	}

	/// Throttling hints carried by the response headers.
	pub fn metadata(&self) -> ResponseMetadata {
		ResponseMetadata::from_headers(&self.headers)
	}
}

/// Throttling hints extracted from an upstream response.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResponseMetadata {
	/// `Retry-After` expressed as a relative duration.
	pub retry_after: Option<StdDuration>,
	/// Remaining request quota; absent when missing or not an integer.
	pub rate_limit_remaining: Option<i64>,
	/// Seconds until the quota resets; absent when missing or unusable.
	pub rate_limit_reset: Option<StdDuration>,
}
impl ResponseMetadata {
	/// Parses the throttling headers.
	pub fn from_headers(headers: &HeaderMap) -> Self {
		Self {
			retry_after: parse_retry_after(headers),
			rate_limit_remaining: header_str(headers, RATE_LIMIT_REMAINING)
				.and_then(|raw| raw.parse().ok()),
			rate_limit_reset: header_str(headers, RATE_LIMIT_RESET).and_then(parse_seconds),
		}
	}
}

/// Reqwest-backed transport carrying the fixed upstream headers.
#[derive(Clone, Debug)]
pub struct ReqwestTransport {
	client: ReqwestClient,
	base_url: Url,
}
impl ReqwestTransport {
	/// Builds a transport that authenticates with `api_key` against `base_url`.
	pub fn new(api_key: &str, base_url: Url, timeout: StdDuration) -> Result<Self, ConfigError> {
		let mut authorization = HeaderValue::from_str(&format!("Bearer {api_key}"))
			.map_err(|_| ConfigError::InvalidApiKey)?;

		authorization.set_sensitive(true);

		let mut headers = HeaderMap::new();

		headers.insert(AUTHORIZATION, authorization);
		headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

		let client = ReqwestClient::builder()
			.default_headers(headers)
			.user_agent(USER_AGENT)
			.timeout(timeout)
			.build()?;

		Ok(Self { client, base_url })
	}

	/// Base URL requests are resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}
}
impl UpstreamTransport for ReqwestTransport {
	fn send(&self, request: UpstreamRequest) -> TransportFuture<'_> {
		Box::pin(async move {
			let url = self.base_url.join(&request.path).map_err(TransportError::network)?;
			let mut builder = self.client.request(request.method, url);

			if !request.query.is_empty() {
				builder = builder.query(&request.query);
			}
			if let Some(body) = &request.body {
				builder = builder.body(serde_json::to_vec(body).map_err(TransportError::network)?);
			}

			let response = builder.send().await?;
			let status = response.status().as_u16();
			let headers = response.headers().to_owned();
			let body = response.bytes().await?.to_vec();

			Ok(UpstreamResponse { status, headers, body })
		})
	}
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
	headers.get(name)?.to_str().ok().map(str::trim)
}

// Integer or fractional seconds; negatives and non-finite values are unusable.
fn parse_seconds(raw: &str) -> Option<StdDuration> {
	StdDuration::try_from_secs_f64(raw.parse::<f64>().ok()?).ok()
}

fn parse_retry_after(headers: &HeaderMap) -> Option<StdDuration> {
	let raw = header_str(headers, RETRY_AFTER.as_str())?;

	if let Some(delay) = parse_seconds(raw) {
		return Some(delay);
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return StdDuration::try_from(delta).ok();
		}
	}

	None
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn headers(pairs: &[(&str, &str)]) -> HeaderMap {
		let mut response = UpstreamResponse::new(200, Vec::new());

		for (name, value) in pairs {
			assert!(response.insert_header(name, value));
		}

		response.headers
	}

	#[test]
	fn retry_after_accepts_seconds_and_fractions() {
		let meta = ResponseMetadata::from_headers(&headers(&[("retry-after", "2")]));

		assert_eq!(meta.retry_after, Some(StdDuration::from_secs(2)));

		let meta = ResponseMetadata::from_headers(&headers(&[("retry-after", "0.5")]));

		assert_eq!(meta.retry_after, Some(StdDuration::from_millis(500)));
	}

	#[test]
	fn retry_after_accepts_future_http_dates() {
		let future = (OffsetDateTime::now_utc() + Duration::minutes(5))
			.format(&Rfc2822)
			.expect("Fixture date should format.");
		let meta = ResponseMetadata::from_headers(&headers(&[("retry-after", &future)]));
		let delay = meta.retry_after.expect("Future date should yield a delay.");

		assert!(delay > StdDuration::from_secs(200));
		assert!(delay <= StdDuration::from_secs(300));
	}

	#[test]
	fn unusable_hints_are_ignored() {
		let meta = ResponseMetadata::from_headers(&headers(&[
			("retry-after", "soon"),
			("x-ratelimit-remaining", "many"),
			("x-ratelimit-reset", "-3"),
		]));

		assert_eq!(meta, ResponseMetadata::default());
	}

	#[test]
	fn rate_limit_headers_parse() {
		let meta = ResponseMetadata::from_headers(&headers(&[
			("X-RateLimit-Remaining", "3"),
			("X-RateLimit-Reset", "2"),
		]));

		assert_eq!(meta.rate_limit_remaining, Some(3));
		assert_eq!(meta.rate_limit_reset, Some(StdDuration::from_secs(2)));
	}

	#[test]
	fn error_details_require_json_content_type() {
		let mut response = UpstreamResponse::new(400, br#"{"code":8150}"#.to_vec());

		assert_eq!(response.error_details(), json!({}));

		response.insert_header("content-type", "application/json; charset=utf-8");

		assert_eq!(response.error_details(), json!({"code": 8150}));

		let garbled = UpstreamResponse { body: b"{not json".to_vec(), ..response };

		assert_eq!(garbled.error_details(), json!({}));
	}
}
