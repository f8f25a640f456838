//! Resilient client for the Printify REST API.
//!
//! Every call goes through [`PrintifyClient::request`], which applies two policies:
//!
//! - Reactive: an HTTP 429 is retried up to [`MAX_ATTEMPTS`] attempts in total, sleeping for
//!   `Retry-After` when present and `2^attempt` seconds otherwise. Any other non-success
//!   status fails immediately. When every attempt is throttled the last 429 is surfaced.
//! - Proactive: after a success whose `X-RateLimit-Remaining` is below
//!   [`RATE_LIMIT_THRESHOLD`], the client sleeps for `X-RateLimit-Reset` seconds (1 when
//!   absent) before returning.
//!
//! Sleeps go through a [`Sleeper`] so they suspend only the calling task and can be observed
//! in tests.

pub mod catalog;
pub mod images;
pub mod orders;
pub mod products;
pub mod shops;

pub use images::ImageSource;

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::Method;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, UpstreamError},
	http::{ReqwestTransport, UpstreamRequest, UpstreamResponse, UpstreamTransport},
	obs::{self, Operation, OperationSpan, Outcome},
};

/// Total attempts per call, including the first.
pub const MAX_ATTEMPTS: u32 = 3;
/// Remaining-quota low-water mark that triggers proactive pacing.
pub const RATE_LIMIT_THRESHOLD: i64 = 5;
/// Default per-attempt transport timeout.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);
/// Default page for list endpoints.
pub const DEFAULT_PAGE: u32 = 1;
/// Default page size for list endpoints.
pub const DEFAULT_LIMIT: u32 = 10;

// RFC 3986 unreserved characters stay literal; everything else is escaped.
const PATH_SEGMENT: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'_').remove(b'.').remove(b'~');
const DEFAULT_RESET: StdDuration = StdDuration::from_secs(1);
const MISSING_SHOP_ID: &str = "shop_id is required. Set PRINTIFY_SHOP_ID or call list_shops first.";

/// Future returned by [`Sleeper::sleep`].
pub type SleepFuture<'a> = Pin<Box<dyn Future<Output = ()> + 'a + Send>>;

/// Suspends the calling task for backoff and pacing delays.
pub trait Sleeper
where
	Self: 'static + Send + Sync,
{
	/// Completes after `duration`.
	fn sleep(&self, duration: StdDuration) -> SleepFuture<'_>;
}

/// [`Sleeper`] backed by the tokio timer.
#[derive(Clone, Copy, Debug, Default)]
pub struct TokioSleeper;
impl Sleeper for TokioSleeper {
	fn sleep(&self, duration: StdDuration) -> SleepFuture<'_> {
		Box::pin(tokio::time::sleep(duration))
	}
}

/// Pagination for list endpoints.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
	/// One-based page number.
	#[serde(default = "default_page")]
	pub page: u32,
	/// Page size.
	#[serde(default = "default_limit")]
	pub limit: u32,
}
impl Default for Page {
	fn default() -> Self {
		Self { page: DEFAULT_PAGE, limit: DEFAULT_LIMIT }
	}
}

/// Upstream client holding the transport, the sleeper, and the default shop.
#[derive(Clone)]
pub struct PrintifyClient {
	transport: Arc<dyn UpstreamTransport>,
	sleeper: Arc<dyn Sleeper>,
	shop_id: Option<String>,
}
impl PrintifyClient {
	/// Builds a client over [`ReqwestTransport`].
	pub fn new(
		api_key: &str,
		shop_id: Option<String>,
		base_url: Url,
		timeout: StdDuration,
	) -> Result<Self, ConfigError> {
		let transport = ReqwestTransport::new(api_key, base_url, timeout)?;

		Ok(Self::with_transport(Arc::new(transport), shop_id))
	}

	/// Builds a client over any transport, sleeping on the tokio timer.
	pub fn with_transport(transport: Arc<dyn UpstreamTransport>, shop_id: Option<String>) -> Self {
		Self {
			transport,
			sleeper: Arc::new(TokioSleeper),
			shop_id: shop_id.filter(|id| !id.is_empty()),
		}
	}

	/// Replaces the sleeper.
	pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
		self.sleeper = sleeper;

		self
	}

	/// Configured default shop.
	pub fn shop_id(&self) -> Option<&str> {
		self.shop_id.as_deref()
	}

	/// Resolves `/v1/shops/{shop_id}/{suffix}`, preferring `explicit` over the default shop.
	pub fn shop_path(&self, explicit: Option<&str>, suffix: &str) -> Result<String> {
		let shop_id = explicit
			.filter(|id| !id.is_empty())
			.or(self.shop_id())
			.ok_or_else(|| Error::input_invalid(MISSING_SHOP_ID))?;

		Ok(format!("/v1/shops/{}/{suffix}", path_segment(shop_id)?))
	}

	/// Executes `request` under the retry and pacing policies and decodes the JSON result.
	pub async fn request(&self, request: UpstreamRequest) -> Result<Value> {
		let span = OperationSpan::new(Operation::UpstreamRequest, "request");

		span.instrument(self.request_inner(request)).await
	}

	async fn request_inner(&self, request: UpstreamRequest) -> Result<Value> {
		let mut attempt = 0;

		loop {
			obs::record_operation(Operation::UpstreamRequest, Outcome::Attempt);

			let response = match self.transport.send(request.clone()).await {
				Ok(response) => response,
				Err(e) => {
					obs::record_operation(Operation::UpstreamRequest, Outcome::Failure);

					return Err(e.into());
				},
			};

			if response.is_success() {
				self.pace(&response).await;
				obs::record_operation(Operation::UpstreamRequest, Outcome::Success);

				return decode_body(response);
			}

			let error = UpstreamError::new(
				response.status,
				request.method.as_str(),
				&request.path,
				response.error_details(),
			);

			attempt += 1;

			if !error.is_rate_limited() || attempt >= MAX_ATTEMPTS {
				obs::record_operation(Operation::UpstreamRequest, Outcome::Failure);

				return Err(error.into());
			}

			obs::record_operation(Operation::UpstreamRequest, Outcome::Throttled);

			let wait = response
				.metadata()
				.retry_after
				.unwrap_or_else(|| StdDuration::from_secs(1 << (attempt - 1)));

			tracing::warn!(
				path = %request.path,
				attempt,
				wait_secs = wait.as_secs_f64(),
				"Rate limited; retrying."
			);
			self.sleeper.sleep(wait).await;
		}
	}

	async fn pace(&self, response: &UpstreamResponse) {
		let meta = response.metadata();
		let Some(remaining) = meta.rate_limit_remaining else { return };

		if remaining >= RATE_LIMIT_THRESHOLD {
			return;
		}

		let wait = meta.rate_limit_reset.unwrap_or(DEFAULT_RESET);

		tracing::info!(remaining, wait_secs = wait.as_secs_f64(), "Rate limit low; pacing.");
		self.sleeper.sleep(wait).await;
	}

	pub(crate) async fn get(&self, path: impl Into<String>, page: Option<Page>) -> Result<Value> {
		let mut request = UpstreamRequest::new(Method::GET, path);

		if let Some(page) = page {
			request = request.with_query("page", page.page).with_query("limit", page.limit);
		}

		self.request(request).await
	}

	pub(crate) async fn post(&self, path: impl Into<String>, body: Option<Value>) -> Result<Value> {
		let mut request = UpstreamRequest::new(Method::POST, path);

		if let Some(body) = body {
			request = request.with_body(body);
		}

		self.request(request).await
	}

	pub(crate) async fn put(&self, path: impl Into<String>, body: Value) -> Result<Value> {
		self.request(UpstreamRequest::new(Method::PUT, path).with_body(body)).await
	}

	pub(crate) async fn delete(&self, path: impl Into<String>) -> Result<Value> {
		self.request(UpstreamRequest::new(Method::DELETE, path)).await
	}
}
impl Debug for PrintifyClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PrintifyClient").field("shop_id", &self.shop_id).finish_non_exhaustive()
	}
}

/// Escapes a caller-supplied identifier so it stays a single path segment.
pub(crate) fn path_segment(raw: &str) -> Result<String> {
	// Dot segments would be normalized away by URL resolution, even when escaped.
	if raw.is_empty() || raw == "." || raw == ".." {
		return Err(Error::input_invalid(format!("Invalid identifier {raw:?}.")));
	}

	Ok(utf8_percent_encode(raw, PATH_SEGMENT).to_string())
}

fn decode_body(response: UpstreamResponse) -> Result<Value> {
	if response.status == 204 {
		return Ok(json!({}));
	}

	let mut deserializer = serde_json::Deserializer::from_slice(&response.body);

	serde_path_to_error::deserialize(&mut deserializer)
		.map_err(|source| Error::Decode { status: response.status, source })
}

fn default_page() -> u32 {
	DEFAULT_PAGE
}

fn default_limit() -> u32 {
	DEFAULT_LIMIT
}
