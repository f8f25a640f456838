//! Credential-guarded tool gateway for the Printify API: an in-memory OAuth token authority
//! guards the inbound edge while a retrying, rate-limit-aware client protects the outbound one.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

#[cfg(test)] use printify_gateway as _;

pub mod api;
pub mod auth;
pub mod authority;
pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod obs;
pub mod store;
pub mod tools;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports, fixtures, and test doubles for integration tests; enabled via
	//! `cfg(test)` or the `test` feature.

	pub use crate::_prelude::*;

	// std
	use std::collections::VecDeque;
	// self
	use crate::{
		api::{PrintifyClient, Sleeper, SleepFuture},
		auth::{ClientId, ClientInfo, ClientRegistration, ScopeSet},
		authority::{AuthorizationParams, Clock, TokenAuthority},
		error::TransportError,
		http::{TransportFuture, UpstreamRequest, UpstreamResponse, UpstreamTransport},
		store::MemoryStore,
	};

	/// Static bearer secret configured on authorities built by [`build_test_authority`].
	pub const TEST_STATIC_SECRET: &str = "static-secret";
	/// Client identifier registered by [`register_test_client`].
	pub const TEST_CLIENT_ID: &str = "test-client";
	/// Redirect URI registered by [`register_test_client`].
	pub const TEST_REDIRECT_URI: &str = "http://localhost:3000/callback";

	/// Clock whose instant only moves when a test advances it.
	#[derive(Debug)]
	pub struct ManualClock(Mutex<OffsetDateTime>);
	impl ManualClock {
		/// Creates a clock frozen at the provided instant.
		pub fn new(start: OffsetDateTime) -> Self {
			Self(Mutex::new(start))
		}

		/// Moves the clock forward.
		pub fn advance(&self, delta: Duration) {
			*self.0.lock() += delta;
		}
	}
	impl Clock for ManualClock {
		fn now(&self) -> OffsetDateTime {
			*self.0.lock()
		}
	}

	/// Sleeper that records every requested pause and returns immediately.
	#[derive(Clone, Debug, Default)]
	pub struct RecordingSleeper(Arc<Mutex<Vec<StdDuration>>>);
	impl RecordingSleeper {
		/// Durations requested so far, in call order.
		pub fn recorded(&self) -> Vec<StdDuration> {
			self.0.lock().clone()
		}
	}
	impl Sleeper for RecordingSleeper {
		fn sleep(&self, duration: StdDuration) -> SleepFuture<'_> {
			self.0.lock().push(duration);

			Box::pin(async {})
		}
	}

	/// Transport that replays canned responses in order and records the requests it saw.
	#[derive(Clone, Debug, Default)]
	pub struct ScriptedTransport {
		responses: Arc<Mutex<VecDeque<UpstreamResponse>>>,
		requests: Arc<Mutex<Vec<UpstreamRequest>>>,
	}
	impl ScriptedTransport {
		/// Creates a transport that will answer with `responses`, one per call.
		pub fn new(responses: impl IntoIterator<Item = UpstreamResponse>) -> Self {
			Self {
				responses: Arc::new(Mutex::new(responses.into_iter().collect())),
				requests: Default::default(),
			}
		}

		/// Requests dispatched so far.
		pub fn requests(&self) -> Vec<UpstreamRequest> {
			self.requests.lock().clone()
		}
	}
	impl UpstreamTransport for ScriptedTransport {
		fn send(&self, request: UpstreamRequest) -> TransportFuture<'_> {
			self.requests.lock().push(request);

			let next = self.responses.lock().pop_front();

			Box::pin(async move {
				next.ok_or_else(|| TransportError::network(std::io::Error::other("script exhausted")))
			})
		}
	}

	/// Builds an upstream response with a JSON body and optional extra headers.
	pub fn json_response(status: u16, body: Value, headers: &[(&str, &str)]) -> UpstreamResponse {
		let mut response = UpstreamResponse::new(status, body.to_string().into_bytes());

		response.insert_header("content-type", "application/json");

		for (name, value) in headers {
			response.insert_header(name, value);
		}

		response
	}

	/// Builds a [`PrintifyClient`] over a scripted transport with a recording sleeper.
	pub fn build_scripted_client(
		transport: ScriptedTransport,
		shop_id: Option<&str>,
	) -> (PrintifyClient, RecordingSleeper) {
		let sleeper = RecordingSleeper::default();
		let client = PrintifyClient::with_transport(Arc::new(transport), shop_id.map(Into::into))
			.with_sleeper(Arc::new(sleeper.clone()));

		(client, sleeper)
	}

	/// Builds an authority over a fresh [`MemoryStore`], a [`ManualClock`], and the
	/// [`TEST_STATIC_SECRET`] fallback.
	pub fn build_test_authority() -> (TokenAuthority, Arc<ManualClock>) {
		let clock = Arc::new(ManualClock::new(OffsetDateTime::now_utc()));
		let authority = TokenAuthority::new(Arc::new(MemoryStore::default()))
			.with_static_secret(TEST_STATIC_SECRET)
			.with_clock(clock.clone());

		(authority, clock)
	}

	/// Registers the fixture client used across authority tests.
	pub async fn register_test_client(authority: &TokenAuthority) -> ClientInfo {
		let registration = ClientRegistration::new(vec![url(TEST_REDIRECT_URI)])
			.with_client_id(ClientId::new(TEST_CLIENT_ID).expect("Fixture client id should be valid."))
			.with_grant_types(["authorization_code", "refresh_token"])
			.with_token_endpoint_auth_method("none");

		authority.register_client(registration).await
	}

	/// Authorization parameters matching [`register_test_client`].
	pub fn test_authorization_params(scopes: &[&str]) -> AuthorizationParams {
		AuthorizationParams::new(
			url(TEST_REDIRECT_URI),
			ScopeSet::new(scopes.iter().copied()).expect("Fixture scopes should be valid."),
			"challenge123",
		)
		.with_state("test-state")
	}

	/// Extracts the `code` query parameter from a redirect target.
	pub fn code_from_redirect(redirect: &Url) -> String {
		redirect
			.query_pairs()
			.find(|(key, _)| key == "code")
			.map(|(_, value)| value.into_owned())
			.expect("Redirect target should carry a code parameter.")
	}

	/// Parses a fixture URL.
	pub fn url(value: &str) -> Url {
		Url::parse(value).expect("Fixture URL should parse.")
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::{Mutex, RwLock};
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Value, json};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use url;
#[cfg(test)] use {http_body_util as _, httpmock as _, tower as _};
