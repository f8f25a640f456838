//! Observability helpers shared by the token authority and the upstream client.
//!
//! # Feature Flags
//!
//! - Spans named `printify_gateway.operation` carry the `operation` and `stage` fields and are
//!   always emitted through `tracing`.
//! - Enable `metrics` to increment the `printify_gateway_operation_total` counter for every
//!   attempt/success/failure, labeled by `operation` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Operations observed by the gateway.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Dynamic client registration.
	RegisterClient,
	/// Authorization code issuance.
	Authorize,
	/// Authorization code exchange.
	ExchangeCode,
	/// Refresh token rotation.
	ExchangeRefresh,
	/// Bearer verification (issued tokens and the static fallback).
	VerifyAccess,
	/// Token revocation.
	Revoke,
	/// Outbound call against the upstream API.
	UpstreamRequest,
	/// Tool invocation through the dispatcher.
	ToolCall,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::RegisterClient => "register_client",
			Operation::Authorize => "authorize",
			Operation::ExchangeCode => "exchange_code",
			Operation::ExchangeRefresh => "exchange_refresh",
			Operation::VerifyAccess => "verify_access",
			Operation::Revoke => "revoke",
			Operation::UpstreamRequest => "upstream_request",
			Operation::ToolCall => "tool_call",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to an operation.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure or negative lookup returned to the caller.
	Failure,
	/// Upstream throttled the call and a retry was scheduled.
	Throttled,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Failure => "failure",
			Outcome::Throttled => "throttled",
		}
	}

	/// Maps a lookup result onto success/failure.
	pub const fn of_presence(found: bool) -> Self {
		if found { Outcome::Success } else { Outcome::Failure }
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
