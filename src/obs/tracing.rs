// crates.io
use tracing::{Span, instrument::Instrumented};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};
// self
use crate::{_prelude::*, obs::Operation};

/// Installs the global `tracing` subscriber.
///
/// Filtering follows `RUST_LOG` and falls back to `info`. Output goes to stderr so the stdio
/// transport keeps stdout for protocol frames.
pub fn init_tracing() {
	let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

	// A second initialization (tests, embedding) keeps the first subscriber.
	let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}

/// A span builder used by gateway operations.
#[derive(Clone, Debug)]
pub struct OperationSpan(Span);
impl OperationSpan {
	/// Creates a new span tagged with the provided operation + stage.
	pub fn new(operation: Operation, stage: &'static str) -> Self {
		Self(tracing::info_span!("printify_gateway.operation", operation = operation.as_str(), stage))
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.0.clone())
	}
}
