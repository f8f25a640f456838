//! Runtime settings read from flags, the environment, and an optional `.env` file.

// std
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
// crates.io
use clap::{Parser, ValueEnum};
// self
use crate::{
	_prelude::*,
	api::PrintifyClient,
	error::ConfigError,
	gateway::AuthMode,
	http::DEFAULT_BASE_URL,
};

/// How the gateway talks to its caller.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Transport {
	/// JSON-RPC over HTTP at `POST /mcp`.
	#[default]
	StreamableHttp,
	/// Newline-delimited JSON-RPC on stdin/stdout.
	Stdio,
}

/// Gateway settings.
#[derive(Clone, Parser)]
#[command(name = "printify-gateway", version, about = "Printify tool gateway")]
pub struct Settings {
	/// Upstream API key.
	#[arg(long, env = "PRINTIFY_API_KEY", hide_env_values = true)]
	pub printify_api_key: String,
	/// Default shop for shop-scoped operations.
	#[arg(long, env = "PRINTIFY_SHOP_ID")]
	pub printify_shop_id: Option<String>,
	/// Static bearer secret accepted on the tool endpoint.
	#[arg(long, env = "MCP_AUTH_TOKEN", hide_env_values = true)]
	pub mcp_auth_token: Option<String>,
	/// Public issuer URL; enables the OAuth endpoints when set.
	#[arg(long, env = "OAUTH_ISSUER_URL")]
	pub oauth_issuer_url: Option<String>,
	/// Listen address.
	#[arg(long, env = "HOST", default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
	pub host: IpAddr,
	/// Listen port.
	#[arg(long, env = "PORT", default_value_t = 8080)]
	pub port: u16,
	/// Caller-facing transport.
	#[arg(long, env = "TRANSPORT", value_enum, default_value_t = Transport::StreamableHttp)]
	pub transport: Transport,
	/// Upstream base URL.
	#[arg(long, env = "PRINTIFY_BASE_URL", default_value = DEFAULT_BASE_URL)]
	pub printify_base_url: String,
	/// Per-attempt upstream timeout in seconds.
	#[arg(long, env = "UPSTREAM_TIMEOUT_SECS", default_value_t = 30)]
	pub upstream_timeout_secs: u64,
}
impl Settings {
	/// Loads `.env` (when present) and parses flags and environment.
	pub fn load() -> Self {
		// A missing `.env` is normal in deployed environments.
		let _ = dotenvy::dotenv();

		Self::parse()
	}

	/// Socket address the HTTP transport binds.
	pub fn listen_addr(&self) -> SocketAddr {
		SocketAddr::new(self.host, self.port)
	}

	/// Validated upstream base URL.
	pub fn base_url(&self) -> Result<Url, ConfigError> {
		parse_http_url("PRINTIFY_BASE_URL", &self.printify_base_url)
	}

	/// Validated issuer URL, or `None` when OAuth is disabled.
	pub fn issuer_url(&self) -> Result<Option<Url>, ConfigError> {
		non_empty(&self.oauth_issuer_url)
			.map(|raw| parse_http_url("OAUTH_ISSUER_URL", raw))
			.transpose()
	}

	/// Per-attempt upstream timeout.
	pub fn upstream_timeout(&self) -> StdDuration {
		StdDuration::from_secs(self.upstream_timeout_secs)
	}

	/// Builds the upstream client.
	pub fn build_client(&self) -> Result<PrintifyClient, ConfigError> {
		PrintifyClient::new(
			&self.printify_api_key,
			non_empty(&self.printify_shop_id).map(ToOwned::to_owned),
			self.base_url()?,
			self.upstream_timeout(),
		)
	}

	/// Picks the authentication mode for the tool endpoint.
	pub fn auth_mode(&self) -> Result<AuthMode, ConfigError> {
		Ok(AuthMode::from_settings(self.issuer_url()?, non_empty(&self.mcp_auth_token)))
	}
}
impl Debug for Settings {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Settings")
			.field("printify_api_key", &"<redacted>")
			.field("printify_shop_id", &self.printify_shop_id)
			.field("mcp_auth_token", &self.mcp_auth_token.as_ref().map(|_| "<redacted>"))
			.field("oauth_issuer_url", &self.oauth_issuer_url)
			.field("host", &self.host)
			.field("port", &self.port)
			.field("transport", &self.transport)
			.field("printify_base_url", &self.printify_base_url)
			.field("upstream_timeout_secs", &self.upstream_timeout_secs)
			.finish()
	}
}

fn non_empty(value: &Option<String>) -> Option<&str> {
	value.as_deref().map(str::trim).filter(|value| !value.is_empty())
}

fn parse_http_url(name: &'static str, raw: &str) -> Result<Url, ConfigError> {
	let invalid = || ConfigError::InvalidUrl { name, value: raw.to_owned() };
	let url = Url::parse(raw).map_err(|_| invalid())?;

	if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
		return Err(invalid());
	}

	Ok(url)
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn parse(args: &[&str]) -> Settings {
		Settings::try_parse_from(
			["printify-gateway", "--printify-api-key", "key"].iter().chain(args.iter()),
		)
		.expect("Fixture arguments should parse.")
	}

	#[test]
	fn flags_override_defaults() {
		let settings = parse(&[
			"--transport",
			"stdio",
			"--port",
			"9000",
			"--oauth-issuer-url",
			"https://gw.example",
			"--printify-base-url",
			"http://127.0.0.1:9999",
		]);

		assert_eq!(settings.transport, Transport::Stdio);
		assert_eq!(settings.listen_addr().port(), 9000);
		assert_eq!(
			settings.issuer_url().expect("Issuer should validate.").map(String::from),
			Some("https://gw.example/".to_owned())
		);
		assert!(matches!(settings.auth_mode(), Ok(AuthMode::OAuth { .. })));
	}

	#[test]
	fn rejects_non_http_urls() {
		let settings = parse(&["--oauth-issuer-url", "mailto:ops@example.com"]);

		assert!(matches!(
			settings.issuer_url(),
			Err(ConfigError::InvalidUrl { name: "OAUTH_ISSUER_URL", .. })
		));
	}

	#[test]
	fn blank_optionals_count_as_unset() {
		let mut settings = parse(&[]);

		settings.oauth_issuer_url = Some("  ".into());
		settings.mcp_auth_token = Some(String::new());

		assert!(settings.issuer_url().expect("Blank issuer is unset.").is_none());
		assert!(matches!(settings.auth_mode(), Ok(AuthMode::Open)));
	}

	#[test]
	fn debug_redacts_secrets() {
		let mut settings = parse(&[]);

		settings.mcp_auth_token = Some("very-secret".into());

		let rendered = format!("{settings:?}");

		assert!(!rendered.contains("very-secret"));
		assert!(!rendered.contains("\"key\""));
	}
}
