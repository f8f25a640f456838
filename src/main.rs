//! Printify gateway binary.

// crates.io
use tokio::net::TcpListener;
// self
use printify_gateway::{
	config::{Settings, Transport},
	error::Result,
	gateway::{self, rpc::{self, Dispatcher}},
	obs,
	tools::ToolRegistry,
};

#[tokio::main]
async fn main() -> Result<()> {
	let settings = Settings::load();

	obs::init_tracing();

	let tools = ToolRegistry::new(settings.build_client()?);

	match settings.transport {
		Transport::Stdio => rpc::serve_stdio(Dispatcher::new(tools)).await,
		Transport::StreamableHttp => {
			let mode = settings.auth_mode()?;

			mode.announce();

			let listener = TcpListener::bind(settings.listen_addr()).await?;

			gateway::serve(listener, gateway::router(tools, &mode)).await
		},
	}
}
