pub mod routes;
pub mod state;

use std::{future::IntoFuture, net::SocketAddr};

use clap::Parser;
use color_eyre::eyre;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use reqlog_cli::ConfigArgs;

use crate::state::AppState;

#[derive(Debug, Parser)]
#[command(
	version = reqlog_cli::VERSION,
	rename_all = "kebab",
	styles = reqlog_cli::styles(),
)]
pub struct Args {
	#[command(flatten)]
	pub config: ConfigArgs,
}

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let mut config = reqlog_config::load(&args.config.config)?;

	if let Some(log_level) = args.config.log_level {
		config.service.log_level = log_level;
	}

	init_tracing(&config)?;

	let (http_addr, admin_addr) = bind_addrs(&config.service)?;
	let state = AppState::new(config)?;
	let app = routes::router(state.clone());
	let admin_app = routes::admin_router(state.clone());
	let http_listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, "HTTP server listening.");

	let http_server =
		axum::serve(http_listener, app).with_graceful_shutdown(state.service.stopped());
	let admin_listener = TcpListener::bind(admin_addr).await?;

	tracing::info!(%admin_addr, "Admin server listening.");

	let admin_server =
		axum::serve(admin_listener, admin_app).with_graceful_shutdown(state.service.stopped());

	tokio::spawn(shutdown_on_ctrl_c(state));
	tokio::try_join!(http_server.into_future(), admin_server.into_future())?;

	Ok(())
}

/// Cancels in-flight enrichment and stops both servers on Ctrl-C.
async fn shutdown_on_ctrl_c(state: AppState) {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "Failed to listen for the shutdown signal.");

		return;
	}

	tracing::info!("Shutdown signal received.");

	state.service.shutdown();
}

/// Parses both binds; the admin surface is only ever served on loopback.
pub fn bind_addrs(
	service: &reqlog_config::Service,
) -> color_eyre::Result<(SocketAddr, SocketAddr)> {
	let http_addr: SocketAddr = service.http_bind.parse()?;
	let admin_addr: SocketAddr = service.admin_bind.parse()?;

	if !admin_addr.ip().is_loopback() {
		return Err(eyre::eyre!("admin_bind must be a loopback address."));
	}

	Ok((http_addr, admin_addr))
}

fn init_tracing(config: &reqlog_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}
