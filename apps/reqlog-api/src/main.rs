use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = reqlog_api::Args::parse();

	reqlog_api::run(args).await
}
