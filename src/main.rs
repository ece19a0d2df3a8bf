use clap::Parser;
use gcodelink::init_logging;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    // Initialize logging
    init_logging()?;
    tracing::debug!("gcodelink {} (built {})", gcodelink::VERSION, gcodelink::BUILD_DATE);
    cli::log_events();

    cli::run(args).await
}
