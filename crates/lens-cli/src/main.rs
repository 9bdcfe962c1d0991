//! Command-line interface and web dashboard for KRX stock prices

mod lookup;
mod server;
mod templates;

use clap::{Args, Parser, Subcommand};
use lens_stock::{Dashboard, PriceAxisPolicy, PriceProvider, StockConfig};
use lens_utils::LogFormat;
use std::net::SocketAddr;
use std::process::ExitCode;
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "krx-lens", version)]
#[command(about = "Look up and chart KRX daily stock prices", long_about = None)]
struct Cli {
    /// Log output format (pretty or json)
    #[arg(long, global = true)]
    log_format: Option<LogFormat>,

    /// Price history provider (naver or yahoo)
    #[arg(long, global = true)]
    provider: Option<PriceProvider>,

    /// Price axis behavior while zooming the chart (fixed or autorange)
    #[arg(long, global = true)]
    price_axis: Option<PriceAxisPolicy>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Look up one company and print its summary and recent rows
    Lookup(lookup::LookupArgs),
    /// Serve the interactive dashboard
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address (defaults to LENS_BIND or 127.0.0.1:8501)
    #[arg(long)]
    bind: Option<SocketAddr>,
}

fn stock_config(cli: &Cli) -> anyhow::Result<StockConfig> {
    let mut builder = StockConfig::builder().with_env()?;
    if let Some(provider) = cli.provider {
        builder = builder.price_provider(provider);
    }
    if let Some(policy) = cli.price_axis {
        builder = builder.price_axis(policy);
    }
    Ok(builder.build()?)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let mut config = lens_utils::Config::from_env()?;
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    lens_utils::init_tracing(config.log_format);

    let stock_config = stock_config(&cli)?;
    let dashboard = Dashboard::new(&stock_config)?;
    info!(
        "Starting {} ({}, provider {:?})",
        config.app_name, config.environment, stock_config.price_provider
    );

    match cli.command {
        Command::Lookup(args) => lookup::run(args, dashboard).await,
        Command::Serve(args) => {
            let addr = args.bind.unwrap_or(config.bind);
            let state = server::AppState::new(dashboard)?;
            server::serve(addr, state).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
