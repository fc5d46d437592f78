use clap::Parser;
use medley::cli::{self, Cli, Commands};
use medley::error::Result;
use medley::logging::{init_logging, init_logging_simple};
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match &cli.command {
        Some(Commands::Config) => {
            init_logging_simple();
            let loaded = cli::load_config(&cli.config);
            loaded.report_fallback(&cli.config);
            cli::print_config(&loaded.config)?;
        }
        Some(Commands::Demo {
            placements,
            fail_init,
            fill_rate,
            timeout,
        }) => {
            let loaded = cli::load_config(&cli.config);
            init_logging(&loaded.config.logging)?;
            loaded.report_fallback(&cli.config);
            let mut config = loaded.config;

            config.simulation.init_fails |= *fail_init;
            if let Some(rate) = fill_rate {
                config.simulation.fill_rate = *rate;
            }

            info!(
                "starting demo for network {} with {} rewarded placements",
                config.network.name, placements
            );
            cli::run_demo(&config, *placements, Duration::from_secs(*timeout)).await?;
        }
        None => {
            init_logging_simple();
            let loaded = cli::load_config(&cli.config);
            loaded.report_fallback(&cli.config);
            cli::run_demo(&loaded.config, 1, Duration::from_secs(5)).await?;
        }
    }

    Ok(())
}
