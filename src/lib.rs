pub mod cli;
pub mod clients;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use state::SharedState;

/// Installs the global tracing subscriber. `RUST_LOG` wins over the config.
pub fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

pub async fn run(config: Config) -> anyhow::Result<()> {
    config.validate()?;
    init_tracing(&config);

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        return Ok(());
    };

    if matches!(command, Commands::Init) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists, leaving it untouched.");
        }
        return Ok(());
    }

    let state = SharedState::new(config)
        .await
        .context("Failed to initialise Construyo")?;
    info!("Construyo ready");

    match command {
        Commands::Search {
            postcode,
            authority,
            limit,
            webhook,
            json,
        } => {
            let (filter_type, value) = match (postcode, authority) {
                (Some(postcode), _) => (domain::FilterType::Postcode, postcode),
                (None, Some(authority)) => (domain::FilterType::LocalAuthority, authority),
                (None, None) => anyhow::bail!("Either --postcode or --authority is required"),
            };
            cli::cmd_search(&state, filter_type, &value, limit, webhook, json).await
        }

        Commands::History {
            value,
            filter_type,
            limit,
        } => cli::cmd_history(&state, filter_type.into(), &value.join(" "), limit).await,

        Commands::Prune { keep } => cli::cmd_prune(&state, keep).await,

        Commands::Init => Ok(()),
    }
}
