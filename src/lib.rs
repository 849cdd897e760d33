pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod models;
pub mod session;
pub mod store;

use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
use clients::SupabaseClient;
pub use config::Config;
use session::Session;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("No command given. Try 'oppboard --help'.");
        return Ok(());
    };

    let store = Arc::new(SupabaseClient::new(&config.store)?);
    let session = Session::new(store, &config);
    session.initialize().await;

    match command {
        Commands::Init => {
            if Config::create_default_if_missing()? {
                println!("✓ Config file created. Edit config.toml and run again.");
            } else {
                println!("Config file already exists.");
            }
            Ok(())
        }

        Commands::Featured => cli::commands::cmd_featured(&session).await,

        Commands::Search {
            keyword,
            location,
            field,
            opportunity_type,
            page,
        } => {
            cli::commands::cmd_search(&session, &keyword, location, field, opportunity_type, page)
                .await
        }

        Commands::Show { id } => cli::commands::cmd_show(&session, &id).await,

        Commands::Signup => cli::commands::cmd_signup(&session).await,

        Commands::Login => cli::commands::cmd_login(&session).await,

        Commands::Post { file } => cli::commands::cmd_post(&session, &file).await,

        Commands::Apply { opportunity_id, cv } => {
            cli::commands::cmd_apply(&session, &opportunity_id, cv.as_deref()).await
        }
    }
}
