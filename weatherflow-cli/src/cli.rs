use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use inquire::{Password, Text};

use weatherflow_core::{Config, Pipeline, Region, Store};

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(name = "weatherflow", version, about = "Weather and tunnel-sensor ETL runner")]
pub struct Cli {
    /// Path to the configuration file; defaults to the platform config
    /// directory.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Store upstream credentials and the database URL.
    Configure,

    /// Create the per-region tables if they do not exist.
    InitSchema,

    /// Run pipeline stages for one region.
    Run {
        /// Region short name, "eindhoven" or "riga".
        region: String,

        /// Which stage to run.
        #[arg(long, value_enum, default_value = "all")]
        stage: Stage,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Stage {
    Weather,
    Tunnel,
    Historical,
    All,
}

impl Cli {
    pub async fn run(self) -> anyhow::Result<()> {
        match self.command {
            Command::Configure => configure(self.config.as_deref()),

            Command::InitSchema => {
                let config = load_config(self.config.as_deref())?;
                let store = Store::connect(&config.database).await?;
                store.ensure_schema().await?;
                println!("Schema is up to date.");
                Ok(())
            }

            Command::Run { region, stage } => {
                let region = Region::try_from(region.as_str())?;
                let config = load_config(self.config.as_deref())?;
                let pipeline = Pipeline::new(&config).await?;

                match stage {
                    Stage::Weather => pipeline.run_weather(region).await?,
                    Stage::Tunnel => pipeline.run_tunnel(region).await?,
                    Stage::Historical => pipeline.run_historical(region).await?,
                    Stage::All => pipeline.run_all(region).await?,
                }

                Ok(())
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let config = Config::load(path).context("Failed to load configuration")?;
    config.validate()?;
    Ok(config)
}

/// Interactive first-run setup: prompts for the secrets and writes the
/// config file. Endpoints and tuning knobs keep their defaults and can be
/// edited in the written TOML afterwards.
fn configure(path: Option<&Path>) -> anyhow::Result<()> {
    let mut config = Config::load(path).context("Failed to load configuration")?;

    let api_key = Password::new("Weather API key:")
        .without_confirmation()
        .prompt()
        .context("Failed to read API key")?;

    let database_url = Text::new("Postgres connection URL:")
        .with_initial_value(&config.database.url)
        .prompt()
        .context("Failed to read database URL")?;

    config.weather_api.api_key = api_key;
    config.database.url = database_url;

    let written = config.save(path)?;
    println!("Configuration written to {}", written.display());

    Ok(())
}
