use clap::{Parser, Subcommand};
use config::{CommonConfig, Config, ConfigError};
use shared::env::Env;
use std::path::PathBuf;
use std::process::ExitCode;

mod config;
mod observability;

#[derive(Parser)]
#[command(name = "carbon", about = "Carbon credit marketplace services")]
struct Cli {
    /// YAML configuration file. Without it the component reads its
    /// settings from environment variables.
    #[arg(long)]
    config_file_path: Option<PathBuf>,

    #[command(subcommand)]
    component: Component,
}

#[derive(Subcommand, Clone, Copy, Debug)]
enum Component {
    /// Backend-for-frontend gateway
    Gateway,
    /// Projects and batches store
    Projects,
    /// Orders store
    Orders,
    /// Credit ingestion function
    Ingest,
    /// Payment receipt function
    Receipt,
}

enum ComponentConfig {
    Gateway(gateway::config::Config),
    Projects(projects::config::Config),
    Orders(orders::config::Config),
    Ingest(functions::config::IngestConfig),
    Receipt(functions::config::ReceiptConfig),
}

#[derive(thiserror::Error, Debug)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Observability(#[from] observability::ObservabilityError),
    #[error("could not start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("gateway failed: {0}")]
    Gateway(#[from] gateway::GatewayError),
    #[error("projects store failed: {0}")]
    Projects(#[from] projects::ProjectsError),
    #[error("orders store failed: {0}")]
    Orders(#[from] orders::OrdersError),
    #[error("function failed: {0}")]
    Function(#[from] functions::FunctionError),
}

fn load(cli: &Cli) -> Result<(CommonConfig, ComponentConfig), ConfigError> {
    let Some(path) = &cli.config_file_path else {
        let env = Env::process();
        let component = match cli.component {
            Component::Gateway => ComponentConfig::Gateway(gateway::config::Config::from_env(&env)?),
            Component::Projects => {
                ComponentConfig::Projects(projects::config::Config::from_env(&env)?)
            }
            Component::Orders => ComponentConfig::Orders(orders::config::Config::from_env(&env)?),
            Component::Ingest => {
                ComponentConfig::Ingest(functions::config::IngestConfig::from_env(&env)?)
            }
            Component::Receipt => {
                ComponentConfig::Receipt(functions::config::ReceiptConfig::from_env(&env)?)
            }
        };
        return Ok((CommonConfig::from_env(&env)?, component));
    };

    let config = Config::from_file(path)?;
    let component = match cli.component {
        Component::Gateway => config
            .gateway
            .map(ComponentConfig::Gateway)
            .ok_or(ConfigError::MissingSection("gateway"))?,
        Component::Projects => config
            .projects
            .map(ComponentConfig::Projects)
            .ok_or(ConfigError::MissingSection("projects"))?,
        Component::Orders => config
            .orders
            .map(ComponentConfig::Orders)
            .ok_or(ConfigError::MissingSection("orders"))?,
        Component::Ingest => config
            .ingest
            .map(ComponentConfig::Ingest)
            .ok_or(ConfigError::MissingSection("ingest"))?,
        Component::Receipt => config
            .receipt
            .map(ComponentConfig::Receipt)
            .ok_or(ConfigError::MissingSection("receipt"))?,
    };
    Ok((config.common, component))
}

async fn start(component: ComponentConfig) -> Result<(), CliError> {
    match component {
        ComponentConfig::Gateway(config) => gateway::run(config).await?,
        ComponentConfig::Projects(config) => projects::run(config).await?,
        ComponentConfig::Orders(config) => orders::run(config).await?,
        ComponentConfig::Ingest(config) => functions::run_ingest(config).await?,
        ComponentConfig::Receipt(config) => functions::run_receipt(config).await?,
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    let (common, component) = load(&cli)?;
    let _guard = observability::init(&common)?;
    tracing::info!(component = ?cli.component, "starting");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(start(component))?;

    tracing::info!(component = ?cli.component, "stopped");
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "exiting");
            eprintln!("carbon: {e}");
            ExitCode::FAILURE
        }
    }
}
