//! Command Handlers
//!
//! Local commands open the engine over the configured SQLite database; the
//! rest go through the SaaS API client.

use crate::client::{ApiClientConfig, VortexApiClient};
use crate::commands::{
    analytics::AnalyticsCommands, compute::ComputeCommands, Cli, Commands, OutputFormat,
};
use crate::error::{CliError, CliResult};
use crate::output;
use rust_decimal::Decimal;
use serde_json::{json, Value};
use std::sync::Arc;
use vortex_api::{ApiConfig, AppState, AuthConfig};
use vortex_core::UserId;
use vortex_engine::{EngineConfig, VortexEngine};

/// Run the CLI with parsed arguments
pub async fn run(cli: Cli) -> CliResult<()> {
    if cli.command.is_local() {
        let config = engine_config(&cli)?;
        return match cli.command {
            Commands::Init => handle_init(config).await,
            Commands::Start { host, port } => handle_start(config, host, port).await,
            Commands::Balance { user } => handle_balance(config, user, cli.format).await,
            Commands::Award {
                user,
                points,
                reason,
            } => handle_award(config, user, points, &reason, cli.format).await,
            Commands::Maintenance { analytics_days } => {
                handle_maintenance(config, analytics_days, cli.format).await
            }
            other => Err(CliError::invalid_arg(format!(
                "{other:?} is not a local command"
            ))),
        };
    }

    let client = VortexApiClient::new(ApiClientConfig::new(&cli.api_url, cli.api_key.clone()))?;
    let format = cli.format;
    match cli.command {
        Commands::Health => handle_health(&client, format).await,
        Commands::Predictions { asset, category } => {
            handle_predictions(&client, asset, category, format).await
        }
        Commands::Analytics(cmd) => handle_analytics(&client, cmd, format).await,
        Commands::Compute(cmd) => handle_compute(&client, cmd, format).await,
        other => Err(CliError::invalid_arg(format!(
            "{other:?} requires the local database"
        ))),
    }
}

/// Engine configuration from the environment, with `--db-path` applied
fn engine_config(cli: &Cli) -> CliResult<EngineConfig> {
    let mut config = EngineConfig::from_env()?;
    if let Some(path) = &cli.db_path {
        if path.trim().is_empty() {
            return Err(CliError::config("--db-path must not be empty"));
        }
        config.database.path = path.clone();
    }
    Ok(config)
}

async fn open_engine(config: EngineConfig) -> CliResult<VortexEngine> {
    Ok(VortexEngine::bootstrap(config).await?)
}

/// Handle database initialization
async fn handle_init(config: EngineConfig) -> CliResult<()> {
    println!("Initializing VORTEX database...");
    println!("  Path:   {}", config.database.path);
    println!("  Prefix: {}", config.database.table_prefix);

    open_engine(config).await?;

    println!("Database schema initialized successfully.");
    Ok(())
}

/// Handle starting the API server
async fn handle_start(config: EngineConfig, host: String, port: u16) -> CliResult<()> {
    println!("Starting VORTEX API server...");
    println!("  Listen:   {}:{}", host, port);
    println!("  Database: {}", config.database.path);

    let engine = open_engine(config).await?;
    let api_config = ApiConfig::from_env().with_listen_addr(format!("{host}:{port}"));
    let auth = AuthConfig::from_env();
    if auth.api_keys.is_empty() {
        tracing::warn!("VORTEX_API_KEYS not set; SaaS endpoints will reject every request");
    }

    let state = AppState::with_config(api_config, Arc::new(engine)).with_auth(auth);
    vortex_api::start_server(state).await?;
    Ok(())
}

async fn handle_balance(config: EngineConfig, user: u64, format: OutputFormat) -> CliResult<()> {
    let engine = open_engine(config).await?;
    let balance = engine.wallets.get_user_tola_balance(UserId(user)).await?;
    output::print_balance(user, balance, format);
    Ok(())
}

async fn handle_award(
    config: EngineConfig,
    user: u64,
    points: Decimal,
    reason: &str,
    format: OutputFormat,
) -> CliResult<()> {
    if points <= Decimal::ZERO {
        return Err(CliError::invalid_arg("points must be greater than zero"));
    }
    if reason.trim().is_empty() {
        return Err(CliError::invalid_arg("reason must not be empty"));
    }

    let engine = open_engine(config).await?;
    let entry = engine
        .transactions
        .award_points(UserId(user), points, reason.trim())
        .await?;
    let balance = engine.wallets.get_user_tola_balance(UserId(user)).await?;

    match format {
        OutputFormat::Json => output::print_output(
            &json!({ "entry": entry, "balance": balance.to_string() }),
            format,
        ),
        OutputFormat::Table | OutputFormat::Plain => {
            println!("Awarded {} TOLA to user {} ({})", entry.points, user, entry.reason);
            output::print_balance(user, balance, format);
        }
    }
    Ok(())
}

async fn handle_maintenance(
    config: EngineConfig,
    analytics_days: Option<u32>,
    format: OutputFormat,
) -> CliResult<()> {
    let engine = open_engine(config).await?;
    let report = engine.run_maintenance(analytics_days).await?;
    output::print_maintenance(&report, format);
    Ok(())
}

/// Handle health check
async fn handle_health(client: &VortexApiClient, format: OutputFormat) -> CliResult<()> {
    let response = client.health().await?;
    output::print_health(&response, format);
    Ok(())
}

async fn handle_predictions(
    client: &VortexApiClient,
    asset: Option<String>,
    category: Option<String>,
    format: OutputFormat,
) -> CliResult<()> {
    let response = match asset {
        Some(asset) => client.asset_prediction(&asset).await?,
        None => {
            let params = category.map(|c| json!({ "category": c }));
            client.market_predictions(params.as_ref()).await?
        }
    };
    output::print_data(&response, format);
    Ok(())
}

async fn handle_analytics(
    client: &VortexApiClient,
    cmd: AnalyticsCommands,
    format: OutputFormat,
) -> CliResult<()> {
    let response = match cmd {
        AnalyticsCommands::Overview { start, end } => client.market_overview(start, end).await?,
        AnalyticsCommands::Artist { id, start, end } => {
            client.artist_performance(&id, start, end).await?
        }
        AnalyticsCommands::Sales {
            start,
            end,
            group_by,
        } => client.sales_metrics(start, end, &group_by).await?,
    };
    output::print_data(&response, format);
    Ok(())
}

async fn handle_compute(
    client: &VortexApiClient,
    cmd: ComputeCommands,
    format: OutputFormat,
) -> CliResult<()> {
    let response = match cmd {
        ComputeCommands::Analyze { data } => client.analyze_artwork(&parse_object(&data)?).await?,
        ComputeCommands::Strategy { data } => {
            client.business_strategy(&parse_object(&data)?).await?
        }
    };
    output::print_data(&response, format);
    Ok(())
}

/// `--data` must be a JSON object
fn parse_object(raw: &str) -> CliResult<Value> {
    match serde_json::from_str::<Value>(raw)? {
        value @ Value::Object(_) => Ok(value),
        _ => Err(CliError::invalid_arg("--data must be a JSON object")),
    }
}
