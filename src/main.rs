use std::{process, sync::Arc};

use touchline::{
    application::{error::AppError, repos::CacheEntriesRepo, sports::SportsData},
    cache::{CacheOrchestrator, CacheStore, FreshnessPolicy},
    config::{self, GetArgs, MonthArgs},
    domain::{keys::CacheKey, season::Season},
    infra::{
        api_sports::ApiSportsClient, db::PostgresRepositories, error::InfraError,
        memory::InMemoryCacheEntries, telemetry,
    },
    util::clock::SystemClock,
};
use tracing::{Dispatch, Level, dispatcher, error, info, warn};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()
        .map_err(|err| AppError::unexpected(format!("failed to load configuration: {err}")))?;

    telemetry::init(&settings.logging).map_err(AppError::from)?;

    match cli_args.command {
        config::Command::Migrate(_) => run_migrate(&settings).await,
        config::Command::Get(args) => run_get(&settings, args).await,
        config::Command::Month(args) => run_month(&settings, args).await,
    }
}

async fn run_migrate(settings: &config::Settings) -> Result<(), AppError> {
    let url = settings
        .database
        .url
        .as_deref()
        .ok_or_else(|| AppError::validation("database.url is required to run migrations"))?;

    let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;
    PostgresRepositories::run_migrations(&pool)
        .await
        .map_err(|err| InfraError::database(err.to_string()))?;

    info!("Migrations applied");
    Ok(())
}

async fn run_get(settings: &config::Settings, args: GetArgs) -> Result<(), AppError> {
    let key = CacheKey::new(args.subject, args.data_type, args.season.map(Season::new))?;
    let sports = build_sports_data(settings).await?;

    let fetched = sports.begin_request().get(key).await;
    let data = match fetched.data {
        Some(data) if fetched.success => data,
        _ => return Err(AppError::unexpected(format!("no data available for {key}"))),
    };
    if fetched.stale {
        warn!(%key, "Upstream unavailable; printing the last stored payload");
    }

    let rendered = serde_json::to_string_pretty(data.as_ref())
        .map_err(|err| AppError::unexpected(format!("failed to render payload: {err}")))?;
    println!("{rendered}");
    Ok(())
}

async fn run_month(settings: &config::Settings, args: MonthArgs) -> Result<(), AppError> {
    let sports = build_sports_data(settings).await?;

    let calendar = sports
        .begin_request()
        .days_with_matches(args.year, args.month)
        .await?;

    for day in &calendar.days {
        println!("{day}");
    }
    info!(
        batches = calendar.report.batches,
        pauses = calendar.report.pauses,
        failures = calendar.report.failures,
        "Month scan complete"
    );
    Ok(())
}

async fn build_sports_data(settings: &config::Settings) -> Result<SportsData, AppError> {
    let repo: Arc<dyn CacheEntriesRepo> = match settings.database.url.as_deref() {
        Some(url) => {
            let pool = PostgresRepositories::connect(url, settings.database.max_connections.get())
                .await
                .map_err(|err| InfraError::database(err.to_string()))?;
            let repos = PostgresRepositories::new(pool);
            repos
                .health_check()
                .await
                .map_err(|err| InfraError::database(format!("database health check failed: {err}")))?;
            Arc::new(repos)
        }
        None => {
            warn!("No database configured; cached payloads live only for this run");
            Arc::new(InMemoryCacheEntries::new())
        }
    };

    if settings.upstream.api_key.is_empty() {
        warn!("upstream.api_key is empty; upstream calls will be rejected");
    }
    let upstream = Arc::new(ApiSportsClient::new(&settings.upstream)?);

    let policy = FreshnessPolicy::new(settings.cache.clone(), settings.upstream.timezone);
    let orchestrator = CacheOrchestrator::new(
        CacheStore::new(repo, policy),
        upstream,
        Arc::new(SystemClock),
    );

    Ok(SportsData::new(Arc::new(orchestrator), &settings.cache))
}
