use std::sync::Arc;

use migration::{Migrator, MigratorTrait};
use settings::Database;

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "centime={level},server={level},engine={level},rates={level}",
            level = settings.app.level
        ))
        .init();

    let db = parse_database(&settings.server.database).await?;

    let engine = Arc::new(
        engine::Engine::builder()
            .database(db.clone())
            .build()
            .await?,
    );

    let registry = Arc::new(rates::RateDriverRegistry::new(&settings.currency)?);
    let aggregator = engine::TransactionAggregator::new(engine.clone(), registry);

    let (notifier, mut jobs) = engine::ChannelNotifier::channel();
    // Notification worker. Today it only records the job; a mail sender would
    // pick up the owner's email from the users table here.
    tokio::spawn(async move {
        while let Some(job) = jobs.recv().await {
            tracing::info!(
                owner = %job.owner_id,
                transaction = %job.transaction_id,
                amount = %job.amount,
                "transaction notification queued"
            );
        }
    });

    let service = Arc::new(engine::TransactionService::new(
        engine,
        aggregator,
        Arc::new(notifier),
    ));

    let bind = settings
        .server
        .bind
        .unwrap_or_else(|| "127.0.0.1".to_string());
    let addr = format!("{}:{}", bind, settings.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    server::run_with_listener(service, db, listener).await?;

    Ok(())
}

async fn parse_database(
    config: &Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let url = match config {
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
    };

    let database = sea_orm::Database::connect(url).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
