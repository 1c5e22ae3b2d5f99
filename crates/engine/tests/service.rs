use std::sync::Arc;

use sea_orm::{ConnectionTrait, Database, Statement};

use engine::{
    ChannelNotifier, DateRange, Engine, MoneyCents, TransactionAggregator, TransactionError,
    TransactionKind, TransactionService,
};
use migration::MigratorTrait;
use rates::{DriverConfig, RateDriverRegistry};
use tokio::sync::mpsc;
use uuid::Uuid;

// Points at a closed port so every source degrades to its built-in table;
// the averaged EUR_USD rate comes out to exactly 1.09.
fn offline_registry() -> Arc<RateDriverRegistry> {
    let config = DriverConfig {
        feed_base_url: "http://127.0.0.1:9".to_string(),
        ..Default::default()
    };
    Arc::new(RateDriverRegistry::new(&config).unwrap())
}

async fn service_with_queue() -> (
    TransactionService,
    mpsc::UnboundedReceiver<engine::NotificationJob>,
) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    db.execute(Statement::from_sql_and_values(
        backend,
        "INSERT INTO users (username, password, email) VALUES (?, ?, ?)",
        vec!["alice".into(), "password".into(), "alice@example.com".into()],
    ))
    .await
    .unwrap();

    let engine = Arc::new(Engine::builder().database(db).build().await.unwrap());
    let aggregator = TransactionAggregator::new(engine.clone(), offline_registry());
    let (notifier, jobs) = ChannelNotifier::channel();
    let service = TransactionService::new(engine, aggregator, Arc::new(notifier));
    (service, jobs)
}

#[tokio::test]
async fn create_emits_event_and_notification() {
    let (service, mut jobs) = service_with_queue().await;
    let mut events = service.subscribe();

    let tx = service
        .create("alice", Some("Salary".to_string()), MoneyCents::new(5000))
        .await
        .unwrap();
    assert_eq!(tx.kind(), TransactionKind::Income);

    let event = events.recv().await.unwrap();
    assert_eq!(event.transaction.id, tx.id);

    let job = jobs.recv().await.unwrap();
    assert_eq!(job.owner_id, "alice");
    assert_eq!(job.transaction_id, tx.id);
    assert_eq!(job.amount, MoneyCents::new(5000));
}

#[tokio::test]
async fn create_survives_closed_queue() {
    let (service, jobs) = service_with_queue().await;
    drop(jobs);

    service
        .create("alice", None, MoneyCents::new(100))
        .await
        .unwrap();
}

#[tokio::test]
async fn delete_reports_not_found() {
    let (service, _jobs) = service_with_queue().await;

    let err = service.delete("alice", Uuid::new_v4()).await.unwrap_err();
    assert!(matches!(err, TransactionError::NotFound(_)));
}

#[tokio::test]
async fn balance_converts_via_averaged_fallbacks() {
    let (service, _jobs) = service_with_queue().await;

    service
        .create("alice", Some("Salary".to_string()), MoneyCents::new(5000))
        .await
        .unwrap();
    service
        .create("alice", Some("Rent".to_string()), MoneyCents::new(-2000))
        .await
        .unwrap();

    let balance = service.balance("alice").await.unwrap();
    assert_eq!(balance.eur, MoneyCents::new(3000));
    // 30.00 EUR * 1.09 = 32.70 USD
    assert_eq!(balance.usd, MoneyCents::new(3270));
}

#[tokio::test]
async fn converted_summary_keeps_integer_invariant() {
    let (service, _jobs) = service_with_queue().await;

    service
        .create("alice", None, MoneyCents::new(5000))
        .await
        .unwrap();
    service
        .create("alice", None, MoneyCents::new(-2000))
        .await
        .unwrap();

    let summary = service
        .summary_with_conversion("alice", DateRange::default())
        .await
        .unwrap();
    assert_eq!(summary.total_income.eur, MoneyCents::new(5000));
    assert_eq!(summary.total_expense.eur, MoneyCents::new(2000));
    assert_eq!(summary.total.eur, MoneyCents::new(3000));
    assert_eq!(summary.count, 2);

    // EUR figures never pass through floats.
    assert_eq!(
        summary.total_income.eur - summary.total_expense.eur,
        summary.total.eur
    );

    let balance = service.balance("alice").await.unwrap();
    assert_eq!(summary.total.eur, balance.eur);
}
