use chrono::{TimeDelta, Utc};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{
    DateRange, Engine, EngineError, MoneyCents, PageRequest, Sort, SortDirection, SortField,
    TransactionFilter, TransactionKind,
};
use migration::MigratorTrait;
use uuid::Uuid;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let backend = db.get_database_backend();
    for (username, email) in [("alice", "alice@example.com"), ("bob", "bob@example.com")] {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO users (username, password, email) VALUES (?, ?, ?)",
            vec![username.into(), "password".into(), email.into()],
        ))
        .await
        .unwrap();
    }
    let engine = Engine::builder()
        .database(db.clone())
        .build()
        .await
        .unwrap();
    (engine, db)
}

#[tokio::test]
async fn create_derives_kind_from_amount_sign() {
    let (engine, _db) = engine_with_db().await;

    let salary = engine
        .create_transaction("alice", Some("Salary".to_string()), MoneyCents::new(5000))
        .await
        .unwrap();
    assert_eq!(salary.kind(), TransactionKind::Income);

    let rent = engine
        .create_transaction("alice", Some("Rent".to_string()), MoneyCents::new(-2000))
        .await
        .unwrap();
    assert_eq!(rent.kind(), TransactionKind::Expense);

    // Both are immediately visible.
    let page = engine
        .list_transactions(
            "alice",
            &TransactionFilter::default(),
            Sort::default(),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 2);
    assert_eq!(page.items.len(), 2);
}

#[tokio::test]
async fn summary_splits_income_and_expense() {
    let (engine, _db) = engine_with_db().await;

    engine
        .create_transaction("alice", Some("Salary".to_string()), MoneyCents::new(5000))
        .await
        .unwrap();
    engine
        .create_transaction("alice", Some("Rent".to_string()), MoneyCents::new(-2000))
        .await
        .unwrap();

    let summary = engine
        .summarize_transactions("alice", DateRange::default())
        .await
        .unwrap();
    assert_eq!(summary.total_income, MoneyCents::new(5000));
    assert_eq!(summary.total_expense, MoneyCents::new(2000));
    assert_eq!(summary.count, 2);

    // A window that starts the day after everything was created is empty.
    let later = (Utc::now() + TimeDelta::days(1)).date_naive();
    let summary = engine
        .summarize_transactions(
            "alice",
            DateRange {
                from: Some(later),
                to: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(summary.total_income, MoneyCents::ZERO);
    assert_eq!(summary.total_expense, MoneyCents::ZERO);
    assert_eq!(summary.count, 0);
}

#[tokio::test]
async fn date_bounds_cover_the_whole_creation_day() {
    let (engine, _db) = engine_with_db().await;

    let tx = engine
        .create_transaction("alice", Some("Lunch".to_string()), MoneyCents::new(-1200))
        .await
        .unwrap();
    let day = tx.created_at.date_naive();

    // `date_to` of the creation day matches rows created at any time that
    // day, not only at its midnight instant.
    let page = engine
        .list_transactions(
            "alice",
            &TransactionFilter {
                date_to: Some(day),
                ..Default::default()
            },
            Sort::default(),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 1);

    // And a one-day window on the creation day contains the row too.
    let summary = engine
        .summarize_transactions(
            "alice",
            DateRange {
                from: Some(day),
                to: Some(day),
            },
        )
        .await
        .unwrap();
    assert_eq!(summary.count, 1);
    assert_eq!(summary.total_expense, MoneyCents::new(1200));

    // The day before excludes it.
    let earlier = day.pred_opt().unwrap();
    let summary = engine
        .summarize_transactions(
            "alice",
            DateRange {
                from: None,
                to: Some(earlier),
            },
        )
        .await
        .unwrap();
    assert_eq!(summary.count, 0);
}

#[tokio::test]
async fn summary_is_scoped_to_owner() {
    let (engine, _db) = engine_with_db().await;

    engine
        .create_transaction("alice", None, MoneyCents::new(5000))
        .await
        .unwrap();
    engine
        .create_transaction("bob", None, MoneyCents::new(-999))
        .await
        .unwrap();

    let summary = engine
        .summarize_transactions("alice", DateRange::default())
        .await
        .unwrap();
    assert_eq!(summary.total_income, MoneyCents::new(5000));
    assert_eq!(summary.total_expense, MoneyCents::ZERO);
    assert_eq!(summary.count, 1);
}

#[tokio::test]
async fn soft_delete_hides_from_reads() {
    let (engine, _db) = engine_with_db().await;

    let tx = engine
        .create_transaction("alice", Some("Oops".to_string()), MoneyCents::new(-500))
        .await
        .unwrap();

    let deleted = engine.delete_transaction("alice", tx.id).await.unwrap();
    assert!(deleted.deleted_at.is_some());

    let page = engine
        .list_transactions(
            "alice",
            &TransactionFilter::default(),
            Sort::default(),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 0);

    let summary = engine
        .summarize_transactions("alice", DateRange::default())
        .await
        .unwrap();
    assert_eq!(summary.count, 0);

    // Deleting again reports the row as gone.
    let err = engine.delete_transaction("alice", tx.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
}

#[tokio::test]
async fn delete_does_not_reveal_foreign_rows() {
    let (engine, _db) = engine_with_db().await;

    let tx = engine
        .create_transaction("alice", None, MoneyCents::new(100))
        .await
        .unwrap();

    // Someone else's id and a random id fail identically.
    let err = engine.delete_transaction("bob", tx.id).await.unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));
    let err = engine
        .delete_transaction("bob", Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::NotFound(_)));

    // And the row is still live for its owner.
    engine.delete_transaction("alice", tx.id).await.unwrap();
}

#[tokio::test]
async fn pagination_reports_totals() {
    let (engine, _db) = engine_with_db().await;

    for n in 0..25 {
        engine
            .create_transaction("alice", Some(format!("tx {n}")), MoneyCents::new(100 + n))
            .await
            .unwrap();
    }

    let page = engine
        .list_transactions(
            "alice",
            &TransactionFilter::default(),
            Sort::default(),
            PageRequest { page: 3, per_page: 10 },
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 25);
    assert_eq!(page.items.len(), 5);
    assert_eq!(page.page, 3);
    assert_eq!(page.per_page, 10);

    let err = engine
        .list_transactions(
            "alice",
            &TransactionFilter::default(),
            Sort::default(),
            PageRequest { page: 0, per_page: 10 },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidAmount(_)));
}

#[tokio::test]
async fn sort_by_amount_uses_magnitude() {
    let (engine, _db) = engine_with_db().await;

    for amount in [5000i64, -2000, 1500] {
        engine
            .create_transaction("alice", None, MoneyCents::new(amount))
            .await
            .unwrap();
    }

    let page = engine
        .list_transactions(
            "alice",
            &TransactionFilter::default(),
            Sort {
                field: SortField::Amount,
                direction: SortDirection::Desc,
            },
            PageRequest::default(),
        )
        .await
        .unwrap();

    let amounts: Vec<i64> = page.items.iter().map(|t| t.amount.cents()).collect();
    assert_eq!(amounts, vec![5000, -2000, 1500]);
}

#[tokio::test]
async fn filters_compare_magnitudes() {
    let (engine, _db) = engine_with_db().await;

    for amount in [5000i64, -2000, 1500, -300] {
        engine
            .create_transaction("alice", None, MoneyCents::new(amount))
            .await
            .unwrap();
    }

    // |amount| >= 1800 keeps 5000 and -2000.
    let page = engine
        .list_transactions(
            "alice",
            &TransactionFilter {
                amount_min: Some(MoneyCents::new(1800)),
                ..Default::default()
            },
            Sort::default(),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 2);

    // |amount| <= 1800 keeps 1500 and -300.
    let page = engine
        .list_transactions(
            "alice",
            &TransactionFilter {
                amount_max: Some(MoneyCents::new(1800)),
                ..Default::default()
            },
            Sort::default(),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 2);

    let page = engine
        .list_transactions(
            "alice",
            &TransactionFilter {
                kind: Some(TransactionKind::Expense),
                ..Default::default()
            },
            Sort::default(),
            PageRequest::default(),
        )
        .await
        .unwrap();
    assert_eq!(page.total_items, 2);
    assert!(page.items.iter().all(|t| t.amount.is_negative()));
}
