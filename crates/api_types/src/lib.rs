use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sign-derived class of a transaction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

/// One figure in both supported currencies, in minor units.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub struct ConvertedMoney {
    pub eur: i64,
    pub usd: i64,
}

pub mod transaction {
    use super::*;

    /// Request body for creating a transaction. Negative amounts are
    /// expenses, zero or positive amounts are income.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub title: Option<String>,
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub title: Option<String>,
        pub amount_minor: i64,
        pub kind: TransactionKind,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SortField {
        Amount,
        CreatedAt,
        Title,
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "snake_case")]
    pub enum SortDirection {
        Asc,
        Desc,
    }

    /// Query string of `GET /api/transactions`. Amount bounds are minor
    /// units compared against the absolute amount; date bounds are
    /// `YYYY-MM-DD` calendar days in UTC, inclusive on both ends.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionListQuery {
        pub kind: Option<TransactionKind>,
        pub amount_min: Option<i64>,
        pub amount_max: Option<i64>,
        pub date_from: Option<NaiveDate>,
        pub date_to: Option<NaiveDate>,
        pub sort_field: Option<SortField>,
        pub sort_direction: Option<SortDirection>,
        pub page: Option<u64>,
        pub per_page: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionListResponse {
        pub transactions: Vec<TransactionView>,
        pub page: u64,
        pub per_page: u64,
        pub total: u64,
    }

    /// Query string of `GET /api/transactions/summary`. Dates are
    /// `YYYY-MM-DD` calendar days in UTC, inclusive on both ends.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct SummaryQuery {
        pub date_from: Option<NaiveDate>,
        pub date_to: Option<NaiveDate>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct SummaryResponse {
        pub total_income: ConvertedMoney,
        pub total_expense: ConvertedMoney,
        pub total: ConvertedMoney,
        pub count: u64,
    }
}

pub mod balance {
    use super::*;

    /// Body of `GET /api/me/balance`, serialized as `{"EUR": .., "USD": ..}`.
    pub type BalanceResponse = ConvertedMoney;
}
