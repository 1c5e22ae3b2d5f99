use axum::{Json, http::StatusCode, response::IntoResponse};
use engine::{EngineError, TransactionError};
use rates::RateError;

use serde::Serialize;
pub use server::{ServerState, run, run_with_listener, spawn_with_listener};

mod feeds;
mod server;
mod transactions;

pub mod types {
    pub mod transaction {
        pub use api_types::transaction::{
            SummaryQuery, SummaryResponse, TransactionListQuery, TransactionListResponse,
            TransactionNew, TransactionView,
        };
    }

    pub mod balance {
        pub use api_types::balance::BalanceResponse;
    }
}

pub enum ServerError {
    Transaction(TransactionError),
    Rate(RateError),
    Generic(String),
}

//TODO: Find a better solution
#[derive(Serialize)]
struct Error {
    error: String,
}

fn status_for_rate_error(err: &RateError) -> StatusCode {
    match err {
        RateError::UnsupportedDriver(_) => StatusCode::UNPROCESSABLE_ENTITY,
        RateError::UpstreamUnavailable(_) => StatusCode::BAD_GATEWAY,
        RateError::InvalidFeedUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::NotFound(_) => StatusCode::NOT_FOUND,
        EngineError::InvalidAmount(_) => StatusCode::UNPROCESSABLE_ENTITY,
        EngineError::Rate(rate_err) => status_for_rate_error(rate_err),
        EngineError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn status_for_transaction_error(err: &TransactionError) -> StatusCode {
    match err {
        TransactionError::NotFound(_) => StatusCode::NOT_FOUND,
        TransactionError::Operation { source, .. } => status_for_engine_error(source),
    }
}

fn message_for_transaction_error(err: TransactionError) -> String {
    match err {
        TransactionError::Operation {
            source: EngineError::Database(db_err),
            ..
        } => {
            tracing::error!("database error: {db_err}");
            "internal server error".to_string()
        }
        TransactionError::NotFound(cause) => cause.to_string(),
        other => other.to_string(),
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, error) = match self {
            ServerError::Transaction(err) => (
                status_for_transaction_error(&err),
                message_for_transaction_error(err),
            ),
            ServerError::Rate(err) => (status_for_rate_error(&err), err.to_string()),
            ServerError::Generic(err) => (StatusCode::BAD_REQUEST, err),
        };

        (status, Json(Error { error })).into_response()
    }
}

impl From<TransactionError> for ServerError {
    fn from(value: TransactionError) -> Self {
        Self::Transaction(value)
    }
}

impl From<RateError> for ServerError {
    fn from(value: RateError) -> Self {
        Self::Rate(value)
    }
}
