//! Transactions API endpoints

use api_types::transaction::{
    SummaryQuery, SummaryResponse, TransactionListQuery, TransactionListResponse, TransactionNew,
    TransactionView,
};
use api_types::{ConvertedMoney, TransactionKind as ApiKind};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{ServerError, server::ServerState};
use engine::{
    ConvertedAmount, DateRange, MoneyCents, PageRequest, Sort, TransactionFilter, users,
};

fn map_kind(kind: engine::TransactionKind) -> ApiKind {
    match kind {
        engine::TransactionKind::Income => ApiKind::Income,
        engine::TransactionKind::Expense => ApiKind::Expense,
    }
}

fn view(tx: engine::Transaction) -> TransactionView {
    let kind = map_kind(tx.kind());
    TransactionView {
        id: tx.id,
        title: tx.title,
        amount_minor: tx.amount.cents(),
        kind,
        created_at: tx.created_at,
    }
}

fn money(amount: ConvertedAmount) -> ConvertedMoney {
    ConvertedMoney {
        eur: amount.eur.cents(),
        usd: amount.usd.cents(),
    }
}

pub async fn list(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<TransactionListQuery>,
) -> Result<Json<TransactionListResponse>, ServerError> {
    let filter = TransactionFilter {
        kind: query.kind.map(|kind| match kind {
            ApiKind::Income => engine::TransactionKind::Income,
            ApiKind::Expense => engine::TransactionKind::Expense,
        }),
        amount_min: query.amount_min.map(MoneyCents::new),
        amount_max: query.amount_max.map(MoneyCents::new),
        date_from: query.date_from,
        date_to: query.date_to,
    };

    let mut sort = Sort::default();
    if let Some(field) = query.sort_field {
        sort.field = match field {
            api_types::transaction::SortField::Amount => engine::SortField::Amount,
            api_types::transaction::SortField::CreatedAt => engine::SortField::CreatedAt,
            api_types::transaction::SortField::Title => engine::SortField::Title,
        };
    }
    if let Some(direction) = query.sort_direction {
        sort.direction = match direction {
            api_types::transaction::SortDirection::Asc => engine::SortDirection::Asc,
            api_types::transaction::SortDirection::Desc => engine::SortDirection::Desc,
        };
    }

    let mut page = PageRequest::default();
    if let Some(requested) = query.page {
        page.page = requested;
    }
    if let Some(requested) = query.per_page {
        page.per_page = requested;
    }

    let result = state
        .service
        .list(&user.username, &filter, sort, page)
        .await?;

    Ok(Json(TransactionListResponse {
        transactions: result.items.into_iter().map(view).collect(),
        page: result.page,
        per_page: result.per_page,
        total: result.total_items,
    }))
}

pub async fn create(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Json(payload): Json<TransactionNew>,
) -> Result<(StatusCode, Json<TransactionView>), ServerError> {
    let tx = state
        .service
        .create(
            &user.username,
            payload.title,
            MoneyCents::new(payload.amount_minor),
        )
        .await?;

    Ok((StatusCode::CREATED, Json(view(tx))))
}

pub async fn remove(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ServerError> {
    state.service.delete(&user.username, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn summary(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
    Query(query): Query<SummaryQuery>,
) -> Result<Json<SummaryResponse>, ServerError> {
    let range = DateRange {
        from: query.date_from,
        to: query.date_to,
    };
    let summary = state
        .service
        .summary_with_conversion(&user.username, range)
        .await?;

    Ok(Json(SummaryResponse {
        total_income: money(summary.total_income),
        total_expense: money(summary.total_expense),
        total: money(summary.total),
        count: summary.count,
    }))
}

pub async fn balance(
    Extension(user): Extension<users::Model>,
    State(state): State<ServerState>,
) -> Result<Json<crate::types::balance::BalanceResponse>, ServerError> {
    let balance = state.service.balance(&user.username).await?;

    Ok(Json(ConvertedMoney {
        eur: balance.eur.cents(),
        usd: balance.usd.cents(),
    }))
}
