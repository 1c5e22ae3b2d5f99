use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sea_orm::{
    ActiveValue, Condition, Order, PaginatorTrait, QueryFilter, QueryOrder, Statement,
    TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, MoneyCents, ResultEngine, Transaction, TransactionKind, transactions};

use super::{Engine, with_tx};

/// Filters for listing transactions.
///
/// Amount bounds compare against the absolute value of the amount, so an
/// expense of -20.00 matches `amount_min = 10.00`. Date bounds are UTC
/// calendar days, inclusive on both ends: `date_to` covers the whole day,
/// not just its midnight instant.
#[derive(Clone, Debug, Default)]
pub struct TransactionFilter {
    pub kind: Option<TransactionKind>,
    pub amount_min: Option<MoneyCents>,
    pub amount_max: Option<MoneyCents>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

fn day_start(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// First instant after `date`; `None` only at the end of the calendar,
/// where the bound degenerates to "no upper bound".
fn day_end_exclusive(date: NaiveDate) -> Option<DateTime<Utc>> {
    date.succ_opt().map(day_start)
}

/// Sortable columns for transaction listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortField {
    /// Orders by the absolute value of the amount.
    Amount,
    CreatedAt,
    Title,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl From<SortDirection> for Order {
    fn from(direction: SortDirection) -> Order {
        match direction {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sort {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for Sort {
    /// Newest first.
    fn default() -> Sort {
        Sort {
            field: SortField::CreatedAt,
            direction: SortDirection::Desc,
        }
    }
}

/// 1-indexed pagination request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub per_page: u64,
}

impl Default for PageRequest {
    fn default() -> PageRequest {
        PageRequest {
            page: 1,
            per_page: 10,
        }
    }
}

impl PageRequest {
    fn validate(self) -> ResultEngine<()> {
        if self.page < 1 {
            return Err(EngineError::InvalidAmount(
                "page must be >= 1".to_string(),
            ));
        }
        if self.per_page < 1 {
            return Err(EngineError::InvalidAmount(
                "per_page must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// One page of results together with the total match count.
#[derive(Clone, Debug)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
}

/// Optional UTC calendar-day bounds for summaries, inclusive on both ends.
#[derive(Clone, Copy, Debug, Default)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

/// Income/expense totals over the live (non-deleted) transactions of an owner.
///
/// Both totals are reported as non-negative magnitudes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Summary {
    pub total_income: MoneyCents,
    pub total_expense: MoneyCents,
    pub count: u64,
}

impl Engine {
    /// List the live transactions of `owner_id`, filtered, sorted and paged.
    pub async fn list_transactions(
        &self,
        owner_id: &str,
        filter: &TransactionFilter,
        sort: Sort,
        page: PageRequest,
    ) -> ResultEngine<Page<Transaction>> {
        page.validate()?;

        let mut select = transactions::Entity::find()
            .filter(transactions::Column::OwnerId.eq(owner_id))
            .filter(transactions::Column::DeletedAt.is_null());

        if let Some(kind) = filter.kind {
            select = match kind {
                TransactionKind::Income => {
                    select.filter(transactions::Column::AmountMinor.gte(0i64))
                }
                TransactionKind::Expense => {
                    select.filter(transactions::Column::AmountMinor.lt(0i64))
                }
            };
        }
        if let Some(min) = filter.amount_min {
            let min = min.cents().abs();
            select = select.filter(
                Condition::any()
                    .add(transactions::Column::AmountMinor.gte(min))
                    .add(transactions::Column::AmountMinor.lte(-min)),
            );
        }
        if let Some(max) = filter.amount_max {
            let max = max.cents().abs();
            select = select
                .filter(transactions::Column::AmountMinor.lte(max))
                .filter(transactions::Column::AmountMinor.gte(-max));
        }
        if let Some(from) = filter.date_from {
            select = select.filter(transactions::Column::CreatedAt.gte(day_start(from)));
        }
        if let Some(bound) = filter.date_to.and_then(day_end_exclusive) {
            select = select.filter(transactions::Column::CreatedAt.lt(bound));
        }

        let order: Order = sort.direction.into();
        select = match sort.field {
            SortField::Amount => select.order_by(Expr::cust("ABS(amount_minor)"), order),
            SortField::CreatedAt => select.order_by(transactions::Column::CreatedAt, order),
            SortField::Title => select.order_by(transactions::Column::Title, order),
        };
        // Stable tiebreak so pages do not overlap.
        let select = select.order_by(transactions::Column::Id, Order::Asc);

        let paginator = select.paginate(&self.database, page.per_page);
        let total_items = paginator.num_items().await?;
        let models = paginator.fetch_page(page.page - 1).await?;

        let items = models
            .into_iter()
            .map(Transaction::try_from)
            .collect::<ResultEngine<Vec<_>>>()?;

        Ok(Page {
            items,
            page: page.page,
            per_page: page.per_page,
            total_items,
        })
    }

    /// Persist a new transaction for `owner_id` and return it.
    pub async fn create_transaction(
        &self,
        owner_id: &str,
        title: Option<String>,
        amount: MoneyCents,
    ) -> ResultEngine<Transaction> {
        let transaction = Transaction::new(owner_id.to_string(), title, amount, Utc::now());
        with_tx!(self, |db_tx| {
            transactions::ActiveModel::from(&transaction)
                .insert(&db_tx)
                .await?;
            Ok(transaction)
        })
    }

    /// Soft-delete a transaction owned by `owner_id`.
    ///
    /// A transaction that does not exist, is already deleted, or belongs to
    /// another owner is reported as [`EngineError::NotFound`].
    pub async fn delete_transaction(
        &self,
        owner_id: &str,
        id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(id.to_string())
                .filter(transactions::Column::OwnerId.eq(owner_id))
                .filter(transactions::Column::DeletedAt.is_null())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound(format!("transaction {id}")))?;

            let now = Utc::now();
            let mut active: transactions::ActiveModel = model.into();
            active.deleted_at = ActiveValue::Set(Some(now));
            active.updated_at = ActiveValue::Set(now);
            let updated = active.update(&db_tx).await?;

            Transaction::try_from(updated)
        })
    }

    /// Income/expense totals for `owner_id` over an optional creation-date
    /// range of calendar days, inclusive on both ends.
    pub async fn summarize_transactions(
        &self,
        owner_id: &str,
        range: DateRange,
    ) -> ResultEngine<Summary> {
        let backend = self.database.get_database_backend();

        let mut bounds = String::new();
        let mut values: Vec<sea_orm::Value> = vec![owner_id.into()];
        if let Some(from) = range.from {
            bounds.push_str(" AND created_at >= ?");
            values.push(day_start(from).into());
        }
        if let Some(bound) = range.to.and_then(day_end_exclusive) {
            bounds.push_str(" AND created_at < ?");
            values.push(bound.into());
        }

        let total_income: i64 = {
            let stmt = Statement::from_sql_and_values(
                backend,
                format!(
                    "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
                     FROM transactions \
                     WHERE owner_id = ? AND deleted_at IS NULL AND amount_minor >= 0{bounds}"
                ),
                values.clone(),
            );
            let row = self.database.query_one(stmt).await?;
            row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0)
        };

        let total_expense: i64 = {
            let stmt = Statement::from_sql_and_values(
                backend,
                format!(
                    "SELECT COALESCE(SUM(-amount_minor), 0) AS sum \
                     FROM transactions \
                     WHERE owner_id = ? AND deleted_at IS NULL AND amount_minor < 0{bounds}"
                ),
                values.clone(),
            );
            let row = self.database.query_one(stmt).await?;
            row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0)
        };

        let count: i64 = {
            let stmt = Statement::from_sql_and_values(
                backend,
                format!(
                    "SELECT COUNT(*) AS count \
                     FROM transactions \
                     WHERE owner_id = ? AND deleted_at IS NULL{bounds}"
                ),
                values,
            );
            let row = self.database.query_one(stmt).await?;
            row.and_then(|r| r.try_get("", "count").ok()).unwrap_or(0)
        };

        Ok(Summary {
            total_income: MoneyCents::new(total_income),
            total_expense: MoneyCents::new(total_expense),
            count: count.max(0) as u64,
        })
    }
}
