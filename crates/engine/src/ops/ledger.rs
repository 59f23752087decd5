//! Ledger sink: plain transaction rows.
//!
//! Generated and manual entries share one table. The recurring markers
//! (`is_recurring_instance`, `recurring_rule_id`, `scheduled_on`) are written only by
//! [`insert_transaction`] on behalf of the generator and never patched here.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, ConnectionTrait, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionCmd, TransactionKind,
    UpdateTransactionCmd, transactions,
    util::{normalize_optional_text, validate_payload},
};

use super::{Engine, accounts::require_account, with_tx};

/// Filters for listing transactions.
///
/// `from` and `to` are both inclusive.
#[derive(Clone, Debug, Default)]
pub struct TransactionListFilter {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Entries touching this account, as source or destination.
    pub account_id: Option<Uuid>,
    pub recurring_rule_id: Option<Uuid>,
    /// If true, only entries produced by a recurring rule.
    pub recurring_only: bool,
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if let (Some(from), Some(to)) = (filter.from, filter.to)
        && from > to
    {
        return Err(EngineError::InvalidTransaction(
            "invalid range: from must be <= to".to_string(),
        ));
    }
    Ok(())
}

/// Persist one entry. This is the single write path of the ledger.
pub(super) async fn insert_transaction<C: ConnectionTrait>(
    db: &C,
    tx: &Transaction,
) -> ResultEngine<Uuid> {
    transactions::ActiveModel::from(tx).insert(db).await?;
    Ok(tx.id)
}

/// `true` if the ledger already holds the entry `rule_id` generated for the
/// occurrence on `date`, wherever the user has since moved it.
pub(super) async fn recurring_instance_exists_on<C: ConnectionTrait>(
    db: &C,
    rule_id: Uuid,
    date: NaiveDate,
) -> ResultEngine<bool> {
    let count = transactions::Entity::find()
        .filter(transactions::Column::RecurringRuleId.eq(rule_id.to_string()))
        .filter(transactions::Column::ScheduledOn.eq(date))
        .count(db)
        .await?;
    Ok(count > 0)
}

impl Engine {
    /// Record a manual entry. The recurring markers stay unset.
    pub async fn record_transaction(&self, cmd: TransactionCmd) -> ResultEngine<Uuid> {
        let category = validate_payload(
            cmd.kind,
            cmd.amount_minor,
            cmd.account_id,
            cmd.dest_account_id,
            cmd.category.as_deref(),
            EngineError::InvalidTransaction,
        )?;
        let tx = Transaction::new(
            cmd.kind,
            cmd.occurred_on,
            cmd.amount_minor,
            cmd.account_id,
            cmd.dest_account_id,
            category,
            normalize_optional_text(cmd.description.as_deref()),
        )?;

        with_tx!(self, |db_tx| {
            require_account(&db_tx, tx.account_id).await?;
            if let Some(dest) = tx.dest_account_id {
                require_account(&db_tx, dest).await?;
            }
            insert_transaction(&db_tx, &tx).await
        })
    }

    pub async fn transaction(&self, transaction_id: Uuid) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    /// List entries ordered by date, then by creation time.
    pub async fn list_transactions(
        &self,
        filter: &TransactionListFilter,
    ) -> ResultEngine<Vec<Transaction>> {
        validate_list_filter(filter)?;

        let mut query = transactions::Entity::find();
        if let Some(from) = filter.from {
            query = query.filter(transactions::Column::OccurredOn.gte(from));
        }
        if let Some(to) = filter.to {
            query = query.filter(transactions::Column::OccurredOn.lte(to));
        }
        if let Some(account_id) = filter.account_id {
            let account_id = account_id.to_string();
            query = query.filter(
                transactions::Column::AccountId
                    .eq(account_id.clone())
                    .or(transactions::Column::DestAccountId.eq(account_id)),
            );
        }
        if let Some(rule_id) = filter.recurring_rule_id {
            query = query.filter(transactions::Column::RecurringRuleId.eq(rule_id.to_string()));
        }
        if filter.recurring_only {
            query = query.filter(transactions::Column::IsRecurringInstance.eq(true));
        }

        query
            .order_by_asc(transactions::Column::OccurredOn)
            .order_by_asc(transactions::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(Transaction::try_from)
            .collect()
    }

    /// Patch amount, date, category or description of an entry.
    ///
    /// Works the same on generated entries: they are independent once written,
    /// and their markers are left as they are.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<()> {
        if let Some(amount_minor) = cmd.amount_minor
            && amount_minor <= 0
        {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(cmd.transaction_id.to_string())
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))?;
            let kind = TransactionKind::try_from(model.kind.as_str())?;

            let mut active = transactions::ActiveModel {
                id: ActiveValue::Unchanged(model.id.clone()),
                ..Default::default()
            };
            if let Some(amount_minor) = cmd.amount_minor {
                active.amount_minor = ActiveValue::Set(amount_minor);
            }
            if let Some(occurred_on) = cmd.occurred_on {
                active.occurred_on = ActiveValue::Set(occurred_on);
            }
            if let Some(category) = cmd.category.as_deref() {
                let category = normalize_optional_text(Some(category));
                if category.is_none() && kind != TransactionKind::Transfer {
                    return Err(EngineError::InvalidTransaction(format!(
                        "category is required for {kind}"
                    )));
                }
                active.category = ActiveValue::Set(category);
            }
            if let Some(description) = cmd.description.as_deref() {
                active.description = ActiveValue::Set(normalize_optional_text(Some(description)));
            }

            if active.is_changed() {
                active.update(&db_tx).await?;
            }
            Ok(())
        })
    }

    /// Delete an entry. Deleting a generated entry does not make the generator
    /// produce it again: its date is already behind the rule's watermark.
    pub async fn delete_transaction(&self, transaction_id: Uuid) -> ResultEngine<()> {
        let result = transactions::Entity::delete_by_id(transaction_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(
                "transaction not exists".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn recurring_instance_exists(
        &self,
        rule_id: Uuid,
        date: NaiveDate,
    ) -> ResultEngine<bool> {
        recurring_instance_exists_on(&self.database, rule_id, date).await
    }
}
