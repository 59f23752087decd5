//! Materialization of pending recurring occurrences.
//!
//! Every rule is processed in its own DB transaction: claim the row, reload
//! it, insert one entry per pending date, advance the watermark, deactivate
//! if expired, commit. A failure rolls back the current rule and aborts the
//! run; rules committed before it stay committed.

use chrono::NaiveDate;
use sea_orm::{
    ActiveValue, Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use uuid::Uuid;

use crate::{EngineError, RecurringRule, ResultEngine, recurring};

use super::{
    Engine,
    ledger::{insert_transaction, recurring_instance_exists_on},
    with_tx,
};

impl Engine {
    /// Materialize every pending occurrence up to the engine clock's today.
    ///
    /// Returns how many entries were created. Safe to call any number of
    /// times: a second call with the same today returns 0.
    pub async fn generate_recurring(&self) -> ResultEngine<usize> {
        self.generate_recurring_until(self.clock.today()).await
    }

    /// Same as [`Engine::generate_recurring`] with an explicit today.
    pub async fn generate_recurring_until(&self, today: NaiveDate) -> ResultEngine<usize> {
        let candidates: Vec<String> = recurring::Entity::find()
            .select_only()
            .column(recurring::Column::Id)
            .filter(recurring::Column::IsActive.eq(true))
            .filter(
                Condition::any()
                    .add(recurring::Column::LastGenerated.is_null())
                    .add(recurring::Column::LastGenerated.lt(today)),
            )
            .order_by_asc(recurring::Column::StartDate)
            .order_by_asc(recurring::Column::Id)
            .into_tuple()
            .all(&self.database)
            .await?;

        let mut created = 0;
        for rule_id in &candidates {
            created += self.generate_rule(rule_id, today).await?;
        }

        tracing::info!(
            %today,
            rules = candidates.len(),
            created,
            "recurring generation finished"
        );
        Ok(created)
    }

    async fn generate_rule(&self, rule_id: &str, today: NaiveDate) -> ResultEngine<usize> {
        with_tx!(self, |db_tx| {
            // Writing first takes the store's write lock before the watermark
            // is read, so a concurrent run waits here and then sees our result.
            let claimed = recurring::Entity::update_many()
                .col_expr(recurring::Column::IsActive, Expr::value(true).into())
                .filter(recurring::Column::Id.eq(rule_id))
                .filter(recurring::Column::IsActive.eq(true))
                .exec(&db_tx)
                .await?;
            if claimed.rows_affected == 0 {
                tracing::debug!(rule_id, "rule deleted or deactivated meanwhile, skipping");
                return Ok(0);
            }

            let model = recurring::Entity::find_by_id(rule_id)
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("recurring rule not exists".to_string()))?;
            let rule = RecurringRule::try_from(model)?;

            let mut created = 0;
            let mut watermark = rule.last_generated;
            for date in rule.pending_occurrences(today) {
                if recurring_instance_exists_on(&db_tx, rule.id, date).await? {
                    tracing::warn!(
                        rule_id,
                        %date,
                        "entry already in the ledger, advancing watermark only"
                    );
                } else {
                    insert_transaction(&db_tx, &rule.instance_on(date)).await?;
                    created += 1;
                }
                watermark = Some(date);
            }

            let expired = rule.schedule.has_expired(today);
            if watermark != rule.last_generated || expired {
                let active = recurring::ActiveModel {
                    id: ActiveValue::Unchanged(rule_id.to_string()),
                    last_generated: ActiveValue::Set(watermark),
                    is_active: ActiveValue::Set(!expired),
                    ..Default::default()
                };
                active.update(&db_tx).await?;
            }

            tracing::debug!(
                rule_id,
                created,
                last_generated = ?watermark,
                deactivated = expired,
                "recurring rule processed"
            );
            Ok(created)
        })
    }

    /// Run generation for a single rule, regardless of the other rules.
    pub async fn generate_recurring_rule(
        &self,
        rule_id: Uuid,
        today: NaiveDate,
    ) -> ResultEngine<usize> {
        self.generate_rule(&rule_id.to_string(), today).await
    }
}
