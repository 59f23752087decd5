use chrono::NaiveDate;
use sea_orm::{QueryFilter, QueryOrder, TransactionTrait, prelude::*};
use uuid::Uuid;

use crate::{EngineError, RecurringRule, RecurringRuleCmd, ResultEngine, recurring};

use super::{Engine, accounts::require_account, with_tx};

impl Engine {
    /// Validate and store a new active rule.
    ///
    /// The rule starts without a watermark: the next generation materializes
    /// everything from `start_date` on.
    pub async fn create_recurring_rule(&self, cmd: RecurringRuleCmd) -> ResultEngine<Uuid> {
        let rule = RecurringRule::new(&cmd)?;
        with_tx!(self, |db_tx| {
            require_account(&db_tx, rule.account_id).await?;
            if let Some(dest) = rule.dest_account_id {
                require_account(&db_tx, dest).await?;
            }
            recurring::ActiveModel::from(&rule).insert(&db_tx).await?;
            tracing::debug!(
                rule_id = %rule.id,
                frequency = %rule.schedule.cadence.frequency(),
                start_date = %rule.schedule.start_date,
                "recurring rule created"
            );
            Ok(rule.id)
        })
    }

    pub async fn recurring_rule(&self, rule_id: Uuid) -> ResultEngine<RecurringRule> {
        let model = recurring::Entity::find_by_id(rule_id.to_string())
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("recurring rule not exists".to_string()))?;
        RecurringRule::try_from(model)
    }

    /// List rules ordered by start date.
    pub async fn list_recurring_rules(&self, active_only: bool) -> ResultEngine<Vec<RecurringRule>> {
        let mut query = recurring::Entity::find();
        if active_only {
            query = query.filter(recurring::Column::IsActive.eq(true));
        }
        query
            .order_by_asc(recurring::Column::StartDate)
            .order_by_asc(recurring::Column::CreatedAt)
            .all(&self.database)
            .await?
            .into_iter()
            .map(RecurringRule::try_from)
            .collect()
    }

    /// Delete a rule. Entries it already produced stay in the ledger and keep
    /// their `recurring_rule_id`.
    pub async fn delete_recurring_rule(&self, rule_id: Uuid) -> ResultEngine<()> {
        let result = recurring::Entity::delete_by_id(rule_id.to_string())
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::KeyNotFound(
                "recurring rule not exists".to_string(),
            ));
        }
        Ok(())
    }

    /// Dates the next generation would materialize for `rule_id` if it ran
    /// with `until` as today. Inactive rules have none.
    pub async fn upcoming_occurrences(
        &self,
        rule_id: Uuid,
        until: NaiveDate,
    ) -> ResultEngine<Vec<NaiveDate>> {
        let rule = self.recurring_rule(rule_id).await?;
        if !rule.is_active {
            return Ok(Vec::new());
        }
        Ok(rule.pending_occurrences(until).collect())
    }
}
