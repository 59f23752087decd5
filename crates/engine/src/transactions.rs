//! Ledger entries.
//!
//! A `Transaction` is a single dated money movement on an account. Entries
//! materialized from a [`RecurringRule`](crate::RecurringRule) are ordinary
//! transactions carrying two extra markers: `is_recurring_instance` and the
//! weak back-reference `recurring_rule_id`. They also remember the occurrence
//! they were generated for in `scheduled_on`, which stays fixed when the user
//! moves `occurred_on`.

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine,
    util::{parse_optional_uuid, parse_uuid},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
    Transfer,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "income" => Ok(Self::Income),
            "expense" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            other => Err(EngineError::InvalidTransaction(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub occurred_on: NaiveDate,
    pub amount_minor: i64,
    pub account_id: Uuid,
    pub dest_account_id: Option<Uuid>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_recurring_instance: bool,
    /// Lookup key of the rule that produced this entry. Not an ownership link:
    /// the rule may be gone.
    pub recurring_rule_id: Option<Uuid>,
    /// Occurrence date this entry was generated for. `None` for manual entries.
    pub scheduled_on: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: TransactionKind,
        occurred_on: NaiveDate,
        amount_minor: i64,
        account_id: Uuid,
        dest_account_id: Option<Uuid>,
        category: Option<String>,
        description: Option<String>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            kind,
            occurred_on,
            amount_minor,
            account_id,
            dest_account_id,
            category,
            description,
            is_recurring_instance: false,
            recurring_rule_id: None,
            scheduled_on: None,
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub occurred_on: Date,
    pub amount_minor: i64,
    pub account_id: String,
    pub dest_account_id: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub is_recurring_instance: bool,
    pub recurring_rule_id: Option<String>,
    pub scheduled_on: Option<Date>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            occurred_on: ActiveValue::Set(tx.occurred_on),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            dest_account_id: ActiveValue::Set(tx.dest_account_id.map(|id| id.to_string())),
            category: ActiveValue::Set(tx.category.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            is_recurring_instance: ActiveValue::Set(tx.is_recurring_instance),
            recurring_rule_id: ActiveValue::Set(tx.recurring_rule_id.map(|id| id.to_string())),
            scheduled_on: ActiveValue::Set(tx.scheduled_on),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: parse_uuid(&model.id, "transaction")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            occurred_on: model.occurred_on,
            amount_minor: model.amount_minor,
            account_id: parse_uuid(&model.account_id, "account")?,
            dest_account_id: parse_optional_uuid(model.dest_account_id.as_deref(), "account")?,
            category: model.category,
            description: model.description,
            is_recurring_instance: model.is_recurring_instance,
            recurring_rule_id: parse_optional_uuid(
                model.recurring_rule_id.as_deref(),
                "recurring rule",
            )?,
            scheduled_on: model.scheduled_on,
            created_at: model.created_at,
        })
    }
}
