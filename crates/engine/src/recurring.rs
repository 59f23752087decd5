//! Recurring rules.
//!
//! A [`RecurringRule`] is a declarative template: a payload (amount, kind,
//! accounts, category) plus a [`Schedule`]. The generator turns each pending
//! occurrence of the schedule into an ordinary [`Transaction`] and advances
//! the rule's watermark (`last_generated`).

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, RecurringRuleCmd, Transaction, TransactionKind,
    occurrences::{Occurrences, occurrences},
    util::{normalize_optional_text, parse_optional_uuid, parse_uuid, validate_payload},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Yearly,
}

impl Frequency {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
        }
    }
}

impl TryFrom<&str> for Frequency {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "weekly" => Ok(Self::Weekly),
            "biweekly" => Ok(Self::Biweekly),
            "monthly" => Ok(Self::Monthly),
            "yearly" => Ok(Self::Yearly),
            other => Err(EngineError::InvalidRule(format!(
                "invalid frequency: {other}"
            ))),
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The anchor of a schedule, one variant per frequency.
///
/// Storage keeps the anchor as three nullable columns; this type is what makes
/// "exactly the fields of the chosen frequency are populated" hold in memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "frequency", rename_all = "snake_case")]
pub enum Cadence {
    Weekly { weekday: Weekday },
    Biweekly { weekday: Weekday },
    /// `day` is 1..=31 and is clamped to the length of each month.
    Monthly { day: u32 },
    Yearly { month: u32, day: u32 },
}

impl Cadence {
    /// Build a cadence from the raw columns, rejecting missing, extra or
    /// out-of-range fields.
    ///
    /// `day_of_week` counts from Monday = 0 to Sunday = 6.
    pub fn from_parts(
        frequency: Frequency,
        day_of_month: Option<u32>,
        day_of_week: Option<u32>,
        month_of_year: Option<u32>,
    ) -> ResultEngine<Self> {
        let invalid = |msg: String| Err(EngineError::InvalidRule(msg));

        match frequency {
            Frequency::Weekly | Frequency::Biweekly => {
                if day_of_month.is_some() || month_of_year.is_some() {
                    return invalid(format!(
                        "{frequency} rules take day_of_week only"
                    ));
                }
                let Some(index) = day_of_week else {
                    return invalid(format!("day_of_week is required for {frequency} rules"));
                };
                let Some(weekday) = weekday_from_index(index) else {
                    return invalid(format!("day_of_week must be in 0..=6, got {index}"));
                };
                Ok(if frequency == Frequency::Weekly {
                    Self::Weekly { weekday }
                } else {
                    Self::Biweekly { weekday }
                })
            }
            Frequency::Monthly | Frequency::Yearly => {
                if day_of_week.is_some() {
                    return invalid(format!("day_of_week is not allowed for {frequency} rules"));
                }
                let Some(day) = day_of_month else {
                    return invalid(format!("day_of_month is required for {frequency} rules"));
                };
                if !(1..=31).contains(&day) {
                    return invalid(format!("day_of_month must be in 1..=31, got {day}"));
                }
                if frequency == Frequency::Monthly {
                    if month_of_year.is_some() {
                        return invalid("month_of_year is only allowed for yearly rules".to_string());
                    }
                    return Ok(Self::Monthly { day });
                }
                let Some(month) = month_of_year else {
                    return invalid("month_of_year is required for yearly rules".to_string());
                };
                if !(1..=12).contains(&month) {
                    return invalid(format!("month_of_year must be in 1..=12, got {month}"));
                }
                Ok(Self::Yearly { month, day })
            }
        }
    }

    pub fn frequency(self) -> Frequency {
        match self {
            Self::Weekly { .. } => Frequency::Weekly,
            Self::Biweekly { .. } => Frequency::Biweekly,
            Self::Monthly { .. } => Frequency::Monthly,
            Self::Yearly { .. } => Frequency::Yearly,
        }
    }

    pub fn day_of_month(self) -> Option<u32> {
        match self {
            Self::Monthly { day } | Self::Yearly { day, .. } => Some(day),
            Self::Weekly { .. } | Self::Biweekly { .. } => None,
        }
    }

    pub fn day_of_week(self) -> Option<u32> {
        match self {
            Self::Weekly { weekday } | Self::Biweekly { weekday } => {
                Some(weekday.num_days_from_monday())
            }
            Self::Monthly { .. } | Self::Yearly { .. } => None,
        }
    }

    pub fn month_of_year(self) -> Option<u32> {
        match self {
            Self::Yearly { month, .. } => Some(month),
            _ => None,
        }
    }
}

fn weekday_from_index(index: u32) -> Option<Weekday> {
    match index {
        0 => Some(Weekday::Mon),
        1 => Some(Weekday::Tue),
        2 => Some(Weekday::Wed),
        3 => Some(Weekday::Thu),
        4 => Some(Weekday::Fri),
        5 => Some(Weekday::Sat),
        6 => Some(Weekday::Sun),
        _ => None,
    }
}

/// When a rule fires: a cadence bounded by `start_date` and an optional,
/// inclusive `end_date`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub cadence: Cadence,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl Schedule {
    pub fn new(
        cadence: Cadence,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> ResultEngine<Self> {
        if let Some(end) = end_date
            && end < start_date
        {
            return Err(EngineError::InvalidRule(format!(
                "start_date {start_date} is after end_date {end}"
            )));
        }
        Ok(Self {
            cadence,
            start_date,
            end_date,
        })
    }

    /// `true` once the whole window lies strictly before `today`.
    pub fn has_expired(&self, today: NaiveDate) -> bool {
        self.end_date.is_some_and(|end| end < today)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub account_id: Uuid,
    pub dest_account_id: Option<Uuid>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub schedule: Schedule,
    /// Most recent date already materialized, `None` if the rule never ran.
    pub last_generated: Option<NaiveDate>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl RecurringRule {
    /// Validate a command and build a fresh, active rule with no watermark.
    ///
    /// Account existence is not checked here, it needs the store.
    pub fn new(cmd: &RecurringRuleCmd) -> ResultEngine<Self> {
        let category = validate_payload(
            cmd.kind,
            cmd.amount_minor,
            cmd.account_id,
            cmd.dest_account_id,
            cmd.category.as_deref(),
            EngineError::InvalidRule,
        )?;
        let cadence = Cadence::from_parts(
            cmd.frequency,
            cmd.day_of_month,
            cmd.day_of_week,
            cmd.month_of_year,
        )?;
        let schedule = Schedule::new(cadence, cmd.start_date, cmd.end_date)?;

        Ok(Self {
            id: Uuid::new_v4(),
            kind: cmd.kind,
            amount_minor: cmd.amount_minor,
            account_id: cmd.account_id,
            dest_account_id: cmd.dest_account_id,
            category,
            description: normalize_optional_text(cmd.description.as_deref()),
            schedule,
            last_generated: None,
            is_active: true,
            created_at: Utc::now(),
        })
    }

    /// Dates not yet materialized, up to and including `today`.
    pub fn pending_occurrences(&self, today: NaiveDate) -> Occurrences {
        occurrences(&self.schedule, self.last_generated, today)
    }

    /// The ledger entry this rule produces for one occurrence.
    pub fn instance_on(&self, date: NaiveDate) -> Transaction {
        Transaction {
            id: Uuid::new_v4(),
            kind: self.kind,
            occurred_on: date,
            amount_minor: self.amount_minor,
            account_id: self.account_id,
            dest_account_id: self.dest_account_id,
            category: self.category.clone(),
            description: self.description.clone(),
            is_recurring_instance: true,
            recurring_rule_id: Some(self.id),
            scheduled_on: Some(date),
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "recurring_rules")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub account_id: String,
    pub dest_account_id: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub frequency: String,
    pub day_of_month: Option<i32>,
    pub day_of_week: Option<i32>,
    pub month_of_year: Option<i32>,
    pub start_date: Date,
    pub end_date: Option<Date>,
    pub last_generated: Option<Date>,
    pub is_active: bool,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

fn to_column(value: Option<u32>) -> Option<i32> {
    value.and_then(|v| i32::try_from(v).ok())
}

fn from_column(value: Option<i32>, label: &str) -> ResultEngine<Option<u32>> {
    value
        .map(|v| {
            u32::try_from(v)
                .map_err(|_| EngineError::InvalidRule(format!("invalid stored {label}: {v}")))
        })
        .transpose()
}

impl From<&RecurringRule> for ActiveModel {
    fn from(rule: &RecurringRule) -> Self {
        let cadence = rule.schedule.cadence;
        Self {
            id: ActiveValue::Set(rule.id.to_string()),
            kind: ActiveValue::Set(rule.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(rule.amount_minor),
            account_id: ActiveValue::Set(rule.account_id.to_string()),
            dest_account_id: ActiveValue::Set(rule.dest_account_id.map(|id| id.to_string())),
            category: ActiveValue::Set(rule.category.clone()),
            description: ActiveValue::Set(rule.description.clone()),
            frequency: ActiveValue::Set(cadence.frequency().as_str().to_string()),
            day_of_month: ActiveValue::Set(to_column(cadence.day_of_month())),
            day_of_week: ActiveValue::Set(to_column(cadence.day_of_week())),
            month_of_year: ActiveValue::Set(to_column(cadence.month_of_year())),
            start_date: ActiveValue::Set(rule.schedule.start_date),
            end_date: ActiveValue::Set(rule.schedule.end_date),
            last_generated: ActiveValue::Set(rule.last_generated),
            is_active: ActiveValue::Set(rule.is_active),
            created_at: ActiveValue::Set(rule.created_at),
        }
    }
}

impl TryFrom<Model> for RecurringRule {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let cadence = Cadence::from_parts(
            Frequency::try_from(model.frequency.as_str())?,
            from_column(model.day_of_month, "day_of_month")?,
            from_column(model.day_of_week, "day_of_week")?,
            from_column(model.month_of_year, "month_of_year")?,
        )?;
        Ok(Self {
            id: parse_uuid(&model.id, "recurring rule")?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            account_id: parse_uuid(&model.account_id, "account")?,
            dest_account_id: parse_optional_uuid(model.dest_account_id.as_deref(), "account")?,
            category: model.category,
            description: model.description,
            schedule: Schedule::new(cadence, model.start_date, model.end_date)?,
            last_generated: model.last_generated,
            is_active: model.is_active,
            created_at: model.created_at,
        })
    }
}
