//! Command structs for engine operations.
//!
//! These types group parameters for write operations (rule creation, manual
//! entries, entry updates), keeping call sites readable and avoiding long
//! argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{Frequency, TransactionKind};

/// Create a recurring rule.
///
/// Only the anchor fields of the chosen `frequency` may be set; validation
/// happens in [`Engine::create_recurring_rule`](crate::Engine::create_recurring_rule).
#[derive(Clone, Debug)]
pub struct RecurringRuleCmd {
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub account_id: Uuid,
    pub dest_account_id: Option<Uuid>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub frequency: Frequency,
    pub day_of_month: Option<u32>,
    /// Monday = 0 ... Sunday = 6.
    pub day_of_week: Option<u32>,
    pub month_of_year: Option<u32>,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl RecurringRuleCmd {
    #[must_use]
    pub fn new(
        kind: TransactionKind,
        amount_minor: i64,
        account_id: Uuid,
        frequency: Frequency,
        start_date: NaiveDate,
    ) -> Self {
        Self {
            kind,
            amount_minor,
            account_id,
            dest_account_id: None,
            category: None,
            description: None,
            frequency,
            day_of_month: None,
            day_of_week: None,
            month_of_year: None,
            start_date,
            end_date: None,
        }
    }

    #[must_use]
    pub fn dest_account_id(mut self, dest_account_id: Uuid) -> Self {
        self.dest_account_id = Some(dest_account_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = Some(day);
        self
    }

    #[must_use]
    pub fn day_of_week(mut self, day: u32) -> Self {
        self.day_of_week = Some(day);
        self
    }

    #[must_use]
    pub fn month_of_year(mut self, month: u32) -> Self {
        self.month_of_year = Some(month);
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: NaiveDate) -> Self {
        self.end_date = Some(end_date);
        self
    }
}

/// Record a manual ledger entry.
#[derive(Clone, Debug)]
pub struct TransactionCmd {
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub account_id: Uuid,
    pub dest_account_id: Option<Uuid>,
    pub occurred_on: NaiveDate,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl TransactionCmd {
    #[must_use]
    pub fn new(
        kind: TransactionKind,
        amount_minor: i64,
        account_id: Uuid,
        occurred_on: NaiveDate,
    ) -> Self {
        Self {
            kind,
            amount_minor,
            account_id,
            dest_account_id: None,
            occurred_on,
            category: None,
            description: None,
        }
    }

    #[must_use]
    pub fn dest_account_id(mut self, dest_account_id: Uuid) -> Self {
        self.dest_account_id = Some(dest_account_id);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Patch an existing ledger entry.
///
/// `None` leaves a field unchanged; for text fields `Some("")` clears it.
/// The recurring markers are never part of a patch.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub transaction_id: Uuid,
    pub amount_minor: Option<i64>,
    pub occurred_on: Option<NaiveDate>,
    pub category: Option<String>,
    pub description: Option<String>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(transaction_id: Uuid) -> Self {
        Self {
            transaction_id,
            amount_minor: None,
            occurred_on: None,
            category: None,
            description: None,
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn occurred_on(mut self, occurred_on: NaiveDate) -> Self {
        self.occurred_on = Some(occurred_on);
        self
    }

    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}
