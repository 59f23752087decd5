//! Recurring rules and the ledger index that keeps generation at most once
//! per (rule, date).

use sea_orm_migration::prelude::*;

use crate::m20260301_000000_init::{Accounts, Transactions};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(Iden)]
enum RecurringRules {
    Table,
    Id,
    Kind,
    AmountMinor,
    AccountId,
    DestAccountId,
    Category,
    Description,
    Frequency,
    DayOfMonth,
    DayOfWeek,
    MonthOfYear,
    StartDate,
    EndDate,
    LastGenerated,
    IsActive,
    CreatedAt,
}

const RULE_DATE_INDEX: &str = "idx-transactions-recurring_rule_id-scheduled_on-unique";

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RecurringRules::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RecurringRules::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RecurringRules::Kind).string().not_null())
                    .col(
                        ColumnDef::new(RecurringRules::AmountMinor)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(RecurringRules::AccountId).string().not_null())
                    .col(ColumnDef::new(RecurringRules::DestAccountId).string())
                    .col(ColumnDef::new(RecurringRules::Category).string())
                    .col(ColumnDef::new(RecurringRules::Description).string())
                    .col(ColumnDef::new(RecurringRules::Frequency).string().not_null())
                    .col(ColumnDef::new(RecurringRules::DayOfMonth).integer())
                    .col(ColumnDef::new(RecurringRules::DayOfWeek).integer())
                    .col(ColumnDef::new(RecurringRules::MonthOfYear).integer())
                    .col(ColumnDef::new(RecurringRules::StartDate).date().not_null())
                    .col(ColumnDef::new(RecurringRules::EndDate).date())
                    .col(ColumnDef::new(RecurringRules::LastGenerated).date())
                    .col(
                        ColumnDef::new(RecurringRules::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(RecurringRules::CreatedAt)
                            .timestamp()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_rules-account_id")
                            .from(RecurringRules::Table, RecurringRules::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-recurring_rules-dest_account_id")
                            .from(RecurringRules::Table, RecurringRules::DestAccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx-recurring_rules-is_active-last_generated")
                    .table(RecurringRules::Table)
                    .col(RecurringRules::IsActive)
                    .col(RecurringRules::LastGenerated)
                    .to_owned(),
            )
            .await?;

        // NULL rule ids (manual entries) never collide.
        manager
            .create_index(
                Index::create()
                    .name(RULE_DATE_INDEX)
                    .table(Transactions::Table)
                    .col(Transactions::RecurringRuleId)
                    .col(Transactions::ScheduledOn)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name(RULE_DATE_INDEX)
                    .table(Transactions::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_table(Table::drop().table(RecurringRules::Table).to_owned())
            .await?;
        Ok(())
    }
}
