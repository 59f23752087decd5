use std::error::Error;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use engine::{
    Account, Engine, EngineError, Frequency, MoneyCents, RecurringRule, RecurringRuleCmd,
    Transaction, TransactionCmd, TransactionKind, TransactionListFilter,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};
use serde::Serialize;
use uuid::Uuid;

#[derive(Parser, Debug)]
#[command(name = "tally_admin")]
#[command(about = "Admin utilities for Tally (accounts, recurring rules, ledger)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite:./tally.db?mode=rwc")]
    database_url: String,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Account(AccountArgs),
    Rule(RuleArgs),
    Tx(TxArgs),
    /// Materialize every pending occurrence of every active rule.
    Generate(GenerateArgs),
}

#[derive(Args, Debug)]
struct AccountArgs {
    #[command(subcommand)]
    command: AccountCommand,
}

#[derive(Subcommand, Debug)]
enum AccountCommand {
    Create {
        #[arg(long)]
        name: String,
    },
    List,
    /// Archive an account, by name or id.
    Archive {
        account: String,
        /// Restore an archived account instead.
        #[arg(long)]
        undo: bool,
    },
}

#[derive(Args, Debug)]
struct RuleArgs {
    #[command(subcommand)]
    command: RuleCommand,
}

#[derive(Subcommand, Debug)]
enum RuleCommand {
    Create(RuleCreateArgs),
    List {
        /// Only rules the generator still considers.
        #[arg(long)]
        active: bool,
    },
    Show {
        id: Uuid,
    },
    /// Delete a rule. Entries it already produced stay in the ledger.
    Delete {
        id: Uuid,
    },
    /// Dates the next generation would write, up to `--until`.
    Upcoming {
        id: Uuid,
        #[arg(long)]
        until: NaiveDate,
    },
}

#[derive(Args, Debug)]
struct RuleCreateArgs {
    #[arg(long, value_parser = parse_kind)]
    kind: TransactionKind,
    /// Amount in units, e.g. `9.99`.
    #[arg(long)]
    amount: MoneyCents,
    /// Source account, by name or id.
    #[arg(long)]
    account: String,
    /// Destination account for transfers, by name or id.
    #[arg(long)]
    dest: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long, value_parser = parse_frequency)]
    frequency: Frequency,
    #[arg(long)]
    day_of_month: Option<u32>,
    /// Monday = 0 ... Sunday = 6.
    #[arg(long)]
    day_of_week: Option<u32>,
    #[arg(long)]
    month_of_year: Option<u32>,
    #[arg(long)]
    start: NaiveDate,
    #[arg(long)]
    end: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct TxArgs {
    #[command(subcommand)]
    command: TxCommand,
}

#[derive(Subcommand, Debug)]
enum TxCommand {
    Record(TxRecordArgs),
    List(TxListArgs),
    Delete { id: Uuid },
}

#[derive(Args, Debug)]
struct TxRecordArgs {
    #[arg(long, value_parser = parse_kind)]
    kind: TransactionKind,
    #[arg(long)]
    amount: MoneyCents,
    #[arg(long)]
    account: String,
    #[arg(long)]
    dest: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    date: NaiveDate,
}

#[derive(Args, Debug)]
struct TxListArgs {
    #[arg(long)]
    from: Option<NaiveDate>,
    #[arg(long)]
    to: Option<NaiveDate>,
    #[arg(long)]
    account: Option<String>,
    #[arg(long)]
    rule: Option<Uuid>,
    #[arg(long)]
    recurring_only: bool,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// Generate as if today were this date instead of the system date.
    #[arg(long)]
    today: Option<NaiveDate>,
}

fn parse_kind(raw: &str) -> Result<TransactionKind, String> {
    TransactionKind::try_from(raw.to_ascii_lowercase().as_str()).map_err(|err| err.to_string())
}

fn parse_frequency(raw: &str) -> Result<Frequency, String> {
    Frequency::try_from(raw.to_ascii_lowercase().as_str()).map_err(|err| err.to_string())
}

async fn connect_db(database_url: &str) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

/// Find an account by id or, failing that, by case-insensitive name.
async fn resolve_account(engine: &Engine, raw: &str) -> Result<Uuid, EngineError> {
    if let Ok(id) = Uuid::parse_str(raw) {
        return Ok(engine.account(id).await?.id);
    }
    engine
        .list_accounts()
        .await?
        .into_iter()
        .find(|account| account.name.eq_ignore_ascii_case(raw.trim()))
        .map(|account| account.id)
        .ok_or_else(|| EngineError::KeyNotFound(format!("account {raw} not exists")))
}

async fn resolve_optional_account(
    engine: &Engine,
    raw: Option<&str>,
) -> Result<Option<Uuid>, EngineError> {
    match raw {
        Some(raw) => resolve_account(engine, raw).await.map(Some),
        None => Ok(None),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn account_line(account: &Account) -> String {
    let archived = if account.archived { " (archived)" } else { "" };
    format!("{}  {}{archived}", account.id, account.name)
}

fn rule_line(rule: &RecurringRule) -> String {
    let cadence = rule.schedule.cadence;
    let anchor = match (
        cadence.month_of_year(),
        cadence.day_of_month(),
        cadence.day_of_week(),
    ) {
        (Some(month), Some(day), _) => format!("{month:02}-{day:02}"),
        (None, Some(day), _) => format!("day {day}"),
        (_, _, Some(weekday)) => format!("weekday {weekday}"),
        _ => String::new(),
    };
    let end = rule
        .schedule
        .end_date
        .map_or_else(|| "open".to_string(), |end| end.to_string());
    let last = rule
        .last_generated
        .map_or_else(|| "never".to_string(), |date| date.to_string());
    let state = if rule.is_active { "active" } else { "inactive" };
    format!(
        "{}  {} {} {} {}  {}..{}  last={last}  {state}",
        rule.id,
        rule.kind,
        MoneyCents::new(rule.amount_minor),
        cadence.frequency(),
        anchor,
        rule.schedule.start_date,
        end,
    )
}

fn transaction_line(tx: &Transaction) -> String {
    let marker = if tx.is_recurring_instance { " [recurring]" } else { "" };
    let label = tx
        .category
        .as_deref()
        .or(tx.description.as_deref())
        .unwrap_or("-");
    format!(
        "{}  {}  {:>10}  {}  {label}{marker}",
        tx.occurred_on,
        tx.kind,
        MoneyCents::new(tx.amount_minor).to_string(),
        tx.id,
    )
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    if let Err(err) = run(&engine, cli.command, cli.json).await {
        // Validation and lookup failures are the user's to fix; storage errors bubble up.
        let user_error = matches!(
            err.downcast_ref::<EngineError>(),
            Some(e) if !matches!(e, EngineError::Database(_))
        );
        if !user_error {
            return Err(err);
        }
        eprintln!("{err}");
        std::process::exit(1);
    }
    Ok(())
}

async fn run(
    engine: &Engine,
    command: Command,
    json: bool,
) -> Result<(), Box<dyn Error + Send + Sync>> {
    match command {
        Command::Account(AccountArgs {
            command: AccountCommand::Create { name },
        }) => {
            let id = engine.new_account(&name).await?;
            println!("created account: {} ({id})", name.trim());
        }
        Command::Account(AccountArgs {
            command: AccountCommand::List,
        }) => {
            let accounts = engine.list_accounts().await?;
            if json {
                print_json(&accounts)?;
            } else {
                accounts.iter().for_each(|a| println!("{}", account_line(a)));
            }
        }
        Command::Account(AccountArgs {
            command: AccountCommand::Archive { account, undo },
        }) => {
            let id = resolve_account(engine, &account).await?;
            engine.set_account_archived(id, !undo).await?;
            let action = if undo { "restored" } else { "archived" };
            println!("{action} account: {id}");
        }
        Command::Rule(RuleArgs {
            command: RuleCommand::Create(args),
        }) => {
            let account_id = resolve_account(engine, &args.account).await?;
            let dest = resolve_optional_account(engine, args.dest.as_deref()).await?;

            let mut cmd = RecurringRuleCmd::new(
                args.kind,
                args.amount.cents(),
                account_id,
                args.frequency,
                args.start,
            );
            cmd.dest_account_id = dest;
            cmd.category = args.category;
            cmd.description = args.description;
            cmd.day_of_month = args.day_of_month;
            cmd.day_of_week = args.day_of_week;
            cmd.month_of_year = args.month_of_year;
            cmd.end_date = args.end;

            let id = engine.create_recurring_rule(cmd).await?;
            println!("created rule: {id}");
        }
        Command::Rule(RuleArgs {
            command: RuleCommand::List { active },
        }) => {
            let rules = engine.list_recurring_rules(active).await?;
            if json {
                print_json(&rules)?;
            } else {
                rules.iter().for_each(|r| println!("{}", rule_line(r)));
            }
        }
        Command::Rule(RuleArgs {
            command: RuleCommand::Show { id },
        }) => {
            let rule = engine.recurring_rule(id).await?;
            if json {
                print_json(&rule)?;
            } else {
                println!("{}", rule_line(&rule));
            }
        }
        Command::Rule(RuleArgs {
            command: RuleCommand::Delete { id },
        }) => {
            engine.delete_recurring_rule(id).await?;
            println!("deleted rule: {id}");
        }
        Command::Rule(RuleArgs {
            command: RuleCommand::Upcoming { id, until },
        }) => {
            let dates = engine.upcoming_occurrences(id, until).await?;
            if json {
                print_json(&dates)?;
            } else {
                dates.iter().for_each(|d| println!("{d}"));
            }
        }
        Command::Tx(TxArgs {
            command: TxCommand::Record(args),
        }) => {
            let account_id = resolve_account(engine, &args.account).await?;
            let dest = resolve_optional_account(engine, args.dest.as_deref()).await?;

            let mut cmd =
                TransactionCmd::new(args.kind, args.amount.cents(), account_id, args.date);
            cmd.dest_account_id = dest;
            cmd.category = args.category;
            cmd.description = args.description;

            let id = engine.record_transaction(cmd).await?;
            println!("recorded transaction: {id}");
        }
        Command::Tx(TxArgs {
            command: TxCommand::List(args),
        }) => {
            let filter = TransactionListFilter {
                from: args.from,
                to: args.to,
                account_id: resolve_optional_account(engine, args.account.as_deref()).await?,
                recurring_rule_id: args.rule,
                recurring_only: args.recurring_only,
            };
            let transactions = engine.list_transactions(&filter).await?;
            if json {
                print_json(&transactions)?;
            } else {
                transactions
                    .iter()
                    .for_each(|tx| println!("{}", transaction_line(tx)));
            }
        }
        Command::Tx(TxArgs {
            command: TxCommand::Delete { id },
        }) => {
            engine.delete_transaction(id).await?;
            println!("deleted transaction: {id}");
        }
        Command::Generate(GenerateArgs { today }) => {
            let today = today.unwrap_or_else(|| engine.today());
            let created = engine.generate_recurring_until(today).await?;
            if json {
                print_json(&serde_json::json!({ "today": today, "created": created }))?;
            } else {
                println!("generated {created} transaction(s) up to {today}");
            }
        }
    }

    Ok(())
}
