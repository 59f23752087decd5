use engine::{Engine, SystemClock};
use migration::{Migrator, MigratorTrait};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let db = connect(&settings.database).await?;
    let engine = Engine::builder()
        .database(db)
        .clock(SystemClock)
        .build()
        .await?;

    // Opening the ledger is the moment pending occurrences get materialized.
    let created = match engine.generate_recurring().await {
        Ok(created) => created,
        Err(err) => {
            tracing::error!("recurring generation failed: {err}");
            return Err(err.into());
        }
    };

    let active = engine.list_recurring_rules(true).await?;
    tracing::info!(
        today = %engine.today(),
        created,
        active_rules = active.len(),
        "ledger ready"
    );

    Ok(())
}

async fn connect(
    config: &settings::Database,
) -> Result<sea_orm::DatabaseConnection, Box<dyn std::error::Error + Send + Sync>> {
    let database = sea_orm::Database::connect(config.url()).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
