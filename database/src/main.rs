use anyhow::Context;
use database::PgStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenv::dotenv();
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;

    let store = PgStore::connect(&database_url).await?;
    store.migrate().await?;

    println!("Migrations applied.");

    Ok(())
}
