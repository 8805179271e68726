use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

pub static MIGRATOR: Migrator = sqlx::migrate!();

const MAX_CONNECTIONS: u32 = 5;

pub async fn connect(database_url: &str) -> sqlx::Result<PgPool> {
    PgPoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(database_url)
        .await
}
