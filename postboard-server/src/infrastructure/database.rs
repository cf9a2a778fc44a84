use anyhow::Result;
use sqlx::{postgres::PgPoolOptions, PgPool};

pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;

    tracing::info!(
        "Database connection pool created (max_connections={})",
        max_connections
    );
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;

    tracing::info!("Database migrations completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    /// The memory store accepts text of any length, so the schema must too.
    #[test]
    fn migrations_do_not_bound_text_columns() {
        for sql in [
            include_str!("../../migrations/0001_create_users.sql"),
            include_str!("../../migrations/0002_create_posts.sql"),
        ] {
            assert!(!sql.to_uppercase().contains("VARCHAR"), "{sql}");
        }
    }
}
