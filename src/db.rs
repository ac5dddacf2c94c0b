use sqlx::SqlitePool;
use sqlx::sqlite::SqlitePoolOptions;

use crate::error::AppError;

pub async fn connect(database_url: &str) -> Result<SqlitePool, AppError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(database_url)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(db: &SqlitePool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .map_err(|e| AppError::Database(e.into()))
}
