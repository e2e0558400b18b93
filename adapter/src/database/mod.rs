use shared::{
    config::DatabaseConfig,
    error::{AppError, AppResult},
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    Sqlite, SqlitePool,
};
use std::str::FromStr;

pub mod model;

fn make_sqlite_connect_options(cfg: &DatabaseConfig) -> AppResult<SqliteConnectOptions> {
    let options = SqliteConnectOptions::from_str(&cfg.url)
        .map_err(AppError::SpecificOperationError)?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal);
    Ok(options)
}

#[derive(Clone)]
pub struct ConnectionPool(SqlitePool);

impl ConnectionPool {
    pub fn new(pool: SqlitePool) -> Self {
        Self(pool)
    }

    pub fn inner_ref(&self) -> &SqlitePool {
        &self.0
    }

    // SQLite のトランザクションは常に SERIALIZABLE 相当で動く。
    // commit せずに drop した場合はロールバックされる
    pub async fn begin(&self) -> AppResult<sqlx::Transaction<'static, Sqlite>> {
        self.0.begin().await.map_err(AppError::TransactionError)
    }

    // 未適用のマイグレーションを適用する
    pub async fn migrate(&self) -> AppResult<()> {
        sqlx::migrate!().run(self.inner_ref()).await?;
        Ok(())
    }
}

pub fn connect_database_with(cfg: &DatabaseConfig) -> AppResult<ConnectionPool> {
    let options = make_sqlite_connect_options(cfg)?;
    let pool = SqlitePoolOptions::new()
        .max_connections(cfg.max_connections)
        .connect_lazy_with(options);
    Ok(ConnectionPool(pool))
}
