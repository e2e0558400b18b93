use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    EntityNotFound(String),
    #[error("{0}")]
    ValidationError(#[from] garde::Report),
    #[error("日時の形式が不正です: {value}")]
    MalformedTimestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
    #[error("保存できない日時です: {0}")]
    TimestampOutOfRange(chrono::DateTime<chrono::Utc>),
    #[error("トランザクションを実行できませんでした。")]
    TransactionError(#[source] sqlx::Error),
    #[error("データベース処理実行中にエラーが発生しました。")]
    SpecificOperationError(#[source] sqlx::Error),
    #[error("マイグレーションを適用できませんでした。")]
    MigrationError(#[from] sqlx::migrate::MigrateError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status_code = match self {
            AppError::EntityNotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) | AppError::TimestampOutOfRange(_) => {
                StatusCode::BAD_REQUEST
            }
            e @ (AppError::MalformedTimestamp { .. }
            | AppError::TransactionError(_)
            | AppError::SpecificOperationError(_)
            | AppError::MigrationError(_)) => {
                tracing::error!(
                    error.cause_chain = ?e,
                    error.message = %e,
                    "Unexpected error happened"
                );
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        status_code.into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
