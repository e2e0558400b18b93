use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    id::{EventId, UserId},
    list::PaginatedList,
    user::{
        event::{CreateUser, DeleteUser, UpdateUser},
        User, UserListOptions,
    },
};
use kernel::repository::user::UserRepository;
use shared::error::{AppError, AppResult};
use sqlx::SqliteConnection;

use crate::database::{
    model::user::{PaginatedUserRow, UserRow},
    ConnectionPool,
};

#[derive(new)]
pub struct UserRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl UserRepository for UserRepositoryImpl {
    #[tracing::instrument(skip(self), err)]
    async fn create(&self, event: CreateUser) -> AppResult<UserId> {
        let user_id = sqlx::query_scalar::<_, UserId>(
            r#"
                INSERT INTO users (name)
                VALUES (?)
                RETURNING user_id
            "#,
        )
        .bind(&event.name)
        .fetch_one(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        tracing::debug!(%user_id, "user created");
        Ok(user_id)
    }

    #[tracing::instrument(skip(self), err)]
    async fn update(&self, event: UpdateUser) -> AppResult<bool> {
        let res = sqlx::query(
            r#"
                UPDATE users
                SET name = ?
                WHERE user_id = ?
            "#,
        )
        .bind(&event.name)
        .bind(event.user_id)
        .execute(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(res.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete(&self, event: DeleteUser) -> AppResult<()> {
        // 紐づけ (event_users) は外部キーの ON DELETE CASCADE で消える
        sqlx::query("DELETE FROM users WHERE user_id = ?")
            .bind(event.user_id)
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        Ok(())
    }

    #[tracing::instrument(skip(self), err)]
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            r#"
                SELECT user_id, name
                FROM users
                WHERE user_id = ?
            "#,
        )
        .bind(user_id)
        .fetch_optional(self.db.inner_ref())
        .await
        .map_err(AppError::SpecificOperationError)?;

        Ok(row.map(User::from))
    }

    #[tracing::instrument(skip(self), err)]
    async fn find_all(&self, options: UserListOptions) -> AppResult<PaginatedList<User>> {
        let UserListOptions { event_id, page } = options;
        let limit = page.effective_limit();
        let offset = page.effective_offset();

        // ページの取得と、ページが空だった場合の件数の取り直しを
        // 同じスナップショット上で行うためにトランザクションを使う
        let mut tx = self.db.begin().await?;

        let rows = match event_id {
            None => sqlx::query_as::<_, PaginatedUserRow>(
                r#"
                    SELECT
                        COUNT(*) OVER () AS total,
                        u.user_id,
                        u.name
                    FROM users AS u
                    ORDER BY u.user_id ASC
                    LIMIT ?
                    OFFSET ?
                "#,
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await,
            Some(event_id) => sqlx::query_as::<_, PaginatedUserRow>(
                r#"
                    SELECT
                        COUNT(*) OVER () AS total,
                        u.user_id,
                        u.name
                    FROM users AS u
                    INNER JOIN event_users AS eu ON eu.user_id = u.user_id
                    WHERE eu.event_id = ?
                    ORDER BY u.user_id ASC
                    LIMIT ?
                    OFFSET ?
                "#,
            )
            .bind(event_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await,
        }
        .map_err(AppError::SpecificOperationError)?;

        let total = match rows.first() {
            Some(row) => row.total,
            None => Self::count(&mut tx, event_id).await?,
        };

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(PaginatedList {
            total,
            limit,
            offset,
            items: rows.into_iter().map(|row| User::from(row.user)).collect(),
        })
    }
}

impl UserRepositoryImpl {
    // OFFSET が件数を超えてページが空になった場合でも全件数を返すために使う
    async fn count(conn: &mut SqliteConnection, event_id: Option<EventId>) -> AppResult<i64> {
        match event_id {
            None => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                .fetch_one(conn)
                .await,
            Some(event_id) => sqlx::query_scalar::<_, i64>(
                r#"
                    SELECT COUNT(*)
                    FROM users AS u
                    INNER JOIN event_users AS eu ON eu.user_id = u.user_id
                    WHERE eu.event_id = ?
                "#,
            )
            .bind(event_id)
            .fetch_one(conn)
            .await,
        }
        .map_err(AppError::SpecificOperationError)
    }
}
