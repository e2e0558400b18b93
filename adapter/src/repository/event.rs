use async_trait::async_trait;
use derive_new::new;
use kernel::model::{
    event::{
        association::{dedup_user_ids, UserIdsDiff},
        event::{CreateEvent, DeleteEvent, UpdateEvent},
        Event, EventListOptions,
    },
    id::{EventId, UserId},
    list::PaginatedList,
};
use kernel::repository::event::EventRepository;
use shared::error::{AppError, AppResult};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::database::{
    model::{
        event::{EventRow, PaginatedEventRow},
        timestamp,
    },
    ConnectionPool,
};

#[derive(new)]
pub struct EventRepositoryImpl {
    db: ConnectionPool,
}

#[async_trait]
impl EventRepository for EventRepositoryImpl {
    #[tracing::instrument(skip(self), err)]
    async fn create(&self, event: CreateEvent) -> AppResult<EventId> {
        let encoded = timestamp::encode(&event.timestamp)?;
        let mut tx = self.db.begin().await?;

        let event_id = sqlx::query_scalar::<_, EventId>(
            r#"
                INSERT INTO events (name, timestamp)
                VALUES (?, ?)
                RETURNING event_id
            "#,
        )
        .bind(&event.name)
        .bind(&encoded)
        .fetch_one(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        // 同じユーザー ID が複数回指定された場合は 1 件にまとめる。
        // 存在しないユーザー ID があれば外部キー制約違反となり、全体がロールバックされる
        for user_id in dedup_user_ids(&event.user_ids) {
            Self::insert_event_user(&mut tx, event_id, user_id).await?;
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        tracing::debug!(%event_id, "event created");
        Ok(event_id)
    }

    #[tracing::instrument(skip(self), err)]
    async fn update(&self, event: UpdateEvent) -> AppResult<bool> {
        let encoded = timestamp::encode(&event.timestamp)?;
        let mut tx = self.db.begin().await?;

        // 更新対象のイベントが存在しなければ何も書き込まずに終了する
        // （tx は drop 時にロールバックされる）
        if Self::find_row(&mut tx, event.event_id).await?.is_none() {
            return Ok(false);
        }

        let current = Self::find_user_ids(&mut tx, event.event_id).await?;
        let diff = UserIdsDiff::between(&current, &event.user_ids);
        if !diff.is_empty() {
            for user_id in &diff.to_add {
                Self::insert_event_user(&mut tx, event.event_id, *user_id).await?;
            }
            Self::delete_event_users(&mut tx, event.event_id, &diff.to_remove).await?;
            tracing::debug!(
                event_id = %event.event_id,
                added = diff.to_add.len(),
                removed = diff.to_remove.len(),
                "event users reconciled"
            );
        }

        // 名前・日時は差分の有無にかかわらず更新する。
        // 戻り値の found はこの UPDATE の影響行数で判定する
        let res = sqlx::query(
            r#"
                UPDATE events
                SET name = ?, timestamp = ?
                WHERE event_id = ?
            "#,
        )
        .bind(&event.name)
        .bind(&encoded)
        .bind(event.event_id)
        .execute(&mut *tx)
        .await
        .map_err(AppError::SpecificOperationError)?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(res.rows_affected() > 0)
    }

    #[tracing::instrument(skip(self), err)]
    async fn delete(&self, event: DeleteEvent) -> AppResult<()> {
        // 紐づけ (event_users) は外部キーの ON DELETE CASCADE で消える
        sqlx::query("DELETE FROM events WHERE event_id = ?")
            .bind(event.event_id)
            .execute(self.db.inner_ref())
            .await
            .map_err(AppError::SpecificOperationError)?;

        Ok(())
    }

    #[tracing::instrument(skip(self), err)]
    async fn find_by_id(&self, event_id: EventId) -> AppResult<Option<Event>> {
        // イベント本体と紐づけを同じトランザクションで読み、食い違いを防ぐ
        let mut tx = self.db.begin().await?;

        let Some(row) = Self::find_row(&mut tx, event_id).await? else {
            return Ok(None);
        };
        let user_ids = Self::find_user_ids(&mut tx, event_id).await?;

        tx.commit().await.map_err(AppError::TransactionError)?;

        row.into_event(user_ids).map(Some)
    }

    #[tracing::instrument(skip(self), err)]
    async fn find_all(&self, options: EventListOptions) -> AppResult<PaginatedList<Event>> {
        let EventListOptions { user_id, page } = options;
        let limit = page.effective_limit();
        let offset = page.effective_offset();

        let mut tx = self.db.begin().await?;

        let rows = match user_id {
            None => sqlx::query_as::<_, PaginatedEventRow>(
                r#"
                    SELECT
                        COUNT(*) OVER () AS total,
                        e.event_id,
                        e.name,
                        e.timestamp
                    FROM events AS e
                    ORDER BY e.event_id ASC
                    LIMIT ?
                    OFFSET ?
                "#,
            )
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await,
            Some(user_id) => sqlx::query_as::<_, PaginatedEventRow>(
                r#"
                    SELECT
                        COUNT(*) OVER () AS total,
                        e.event_id,
                        e.name,
                        e.timestamp
                    FROM events AS e
                    INNER JOIN event_users AS eu ON eu.event_id = e.event_id
                    WHERE eu.user_id = ?
                    ORDER BY e.event_id ASC
                    LIMIT ?
                    OFFSET ?
                "#,
            )
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&mut *tx)
            .await,
        }
        .map_err(AppError::SpecificOperationError)?;

        let total = match rows.first() {
            Some(row) => row.total,
            None => Self::count(&mut tx, user_id).await?,
        };

        // イベントごとに紐づくユーザー ID を取得する。
        // 日時の復元に 1 件でも失敗したらページ全体をエラーとする
        let mut items = Vec::with_capacity(rows.len());
        for PaginatedEventRow { event, .. } in rows {
            let user_ids = Self::find_user_ids(&mut tx, event.event_id).await?;
            items.push(event.into_event(user_ids)?);
        }

        tx.commit().await.map_err(AppError::TransactionError)?;

        Ok(PaginatedList {
            total,
            limit,
            offset,
            items,
        })
    }
}

impl EventRepositoryImpl {
    async fn find_row(conn: &mut SqliteConnection, event_id: EventId) -> AppResult<Option<EventRow>> {
        sqlx::query_as::<_, EventRow>(
            r#"
                SELECT event_id, name, timestamp
                FROM events
                WHERE event_id = ?
            "#,
        )
        .bind(event_id)
        .fetch_optional(conn)
        .await
        .map_err(AppError::SpecificOperationError)
    }

    // 紐づけが 1 件もない場合は空の Vec を返す
    async fn find_user_ids(conn: &mut SqliteConnection, event_id: EventId) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar::<_, UserId>(
            r#"
                SELECT user_id
                FROM event_users
                WHERE event_id = ?
                ORDER BY user_id ASC
            "#,
        )
        .bind(event_id)
        .fetch_all(conn)
        .await
        .map_err(AppError::SpecificOperationError)
    }

    async fn insert_event_user(
        conn: &mut SqliteConnection,
        event_id: EventId,
        user_id: UserId,
    ) -> AppResult<()> {
        sqlx::query("INSERT INTO event_users (event_id, user_id) VALUES (?, ?)")
            .bind(event_id)
            .bind(user_id)
            .execute(conn)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    // 指定したユーザー ID の紐づけを 1 文でまとめて削除する
    async fn delete_event_users(
        conn: &mut SqliteConnection,
        event_id: EventId,
        user_ids: &[UserId],
    ) -> AppResult<()> {
        if user_ids.is_empty() {
            return Ok(());
        }

        let mut query = QueryBuilder::<Sqlite>::new("DELETE FROM event_users WHERE event_id = ");
        query.push_bind(event_id);
        query.push(" AND user_id IN (");
        let mut separated = query.separated(", ");
        for user_id in user_ids {
            separated.push_bind(*user_id);
        }
        separated.push_unseparated(")");

        query
            .build()
            .execute(conn)
            .await
            .map_err(AppError::SpecificOperationError)?;
        Ok(())
    }

    async fn count(conn: &mut SqliteConnection, user_id: Option<UserId>) -> AppResult<i64> {
        match user_id {
            None => sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM events")
                .fetch_one(conn)
                .await,
            Some(user_id) => sqlx::query_scalar::<_, i64>(
                r#"
                    SELECT COUNT(*)
                    FROM events AS e
                    INNER JOIN event_users AS eu ON eu.event_id = e.event_id
                    WHERE eu.user_id = ?
                "#,
            )
            .bind(user_id)
            .fetch_one(conn)
            .await,
        }
        .map_err(AppError::SpecificOperationError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::user::UserRepositoryImpl;
    use chrono::{DateTime, TimeZone, Utc};
    use kernel::model::{
        list::ListOptions,
        user::{
            event::{CreateUser, DeleteUser},
            UserListOptions,
        },
    };
    use kernel::repository::user::UserRepository;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 0).unwrap()
    }

    async fn create_users(db: &ConnectionPool, names: &[&str]) -> anyhow::Result<Vec<UserId>> {
        let repo = UserRepositoryImpl::new(db.clone());
        let mut ids = Vec::new();
        for name in names {
            ids.push(repo.create(CreateUser::new(name.to_string())).await?);
        }
        Ok(ids)
    }

    async fn count_event_users(db: &ConnectionPool) -> anyhow::Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM event_users")
            .fetch_one(db.inner_ref())
            .await?;
        Ok(count)
    }

    #[sqlx::test]
    async fn test_register_event_without_users(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let repo = EventRepositoryImpl::new(ConnectionPool::new(pool));

        let event_id = repo
            .create(CreateEvent::new("Launch".into(), t0(), vec![]))
            .await?;

        let res = repo.find_by_id(event_id).await?;
        assert_eq!(
            res,
            Some(Event {
                id: event_id,
                name: "Launch".into(),
                timestamp: t0(),
                user_ids: vec![],
            })
        );
        Ok(())
    }

    #[sqlx::test]
    async fn test_register_event_with_duplicate_users(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["a", "b"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());

        let event_id = repo
            .create(CreateEvent::new(
                "Meetup".into(),
                t0(),
                vec![users[1], users[0], users[1]],
            ))
            .await?;

        let event = repo.find_by_id(event_id).await?.unwrap();
        assert_eq!(event.user_ids, vec![users[0], users[1]]);
        assert_eq!(count_event_users(&db).await?, 2);
        Ok(())
    }

    #[sqlx::test]
    async fn test_register_event_rolls_back(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["a"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());

        // 2 件目のユーザーは存在しないため、紐づけの INSERT で失敗する
        let res = repo
            .create(CreateEvent::new(
                "Broken".into(),
                t0(),
                vec![users[0], UserId::new(999)],
            ))
            .await;
        assert!(matches!(res, Err(AppError::SpecificOperationError(_))));

        let page = repo.find_all(EventListOptions::default()).await?;
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());
        assert_eq!(count_event_users(&db).await?, 0);
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_event_users(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["u1", "u2", "u3"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());

        let event_id = repo
            .create(CreateEvent::new(
                "Launch".into(),
                t0(),
                vec![users[0], users[1]],
            ))
            .await?;

        let t1 = t0() + chrono::Duration::hours(2);
        let found = repo
            .update(UpdateEvent::new(
                event_id,
                "Launch (moved)".into(),
                t1,
                vec![users[1], users[2]],
            ))
            .await?;
        assert!(found);

        let event = repo.find_by_id(event_id).await?.unwrap();
        assert_eq!(event.name, "Launch (moved)");
        assert_eq!(event.timestamp, t1);
        assert_eq!(event.user_ids, vec![users[1], users[2]]);
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_event_without_changes(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["u1", "u2"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());

        let event_id = repo
            .create(CreateEvent::new("Same".into(), t0(), users.clone()))
            .await?;
        let before = repo.find_by_id(event_id).await?.unwrap();

        // 順序を入れ替えても集合としては同じなので紐づけは変わらない
        let reversed: Vec<UserId> = users.iter().rev().copied().collect();
        let found = repo
            .update(UpdateEvent::new(event_id, "Same".into(), t0(), reversed))
            .await?;
        assert!(found);

        let after = repo.find_by_id(event_id).await?.unwrap();
        assert_eq!(before, after);
        assert_eq!(count_event_users(&db).await?, 2);
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_missing_event(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["u1"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());
        let event_id = repo
            .create(CreateEvent::new("Existing".into(), t0(), users.clone()))
            .await?;

        let found = repo
            .update(UpdateEvent::new(
                EventId::new(event_id.raw() + 100),
                "Ghost".into(),
                t0(),
                users.clone(),
            ))
            .await?;
        assert!(!found);

        let page = repo.find_all(EventListOptions::default()).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "Existing");
        assert_eq!(count_event_users(&db).await?, 1);
        Ok(())
    }

    #[sqlx::test]
    async fn test_update_rolls_back_on_unknown_user(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["u1", "u2"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());
        let event_id = repo
            .create(CreateEvent::new("Launch".into(), t0(), vec![users[0]]))
            .await?;

        let res = repo
            .update(UpdateEvent::new(
                event_id,
                "Renamed".into(),
                t0(),
                vec![users[1], UserId::new(999)],
            ))
            .await;
        assert!(res.is_err());

        let event = repo.find_by_id(event_id).await?.unwrap();
        assert_eq!(event.name, "Launch");
        assert_eq!(event.user_ids, vec![users[0]]);
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_event(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["u1", "u2"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());
        let event_id = repo
            .create(CreateEvent::new("Launch".into(), t0(), users.clone()))
            .await?;

        repo.delete(DeleteEvent::new(event_id)).await?;
        assert!(repo.find_by_id(event_id).await?.is_none());
        assert_eq!(count_event_users(&db).await?, 0);

        // 存在しない ID の削除はエラーにならない
        repo.delete(DeleteEvent::new(event_id)).await?;

        // ユーザーは残る
        let user_repo = UserRepositoryImpl::new(db.clone());
        let page = user_repo.find_all(UserListOptions::default()).await?;
        assert_eq!(page.total, 2);
        Ok(())
    }

    #[sqlx::test]
    async fn test_delete_user_detaches_events(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["u1", "u2"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());
        let event_id = repo
            .create(CreateEvent::new("Launch".into(), t0(), users.clone()))
            .await?;

        UserRepositoryImpl::new(db.clone())
            .delete(DeleteUser::new(users[0]))
            .await?;

        let event = repo.find_by_id(event_id).await?.unwrap();
        assert_eq!(event.user_ids, vec![users[1]]);
        Ok(())
    }

    #[sqlx::test]
    async fn test_find_all_pages(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["u1"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());

        let mut created = Vec::new();
        for i in 0..7 {
            // 偶数番目のイベントだけ u1 を紐づける
            let user_ids = if i % 2 == 0 { vec![users[0]] } else { vec![] };
            let event_id = repo
                .create(CreateEvent::new(
                    format!("event-{i}"),
                    t0() + chrono::Duration::days(i),
                    user_ids,
                ))
                .await?;
            created.push(event_id);
        }

        let mut seen = Vec::new();
        let mut offset = 0;
        loop {
            let page = repo
                .find_all(EventListOptions {
                    user_id: None,
                    page: ListOptions::new(3, offset),
                })
                .await?;
            assert_eq!(page.total, 7);
            if page.items.is_empty() {
                break;
            }
            offset += page.items.len() as u64;
            seen.extend(page.items);
        }
        assert_eq!(seen.len(), 7);
        assert_eq!(seen.iter().map(|e| e.id).collect::<Vec<_>>(), created);
        assert_eq!(seen[0].user_ids, vec![users[0]]);
        assert!(seen[1].user_ids.is_empty());

        // limit = 0 は上限なし
        let all = repo.find_all(EventListOptions::default()).await?;
        assert_eq!(all.total, 7);
        assert_eq!(all.items.len(), 7);

        let beyond = repo
            .find_all(EventListOptions {
                user_id: None,
                page: ListOptions::new(3, 100),
            })
            .await?;
        assert_eq!(beyond.total, 7);
        assert!(beyond.items.is_empty());
        Ok(())
    }

    #[sqlx::test]
    async fn test_find_all_by_user_and_by_event(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let users = create_users(&db, &["u1", "u2", "u3"]).await?;
        let repo = EventRepositoryImpl::new(db.clone());

        let first = repo
            .create(CreateEvent::new("first".into(), t0(), vec![users[0], users[1]]))
            .await?;
        let second = repo
            .create(CreateEvent::new("second".into(), t0(), vec![users[1]]))
            .await?;

        let page = repo
            .find_all(EventListOptions {
                user_id: Some(users[1]),
                page: ListOptions::new(1, 0),
            })
            .await?;
        assert_eq!(page.total, 2);
        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, first);
        assert_eq!(page.items[0].user_ids, vec![users[0], users[1]]);

        let page = repo
            .find_all(EventListOptions {
                user_id: Some(users[1]),
                page: ListOptions::new(1, 1),
            })
            .await?;
        assert_eq!(page.total, 2);
        assert_eq!(page.items[0].id, second);

        let page = repo
            .find_all(EventListOptions {
                user_id: Some(users[2]),
                page: ListOptions::default(),
            })
            .await?;
        assert_eq!(page.total, 0);
        assert!(page.items.is_empty());

        let user_repo = UserRepositoryImpl::new(db.clone());
        let page = user_repo
            .find_all(UserListOptions {
                event_id: Some(first),
                page: ListOptions::default(),
            })
            .await?;
        assert_eq!(page.total, 2);
        assert_eq!(
            page.items.iter().map(|u| u.id).collect::<Vec<_>>(),
            vec![users[0], users[1]]
        );

        let page = user_repo
            .find_all(UserListOptions {
                event_id: Some(second),
                page: ListOptions::new(5, 1),
            })
            .await?;
        assert_eq!(page.total, 1);
        assert!(page.items.is_empty());
        Ok(())
    }

    #[sqlx::test]
    async fn test_out_of_range_timestamp_is_not_written(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let repo = EventRepositoryImpl::new(db.clone());
        let users = create_users(&db, &["alice"]).await?;
        let event_id = repo
            .create(CreateEvent::new("ok".into(), t0(), users.clone()))
            .await?;
        let far: DateTime<Utc> = "+10000-01-01T00:00:00Z".parse()?;

        let res = repo
            .create(CreateEvent::new("far".into(), far, users.clone()))
            .await;
        assert!(matches!(res, Err(AppError::TimestampOutOfRange(_))));
        let res = repo
            .update(UpdateEvent::new(event_id, "far".into(), far, vec![]))
            .await;
        assert!(matches!(res, Err(AppError::TimestampOutOfRange(_))));

        // 拒否された書き込みは何も残さず、一覧は読めたまま
        let page = repo.find_all(EventListOptions::default()).await?;
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].name, "ok");
        assert_eq!(page.items[0].timestamp, t0());
        assert_eq!(page.items[0].user_ids, users);
        assert_eq!(count_event_users(&db).await?, 1);
        Ok(())
    }

    #[sqlx::test]
    async fn test_malformed_timestamp_fails_whole_page(pool: sqlx::SqlitePool) -> anyhow::Result<()> {
        let db = ConnectionPool::new(pool);
        let repo = EventRepositoryImpl::new(db.clone());
        repo.create(CreateEvent::new("ok".into(), t0(), vec![])).await?;
        let broken = repo
            .create(CreateEvent::new("broken".into(), t0(), vec![]))
            .await?;

        sqlx::query("UPDATE events SET timestamp = 'not a timestamp' WHERE event_id = ?")
            .bind(broken)
            .execute(db.inner_ref())
            .await?;

        let res = repo.find_all(EventListOptions::default()).await;
        assert!(matches!(res, Err(AppError::MalformedTimestamp { .. })));
        let res = repo.find_by_id(broken).await;
        assert!(matches!(res, Err(AppError::MalformedTimestamp { .. })));
        Ok(())
    }
}
