use super::timestamp;
use kernel::model::{
    event::Event,
    id::{EventId, UserId},
};
use shared::error::AppResult;

#[derive(Debug, sqlx::FromRow)]
pub struct EventRow {
    pub event_id: EventId,
    pub name: String,
    pub timestamp: String,
}

// 紐づくユーザー ID は別クエリで取得するため、From ではなく
// 引数をとる into_event メソッドで Event に変換する
impl EventRow {
    pub fn into_event(self, user_ids: Vec<UserId>) -> AppResult<Event> {
        let EventRow {
            event_id,
            name,
            timestamp,
        } = self;
        Ok(Event {
            id: event_id,
            name,
            timestamp: timestamp::decode(&timestamp)?,
            user_ids,
        })
    }
}

// ページネーション用。total は絞り込み条件に一致する全件数
#[derive(Debug, sqlx::FromRow)]
pub struct PaginatedEventRow {
    pub total: i64,
    #[sqlx(flatten)]
    pub event: EventRow,
}
