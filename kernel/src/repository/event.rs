use crate::model::{
    event::{
        event::{CreateEvent, DeleteEvent, UpdateEvent},
        Event, EventListOptions,
    },
    id::EventId,
    list::PaginatedList,
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait EventRepository: Send + Sync {
    // イベントと参加ユーザーの紐づけを 1 トランザクションで登録する
    async fn create(&self, event: CreateEvent) -> AppResult<EventId>;
    // 紐づけの差分適用と名前・日時の更新を 1 トランザクションで行う。
    // 更新対象が存在しなければ false を返す
    async fn update(&self, event: UpdateEvent) -> AppResult<bool>;
    // 存在しない ID の削除はエラーにしない
    async fn delete(&self, event: DeleteEvent) -> AppResult<()>;
    async fn find_by_id(&self, event_id: EventId) -> AppResult<Option<Event>>;
    // user_id を指定した場合はそのユーザーに紐づくイベントだけを返す
    async fn find_all(&self, options: EventListOptions) -> AppResult<PaginatedList<Event>>;
}
