use crate::model::{
    id::UserId,
    list::PaginatedList,
    user::{
        event::{CreateUser, DeleteUser, UpdateUser},
        User, UserListOptions,
    },
};
use async_trait::async_trait;
use shared::error::AppResult;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, event: CreateUser) -> AppResult<UserId>;
    // 更新対象が存在しなければ false を返す
    async fn update(&self, event: UpdateUser) -> AppResult<bool>;
    // 存在しない ID の削除はエラーにしない
    async fn delete(&self, event: DeleteUser) -> AppResult<()>;
    async fn find_by_id(&self, user_id: UserId) -> AppResult<Option<User>>;
    // event_id を指定した場合はそのイベントに紐づくユーザーだけを返す
    async fn find_all(&self, options: UserListOptions) -> AppResult<PaginatedList<User>>;
}
