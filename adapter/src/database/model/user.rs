use kernel::model::{id::UserId, user::User};

#[derive(Debug, sqlx::FromRow)]
pub struct UserRow {
    pub user_id: UserId,
    pub name: String,
}

impl From<UserRow> for User {
    fn from(value: UserRow) -> Self {
        let UserRow { user_id, name } = value;
        User { id: user_id, name }
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct PaginatedUserRow {
    pub total: i64,
    #[sqlx(flatten)]
    pub user: UserRow,
}
