use crate::model::{
    id::{EventId, UserId},
    list::ListOptions,
};
use chrono::{DateTime, Datelike, Utc};

pub mod association;
pub mod event;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub timestamp: DateTime<Utc>,
    // 読み出しのたびにストレージから組み立て直す。並びは user_id の昇順
    pub user_ids: Vec<UserId>,
}

// user_id を指定した場合はそのユーザーが参加しているイベントだけを返す
#[derive(Debug, Clone, Copy, Default)]
pub struct EventListOptions {
    pub user_id: Option<UserId>,
    pub page: ListOptions,
}

/// 保存できる日時の年の範囲。RFC 3339 は 4 桁の年しか表せない
pub const STORABLE_YEARS: std::ops::RangeInclusive<i32> = 0..=9999;

pub fn is_storable_timestamp(timestamp: &DateTime<Utc>) -> bool {
    STORABLE_YEARS.contains(&timestamp.year())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn storable_years_are_four_digits() {
        let ok = [(0, 1, 1), (2024, 5, 1), (9999, 12, 31)];
        for (y, m, d) in ok {
            let t = Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();
            assert!(is_storable_timestamp(&t), "{t}");
        }
        let ng = [(-1, 12, 31), (10000, 1, 1)];
        for (y, m, d) in ng {
            let t = Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap();
            assert!(!is_storable_timestamp(&t), "{t}");
        }
    }
}
