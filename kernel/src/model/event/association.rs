use crate::model::id::UserId;
use std::collections::{BTreeSet, HashSet};

/// 既存のユーザー集合を目的の集合に変えるために必要な追加分と削除分
///
/// 入力はどちらも集合として扱う（順序・重複は無視）。出力は昇順に並ぶ。
#[derive(Debug, Default, PartialEq, Eq)]
pub struct UserIdsDiff {
    pub to_add: Vec<UserId>,
    pub to_remove: Vec<UserId>,
}

impl UserIdsDiff {
    pub fn between(existing: &[UserId], desired: &[UserId]) -> Self {
        let existing: BTreeSet<UserId> = existing.iter().copied().collect();
        let desired: BTreeSet<UserId> = desired.iter().copied().collect();

        Self {
            to_add: desired.difference(&existing).copied().collect(),
            to_remove: existing.difference(&desired).copied().collect(),
        }
    }

    /// 集合として同一であれば true。このときストレージへの書き込みは不要
    pub fn is_empty(&self) -> bool {
        self.to_add.is_empty() && self.to_remove.is_empty()
    }
}

/// 重複した ID を取り除く。最初に現れた位置の順序を保つ
pub fn dedup_user_ids(user_ids: &[UserId]) -> Vec<UserId> {
    let mut seen = HashSet::with_capacity(user_ids.len());
    user_ids
        .iter()
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}
