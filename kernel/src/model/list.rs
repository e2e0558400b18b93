/// `limit = 0` のときに代わりに使う上限値
pub const UNLIMITED: i64 = i64::MAX;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListOptions {
    pub limit: u64,
    pub offset: u64,
}

impl ListOptions {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// SQL の LIMIT に渡す値。0 は「上限なし」として扱う。
    pub fn effective_limit(&self) -> i64 {
        match self.limit {
            0 => UNLIMITED,
            n => i64::try_from(n).unwrap_or(UNLIMITED),
        }
    }

    /// SQL の OFFSET に渡す値。i64 に収まらない値は飽和させる。
    pub fn effective_offset(&self) -> i64 {
        i64::try_from(self.offset).unwrap_or(i64::MAX)
    }
}

/// 1 ページ分の要素と、絞り込み条件に一致する全件数
#[derive(Debug)]
pub struct PaginatedList<T> {
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
    pub items: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_limit_means_unlimited() {
        assert_eq!(ListOptions::new(0, 0).effective_limit(), UNLIMITED);
        assert_eq!(ListOptions::new(20, 0).effective_limit(), 20);
    }

    #[test]
    fn oversized_values_saturate() {
        let options = ListOptions::new(u64::MAX, u64::MAX);
        assert_eq!(options.effective_limit(), UNLIMITED);
        assert_eq!(options.effective_offset(), i64::MAX);
    }
}
