use chrono::{DateTime, SecondsFormat, Utc};
use kernel::model::event::is_storable_timestamp;
use shared::error::{AppError, AppResult};

// 保存形式は RFC 3339。UTC・ナノ秒固定幅で書き出すため、
// 文字列の辞書順がそのまま時系列順になる。
// 4 桁に収まらない年は decode できず並びも崩れるので書き込ませない
pub fn encode(timestamp: &DateTime<Utc>) -> AppResult<String> {
    if !is_storable_timestamp(timestamp) {
        return Err(AppError::TimestampOutOfRange(*timestamp));
    }
    Ok(timestamp.to_rfc3339_opts(SecondsFormat::Nanos, true))
}

pub fn decode(value: &str) -> AppResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| AppError::MalformedTimestamp {
            value: value.to_string(),
            source,
        })
}
