// 时间戳工具

use crate::error::{BitqiuError, Result};
use chrono::{Local, NaiveDateTime, TimeZone};

/// 服务端返回的时间格式（本地时间）
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// 当前时间戳（毫秒）
pub fn get_timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// 将 `YYYY-MM-DD HH:MM:SS` 格式的本地时间转换为毫秒时间戳
///
/// 格式不符或落在夏令时空档中的时间都视为解析失败
pub fn datetime_to_timestamp_ms(datetime: &str) -> Result<i64> {
    let naive = NaiveDateTime::parse_from_str(datetime, DATETIME_FORMAT)
        .map_err(|e| BitqiuError::Api(format!("时间格式无效 '{}': {}", datetime, e)))?;

    // 夏令时回拨导致的重复时刻取较早的一个
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .ok_or_else(|| BitqiuError::Api(format!("本地时区中不存在该时间: {}", datetime)))
}
