//! 公共模块
//!
//! 时间戳与本地文件哈希等通用工具

pub mod hash;
pub mod time;

pub use hash::{calculate_file_md5, calculate_file_md5_sync};
pub use time::{datetime_to_timestamp_ms, get_timestamp_ms};
