// BitQiu Rust Library
// 比特球网盘 Rust 客户端核心库

// 认证模块
pub mod auth;

// 公共模块（时间戳、文件哈希）
pub mod common;

// 配置管理模块
pub mod config;

// 错误类型
pub mod error;

// 日志系统
pub mod logging;

// 网盘API模块
pub mod netdisk;

// 请求/响应协议
pub mod protocol;

// HTTP 传输层
pub mod transport;

// 导出常用类型
pub use auth::{AuthSession, LoginPhase, QrChallenge, SessionManager, Sleeper, TokioSleeper};
pub use common::{calculate_file_md5, datetime_to_timestamp_ms, get_timestamp_ms};
pub use config::ClientConfig;
pub use error::{BitqiuError, Result};
pub use netdisk::{
    BitqiuClient, CollectionAction, DirectoryInfo, DownloadInfo, DownloadTask, FileResource,
    ResourceKind, TaskStatus, UserInfo, UserPrivilege,
};
pub use protocol::{ApiOutcome, ApiProtocol};
pub use transport::{HttpTransport, ReqwestTransport};
