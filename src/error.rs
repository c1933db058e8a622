// 错误类型定义

use std::path::PathBuf;

/// 客户端统一错误类型
///
/// 所有错误都只影响触发它的那一次调用，客户端在任何一次失败后仍可继续使用
#[derive(Debug, thiserror::Error)]
pub enum BitqiuError {
    /// 未登录、会话失效或扫码超时
    #[error("认证失败: {0}")]
    Authentication(String),

    /// 服务端拒绝请求、HTTP 状态非 200 或响应体无法解析
    #[error("API 错误: {0}")]
    Api(String),

    /// 调用参数不合法（链接协议、批量数量上限等），请求不会被发出
    #[error("参数无效: {0}")]
    InvalidInput(String),

    /// 本地文件不存在
    #[error("文件不存在: {}", .0.display())]
    FileNotFound(PathBuf),

    /// 扫码等待被调用方取消
    #[error("操作已取消")]
    Cancelled,

    /// 传输层失败（连接、超时、客户端已关闭）
    #[error("HTTP 请求失败: {0}")]
    Http(String),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),
}

impl BitqiuError {
    /// 是否为认证类错误（调用方通常需要重新扫码登录）
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Self::Authentication(_))
    }

    /// 是否为服务端/协议类错误
    pub fn is_api_error(&self) -> bool {
        matches!(self, Self::Api(_))
    }

    /// 是否为参数校验错误
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }
}

impl From<reqwest::Error> for BitqiuError {
    fn from(e: reqwest::Error) -> Self {
        Self::Http(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, BitqiuError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_helpers() {
        assert!(BitqiuError::Authentication("x".into()).is_auth_error());
        assert!(BitqiuError::Api("x".into()).is_api_error());
        assert!(BitqiuError::InvalidInput("x".into()).is_invalid_input());
        assert!(!BitqiuError::Cancelled.is_auth_error());
    }

    #[test]
    fn test_file_not_found_display() {
        let err = BitqiuError::FileNotFound(PathBuf::from("/tmp/missing.bin"));
        assert_eq!(err.to_string(), "文件不存在: /tmp/missing.bin");
    }
}
