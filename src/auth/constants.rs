// 认证相关常量

use std::time::Duration;

/// 获取登录二维码
pub const API_QR_CODE: &str = "/loginServer/getQRCode";

/// 查询二维码扫码状态
pub const API_QR_CODE_INFO: &str = "/loginServer/getQRCodeInfo";

/// 会话令牌 Cookie
pub const COOKIE_SESSION_TOKEN: &str = "cloud_web_sid";

/// 用户 ID Cookie
pub const COOKIE_USER_ID: &str = "cloud_web_uid";

/// 扫码状态查询的单次请求超时
///
/// 状态接口可能挂起连接直到扫码，不能沿用普通接口的超时
pub const QR_POLL_REQUEST_TIMEOUT: Duration = Duration::from_secs(300);
