//! 认证模块
//!
//! 扫码登录：获取二维码，轮询扫码状态，确认后从响应 Cookie 中建立会话

pub mod constants;
pub mod qrcode;
pub mod session;
pub mod types;

pub use qrcode::QrCodeAuth;
pub use session::{SessionManager, Sleeper, TokioSleeper};
pub use types::{AuthSession, LoginPhase, QrChallenge, QrPollStatus};
