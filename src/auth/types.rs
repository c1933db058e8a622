// 认证模块数据类型定义

use crate::auth::constants::{COOKIE_SESSION_TOKEN, COOKIE_USER_ID};
use crate::error::{BitqiuError, Result};
use serde::{Deserialize, Serialize};

/// 会话信息
///
/// 不可变值：要么三个字段都为空，要么 session_token 与 user_id 同时存在。
/// 状态变化时构造新值，而不是就地修改。
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthSession {
    session_token: String,
    user_id: String,
    root_dir_id: String,
}

impl AuthSession {
    /// 未登录的空会话
    pub fn empty() -> Self {
        Self::default()
    }

    /// 扫码成功后建立的会话，两项凭证都必须非空
    pub fn authenticated(
        session_token: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Result<Self> {
        let session_token = session_token.into();
        let user_id = user_id.into();
        if session_token.is_empty() || user_id.is_empty() {
            return Err(BitqiuError::Authentication(
                "会话凭证不完整：缺少会话令牌或用户 ID".to_string(),
            ));
        }
        Ok(Self {
            session_token,
            user_id,
            root_dir_id: String::new(),
        })
    }

    /// 记录根目录 ID，返回新的会话值；未登录时原样返回
    pub fn with_root_dir(&self, root_dir_id: impl Into<String>) -> Self {
        if !self.is_authenticated() {
            return self.clone();
        }
        Self {
            root_dir_id: root_dir_id.into(),
            ..self.clone()
        }
    }

    pub fn session_token(&self) -> &str {
        &self.session_token
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn root_dir_id(&self) -> &str {
        &self.root_dir_id
    }

    pub fn is_authenticated(&self) -> bool {
        !self.session_token.is_empty() && !self.user_id.is_empty()
    }

    pub fn has_root_dir(&self) -> bool {
        !self.root_dir_id.is_empty()
    }

    /// 需要随请求携带的 Cookie
    pub fn cookies(&self) -> Vec<(String, String)> {
        if !self.is_authenticated() {
            return Vec::new();
        }
        vec![
            (COOKIE_SESSION_TOKEN.to_string(), self.session_token.clone()),
            (COOKIE_USER_ID.to_string(), self.user_id.clone()),
        ]
    }
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // 令牌只显示前几位
        let token_preview: String = self.session_token.chars().take(6).collect();
        f.debug_struct("AuthSession")
            .field("session_token", &format!("{}...", token_preview))
            .field("user_id", &self.user_id)
            .field("root_dir_id", &self.root_dir_id)
            .finish()
    }
}

/// 登录二维码
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QrChallenge {
    /// 校验码，轮询时回传
    pub verify_code: String,
    /// 二维码内容（短期有效的图片链接，不是认证凭证）
    pub image_url: String,
    /// 经二维码渲染服务包装后的可展示链接
    pub render_url: String,
}

impl QrChallenge {
    /// 在终端中以 Unicode 字符绘制二维码
    pub fn render_terminal(&self) -> Result<String> {
        use qrcode::render::unicode;
        use qrcode::QrCode;

        let code = QrCode::new(self.image_url.as_bytes())
            .map_err(|e| BitqiuError::InvalidInput(format!("无法生成二维码: {}", e)))?;

        Ok(code
            .render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .build())
    }
}

/// 单次轮询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrPollStatus {
    /// 尚未扫码/确认
    Waiting { message: String },
    /// 已确认，携带从 Cookie 中取出的凭证
    Confirmed { session_token: String, user_id: String },
}

/// 扫码登录状态机
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginPhase {
    /// 未登录
    Unauthenticated,
    /// 已获取二维码，等待扫码
    AwaitingScan { challenge: QrChallenge, attempts: u32 },
    /// 登录成功
    Authenticated,
    /// 轮询次数耗尽，需要重新获取二维码
    TimedOut,
}

impl LoginPhase {
    pub fn name(&self) -> &'static str {
        match self {
            LoginPhase::Unauthenticated => "unauthenticated",
            LoginPhase::AwaitingScan { .. } => "awaiting_scan",
            LoginPhase::Authenticated => "authenticated",
            LoginPhase::TimedOut => "timed_out",
        }
    }
}
