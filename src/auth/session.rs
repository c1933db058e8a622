// 会话管理：扫码登录状态机

use crate::auth::{AuthSession, LoginPhase, QrChallenge, QrCodeAuth, QrPollStatus};
use crate::common::get_timestamp_ms;
use crate::config::AuthConfig;
use crate::error::{BitqiuError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// 等待器，轮询间隔通过它实现，测试中可替换为立即返回的实现
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// 基于 tokio 定时器的等待器
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// 会话管理器
///
/// 持有当前会话和登录状态。状态流转：
/// `Unauthenticated → AwaitingScan → Authenticated`，或轮询耗尽后进入 `TimedOut`。
/// 所有流转方法都需要 `&mut self`，同一实例上不会出现并发轮询。
pub struct SessionManager {
    session: AuthSession,
    phase: LoginPhase,
    poll_interval: Duration,
    max_attempts: u32,
    sleeper: Arc<dyn Sleeper>,
}

impl SessionManager {
    pub fn new(config: &AuthConfig) -> Self {
        Self {
            session: AuthSession::empty(),
            phase: LoginPhase::Unauthenticated,
            poll_interval: config.poll_interval(),
            max_attempts: config.max_poll_attempts,
            sleeper: Arc::new(TokioSleeper),
        }
    }

    /// 替换等待器
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.set_sleeper(sleeper);
        self
    }

    pub fn set_sleeper(&mut self, sleeper: Arc<dyn Sleeper>) {
        self.sleeper = sleeper;
    }

    pub fn session(&self) -> &AuthSession {
        &self.session
    }

    pub fn phase(&self) -> &LoginPhase {
        &self.phase
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.is_authenticated()
    }

    /// 获取用户信息后记录根目录
    pub(crate) fn record_root_dir(&mut self, root_dir_id: &str) {
        self.session = self.session.with_root_dir(root_dir_id);
    }

    /// 获取二维码，进入 AwaitingScan
    ///
    /// 任何状态下都可以重新开始；当前会话在新的登录成功前保持不变
    pub async fn begin(&mut self, qr: &QrCodeAuth<'_>) -> Result<QrChallenge> {
        let challenge = match qr.fetch_challenge().await {
            Ok(challenge) => challenge,
            Err(e) => {
                self.phase = LoginPhase::Unauthenticated;
                return Err(e);
            }
        };

        self.phase = LoginPhase::AwaitingScan {
            challenge: challenge.clone(),
            attempts: 0,
        };
        Ok(challenge)
    }

    /// 轮询等待扫码确认
    ///
    /// 每次先等待一个间隔再查询。确认后建立新会话进入 Authenticated；
    /// 轮询次数耗尽进入 TimedOut 并返回认证错误；取消或请求出错时回到 Unauthenticated。
    pub async fn wait_for_confirmation(
        &mut self,
        qr: &QrCodeAuth<'_>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let (challenge, mut attempts) = match &self.phase {
            LoginPhase::AwaitingScan {
                challenge,
                attempts,
            } => (challenge.clone(), *attempts),
            other => {
                return Err(BitqiuError::Authentication(format!(
                    "当前状态 {} 下没有待确认的二维码",
                    other.name()
                )))
            }
        };

        let sleeper = Arc::clone(&self.sleeper);
        let timestamp_ms = get_timestamp_ms();

        while attempts < self.max_attempts {
            let cancelled = tokio::select! {
                biased;
                _ = cancel.cancelled() => true,
                _ = sleeper.sleep(self.poll_interval) => false,
            };
            if cancelled {
                warn!("扫码登录已取消");
                self.phase = LoginPhase::Unauthenticated;
                return Err(BitqiuError::Cancelled);
            }

            attempts += 1;
            self.phase = LoginPhase::AwaitingScan {
                challenge: challenge.clone(),
                attempts,
            };
            info!("等待扫码确认... ({}/{})", attempts, self.max_attempts);

            match qr.poll_status(&challenge, timestamp_ms).await {
                Ok(QrPollStatus::Waiting { .. }) => continue,
                Ok(QrPollStatus::Confirmed {
                    session_token,
                    user_id,
                }) => {
                    let session = match AuthSession::authenticated(session_token, user_id) {
                        Ok(session) => session,
                        Err(e) => {
                            self.phase = LoginPhase::Unauthenticated;
                            return Err(e);
                        }
                    };
                    self.session = session;
                    self.phase = LoginPhase::Authenticated;
                    info!("扫码登录成功, user_id={}", self.session.user_id());
                    return Ok(());
                }
                Err(e) => {
                    warn!("查询扫码状态失败: {}", e);
                    self.phase = LoginPhase::Unauthenticated;
                    return Err(e);
                }
            }
        }

        self.phase = LoginPhase::TimedOut;
        let waited = self.poll_interval * self.max_attempts;
        warn!("扫码登录超时: {} 次轮询均未确认", self.max_attempts);
        Err(BitqiuError::Authentication(format!(
            "扫码登录超时：{} 秒内未完成扫码确认",
            waited.as_secs()
        )))
    }

    /// 完整的扫码登录流程
    ///
    /// `on_challenge` 在拿到二维码后立即调用，用于展示二维码
    pub async fn authenticate<F>(
        &mut self,
        qr: &QrCodeAuth<'_>,
        cancel: &CancellationToken,
        on_challenge: F,
    ) -> Result<()>
    where
        F: FnOnce(&QrChallenge),
    {
        let challenge = self.begin(qr).await?;
        on_challenge(&challenge);
        self.wait_for_confirmation(qr, cancel).await
    }
}
