// 二维码登录接口

use crate::auth::constants::*;
use crate::auth::{AuthSession, QrChallenge, QrPollStatus};
use crate::common::get_timestamp_ms;
use crate::error::{BitqiuError, Result};
use crate::protocol::{ApiOutcome, ApiProtocol};
use crate::transport::HttpMethod;
use tracing::{debug, info};

/// 二维码登录接口封装
///
/// 只负责单次请求，等待与状态流转由 [`crate::auth::SessionManager`] 驱动
pub struct QrCodeAuth<'a> {
    protocol: &'a ApiProtocol,
    render_api: &'a str,
}

impl<'a> QrCodeAuth<'a> {
    /// # 参数
    /// * `render_api` - 二维码渲染服务模板，`{}` 处填入图片链接
    pub fn new(protocol: &'a ApiProtocol, render_api: &'a str) -> Self {
        Self {
            protocol,
            render_api,
        }
    }

    /// 获取登录二维码
    pub async fn fetch_challenge(&self) -> Result<QrChallenge> {
        info!("开始获取登录二维码");

        let outcome = self
            .protocol
            .get(
                API_QR_CODE,
                &[("_", get_timestamp_ms().to_string())],
                &AuthSession::empty(),
            )
            .await?;

        let data = match outcome {
            ApiOutcome::Success { data, .. } => data,
            ApiOutcome::Failure { message, .. } => {
                return Err(BitqiuError::Authentication(format!(
                    "获取二维码失败: {}",
                    message
                )))
            }
        };

        let verify_code = data["code"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BitqiuError::Authentication("二维码响应缺少校验码".to_string()))?
            .to_string();
        let image_url = data["url"]
            .as_str()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| BitqiuError::Authentication("二维码响应缺少图片链接".to_string()))?
            .to_string();

        let render_url = self
            .render_api
            .replacen("{}", &urlencoding::encode(&image_url), 1);

        debug!("二维码校验码: {}", verify_code);

        Ok(QrChallenge {
            verify_code,
            image_url,
            render_url,
        })
    }

    /// 查询一次扫码状态
    ///
    /// 服务端返回成功码即表示用户已确认，凭证从响应 Cookie 中提取；
    /// 返回非成功码表示尚未扫码，不算错误
    pub async fn poll_status(
        &self,
        challenge: &QrChallenge,
        timestamp_ms: i64,
    ) -> Result<QrPollStatus> {
        let reply = self
            .protocol
            .call_with_timeout(
                HttpMethod::Get,
                API_QR_CODE_INFO,
                &[
                    ("_", timestamp_ms.to_string()),
                    ("code", challenge.verify_code.clone()),
                ],
                &AuthSession::empty(),
                Some(QR_POLL_REQUEST_TIMEOUT),
            )
            .await?;

        match reply.outcome {
            ApiOutcome::Failure { message, .. } => {
                debug!("尚未确认登录: {}", message);
                Ok(QrPollStatus::Waiting { message })
            }
            ApiOutcome::Success { .. } => {
                let session_token = reply
                    .cookies
                    .get(COOKIE_SESSION_TOKEN)
                    .cloned()
                    .unwrap_or_default();
                let user_id = reply.cookies.get(COOKIE_USER_ID).cloned().unwrap_or_default();

                if session_token.is_empty() || user_id.is_empty() {
                    return Err(BitqiuError::Authentication(format!(
                        "登录已确认，但响应缺少 {} / {} Cookie",
                        COOKIE_SESSION_TOKEN, COOKIE_USER_ID
                    )));
                }

                info!("用户已确认登录, user_id={}", user_id);
                Ok(QrPollStatus::Confirmed {
                    session_token,
                    user_id,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ApiConfig;
    use crate::transport::mock::MockTransport;
    use serde_json::json;
    use std::sync::Arc;

    fn protocol(mock: &MockTransport) -> ApiProtocol {
        ApiProtocol::new(Arc::new(mock.clone()), &ApiConfig::default())
    }

    #[tokio::test]
    async fn test_fetch_challenge() {
        let mock = MockTransport::new();
        mock.push_success(json!({"code": "vc-1", "url": "https://pan.bitqiu.com/qr?id=1&x=2"}));

        let protocol = protocol(&mock);
        let auth = QrCodeAuth::new(&protocol, "https://render.example/?data={}");
        let challenge = auth.fetch_challenge().await.unwrap();

        assert_eq!(challenge.verify_code, "vc-1");
        assert_eq!(challenge.image_url, "https://pan.bitqiu.com/qr?id=1&x=2");
        assert_eq!(
            challenge.render_url,
            "https://render.example/?data=https%3A%2F%2Fpan.bitqiu.com%2Fqr%3Fid%3D1%26x%3D2"
        );

        let req = &mock.requests()[0];
        assert_eq!(req.method, HttpMethod::Get);
        assert!(req.url.ends_with(API_QR_CODE));
        assert!(req.param("_").is_some());
    }

    #[tokio::test]
    async fn test_fetch_challenge_failure_is_auth_error() {
        let mock = MockTransport::new();
        mock.push_failure("10500", "服务繁忙");

        let protocol = protocol(&mock);
        let err = QrCodeAuth::new(&protocol, "{}")
            .fetch_challenge()
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_fetch_challenge_missing_fields() {
        let mock = MockTransport::new();
        mock.push_success(json!({"url": "https://x"}));

        let protocol = protocol(&mock);
        let err = QrCodeAuth::new(&protocol, "{}")
            .fetch_challenge()
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
    }

    #[tokio::test]
    async fn test_poll_status_waiting_and_confirmed() {
        let mock = MockTransport::new();
        mock.push_failure("10001", "等待扫码");
        mock.push_success_with_cookies(
            json!({}),
            &[(COOKIE_SESSION_TOKEN, "sid-9"), (COOKIE_USER_ID, "uid-9")],
        );

        let protocol = protocol(&mock);
        let auth = QrCodeAuth::new(&protocol, "{}");
        let challenge = QrChallenge {
            verify_code: "vc".to_string(),
            image_url: "u".to_string(),
            render_url: "u".to_string(),
        };

        assert_eq!(
            auth.poll_status(&challenge, 1).await.unwrap(),
            QrPollStatus::Waiting {
                message: "等待扫码".to_string()
            }
        );
        assert_eq!(
            auth.poll_status(&challenge, 1).await.unwrap(),
            QrPollStatus::Confirmed {
                session_token: "sid-9".to_string(),
                user_id: "uid-9".to_string(),
            }
        );
        let requests = mock.requests();
        assert_eq!(requests[1].param("code"), Some("vc"));
        // 状态查询使用长超时，避免挂起的连接中断整个登录流程
        assert!(requests
            .iter()
            .all(|r| r.timeout == Some(QR_POLL_REQUEST_TIMEOUT)));
        assert!(QR_POLL_REQUEST_TIMEOUT > ApiConfig::default().request_timeout());
    }

    #[tokio::test]
    async fn test_fetch_challenge_uses_default_timeout() {
        let mock = MockTransport::new();
        mock.push_success(json!({"code": "vc-1", "url": "https://pan.bitqiu.com/qr/1"}));

        let protocol = protocol(&mock);
        QrCodeAuth::new(&protocol, "{}")
            .fetch_challenge()
            .await
            .unwrap();
        assert_eq!(mock.requests()[0].timeout, None);
    }

    #[tokio::test]
    async fn test_poll_status_success_without_cookies() {
        let mock = MockTransport::new();
        mock.push_success_with_cookies(json!({}), &[(COOKIE_SESSION_TOKEN, "sid-9")]);

        let protocol = protocol(&mock);
        let challenge = QrChallenge {
            verify_code: "vc".to_string(),
            image_url: "u".to_string(),
            render_url: "u".to_string(),
        };
        let err = QrCodeAuth::new(&protocol, "{}")
            .poll_status(&challenge, 1)
            .await
            .unwrap_err();
        assert!(err.is_auth_error());
    }
}
