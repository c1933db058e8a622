//! 请求/响应协议层
//!
//! 每个接口都是固定路径上的一次 GET/POST，请求中固定携带 `org_channel`，
//! 已登录时附带会话 Cookie。协议层不做任何重试，每次调用只发出一个请求。

pub mod envelope;

pub use envelope::{parse_response, ApiOutcome};

use crate::auth::AuthSession;
use crate::config::ApiConfig;
use crate::error::Result;
use crate::transport::{HttpMethod, HttpRequest, HttpTransport};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// 一次调用的完整结果：业务结果 + 响应下发的 Cookie
#[derive(Debug, Clone)]
pub struct ApiReply {
    pub outcome: ApiOutcome,
    pub cookies: HashMap<String, String>,
}

/// 协议客户端
pub struct ApiProtocol {
    transport: Arc<dyn HttpTransport>,
    host_url: String,
    org_channel: String,
    success_code: String,
}

impl ApiProtocol {
    pub fn new(transport: Arc<dyn HttpTransport>, config: &ApiConfig) -> Self {
        Self {
            transport,
            host_url: config.host_url.trim_end_matches('/').to_string(),
            org_channel: config.org_channel.clone(),
            success_code: config.success_code.clone(),
        }
    }

    pub fn endpoint_url(&self, path: &str) -> String {
        format!("{}{}", self.host_url, path)
    }

    /// 发出一次调用
    ///
    /// `params` 之前会自动插入 `org_channel`；GET 放入 query，POST 作为表单提交
    pub async fn call(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(&str, String)],
        session: &AuthSession,
    ) -> Result<ApiReply> {
        self.call_with_timeout(method, path, params, session, None).await
    }

    /// 同 [`ApiProtocol::call`]，`timeout` 覆盖传输层的默认超时
    pub async fn call_with_timeout(
        &self,
        method: HttpMethod,
        path: &str,
        params: &[(&str, String)],
        session: &AuthSession,
        timeout: Option<Duration>,
    ) -> Result<ApiReply> {
        let mut request = HttpRequest::new(method, self.endpoint_url(path));
        request
            .params
            .push(("org_channel".to_string(), self.org_channel.clone()));
        request
            .params
            .extend(params.iter().map(|(k, v)| (k.to_string(), v.clone())));
        request.cookies = session.cookies();
        request.timeout = timeout;

        debug!("调用接口: {} {}", method, path);

        let response = self.transport.request(request).await?;
        let outcome = parse_response(&response, &self.success_code)?;

        if let ApiOutcome::Failure { code, message } = &outcome {
            debug!("接口返回失败: path={}, code={}, message={}", path, code, message);
        }

        Ok(ApiReply {
            outcome,
            cookies: response.cookies,
        })
    }

    /// POST 调用，只关心业务结果
    pub async fn post(
        &self,
        path: &str,
        params: &[(&str, String)],
        session: &AuthSession,
    ) -> Result<ApiOutcome> {
        Ok(self
            .call(HttpMethod::Post, path, params, session)
            .await?
            .outcome)
    }

    /// GET 调用，只关心业务结果
    pub async fn get(
        &self,
        path: &str,
        params: &[(&str, String)],
        session: &AuthSession,
    ) -> Result<ApiOutcome> {
        Ok(self
            .call(HttpMethod::Get, path, params, session)
            .await?
            .outcome)
    }

    /// 释放底层传输，可重复调用
    pub fn close(&self) {
        self.transport.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::mock::MockTransport;
    use crate::BitqiuError;
    use serde_json::json;

    fn protocol(mock: &MockTransport) -> ApiProtocol {
        ApiProtocol::new(Arc::new(mock.clone()), &ApiConfig::default())
    }

    #[tokio::test]
    async fn test_post_adds_channel_and_session_cookies() {
        let mock = MockTransport::new();
        mock.push_success(json!({"ok": true}));

        let session = AuthSession::authenticated("sid-1", "uid-1").unwrap();
        let outcome = protocol(&mock)
            .post("/resource/delete", &[("fileIds", "a,b".to_string())], &session)
            .await
            .unwrap();
        assert!(outcome.is_success());

        let requests = mock.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.url, "https://pan.bitqiu.com/resource/delete");
        assert_eq!(req.params[0], ("org_channel".to_string(), "default|default|stpan".to_string()));
        assert_eq!(req.param("fileIds"), Some("a,b"));
        assert_eq!(
            req.cookie_header().as_deref(),
            Some("cloud_web_sid=sid-1; cloud_web_uid=uid-1")
        );
    }

    #[tokio::test]
    async fn test_unauthenticated_call_sends_no_cookies() {
        let mock = MockTransport::new();
        mock.push_success(json!({}));

        protocol(&mock)
            .get("/loginServer/getQRCode", &[], &AuthSession::empty())
            .await
            .unwrap();
        assert!(mock.requests()[0].cookies.is_empty());
    }

    #[tokio::test]
    async fn test_failure_outcome_is_not_an_error() {
        let mock = MockTransport::new();
        mock.push_failure("10500", "系统繁忙");

        let outcome = protocol(&mock)
            .post("/integral/randomSignin", &[], &AuthSession::empty())
            .await
            .unwrap();
        assert_eq!(outcome.message(), "系统繁忙");
        assert!(!outcome.is_success());
    }

    #[tokio::test]
    async fn test_transport_error_propagates_without_retry() {
        let mock = MockTransport::new();
        mock.push_error(BitqiuError::Http("connection reset".to_string()));
        mock.push_success(json!({}));

        let err = protocol(&mock)
            .post("/integral/randomSignin", &[], &AuthSession::empty())
            .await
            .unwrap_err();
        assert!(matches!(err, BitqiuError::Http(_)));
        assert_eq!(mock.request_count(), 1);
    }

    #[tokio::test]
    async fn test_timeout_override_reaches_transport() {
        let mock = MockTransport::new();
        mock.push_success(json!({}));
        mock.push_success(json!({}));

        let protocol = protocol(&mock);
        let session = AuthSession::empty();
        protocol
            .call(HttpMethod::Get, "/a", &[], &session)
            .await
            .unwrap();
        protocol
            .call_with_timeout(
                HttpMethod::Get,
                "/b",
                &[],
                &session,
                Some(Duration::from_secs(300)),
            )
            .await
            .unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].timeout, None);
        assert_eq!(requests[1].timeout, Some(Duration::from_secs(300)));
    }

    #[tokio::test]
    async fn test_reply_carries_response_cookies() {
        let mock = MockTransport::new();
        mock.push_success_with_cookies(json!({}), &[("cloud_web_sid", "s")]);

        let reply = protocol(&mock)
            .call(HttpMethod::Get, "/loginServer/getQRCodeInfo", &[], &AuthSession::empty())
            .await
            .unwrap();
        assert_eq!(reply.cookies.get("cloud_web_sid").map(String::as_str), Some("s"));
    }
}
