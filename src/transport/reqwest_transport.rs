// 基于 reqwest 的传输实现

use super::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::{BitqiuError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::Client;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

/// reqwest 传输
///
/// 连接池在构造时创建，整个客户端生命周期内共享，`close` 后释放
#[derive(Debug)]
pub struct ReqwestTransport {
    client: Mutex<Option<Client>>,
}

impl ReqwestTransport {
    /// 创建传输层
    ///
    /// # 参数
    /// * `timeout` - 单次请求超时
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self {
            client: Mutex::new(Some(client)),
        })
    }

    pub fn is_closed(&self) -> bool {
        self.client.lock().is_none()
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        // Client 内部是 Arc，克隆后立即释放锁
        let client = self
            .client
            .lock()
            .clone()
            .ok_or_else(|| BitqiuError::Http("客户端已关闭".to_string()))?;

        debug!("{} {}", request.method, request.url);

        let mut builder = match request.method {
            HttpMethod::Get => client.get(&request.url).query(&request.params),
            HttpMethod::Post => client.post(&request.url).form(&request.params),
        };

        if let Some(timeout) = request.timeout {
            builder = builder.timeout(timeout);
        }
        if let Some(cookie) = request.cookie_header() {
            builder = builder.header("Cookie", cookie);
        }

        let resp = builder.send().await?;
        let status = resp.status().as_u16();

        let cookies: HashMap<String, String> = resp
            .cookies()
            .map(|c| (c.name().to_string(), c.value().to_string()))
            .collect();

        let body = resp.text().await?;

        debug!(
            "响应: status={}, body_len={}, cookies={}",
            status,
            body.len(),
            cookies.len()
        );

        Ok(HttpResponse {
            status,
            body,
            cookies,
        })
    }

    fn close(&self) {
        if self.client.lock().take().is_some() {
            info!("HTTP 客户端已释放");
        }
    }
}
