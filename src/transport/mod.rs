//! HTTP 传输层
//!
//! 协议层只依赖 [`HttpTransport`] 这一能力：发出一个请求，拿回状态码、响应体和
//! 响应中下发的 Cookie。真实实现基于 reqwest，测试中用脚本化的 mock 替换。

mod reqwest_transport;

#[cfg(test)]
pub(crate) mod mock;

pub use reqwest_transport::ReqwestTransport;

use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::time::Duration;

/// 请求方法
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpMethod::Get => write!(f, "GET"),
            HttpMethod::Post => write!(f, "POST"),
        }
    }
}

/// 一次 HTTP 请求
///
/// GET 请求的参数放在 query 中，POST 请求以表单形式放在 body 中
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    pub url: String,
    pub params: Vec<(String, String)>,
    pub cookies: Vec<(String, String)>,
    /// 单次请求超时，None 时使用传输层的默认超时
    pub timeout: Option<Duration>,
}

impl HttpRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            params: Vec::new(),
            cookies: Vec::new(),
            timeout: None,
        }
    }

    /// 按名称查找参数值
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// 拼接 Cookie 请求头，没有 Cookie 时返回 None
    pub fn cookie_header(&self) -> Option<String> {
        if self.cookies.is_empty() {
            return None;
        }
        Some(
            self.cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; "),
        )
    }
}

/// 一次 HTTP 响应
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
    /// 响应中通过 Set-Cookie 下发的 Cookie（name -> value）
    pub cookies: HashMap<String, String>,
}

impl HttpResponse {
    pub fn cookie(&self, name: &str) -> Option<&str> {
        self.cookies.get(name).map(|s| s.as_str())
    }
}

/// HTTP 传输能力
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// 发出一个请求；网络层失败返回 [`crate::BitqiuError::Http`]
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse>;

    /// 释放底层连接，可重复调用
    fn close(&self) {}
}
