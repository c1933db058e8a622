// 测试用脚本化传输

use super::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::{BitqiuError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

#[derive(Default)]
struct MockState {
    responses: VecDeque<Result<HttpResponse>>,
    requests: Vec<HttpRequest>,
    closed: usize,
}

/// 按顺序返回预置响应，并记录收到的所有请求
#[derive(Clone, Default)]
pub(crate) struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_response(&self, response: HttpResponse) -> &Self {
        self.state.lock().responses.push_back(Ok(response));
        self
    }

    pub(crate) fn push_error(&self, error: BitqiuError) -> &Self {
        self.state.lock().responses.push_back(Err(error));
        self
    }

    pub(crate) fn push_body(&self, status: u16, body: &str) -> &Self {
        self.push_response(HttpResponse {
            status,
            body: body.to_string(),
            cookies: HashMap::new(),
        })
    }

    /// 成功响应（code = 10200）
    pub(crate) fn push_success(&self, data: Value) -> &Self {
        self.push_body(200, &success_body(data))
    }

    /// 业务失败响应
    pub(crate) fn push_failure(&self, code: &str, message: &str) -> &Self {
        self.push_body(
            200,
            &json!({ "code": code, "message": message }).to_string(),
        )
    }

    /// 带 Set-Cookie 的成功响应
    pub(crate) fn push_success_with_cookies(&self, data: Value, cookies: &[(&str, &str)]) -> &Self {
        self.push_response(HttpResponse {
            status: 200,
            body: success_body(data),
            cookies: cookies
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        })
    }

    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.state.lock().requests.clone()
    }

    pub(crate) fn request_count(&self) -> usize {
        self.state.lock().requests.len()
    }

    pub(crate) fn close_count(&self) -> usize {
        self.state.lock().closed
    }
}

pub(crate) fn success_body(data: Value) -> String {
    json!({ "code": "10200", "message": "success", "data": data }).to_string()
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse> {
        let mut state = self.state.lock();
        state.requests.push(request.clone());
        state.responses.pop_front().unwrap_or_else(|| {
            Err(BitqiuError::Http(format!(
                "mock 没有预置响应: {}",
                request.url
            )))
        })
    }

    fn close(&self) {
        self.state.lock().closed += 1;
    }
}
