// 响应信封解析
//
// 所有接口的响应体都是 `{ code, message, data }`，code 等于约定的成功码才算成功

use crate::error::{BitqiuError, Result};
use crate::transport::HttpResponse;
use serde_json::{Map, Value};

/// 单次调用的业务结果
#[derive(Debug, Clone, PartialEq)]
pub enum ApiOutcome {
    /// 成功，data 缺失或为 null 时为空对象
    Success { message: String, data: Value },
    /// 服务端返回了非成功码
    Failure { code: String, message: String },
}

impl ApiOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ApiOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            ApiOutcome::Success { message, .. } | ApiOutcome::Failure { message, .. } => message,
        }
    }

    /// 取出成功载荷，失败时转换为 [`BitqiuError::Api`]
    ///
    /// `action` 用于错误信息，如 "获取用户信息"
    pub fn into_data(self, action: &str) -> Result<Value> {
        match self {
            ApiOutcome::Success { data, .. } => Ok(data),
            ApiOutcome::Failure { code, message } => Err(BitqiuError::Api(format!(
                "{}失败: {} (code={})",
                action, message, code
            ))),
        }
    }
}

/// 解析 HTTP 响应
///
/// HTTP 状态非 200 或响应体不是 JSON 对象时返回 [`BitqiuError::Api`]；
/// 能解析的响应一律返回 `Ok`，由调用方决定如何处理 [`ApiOutcome::Failure`]
pub fn parse_response(response: &HttpResponse, success_code: &str) -> Result<ApiOutcome> {
    if response.status != 200 {
        return Err(BitqiuError::Api(format!(
            "HTTP {}: {}",
            response.status,
            truncate(&response.body, 512)
        )));
    }

    let body: Value = serde_json::from_str(&response.body).map_err(|e| {
        BitqiuError::Api(format!(
            "响应解析失败: {}, body={}",
            e,
            truncate(&response.body, 512)
        ))
    })?;

    let Value::Object(mut envelope) = body else {
        return Err(BitqiuError::Api(format!(
            "响应不是 JSON 对象: {}",
            truncate(&response.body, 512)
        )));
    };

    let code = envelope.remove("code").unwrap_or(Value::Null);
    let message = value_to_text(envelope.get("message").unwrap_or(&Value::Null));

    // 成功码只接受字符串字面量
    if code.as_str() == Some(success_code) {
        let data = match envelope.remove("data") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(other) => other,
        };
        Ok(ApiOutcome::Success { message, data })
    } else {
        Ok(ApiOutcome::Failure {
            code: value_to_text(&code),
            message,
        })
    }
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let head: String = text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const SUCCESS: &str = "10200";

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            body: body.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_success_with_payload() {
        let body = json!({"code": "10200", "message": "ok", "data": {"rootDirId": "r1"}});
        let outcome = parse_response(&response(200, &body.to_string()), SUCCESS).unwrap();
        assert_eq!(
            outcome,
            ApiOutcome::Success {
                message: "ok".to_string(),
                data: json!({"rootDirId": "r1"}),
            }
        );
    }

    #[test]
    fn test_missing_or_null_data_is_empty_object() {
        for body in [
            r#"{"code":"10200","message":"ok"}"#,
            r#"{"code":"10200","message":"ok","data":null}"#,
        ] {
            let data = parse_response(&response(200, body), SUCCESS)
                .unwrap()
                .into_data("测试")
                .unwrap();
            assert_eq!(data, json!({}));
        }
    }

    #[test]
    fn test_array_payload_is_kept() {
        let body = r#"{"code":"10200","message":"ok","data":[1,2]}"#;
        let data = parse_response(&response(200, body), SUCCESS)
            .unwrap()
            .into_data("测试")
            .unwrap();
        assert_eq!(data, json!([1, 2]));
    }

    #[test]
    fn test_other_code_is_failure() {
        let body = r#"{"code":"10401","message":"未登录"}"#;
        let outcome = parse_response(&response(200, body), SUCCESS).unwrap();
        assert!(!outcome.is_success());
        assert_eq!(outcome.message(), "未登录");

        let err = outcome.into_data("获取用户信息").unwrap_err();
        assert!(err.is_api_error());
        assert!(err.to_string().contains("未登录"));
        assert!(err.to_string().contains("10401"));
    }

    #[test]
    fn test_numeric_code_is_not_success() {
        let body = r#"{"code":10200,"message":"ok"}"#;
        let outcome = parse_response(&response(200, body), SUCCESS).unwrap();
        assert_eq!(
            outcome,
            ApiOutcome::Failure {
                code: "10200".to_string(),
                message: "ok".to_string(),
            }
        );
    }

    #[test]
    fn test_non_200_status_is_api_error() {
        let body = r#"{"code":"10200","message":"ok"}"#;
        let err = parse_response(&response(502, body), SUCCESS).unwrap_err();
        assert!(err.is_api_error());
        assert!(err.to_string().contains("HTTP 502"));
    }

    #[test]
    fn test_invalid_json_is_api_error() {
        for body in ["<html>502</html>", "", "[1,2,3]", "\"text\""] {
            let err = parse_response(&response(200, body), SUCCESS).unwrap_err();
            assert!(err.is_api_error(), "body={:?}", body);
        }
    }

    #[test]
    fn test_truncate_long_body() {
        let body = "x".repeat(2000);
        let err = parse_response(&response(500, &body), SUCCESS).unwrap_err();
        assert!(err.to_string().len() < 1000);
    }
}
