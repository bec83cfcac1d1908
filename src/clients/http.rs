//! HTTP 后端的公共部分：客户端构建、发送请求、状态码映射

use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ConfigurationError, ProviderHttpError};
use crate::models::ProviderKind;
use crate::utils::logging::truncate_text;

/// 错误信息中保留的响应体最大字符数
const ERROR_BODY_PREVIEW: usize = 500;

/// 创建带超时的 HTTP 客户端
pub fn build_http_client(timeout: Duration) -> Result<Client, ConfigurationError> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ConfigurationError::HttpClient {
            message: e.to_string(),
        })
}

/// 把非 2xx 响应映射为 `ProviderHttpError`
///
/// # 参数
/// - `provider`: 后端类型
/// - `status`: HTTP 状态码
/// - `body`: 响应体原文
/// - `model`: 当前模型（400 错误会带上它）
/// - `retry_after`: `Retry-After` 头（秒）
pub fn map_http_failure(
    provider: ProviderKind,
    status: StatusCode,
    body: &str,
    model: &str,
    retry_after: Option<u64>,
) -> ProviderHttpError {
    let message = error_message(body);

    match status {
        StatusCode::UNAUTHORIZED => ProviderHttpError::Unauthorized {
            provider,
            model: model.to_string(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => ProviderHttpError::RateLimited {
            provider,
            model: model.to_string(),
            retry_after,
        },
        StatusCode::BAD_REQUEST => ProviderHttpError::BadRequest {
            provider,
            model: model.to_string(),
            message,
        },
        _ => ProviderHttpError::Provider {
            provider,
            model: model.to_string(),
            status: Some(status.as_u16()),
            message,
        },
    }
}

/// 优先取 `{"error": {"message": ...}}`，否则取响应体前若干字符
fn error_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .pointer("/error/message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match from_json {
        Some(message) => message,
        None if body.trim().is_empty() => "(empty response body)".to_string(),
        None => truncate_text(body.trim(), ERROR_BODY_PREVIEW),
    }
}

/// 发送请求并把成功响应反序列化为 `T`
pub async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    provider: ProviderKind,
    model: &str,
) -> Result<T, ProviderHttpError> {
    let response = request.send().await.map_err(|e| {
        warn!("❌ {} 请求发送失败: {}", provider, e);
        ProviderHttpError::network(provider, model, e)
    })?;

    let status = response.status();
    debug!("{} 响应状态: {}", provider, status);

    if !status.is_success() {
        let retry_after = response
            .headers()
            .get(reqwest::header::RETRY_AFTER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok());
        let body = response.text().await.unwrap_or_default();
        let error = map_http_failure(provider, status, &body, model, retry_after);
        warn!("❌ {}", error);
        return Err(error);
    }

    response.json::<T>().await.map_err(|e| ProviderHttpError::Provider {
        provider,
        model: model.to_string(),
        status: Some(status.as_u16()),
        message: format!("无法解析响应体: {}", e),
    })
}

/// 空的生成结果按普通后端错误处理
pub fn empty_completion(provider: ProviderKind, model: &str) -> ProviderHttpError {
    ProviderHttpError::Provider {
        provider,
        model: model.to_string(),
        status: None,
        message: "后端返回了空内容".to_string(),
    }
}
