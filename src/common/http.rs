//! networking module
//! function:
//! - 附带供应商要求的固定请求头与 bearer token
//! - 处理远程服务器错误：http 状态码非 2xx 返回 Http，业务 code 不为 0 返回 DomainRejected
//! - 保证输入输出均为 json object
//! - 不做重试，重试策略由调用方决定

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use super::error::{ClientError, ClientResult};
use super::setting::Vendor;
use crate::{debug, warn};

const LOG_TAG: &str = "http";

// 业务成功码
const SUCCESS_CODE: i64 = 0;

pub struct HttpClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(vendor: &Vendor) -> ClientResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert("ApplicationType", header_value(&vendor.application_type)?);
        headers.insert("versioncode", header_value(&vendor.version_code)?);

        let timeout = Duration::from_secs(vendor.timeout_secs);
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(vendor.user_agent.as_str())
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("cannot build http client: {}", e)))?;

        Ok(HttpClient {
            client,
            base_url: vendor.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, api_url: &str) -> String {
        format!("{}/{}", self.base_url, api_url.trim_start_matches('/'))
    }

    /// wrapper for get api
    pub async fn api_get(&self, api_url: &str, token: Option<&str>, query: &[(&str, String)]) -> ClientResult<Value> {
        let mut request = self.client.get(self.url(api_url)).query(query);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, bearer(token)?);
        }
        self.send(api_url, request).await
    }

    /// wrapper for post api
    pub async fn api_post(&self, api_url: &str, token: Option<&str>, data: Value) -> ClientResult<Value> {
        let mut request = self.client.post(self.url(api_url)).json(&data);
        if let Some(token) = token {
            request = request.header(AUTHORIZATION, bearer(token)?);
        }
        self.send(api_url, request).await
    }

    async fn send(&self, api_url: &str, request: reqwest::RequestBuilder) -> ClientResult<Value> {
        debug!(LOG_TAG, "request {}", api_url);
        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            warn!(LOG_TAG, "request {} failed, http status: {}", api_url, status);
            return Err(ClientError::Http { code: status.as_u16() });
        }
        let body = resp.text().await?;
        let json: Value = serde_json::from_str(&body)?;
        get_res_data(json)
    }
}

/// missing or empty token fails before any network io
pub fn require_token(token: Option<&str>) -> ClientResult<&str> {
    match token {
        Some(t) if !t.trim().is_empty() => Ok(t),
        _ => Err(ClientError::Unauthenticated),
    }
}

fn bearer(token: &str) -> ClientResult<HeaderValue> {
    header_value(&format!("Bearer {}", token))
}

fn header_value(value: &str) -> ClientResult<HeaderValue> {
    HeaderValue::from_str(value).map_err(|e| ClientError::Decode(format!("invalid header value: {}", e)))
}

/// 检查返回值中的 code 是否成功，不成功则返回业务错误
pub fn get_res_data(resp: Value) -> ClientResult<Value> {
    let code = match &resp["code"] {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse::<i64>().ok(),
        _ => None,
    }
    .ok_or_else(|| ClientError::Decode(format!("response code not found: {}", resp)))?;

    if code == SUCCESS_CODE {
        Ok(resp["data"].clone())
    } else {
        let msg = resp["msg"]
            .as_str()
            .or_else(|| resp["message"].as_str())
            .unwrap_or("")
            .to_string();
        Err(ClientError::DomainRejected { code, msg })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_envelope_success() {
        let data = get_res_data(json!({"code": 0, "msg": "ok", "data": {"token": "T1"}})).unwrap();
        assert_eq!(data["token"], "T1");
    }

    #[test]
    fn test_envelope_string_code() {
        let data = get_res_data(json!({"code": "0", "data": [1, 2]})).unwrap();
        assert_eq!(data, json!([1, 2]));
    }

    #[test]
    fn test_envelope_rejected() {
        let err = get_res_data(json!({"code": 1002, "msg": "短信验证码错误"})).unwrap_err();
        assert_eq!(err, ClientError::DomainRejected { code: 1002, msg: "短信验证码错误".to_string() });
    }

    #[test]
    fn test_envelope_without_code() {
        let err = get_res_data(json!({"data": {}})).unwrap_err();
        assert!(matches!(err, ClientError::Decode(_)));
    }

    #[test]
    fn test_require_token() {
        assert_eq!(require_token(Some("T1")).unwrap(), "T1");
        assert_eq!(require_token(Some("  ")), Err(ClientError::Unauthenticated));
        assert_eq!(require_token(None), Err(ClientError::Unauthenticated));
    }

    #[test]
    fn test_build_client() {
        let client = HttpClient::new(&Vendor::default()).unwrap();
        assert_eq!(client.url("/api/device/list"), format!("{}/api/device/list", Vendor::default().base_url));
    }
}
