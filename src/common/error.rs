//! client error taxonomy
//! every public operation returns `ClientResult`, nothing here is fatal to the process

use std::collections::HashMap;

use lazy_static::lazy_static;
use thiserror::Error;

lazy_static! {
    // 服务器 http 错误码对应的用户提示
    static ref HTTP_MESSAGES: HashMap<u16, &'static str> = {
        let mut m = HashMap::new();
        m.insert(400, "请求参数错误");
        m.insert(401, "登录已过期，请重新登录");
        m.insert(403, "没有访问权限");
        m.insert(404, "请求的资源不存在");
        m.insert(500, "服务器内部错误");
        m
    };
}

const GENERIC_HTTP_MESSAGE: &str = "网络请求失败";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClientError {
    /// no token, or an empty one
    #[error("unauthenticated: no session token")]
    Unauthenticated,

    #[error("http error, status code: {code}")]
    Http { code: u16 },

    /// io failure or timeout
    #[error("transport error: {0}")]
    Transport(String),

    #[error("decode error: {0}")]
    Decode(String),

    /// business code returned inside a 200 response, e.g. wrong sms code or device already bound
    #[error("vendor rejected request, code: {code}, msg: {msg}")]
    DomainRejected { code: i64, msg: String },

    #[error("local storage error: {0}")]
    Storage(String),

    #[error("no supported payment channel for this order")]
    UnsupportedPayment,

    #[error("another payment is still in progress")]
    PaymentInProgress,

    #[error("operation cancelled")]
    Cancelled,
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    /// message shown to the user, the ui clears it after display
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Unauthenticated => "请先登录".to_string(),
            ClientError::Http { code } => HTTP_MESSAGES
                .get(code)
                .copied()
                .unwrap_or(GENERIC_HTTP_MESSAGE)
                .to_string(),
            ClientError::Transport(_) => "网络连接失败，请检查网络".to_string(),
            ClientError::Decode(_) => "服务器返回数据格式错误".to_string(),
            ClientError::DomainRejected { msg, .. } if !msg.is_empty() => msg.clone(),
            ClientError::DomainRejected { code, .. } => format!("操作失败 ({})", code),
            ClientError::Storage(_) => "本地数据读写失败".to_string(),
            ClientError::UnsupportedPayment => "暂不支持该订单的支付方式".to_string(),
            ClientError::PaymentInProgress => "支付正在进行中，请稍候".to_string(),
            ClientError::Cancelled => "操作已取消".to_string(),
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            ClientError::Decode(e.to_string())
        } else if let Some(status) = e.status() {
            ClientError::Http { code: status.as_u16() }
        } else {
            ClientError::Transport(e.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Decode(e.to_string())
    }
}

impl From<tokio_rusqlite::Error> for ClientError {
    fn from(e: tokio_rusqlite::Error) -> Self {
        ClientError::Storage(e.to_string())
    }
}
