//! payment channel and payment sdk objects

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::util::json::de_i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentChannelType {
    Alipay,
    UnionPay,
    Other(i64),
}

impl PaymentChannelType {
    pub fn code(&self) -> i64 {
        match self {
            PaymentChannelType::Alipay => 21,
            PaymentChannelType::UnionPay => 41,
            PaymentChannelType::Other(code) => *code,
        }
    }
}

impl From<i64> for PaymentChannelType {
    fn from(code: i64) -> Self {
        match code {
            21 => PaymentChannelType::Alipay,
            41 => PaymentChannelType::UnionPay,
            other => PaymentChannelType::Other(other),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PaymentChannelDto {
    #[serde(rename = "type", alias = "payType", deserialize_with = "de_i64")]
    pub channel_type: i64,
    #[serde(default)]
    pub name: String,
}

impl PaymentChannelDto {
    pub fn kind(&self) -> PaymentChannelType {
        PaymentChannelType::from(self.channel_type)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestBodyDto {
    pub order_id: String,
    pub pay_type: i64,
}

/// provider formatted order string, passed untouched to the payment sdk
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequestDto {
    #[serde(alias = "payInfo", alias = "orderStr")]
    pub order_string: String,
}

/// raw result map handed back by the payment sdk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentResultMap {
    pub result_status: String,
    pub result: String,
    pub memo: String,
}

impl From<HashMap<String, String>> for PaymentResultMap {
    fn from(mut map: HashMap<String, String>) -> Self {
        PaymentResultMap {
            result_status: map.remove("resultStatus").unwrap_or_default(),
            result: map.remove("result").unwrap_or_default(),
            memo: map.remove("memo").unwrap_or_default(),
        }
    }
}
