//! wallet, recharge product and order objects

use serde::{Deserialize, Serialize};

use crate::util::json::{de_f64, de_i64_or_zero, de_opt_f64, de_opt_string, de_string};

/// wallet as returned by the vendor, several balance fields may be present
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDto {
    #[serde(default, deserialize_with = "de_opt_string")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub ol_cash: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub balance: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeProductDto {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    pub name: String,
    #[serde(alias = "price", deserialize_with = "de_f64")]
    pub amount: f64,
    #[serde(default, deserialize_with = "de_opt_f64")]
    pub gift_amount: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderDto {
    pub product_id: String,
    pub quantity: u32,
}

/// recharge order, lives only for the current payment flow
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechargeOrderDto {
    #[serde(alias = "orderId", deserialize_with = "de_string")]
    pub id: String,
    #[serde(deserialize_with = "de_f64")]
    pub amount: f64,
    #[serde(default, deserialize_with = "de_i64_or_zero")]
    pub status: i64,
    #[serde(default, alias = "createTime", deserialize_with = "de_opt_string")]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OrderPageDto {
    #[serde(default, alias = "records")]
    pub list: Vec<RechargeOrderDto>,
}
