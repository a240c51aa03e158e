//! vendor api over https

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use super::vendor_api::VendorApi;
use crate::common::error::ClientResult;
use crate::common::http::{require_token, HttpClient};
use crate::common::setting::Vendor;
use crate::entity::dto::app_version_dto::AppVersionDto;
use crate::entity::dto::auth_dto::{CaptchaDto, LoginRequestDto, LoginResponseDto, UserProfileDto};
use crate::entity::dto::device_dto::{
    BindDeviceDto, Device, DeviceCommandDto, DeviceListDto, DeviceStatus, DeviceStatusListDto,
};
use crate::entity::dto::payment_dto::{PaymentChannelDto, PaymentRequestBodyDto, PaymentRequestDto};
use crate::entity::dto::wallet_dto::{CreateOrderDto, OrderPageDto, RechargeOrderDto, RechargeProductDto, WalletDto};
use crate::info;

const LOG_TAG: &str = "vendor-api";

const CAPTCHA_URL: &str = "api/v1/auth/captcha";
const SMS_CODE_URL: &str = "api/v1/auth/sms";
const LOGIN_URL: &str = "api/v1/auth/login";
const PROFILE_URL: &str = "api/v1/user/profile";
const DEVICE_LIST_URL: &str = "api/v1/device/list";
const DEVICE_BIND_URL: &str = "api/v1/device/bind";
const DEVICE_STATUS_URL: &str = "api/v1/device/status";
const DEVICE_START_URL: &str = "api/v1/device/start";
const DEVICE_STOP_URL: &str = "api/v1/device/stop";
const WALLET_URL: &str = "api/v1/wallet";
const RECHARGE_PRODUCT_URL: &str = "api/v1/recharge/products";
const RECHARGE_ORDER_URL: &str = "api/v1/recharge/order";
const ORDER_LIST_URL: &str = "api/v1/recharge/orders";
const PAYMENT_CHANNEL_URL: &str = "api/v1/pay/channels";
const PAYMENT_URL: &str = "api/v1/pay";
const APP_VERSION_URL: &str = "api/v1/app/version";

pub struct HttpVendorApi {
    http: HttpClient,
}

impl HttpVendorApi {
    pub fn new(vendor: &Vendor) -> ClientResult<Self> {
        Ok(HttpVendorApi {
            http: HttpClient::new(vendor)?,
        })
    }
}

fn decode<T: DeserializeOwned>(value: Value) -> ClientResult<T> {
    Ok(serde_json::from_value(value)?)
}

/// list endpoints answer either a bare array or a paging object
fn decode_list<T: DeserializeOwned, P: DeserializeOwned>(value: Value, from_page: impl FnOnce(P) -> Vec<T>) -> ClientResult<Vec<T>> {
    match value {
        Value::Null => Ok(Vec::new()),
        Value::Array(_) => decode(value),
        other => Ok(from_page(decode(other)?)),
    }
}

#[async_trait]
impl VendorApi for HttpVendorApi {
    async fn get_captcha(&self) -> ClientResult<CaptchaDto> {
        let data = self.http.api_get(CAPTCHA_URL, None, &[]).await?;
        decode(data)
    }

    async fn send_sms_code(&self, phone_number: &str, captcha_key: &str, captcha_code: &str) -> ClientResult<()> {
        let body = json!({
            "phoneNumber": phone_number,
            "captchaKey": captcha_key,
            "captcha": captcha_code,
        });
        self.http.api_post(SMS_CODE_URL, None, body).await?;
        info!(LOG_TAG, "sms code sent to {}", phone_number);
        Ok(())
    }

    async fn login(&self, request: &LoginRequestDto) -> ClientResult<LoginResponseDto> {
        let data = self.http.api_post(LOGIN_URL, None, serde_json::to_value(request)?).await?;
        decode(data)
    }

    async fn get_user_profile(&self, token: Option<&str>) -> ClientResult<UserProfileDto> {
        let token = require_token(token)?;
        let data = self.http.api_get(PROFILE_URL, Some(token), &[]).await?;
        decode(data)
    }

    async fn list_devices(&self, token: Option<&str>) -> ClientResult<Vec<Device>> {
        let token = require_token(token)?;
        let data = self.http.api_get(DEVICE_LIST_URL, Some(token), &[]).await?;
        decode_list(data, |page: DeviceListDto| page.list)
    }

    async fn bind_device(&self, token: Option<&str>, device_code: &str) -> ClientResult<()> {
        let token = require_token(token)?;
        let body = serde_json::to_value(BindDeviceDto {
            device_code: device_code.to_string(),
        })?;
        self.http.api_post(DEVICE_BIND_URL, Some(token), body).await?;
        Ok(())
    }

    async fn get_device_status(&self, token: Option<&str>, device_ids: &[String]) -> ClientResult<Vec<DeviceStatus>> {
        let token = require_token(token)?;
        let body = json!({ "deviceIds": device_ids });
        let data = self.http.api_post(DEVICE_STATUS_URL, Some(token), body).await?;
        decode_list(data, |page: DeviceStatusListDto| page.list)
    }

    async fn start_device(&self, token: Option<&str>, device_id: &str) -> ClientResult<()> {
        let token = require_token(token)?;
        let body = serde_json::to_value(DeviceCommandDto {
            device_id: device_id.to_string(),
        })?;
        self.http.api_post(DEVICE_START_URL, Some(token), body).await?;
        Ok(())
    }

    async fn stop_device(&self, token: Option<&str>, device_id: &str) -> ClientResult<()> {
        let token = require_token(token)?;
        let body = serde_json::to_value(DeviceCommandDto {
            device_id: device_id.to_string(),
        })?;
        self.http.api_post(DEVICE_STOP_URL, Some(token), body).await?;
        Ok(())
    }

    async fn get_wallet(&self, token: Option<&str>) -> ClientResult<WalletDto> {
        let token = require_token(token)?;
        let data = self.http.api_get(WALLET_URL, Some(token), &[]).await?;
        decode(data)
    }

    async fn list_recharge_products(&self, token: Option<&str>) -> ClientResult<Vec<RechargeProductDto>> {
        let token = require_token(token)?;
        let data = self.http.api_get(RECHARGE_PRODUCT_URL, Some(token), &[]).await?;
        decode(data)
    }

    async fn create_recharge_order(&self, token: Option<&str>, product_id: &str, quantity: u32) -> ClientResult<RechargeOrderDto> {
        let token = require_token(token)?;
        let body = serde_json::to_value(CreateOrderDto {
            product_id: product_id.to_string(),
            quantity,
        })?;
        let data = self.http.api_post(RECHARGE_ORDER_URL, Some(token), body).await?;
        decode(data)
    }

    async fn get_payment_channels(&self, token: Option<&str>, order_id: &str) -> ClientResult<Vec<PaymentChannelDto>> {
        let token = require_token(token)?;
        let query = [("orderId", order_id.to_string())];
        let data = self.http.api_get(PAYMENT_CHANNEL_URL, Some(token), &query).await?;
        decode_list(data, |channels: Vec<PaymentChannelDto>| channels)
    }

    async fn request_payment(&self, token: Option<&str>, order_id: &str, channel_type: i64) -> ClientResult<PaymentRequestDto> {
        let token = require_token(token)?;
        let body = serde_json::to_value(PaymentRequestBodyDto {
            order_id: order_id.to_string(),
            pay_type: channel_type,
        })?;
        let data = self.http.api_post(PAYMENT_URL, Some(token), body).await?;
        match data {
            // some channels answer the bare order string
            Value::String(order_string) => Ok(PaymentRequestDto { order_string }),
            other => decode(other),
        }
    }

    async fn list_orders(&self, token: Option<&str>, page: u32, size: u32) -> ClientResult<Vec<RechargeOrderDto>> {
        let token = require_token(token)?;
        let query = [("page", page.to_string()), ("size", size.to_string())];
        let data = self.http.api_get(ORDER_LIST_URL, Some(token), &query).await?;
        decode_list(data, |page: OrderPageDto| page.list)
    }

    async fn latest_app_version(&self) -> ClientResult<AppVersionDto> {
        let data = self.http.api_get(APP_VERSION_URL, None, &[]).await?;
        decode(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::error::ClientError;

    fn unreachable_api() -> HttpVendorApi {
        // nothing listens here, any io attempt would be a transport error
        let vendor = Vendor {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Vendor::default()
        };
        HttpVendorApi::new(&vendor).unwrap()
    }

    #[tokio::test]
    async fn test_missing_token_fails_before_io() {
        let api = unreachable_api();
        assert_eq!(api.start_device(None, "D1").await, Err(ClientError::Unauthenticated));
        assert_eq!(api.list_devices(Some("")).await.unwrap_err(), ClientError::Unauthenticated);
        assert_eq!(api.get_wallet(None).await.unwrap_err(), ClientError::Unauthenticated);
    }

    #[tokio::test]
    async fn test_transport_error() {
        let api = unreachable_api();
        let err = api.start_device(Some("T1"), "D1").await.unwrap_err();
        assert!(matches!(err, ClientError::Transport(_)));
    }

    #[test]
    fn test_decode_list_shapes() {
        let bare: Vec<DeviceStatus> =
            decode_list(json!([{"deviceId": "D1", "running": true, "online": true}]), |p: DeviceStatusListDto| p.list).unwrap();
        let paged: Vec<DeviceStatus> =
            decode_list(json!({"list": [{"deviceId": "D1", "running": true, "online": true}]}), |p: DeviceStatusListDto| p.list).unwrap();
        let empty: Vec<DeviceStatus> = decode_list(Value::Null, |p: DeviceStatusListDto| p.list).unwrap();
        assert_eq!(bare, paged);
        assert!(empty.is_empty());
    }
}
