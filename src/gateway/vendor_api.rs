//! vendor backend port
//! one operation per vendor endpoint, authenticated calls take an optional bearer token,
//! a missing token fails with `Unauthenticated` before any network io. no retries here.

use async_trait::async_trait;

use crate::common::error::ClientResult;
use crate::entity::dto::app_version_dto::AppVersionDto;
use crate::entity::dto::auth_dto::{CaptchaDto, LoginRequestDto, LoginResponseDto, UserProfileDto};
use crate::entity::dto::device_dto::{Device, DeviceStatus};
use crate::entity::dto::payment_dto::{PaymentChannelDto, PaymentRequestDto};
use crate::entity::dto::wallet_dto::{RechargeOrderDto, RechargeProductDto, WalletDto};

#[async_trait]
pub trait VendorApi: Send + Sync {
    async fn get_captcha(&self) -> ClientResult<CaptchaDto>;

    async fn send_sms_code(&self, phone_number: &str, captcha_key: &str, captcha_code: &str) -> ClientResult<()>;

    async fn login(&self, request: &LoginRequestDto) -> ClientResult<LoginResponseDto>;

    async fn get_user_profile(&self, token: Option<&str>) -> ClientResult<UserProfileDto>;

    async fn list_devices(&self, token: Option<&str>) -> ClientResult<Vec<Device>>;

    async fn bind_device(&self, token: Option<&str>, device_code: &str) -> ClientResult<()>;

    /// batched status query
    async fn get_device_status(&self, token: Option<&str>, device_ids: &[String]) -> ClientResult<Vec<DeviceStatus>>;

    async fn start_device(&self, token: Option<&str>, device_id: &str) -> ClientResult<()>;

    async fn stop_device(&self, token: Option<&str>, device_id: &str) -> ClientResult<()>;

    async fn get_wallet(&self, token: Option<&str>) -> ClientResult<WalletDto>;

    async fn list_recharge_products(&self, token: Option<&str>) -> ClientResult<Vec<RechargeProductDto>>;

    async fn create_recharge_order(&self, token: Option<&str>, product_id: &str, quantity: u32) -> ClientResult<RechargeOrderDto>;

    async fn get_payment_channels(&self, token: Option<&str>, order_id: &str) -> ClientResult<Vec<PaymentChannelDto>>;

    /// returns the provider formatted order string for the payment sdk
    async fn request_payment(&self, token: Option<&str>, order_id: &str, channel_type: i64) -> ClientResult<PaymentRequestDto>;

    async fn list_orders(&self, token: Option<&str>, page: u32, size: u32) -> ClientResult<Vec<RechargeOrderDto>>;

    async fn latest_app_version(&self) -> ClientResult<AppVersionDto>;
}
