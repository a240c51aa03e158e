//! scripted vendor api for tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use super::vendor_api::VendorApi;
use crate::common::error::{ClientError, ClientResult};
use crate::common::http::require_token;
use crate::entity::dto::app_version_dto::AppVersionDto;
use crate::entity::dto::auth_dto::{CaptchaDto, LoginRequestDto, LoginResponseDto, UserProfileDto};
use crate::entity::dto::device_dto::{Device, DeviceServerStatus, DeviceStatus};
use crate::entity::dto::payment_dto::{PaymentChannelDto, PaymentRequestDto};
use crate::entity::dto::wallet_dto::{RechargeOrderDto, RechargeProductDto, WalletDto};
use crate::entity::bo::session_bo::Session;
use crate::store::kv_store::MemoryKvStore;
use crate::store::session_store::SessionStore;

pub struct FakeVendorApi {
    calls: Mutex<HashMap<&'static str, usize>>,
    // held calls wait here until the test releases them
    gates: Mutex<HashMap<&'static str, Arc<Notify>>>,
    pub login_result: Mutex<ClientResult<LoginResponseDto>>,
    pub profile_result: Mutex<ClientResult<UserProfileDto>>,
    pub devices: Mutex<ClientResult<Vec<Device>>>,
    pub bind_result: Mutex<ClientResult<()>>,
    pub status_result: Mutex<ClientResult<Vec<DeviceStatus>>>,
    pub start_result: Mutex<ClientResult<()>>,
    pub stop_result: Mutex<ClientResult<()>>,
    pub wallet_result: Mutex<ClientResult<WalletDto>>,
    pub order_result: Mutex<ClientResult<RechargeOrderDto>>,
    pub channels_result: Mutex<ClientResult<Vec<PaymentChannelDto>>>,
    pub payment_result: Mutex<ClientResult<PaymentRequestDto>>,
    pub version_result: Mutex<ClientResult<AppVersionDto>>,
    pub last_login: Mutex<Option<LoginRequestDto>>,
}

impl FakeVendorApi {
    pub fn new() -> Arc<Self> {
        Arc::new(FakeVendorApi {
            calls: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            login_result: Mutex::new(Ok(LoginResponseDto {
                token: "T1".to_string(),
                user_id: "U1".to_string(),
                username: "alice".to_string(),
            })),
            profile_result: Mutex::new(Ok(UserProfileDto::default())),
            devices: Mutex::new(Ok(vec![device("D1"), device("D2")])),
            bind_result: Mutex::new(Ok(())),
            status_result: Mutex::new(Ok(vec![
                DeviceStatus::new("D1", false, true),
                DeviceStatus::new("D2", true, true),
            ])),
            start_result: Mutex::new(Ok(())),
            stop_result: Mutex::new(Ok(())),
            wallet_result: Mutex::new(Ok(WalletDto::default())),
            order_result: Mutex::new(Ok(RechargeOrderDto {
                id: "O1".to_string(),
                amount: 30.0,
                status: 0,
                created_at: None,
            })),
            channels_result: Mutex::new(Ok(vec![
                PaymentChannelDto { channel_type: 41, name: "云闪付".to_string() },
                PaymentChannelDto { channel_type: 21, name: "支付宝".to_string() },
            ])),
            payment_result: Mutex::new(Ok(PaymentRequestDto {
                order_string: "app_id=1&biz_content=x&sign=y".to_string(),
            })),
            version_result: Mutex::new(Ok(AppVersionDto {
                version_code: 100,
                version_name: "1.0.0".to_string(),
                download_url: String::new(),
                description: String::new(),
                force: false,
            })),
            last_login: Mutex::new(None),
        })
    }

    pub fn calls(&self, op: &'static str) -> usize {
        *self.calls.lock().unwrap().get(op).unwrap_or(&0)
    }

    /// make `op` wait until the returned notify is triggered
    pub fn hold(&self, op: &'static str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates.lock().unwrap().insert(op, notify.clone());
        notify
    }

    async fn enter(&self, op: &'static str) {
        *self.calls.lock().unwrap().entry(op).or_insert(0) += 1;
        let gate = self.gates.lock().unwrap().get(op).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
    }
}

/// session store already holding token `T1`
pub async fn logged_in_session() -> Arc<SessionStore> {
    let store = SessionStore::new(Arc::new(MemoryKvStore::new()));
    store
        .save(&Session::new("T1", "U1", "alice", "13800000000"))
        .await
        .unwrap();
    Arc::new(store)
}

pub fn device(id: &str) -> Device {
    Device {
        id: id.to_string(),
        name: format!("设备 {}", id),
        status: DeviceServerStatus::Idle,
        device_type_code: "WATER".to_string(),
        last_online_timestamp: None,
        owner_ref: "U1".to_string(),
        address: None,
        endpoint_ref: None,
    }
}

#[async_trait]
impl VendorApi for FakeVendorApi {
    async fn get_captcha(&self) -> ClientResult<CaptchaDto> {
        self.enter("get_captcha").await;
        Ok(CaptchaDto {
            captcha_key: "K1".to_string(),
            image: "iVBORw0KGgo=".to_string(),
        })
    }

    async fn send_sms_code(&self, _phone_number: &str, _captcha_key: &str, captcha_code: &str) -> ClientResult<()> {
        self.enter("send_sms_code").await;
        if captcha_code.is_empty() {
            return Err(ClientError::DomainRejected { code: 1001, msg: "图形验证码错误".to_string() });
        }
        Ok(())
    }

    async fn login(&self, request: &LoginRequestDto) -> ClientResult<LoginResponseDto> {
        self.enter("login").await;
        *self.last_login.lock().unwrap() = Some(request.clone());
        self.login_result.lock().unwrap().clone()
    }

    async fn get_user_profile(&self, token: Option<&str>) -> ClientResult<UserProfileDto> {
        require_token(token)?;
        self.enter("get_user_profile").await;
        self.profile_result.lock().unwrap().clone()
    }

    async fn list_devices(&self, token: Option<&str>) -> ClientResult<Vec<Device>> {
        require_token(token)?;
        self.enter("list_devices").await;
        self.devices.lock().unwrap().clone()
    }

    async fn bind_device(&self, token: Option<&str>, _device_code: &str) -> ClientResult<()> {
        require_token(token)?;
        self.enter("bind_device").await;
        self.bind_result.lock().unwrap().clone()
    }

    async fn get_device_status(&self, token: Option<&str>, _device_ids: &[String]) -> ClientResult<Vec<DeviceStatus>> {
        require_token(token)?;
        self.enter("get_device_status").await;
        self.status_result.lock().unwrap().clone()
    }

    async fn start_device(&self, token: Option<&str>, _device_id: &str) -> ClientResult<()> {
        require_token(token)?;
        self.enter("start_device").await;
        self.start_result.lock().unwrap().clone()
    }

    async fn stop_device(&self, token: Option<&str>, _device_id: &str) -> ClientResult<()> {
        require_token(token)?;
        self.enter("stop_device").await;
        self.stop_result.lock().unwrap().clone()
    }

    async fn get_wallet(&self, token: Option<&str>) -> ClientResult<WalletDto> {
        require_token(token)?;
        self.enter("get_wallet").await;
        self.wallet_result.lock().unwrap().clone()
    }

    async fn list_recharge_products(&self, token: Option<&str>) -> ClientResult<Vec<RechargeProductDto>> {
        require_token(token)?;
        self.enter("list_recharge_products").await;
        Ok(vec![RechargeProductDto {
            id: "P1".to_string(),
            name: "充值 30 元".to_string(),
            amount: 30.0,
            gift_amount: Some(2.0),
        }])
    }

    async fn create_recharge_order(&self, token: Option<&str>, _product_id: &str, _quantity: u32) -> ClientResult<RechargeOrderDto> {
        require_token(token)?;
        self.enter("create_recharge_order").await;
        self.order_result.lock().unwrap().clone()
    }

    async fn get_payment_channels(&self, token: Option<&str>, _order_id: &str) -> ClientResult<Vec<PaymentChannelDto>> {
        require_token(token)?;
        self.enter("get_payment_channels").await;
        self.channels_result.lock().unwrap().clone()
    }

    async fn request_payment(&self, token: Option<&str>, _order_id: &str, _channel_type: i64) -> ClientResult<PaymentRequestDto> {
        require_token(token)?;
        self.enter("request_payment").await;
        self.payment_result.lock().unwrap().clone()
    }

    async fn list_orders(&self, token: Option<&str>, _page: u32, _size: u32) -> ClientResult<Vec<RechargeOrderDto>> {
        require_token(token)?;
        self.enter("list_orders").await;
        Ok(vec![self.order_result.lock().unwrap().clone()?])
    }

    async fn latest_app_version(&self) -> ClientResult<AppVersionDto> {
        self.enter("latest_app_version").await;
        self.version_result.lock().unwrap().clone()
    }
}
