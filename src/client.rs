//! 客户端组合根
//! - 创建 http 网关、sqlite 存储以及各个服务
//! - 不使用全局单例，测试通过 `with_parts` 注入网关与存储
//! - `shutdown` 取消根 token，进行中的操作以 `Cancelled` 结束

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::auth::auth_service::AuthService;
use crate::common::error::ClientResult;
use crate::common::setting::Settings;
use crate::device::device_controller::DeviceController;
use crate::device::device_service::DeviceService;
use crate::device::status_cache::DeviceStatusCache;
use crate::device::workers::status_refresh_worker::status_refresh_worker;
use crate::entity::dto::event_dto::ClientEvent;
use crate::gateway::http_vendor_api::HttpVendorApi;
use crate::gateway::vendor_api::VendorApi;
use crate::info;
use crate::payment::payment_orchestrator::PaymentOrchestrator;
use crate::payment::payment_sdk::PaymentSdk;
use crate::store::kv_store::{KvStore, SqliteKvStore};
use crate::store::preference_store::PreferenceStore;
use crate::store::session_store::SessionStore;
use crate::update::update_checker::UpdateChecker;
use crate::wallet::wallet_service::WalletService;

const LOG_TAG: &str = "client";

const EVENT_CAPACITY: usize = 256;

pub struct RentalClient {
    settings: Settings,
    api: Arc<dyn VendorApi>,
    session: Arc<SessionStore>,
    cache: Arc<DeviceStatusCache>,
    auth: AuthService,
    devices: DeviceService,
    controller: DeviceController,
    wallet: WalletService,
    updates: UpdateChecker,
    events: broadcast::Sender<ClientEvent>,
    cancel: CancellationToken,
}

impl RentalClient {
    /// production wiring: http gateway and sqlite store from `settings`
    pub async fn open(settings: Settings) -> ClientResult<Self> {
        let api = Arc::new(HttpVendorApi::new(&settings.vendor)?);
        let kv = Arc::new(SqliteKvStore::open(&settings.store.db_path).await?);
        info!(LOG_TAG, "client opened, vendor: {}, db: {}", settings.vendor.base_url, settings.store.db_path);
        Ok(Self::with_parts(settings, api, kv))
    }

    pub fn with_parts(settings: Settings, api: Arc<dyn VendorApi>, kv: Arc<dyn KvStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        let cancel = CancellationToken::new();

        let session = Arc::new(SessionStore::new(kv.clone()));
        let preferences = Arc::new(PreferenceStore::new(kv));
        let cache = Arc::new(DeviceStatusCache::new(
            api.clone(),
            session.clone(),
            settings.device.status_ttl(),
            events.clone(),
        ));
        let controller = DeviceController::new(
            api.clone(),
            session.clone(),
            cache.clone(),
            settings.device.stop_cooldown(),
            events.clone(),
            cancel.child_token(),
        );

        RentalClient {
            auth: AuthService::new(api.clone(), session.clone()),
            devices: DeviceService::new(api.clone(), session.clone(), preferences.clone()),
            wallet: WalletService::new(api.clone(), session.clone()),
            updates: UpdateChecker::new(api.clone(), preferences),
            controller,
            cache,
            session,
            api,
            settings,
            events,
            cancel,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn auth(&self) -> &AuthService {
        &self.auth
    }

    pub fn devices(&self) -> &DeviceService {
        &self.devices
    }

    pub fn controller(&self) -> &DeviceController {
        &self.controller
    }

    pub fn status_cache(&self) -> &Arc<DeviceStatusCache> {
        &self.cache
    }

    pub fn wallet(&self) -> &WalletService {
        &self.wallet
    }

    pub fn updates(&self) -> &UpdateChecker {
        &self.updates
    }

    /// one payment flow, cancelled together with the client
    pub fn payment_flow(&self, sdk: Arc<dyn PaymentSdk>) -> PaymentOrchestrator {
        PaymentOrchestrator::new(
            self.api.clone(),
            self.session.clone(),
            sdk,
            self.events.clone(),
            self.cancel.child_token(),
        )
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    /// periodic status refresh for `device_ids`, stops on shutdown
    pub fn spawn_status_refresh(&self, device_ids: Vec<String>) -> JoinHandle<()> {
        status_refresh_worker(
            self.settings.device.auto_refresh_interval(),
            self.cache.clone(),
            device_ids,
            self.cancel.child_token(),
        )
    }

    pub fn shutdown(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        info!(LOG_TAG, "client shutting down");
        self.cancel.cancel();
    }

    pub fn is_shut_down(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
