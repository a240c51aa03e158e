//! 设备列表与绑定
//! - 每次调用都重新拉取列表，不做缓存，运行状态由 status_cache 维护
//! - 用户自定义图标只保存在本地

use std::sync::Arc;

use crate::common::error::ClientResult;
use crate::entity::dto::device_dto::Device;
use crate::entity::po::device_icon_po::DeviceIconPo;
use crate::gateway::vendor_api::VendorApi;
use crate::store::preference_store::PreferenceStore;
use crate::store::session_store::SessionStore;
use crate::{info, warn};

const LOG_TAG: &str = "device-service";

pub struct DeviceService {
    api: Arc<dyn VendorApi>,
    session: Arc<SessionStore>,
    preferences: Arc<PreferenceStore>,
}

impl DeviceService {
    pub fn new(api: Arc<dyn VendorApi>, session: Arc<SessionStore>, preferences: Arc<PreferenceStore>) -> Self {
        DeviceService { api, session, preferences }
    }

    pub async fn list_devices(&self) -> ClientResult<Vec<Device>> {
        let token = self.session.token().await;
        let devices = self.api.list_devices(token.as_deref()).await?;
        info!(LOG_TAG, "device list loaded, count: {}", devices.len());
        Ok(devices)
    }

    /// ids of the bound devices, in list order
    pub async fn device_ids(&self) -> ClientResult<Vec<String>> {
        Ok(self.list_devices().await?.into_iter().map(|d| d.id).collect())
    }

    /// `device_code` comes from the qr code on the appliance
    pub async fn bind_device(&self, device_code: &str) -> ClientResult<()> {
        let token = self.session.token().await;
        let device_code = device_code.trim();
        match self.api.bind_device(token.as_deref(), device_code).await {
            Ok(()) => {
                info!(LOG_TAG, "device {} bound", device_code);
                Ok(())
            }
            Err(e) => {
                warn!(LOG_TAG, "bind device {} failed: {}", device_code, e);
                Err(e)
            }
        }
    }

    pub async fn device_icon(&self, device_id: &str) -> ClientResult<Option<DeviceIconPo>> {
        self.preferences.device_icon(device_id).await
    }

    pub async fn set_device_icon(&self, device_id: &str, icon: &str) -> ClientResult<DeviceIconPo> {
        self.preferences.set_device_icon(device_id, icon).await
    }
}
