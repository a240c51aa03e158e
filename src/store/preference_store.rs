//! small local preferences: skipped update version, custom device icon

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use super::kv_store::KvStore;
use crate::common::error::ClientResult;
use crate::entity::po::device_icon_po::DeviceIconPo;
use crate::warn;

const LOG_TAG: &str = "preference-store";

const KEY_SKIPPED_VERSION: &str = "update.skipped_version";
const DEVICE_ICON_PREFIX: &str = "device.icon.";

pub struct PreferenceStore {
    kv: Arc<dyn KvStore>,
}

impl PreferenceStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        PreferenceStore { kv }
    }

    pub async fn skipped_version(&self) -> ClientResult<Option<i64>> {
        let value = self.kv.get(KEY_SKIPPED_VERSION).await?;
        Ok(value.and_then(|v| v.parse::<i64>().ok()))
    }

    pub async fn skip_version(&self, version_code: i64) -> ClientResult<()> {
        self.kv.put(KEY_SKIPPED_VERSION, &version_code.to_string()).await
    }

    /// a corrupt blob reads as no custom icon
    pub async fn device_icon(&self, device_id: &str) -> ClientResult<Option<DeviceIconPo>> {
        let Some(blob) = self.kv.get(&icon_key(device_id)).await? else {
            return Ok(None);
        };
        match serde_json::from_str::<DeviceIconPo>(&blob) {
            Ok(po) => Ok(Some(po)),
            Err(e) => {
                warn!(LOG_TAG, "device icon blob for {} is corrupt, ignored: {}", device_id, e);
                Ok(None)
            }
        }
    }

    pub async fn set_device_icon(&self, device_id: &str, icon: &str) -> ClientResult<DeviceIconPo> {
        let po = DeviceIconPo {
            device_id: device_id.to_string(),
            icon: icon.to_string(),
            updated_at: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as i64)
                .unwrap_or(0),
        };
        let blob = serde_json::to_string(&po)?;
        self.kv.put(&icon_key(device_id), &blob).await?;
        Ok(po)
    }

    pub async fn clear_device_icon(&self, device_id: &str) -> ClientResult<()> {
        self.kv.remove(&icon_key(device_id)).await
    }
}

fn icon_key(device_id: &str) -> String {
    format!("{}{}", DEVICE_ICON_PREFIX, device_id)
}
