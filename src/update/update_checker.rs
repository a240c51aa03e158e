use std::sync::Arc;

use crate::common::error::ClientResult;
use crate::entity::dto::app_version_dto::AppVersionDto;
use crate::gateway::vendor_api::VendorApi;
use crate::store::preference_store::PreferenceStore;
use crate::{debug, info};

const LOG_TAG: &str = "update-checker";

pub struct UpdateChecker {
    api: Arc<dyn VendorApi>,
    preferences: Arc<PreferenceStore>,
}

impl UpdateChecker {
    pub fn new(api: Arc<dyn VendorApi>, preferences: Arc<PreferenceStore>) -> Self {
        UpdateChecker { api, preferences }
    }

    /// latest version if it is newer than `current_version_code` and not skipped by the user
    /// a forced update ignores the skip marker
    pub async fn check(&self, current_version_code: i64) -> ClientResult<Option<AppVersionDto>> {
        let latest = self.api.latest_app_version().await?;
        if latest.version_code <= current_version_code {
            debug!(LOG_TAG, "up to date, current: {}, latest: {}", current_version_code, latest.version_code);
            return Ok(None);
        }
        if !latest.force && self.preferences.skipped_version().await? == Some(latest.version_code) {
            debug!(LOG_TAG, "version {} skipped by user", latest.version_code);
            return Ok(None);
        }
        info!(LOG_TAG, "new version available: {} ({})", latest.version_name, latest.version_code);
        Ok(Some(latest))
    }

    pub async fn skip(&self, version_code: i64) -> ClientResult<()> {
        self.preferences.skip_version(version_code).await?;
        info!(LOG_TAG, "version {} will not be offered again", version_code);
        Ok(())
    }
}
