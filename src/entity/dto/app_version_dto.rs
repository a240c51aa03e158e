use serde::Deserialize;

use crate::util::json::{de_bool, de_i64};

/// latest published app version
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppVersionDto {
    #[serde(deserialize_with = "de_i64")]
    pub version_code: i64,
    #[serde(default)]
    pub version_name: String,
    #[serde(default)]
    pub download_url: String,
    #[serde(default)]
    pub description: String,
    // 强制更新不可跳过
    #[serde(default, alias = "forceUpdate", deserialize_with = "de_bool")]
    pub force: bool,
}
