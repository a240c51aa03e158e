//! device data transmission objects

use serde::{Deserialize, Serialize};

use crate::util::json::{de_bool, de_i64_or_zero, de_opt_string, de_string};

/// device status enum reported by the vendor list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(from = "i64")]
pub enum DeviceServerStatus {
    Offline,
    Idle,
    Running,
    Fault,
    Unknown(i64),
}

impl From<i64> for DeviceServerStatus {
    fn from(code: i64) -> Self {
        match code {
            0 => DeviceServerStatus::Offline,
            1 => DeviceServerStatus::Idle,
            2 => DeviceServerStatus::Running,
            3 => DeviceServerStatus::Fault,
            other => DeviceServerStatus::Unknown(other),
        }
    }
}

/// immutable snapshot from one list call, identity is `id`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    #[serde(deserialize_with = "de_string")]
    pub id: String,
    pub name: String,
    pub status: DeviceServerStatus,
    #[serde(alias = "typeCode", deserialize_with = "de_string")]
    pub device_type_code: String,
    #[serde(default, alias = "lastOnlineTime")]
    pub last_online_timestamp: Option<i64>,
    #[serde(alias = "ownerId", deserialize_with = "de_string")]
    pub owner_ref: String,
    #[serde(default, deserialize_with = "de_opt_string")]
    pub address: Option<String>,
    #[serde(default, alias = "endpointId", deserialize_with = "de_opt_string")]
    pub endpoint_ref: Option<String>,
}

impl PartialEq for Device {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceStatus {
    #[serde(alias = "id", deserialize_with = "de_string")]
    pub device_id: String,
    #[serde(alias = "isRunning", deserialize_with = "de_bool")]
    pub running: bool,
    #[serde(alias = "isOnline", deserialize_with = "de_bool")]
    pub online: bool,
}

impl DeviceStatus {
    pub fn new(device_id: &str, running: bool, online: bool) -> Self {
        DeviceStatus {
            device_id: device_id.to_string(),
            running,
            online,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommandDto {
    pub device_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BindDeviceDto {
    pub device_code: String,
}

/// wrapper used by the batched status endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceStatusListDto {
    #[serde(default)]
    pub list: Vec<DeviceStatus>,
}

/// paging wrapper for the device list endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceListDto {
    #[serde(default, alias = "records")]
    pub list: Vec<Device>,
    #[serde(default, deserialize_with = "de_i64_or_zero")]
    pub total: i64,
}
