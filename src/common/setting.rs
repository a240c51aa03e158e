//! setting config file
//! file name is `config_{ENV}.toml`, ENV defaults to `dev`

use std::env;
use std::fs;
use std::time::Duration;

use serde::Deserialize;

use super::error::{ClientError, ClientResult};

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Env {
    pub env: String,
    pub log_level: String,
}

impl Default for Env {
    fn default() -> Self {
        Env {
            env: String::from("dev"),
            log_level: String::from("info"),
        }
    }
}

/// vendor backend, the fixed headers are required by the vendor
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Vendor {
    pub base_url: String,
    pub application_type: String,
    pub version_code: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for Vendor {
    fn default() -> Self {
        Vendor {
            base_url: String::from("https://api.example-vending.com"),
            application_type: String::from("2"),
            version_code: String::from("100"),
            user_agent: String::from("vending-device-client/0.1"),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Store {
    pub db_path: String,
}

impl Default for Store {
    fn default() -> Self {
        Store {
            db_path: String::from("cache/client.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Device {
    // 状态缓存过期时间
    pub status_ttl_secs: u64,
    // 启动成功后禁止停止的时间
    pub stop_cooldown_millis: u64,
    // 定时刷新间隔
    pub auto_refresh_secs: u64,
}

impl Default for Device {
    fn default() -> Self {
        Device {
            status_ttl_secs: 30,
            stop_cooldown_millis: 2000,
            auto_refresh_secs: 30,
        }
    }
}

impl Device {
    pub fn status_ttl(&self) -> Duration {
        Duration::from_secs(self.status_ttl_secs)
    }

    pub fn stop_cooldown(&self) -> Duration {
        Duration::from_millis(self.stop_cooldown_millis)
    }

    pub fn auto_refresh_interval(&self) -> Duration {
        Duration::from_secs(self.auto_refresh_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub env: Env,
    pub vendor: Vendor,
    pub store: Store,
    pub device: Device,
}

impl Settings {
    /// load `config_{ENV}.toml` from the working directory
    pub fn load() -> ClientResult<Self> {
        let env_name = match env::var("ENV") {
            Ok(e) => e,
            Err(_) => {
                log::warn!("no ENV set, use default: 'dev'");
                String::from("dev")
            }
        };
        Self::load_from_file(format!("config_{}.toml", env_name).as_str())
    }

    pub fn load_from_file(file_path: &str) -> ClientResult<Self> {
        let str_val = fs::read_to_string(file_path)
            .map_err(|e| ClientError::Storage(format!("cannot read config file {}: {}", file_path, e)))?;
        Self::from_toml(&str_val)
    }

    pub fn from_toml(str_val: &str) -> ClientResult<Self> {
        toml::from_str(str_val).map_err(|e| ClientError::Decode(format!("config file format invalid: {}", e)))
    }
}
