use serde::{Deserialize, Serialize};

/// 数据库对象：用户自定义的设备图标，以 json 存入 kv 表
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceIconPo {
    pub device_id: String,
    // 图标资源名称
    pub icon: String,
    // 选择时间，unix 秒
    pub updated_at: i64,
}
