//! 设备模块
//! - 设备列表、绑定、本地图标
//! - 设备状态缓存与定时刷新
//! - 设备启停控制，乐观更新与失败回滚

pub mod device_controller;
pub mod device_service;
pub mod status_cache;
pub mod workers;
