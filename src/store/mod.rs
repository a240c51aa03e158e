//! 本地持久化模块
//! - 键值存储端口（sqlite / 内存）
//! - 登录会话
//! - 本地偏好设置

pub mod kv_store;
pub mod preference_store;
pub mod session_store;
