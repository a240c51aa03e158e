//! 共享设备租赁客户端
//! - 短信登录与本地会话
//! - 设备列表、状态缓存、启停控制
//! - 钱包余额与支付宝充值
//! - 版本更新检查

pub mod common;
pub mod util;
pub mod entity;
pub mod gateway;
pub mod store;
pub mod device;
pub mod auth;
pub mod wallet;
pub mod payment;
pub mod update;
pub mod client;
