//! 供应商接口模块
//! - 每个供应商接口对应一个操作
//! - 错误分类：未登录、http 错误、网络错误、解析错误、业务拒绝

pub mod http_vendor_api;
pub mod vendor_api;

#[cfg(test)]
pub mod fake_vendor_api;
