//! 充值支付模块
//! 创建订单 -> 获取支付渠道 -> 选择支付宝 -> 获取支付串 -> 调起支付 sdk -> 按 resultStatus 归类结果

pub mod payment_orchestrator;
pub mod payment_outcome;
pub mod payment_sdk;
