//! 钱包模块：余额、充值套餐、充值订单记录

pub mod wallet_service;
