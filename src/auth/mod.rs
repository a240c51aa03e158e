//! 登录认证模块
//! - 图形验证码、短信验证码
//! - 短信登录，登录成功后保存会话
//! - 用户资料刷新，退出登录

pub mod auth_service;
