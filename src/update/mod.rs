//! 版本更新检查

pub mod update_checker;
