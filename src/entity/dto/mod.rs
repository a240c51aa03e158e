pub mod app_version_dto;
pub mod auth_dto;
pub mod device_dto;
pub mod event_dto;
pub mod payment_dto;
pub mod wallet_dto;
