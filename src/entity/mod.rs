pub mod bo;
pub mod dto;
pub mod po;
