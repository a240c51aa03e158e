//! login related data transmission objects

use serde::{Deserialize, Serialize};

use crate::util::json::{de_opt_string, de_string};

/// image captcha, required before the sms code is sent
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptchaDto {
    #[serde(alias = "uuid")]
    pub captcha_key: String,
    // base64 image
    #[serde(alias = "img")]
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequestDto {
    pub phone_number: String,
    pub captcha: String,
    pub sms_code: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponseDto {
    #[serde(alias = "accessToken")]
    pub token: String,
    #[serde(deserialize_with = "de_string")]
    pub user_id: String,
    #[serde(alias = "nickName")]
    pub username: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfileDto {
    #[serde(default, alias = "nickName", deserialize_with = "de_opt_string")]
    pub username: Option<String>,
    #[serde(default, alias = "avatar", deserialize_with = "de_opt_string")]
    pub avatar_url: Option<String>,
    #[serde(default, alias = "entId", deserialize_with = "de_opt_string")]
    pub enterprise_id: Option<String>,
}
