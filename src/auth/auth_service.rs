use std::sync::Arc;

use crate::common::error::{ClientError, ClientResult};
use crate::entity::bo::session_bo::Session;
use crate::entity::dto::auth_dto::{CaptchaDto, LoginRequestDto};
use crate::gateway::vendor_api::VendorApi;
use crate::store::session_store::SessionStore;
use crate::{debug, info, warn};

const LOG_TAG: &str = "auth-service";

pub struct AuthService {
    api: Arc<dyn VendorApi>,
    session: Arc<SessionStore>,
}

impl AuthService {
    pub fn new(api: Arc<dyn VendorApi>, session: Arc<SessionStore>) -> Self {
        AuthService { api, session }
    }

    pub async fn captcha(&self) -> ClientResult<CaptchaDto> {
        self.api.get_captcha().await
    }

    pub async fn send_sms_code(&self, phone_number: &str, captcha_key: &str, captcha_code: &str) -> ClientResult<()> {
        self.api.send_sms_code(phone_number, captcha_key, captcha_code).await?;
        info!(LOG_TAG, "sms code sent to {}", mask_phone(phone_number));
        Ok(())
    }

    /// login by sms code, the session is saved before the profile is fetched
    /// 资料拉取失败不影响登录结果
    pub async fn login(&self, phone_number: &str, captcha: &str, sms_code: &str) -> ClientResult<Session> {
        let request = LoginRequestDto {
            phone_number: phone_number.to_string(),
            captcha: captcha.to_string(),
            sms_code: sms_code.to_string(),
        };
        let response = self.api.login(&request).await?;

        let session = Session::new(&response.token, &response.user_id, &response.username, phone_number);
        if !session.is_complete() {
            warn!(LOG_TAG, "login response is missing required fields");
            return Err(ClientError::Decode("incomplete login response".to_string()));
        }
        self.session.save(&session).await?;
        info!(LOG_TAG, "login success, user: {}", session.user_id);

        match self.refresh_profile().await {
            Ok(Some(merged)) => Ok(merged),
            Ok(None) => Ok(session),
            Err(e) => {
                warn!(LOG_TAG, "profile fetch after login failed, keep basic session: {}", e);
                Ok(session)
            }
        }
    }

    /// fetch the profile and merge it into the stored session
    pub async fn refresh_profile(&self) -> ClientResult<Option<Session>> {
        let token = self.session.token().await;
        let profile = self.api.get_user_profile(token.as_deref()).await?;
        debug!(LOG_TAG, "profile fetched: {:?}", profile);
        self.session
            .update_profile(
                profile.username.as_deref(),
                profile.avatar_url.as_deref(),
                profile.enterprise_id.as_deref(),
            )
            .await
    }

    pub async fn logout(&self) -> ClientResult<()> {
        self.session.clear().await?;
        info!(LOG_TAG, "logged out");
        Ok(())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.session.is_logged_in().await
    }

    pub async fn token(&self) -> Option<String> {
        self.session.token().await
    }

    pub async fn current_session(&self) -> ClientResult<Option<Session>> {
        self.session.load().await
    }
}

// 138****0000
fn mask_phone(phone_number: &str) -> String {
    let chars: Vec<char> = phone_number.chars().collect();
    if chars.len() < 7 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..3].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}****{}", head, tail)
}
