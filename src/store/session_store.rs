//! 本地会话存储
//! - 会话在进程重启后仍然有效
//! - token、user_id、username、phone_number 缺一不可，不完整的记录视为未登录
//! - 同一会话内头像、企业 id 只增不减，空值不会覆盖已知值
//! - save 整体替换记录，新会话没有的可选字段会被删除

use std::sync::{Arc, Mutex};

use super::kv_store::KvStore;
use crate::common::error::ClientResult;
use crate::entity::bo::session_bo::Session;
use crate::{debug, info};

const LOG_TAG: &str = "session-store";

const KEY_TOKEN: &str = "session.token";
const KEY_USER_ID: &str = "session.user_id";
const KEY_USERNAME: &str = "session.username";
const KEY_PHONE: &str = "session.phone_number";
const KEY_AVATAR: &str = "session.avatar_url";
const KEY_ENTERPRISE: &str = "session.enterprise_id";

enum Cached {
    NotLoaded,
    Loaded(Option<Session>),
}

pub struct SessionStore {
    kv: Arc<dyn KvStore>,
    cache: Mutex<Cached>,
}

impl SessionStore {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        SessionStore {
            kv,
            cache: Mutex::new(Cached::NotLoaded),
        }
    }

    pub async fn save(&self, session: &Session) -> ClientResult<()> {
        let mut removes = Vec::new();
        let mut entries = vec![
            (KEY_TOKEN.to_string(), session.token.clone()),
            (KEY_USER_ID.to_string(), session.user_id.clone()),
            (KEY_USERNAME.to_string(), session.username.clone()),
            (KEY_PHONE.to_string(), session.phone_number.clone()),
        ];
        for (key, value) in [(KEY_AVATAR, &session.avatar_url), (KEY_ENTERPRISE, &session.enterprise_id)] {
            match value {
                Some(v) => entries.push((key.to_string(), v.clone())),
                None => removes.push(key.to_string()),
            }
        }
        self.kv.write_batch(entries, removes).await?;
        *self.cache.lock().unwrap() = Cached::Loaded(Some(session.clone()).filter(|s| s.is_complete()));
        info!(LOG_TAG, "session saved, user: {}", session.user_id);
        Ok(())
    }

    /// partial records from interrupted writes are treated as absent
    pub async fn load(&self) -> ClientResult<Option<Session>> {
        if let Some(session) = self.cached() {
            return Ok(session);
        }
        let session = self.read_from_kv().await?;
        *self.cache.lock().unwrap() = Cached::Loaded(session.clone());
        Ok(session)
    }

    pub async fn clear(&self) -> ClientResult<()> {
        let keys = [KEY_TOKEN, KEY_USER_ID, KEY_USERNAME, KEY_PHONE, KEY_AVATAR, KEY_ENTERPRISE]
            .iter()
            .map(|k| k.to_string())
            .collect();
        self.kv.remove_all(keys).await?;
        *self.cache.lock().unwrap() = Cached::Loaded(None);
        info!(LOG_TAG, "session cleared");
        Ok(())
    }

    pub async fn is_logged_in(&self) -> bool {
        self.token().await.is_some()
    }

    /// a storage failure reads as logged out
    pub async fn token(&self) -> Option<String> {
        match self.load().await {
            Ok(session) => session.map(|s| s.token),
            Err(e) => {
                crate::warn!(LOG_TAG, "cannot read session, treat as logged out: {}", e);
                None
            }
        }
    }

    /// additive profile update, returns the merged session
    pub async fn update_profile(
        &self,
        username: Option<&str>,
        avatar_url: Option<&str>,
        enterprise_id: Option<&str>,
    ) -> ClientResult<Option<Session>> {
        let Some(mut session) = self.load().await? else {
            debug!(LOG_TAG, "profile update ignored, not logged in");
            return Ok(None);
        };
        session.merge_profile(username, avatar_url, enterprise_id);
        self.save(&session).await?;
        Ok(Some(session))
    }

    fn cached(&self) -> Option<Option<Session>> {
        match &*self.cache.lock().unwrap() {
            Cached::Loaded(session) => Some(session.clone()),
            Cached::NotLoaded => None,
        }
    }

    async fn read_from_kv(&self) -> ClientResult<Option<Session>> {
        let token = self.kv.get(KEY_TOKEN).await?;
        let user_id = self.kv.get(KEY_USER_ID).await?;
        let username = self.kv.get(KEY_USERNAME).await?;
        let phone = self.kv.get(KEY_PHONE).await?;
        let (Some(token), Some(user_id), Some(username), Some(phone)) = (token, user_id, username, phone) else {
            return Ok(None);
        };
        let mut session = Session::new(&token, &user_id, &username, &phone);
        if !session.is_complete() {
            return Ok(None);
        }
        session.avatar_url = self.kv.get(KEY_AVATAR).await?.filter(|v| !v.is_empty());
        session.enterprise_id = self.kv.get(KEY_ENTERPRISE).await?.filter(|v| !v.is_empty());
        Ok(Some(session))
    }
}
