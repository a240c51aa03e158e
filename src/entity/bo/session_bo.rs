//! 登录会话

/// logged in user, token presence means logged in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub username: String,
    pub phone_number: String,
    pub avatar_url: Option<String>,
    pub enterprise_id: Option<String>,
}

impl Session {
    pub fn new(token: &str, user_id: &str, username: &str, phone_number: &str) -> Self {
        Session {
            token: token.to_string(),
            user_id: user_id.to_string(),
            username: username.to_string(),
            phone_number: phone_number.to_string(),
            avatar_url: None,
            enterprise_id: None,
        }
    }

    /// all required fields present and non empty
    pub fn is_complete(&self) -> bool {
        [&self.token, &self.user_id, &self.username, &self.phone_number]
            .iter()
            .all(|v| !v.trim().is_empty())
    }

    /// merge profile fields, a known value is never replaced by an empty one
    pub fn merge_profile(&mut self, username: Option<&str>, avatar_url: Option<&str>, enterprise_id: Option<&str>) {
        if let Some(name) = non_empty(username) {
            self.username = name.to_string();
        }
        if let Some(avatar) = non_empty(avatar_url) {
            self.avatar_url = Some(avatar.to_string());
        }
        if let Some(ent) = non_empty(enterprise_id) {
            self.enterprise_id = Some(ent.to_string());
        }
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
