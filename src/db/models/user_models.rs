use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: String,
    pub username: String,
    pub password_hash: String,
    pub role: String,
    pub name: Option<String>,
    pub full_name: Option<String>,
    pub created_at: String,
}

/// User projection safe to return to clients.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: String,
    pub username: String,
    pub role: String,
    pub name: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        let name = user
            .name
            .clone()
            .unwrap_or_else(|| user.username.clone());
        let full_name = user.full_name.clone().unwrap_or_else(|| name.clone());

        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role.clone(),
            name,
            full_name,
        }
    }
}

/// Login credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

/// Authentication tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}
