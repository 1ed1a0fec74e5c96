use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub iat: Option<u64>,
}

/// Request-scoped identity inserted by the auth middleware. Handlers take
/// this as an `Extension` parameter; there is no ambient "current user".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_patient(&self) -> bool {
        self.role.as_deref() == Some("patient")
    }

    pub fn is_professional(&self) -> bool {
        self.role.as_deref() == Some("professional")
    }
}
