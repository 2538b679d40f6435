//! Authentication Models
//! Mission: Define credential and token data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Registered credential ("usuario")
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Usuario {
    pub id: Uuid,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String, // bcrypt hash - never serialize
    pub created_at: DateTime<Utc>,
}

/// JWT Claims payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // subject (username)
    pub exp: usize,  // expiration timestamp
}

/// Credentials presented at login or registration.
/// `/token` carries these as form fields, `/login/` and `/usuarios/` as JSON.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

/// Successful token issuance
#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String, // always "bearer"
}

impl TokenResponse {
    pub fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

/// Registration response (sanitized)
#[derive(Debug, Serialize)]
pub struct RegisteredUser {
    pub username: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usuario_never_serializes_password_hash() {
        let usuario = Usuario {
            id: Uuid::new_v4(),
            username: "maria".to_string(),
            password_hash: "$2b$12$secret".to_string(),
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&usuario).unwrap();
        assert!(json.contains("maria"));
        assert!(!json.contains("$2b$12$secret"));
        assert!(!json.contains("password_hash"));
    }

    #[test]
    fn test_token_response_shape() {
        let resp = TokenResponse::bearer("abc.def.ghi".to_string());
        let json = serde_json::to_value(&resp).unwrap();

        assert_eq!(json["access_token"], "abc.def.ghi");
        assert_eq!(json["token_type"], "bearer");
    }
}
