// API request/response models (DTOs)

use serde::{Deserialize, Serialize};

/// `GET /auth` response reflecting the token cookie.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl AuthStatus {
    pub fn authenticated(token: String) -> Self {
        Self {
            authenticated: true,
            token: Some(token),
        }
    }

    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
            token: None,
        }
    }
}

/// Mutation acknowledgment for the saved-list endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub database: String,
}

/// Query half of the OAuth callback redirect.
#[derive(Debug, Deserialize)]
pub struct OAuthCallback {
    pub code: String,
    #[serde(default)]
    pub state: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_status_omits_token() {
        let json = serde_json::to_value(AuthStatus::anonymous()).unwrap();
        assert_eq!(json, serde_json::json!({ "authenticated": false }));
    }

    #[test]
    fn authenticated_status_echoes_token() {
        let json = serde_json::to_value(AuthStatus::authenticated("abc".into())).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "authenticated": true, "token": "abc" })
        );
    }
}
