// Token issuance and verification.
//
// The signed JWT in the `token` cookie is the single source of truth for
// identity; there is no server-side session. Expired and tampered tokens are
// distinct failures because the API reports them differently (401 JSON vs
// bare 403).

pub mod google;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::error::ApiError;

pub const TOKEN_COOKIE: &str = "token";
pub const TOKEN_TTL_SECS: i64 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub email: String,
    pub name: String,
    pub photo: String,
    pub exp: i64,
}

#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenKeys {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }

    /// Issue a 1-hour token for a verified identity.
    pub fn issue(&self, email: &str, name: &str, photo: &str) -> Result<String, ApiError> {
        let claims = Claims {
            email: email.to_string(),
            name: name.to_string(),
            photo: photo.to_string(),
            exp: (Utc::now() + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding)
            .map_err(|e| ApiError::Other(anyhow::anyhow!("token encode failed: {e}")))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        decode::<Claims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiError::TokenExpired,
                _ => ApiError::TokenInvalid,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys() -> TokenKeys {
        TokenKeys::new("test-secret")
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let keys = keys();
        let token = keys
            .issue("user@x.com", "User", "https://example.com/p.jpg")
            .unwrap();
        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.email, "user@x.com");
        assert_eq!(claims.name, "User");
    }

    #[test]
    fn expired_token_is_distinct_from_invalid() {
        let keys = keys();
        // Build a token whose exp is well past the default leeway.
        let claims = Claims {
            email: "user@x.com".into(),
            name: "User".into(),
            photo: String::new(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let stale = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();
        assert!(matches!(keys.verify(&stale), Err(ApiError::TokenExpired)));

        let mut tampered = keys
            .issue("user@x.com", "User", "")
            .unwrap();
        tampered.push('x');
        assert!(matches!(
            keys.verify(&tampered),
            Err(ApiError::TokenInvalid)
        ));
    }

    #[test]
    fn foreign_secret_is_invalid() {
        let token = TokenKeys::new("other-secret")
            .issue("user@x.com", "User", "")
            .unwrap();
        assert!(matches!(
            keys().verify(&token),
            Err(ApiError::TokenInvalid)
        ));
    }
}
