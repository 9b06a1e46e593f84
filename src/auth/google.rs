// Google OAuth 2.0 authorization-code flow, driven directly over HTTP.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{debug, info};

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

#[derive(Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
}

/// Identity fields we keep from Google's userinfo endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUser {
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "picture")]
    pub photo: String,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Consent-screen URL the login redirect points at.
pub fn authorize_url(cfg: &OAuthConfig, state: &str) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
        AUTHORIZE_URL,
        urlencoding::encode(&cfg.client_id),
        urlencoding::encode(&cfg.redirect_uri),
        urlencoding::encode("email profile"),
        urlencoding::encode(state),
    )
}

/// Exchange an authorization code for the user's identity.
pub async fn exchange_code(
    client: &reqwest::Client,
    cfg: &OAuthConfig,
    code: &str,
) -> Result<GoogleUser> {
    debug!("exchanging authorization code");
    let params = [
        ("code", code),
        ("client_id", cfg.client_id.as_str()),
        ("client_secret", cfg.client_secret.as_str()),
        ("redirect_uri", cfg.redirect_uri.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let response = client
        .post(TOKEN_URL)
        .form(&params)
        .send()
        .await
        .context("failed to send token request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("token exchange failed: {} - {}", status, body);
    }

    let token: TokenResponse = response
        .json()
        .await
        .context("failed to parse token response")?;

    let user: GoogleUser = client
        .get(USERINFO_URL)
        .bearer_auth(&token.access_token)
        .send()
        .await
        .context("failed to fetch userinfo")?
        .error_for_status()
        .context("userinfo request rejected")?
        .json()
        .await
        .context("failed to parse userinfo")?;

    info!(email = %user.email, "google identity verified");
    Ok(user)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn authorize_url_carries_redirect_and_state() {
        let cfg = OAuthConfig {
            client_id: "client-1".into(),
            client_secret: "unused".into(),
            redirect_uri: "http://localhost:8080/auth/google/callback".into(),
        };
        let url = authorize_url(&cfg, "abc123");
        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=client-1"));
        assert!(url.contains("state=abc123"));
        assert!(url.contains("scope=email%20profile"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgoogle%2Fcallback"
        ));
    }
}
