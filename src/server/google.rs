use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;

use super::config::Config;
use super::error::AppError;
use crate::models::User;

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
const SCOPE: &str = "profile email";

/// Third-party sign-in: where to send the browser, and how to turn the code it
/// comes back with into a profile.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn authorize_url(&self, state: &str) -> String;
    async fn exchange(&self, code: &str) -> Result<User, AppError>;
}

pub struct GoogleOAuth {
    client: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_uri: String,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct GoogleProfile {
    sub: String,
    email: String,
    name: Option<String>,
    picture: Option<String>,
}

impl From<GoogleProfile> for User {
    fn from(p: GoogleProfile) -> Self {
        User {
            email: p.email,
            name: p.name,
            id: Some(p.sub),
            picture: p.picture,
        }
    }
}

impl GoogleOAuth {
    pub fn new(config: &Config) -> Self {
        if config.client_id.is_empty() || config.client_secret.is_empty() {
            tracing::warn!("CLIENT_ID or CLIENT_SECRET is empty; Google sign-in will fail");
        }
        Self {
            client: reqwest::Client::new(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_uri: config.redirect_uri.clone(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuth {
    fn authorize_url(&self, state: &str) -> String {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", SCOPE),
            ("state", state),
        ];
        match Url::parse_with_params(AUTH_URL, &params) {
            Ok(url) => url.to_string(),
            Err(e) => {
                tracing::error!("Failed to build consent URL: {e}");
                AUTH_URL.to_string()
            }
        }
    }

    async fn exchange(&self, code: &str) -> Result<User, AppError> {
        let form = [
            ("code", code),
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("redirect_uri", self.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];
        let resp = self.client.post(TOKEN_URL).form(&form).send().await?;
        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Rejected(format!("token endpoint returned {status}: {body}")));
        }
        let token: TokenResponse = resp.json().await?;

        let profile: GoogleProfile = self
            .client
            .get(USERINFO_URL)
            .bearer_auth(&token.access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        tracing::info!(email = %profile.email, "Google profile fetched");
        Ok(profile.into())
    }
}
