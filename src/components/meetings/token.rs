use super::models::Provider;
use crate::config::ProviderCredentials;
use crate::error::{provider_request_error, CalendarResult, Error};
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use std::sync::{Arc, RwLock};
use tracing::info;
use url::Url;

const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const GOOGLE_SCOPE: &str = "https://www.googleapis.com/auth/calendar.events";
const MICROSOFT_LOGIN_URL: &str = "https://login.microsoftonline.com";
const TEAMS_SCOPE: &str = "offline_access OnlineMeetings.ReadWrite";

/// Seconds assumed when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN: i64 = 3600;

/// OAuth endpoints and client for one provider
#[derive(Debug, Clone)]
pub struct OAuthSettings {
    pub provider: Provider,
    pub client_id: String,
    pub client_secret: Option<String>,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
    pub redirect_port: u16,
}

impl OAuthSettings {
    pub fn google(credentials: &ProviderCredentials, redirect_port: u16) -> Self {
        Self {
            provider: Provider::Google,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            token_url: GOOGLE_TOKEN_URL.to_string(),
            scope: GOOGLE_SCOPE.to_string(),
            redirect_port,
        }
    }

    pub fn teams(credentials: &ProviderCredentials, redirect_port: u16) -> Self {
        let tenant = credentials.tenant.as_deref().unwrap_or("common");
        Self {
            provider: Provider::Teams,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
            auth_url: format!("{}/{}/oauth2/v2.0/authorize", MICROSOFT_LOGIN_URL, tenant),
            token_url: format!("{}/{}/oauth2/v2.0/token", MICROSOFT_LOGIN_URL, tenant),
            scope: TEAMS_SCOPE.to_string(),
            redirect_port,
        }
    }

    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}", self.redirect_port)
    }

    /// Browser URL that starts the authorization-code flow
    pub fn authorization_url(&self, state: &str) -> CalendarResult<Url> {
        let mut url = Url::parse(&self.auth_url).map_err(|e| {
            provider_request_error(self.provider, &format!("Invalid authorization URL: {}", e))
        })?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.client_id)
            .append_pair("redirect_uri", &self.redirect_uri())
            .append_pair("response_type", "code")
            .append_pair("access_type", "offline")
            .append_pair("prompt", "consent")
            .append_pair("scope", &self.scope)
            .append_pair("state", state);
        Ok(url)
    }
}

#[derive(Debug, Clone)]
struct StoredToken {
    access_token: String,
    expires_at: i64,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

/// Holds the OAuth session for one provider in memory
#[derive(Clone)]
pub struct TokenManager {
    settings: Arc<OAuthSettings>,
    client: Client,
    token: Arc<RwLock<Option<StoredToken>>>,
    refresh_token: Arc<RwLock<Option<String>>>,
}

impl TokenManager {
    pub fn new(settings: OAuthSettings, refresh_token: Option<String>) -> Self {
        Self {
            settings: Arc::new(settings),
            client: Client::new(),
            token: Arc::new(RwLock::new(None)),
            refresh_token: Arc::new(RwLock::new(refresh_token)),
        }
    }

    pub fn settings(&self) -> &OAuthSettings {
        &self.settings
    }

    /// Whether an unexpired access token is held
    pub fn is_signed_in(&self) -> bool {
        let token = self.token.read().unwrap_or_else(|e| e.into_inner());
        token
            .as_ref()
            .is_some_and(|token| token.expires_at > Utc::now().timestamp())
    }

    /// Current access token
    pub fn access_token(&self) -> CalendarResult<String> {
        let token = self.token.read().unwrap_or_else(|e| e.into_inner());
        token
            .as_ref()
            .filter(|token| token.expires_at > Utc::now().timestamp())
            .map(|token| token.access_token.clone())
            .ok_or(Error::ProviderNotSignedIn(self.settings.provider))
    }

    /// Refresh token obtained by the last sign-in, if any
    pub fn refresh_token(&self) -> Option<String> {
        self.refresh_token
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Store a token obtained elsewhere
    pub fn set_token(&self, access_token: impl Into<String>, expires_in: i64) {
        let stored = StoredToken {
            access_token: access_token.into(),
            expires_at: Utc::now().timestamp() + expires_in,
        };
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = Some(stored);
    }

    /// Forget the current session
    pub fn sign_out(&self) {
        *self.token.write().unwrap_or_else(|e| e.into_inner()) = None;
    }

    /// Sign in with the stored refresh token, or interactively in the browser
    pub async fn sign_in(&self) -> CalendarResult<()> {
        match self.refresh_token() {
            Some(refresh_token) => {
                let params = vec![
                    ("refresh_token", refresh_token),
                    ("grant_type", "refresh_token".to_string()),
                ];
                self.request_token(params).await
            }
            None => self.authorize_interactively().await,
        }
    }

    /// Authorization-code flow with a loopback redirect
    async fn authorize_interactively(&self) -> CalendarResult<()> {
        let provider = self.settings.provider;
        // Random state guards against forged callbacks
        let state = uuid::Uuid::new_v4().to_string();
        let auth_url = self.settings.authorization_url(&state)?;

        let server = tiny_http::Server::http(("127.0.0.1", self.settings.redirect_port))
            .map_err(|e| {
                provider_request_error(provider, &format!("Failed to start callback server: {}", e))
            })?;

        info!("Opening browser for {} authorization", provider);
        webbrowser::open(auth_url.as_str())?;

        let callback = tokio::task::spawn_blocking(move || -> CalendarResult<(String, String)> {
            let request = server.recv()?;
            let url = Url::parse(&format!("http://localhost{}", request.url())).map_err(|e| {
                provider_request_error(provider, &format!("Invalid callback URL: {}", e))
            })?;
            let param = |name: &str| {
                url.query_pairs()
                    .find(|(key, _)| key == name)
                    .map(|(_, value)| value.into_owned())
            };
            let code = param("code");
            let returned_state = param("state").unwrap_or_default();

            let message = if code.is_some() {
                "Authorization successful! You can close this window."
            } else {
                "Authorization failed. You can close this window."
            };
            request.respond(tiny_http::Response::from_string(message))?;

            let code = code.ok_or_else(|| {
                provider_request_error(provider, "No authorization code found in callback")
            })?;
            Ok((code, returned_state))
        })
        .await
        .map_err(|e| provider_request_error(provider, &format!("Callback task failed: {}", e)))??;

        let (code, returned_state) = callback;
        if returned_state != state {
            return Err(provider_request_error(provider, "OAuth state mismatch"));
        }

        let params = vec![
            ("code", code),
            ("redirect_uri", self.settings.redirect_uri()),
            ("grant_type", "authorization_code".to_string()),
        ];
        self.request_token(params).await
    }

    /// Exchange a grant for tokens and store them
    async fn request_token(&self, mut params: Vec<(&'static str, String)>) -> CalendarResult<()> {
        let provider = self.settings.provider;
        params.push(("client_id", self.settings.client_id.clone()));
        if let Some(secret) = &self.settings.client_secret {
            params.push(("client_secret", secret.clone()));
        }

        let response = self
            .client
            .post(&self.settings.token_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| provider_request_error(provider, &format!("Failed to request token: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(provider_request_error(
                provider,
                &format!("Failed to request token: HTTP {} - {}", status, error_body),
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            provider_request_error(provider, &format!("Failed to parse token response: {}", e))
        })?;

        // Providers may rotate the refresh token; keep the old one otherwise
        if let Some(refresh_token) = token.refresh_token {
            *self.refresh_token.write().unwrap_or_else(|e| e.into_inner()) = Some(refresh_token);
        }
        self.set_token(token.access_token, token.expires_in.unwrap_or(DEFAULT_EXPIRES_IN));
        info!("Signed in to {}", provider);

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> ProviderCredentials {
        ProviderCredentials {
            client_id: "client-123".to_string(),
            client_secret: Some("secret".to_string()),
            refresh_token: None,
            tenant: Some("contoso".to_string()),
        }
    }

    #[test]
    fn test_authorization_url() {
        let settings = OAuthSettings::google(&credentials(), 8080);
        let url = settings.authorization_url("state-1").unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(pairs.contains(&("redirect_uri".to_string(), "http://localhost:8080".to_string())));
        assert!(pairs.contains(&("state".to_string(), "state-1".to_string())));
    }

    #[test]
    fn test_teams_endpoints_use_tenant() {
        let settings = OAuthSettings::teams(&credentials(), 9000);
        assert_eq!(
            settings.token_url,
            "https://login.microsoftonline.com/contoso/oauth2/v2.0/token"
        );
        assert_eq!(settings.redirect_uri(), "http://localhost:9000");
    }

    #[test]
    fn test_token_expiry() {
        let manager = TokenManager::new(OAuthSettings::google(&credentials(), 8080), None);
        assert!(!manager.is_signed_in());
        assert!(matches!(
            manager.access_token(),
            Err(Error::ProviderNotSignedIn(Provider::Google))
        ));

        manager.set_token("token", 3600);
        assert!(manager.is_signed_in());
        assert_eq!(manager.access_token().unwrap(), "token");

        manager.set_token("stale", -10);
        assert!(!manager.is_signed_in());

        manager.set_token("token", 3600);
        manager.sign_out();
        assert!(!manager.is_signed_in());
    }
}
