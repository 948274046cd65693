use serde::Deserialize;
use tracing::info;

use crate::api::Transport;
use crate::error::{ApiError, Result};

const TOKEN_URL: &str = "https://api.twitter.com/2/oauth2/token";

/// OAuth2 app credentials, used only for the HTTP Basic header on refresh.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub client_id: String,
    pub client_secret: String,
}

/// Current bearer token pair. The provider may rotate the refresh token on
/// every grant, so a refreshed pair must be persisted by the caller.
#[derive(Debug, Clone)]
pub struct OAuth2Tokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TokenGrant {
    access_token: String,
    refresh_token: Option<String>,
}

/// Exchange the refresh token for a fresh access token.
///
/// This is the credential-rotation path: it does not consult the rate limiter
/// and does not count against any monitored endpoint.
pub async fn refresh_tokens<T: Transport + ?Sized>(
    transport: &T,
    credentials: &Credentials,
    tokens: &OAuth2Tokens,
) -> Result<OAuth2Tokens> {
    let Some(refresh_token) = &tokens.refresh_token else {
        return Err(ApiError::Auth(
            "no refresh token available, re-authentication required".to_string(),
        ));
    };

    let basic = base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        format!("{}:{}", credentials.client_id, credentials.client_secret),
    );
    let form = [
        ("grant_type", "refresh_token"),
        ("refresh_token", refresh_token.as_str()),
    ];

    let response = transport
        .post_form(TOKEN_URL, &format!("Basic {basic}"), &form)
        .await?;

    if !(200..300).contains(&response.status) {
        return Err(ApiError::Auth(format!(
            "token refresh failed with HTTP {}: {}",
            response.status, response.body
        )));
    }

    let grant: TokenGrant = response.json()?;
    info!("access token refreshed");

    Ok(OAuth2Tokens {
        access_token: grant.access_token,
        // Keep the old refresh token when the grant did not rotate it.
        refresh_token: grant.refresh_token.or_else(|| tokens.refresh_token.clone()),
    })
}
