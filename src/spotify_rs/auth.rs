use std::str::FromStr;
use std::time::Duration;

use base64::{
    Engine, alphabet,
    engine::{self, general_purpose},
};
use url::Url;

use crate::spotify_rs::types::SpotifyTokenResponse;

pub const SPOTIFY_ACCOUNTS_BASE: &str = "https://accounts.spotify.com/";

const BASIC_AUTH_ENGINE: engine::GeneralPurpose =
    engine::GeneralPurpose::new(&alphabet::STANDARD, general_purpose::PAD);

/// Spotify app credentials, given on the command line as `client_id:client_secret`.
#[derive(Clone, PartialEq, Eq)]
pub struct SpotifyCredentials {
    client_id: String,
    client_secret: String,
}

// Keep the secret out of logs.
impl std::fmt::Debug for SpotifyCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpotifyCredentials")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

impl SpotifyCredentials {
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    fn basic_auth_header(&self) -> String {
        format!(
            "Basic {}",
            BASIC_AUTH_ENGINE.encode(format!("{}:{}", self.client_id, self.client_secret))
        )
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ParseCredentialsError {
    #[error("Spotify credentials must be given as client_id:client_secret")]
    MissingSeparator,
    #[error("Spotify client id and client secret must not be empty")]
    Empty,
}

impl FromStr for SpotifyCredentials {
    type Err = ParseCredentialsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (client_id, client_secret) = s
            .trim()
            .split_once(':')
            .ok_or(ParseCredentialsError::MissingSeparator)?;
        if client_id.is_empty() || client_secret.is_empty() {
            return Err(ParseCredentialsError::Empty);
        }
        Ok(Self {
            client_id: client_id.to_string(),
            client_secret: client_secret.to_string(),
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ClientCredentialsError {
    #[error("Spotify rejected the client credentials: {reason}")]
    InvalidCredentials { reason: String },
    #[error("Failed to send http request: {0}")]
    FailedToSendRequest(reqwest::Error),
    #[error("Failed to parse response: {0}")]
    FailedToParseResponse(reqwest::Error),
    #[error("Invalid accounts url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Exchange app credentials for an app access token (client credentials flow)
/// https://developer.spotify.com/documentation/web-api/tutorials/client-credentials-flow
pub async fn request_client_credentials_token(
    client: &reqwest::Client,
    accounts_base: &Url,
    credentials: &SpotifyCredentials,
) -> Result<SpotifyTokenResponse, ClientCredentialsError> {
    let url = accounts_base.join("api/token")?;

    let response = client
        .post(url)
        // Serializes to x-www-form-urlencoded, as required by spotify
        .form(&[("grant_type", "client_credentials")])
        .header("Authorization", credentials.basic_auth_header())
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(ClientCredentialsError::FailedToSendRequest)?;

    if !response.status().is_success() {
        return Err(ClientCredentialsError::InvalidCredentials {
            reason: response
                .text()
                .await
                .unwrap_or("Failed to get error text".to_string()),
        });
    }

    response
        .json()
        .await
        .map_err(ClientCredentialsError::FailedToParseResponse)
}
