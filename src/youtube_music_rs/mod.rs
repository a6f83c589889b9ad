use std::time::Duration;

use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{Value, json};
use url::Url;

pub mod auth;
pub mod playlist;
pub mod search;

pub use auth::BrowserAuth;

/// Docs (unofficial):
/// https://ytmusicapi.readthedocs.io/en/stable/reference.html
pub const YTM_BASE_URL: &str = "https://music.youtube.com/youtubei/v1/";
const YTM_CLIENT_NAME: &str = "WEB_REMIX";
const YTM_CLIENT_VERSION: &str = "1.20241127.01.00";
const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:88.0) Gecko/20100101 Firefox/88.0";

#[derive(Debug, thiserror::Error)]
pub enum InnerTubeError {
    #[error("Failed to send YouTube Music request: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("YouTube Music returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Failed to parse YouTube Music response: {0}")]
    Decode(#[source] reqwest::Error),
    #[error("Invalid YouTube Music endpoint: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// Thin client over the InnerTube JSON API used by the YouTube Music web app.
///
/// Without [`BrowserAuth`] only public endpoints (search) work.
#[derive(Debug, Clone)]
pub struct InnerTubeClient {
    client: Client,
    base_url: Url,
    auth: Option<BrowserAuth>,
    language: String,
}

impl InnerTubeClient {
    pub fn new(base_url: Url, auth: Option<BrowserAuth>) -> Self {
        Self {
            client: Client::new(),
            base_url,
            auth,
            language: "en".to_string(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_some()
    }

    fn context(&self) -> Value {
        json!({
            "client": {
                "clientName": YTM_CLIENT_NAME,
                "clientVersion": YTM_CLIENT_VERSION,
                "hl": self.language,
            },
            "user": {},
        })
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("User-Agent", HeaderValue::from_static(USER_AGENT));
        headers.insert("Accept", HeaderValue::from_static("*/*"));
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Origin", HeaderValue::from_static(auth::YTM_ORIGIN));
        headers.insert("X-Origin", HeaderValue::from_static(auth::YTM_ORIGIN));

        if let Some(auth) = &self.auth {
            let authorization = auth.authorization(chrono::Utc::now().timestamp());
            // Header values come from the user's own browser; skip any that are not valid ASCII.
            for (name, value) in [
                ("Cookie", auth.cookie().to_string()),
                ("X-Goog-AuthUser", auth.auth_user().to_string()),
                ("Authorization", authorization),
            ] {
                match HeaderValue::from_str(&value) {
                    Ok(value) => {
                        headers.insert(name, value);
                    }
                    Err(_) => tracing::warn!(header = name, "Skipping invalid header value"),
                }
            }
        }

        headers
    }

    /// POST `body` (plus the client context) to `endpoint` and return the JSON response.
    pub async fn post(&self, endpoint: &str, mut body: Value) -> Result<Value, InnerTubeError> {
        let mut url = self.base_url.join(endpoint)?;
        url.query_pairs_mut()
            .append_pair("alt", "json")
            .append_pair("prettyPrint", "false");

        if let Value::Object(fields) = &mut body {
            fields.insert("context".to_string(), self.context());
        }

        let response = self
            .client
            .post(url)
            .headers(self.headers())
            .json(&body)
            .timeout(Duration::from_secs(30))
            .send()
            .await
            .map_err(InnerTubeError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(InnerTubeError::Status {
                status: status.as_u16(),
                body: response
                    .text()
                    .await
                    .unwrap_or("Failed to get error text".to_string()),
            });
        }

        response.json::<Value>().await.map_err(InnerTubeError::Decode)
    }
}
