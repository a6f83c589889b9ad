use sha1::{Digest, Sha1};

pub const YTM_ORIGIN: &str = "https://music.youtube.com";

/// Cookies that can carry the SAPISID value, in order of preference
const SAPISID_COOKIES: [&str; 2] = ["__Secure-3PAPISID", "SAPISID"];

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum HeadersError {
    #[error("No cookie header found in the YouTube Music request headers")]
    MissingCookie,
    #[error("The cookie header does not contain __Secure-3PAPISID or SAPISID; are you logged in?")]
    MissingSapisid,
}

/// Credentials lifted from a logged-in browser request to music.youtube.com.
#[derive(Clone, PartialEq, Eq)]
pub struct BrowserAuth {
    cookie: String,
    sapisid: String,
    auth_user: String,
}

// Keep cookies out of logs.
impl std::fmt::Debug for BrowserAuth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BrowserAuth")
            .field("auth_user", &self.auth_user)
            .finish_non_exhaustive()
    }
}

impl BrowserAuth {
    /// Parse request headers as copied from the browser's network tab.
    ///
    /// Accepts `name: value` lines; a leading request line
    /// (`POST /youtubei/v1/browse?... HTTP/2`) and HTTP/2 pseudo headers are
    /// ignored.
    pub fn from_raw_headers(raw: &str) -> Result<Self, HeadersError> {
        let mut cookie = None;
        let mut auth_user = None;

        for line in raw.lines().map(str::trim) {
            if line.starts_with(':') {
                continue;
            }
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let name = name.trim();
            if name.is_empty() || name.contains(char::is_whitespace) {
                continue;
            }
            match name.to_ascii_lowercase().as_str() {
                "cookie" => cookie = Some(value.trim().to_string()),
                "x-goog-authuser" => auth_user = Some(value.trim().to_string()),
                _ => {}
            }
        }

        let cookie = cookie.ok_or(HeadersError::MissingCookie)?;
        let sapisid = find_sapisid(&cookie).ok_or(HeadersError::MissingSapisid)?;

        Ok(Self {
            sapisid,
            cookie,
            auth_user: auth_user.unwrap_or_else(|| "0".to_string()),
        })
    }

    pub fn cookie(&self) -> &str {
        &self.cookie
    }

    pub fn auth_user(&self) -> &str {
        &self.auth_user
    }

    /// `SAPISIDHASH <ts>_<sha1("<ts> <sapisid> <origin>")>`
    pub fn authorization(&self, timestamp: i64) -> String {
        let mut hasher = Sha1::new();
        hasher.update(format!("{} {} {}", timestamp, self.sapisid, YTM_ORIGIN));
        format!("SAPISIDHASH {}_{:x}", timestamp, hasher.finalize())
    }
}

fn find_sapisid(cookie: &str) -> Option<String> {
    let pairs: Vec<(&str, &str)> = cookie
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .collect();

    SAPISID_COOKIES.iter().find_map(|wanted| {
        pairs
            .iter()
            .find(|(name, value)| name == wanted && !value.is_empty())
            .map(|(_, value)| value.to_string())
    })
}
