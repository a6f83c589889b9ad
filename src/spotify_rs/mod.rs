pub mod auth;
pub mod client;
pub mod types;
pub mod uri;

pub use auth::{SpotifyCredentials, request_client_credentials_token};
pub use uri::parse_playlist_id;
