pub mod migration;
pub mod spotify;
pub mod youtube_music;
