use std::sync::Arc;

use color_eyre::eyre::{Result, WrapErr};
use tracing::instrument;

use super::progress::{MigrationEvent, ProgressReporter};
use super::queue::TrackSender;
use super::types::{PlaylistMetadata, Track};
use crate::ports::spotify::{SpotifyClient, SpotifyPlaylistEntry};

/// Page through the source playlist, queueing one [`Track`] per entry.
///
/// The queue is finished only once a page comes back empty, so a total that
/// changed on the remote side during pagination can neither strand workers
/// nor drop tracks.
#[instrument(skip(client, queue, progress))]
pub async fn produce_tracks(
    client: Arc<dyn SpotifyClient>,
    playlist_id: String,
    queue: TrackSender,
    progress: Arc<dyn ProgressReporter>,
) -> Result<PlaylistMetadata> {
    let playlist = client
        .playlist_metadata(&playlist_id)
        .await
        .wrap_err("Failed to fetch Spotify playlist")?;
    let total = playlist.total_tracks;
    tracing::info!(name = %playlist.name, total, "Fetched Spotify playlist metadata");

    progress.report(MigrationEvent::FetchStarted);

    let mut offset: u32 = 0;
    let mut unavailable = 0usize;
    loop {
        let page = client
            .playlist_items_page(&playlist_id, offset)
            .await
            .wrap_err_with(|| format!("Failed to fetch Spotify playlist items at offset {offset}"))?;
        if page.is_empty() {
            break;
        }

        offset += page.len() as u32;
        for entry in page {
            match entry {
                SpotifyPlaylistEntry::Track(track) => {
                    queue.push(Track::new(track.name, track.artists))?;
                }
                SpotifyPlaylistEntry::Unavailable => unavailable += 1,
            }
        }

        if offset == total {
            tracing::debug!(offset, "Reached reported playlist total");
        }
        progress.report(MigrationEvent::TracksFetched {
            fetched: offset,
            total,
        });
    }

    queue.finish();

    if offset != total {
        tracing::warn!(
            fetched = offset,
            total,
            "Spotify playlist size changed during pagination"
        );
    }
    if unavailable > 0 {
        tracing::warn!(unavailable, "Skipped unavailable Spotify playlist entries");
    }
    progress.report(MigrationEvent::FetchFinished {
        fetched: offset,
        total,
    });

    Ok(PlaylistMetadata {
        name: playlist.name,
        total_tracks: total,
    })
}
