use std::sync::Arc;

use color_eyre::eyre::{Result, eyre};
use tokio::sync::{Mutex, mpsc};

use super::types::Track;

/// Create the work queue shared by the producer and the search workers.
///
/// The queue is unbounded and FIFO. There is no separate "done" flag: the
/// producer finishes the queue by dropping its [`TrackSender`], and
/// [`TrackReceiver::pop`] only returns `None` once the sender is gone *and*
/// every queued track has been handed out.
pub fn work_queue() -> (TrackSender, TrackReceiver) {
    let (sender, receiver) = mpsc::unbounded_channel();
    (
        TrackSender { inner: sender },
        TrackReceiver {
            inner: Arc::new(Mutex::new(receiver)),
        },
    )
}

#[derive(Debug)]
pub struct TrackSender {
    inner: mpsc::UnboundedSender<Track>,
}

impl TrackSender {
    /// Enqueue a track without blocking.
    ///
    /// Fails only when every receiver is gone, i.e. all workers have exited.
    pub fn push(&self, track: Track) -> Result<()> {
        self.inner
            .send(track)
            .map_err(|error| eyre!("Search workers stopped before '{}' was queued", error.0.name))
    }

    /// Signal that no more tracks will ever be enqueued.
    pub fn finish(self) {
        drop(self);
    }
}

/// Multi-consumer handle on the work queue. Clone one per worker.
#[derive(Debug, Clone)]
pub struct TrackReceiver {
    inner: Arc<Mutex<mpsc::UnboundedReceiver<Track>>>,
}

impl TrackReceiver {
    /// Wait for the next track. `None` means the queue is finished and drained.
    pub async fn pop(&self) -> Option<Track> {
        let mut receiver = self.inner.lock().await;
        receiver.recv().await
    }
}
