use std::io::Write;
use std::time::Duration;

/// Observable milestones of a migration. Purely informational.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationEvent {
    FetchStarted,
    TracksFetched { fetched: u32, total: u32 },
    FetchFinished { fetched: u32, total: u32 },
    SearchStarted { workers: usize },
    TrackUnresolved { name: String },
    CreatingPlaylist { name: String },
    AddingItems { count: usize },
    AddRetryScheduled { attempt: usize, delay: Duration },
    AddSucceeded { count: usize },
    AddFailed { attempts: usize },
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: MigrationEvent);
}

impl<F> ProgressReporter for F
where
    F: Fn(MigrationEvent) + Send + Sync,
{
    fn report(&self, event: MigrationEvent) {
        self(event)
    }
}

/// Prints `[*]`/`[!]` progress lines on stdout.
pub struct ConsoleProgress;

impl ProgressReporter for ConsoleProgress {
    fn report(&self, event: MigrationEvent) {
        let mut stdout = std::io::stdout().lock();
        // Progress output is best effort.
        let _ = match event {
            MigrationEvent::FetchStarted => writeln!(stdout, "[*] Retrieving songs from Spotify..."),
            MigrationEvent::TracksFetched { fetched, total } => {
                write!(stdout, "[*] {fetched}/{total} Spotify songs retrieved...\r")
                    .and_then(|_| stdout.flush())
            }
            MigrationEvent::FetchFinished { fetched, total } => {
                writeln!(stdout, "[*] {fetched}/{total} Spotify songs retrieved...")
            }
            MigrationEvent::SearchStarted { workers } => writeln!(
                stdout,
                "[*] {workers} workers searching Spotify songs on YouTube Music..."
            ),
            MigrationEvent::TrackUnresolved { name } => {
                writeln!(stdout, "[!] Skipping song: '{name}'...")
            }
            MigrationEvent::CreatingPlaylist { name } => {
                writeln!(stdout, "[*] Creating YouTube Music playlist named '{name}'...")
            }
            MigrationEvent::AddingItems { count } => {
                writeln!(stdout, "[*] Adding {count} songs to YouTube Music playlist...")
            }
            MigrationEvent::AddRetryScheduled { attempt, delay } => writeln!(
                stdout,
                "[!] Failed adding songs to YouTube Music (attempt {attempt}), trying again in {}...",
                humantime::format_duration(delay)
            ),
            MigrationEvent::AddSucceeded { count } => {
                writeln!(stdout, "[*] Added {count} songs to YouTube Music playlist")
            }
            MigrationEvent::AddFailed { attempts } => writeln!(
                stdout,
                "[!] Giving up adding songs to YouTube Music after {attempts} attempts"
            ),
        };
    }
}

/// Discards every event.
#[cfg(test)]
pub struct SilentProgress;

#[cfg(test)]
impl ProgressReporter for SilentProgress {
    fn report(&self, _event: MigrationEvent) {}
}
