/// A source playlist entry, identified by name and artists rather than by id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Track {
    pub name: String,
    /// Primary artist first; the fallback search depends on this order.
    pub artists: Vec<String>,
}

impl Track {
    pub fn new(name: impl Into<String>, artists: Vec<String>) -> Self {
        Self {
            name: name.into(),
            artists,
        }
    }

    /// `"<name> <artist1> <artist2> ..."`
    pub fn full_query(&self) -> String {
        std::iter::once(self.name.as_str())
            .chain(self.artists.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// `"<name> <artist1>"`, only meaningful when there is more than one artist.
    pub fn primary_artist_query(&self) -> Option<String> {
        if self.artists.len() > 1 {
            Some(format!("{} {}", self.name, self.artists[0]))
        } else {
            None
        }
    }
}

/// Exactly one of these is produced per dequeued track.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Matched(String),
    Unresolved(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaylistMetadata {
    pub name: String,
    pub total_tracks: u32,
}

/// Everything a single search worker produced, owned by that worker until
/// it is handed to the aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkerResult {
    pub resolved_ids: Vec<String>,
    pub unresolved_names: Vec<String>,
}

impl WorkerResult {
    pub fn record(&mut self, outcome: SearchOutcome) {
        match outcome {
            SearchOutcome::Matched(id) => self.resolved_ids.push(id),
            SearchOutcome::Unresolved(name) => self.unresolved_names.push(name),
        }
    }

    pub fn processed(&self) -> usize {
        self.resolved_ids.len() + self.unresolved_names.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AggregateResult {
    pub resolved_ids: Vec<String>,
    pub unresolved_names: Vec<String>,
}

impl AggregateResult {
    pub fn total(&self) -> usize {
        self.resolved_ids.len() + self.unresolved_names.len()
    }
}
