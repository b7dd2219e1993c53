//! Search state and its transition function.
//!
//! [`SearchModel::transition`] is the only way the state changes. It performs
//! no I/O; the side effects a transition asks for are returned as [`Effect`]s
//! for [`crate::controller::SearchController`] to run.

use reelscout_catalog::{FetchError, MovieSummary};
use tracing::{debug, warn};

/// Message shown for any failed catalog request.
pub const FETCH_ERROR_MESSAGE: &str = "Error fetching movies. Please try again later.";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SearchState {
    #[default]
    Idle,
    Loading,
    Success(Vec<MovieSummary>),
    Error(String),
}

/// Sequence number of an issued fetch.
///
/// Only the completion of the latest generation is applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Generation(self.0 + 1)
    }
}

#[derive(Debug)]
pub enum Event {
    /// The view was mounted; loads popular movies.
    Mounted,
    /// The debounced query changed.
    QueryDebounced(String),
    /// A fetch issued for `generation` finished.
    FetchCompleted {
        generation: Generation,
        result: Result<Vec<MovieSummary>, FetchError>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Fetch {
        generation: Generation,
        query: String,
    },
    RecordTelemetry {
        query: String,
        top_result: MovieSummary,
    },
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchModel {
    query: String,
    generation: Generation,
    state: SearchState,
}

impl SearchModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// The query of the latest issued fetch.
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn state(&self) -> &SearchState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.state, SearchState::Loading)
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            SearchState::Error(message) => Some(message),
            _ => None,
        }
    }

    pub fn results(&self) -> &[MovieSummary] {
        match &self.state {
            SearchState::Success(results) => results,
            _ => &[],
        }
    }

    pub fn transition(&mut self, event: Event) -> Vec<Effect> {
        match event {
            Event::Mounted => self.start_fetch(String::new()),
            Event::QueryDebounced(query) => self.start_fetch(query),
            Event::FetchCompleted { generation, result } => {
                if generation != self.generation {
                    debug!(
                        ?generation,
                        latest = ?self.generation,
                        "discarding stale search response"
                    );
                    return vec![];
                }
                self.complete_fetch(result)
            },
        }
    }

    fn start_fetch(&mut self, query: String) -> Vec<Effect> {
        self.generation = self.generation.next();
        self.query = query.clone();
        self.state = SearchState::Loading;
        vec![Effect::Fetch {
            generation: self.generation,
            query,
        }]
    }

    fn complete_fetch(&mut self, result: Result<Vec<MovieSummary>, FetchError>) -> Vec<Effect> {
        match result {
            Ok(results) => {
                let effects = match results.first() {
                    Some(top_result) if !self.query.trim().is_empty() => {
                        vec![Effect::RecordTelemetry {
                            query: self.query.clone(),
                            top_result: top_result.clone(),
                        }]
                    },
                    _ => vec![],
                };
                self.state = SearchState::Success(results);
                effects
            },
            Err(err) => {
                warn!(
                    query = %self.query,
                    kind = err.kind(),
                    error = %err,
                    "error fetching movies"
                );
                self.state = SearchState::Error(FETCH_ERROR_MESSAGE.to_string());
                vec![]
            },
        }
    }
}
