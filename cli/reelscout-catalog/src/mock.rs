//! A catalog client that can be seeded with mock responses.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tracing::debug;

use crate::client::ClientTrait;
use crate::error::FetchError;
use crate::types::MovieSummary;

// Arc allows you to push things into the client from outside the client if necessary
// Mutex allows you to share across threads (necessary because of tokio)
type MockField<T> = Arc<Mutex<T>>;

/// A canned outcome for one search call.
#[derive(Debug)]
pub struct MockResponse {
    /// How long the call takes before resolving.
    pub delay: Duration,
    pub result: Result<Vec<MovieSummary>, FetchError>,
}

impl MockResponse {
    pub fn ok(movies: Vec<MovieSummary>) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Ok(movies),
        }
    }

    pub fn err(err: FetchError) -> Self {
        Self {
            delay: Duration::ZERO,
            result: Err(err),
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

/// Serves queued responses in the order searches are issued,
/// and records every query it was asked for.
///
/// Cloning shares the queue and the request log, so a test can keep a handle
/// while the controller owns the client.
#[derive(Debug, Default, Clone)]
pub struct MockClient {
    pub mock_responses: MockField<VecDeque<MockResponse>>,
    pub requests: MockField<Vec<String>>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a new response into the list of mock responses
    pub fn push_response(&self, response: MockResponse) {
        self.mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .push_back(response);
    }

    /// Queries received so far, in issue order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .clone()
    }
}

impl ClientTrait for MockClient {
    async fn search(&self, query: &str) -> Result<Vec<MovieSummary>, FetchError> {
        self.requests
            .lock()
            .expect("couldn't acquire mock lock")
            .push(query.to_string());

        let response = self
            .mock_responses
            .lock()
            .expect("couldn't acquire mock lock")
            .pop_front();

        let Some(response) = response else {
            debug!(query, "no mock response queued, returning empty results");
            return Ok(vec![]);
        };

        if !response.delay.is_zero() {
            tokio::time::sleep(response.delay).await;
        }
        response.result
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use reqwest::StatusCode;

    use super::*;

    fn movie(id: u64) -> MovieSummary {
        MovieSummary {
            id,
            title: format!("movie {id}"),
            poster_path: None,
            vote_average: 0.0,
            release_date: None,
            original_language: None,
        }
    }

    #[tokio::test]
    async fn responses_are_served_in_order() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![movie(1)]));
        client.push_response(MockResponse::err(FetchError::HttpStatus(
            StatusCode::BAD_GATEWAY,
        )));

        assert_eq!(client.search("a").await.unwrap(), vec![movie(1)]);
        assert!(matches!(
            client.search("ab").await,
            Err(FetchError::HttpStatus(StatusCode::BAD_GATEWAY))
        ));
        assert!(client.search("abc").await.unwrap().is_empty());
        assert_eq!(client.requests(), vec!["a", "ab", "abc"]);
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_response_waits() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![]).delayed(Duration::from_secs(2)));

        let start = tokio::time::Instant::now();
        client.search("slow").await.unwrap();
        assert!(start.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn client_enum_dispatches_to_mock() {
        let mock = MockClient::new();
        mock.push_response(MockResponse::ok(vec![movie(3)]));
        let client = crate::Client::from(mock.clone());

        assert_eq!(client.search("x").await.unwrap(), vec![movie(3)]);
        assert_eq!(mock.requests(), vec!["x"]);
    }
}
