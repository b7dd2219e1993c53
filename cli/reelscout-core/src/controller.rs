//! Effect boundary of the search view.
//!
//! The controller feeds debounced queries into [`SearchModel::transition`]
//! and runs the effects it returns. Fetches and telemetry writes are polled
//! concurrently on the current task, so overlapping searches are possible;
//! the model's generation check keeps stale responses out.

use futures::future::LocalBoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, Stream, StreamExt};
use reelscout_catalog::{ClientTrait, MovieSummary};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::state::{Effect, Event, Generation, SearchModel};
use crate::telemetry::TelemetrySink;

pub struct SearchController<C, S> {
    client: C,
    sink: S,
    model: SearchModel,
    published: watch::Sender<SearchModel>,
}

impl<C, S> SearchController<C, S>
where
    C: ClientTrait,
    S: TelemetrySink,
{
    pub fn new(client: C, sink: S) -> Self {
        let model = SearchModel::new();
        let (published, _) = watch::channel(model.clone());
        Self {
            client,
            sink,
            model,
            published,
        }
    }

    /// Receive every model the controller publishes.
    pub fn subscribe(&self) -> watch::Receiver<SearchModel> {
        self.published.subscribe()
    }

    pub fn model(&self) -> &SearchModel {
        &self.model
    }

    /// Mount the view and follow `queries` until the stream ends.
    ///
    /// Once `queries` ends, fetches and telemetry writes still in flight are
    /// awaited before the final model is returned.
    pub async fn run(self, queries: impl Stream<Item = String>) -> SearchModel {
        let Self {
            client,
            sink,
            mut model,
            published,
        } = self;

        let mut effects = EffectRunner::new(&client, &sink, &published);
        effects.apply(&mut model, Event::Mounted);

        futures::pin_mut!(queries);
        let mut queries_done = false;

        loop {
            if queries_done && effects.is_idle() {
                break;
            }

            tokio::select! {
                query = queries.next(), if !queries_done => match query {
                    Some(query) => {
                        debug!(query = %query, "debounced query changed");
                        effects.apply(&mut model, Event::QueryDebounced(query));
                    },
                    None => queries_done = true,
                },
                Some(event) = effects.fetches.next(), if !effects.fetches.is_empty() => {
                    effects.apply(&mut model, event);
                },
                Some(()) = effects.records.next(), if !effects.records.is_empty() => {},
            }
        }

        model
    }
}

/// In-flight effects, borrowing the client and sink they run against.
struct EffectRunner<'a, C, S> {
    client: &'a C,
    sink: &'a S,
    published: &'a watch::Sender<SearchModel>,
    fetches: FuturesUnordered<LocalBoxFuture<'a, Event>>,
    records: FuturesUnordered<LocalBoxFuture<'a, ()>>,
}

impl<'a, C, S> EffectRunner<'a, C, S>
where
    C: ClientTrait,
    S: TelemetrySink,
{
    fn new(client: &'a C, sink: &'a S, published: &'a watch::Sender<SearchModel>) -> Self {
        Self {
            client,
            sink,
            published,
            fetches: FuturesUnordered::new(),
            records: FuturesUnordered::new(),
        }
    }

    fn is_idle(&self) -> bool {
        self.fetches.is_empty() && self.records.is_empty()
    }

    /// Run `event` through the model, start the effects it asks for
    /// and publish the new model.
    fn apply(&mut self, model: &mut SearchModel, event: Event) {
        self.dispatch(model.transition(event));
        self.published.send_replace(model.clone());
    }

    fn dispatch(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Fetch { generation, query } => {
                    self.fetches
                        .push(fetch(self.client, generation, query).boxed_local());
                },
                Effect::RecordTelemetry { query, top_result } => {
                    self.records
                        .push(record(self.sink, query, top_result).boxed_local());
                },
            }
        }
    }
}

#[instrument(skip(client))]
async fn fetch<C: ClientTrait>(client: &C, generation: Generation, query: String) -> Event {
    let result = client.search(&query).await;
    Event::FetchCompleted { generation, result }
}

async fn record<S: TelemetrySink>(sink: &S, query: String, top_result: MovieSummary) {
    match sink.record(&query, &top_result).await {
        Ok(()) => debug!(query = %query, movie_id = top_result.id, "recorded search"),
        Err(err) => warn!(query = %query, error = %err, "failed to record search"),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures::SinkExt;
    use futures::channel::mpsc;
    use pretty_assertions::assert_eq;
    use reelscout_catalog::{FetchError, MockClient, MockResponse};
    use reqwest::StatusCode;

    use super::*;
    use crate::debounce::debounced;
    use crate::state::{FETCH_ERROR_MESSAGE, SearchState};
    use crate::telemetry::MemoryStore;

    fn movie(id: u64, title: &str) -> MovieSummary {
        MovieSummary {
            id,
            title: title.to_string(),
            poster_path: Some(format!("/{id}.jpg")),
            vote_average: 7.0,
            release_date: Some("2022-03-01".to_string()),
            original_language: Some("en".to_string()),
        }
    }

    fn queries(values: &[&str]) -> futures::stream::Iter<std::vec::IntoIter<String>> {
        futures::stream::iter(values.iter().map(|value| value.to_string()).collect::<Vec<_>>())
    }

    #[tokio::test]
    async fn batman_scenario_records_top_result() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![movie(100, "Popular")]));
        client.push_response(MockResponse::ok(vec![
            movie(1, "The Batman"),
            movie(2, "Batman Begins"),
        ]));
        let store = MemoryStore::new();

        let controller = SearchController::new(client.clone(), store.clone());
        let model = controller.run(queries(&["batman"])).await;

        assert_eq!(client.requests(), vec!["", "batman"]);
        assert_eq!(
            model.state(),
            &SearchState::Success(vec![movie(1, "The Batman"), movie(2, "Batman Begins")])
        );

        let record = store.get("batman").expect("search was recorded");
        assert_eq!(record.count, 1);
        assert_eq!(record.movie_id, 1);
        assert_eq!(record.title, "The Batman");
        // the mount fetch has no query and is not recorded
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn repeated_search_increments_count() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![]));
        for _ in 0..2 {
            client.push_response(MockResponse::ok(vec![movie(1, "The Batman")]));
        }
        let store = MemoryStore::new();

        let (mut tx, rx) = mpsc::unbounded();
        let controller = SearchController::new(client.clone(), store.clone());
        let mut updates = controller.subscribe();

        // the second search must not supersede the first one
        let driver = async move {
            tx.send("batman".to_string()).await.unwrap();
            updates
                .wait_for(|model| {
                    model.query() == "batman" && matches!(model.state(), SearchState::Success(_))
                })
                .await
                .unwrap();
            tx.send("Batman".to_string()).await.unwrap();
        };
        tokio::join!(controller.run(rx), driver);

        assert_eq!(client.requests(), vec!["", "batman", "Batman"]);
        assert_eq!(store.get("batman").map(|record| record.count), Some(2));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn server_error_shows_generic_message() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![]));
        client.push_response(MockResponse::err(FetchError::HttpStatus(
            StatusCode::INTERNAL_SERVER_ERROR,
        )));
        let store = MemoryStore::new();

        let model = SearchController::new(client, store.clone())
            .run(queries(&["batman"]))
            .await;

        assert_eq!(model.error_message(), Some(FETCH_ERROR_MESSAGE));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn empty_results_are_success() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![]));
        client.push_response(MockResponse::ok(vec![]));
        let store = MemoryStore::new();

        let model = SearchController::new(client, store.clone())
            .run(queries(&["qwertyuiop"]))
            .await;

        assert_eq!(model.state(), &SearchState::Success(vec![]));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn mount_only_never_records() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![movie(1, "Popular")]));
        let store = MemoryStore::new();

        let model = SearchController::new(client.clone(), store.clone())
            .run(queries(&[]))
            .await;

        assert_eq!(client.requests(), vec![""]);
        assert_eq!(model.results(), &[movie(1, "Popular")]);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn unavailable_sink_does_not_affect_state() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![]));
        client.push_response(MockResponse::ok(vec![movie(1, "The Batman")]));

        let model = SearchController::new(client, MemoryStore::unavailable())
            .run(queries(&["batman"]))
            .await;

        assert_eq!(model.state(), &SearchState::Success(vec![movie(1, "The Batman")]));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_response_does_not_overwrite_newer_one() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![]));
        // "a" resolves long after "ab"
        client.push_response(
            MockResponse::ok(vec![movie(1, "A")]).delayed(Duration::from_secs(3)),
        );
        client.push_response(
            MockResponse::ok(vec![movie(2, "AB")]).delayed(Duration::from_millis(100)),
        );
        let store = MemoryStore::new();

        let (mut tx, rx) = mpsc::unbounded();
        let controller = SearchController::new(client.clone(), store.clone());
        let mut updates = controller.subscribe();

        let driver = async move {
            tx.send("a".to_string()).await.unwrap();
            tokio::time::sleep(Duration::from_millis(10)).await;
            tx.send("ab".to_string()).await.unwrap();
        };
        let (model, ()) = tokio::join!(controller.run(rx), driver);

        assert_eq!(client.requests(), vec!["", "a", "ab"]);
        assert_eq!(model.query(), "ab");
        assert_eq!(model.state(), &SearchState::Success(vec![movie(2, "AB")]));
        assert_eq!(updates.borrow_and_update().results(), &[movie(2, "AB")]);

        // only the applied response is recorded
        assert!(store.get("a").is_none());
        assert_eq!(store.get("ab").map(|record| record.movie_id), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn debounced_typing_fetches_final_query_only() {
        let client = MockClient::new();
        let store = MemoryStore::new();

        let (mut tx, rx) = mpsc::unbounded();
        let controller = SearchController::new(client.clone(), store);

        let typing = async move {
            for value in ["b", "ba", "bat", "batm", "batma", "batman"] {
                tx.send(value.to_string()).await.unwrap();
                tokio::time::sleep(Duration::from_millis(120)).await;
            }
        };
        let debounced_queries = debounced(rx, Duration::from_millis(500), "");
        let (model, ()) = tokio::join!(controller.run(debounced_queries), typing);

        assert_eq!(client.requests(), vec!["", "batman"]);
        assert_eq!(model.query(), "batman");
    }

    #[tokio::test]
    async fn published_models_follow_transitions() {
        let client = MockClient::new();
        client.push_response(MockResponse::ok(vec![movie(1, "Popular")]));
        let controller = SearchController::new(client, MemoryStore::new());
        let updates = controller.subscribe();
        assert_eq!(updates.borrow().state(), &SearchState::Idle);
        assert_eq!(controller.model().state(), &SearchState::Idle);

        controller.run(queries(&[])).await;

        assert_eq!(updates.borrow().results(), &[movie(1, "Popular")]);
    }
}
