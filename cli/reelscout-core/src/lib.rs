//! Search logic of reelscout.
//!
//! The crate is layered leaves first:
//!
//! - [`debounce`] turns raw keystrokes into a debounced query stream.
//! - [`state`] holds the search state and its pure transition function.
//! - [`controller`] runs the effects the transitions ask for against a
//!   catalog client and a telemetry sink.
//! - [`telemetry`] counts popular search terms.

pub mod controller;
pub mod debounce;
pub mod state;
pub mod telemetry;

pub use controller::SearchController;
pub use debounce::{DEFAULT_DEBOUNCE, QueryDebouncer, debounced};
pub use state::{FETCH_ERROR_MESSAGE, SearchModel, SearchState};
pub use telemetry::{MemoryStore, Sink, SinkError, TelemetryRecord, TelemetrySink};
