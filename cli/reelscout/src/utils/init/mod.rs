mod catalog_client;
mod logger;
mod telemetry;

pub use catalog_client::*;
pub use logger::*;
pub use telemetry::*;
