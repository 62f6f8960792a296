//! Candle feeds, HTTP plumbing and the last-valid candle store

pub mod circuit_breaker;
pub mod csv_feed;
pub mod http;
pub mod provider;
pub mod store;
pub mod synthetic;
pub mod twelvedata;

pub use circuit_breaker::CircuitBreaker;
pub use csv_feed::CsvCandleFeed;
pub use provider::{CandleFeed, DataError};
pub(crate) use provider::file_stamp;
pub use store::{CandleStore, StoreMeta};
pub use synthetic::{generate_gold_candles, SyntheticFeed};
pub use twelvedata::TwelveDataFeed;
