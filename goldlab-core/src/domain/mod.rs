//! Domain types for GoldLab

pub mod candle;
pub mod pattern;
pub mod result;
pub mod sentiment;
pub mod strategy;
pub mod trade;

pub use candle::{parse_candle_time, sort_ascending, validate_series, Candle, CandleError};
pub use pattern::{Direction, PatternDetection, PatternKind};
pub use result::BacktestResult;
pub use sentiment::{Impact, RawNewsItem, Sentiment, SentimentRecord, SentimentScore};
pub use strategy::Strategy;
pub use trade::{SimulatedTrade, TradeDirection};
