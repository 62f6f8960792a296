//! Content fingerprints: deterministic identification of pipeline inputs.
//!
//! - `fingerprint()`: BLAKE3 of the canonical JSON of any serializable value.
//! - `dataset_hash()`: BLAKE3 over the candle series in order.
//!
//! Fingerprints key the stage cache, so two runs over the same inputs share
//! cached outputs regardless of when they ran.

use crate::domain::Candle;
use serde::Serialize;

/// Hex BLAKE3 digest of `value` serialized as JSON.
///
/// Struct fields serialize in declaration order, so the digest is stable for
/// a given type layout.
pub fn fingerprint<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(value)?;
    Ok(blake3::hash(&json).to_hex().to_string())
}

/// Hex BLAKE3 digest over every candle's date and OHLC bits.
pub fn dataset_hash(candles: &[Candle]) -> String {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(candles.len() as u64).to_le_bytes());
    for candle in candles {
        hasher.update(candle.date.as_bytes());
        hasher.update(&[0]);
        for value in [candle.open, candle.high, candle.low, candle.close] {
            hasher.update(&value.to_bits().to_le_bytes());
        }
    }
    hasher.finalize().to_hex().to_string()
}

/// First `len` hex characters of a digest, for file names and log lines.
pub fn short(digest: &str, len: usize) -> &str {
    &digest[..len.min(digest.len())]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candles() -> Vec<Candle> {
        vec![
            Candle::new("2024-01-02", 2060.0, 2070.0, 2050.0, 2065.0),
            Candle::new("2024-01-03", 2065.0, 2080.0, 2040.0, 2045.0),
        ]
    }

    #[test]
    fn dataset_hash_is_deterministic() {
        assert_eq!(dataset_hash(&candles()), dataset_hash(&candles()));
    }

    #[test]
    fn dataset_hash_sees_price_changes() {
        let mut changed = candles();
        changed[1].close = 2045.01;
        assert_ne!(dataset_hash(&candles()), dataset_hash(&changed));
    }

    #[test]
    fn dataset_hash_sees_order() {
        let mut reversed = candles();
        reversed.reverse();
        assert_ne!(dataset_hash(&candles()), dataset_hash(&reversed));
    }

    #[test]
    fn fingerprint_matches_for_equal_values() {
        let a = fingerprint(&candles()).unwrap();
        let b = fingerprint(&candles()).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert_eq!(short(&a, 12).len(), 12);
    }
}
