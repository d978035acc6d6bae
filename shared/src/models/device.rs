//! Device bridge payloads
//!
//! The bridge fronts the barcode scanner and the scale. It always reports the
//! latest scan rather than a queue, so the scan timestamp is the only way to
//! tell one physical scan from the next.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque scan timestamp.
///
/// The bridge may send epoch seconds as a float, epoch millis as an integer or
/// a sequence id as a string. Only equality is meaningful, so the canonical
/// text of the value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ScanTimestamp(String);

impl ScanTimestamp {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScanTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for ScanTimestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match serde_json::Value::deserialize(deserializer)? {
            serde_json::Value::Number(n) => Ok(Self(n.to_string())),
            serde_json::Value::String(s) => Ok(Self(s)),
            other => Err(serde::de::Error::custom(format!(
                "scan timestamp must be a number or string, got {other}"
            ))),
        }
    }
}

/// Latest scan as reported by `GET /last-barcode`
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ScanEvent {
    #[serde(default, deserialize_with = "barcode_text")]
    pub barcode: String,
    /// `null` when the bridge has not seen a scan yet
    #[serde(default, rename = "ts")]
    pub timestamp: Option<ScanTimestamp>,
    /// Symbology reported by the scanner (EAN13, CODE128, ...)
    #[serde(default)]
    pub sym: Option<String>,
}

impl ScanEvent {
    /// The event as `(barcode, timestamp)`, or `None` when the bridge has
    /// nothing usable to report.
    pub fn usable(&self) -> Option<(&str, &ScanTimestamp)> {
        let barcode = self.barcode.trim();
        match &self.timestamp {
            Some(ts) if !barcode.is_empty() && !ts.as_str().is_empty() => Some((barcode, ts)),
            _ => None,
        }
    }
}

/// Barcodes keep their leading zeros; numbers are accepted but kept as text.
fn barcode_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match Option::<serde_json::Value>::deserialize(deserializer)? {
        Some(serde_json::Value::String(s)) => s,
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    })
}

/// Weigh request body for `POST /start-weigh`
#[derive(Debug, Clone, Serialize)]
pub struct WeighRequest {
    pub plu: String,
}

/// Scale reading returned by `POST /start-weigh`
#[derive(Debug, Clone, Deserialize)]
pub struct WeighReading {
    /// Raw weight in kilograms; validated by [`WeighReading::weight_kg`]
    #[serde(default)]
    pub weight: serde_json::Value,
}

impl WeighReading {
    /// Exact decimal weight in kilograms, if the reading is numeric.
    ///
    /// Parsed from the JSON text rather than through `f64` so that `0.35`
    /// stays `0.35`.
    pub fn weight_kg(&self) -> Option<Decimal> {
        let text = match &self.weight {
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => s.trim().to_string(),
            _ => return None,
        };
        Decimal::from_str(&text)
            .or_else(|_| Decimal::from_scientific(&text))
            .ok()
    }
}
