//! Barcodes, beacons, locations, NFC payloads and relevance dates.

use super::{timestamp, Validate};
use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// `PKBarcodeFormat` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BarcodeFormat {
    #[serde(rename = "PKBarcodeFormatQR")]
    Qr,
    #[serde(rename = "PKBarcodeFormatPDF417")]
    Pdf417,
    #[serde(rename = "PKBarcodeFormatAztec")]
    Aztec,
    #[serde(rename = "PKBarcodeFormatCode128")]
    Code128,
}

impl BarcodeFormat {
    /// Formats that devices older than iOS 9 can render.
    pub const BEFORE_IOS9: [BarcodeFormat; 3] =
        [BarcodeFormat::Qr, BarcodeFormat::Pdf417, BarcodeFormat::Aztec];

    /// Returns `true` if devices older than iOS 9 can render this format.
    pub fn supported_before_ios9(self) -> bool {
        Self::BEFORE_IOS9.contains(&self)
    }
}

/// A barcode shown on the pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Barcode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<BarcodeFormat>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub alt_text: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message_encoding: String,
}

impl Barcode {
    /// Creates a barcode with every required member set.
    pub fn new(
        format: BarcodeFormat,
        message: impl Into<String>,
        message_encoding: impl Into<String>,
        alt_text: impl Into<String>,
    ) -> Self {
        Self {
            format: Some(format),
            alt_text: alt_text.into(),
            message: message.into(),
            message_encoding: message_encoding.into(),
        }
    }
}

impl Validate for Barcode {
    fn validation_errors(&self) -> Vec<String> {
        if self.format.is_none()
            || self.message.trim().is_empty()
            || self.message_encoding.trim().is_empty()
            || self.alt_text.trim().is_empty()
        {
            return vec![format!(
                "Not all required barcode fields are set. format: {:?}, message: {:?}, messageEncoding: {:?}, altText: {:?}",
                self.format, self.message, self.message_encoding, self.alt_text
            )];
        }
        Vec::new()
    }
}

/// An iBeacon that makes the pass relevant when in range.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beacon {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<u16>,
    #[serde(rename = "proximityUUID", default, skip_serializing_if = "String::is_empty")]
    pub proximity_uuid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

impl Validate for Beacon {
    fn validation_errors(&self) -> Vec<String> {
        if self.proximity_uuid.trim().is_empty() {
            return vec!["Not all required beacon fields are set: proximityUUID".to_string()];
        }
        Vec::new()
    }
}

/// A geographic location that makes the pass relevant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_text: Option<String>,
}

impl Validate for Location {
    fn validation_errors(&self) -> Vec<String> {
        Vec::new()
    }
}

/// NFC payload for value-added-services passes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Nfc {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encryption_public_key: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub requires_authentication: bool,
}

/// Companion Android app, kept for callers that also emit Google Wallet
/// objects. Never written to `pass.json`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssociatedApp {
    pub title: String,
    pub google_play_id: Option<String>,
    pub amazon_id: Option<String>,
}

impl Validate for AssociatedApp {
    fn validation_errors(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A date or date interval during which the pass is relevant.
///
/// Without an end it serializes as `{"relevantDate": ...}`, with an end as
/// `{"startDate": ..., "endDate": ...}`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelevantDate {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl RelevantDate {
    /// A single relevant instant.
    pub fn at(start: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: None,
        }
    }

    /// A relevant interval.
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

impl Validate for RelevantDate {
    fn validation_errors(&self) -> Vec<String> {
        if self.start.is_none() {
            return vec!["A relevant date needs a start date".to_string()];
        }
        Vec::new()
    }
}

impl Serialize for RelevantDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let format = |date: &Option<DateTime<Utc>>| date.as_ref().map(timestamp::format);

        match (format(&self.start), format(&self.end)) {
            (start, Some(end)) => {
                let mut map = serializer.serialize_map(Some(2))?;
                if let Some(start) = start {
                    map.serialize_entry("startDate", &start)?;
                }
                map.serialize_entry("endDate", &end)?;
                map.end()
            }
            (Some(start), None) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("relevantDate", &start)?;
                map.end()
            }
            (None, None) => serializer.serialize_map(Some(0))?.end(),
        }
    }
}

impl<'de> Deserialize<'de> for RelevantDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct Raw {
            #[serde(default, with = "timestamp::option")]
            relevant_date: Option<DateTime<Utc>>,
            #[serde(default, with = "timestamp::option")]
            start_date: Option<DateTime<Utc>>,
            #[serde(default, with = "timestamp::option")]
            end_date: Option<DateTime<Utc>>,
        }

        let raw = Raw::deserialize(deserializer)?;
        Ok(Self {
            start: raw.start_date.or(raw.relevant_date),
            end: raw.end_date,
        })
    }
}
