//! Semantic tags: machine-readable annotations that let the system offer
//! suggestions (boarding reminders, event directions, Wi-Fi joins).

use super::{timestamp, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// `PKEventType` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "PKEventTypeGeneric")]
    Generic,
    #[serde(rename = "PKEventTypeLivePerformance")]
    LivePerformance,
    #[serde(rename = "PKEventTypeMovie")]
    Movie,
    #[serde(rename = "PKEventTypeSports")]
    Sports,
    #[serde(rename = "PKEventTypeConference")]
    Conference,
    #[serde(rename = "PKEventTypeConvention")]
    Convention,
    #[serde(rename = "PKEventTypeWorkshop")]
    Workshop,
    #[serde(rename = "PKEventTypeSocialGathering")]
    SocialGathering,
}

/// Semantic annotation block of a pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTags {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admission_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub airline_code: Option<String>,
    #[serde(rename = "artistIDs", default, skip_serializing_if = "Vec::is_empty")]
    pub artist_ids: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attendee_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub away_team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<CurrencyAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boarding_group: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub current_boarding_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub current_departure_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub current_arrival_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_airport_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_gate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub departure_location: Option<SemanticLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_airport_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination_location: Option<SemanticLocation>,
    /// Duration in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub event_end_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub event_start_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_start_date_info: Option<EventDateInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_type: Option<EventType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flight_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_team_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_program_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub membership_program_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub passenger_name: Option<PersonNameComponents>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub performer_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seats: Vec<Seat>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub silence_requested: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_price: Option<CurrencyAmount>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transit_provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_location: Option<SemanticLocation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub venue_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub wifi_access: Vec<WifiNetwork>,
}

impl Validate for SemanticTags {
    fn validation_errors(&self) -> Vec<String> {
        // Wi-Fi networks are the only tags with rules of their own.
        self.wifi_access
            .iter()
            .flat_map(|network| network.validation_errors())
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyAmount {
    pub amount: String,
    pub currency_code: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDateInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_description: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_tentative: bool,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub original_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonNameComponents {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub given_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name_suffix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_row: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_section: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seat_type: Option<String>,
}

/// Wi-Fi network the pass can offer to join. Both members are required.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub ssid: String,
    pub password: String,
}

impl Validate for WifiNetwork {
    fn validation_errors(&self) -> Vec<String> {
        if self.ssid.is_empty() || self.password.is_empty() {
            return vec!["Wi-Fi network: both ssid and password must be set".to_string()];
        }
        Vec::new()
    }
}
