//! The pass document and its validation rules.
//!
//! A [`Pass`] is the record serialized into `pass.json`. It carries the
//! identifying scalars, exactly one [`PassStyle`] with its ordered field
//! groups, and optional relevance, barcode and annotation data.
//!
//! # Validation
//!
//! Every element implements [`Validate`]. Validation never stops at the
//! first problem: [`Validate::validation_errors`] returns the complete list so
//! that callers can report everything in one pass.
//!
//! ```
//! use passkit::pass::{Field, Pass, PassStyle, Validate};
//!
//! let mut pass = Pass::new("serial-1", "pass.com.example", "TEAM123456", "Example", "A pass");
//! assert!(!pass.is_valid()); // no style yet
//!
//! let mut style = PassStyle::coupon();
//! style.fields_mut().primary_fields.push(Field::new("offer", "20% off"));
//! pass.set_style(style);
//! assert!(pass.is_valid());
//! ```

pub mod elements;
pub mod field;
pub mod personalization;
pub mod semantics;

pub use elements::{AssociatedApp, Barcode, BarcodeFormat, Beacon, Location, Nfc, RelevantDate};
pub use field::{DataDetectorType, DateStyle, Field, FieldValue, NumberStyle, TextAlignment};
pub use personalization::{Personalization, PersonalizationField};
pub use semantics::SemanticTags;

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};

/// Minimum length of the authentication token when a web service is set.
pub const MIN_AUTH_TOKEN_LEN: usize = 16;

/// Aggregating validation shared by every document element.
pub trait Validate {
    /// Every rule violation of this element and its children.
    fn validation_errors(&self) -> Vec<String>;

    /// `true` when [`Validate::validation_errors`] is empty.
    fn is_valid(&self) -> bool {
        self.validation_errors().is_empty()
    }
}

/// RFC 3339 timestamps with second precision and a `Z` suffix.
mod timestamp {
    use chrono::{DateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn format(date: &DateTime<Utc>) -> String {
        date.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    fn parse<E: serde::de::Error>(value: &str) -> Result<DateTime<Utc>, E> {
        DateTime::parse_from_rfc3339(value)
            .map(|date| date.with_timezone(&Utc))
            .map_err(E::custom)
    }

    pub fn serialize<S: Serializer>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(date))
    }

    pub mod option {
        use super::*;

        pub fn serialize<S: Serializer>(
            date: &Option<DateTime<Utc>>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match date {
                Some(date) => super::serialize(date, serializer),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(deserializer)?
                .map(|value| parse(&value))
                .transpose()
        }
    }
}

/// `PKTransitType` values for boarding passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransitType {
    #[serde(rename = "PKTransitTypeAir")]
    Air,
    #[serde(rename = "PKTransitTypeBoat")]
    Boat,
    #[serde(rename = "PKTransitTypeBus")]
    Bus,
    #[serde(rename = "PKTransitTypeGeneric")]
    Generic,
    #[serde(rename = "PKTransitTypeTrain")]
    Train,
}

/// The five ordered field groups of a pass style.
///
/// Order inside each group drives on-device layout and is preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGroups {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub header_fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub secondary_fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auxiliary_fields: Vec<Field>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub back_fields: Vec<Field>,
}

impl FieldGroups {
    pub fn add_header_field(&mut self, field: Field) {
        self.header_fields.push(field);
    }

    pub fn add_primary_field(&mut self, field: Field) {
        self.primary_fields.push(field);
    }

    pub fn add_secondary_field(&mut self, field: Field) {
        self.secondary_fields.push(field);
    }

    pub fn add_auxiliary_field(&mut self, field: Field) {
        self.auxiliary_fields.push(field);
    }

    pub fn add_back_field(&mut self, field: Field) {
        self.back_fields.push(field);
    }

    /// All fields, group by group, in display order.
    pub fn iter(&self) -> impl Iterator<Item = &Field> {
        self.header_fields
            .iter()
            .chain(&self.primary_fields)
            .chain(&self.secondary_fields)
            .chain(&self.auxiliary_fields)
            .chain(&self.back_fields)
    }
}

impl Validate for FieldGroups {
    fn validation_errors(&self) -> Vec<String> {
        self.iter().flat_map(|field| field.validation_errors()).collect()
    }
}

/// The kind of pass. Exactly one is attached to a valid [`Pass`].
#[derive(Debug, Clone, PartialEq)]
pub enum PassStyle {
    Generic(FieldGroups),
    BoardingPass {
        /// Required; `None` only after parsing a `pass.json` that lacks it.
        transit_type: Option<TransitType>,
        fields: FieldGroups,
    },
    Coupon(FieldGroups),
    StoreCard(FieldGroups),
    EventTicket(FieldGroups),
}

impl PassStyle {
    pub fn generic() -> Self {
        PassStyle::Generic(FieldGroups::default())
    }

    pub fn boarding_pass(transit_type: TransitType) -> Self {
        PassStyle::BoardingPass {
            transit_type: Some(transit_type),
            fields: FieldGroups::default(),
        }
    }

    pub fn coupon() -> Self {
        PassStyle::Coupon(FieldGroups::default())
    }

    pub fn store_card() -> Self {
        PassStyle::StoreCard(FieldGroups::default())
    }

    pub fn event_ticket() -> Self {
        PassStyle::EventTicket(FieldGroups::default())
    }

    /// Key of this style in `pass.json`.
    pub fn json_key(&self) -> &'static str {
        match self {
            PassStyle::Generic(_) => "generic",
            PassStyle::BoardingPass { .. } => "boardingPass",
            PassStyle::Coupon(_) => "coupon",
            PassStyle::StoreCard(_) => "storeCard",
            PassStyle::EventTicket(_) => "eventTicket",
        }
    }

    pub fn fields(&self) -> &FieldGroups {
        match self {
            PassStyle::Generic(fields)
            | PassStyle::Coupon(fields)
            | PassStyle::StoreCard(fields)
            | PassStyle::EventTicket(fields)
            | PassStyle::BoardingPass { fields, .. } => fields,
        }
    }

    pub fn fields_mut(&mut self) -> &mut FieldGroups {
        match self {
            PassStyle::Generic(fields)
            | PassStyle::Coupon(fields)
            | PassStyle::StoreCard(fields)
            | PassStyle::EventTicket(fields)
            | PassStyle::BoardingPass { fields, .. } => fields,
        }
    }

    /// Only boarding passes and event tickets may carry a grouping identifier.
    pub fn allows_grouping(&self) -> bool {
        matches!(
            self,
            PassStyle::BoardingPass { .. } | PassStyle::EventTicket(_)
        )
    }

    fn transit_type(&self) -> Option<TransitType> {
        match self {
            PassStyle::BoardingPass { transit_type, .. } => *transit_type,
            _ => None,
        }
    }
}

impl Validate for PassStyle {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = self.fields().validation_errors();
        if let PassStyle::BoardingPass {
            transit_type: None, ..
        } = self
        {
            errors.push("Boarding pass transitType is not set".to_string());
        }
        errors
    }
}

/// The style slot of a pass.
///
/// `Conflicting` only arises from [`Pass::attach_style`] or from parsing a
/// `pass.json` with several style keys; validation rejects it.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum StyleSlot {
    #[default]
    Empty,
    Single(PassStyle),
    Conflicting(Vec<PassStyle>),
}

impl StyleSlot {
    /// Every attached style.
    pub fn styles(&self) -> &[PassStyle] {
        match self {
            StyleSlot::Empty => &[],
            StyleSlot::Single(style) => std::slice::from_ref(style),
            StyleSlot::Conflicting(styles) => styles,
        }
    }

    fn from_styles(mut styles: Vec<PassStyle>) -> Self {
        match styles.len() {
            0 => StyleSlot::Empty,
            1 => StyleSlot::Single(styles.remove(0)),
            _ => StyleSlot::Conflicting(styles),
        }
    }
}

#[derive(Serialize)]
struct StyleBodyRef<'a> {
    #[serde(flatten)]
    fields: &'a FieldGroups,
    #[serde(rename = "transitType", skip_serializing_if = "Option::is_none")]
    transit_type: Option<TransitType>,
}

#[derive(Deserialize)]
struct StyleBody {
    #[serde(flatten)]
    fields: FieldGroups,
    #[serde(rename = "transitType", default)]
    transit_type: Option<TransitType>,
}

impl Serialize for StyleSlot {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let styles = self.styles();
        let mut map = serializer.serialize_map(Some(styles.len()))?;
        for style in styles {
            let body = StyleBodyRef {
                fields: style.fields(),
                transit_type: style.transit_type(),
            };
            map.serialize_entry(style.json_key(), &body)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for StyleSlot {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawStyles {
            generic: Option<StyleBody>,
            boarding_pass: Option<StyleBody>,
            coupon: Option<StyleBody>,
            store_card: Option<StyleBody>,
            event_ticket: Option<StyleBody>,
        }

        let raw = RawStyles::deserialize(deserializer)?;
        let mut styles = Vec::new();
        if let Some(body) = raw.generic {
            styles.push(PassStyle::Generic(body.fields));
        }
        if let Some(body) = raw.boarding_pass {
            styles.push(PassStyle::BoardingPass {
                transit_type: body.transit_type,
                fields: body.fields,
            });
        }
        if let Some(body) = raw.coupon {
            styles.push(PassStyle::Coupon(body.fields));
        }
        if let Some(body) = raw.store_card {
            styles.push(PassStyle::StoreCard(body.fields));
        }
        if let Some(body) = raw.event_ticket {
            styles.push(PassStyle::EventTicket(body.fields));
        }
        Ok(StyleSlot::from_styles(styles))
    }
}

/// The pass document written to `pass.json`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pass {
    #[serde(default, skip_serializing_if = "is_zero")]
    pub format_version: u32,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub pass_type_identifier: String,
    #[serde(rename = "webServiceURL", default, skip_serializing_if = "Option::is_none")]
    pub web_service_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authentication_token: Option<String>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub team_identifier: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub organization_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreground_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub grouping_identifier: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub beacons: Vec<Beacon>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_distance: Option<u64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub barcodes: Vec<Barcode>,
    #[serde(flatten)]
    pub style: StyleSlot,
    #[serde(rename = "appLaunchURL", default, skip_serializing_if = "Option::is_none")]
    pub app_launch_url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub associated_store_identifiers: Vec<u64>,
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub user_info: serde_json::Map<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub relevant_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub relevant_dates: Vec<RelevantDate>,
    #[serde(default, skip_serializing_if = "Option::is_none", with = "timestamp::option")]
    pub expiration_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub voided: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nfc: Option<Nfc>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub sharing_prohibited: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub semantics: Option<SemanticTags>,
    #[serde(skip)]
    pub associated_apps: Vec<AssociatedApp>,
}

fn is_zero(value: &u32) -> bool {
    *value == 0
}

impl Pass {
    /// Creates a pass with the required identifiers and format version 1.
    pub fn new(
        serial_number: impl Into<String>,
        pass_type_identifier: impl Into<String>,
        team_identifier: impl Into<String>,
        organization_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            format_version: 1,
            serial_number: serial_number.into(),
            pass_type_identifier: pass_type_identifier.into(),
            team_identifier: team_identifier.into(),
            organization_name: organization_name.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    /// Parses a `pass.json` document.
    pub fn from_json(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }

    /// Serializes the pass as written into the bundle.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Replaces the attached style.
    pub fn set_style(&mut self, style: PassStyle) {
        self.style = StyleSlot::Single(style);
    }

    /// Attaches a style next to any already attached one.
    ///
    /// Attaching a second style makes the pass invalid.
    pub fn attach_style(&mut self, style: PassStyle) {
        let mut styles = self.style.styles().to_vec();
        styles.push(style);
        self.style = StyleSlot::from_styles(styles);
    }

    /// The attached style, if exactly one is set.
    pub fn style(&self) -> Option<&PassStyle> {
        match &self.style {
            StyleSlot::Single(style) => Some(style),
            _ => None,
        }
    }

    /// Mutable access to the attached style, if exactly one is set.
    pub fn style_mut(&mut self) -> Option<&mut PassStyle> {
        match &mut self.style {
            StyleSlot::Single(style) => Some(style),
            _ => None,
        }
    }

    /// Stores the relevance dates and sets `relevantDate` to the earliest start.
    pub fn set_relevant_dates(&mut self, dates: Vec<RelevantDate>) {
        self.relevant_date = dates.iter().filter_map(|date| date.start).min();
        self.relevant_dates = dates;
    }

    pub fn set_foreground_color_hex(&mut self, hex: &str) -> Result<()> {
        self.foreground_color = Some(hex_to_rgb(hex)?);
        Ok(())
    }

    pub fn set_foreground_color_rgb(&mut self, r: u8, g: u8, b: u8) {
        self.foreground_color = Some(rgb(r, g, b));
    }

    pub fn set_background_color_hex(&mut self, hex: &str) -> Result<()> {
        self.background_color = Some(hex_to_rgb(hex)?);
        Ok(())
    }

    pub fn set_background_color_rgb(&mut self, r: u8, g: u8, b: u8) {
        self.background_color = Some(rgb(r, g, b));
    }

    pub fn set_label_color_hex(&mut self, hex: &str) -> Result<()> {
        self.label_color = Some(hex_to_rgb(hex)?);
        Ok(())
    }

    pub fn set_label_color_rgb(&mut self, r: u8, g: u8, b: u8) {
        self.label_color = Some(rgb(r, g, b));
    }
}

fn rgb(r: u8, g: u8, b: u8) -> String {
    format!("rgb({r}, {g}, {b})")
}

/// Converts `#rrggbb` or `#rgb` (leading `#` optional) to `rgb(r, g, b)`.
fn hex_to_rgb(hex: &str) -> Result<String> {
    let invalid = || Error::InvalidColor(hex.to_string());
    let digits = hex.trim().trim_start_matches('#');
    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }

    let expanded: String = match digits.len() {
        3 => digits.chars().flat_map(|c| [c, c]).collect(),
        6 => digits.to_string(),
        _ => return Err(invalid()),
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).map_err(|_| invalid());
    Ok(rgb(channel(0)?, channel(2)?, channel(4)?))
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

impl Validate for Pass {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if is_blank(&self.serial_number)
            || is_blank(&self.pass_type_identifier)
            || is_blank(&self.team_identifier)
            || is_blank(&self.description)
            || is_blank(&self.organization_name)
            || self.format_version == 0
        {
            errors.push(format!(
                "Not all required fields are set. serialNumber: {:?}, passTypeIdentifier: {:?}, teamIdentifier: {:?}, description: {:?}, formatVersion: {}, organizationName: {:?}",
                self.serial_number,
                self.pass_type_identifier,
                self.team_identifier,
                self.description,
                self.format_version,
                self.organization_name
            ));
        }

        match &self.style {
            StyleSlot::Empty => errors.push(
                "No pass style is set. Set one of generic, boardingPass, coupon, storeCard or eventTicket"
                    .to_string(),
            ),
            StyleSlot::Single(style) => errors.extend(style.validation_errors()),
            StyleSlot::Conflicting(styles) => {
                let keys: Vec<_> = styles.iter().map(PassStyle::json_key).collect();
                errors.push(format!(
                    "Only one pass style may be set, found: {}",
                    keys.join(", ")
                ));
                errors.extend(styles.iter().flat_map(|style| style.validation_errors()));
            }
        }

        let has_web_service = self
            .web_service_url
            .as_deref()
            .is_some_and(|url| !url.is_empty());
        let token_len = self
            .authentication_token
            .as_deref()
            .map_or(0, |token| token.chars().count());
        if has_web_service && token_len < MIN_AUTH_TOKEN_LEN {
            errors.push(format!(
                "The authenticationToken needs to be at least {MIN_AUTH_TOKEN_LEN} characters long"
            ));
        }

        let has_launch_url = self
            .app_launch_url
            .as_deref()
            .is_some_and(|url| !url.is_empty());
        if has_launch_url && self.associated_store_identifiers.is_empty() {
            errors.push(
                "The appLaunchURL requires associatedStoreIdentifiers to be specified".to_string(),
            );
        }

        let styles = self.style.styles();
        let has_grouping = self
            .grouping_identifier
            .as_deref()
            .is_some_and(|id| !is_blank(id));
        if has_grouping && !styles.is_empty() && !styles.iter().any(PassStyle::allows_grouping) {
            errors.push(
                "The groupingIdentifier is only allowed for event tickets and boarding passes"
                    .to_string(),
            );
        }

        errors.extend(self.barcodes.iter().flat_map(|b| b.validation_errors()));
        errors.extend(self.beacons.iter().flat_map(|b| b.validation_errors()));
        errors.extend(self.locations.iter().flat_map(|l| l.validation_errors()));
        errors.extend(self.relevant_dates.iter().flat_map(|d| d.validation_errors()));
        errors.extend(self.associated_apps.iter().flat_map(|a| a.validation_errors()));
        if let Some(semantics) = &self.semantics {
            errors.extend(semantics.validation_errors());
        }

        errors
    }
}
