//! Pass fields and their formatting hints.
//!
//! A [`Field`] is one labeled value rendered inside a field group of a pass
//! style. Its [`FieldValue`] is a closed set of the value types Wallet can
//! render; anything else survives as [`FieldValue::Unsupported`] so that
//! validation can report it instead of failing to parse.

use super::{timestamp, Validate};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Placeholder that a change message must contain.
pub const CHANGE_MESSAGE_PLACEHOLDER: &str = "%@";

/// Value of a [`Field`].
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// Plain text.
    Text(String),
    /// Signed integer of any width.
    Integer(i64),
    /// Unsigned integer of any width.
    Unsigned(u64),
    /// 32 or 64 bit float.
    Float(f64),
    /// Point in time, rendered with the field's date and time styles.
    Date(DateTime<Utc>),
    /// Any other JSON value. Always a validation error.
    Unsupported(serde_json::Value),
}

impl FieldValue {
    /// Returns `true` for the integer and float variants.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            FieldValue::Integer(_) | FieldValue::Unsigned(_) | FieldValue::Float(_)
        )
    }
}

impl Serialize for FieldValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Text(text) => serializer.serialize_str(text),
            FieldValue::Integer(n) => serializer.serialize_i64(*n),
            FieldValue::Unsigned(n) => serializer.serialize_u64(*n),
            FieldValue::Float(n) => serializer.serialize_f64(*n),
            FieldValue::Date(date) => timestamp::serialize(date, serializer),
            FieldValue::Unsupported(value) => value.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for FieldValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        use serde_json::Value;

        Ok(match Value::deserialize(deserializer)? {
            Value::String(text) => FieldValue::Text(text),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    FieldValue::Integer(i)
                } else if let Some(u) = n.as_u64() {
                    FieldValue::Unsigned(u)
                } else {
                    FieldValue::Float(n.as_f64().unwrap_or_default())
                }
            }
            other => FieldValue::Unsupported(other),
        })
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(value: DateTime<Utc>) -> Self {
        FieldValue::Date(value)
    }
}

impl From<f32> for FieldValue {
    fn from(value: f32) -> Self {
        FieldValue::Float(f64::from(value))
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Float(value)
    }
}

macro_rules! impl_from_integer {
    ($variant:ident => $target:ty: $($source:ty),+) => {
        $(
            impl From<$source> for FieldValue {
                fn from(value: $source) -> Self {
                    FieldValue::$variant(<$target>::from(value))
                }
            }
        )+
    };
}

impl_from_integer!(Integer => i64: i8, i16, i32, i64);
impl_from_integer!(Unsigned => u64: u8, u16, u32, u64);

/// `PKTextAlignment` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextAlignment {
    #[serde(rename = "PKTextAlignmentLeft")]
    Left,
    #[serde(rename = "PKTextAlignmentCenter")]
    Center,
    #[serde(rename = "PKTextAlignmentRight")]
    Right,
    #[serde(rename = "PKTextAlignmentNatural")]
    Natural,
}

/// `PKDataDetectorType` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataDetectorType {
    #[serde(rename = "PKDataDetectorTypePhoneNumber")]
    PhoneNumber,
    #[serde(rename = "PKDataDetectorTypeLink")]
    Link,
    #[serde(rename = "PKDataDetectorTypeAddress")]
    Address,
    #[serde(rename = "PKDataDetectorTypeCalendarEvent")]
    CalendarEvent,
}

/// `PKDateStyle` values, used for both date and time styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DateStyle {
    #[serde(rename = "PKDateStyleNone")]
    None,
    #[serde(rename = "PKDateStyleShort")]
    Short,
    #[serde(rename = "PKDateStyleMedium")]
    Medium,
    #[serde(rename = "PKDateStyleLong")]
    Long,
    #[serde(rename = "PKDateStyleFull")]
    Full,
}

/// `PKNumberStyle` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NumberStyle {
    #[serde(rename = "PKNumberStyleDecimal")]
    Decimal,
    #[serde(rename = "PKNumberStylePercent")]
    Percent,
    #[serde(rename = "PKNumberStyleScientific")]
    Scientific,
    #[serde(rename = "PKNumberStyleSpellOut")]
    SpellOut,
}

/// A labeled, typed and formatted value on the front or back of a pass.
///
/// Keys are expected to be unique within a pass; this is left to the caller.
///
/// # Examples
///
/// ```
/// use passkit::pass::{Field, Validate};
///
/// let mut field = Field::new("balance", 43_000);
/// field.currency_code = Some("COP".into());
/// assert!(field.is_valid());
///
/// field.value = Some("forty-three thousand".into());
/// assert!(!field.is_valid());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributed_value: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub change_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_alignment: Option<TextAlignment>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub data_detector_types: Vec<DataDetectorType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_style: Option<NumberStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_style: Option<DateStyle>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_style: Option<DateStyle>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub is_relative: bool,
    #[serde(
        rename = "ignoresTimeZone",
        default,
        skip_serializing_if = "std::ops::Not::not"
    )]
    pub ignores_time_zone: bool,
}

impl Field {
    /// Creates a field with a key and a value.
    pub fn new(key: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
            ..Self::default()
        }
    }

    /// Sets the label shown above the value.
    #[must_use]
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    fn has_currency(&self) -> bool {
        self.currency_code
            .as_deref()
            .is_some_and(|code| !code.trim().is_empty())
    }
}

impl Validate for Field {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.key.is_empty() || self.value.is_none() {
            errors.push(format!(
                "Not all required fields are set. key: {:?}, value: {:?}",
                self.key, self.value
            ));
        }

        if let Some(FieldValue::Unsupported(value)) = &self.value {
            errors.push(format!(
                "Invalid value type {value}. Allowed: string, integer, float, date"
            ));
        }

        // JSON has no NaN or infinity; serde_json would write null.
        if let Some(FieldValue::Float(n)) = &self.value {
            if !n.is_finite() {
                errors.push(format!("Invalid value type {n}. Floats must be finite"));
            }
        }

        let has_currency = self.has_currency();
        let has_number_format = has_currency || self.number_style.is_some();
        let has_date_format = self.date_style.is_some() || self.time_style.is_some();

        if has_currency && self.number_style.is_some() {
            errors.push("currencyCode and numberStyle are both set".to_string());
        }

        if has_number_format && has_date_format {
            errors.push("A field can't be number/currency and date at the same time".to_string());
        }

        if let Some(message) = &self.change_message {
            if !message.trim().is_empty() && !message.contains(CHANGE_MESSAGE_PLACEHOLDER) {
                errors.push(format!(
                    "changeMessage needs to contain the {CHANGE_MESSAGE_PLACEHOLDER} placeholder"
                ));
            }
        }

        if has_currency && !self.value.as_ref().is_some_and(FieldValue::is_numeric) {
            errors.push("When using currencies, the value has to be a number".to_string());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn basic_field() -> Field {
        Field::new("key", "value").label("label")
    }

    #[test]
    fn test_basic_field_is_valid() {
        let field = basic_field();
        assert!(field.is_valid(), "{:?}", field.validation_errors());
    }

    #[test]
    fn test_all_supported_value_types() {
        let values: Vec<FieldValue> = vec![
            "text".into(),
            1i8.into(),
            1i16.into(),
            1i32.into(),
            1i64.into(),
            1u8.into(),
            1u16.into(),
            1u32.into(),
            1u64.into(),
            1.5f32.into(),
            1.5f64.into(),
            Utc::now().into(),
        ];

        for value in values {
            let mut field = basic_field();
            field.value = Some(value.clone());
            assert!(field.is_valid(), "{value:?} should be accepted");
        }
    }

    #[test]
    fn test_unsupported_value_type() {
        let mut field = basic_field();
        field.value = Some(FieldValue::Unsupported(serde_json::json!(true)));

        assert_eq!(field.validation_errors().len(), 1);
    }

    #[test]
    fn test_non_finite_floats_are_rejected() {
        for n in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let field = Field::new("key", n);
            assert_eq!(field.validation_errors().len(), 1, "{n} should be rejected");
        }
    }

    #[test]
    fn test_missing_key_or_value() {
        let mut field = basic_field();
        field.key.clear();
        assert_eq!(field.validation_errors().len(), 1);

        let mut field = basic_field();
        field.value = None;
        assert_eq!(field.validation_errors().len(), 1);
    }

    #[test]
    fn test_currency_requires_numeric_value() {
        let mut field = basic_field();
        field.currency_code = Some("COP".into());
        assert!(!field.is_valid());
        assert_eq!(field.validation_errors().len(), 1);

        for value in [FieldValue::from(43_000), 43_000u16.into(), 43.5f32.into()] {
            field.value = Some(value);
            assert!(field.is_valid(), "{:?}", field.validation_errors());
        }
    }

    #[test]
    fn test_blank_currency_code_is_ignored() {
        let mut field = basic_field();
        field.currency_code = Some("   ".into());
        assert!(field.is_valid());
    }

    #[test]
    fn test_currency_and_number_style() {
        let mut field = Field::new("price", 10);
        field.currency_code = Some("EUR".into());
        field.number_style = Some(NumberStyle::Decimal);

        assert_eq!(field.validation_errors().len(), 1);
    }

    #[test]
    fn test_number_and_date_style() {
        let mut field = Field::new("price", 10);
        field.number_style = Some(NumberStyle::Percent);
        field.time_style = Some(DateStyle::Short);

        assert_eq!(field.validation_errors().len(), 1);

        field.number_style = None;
        field.currency_code = Some("USD".into());
        field.time_style = None;
        field.date_style = Some(DateStyle::Long);
        assert_eq!(field.validation_errors().len(), 1);
    }

    #[test]
    fn test_change_message_placeholder() {
        let mut field = basic_field();
        field.change_message = Some("Gate changed".into());
        assert_eq!(field.validation_errors().len(), 1);

        field.change_message = Some("Gate changed to %@".into());
        assert!(field.is_valid());

        field.change_message = Some("  ".into());
        assert!(field.is_valid());
    }

    #[test]
    fn test_field_json_uses_wallet_keys() {
        let mut field = Field::new("departs", Utc.with_ymd_and_hms(2025, 6, 19, 1, 23, 45).unwrap());
        field.date_style = Some(DateStyle::Short);
        field.ignores_time_zone = true;

        let json = serde_json::to_value(&field).unwrap();
        assert_eq!(json["key"], "departs");
        assert_eq!(json["value"], "2025-06-19T01:23:45Z");
        assert_eq!(json["dateStyle"], "PKDateStyleShort");
        assert_eq!(json["ignoresTimeZone"], true);
        assert!(json.get("isRelative").is_none());
        assert!(json.get("label").is_none());
    }

    #[test]
    fn test_value_parsing() {
        let field: Field =
            serde_json::from_str(r#"{"key":"k","value":-3,"attributedValue":[1]}"#).unwrap();
        assert_eq!(field.value, Some(FieldValue::Integer(-3)));
        assert!(matches!(field.attributed_value, Some(FieldValue::Unsupported(_))));

        let field: Field = serde_json::from_str(r#"{"key":"k","value":2.25}"#).unwrap();
        assert_eq!(field.value, Some(FieldValue::Float(2.25)));

        let field: Field = serde_json::from_str(r#"{"key":"k","value":{"a":1}}"#).unwrap();
        assert!(!field.is_valid());
    }
}
