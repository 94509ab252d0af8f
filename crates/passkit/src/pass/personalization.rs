//! Personalization document shipped as `personalization.json` for
//! rewards-enrollment passes.

use super::Validate;
use serde::{Deserialize, Serialize};

/// `PKPassPersonalizationField` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PersonalizationField {
    #[serde(rename = "PKPassPersonalizationFieldName")]
    Name,
    #[serde(rename = "PKPassPersonalizationFieldPostalCode")]
    PostalCode,
    #[serde(rename = "PKPassPersonalizationFieldEmailAddress")]
    EmailAddress,
    #[serde(rename = "PKPassPersonalizationFieldPhoneNumber")]
    PhoneNumber,
}

/// Information the user is asked for when adding a personalizable pass.
///
/// Every member is always serialized.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Personalization {
    #[serde(default)]
    pub required_personalization_fields: Vec<PersonalizationField>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub terms_and_conditions: String,
}

impl Personalization {
    pub fn new(
        description: impl Into<String>,
        required_personalization_fields: Vec<PersonalizationField>,
    ) -> Self {
        Self {
            required_personalization_fields,
            description: description.into(),
            terms_and_conditions: String::new(),
        }
    }

    /// Serializes the document as written into the bundle.
    pub fn to_json(&self) -> crate::Result<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }
}

impl Validate for Personalization {
    fn validation_errors(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.required_personalization_fields.is_empty() {
            errors.push("At least one requiredPersonalizationField must be provided".to_string());
        }

        if self.description.trim().is_empty() {
            errors.push("A personalization description must be provided".to_string());
        }

        errors
    }
}
