//! Patient record types.
//!
//! A [`PatientRecord`] is what the registry stores; [`PatientFields`] is the
//! editable part of it, supplied by callers on create and update. The serde
//! layout matches the durable slot format: camelCase field names, optional
//! text stored as empty strings, and the older Spanish field names accepted
//! on read.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Identifier of a patient record.
///
/// Ids are assigned by the registry on create and never change. Stored ids
/// may be JSON numbers or numeric strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PatientId(i64);

impl<'de> Deserialize<'de> for PatientId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Integer(i64),
            Text(String),
        }

        match RawId::deserialize(deserializer)? {
            RawId::Integer(value) => Ok(Self(value)),
            RawId::Text(text) => text.parse().map_err(|_| {
                serde::de::Error::custom(format!("patient id is not a number: {text:?}"))
            }),
        }
    }
}

impl PatientId {
    /// Wrap a raw id value.
    #[must_use]
    pub const fn new(value: i64) -> Self {
        Self(value)
    }

    /// The raw id value.
    #[must_use]
    pub const fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PatientId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// The caller-editable fields of a patient.
///
/// Everything except `id` and `registered_on`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientFields {
    /// Given name. Required.
    #[serde(alias = "nombre")]
    pub first_name: String,
    /// Family name. Required.
    #[serde(alias = "apellido")]
    pub last_name: String,
    /// National identity document number. Required, not unique.
    #[serde(alias = "dni")]
    pub national_id: String,
    /// Age as entered; empty when unknown.
    #[serde(default, alias = "edad", deserialize_with = "text_or_number")]
    pub age: String,
    /// Health insurance provider; empty when none.
    #[serde(default, alias = "obraSocial")]
    pub insurance_provider: String,
    /// Free-form, possibly multi-line notes.
    #[serde(default, alias = "detalles")]
    pub notes: String,
}

impl PatientFields {
    /// Create fields with the three required values and no optional ones.
    #[must_use]
    pub fn new(
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        national_id: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            national_id: national_id.into(),
            ..Self::default()
        }
    }

    /// Set the age.
    #[must_use]
    pub fn with_age(mut self, age: impl Into<String>) -> Self {
        self.age = age.into();
        self
    }

    /// Set the insurance provider.
    #[must_use]
    pub fn with_insurance_provider(mut self, provider: impl Into<String>) -> Self {
        self.insurance_provider = provider.into();
        self
    }

    /// Set the notes.
    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = notes.into();
        self
    }

    /// Check that the required fields are present.
    ///
    /// A value made only of whitespace counts as empty.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] naming the first empty required field.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("nationalId", &self.national_id),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(Error::missing_field(name));
            }
        }
        Ok(())
    }
}

/// A stored patient record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    /// Unique, immutable identifier.
    pub id: PatientId,
    /// Editable fields, flattened into the record's JSON object.
    #[serde(flatten)]
    pub fields: PatientFields,
    /// Registration date label, stamped once on create.
    #[serde(alias = "fechaRegistro")]
    pub registered_on: String,
}

impl PatientRecord {
    /// Build a record from its parts.
    #[must_use]
    pub fn new(id: PatientId, fields: PatientFields, registered_on: impl Into<String>) -> Self {
        Self {
            id,
            fields,
            registered_on: registered_on.into(),
        }
    }

    /// `"Last, First"`, as shown in result lists.
    #[must_use]
    pub fn display_name(&self) -> String {
        format!("{}, {}", self.fields.last_name, self.fields.first_name)
    }

    /// `"First Last"`, as shown in the detail view.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.fields.first_name, self.fields.last_name)
    }

    /// The age, if one was entered.
    #[must_use]
    pub fn age(&self) -> Option<&str> {
        non_empty(&self.fields.age)
    }

    /// The insurance provider, if one was entered.
    #[must_use]
    pub fn insurance_provider(&self) -> Option<&str> {
        non_empty(&self.fields.insurance_provider)
    }

    /// The notes, if any were entered.
    #[must_use]
    pub fn notes(&self) -> Option<&str> {
        non_empty(&self.fields.notes)
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Accept a JSON string, number, or null and keep it as text.
fn text_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum TextOrNumber {
        Text(String),
        Integer(i64),
        Float(f64),
        Null,
    }

    Ok(match TextOrNumber::deserialize(deserializer)? {
        TextOrNumber::Text(s) => s,
        TextOrNumber::Integer(n) => n.to_string(),
        TextOrNumber::Float(n) => n.to_string(),
        TextOrNumber::Null => String::new(),
    })
}
