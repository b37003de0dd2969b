//! Field-scoped patient search.
//!
//! Matching is case-insensitive substring containment over the fields
//! selected by a [`SearchScope`]. An empty query matches every record.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::patient::PatientRecord;

/// Which fields a search query is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SearchScope {
    /// First name, last name, national id, or insurance provider.
    #[default]
    All,
    /// National id only.
    NationalId,
    /// Last name only.
    LastName,
    /// Insurance provider only.
    InsuranceProvider,
}

impl SearchScope {
    /// Every scope, in menu order.
    pub const ALL: [Self; 4] = [
        Self::All,
        Self::NationalId,
        Self::LastName,
        Self::InsuranceProvider,
    ];

    /// The record fields this scope reads.
    fn fields(self, record: &PatientRecord) -> Vec<&str> {
        let f = &record.fields;
        match self {
            Self::All => vec![
                f.first_name.as_str(),
                f.last_name.as_str(),
                f.national_id.as_str(),
                f.insurance_provider.as_str(),
            ],
            Self::NationalId => vec![f.national_id.as_str()],
            Self::LastName => vec![f.last_name.as_str()],
            Self::InsuranceProvider => vec![f.insurance_provider.as_str()],
        }
    }
}

impl fmt::Display for SearchScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::NationalId => write!(f, "nationalId"),
            Self::LastName => write!(f, "lastName"),
            Self::InsuranceProvider => write!(f, "insuranceProvider"),
        }
    }
}

/// Error returned when parsing an unknown scope name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownScope(pub String);

impl fmt::Display for UnknownScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown search scope: {}", self.0)
    }
}

impl std::error::Error for UnknownScope {}

impl FromStr for SearchScope {
    type Err = UnknownScope;

    /// Accepts the serialized names, kebab/snake case spellings, and the
    /// legacy field names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .collect::<String>()
            .to_lowercase();
        match normalized.as_str() {
            "all" => Ok(Self::All),
            "nationalid" | "dni" => Ok(Self::NationalId),
            "lastname" | "apellido" => Ok(Self::LastName),
            "insuranceprovider" | "insurance" | "obrasocial" => Ok(Self::InsuranceProvider),
            _ => Err(UnknownScope(s.to_string())),
        }
    }
}

/// A compiled search: lowercased query plus scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    needle: String,
    scope: SearchScope,
}

impl SearchQuery {
    /// Prepare a query for matching.
    #[must_use]
    pub fn new(query: &str, scope: SearchScope) -> Self {
        Self {
            needle: query.to_lowercase(),
            scope,
        }
    }

    /// The scope this query applies to.
    #[must_use]
    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    /// True when the query is empty and therefore matches everything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.needle.is_empty()
    }

    /// Check whether a record matches.
    #[must_use]
    pub fn matches(&self, record: &PatientRecord) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        self.scope
            .fields(record)
            .into_iter()
            .any(|value| value.to_lowercase().contains(&self.needle))
    }

    /// Collect the matching records, preserving input order.
    #[must_use]
    pub fn apply<'a, I>(&self, records: I) -> Vec<PatientRecord>
    where
        I: IntoIterator<Item = &'a PatientRecord>,
    {
        records
            .into_iter()
            .filter(|record| self.matches(record))
            .cloned()
            .collect()
    }
}
