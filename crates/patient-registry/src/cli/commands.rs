//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::patient::{PatientFields, PatientId};
use crate::search::SearchScope;

/// Register a new patient.
#[derive(Debug, Args)]
pub struct AddCommand {
    /// Given name
    #[arg(short, long)]
    pub first_name: String,

    /// Family name
    #[arg(short, long)]
    pub last_name: String,

    /// National identity number (DNI)
    #[arg(short, long)]
    pub national_id: String,

    /// Age
    #[arg(short, long)]
    pub age: Option<String>,

    /// Insurance provider
    #[arg(short, long)]
    pub insurance: Option<String>,

    /// Free-text notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Print the stored record as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl AddCommand {
    /// The fields to register.
    #[must_use]
    pub fn fields(&self) -> PatientFields {
        PatientFields {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            national_id: self.national_id.clone(),
            age: self.age.clone().unwrap_or_default(),
            insurance_provider: self.insurance.clone().unwrap_or_default(),
            notes: self.notes.clone().unwrap_or_default(),
        }
    }
}

/// Edit an existing patient. Flags left out keep their stored value.
#[derive(Debug, Args)]
pub struct EditCommand {
    /// Patient id
    pub id: PatientId,

    /// Given name
    #[arg(short, long)]
    pub first_name: Option<String>,

    /// Family name
    #[arg(short, long)]
    pub last_name: Option<String>,

    /// National identity number (DNI)
    #[arg(short, long)]
    pub national_id: Option<String>,

    /// Age (pass "" to clear)
    #[arg(short, long)]
    pub age: Option<String>,

    /// Insurance provider (pass "" to clear)
    #[arg(short, long)]
    pub insurance: Option<String>,

    /// Free-text notes (pass "" to clear)
    #[arg(long)]
    pub notes: Option<String>,

    /// Print the updated record as JSON
    #[arg(short, long)]
    pub json: bool,
}

impl EditCommand {
    /// Overlay the given flags on `current`.
    #[must_use]
    pub fn apply(&self, current: &PatientFields) -> PatientFields {
        fn pick(flag: Option<&String>, stored: &str) -> String {
            flag.map_or_else(|| stored.to_string(), Clone::clone)
        }

        PatientFields {
            first_name: pick(self.first_name.as_ref(), &current.first_name),
            last_name: pick(self.last_name.as_ref(), &current.last_name),
            national_id: pick(self.national_id.as_ref(), &current.national_id),
            age: pick(self.age.as_ref(), &current.age),
            insurance_provider: pick(self.insurance.as_ref(), &current.insurance_provider),
            notes: pick(self.notes.as_ref(), &current.notes),
        }
    }

    /// True when no field flag was given.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.first_name.is_none()
            && self.last_name.is_none()
            && self.national_id.is_none()
            && self.age.is_none()
            && self.insurance.is_none()
            && self.notes.is_none()
    }
}

/// Delete a patient.
#[derive(Debug, Args)]
pub struct DeleteCommand {
    /// Patient id
    pub id: PatientId,

    /// Confirm the deletion
    #[arg(short, long)]
    pub yes: bool,
}

/// List all patients.
#[derive(Debug, Args)]
pub struct ListCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Search command arguments.
#[derive(Debug, Args)]
pub struct SearchCommand {
    /// Text to look for (case-insensitive)
    pub query: String,

    /// Fields to search; defaults to the configured scope
    #[arg(short, long, value_enum)]
    pub scope: Option<ScopeArg>,

    /// Show details of this patient if it is among the results
    #[arg(long, value_name = "ID")]
    pub select: Option<PatientId>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Show one patient.
#[derive(Debug, Args)]
pub struct ShowCommand {
    /// Patient id
    pub id: PatientId,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Search scope argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScopeArg {
    /// First name, last name, national id, and insurance provider
    All,
    /// National id only
    NationalId,
    /// Last name only
    LastName,
    /// Insurance provider only
    InsuranceProvider,
}

impl From<ScopeArg> for SearchScope {
    fn from(arg: ScopeArg) -> Self {
        match arg {
            ScopeArg::All => Self::All,
            ScopeArg::NationalId => Self::NationalId,
            ScopeArg::LastName => Self::LastName,
            ScopeArg::InsuranceProvider => Self::InsuranceProvider,
        }
    }
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn edit(id: i64) -> EditCommand {
        EditCommand {
            id: PatientId::new(id),
            first_name: None,
            last_name: None,
            national_id: None,
            age: None,
            insurance: None,
            notes: None,
            json: false,
        }
    }

    #[test]
    fn test_scope_arg_conversion() {
        assert_eq!(SearchScope::from(ScopeArg::All), SearchScope::All);
        assert_eq!(
            SearchScope::from(ScopeArg::NationalId),
            SearchScope::NationalId
        );
        assert_eq!(SearchScope::from(ScopeArg::LastName), SearchScope::LastName);
        assert_eq!(
            SearchScope::from(ScopeArg::InsuranceProvider),
            SearchScope::InsuranceProvider
        );
    }

    #[test]
    fn test_output_format_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Plain);
    }

    #[test]
    fn test_add_fields_defaults_optional_to_empty() {
        let cmd = AddCommand {
            first_name: "Ana".to_string(),
            last_name: "Diaz".to_string(),
            national_id: "1234".to_string(),
            age: None,
            insurance: Some("OSDE".to_string()),
            notes: None,
            json: false,
        };
        let fields = cmd.fields();

        assert_eq!(fields.first_name, "Ana");
        assert_eq!(fields.age, "");
        assert_eq!(fields.insurance_provider, "OSDE");
        assert_eq!(fields.notes, "");
    }

    #[test]
    fn test_edit_apply_overrides_only_given_flags() {
        let current = PatientFields::new("Ana", "Diaz", "1234")
            .with_age("34")
            .with_notes("allergic");
        let mut cmd = edit(1);
        cmd.last_name = Some("Diaz Lopez".to_string());
        cmd.notes = Some(String::new());

        let updated = cmd.apply(&current);

        assert_eq!(updated.first_name, "Ana");
        assert_eq!(updated.last_name, "Diaz Lopez");
        assert_eq!(updated.age, "34");
        assert_eq!(updated.notes, "");
        assert!(!cmd.is_noop());
    }

    #[test]
    fn test_edit_without_flags_is_noop() {
        let cmd = edit(1);
        let current = PatientFields::new("Ana", "Diaz", "1234");

        assert!(cmd.is_noop());
        assert_eq!(cmd.apply(&current), current);
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_scope_arg_names() {
        let names: Vec<String> = ScopeArg::value_variants()
            .iter()
            .filter_map(|v| v.to_possible_value())
            .map(|v| v.get_name().to_string())
            .collect();
        assert_eq!(
            names,
            vec!["all", "national-id", "last-name", "insurance-provider"]
        );
    }
}
