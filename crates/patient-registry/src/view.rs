//! Search view over a registry.
//!
//! [`SearchView`] is presentation state: the current query, scope, and
//! selected patient. The registry itself knows nothing about it.

use std::fmt;

use crate::patient::{PatientId, PatientRecord};
use crate::registry::Registry;
use crate::search::SearchScope;
use crate::storage::SlotStore;

/// What a result list should say about itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Summary {
    /// The registry holds no patients.
    NoPatients,
    /// Patients exist but none match the query.
    NoMatches {
        /// The query that matched nothing.
        query: String,
    },
    /// Some patients are shown.
    Showing {
        /// Number of matching patients.
        shown: usize,
        /// Number of patients in the registry.
        total: usize,
    },
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoPatients => write!(f, "No patients registered yet"),
            Self::NoMatches { query } => write!(f, "No patients match \"{query}\""),
            Self::Showing { shown, total } if shown == total => {
                write!(f, "Registered patients ({total})")
            }
            Self::Showing { shown, total } => write!(f, "Showing {shown} of {total} patients"),
        }
    }
}

/// Query, scope, and selection for browsing a registry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchView {
    query: String,
    scope: SearchScope,
    selected: Option<PatientId>,
}

impl SearchView {
    /// An empty view: no query, default scope, nothing selected.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with the given scope.
    #[must_use]
    pub fn with_scope(mut self, scope: SearchScope) -> Self {
        self.scope = scope;
        self
    }

    /// Start with the given query.
    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    /// The raw query text.
    #[must_use]
    pub fn query(&self) -> &str {
        &self.query
    }

    /// The active scope.
    #[must_use]
    pub fn scope(&self) -> SearchScope {
        self.scope
    }

    /// The selected patient id, if any.
    #[must_use]
    pub fn selected(&self) -> Option<PatientId> {
        self.selected
    }

    /// Replace the query text.
    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Replace the scope.
    pub fn set_scope(&mut self, scope: SearchScope) {
        self.scope = scope;
    }

    /// Drop the selection.
    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// The filtered records.
    ///
    /// Clears the selection if it is no longer among them.
    pub fn results<S: SlotStore>(&mut self, registry: &Registry<S>) -> Vec<PatientRecord> {
        let results = registry.filter(&self.query, self.scope);
        if let Some(id) = self.selected {
            if !results.iter().any(|record| record.id == id) {
                self.selected = None;
            }
        }
        results
    }

    /// Select a patient from the current results.
    ///
    /// Returns `false`, leaving the selection unchanged, when `id` is not in
    /// the results.
    pub fn select<S: SlotStore>(&mut self, id: PatientId, registry: &Registry<S>) -> bool {
        let visible = registry
            .filter(&self.query, self.scope)
            .iter()
            .any(|record| record.id == id);
        if visible {
            self.selected = Some(id);
        }
        visible
    }

    /// The selected record, if it still exists.
    #[must_use]
    pub fn selected_record<'r, S: SlotStore>(
        &self,
        registry: &'r Registry<S>,
    ) -> Option<&'r PatientRecord> {
        self.selected.and_then(|id| registry.get(id))
    }

    /// Describe the current results.
    #[must_use]
    pub fn summary<S: SlotStore>(&self, registry: &Registry<S>) -> Summary {
        if registry.is_empty() {
            return Summary::NoPatients;
        }
        let shown = registry.filter(&self.query, self.scope).len();
        if shown == 0 {
            Summary::NoMatches {
                query: self.query.clone(),
            }
        } else {
            Summary::Showing {
                shown,
                total: registry.len(),
            }
        }
    }
}
