//! The patient record store.
//!
//! [`Registry`] owns the in-memory patient collection and mirrors it to one
//! slot of a [`SlotStore`]. The slot is read once, in [`Registry::load`], and
//! rewritten in full after every create, update, and delete. A failed write
//! is logged and recorded in [`Registry::sync_state`]; the in-memory change
//! stays in place.

use std::fmt::Write as _;

use chrono::{Local, Utc};
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::config::{Config, DEFAULT_SLOT_KEY};
use crate::error::{Error, Result};
use crate::patient::{PatientFields, PatientId, PatientRecord};
use crate::search::{SearchQuery, SearchScope};
use crate::storage::SlotStore;

/// Fallback label format if the configured one cannot be rendered.
const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";

/// Settings a registry needs from configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryOptions {
    /// Slot holding the serialized collection.
    pub slot_key: String,
    /// `chrono` format for `registeredOn` labels.
    pub date_format: String,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            date_format: "%-m/%-d/%Y".to_string(),
        }
    }
}

impl From<&Config> for RegistryOptions {
    fn from(config: &Config) -> Self {
        Self {
            slot_key: config.storage.slot_key.clone(),
            date_format: config.registry.date_format.clone(),
        }
    }
}

/// Outcome of the most recent write to the durable slot.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SyncState {
    /// The slot matches memory, or nothing has been written this session.
    #[default]
    Synced,
    /// The last write failed; memory is ahead of the slot.
    Failed {
        /// Why the write failed.
        message: String,
    },
}

impl SyncState {
    /// True if the last write succeeded.
    #[must_use]
    pub fn is_synced(&self) -> bool {
        matches!(self, Self::Synced)
    }
}

/// The patient record store.
#[derive(Debug)]
pub struct Registry<S: SlotStore> {
    store: S,
    options: RegistryOptions,
    records: Vec<PatientRecord>,
    sync: SyncState,
}

impl<S: SlotStore> Registry<S> {
    /// Load the registry from the configured slot.
    ///
    /// Never fails: a missing slot, a read error, or a value that is not a
    /// JSON array all yield an empty registry. Within the array, each entry
    /// is read on its own; entries that are not valid patients are dropped
    /// and the rest are kept. Entries whose id is not a number get a fresh
    /// id.
    pub fn load(store: S, options: RegistryOptions) -> Self {
        let records = match store.read(&options.slot_key) {
            Ok(Some(raw)) => parse_slot(&raw, &options.slot_key),
            Ok(None) => {
                debug!("No saved patients in slot '{}'", options.slot_key);
                Vec::new()
            }
            Err(err) => {
                warn!(
                    "Could not read slot '{}', starting empty: {}",
                    options.slot_key, err
                );
                Vec::new()
            }
        };

        Self {
            store,
            options,
            records,
            sync: SyncState::Synced,
        }
    }

    /// Register a new patient.
    ///
    /// Assigns a fresh id and today's date label, appends the record, and
    /// persists.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if first name, last name, or national
    /// id is empty. Nothing is stored in that case. A failed write is not an
    /// error here; see [`Registry::sync_state`].
    pub fn create(&mut self, fields: PatientFields) -> Result<PatientRecord> {
        fields.validate()?;

        let record = PatientRecord::new(self.next_id()?, fields, self.today_label());
        self.records.push(record.clone());
        info!("Registered patient {}", record.id);

        self.sync();
        Ok(record)
    }

    /// Replace the editable fields of an existing patient.
    ///
    /// `id` and `registeredOn` are kept. Returns `Ok(None)` without touching
    /// storage when no patient has that id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingField`] if a required field is empty.
    pub fn update(&mut self, id: PatientId, fields: PatientFields) -> Result<Option<PatientRecord>> {
        fields.validate()?;

        let Some(record) = self.records.iter_mut().find(|record| record.id == id) else {
            debug!("Update ignored, no patient {}", id);
            return Ok(None);
        };
        record.fields = fields;
        let updated = record.clone();
        info!("Updated patient {}", id);

        self.sync();
        Ok(Some(updated))
    }

    /// Remove a patient, returning the removed record.
    ///
    /// Returns `None` without touching storage when no patient has that id.
    pub fn delete(&mut self, id: PatientId) -> Option<PatientRecord> {
        let Some(index) = self.records.iter().position(|record| record.id == id) else {
            debug!("Delete ignored, no patient {}", id);
            return None;
        };
        let removed = self.records.remove(index);
        info!("Deleted patient {}", id);

        self.sync();
        Some(removed)
    }

    /// All patients in registration order.
    #[must_use]
    pub fn list(&self) -> &[PatientRecord] {
        &self.records
    }

    /// Look up a patient by id.
    #[must_use]
    pub fn get(&self, id: PatientId) -> Option<&PatientRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    /// Patients matching `query` within `scope`, in registration order.
    ///
    /// Case-insensitive substring match; an empty query returns everyone.
    #[must_use]
    pub fn filter(&self, query: &str, scope: SearchScope) -> Vec<PatientRecord> {
        SearchQuery::new(query, scope).apply(&self.records)
    }

    /// Number of patients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when no patients are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Write the whole collection to the slot.
    ///
    /// Called automatically after every mutation.
    ///
    /// # Errors
    ///
    /// Returns the serialization or storage error. The failure is also
    /// recorded in [`Registry::sync_state`].
    pub fn persist(&mut self) -> Result<()> {
        let result = serde_json::to_string(&self.records)
            .map_err(Error::from)
            .and_then(|json| self.store.write(&self.options.slot_key, &json));

        match result {
            Ok(()) => {
                debug!(
                    "Persisted {} patients to slot '{}'",
                    self.records.len(),
                    self.options.slot_key
                );
                self.sync = SyncState::Synced;
                Ok(())
            }
            Err(err) => {
                self.sync = SyncState::Failed {
                    message: err.to_string(),
                };
                Err(err)
            }
        }
    }

    /// Outcome of the last write.
    #[must_use]
    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    /// The slot this registry reads and writes.
    #[must_use]
    pub fn slot_key(&self) -> &str {
        &self.options.slot_key
    }

    /// Borrow the underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Mutably borrow the underlying store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Give back the underlying store.
    #[must_use]
    pub fn into_store(self) -> S {
        self.store
    }

    fn sync(&mut self) {
        if let Err(err) = self.persist() {
            error!(
                "Failed to save patients to slot '{}': {}",
                self.options.slot_key, err
            );
        }
    }

    /// Current time in milliseconds, bumped past the largest existing id.
    fn next_id(&self) -> Result<PatientId> {
        let now = Utc::now().timestamp_millis();
        match self.records.iter().map(|record| record.id.get()).max() {
            Some(max) if max >= now => max
                .checked_add(1)
                .map(PatientId::new)
                .ok_or_else(|| Error::internal("patient id space exhausted")),
            _ => Ok(PatientId::new(now)),
        }
    }

    fn today_label(&self) -> String {
        let today = Local::now();
        let mut label = String::new();
        if write!(label, "{}", today.format(&self.options.date_format)).is_err() {
            label = today.format(FALLBACK_DATE_FORMAT).to_string();
        }
        label
    }
}

/// Read the stored collection entry by entry.
fn parse_slot(raw: &str, slot_key: &str) -> Vec<PatientRecord> {
    let entries: Vec<Value> = match serde_json::from_str(raw) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(
                "Slot '{}' is not a patient list, starting empty: {}",
                slot_key, err
            );
            return Vec::new();
        }
    };

    let total = entries.len();
    let mut records = Vec::with_capacity(total);
    let mut needs_id = Vec::new();

    for (index, mut entry) in entries.into_iter().enumerate() {
        let text_id = take_text_id(&mut entry);
        let record = match serde_json::from_value::<PatientRecord>(entry) {
            Ok(record) => record,
            Err(err) => {
                warn!("Dropping stored entry {}: {}", index, err);
                continue;
            }
        };
        if let Err(err) = record.fields.validate() {
            warn!("Dropping stored entry {}: {}", index, err);
            continue;
        }
        if let Some(old_id) = text_id {
            warn!("Stored entry {} has id {:?}, assigning a new one", index, old_id);
            needs_id.push(records.len());
        }
        records.push(record);
    }

    let mut next = records
        .iter()
        .enumerate()
        .filter(|(position, _)| !needs_id.contains(position))
        .map(|(_, record)| record.id.get())
        .max()
        .unwrap_or(0);
    for position in needs_id {
        next = next.saturating_add(1);
        records[position].id = PatientId::new(next);
    }

    info!(
        "Loaded {} of {} patients from slot '{}'",
        records.len(),
        total,
        slot_key
    );
    records
}

/// Swap a non-numeric string id for a placeholder, returning the original.
fn take_text_id(entry: &mut Value) -> Option<String> {
    let object = entry.as_object_mut()?;
    let text = object.get("id")?.as_str()?;
    if text.trim().parse::<i64>().is_ok() {
        return None;
    }
    let text = text.to_string();
    object.insert("id".to_string(), Value::from(0));
    Some(text)
}
