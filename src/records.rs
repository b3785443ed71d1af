//! Record Store: the per-subject, append-only list of visit records.
//!
//! Each subject's records live under `medical_records_{healthId}` as one
//! JSON array, newest first. Every successful append rewrites the whole
//! array; histories are expected to stay small, so this is a known
//! scalability limit rather than something to patch incrementally.
//!
//! There is no locking between read and write. Two writers for the same
//! subject end in last-writer-wins.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::config;
use crate::models::{MedicalRecord, RecordDraft, ValidationError};
use crate::storage::{KeyValueStore, StorageError};

#[derive(Error, Debug)]
pub enum RecordError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Cannot serialize records: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Cannot save records: {0}")]
    Storage(#[from] StorageError),
}

/// Record collections mirrored between memory and a [`KeyValueStore`].
pub struct RecordStore<S: KeyValueStore> {
    kv: S,
    /// In-memory sequences, only updated after a successful write.
    cache: HashMap<String, Vec<MedicalRecord>>,
}

impl<S: KeyValueStore> RecordStore<S> {
    pub fn new(kv: S) -> Self {
        Self {
            kv,
            cache: HashMap::new(),
        }
    }

    /// The underlying key-value store.
    pub fn kv(&self) -> &S {
        &self.kv
    }

    /// Reads a subject's durable collection.
    ///
    /// Absent, unreadable or corrupt data yields an empty list; the next
    /// append overwrites whatever was stored.
    pub fn load(&self, subject_id: &str) -> Vec<MedicalRecord> {
        let key = config::records_key(subject_id);
        let bytes = match self.kv.get(&key) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(e) => {
                tracing::warn!(subject = subject_id, error = %e, "Cannot read records, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_slice::<Vec<MedicalRecord>>(&bytes) {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(subject = subject_id, error = %e, "Stored records are corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Reloads a subject's in-memory sequence from storage.
    pub fn refresh(&mut self, subject_id: &str) -> &[MedicalRecord] {
        let records = self.load(subject_id);
        self.cache.insert(subject_id.to_string(), records);
        self.cache.get(subject_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// The in-memory sequence for a subject, loading it on first access.
    pub fn records(&mut self, subject_id: &str) -> &[MedicalRecord] {
        if !self.cache.contains_key(subject_id) {
            return self.refresh(subject_id);
        }
        self.cache.get(subject_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Validates `draft`, prepends it as a new record and persists the
    /// full collection.
    pub fn append(
        &mut self,
        subject_id: &str,
        draft: RecordDraft,
    ) -> Result<MedicalRecord, RecordError> {
        self.append_at(subject_id, draft, Utc::now())
    }

    /// [`append`](Self::append) with an explicit creation time.
    pub fn append_at(
        &mut self,
        subject_id: &str,
        draft: RecordDraft,
        now: DateTime<Utc>,
    ) -> Result<MedicalRecord, RecordError> {
        draft.validate()?;

        let existing = self.records(subject_id);
        let id = next_record_id(existing, now.timestamp_millis());
        let record = MedicalRecord::from_draft(id, now, subject_id, draft);

        let mut updated = Vec::with_capacity(existing.len() + 1);
        updated.push(record.clone());
        updated.extend_from_slice(existing);

        let bytes = serde_json::to_vec(&updated)?;
        self.kv.set(&config::records_key(subject_id), &bytes)?;
        self.cache.insert(subject_id.to_string(), updated);

        tracing::info!(subject = subject_id, record_id = id, "Medical record added");
        Ok(record)
    }

    /// Drops a subject's whole collection. The only way records are removed.
    pub fn clear(&mut self, subject_id: &str) -> Result<(), RecordError> {
        self.kv.remove(&config::records_key(subject_id))?;
        self.cache.remove(subject_id);
        Ok(())
    }
}

/// Millisecond timestamp, bumped past the newest existing id so ids stay
/// unique and increasing even within one millisecond or after a clock step.
fn next_record_id(existing: &[MedicalRecord], now_ms: i64) -> i64 {
    let newest = existing.iter().map(|r| r.id).max();
    match newest {
        Some(newest) if newest >= now_ms => newest + 1,
        _ => now_ms,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;

    use chrono::{Duration, NaiveDate, TimeZone};

    use super::*;
    use crate::models::{RequiredField, Severity};
    use crate::storage::MemoryStore;

    fn store() -> RecordStore<Arc<MemoryStore>> {
        RecordStore::new(Arc::new(MemoryStore::new()))
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap()
    }

    fn full_draft() -> RecordDraft {
        RecordDraft {
            doctor_name: "Dr. Mehta".into(),
            specialization: "Cardiology".into(),
            diagnosis: "Hypertension".into(),
            treatment: "Lifestyle changes".into(),
            medications: "Amlodipine 5mg".into(),
            allergies: "Penicillin".into(),
            severity: Severity::Moderate,
            follow_up_date: NaiveDate::from_ymd_opt(2025, 2, 15),
            notes: "Recheck BP".into(),
        }
    }

    #[test]
    fn append_to_empty_store_then_load() {
        let mut records = store();
        assert!(records.load("HID-001").is_empty());

        records.append("HID-001", RecordDraft::new("Dr. A", "Flu")).unwrap();

        let loaded = records.load("HID-001");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].doctor_name, "Dr. A");
        assert_eq!(loaded[0].diagnosis, "Flu");
        assert_eq!(loaded[0].severity, Severity::Mild);
        assert_eq!(loaded[0].patient_id, "HID-001");
    }

    #[test]
    fn missing_doctor_name_is_rejected_and_store_stays_empty() {
        let mut records = store();
        let err = records
            .append("HID-001", RecordDraft::new("", "Flu"))
            .unwrap_err();

        match err {
            RecordError::Validation(v) => assert_eq!(v.missing, vec![RequiredField::DoctorName]),
            other => panic!("expected validation error, got {other:?}"),
        }
        assert!(records.load("HID-001").is_empty());
        assert!(records.kv().is_empty());
    }

    #[test]
    fn failed_append_leaves_bytes_unchanged() {
        let mut records = store();
        records.append_at("HID-001", full_draft(), t0()).unwrap();
        let key = config::records_key("HID-001");
        let before = records.kv().get(&key).unwrap().unwrap();

        for draft in [
            RecordDraft::new("", "Flu"),
            RecordDraft::new("Dr. A", ""),
            RecordDraft::default(),
        ] {
            assert!(records.append("HID-001", draft).is_err());
            assert_eq!(records.kv().get(&key).unwrap().unwrap(), before);
        }
        assert_eq!(records.records("HID-001").len(), 1);
    }

    #[test]
    fn appends_are_newest_first() {
        let mut records = store();
        records.append_at("HID-001", RecordDraft::new("Dr. A", "First"), t0()).unwrap();
        records
            .append_at("HID-001", RecordDraft::new("Dr. B", "Second"), t0() + Duration::minutes(5))
            .unwrap();
        records
            .append_at("HID-001", RecordDraft::new("Dr. C", "Third"), t0() + Duration::minutes(9))
            .unwrap();

        let loaded = records.load("HID-001");
        let diagnoses: Vec<_> = loaded.iter().map(|r| r.diagnosis.as_str()).collect();
        assert_eq!(diagnoses, vec!["Third", "Second", "First"]);
    }

    #[test]
    fn load_length_grows_by_successful_appends_only() {
        let mut records = store();
        records.append("HID-001", RecordDraft::new("Dr. A", "Flu")).unwrap();
        let before = records.load("HID-001").len();

        records.append("HID-001", RecordDraft::new("Dr. A", "Cold")).unwrap();
        let _ = records.append("HID-001", RecordDraft::new("", "Cold"));
        records.append("HID-001", RecordDraft::new("Dr. B", "Cough")).unwrap();

        assert_eq!(records.load("HID-001").len(), before + 2);
    }

    #[test]
    fn ids_unique_within_same_millisecond() {
        let mut records = store();
        let mut seen = HashSet::new();
        for i in 0..20 {
            let record = records
                .append_at("HID-001", RecordDraft::new("Dr. A", format!("Visit {i}")), t0())
                .unwrap();
            assert!(seen.insert(record.id), "duplicate id {}", record.id);
        }
    }

    #[test]
    fn id_stays_ahead_of_clock_going_backwards() {
        let mut records = store();
        let first = records.append_at("HID-001", RecordDraft::new("Dr. A", "Flu"), t0()).unwrap();
        let second = records
            .append_at("HID-001", RecordDraft::new("Dr. A", "Flu"), t0() - Duration::hours(1))
            .unwrap();
        assert!(second.id > first.id);
    }

    #[test]
    fn subjects_do_not_leak_into_each_other() {
        let mut records = store();
        records.append("HID-001", RecordDraft::new("Dr. A", "Flu")).unwrap();
        records.append("HID-002", RecordDraft::new("Dr. B", "Sprain")).unwrap();

        let first = records.load("HID-001");
        let second = records.load("HID-002");
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0].diagnosis, "Flu");
        assert_eq!(second[0].diagnosis, "Sprain");
        assert_eq!(second[0].patient_id, "HID-002");
    }

    #[test]
    fn persisted_collection_roundtrips() {
        let kv = Arc::new(MemoryStore::new());
        let mut writer = RecordStore::new(Arc::clone(&kv));
        writer.append_at("HID-001", full_draft(), t0()).unwrap();
        writer
            .append_at("HID-001", RecordDraft::new("Dr. A", "Flu"), t0() + Duration::days(1))
            .unwrap();
        let written = writer.records("HID-001").to_vec();

        let reader = RecordStore::new(kv);
        assert_eq!(reader.load("HID-001"), written);
    }

    #[test]
    fn corrupt_data_loads_empty_and_is_overwritten() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(&config::records_key("HID-001"), b"{not json").unwrap();
        let mut records = RecordStore::new(Arc::clone(&kv));

        assert!(records.load("HID-001").is_empty());

        records.append("HID-001", RecordDraft::new("Dr. A", "Flu")).unwrap();
        assert_eq!(records.load("HID-001").len(), 1);
    }

    /// Reads succeed, writes always fail.
    struct ReadOnlyStore;

    impl KeyValueStore for ReadOnlyStore {
        fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, StorageError> {
            Ok(None)
        }

        fn set(&self, _key: &str, _value: &[u8]) -> Result<(), StorageError> {
            Err(StorageError::LockPoisoned)
        }

        fn remove(&self, _key: &str) -> Result<(), StorageError> {
            Err(StorageError::LockPoisoned)
        }
    }

    #[test]
    fn storage_failure_is_reported_and_nothing_cached() {
        let mut records = RecordStore::new(ReadOnlyStore);
        let result = records.append("HID-001", RecordDraft::new("Dr. A", "Flu"));

        assert!(matches!(result, Err(RecordError::Storage(_))));
        assert!(records.records("HID-001").is_empty());
        assert!(records.load("HID-001").is_empty());
    }

    #[test]
    fn clear_removes_collection() {
        let mut records = store();
        records.append("HID-001", RecordDraft::new("Dr. A", "Flu")).unwrap();
        records.clear("HID-001").unwrap();
        assert!(records.load("HID-001").is_empty());
        assert!(records.records("HID-001").is_empty());
    }

    #[test]
    fn works_over_sqlite_store() {
        let kv = crate::storage::SqliteStore::open_in_memory().unwrap();
        let mut records = RecordStore::new(kv);
        records.append("HID-001", full_draft()).unwrap();
        let loaded = records.load("HID-001");
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].allergies, "Penicillin");
    }

    #[test]
    fn next_id_uses_clock_when_ahead() {
        assert_eq!(next_record_id(&[], 1_000), 1_000);
    }
}
