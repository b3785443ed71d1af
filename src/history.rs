//! Display rows for the medical-history list.

use chrono::Local;
use serde::Serialize;

use crate::models::{MedicalRecord, Severity};

/// One row of the history list. Optional fields are `None` when blank.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    pub id: i64,
    pub date: String,
    pub time: String,
    pub doctor: String,
    pub specialization: Option<String>,
    pub diagnosis: String,
    pub treatment: Option<String>,
    pub medications: Option<String>,
    pub allergies: Option<String>,
    pub severity: Severity,
    pub follow_up: Option<String>,
    pub notes: Option<String>,
}

impl From<&MedicalRecord> for HistoryEntry {
    fn from(record: &MedicalRecord) -> Self {
        let local = record.date.with_timezone(&Local);
        Self {
            id: record.id,
            date: local.format("%Y-%m-%d").to_string(),
            time: local.format("%H:%M").to_string(),
            doctor: format!("Dr. {}", record.doctor_name.trim_start_matches("Dr. ")),
            specialization: non_blank(&record.specialization),
            diagnosis: record.diagnosis.clone(),
            treatment: non_blank(&record.treatment),
            medications: non_blank(&record.medications),
            allergies: non_blank(&record.allergies),
            severity: record.severity,
            follow_up: record.follow_up_date.map(|d| d.format("%Y-%m-%d").to_string()),
            notes: non_blank(&record.notes),
        }
    }
}

/// Header of the history list, e.g. `Medical History (3 records)`.
pub fn history_title(count: usize) -> String {
    format!("Medical History ({count} records)")
}

pub fn history_entries(records: &[MedicalRecord]) -> Vec<HistoryEntry> {
    records.iter().map(HistoryEntry::from).collect()
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, TimeZone, Utc};

    use super::*;
    use crate::models::RecordDraft;

    fn record(draft: RecordDraft) -> MedicalRecord {
        let date = Utc.with_ymd_and_hms(2025, 1, 15, 10, 30, 0).unwrap();
        MedicalRecord::from_draft(1, date, "HID-001", draft)
    }

    #[test]
    fn blank_optionals_are_none() {
        let entry = HistoryEntry::from(&record(RecordDraft::new("Dr. A", "Flu")));
        assert!(entry.treatment.is_none());
        assert!(entry.allergies.is_none());
        assert!(entry.follow_up.is_none());
        assert_eq!(entry.severity, Severity::Mild);
    }

    #[test]
    fn doctor_prefix_not_doubled() {
        let entry = HistoryEntry::from(&record(RecordDraft::new("Dr. A", "Flu")));
        assert_eq!(entry.doctor, "Dr. A");
        let entry = HistoryEntry::from(&record(RecordDraft::new("Sen", "Flu")));
        assert_eq!(entry.doctor, "Dr. Sen");
    }

    #[test]
    fn follow_up_is_formatted() {
        let mut draft = RecordDraft::new("Dr. A", "Flu");
        draft.follow_up_date = NaiveDate::from_ymd_opt(2025, 2, 1);
        let entry = HistoryEntry::from(&record(draft));
        assert_eq!(entry.follow_up.as_deref(), Some("2025-02-01"));
    }

    #[test]
    fn title_counts_records() {
        assert_eq!(history_title(3), "Medical History (3 records)");
    }
}
