use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::blank_date;
use super::enums::Severity;

/// One medical visit entry. Never mutated after creation.
///
/// Serialized with the camelCase field names used in local storage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: i64,
    pub date: DateTime<Utc>,
    pub patient_id: String,
    pub doctor_name: String,
    #[serde(default)]
    pub specialization: String,
    pub diagnosis: String,
    #[serde(default)]
    pub treatment: String,
    #[serde(default)]
    pub medications: String,
    #[serde(default)]
    pub allergies: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, with = "blank_date")]
    pub follow_up_date: Option<NaiveDate>,
    #[serde(default)]
    pub notes: String,
}

impl MedicalRecord {
    /// Builds a record from a draft that already passed validation.
    pub(crate) fn from_draft(
        id: i64,
        date: DateTime<Utc>,
        patient_id: &str,
        draft: RecordDraft,
    ) -> Self {
        Self {
            id,
            date,
            patient_id: patient_id.to_string(),
            doctor_name: draft.doctor_name,
            specialization: draft.specialization,
            diagnosis: draft.diagnosis,
            treatment: draft.treatment,
            medications: draft.medications,
            allergies: draft.allergies,
            severity: draft.severity,
            follow_up_date: draft.follow_up_date,
            notes: draft.notes,
        }
    }
}

/// User-submitted, not-yet-validated record input.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordDraft {
    pub doctor_name: String,
    pub specialization: String,
    pub diagnosis: String,
    pub treatment: String,
    pub medications: String,
    pub allergies: String,
    pub severity: Severity,
    #[serde(with = "blank_date")]
    pub follow_up_date: Option<NaiveDate>,
    pub notes: String,
}

impl RecordDraft {
    pub fn new(doctor_name: impl Into<String>, diagnosis: impl Into<String>) -> Self {
        Self {
            doctor_name: doctor_name.into(),
            diagnosis: diagnosis.into(),
            ..Self::default()
        }
    }

    /// Checks the required fields. Whitespace-only counts as missing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut missing = Vec::new();
        if self.doctor_name.trim().is_empty() {
            missing.push(RequiredField::DoctorName);
        }
        if self.diagnosis.trim().is_empty() {
            missing.push(RequiredField::Diagnosis);
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { missing })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    DoctorName,
    Diagnosis,
}

impl RequiredField {
    /// Form field name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DoctorName => "doctorName",
            Self::Diagnosis => "diagnosis",
        }
    }
}

/// A draft was rejected; nothing was written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Missing required field(s): {}", field_list(.missing))]
pub struct ValidationError {
    pub missing: Vec<RequiredField>,
}

impl ValidationError {
    pub fn is_missing(&self, field: RequiredField) -> bool {
        self.missing.contains(&field)
    }
}

fn field_list(fields: &[RequiredField]) -> String {
    fields
        .iter()
        .map(RequiredField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_with_required_fields_is_valid() {
        assert!(RecordDraft::new("Dr. A", "Flu").validate().is_ok());
    }

    #[test]
    fn draft_missing_doctor_names_field() {
        let err = RecordDraft::new("", "Flu").validate().unwrap_err();
        assert_eq!(err.missing, vec![RequiredField::DoctorName]);
        assert!(err.to_string().contains("doctorName"));
    }

    #[test]
    fn draft_missing_both_lists_both() {
        let err = RecordDraft::new("  ", "").validate().unwrap_err();
        assert!(err.is_missing(RequiredField::DoctorName));
        assert!(err.is_missing(RequiredField::Diagnosis));
        assert_eq!(err.to_string(), "Missing required field(s): doctorName, diagnosis");
    }

    #[test]
    fn stored_record_with_blank_fields_parses() {
        let json = r#"{
            "doctorName": "Dr. John Smith",
            "specialization": "",
            "diagnosis": "Seasonal flu",
            "treatment": "",
            "medications": "",
            "allergies": "",
            "notes": "",
            "followUpDate": "",
            "severity": "mild",
            "id": 1718000000000,
            "date": "2024-06-10T06:13:20.000Z",
            "patientId": "HID-001"
        }"#;
        let record: MedicalRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.id, 1_718_000_000_000);
        assert_eq!(record.patient_id, "HID-001");
        assert_eq!(record.severity, Severity::Mild);
        assert!(record.follow_up_date.is_none());
    }

    #[test]
    fn follow_up_date_serializes_as_plain_date() {
        let mut draft = RecordDraft::new("Dr. A", "Flu");
        draft.follow_up_date = NaiveDate::from_ymd_opt(2025, 3, 1);
        let record = MedicalRecord::from_draft(1, Utc::now(), "HID-001", draft);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["followUpDate"], "2025-03-01");
        assert_eq!(value["doctorName"], "Dr. A");

        let none = MedicalRecord::from_draft(2, Utc::now(), "HID-001", RecordDraft::new("Dr. A", "Flu"));
        assert_eq!(serde_json::to_value(&none).unwrap()["followUpDate"], "");
    }

    #[test]
    fn missing_optional_keys_default() {
        let json = r#"{"id": 5, "date": "2024-01-01T00:00:00Z", "patientId": "HID-9",
                       "doctorName": "Dr. B", "diagnosis": "Cold"}"#;
        let record: MedicalRecord = serde_json::from_str(json).unwrap();
        assert!(record.treatment.is_empty());
        assert_eq!(record.severity, Severity::Mild);
        assert!(record.follow_up_date.is_none());
    }
}
