//! Medical records commands:
//! - `get_medical_records`: history for the signed-in patient
//! - `add_medical_record`: validate and append a draft
//! - `export_medical_records`: render the PDF into the exports directory

use serde::Serialize;

use crate::core_state::AppState;
use crate::export;
use crate::history::{self, HistoryEntry};
use crate::models::{MedicalRecord, RecordDraft};
use crate::session;

/// Maximum length accepted for any free-text draft field.
const MAX_FIELD_LEN: usize = 2000;

#[derive(Debug, Clone, Serialize)]
pub struct RecordsView {
    pub health_id: String,
    pub title: String,
    pub entries: Vec<HistoryEntry>,
    /// Export is only offered when there is something to export.
    pub can_export: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub path: String,
    pub filename: String,
    pub pages: usize,
    pub records: usize,
}

/// Records of the signed-in patient, newest first.
pub fn get_medical_records(state: &AppState) -> Result<RecordsView, String> {
    let user = session::require_user(state.kv()).map_err(|e| e.to_string())?;
    let mut store = state.records()?;
    let records = store.refresh(&user.health_id);

    Ok(RecordsView {
        title: history::history_title(records.len()),
        entries: history::history_entries(records),
        can_export: !records.is_empty(),
        health_id: user.health_id,
    })
}

/// Appends a record for the signed-in patient.
pub fn add_medical_record(draft: RecordDraft, state: &AppState) -> Result<MedicalRecord, String> {
    draft.validate().map_err(|e| e.to_string())?;

    for (name, value) in [
        ("doctorName", &draft.doctor_name),
        ("specialization", &draft.specialization),
        ("diagnosis", &draft.diagnosis),
        ("treatment", &draft.treatment),
        ("medications", &draft.medications),
        ("allergies", &draft.allergies),
        ("notes", &draft.notes),
    ] {
        if value.chars().count() > MAX_FIELD_LEN {
            return Err(format!("{name} must be {MAX_FIELD_LEN} characters or fewer"));
        }
    }

    let user = session::require_user(state.kv()).map_err(|e| e.to_string())?;
    let mut store = state.records()?;
    store
        .append(&user.health_id, draft)
        .map_err(|e| e.to_string())
}

/// Exports the signed-in patient's records as a PDF in the exports directory.
pub fn export_medical_records(state: &AppState) -> Result<ExportResult, String> {
    let user = session::require_user(state.kv()).map_err(|e| e.to_string())?;
    let mut store = state.records()?;
    let records = store.refresh(&user.health_id);

    let document = export::export_records(&user, records).map_err(|e| e.to_string())?;
    let path = document
        .save_to(&state.config.exports_dir())
        .map_err(|e| e.to_string())?;

    Ok(ExportResult {
        path: path.display().to_string(),
        filename: document.filename,
        pages: document.page_count,
        records: document.section_count,
    })
}
