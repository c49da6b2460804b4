//! Request payloads for create and update calls.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::models::{AppointmentStatus, Gender, Role};

/// Body of `POST /patients` and `PUT /patients/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientInput {
    pub full_name: String,
    pub nik: String,
    pub birth_date: String,
    pub gender: Gender,
    pub phone: String,
    pub address: String,
    pub emergency_contact: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAppointment {
    pub patient_id: String,
    pub user_id: String,
    pub schedule_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub notes: String,
}

/// Only the fields that are set are sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentChanges {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schedule_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatusChange {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssessment {
    pub patient_id: String,
    pub date: DateTime<Utc>,
    pub answers: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentChanges {
    pub date: DateTime<Utc>,
    pub answers: Map<String, Value>,
}

/// Body of both create and update; the backend requires every field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecordInput {
    pub patient_id: String,
    pub user_id: String,
    pub diagnosis: String,
    pub treatment: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionCorrection {
    pub result_label: String,
    /// Within `0.0..=1.0`
    pub probability_score: f64,
}

/// Empty fields are left unchanged by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub full_name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn appointment_changes_send_only_set_fields() {
        let changes = AppointmentChanges {
            notes: Some("reschedule".to_owned()),
            ..AppointmentChanges::default()
        };
        assert_eq!(serde_json::to_value(&changes).unwrap(), json!({"notes": "reschedule"}));
    }

    #[test]
    fn status_change_body() {
        let body = StatusChange {
            status: AppointmentStatus::Done,
        };
        assert_eq!(serde_json::to_value(body).unwrap(), json!({"status": "done"}));
    }

    #[test]
    fn user_changes_skip_empty() {
        let changes = UserChanges {
            role: Some(Role::Doctor),
            ..UserChanges::default()
        };
        assert_eq!(serde_json::to_value(&changes).unwrap(), json!({"role": "doctor"}));
    }
}
