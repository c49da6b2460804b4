//! Wire models of the clinic REST API.
//!
//! Ids are opaque strings (`patient-001-ABC12345`). Nested summaries the
//! backend omits on some routes default to empty values.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    pub id: String,
    pub full_name: String,
    pub nik: String,
    /// `YYYY-MM-DD`
    pub birth_date: String,
    pub gender: Gender,
    pub phone: String,
    pub address: String,
    pub emergency_contact: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientSummary {
    pub id: String,
    pub full_name: String,
    pub gender: String,
    pub birth_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub full_name: String,
    pub email: String,
    pub role: Role,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Doctor,
    Staff,
}

impl Role {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Doctor => "doctor",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSummary {
    pub id: String,
    pub full_name: String,
    pub role: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    #[default]
    Pending,
    Done,
    Cancelled,
}

impl AppointmentStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Done => "done",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: String,
    pub patient_id: String,
    pub user_id: String,
    pub schedule_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Absent on `appoinmentUser` listings
    #[serde(default)]
    pub patient: Option<PatientSummary>,
    #[serde(default)]
    pub user: Option<UserSummary>,
}

/// Row of `GET /appointments/appoinmentPatient/{patientId}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PatientAppointment {
    pub id: String,
    pub patient_id: String,
    pub user_id: String,
    pub date: String,
    pub time: String,
    pub description: String,
    pub created_at: String,
    pub updated_at: String,
    pub patient: PatientSummary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assessment {
    pub id: String,
    pub patient_id: String,
    pub date: DateTime<Utc>,
    /// Questionnaire answers keyed by question code
    #[serde(default)]
    pub answers: Map<String, Value>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub patient: PatientSummary,
    #[serde(default)]
    pub prediction: Option<Prediction>,
}

/// `data` of the assessment update response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentUpdate {
    pub id: String,
    pub date: String,
    #[serde(default)]
    pub answers: Map<String, Value>,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prediction {
    pub id: String,
    pub assessment_id: String,
    pub result_label: String,
    pub probability_score: f64,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordPatient {
    pub id: String,
    pub full_name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RecordAuthor {
    pub id: String,
    pub full_name: String,
    pub role: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MedicalRecord {
    pub id: String,
    pub patient_id: String,
    pub user_id: String,
    pub diagnosis: String,
    pub treatment: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(default)]
    pub patient: RecordPatient,
    #[serde(default)]
    pub user: RecordAuthor,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpdatedField {
    pub field: String,
    pub value: Value,
}

/// Update response of appointments and medical records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAck {
    pub message: String,
    pub updated_fields: Vec<UpdatedField>,
}

impl UpdateAck {
    /// New value of `field`, if the update touched it.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&Value> {
        self.updated_fields
            .iter()
            .find(|f| f.field == field)
            .map(|f| &f.value)
    }
}
