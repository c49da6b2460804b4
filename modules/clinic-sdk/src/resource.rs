//! Resource names and per-resource wire conventions.

use clinic_resource::FlatKeys;
use serde::de::DeserializeOwned;

use crate::models::{
    Appointment, Assessment, AssessmentUpdate, MedicalRecord, Patient, Prediction, UpdateAck, User,
};

pub const PATIENTS: &str = "patients";
pub const APPOINTMENTS: &str = "appointments";
pub const ASSESSMENTS: &str = "assessments";
pub const PREDICTIONS: &str = "predictions";
pub const MEDICAL_RECORDS: &str = "medical-records";
pub const USERS: &str = "users";

/// Every collection the console knows about.
pub const ALL: [&str; 6] = [
    PATIENTS,
    APPOINTMENTS,
    ASSESSMENTS,
    PREDICTIONS,
    MEDICAL_RECORDS,
    USERS,
];

/// Filter keys understood by the list endpoints.
pub mod filters {
    /// Free-text match; patients, users, appointments
    pub const SEARCH: &str = "search";
    pub const GENDER: &str = "gender";
    pub const ROLE: &str = "role";
    pub const STATUS: &str = "status";
    /// Assessments and medical records
    pub const PATIENT_ID: &str = "patientId";
    pub const USER_ID: &str = "userId";
    pub const RESULT_LABEL: &str = "resultLabel";
}

/// A typed collection of the clinic API.
pub trait Resource: DeserializeOwned + Send + Sync + 'static {
    /// Path segment under the API base
    const NAME: &'static str;

    /// What `PUT <resource>/<id>` answers with
    type Updated: DeserializeOwned + Send;

    /// Flat-style parameter names for this collection's list endpoint.
    #[must_use]
    fn flat_keys() -> FlatKeys {
        FlatKeys::default()
    }
}

impl Resource for Patient {
    const NAME: &'static str = PATIENTS;
    type Updated = Patient;
}

impl Resource for Appointment {
    const NAME: &'static str = APPOINTMENTS;
    type Updated = UpdateAck;
}

impl Resource for Assessment {
    const NAME: &'static str = ASSESSMENTS;
    type Updated = AssessmentUpdate;
}

impl Resource for Prediction {
    const NAME: &'static str = PREDICTIONS;
    type Updated = Prediction;

    fn flat_keys() -> FlatKeys {
        FlatKeys::default().with_sort_keys("sortBy", "sortOrder")
    }
}

impl Resource for MedicalRecord {
    const NAME: &'static str = MEDICAL_RECORDS;
    type Updated = UpdateAck;
}

impl Resource for User {
    const NAME: &'static str = USERS;
    type Updated = User;
}
