//! `ClinicApi` trait: the clinic routes that fall outside plain CRUD.

use async_trait::async_trait;
use clinic_resource::{MutationAck, ResourceError};

use crate::models::{Appointment, AppointmentStatus, Assessment, PatientAppointment, Prediction};

/// Non-CRUD operations of the clinic backend.
///
/// Generic list/get/create/update/remove live on
/// [`ClinicClient`](crate::ClinicClient) since they are typed per resource.
#[async_trait]
pub trait ClinicApi: Send + Sync {
    /// `PATCH /appointments/{id}/statusAppoinment`
    ///
    /// # Errors
    ///
    /// * `HttpStatus{404}` - If the appointment does not exist
    async fn change_appointment_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> Result<MutationAck, ResourceError>;

    /// All appointments of one patient, unpaginated.
    ///
    /// # Errors
    ///
    /// Transport, status and decoding errors.
    async fn appointments_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<PatientAppointment>, ResourceError>;

    /// All appointments assigned to one clinician, unpaginated.
    ///
    /// # Errors
    ///
    /// Transport, status and decoding errors.
    async fn appointments_for_user(&self, user_id: &str) -> Result<Vec<Appointment>, ResourceError>;

    /// # Errors
    ///
    /// Transport, status and decoding errors.
    async fn assessments_for_patient(&self, patient_id: &str) -> Result<Vec<Assessment>, ResourceError>;

    /// Score an assessment with the prediction service and store the result.
    ///
    /// # Errors
    ///
    /// * `HttpStatus{404}` - If the assessment does not exist
    /// * `HttpStatus{500}` - If the prediction service failed
    async fn run_prediction(&self, assessment_id: &str) -> Result<Prediction, ResourceError>;

    /// # Errors
    ///
    /// * `HttpStatus{404}` - If the assessment has no prediction yet
    async fn prediction_for_assessment(&self, assessment_id: &str) -> Result<Prediction, ResourceError>;
}
