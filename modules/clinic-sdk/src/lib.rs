#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Typed access to the clinic REST API.
//!
//! [`ClinicClient`] pairs the generic resource client with the clinic's
//! models, route quirks and list invalidation:
//!
//! ```ignore
//! let clinic = ClinicClient::new(http, &ResourceClientConfig::clinic_backend(base))?;
//! let appointments = clinic.watch::<Appointment>(
//!     QuerySpec::new().filter(filters::STATUS, "pending"),
//! );
//! appointments.refetch().await;
//! clinic.change_appointment_status("apt-001", AppointmentStatus::Done).await?;
//! // `appointments` has been refetched
//! ```

pub mod api;
mod client;
pub mod models;
pub mod requests;
pub mod resource;

pub use api::ClinicApi;
pub use client::{ClinicClient, WatchedList};
pub use models::{
    Appointment, AppointmentStatus, Assessment, AssessmentUpdate, Gender, MedicalRecord, Patient,
    PatientAppointment, Prediction, Role, UpdateAck, UpdatedField, User,
};
pub use resource::{Resource, filters};
