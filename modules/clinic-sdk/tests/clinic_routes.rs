//! Clinic-specific routes and watched lists against a mock backend that
//! follows the real route layout (flat params, trailing-slash collections).

use clinic_http::HttpClient;
use clinic_resource::{ListPhase, QuerySpec, ResourceClientConfig, SortDirection};
use clinic_sdk::requests::AppointmentChanges;
use clinic_sdk::{
    Appointment, AppointmentStatus, ClinicApi, ClinicClient, Patient, Prediction, UpdateAck,
    filters,
};
use httpmock::prelude::*;
use serde_json::{Value, json};

fn clinic(server: &MockServer) -> ClinicClient {
    let http = HttpClient::builder().allow_insecure_http().build().unwrap();
    let config = ResourceClientConfig::clinic_backend(format!("{}/api", server.base_url()));
    ClinicClient::new(http, &config).unwrap()
}

fn appointment(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "patientId": "patient-001-ABC12345",
        "userId": "doctor-001-a1b2c3d4",
        "scheduleAt": "2025-07-20T09:30:00Z",
        "status": status,
        "notes": "",
        "createdAt": "2025-07-17T08:00:00Z",
        "updatedAt": "2025-07-17T08:00:00Z",
        "patient": {"id": "patient-001-ABC12345", "fullName": "Andi Saputra",
                    "gender": "male", "birthDate": "2000-01-01"},
        "user": {"id": "doctor-001-a1b2c3d4", "fullName": "dr. Rina",
                 "role": "doctor", "email": "rina@klinik.id"}
    })
}

fn patient(id: &str, name: &str) -> Value {
    json!({
        "id": id, "fullName": name, "nik": "3201012345678900",
        "birthDate": "2000-01-01", "gender": "female", "phone": "08123456789",
        "address": "Jl. Merdeka No. 10", "emergencyContact": "08198765432"
    })
}

#[tokio::test]
async fn patients_list_uses_flat_params() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/patients/")
            .query_param("page", "1")
            .query_param("limit", "10")
            .query_param("gender", "female");
        then.status(200).json_body(json!({
            "data": [patient("patient-001-ABC12345", "Siti Aminah")],
            "total": 1, "page": 1, "limit": 10, "totalPages": 1
        }));
    });

    let page = clinic(&server)
        .list::<Patient>(&QuerySpec::new().filter(filters::GENDER, "female"))
        .await
        .unwrap();

    assert_eq!(page.items[0].full_name, "Siti Aminah");
    assert_eq!(page.total, Some(1));
    mock.assert();
}

#[tokio::test]
async fn predictions_list_uses_sort_by_keys() {
    let server = MockServer::start();
    let mock = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/predictions/")
            .query_param("sortBy", "probability_score")
            .query_param("sortOrder", "desc");
        then.status(200).json_body(json!({"data": null, "totalPages": 0}));
    });

    let page = clinic(&server)
        .list::<Prediction>(&QuerySpec::new().sort_by("probability_score", SortDirection::Desc))
        .await
        .unwrap();

    assert!(page.items.is_empty());
    assert_eq!(page.total_pages, 1);
    mock.assert();
}

#[tokio::test]
async fn status_change_refetches_watched_appointments() {
    let server = MockServer::start();
    let mut pending = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/appointments/")
            .query_param("status", "pending");
        then.status(200).json_body(json!({
            "data": [appointment("apt-001", "pending"), appointment("apt-002", "pending")],
            "totalPages": 1
        }));
    });

    let clinic = clinic(&server);
    let list = clinic.watch::<Appointment>(QuerySpec::new().filter(filters::STATUS, "pending"));
    list.refetch().await;
    assert_eq!(list.snapshot().data().unwrap().items.len(), 2);

    pending.delete();
    let _after = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/appointments/")
            .query_param("status", "pending");
        then.status(200).json_body(json!({
            "data": [appointment("apt-002", "pending")],
            "totalPages": 1
        }));
    });
    let patch = server.mock(|when, then| {
        when.method(Method::PATCH)
            .path("/api/appointments/apt-001/statusAppoinment")
            .json_body(json!({"status": "done"}));
        then.status(200).json_body(json!({"message": "Status updated"}));
    });

    let ack = clinic
        .change_appointment_status("apt-001", AppointmentStatus::Done)
        .await
        .unwrap();

    assert_eq!(ack.message, "Status updated");
    let state = list.snapshot();
    assert_eq!(state.phase(), ListPhase::Loaded);
    let ids: Vec<&str> = state.data().unwrap().items.iter().map(|a| a.id.as_str()).collect();
    assert_eq!(ids, ["apt-002"]);
    patch.assert();
}

#[tokio::test]
async fn dropped_watch_is_not_refetched() {
    let server = MockServer::start();
    let list_mock = server.mock(|when, then| {
        when.method(Method::GET).path("/api/patients/");
        then.status(200)
            .json_body(json!({"data": [patient("p1", "Andi")], "totalPages": 1}));
    });
    let _delete = server.mock(|when, then| {
        when.method(Method::DELETE).path("/api/patients/p1");
        then.status(200).json_body(json!({"message": "Patient deleted successfully"}));
    });

    let clinic = clinic(&server);
    let list = clinic.watch::<Patient>(QuerySpec::new());
    list.refetch().await;
    drop(list);

    clinic.remove::<Patient>("p1").await.unwrap();
    list_mock.assert_calls(1);
    assert_eq!(clinic.coordinator().active("patients"), 0);
}

#[tokio::test]
async fn appointment_update_returns_changed_fields() {
    let server = MockServer::start();
    let _m = server.mock(|when, then| {
        when.method(Method::PUT)
            .path("/api/appointments/apt-001")
            .json_body(json!({"notes": "bring lab results"}));
        then.status(200).json_body(json!({
            "message": "Appointment updated successfully",
            "updatedFields": [{"field": "notes", "value": "bring lab results"}]
        }));
    });

    let changes = AppointmentChanges {
        notes: Some("bring lab results".to_owned()),
        ..AppointmentChanges::default()
    };
    let ack: UpdateAck = clinic(&server)
        .update::<Appointment, _>("apt-001", &changes)
        .await
        .unwrap();

    assert_eq!(ack.field("notes"), Some(&json!("bring lab results")));
}

#[tokio::test]
async fn nested_listings_accept_null_as_empty() {
    let server = MockServer::start();
    let _by_patient = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/appointments/appoinmentPatient/patient-009");
        then.status(200).body("null");
    });
    let _by_user = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/appointments/appoinmentUser/doctor-001-a1b2c3d4");
        then.status(200).json_body(json!([{
            "id": "apt-001", "patientId": "patient-001-ABC12345",
            "userId": "doctor-001-a1b2c3d4", "scheduleAt": "2025-07-20T09:30:00Z",
            "status": "cancelled", "notes": "",
            "createdAt": "2025-07-17T08:00:00Z", "updatedAt": "2025-07-17T08:00:00Z",
            "user": {"id": "doctor-001-a1b2c3d4", "fullName": "dr. Rina",
                     "role": "doctor", "email": "rina@klinik.id"}
        }]));
    });

    let clinic = clinic(&server);
    assert!(clinic
        .appointments_for_patient("patient-009")
        .await
        .unwrap()
        .is_empty());

    let mine = clinic
        .appointments_for_user("doctor-001-a1b2c3d4")
        .await
        .unwrap();
    assert_eq!(mine[0].status, AppointmentStatus::Cancelled);
    assert!(mine[0].patient.is_none());
}

#[tokio::test]
async fn run_prediction_posts_to_assessment_route() {
    let server = MockServer::start();
    let run = server.mock(|when, then| {
        when.method(Method::POST).path("/api/predictions/asm-001");
        then.status(201).json_body(json!({
            "id": "pred-001", "assessmentId": "asm-001", "resultLabel": "Depresi Ringan",
            "probabilityScore": 0.82, "createdAt": "2025-07-17T10:00:00Z",
            "updatedAt": "0001-01-01T00:00:00Z"
        }));
    });
    let _missing = server.mock(|when, then| {
        when.method(Method::GET).path("/api/predictions/assessment/asm-404");
        then.status(404)
            .json_body(json!({"error": "Prediksi untuk assessment ini tidak ditemukan"}));
    });

    let clinic = clinic(&server);
    let prediction = clinic.run_prediction("asm-001").await.unwrap();
    assert_eq!(prediction.result_label, "Depresi Ringan");
    assert!((prediction.probability_score - 0.82).abs() < f64::EPSILON);
    run.assert();

    let err = clinic.prediction_for_assessment("asm-404").await.unwrap_err();
    assert!(err.is_not_found());
}
