//! Mutations against a mock backend and the list refetches they trigger.

use std::sync::Arc;
use std::time::Duration;

use clinic_http::HttpClient;
use clinic_resource::{
    Coordinator, ListController, ListPhase, MutationAck, MutationExecutor, QuerySpec,
    ResourceClient, ResourceClientConfig, ResourceError,
};
use httpmock::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
struct Patient {
    id: String,
    full_name: String,
}

fn patients_json(ids: &[&str]) -> Value {
    let data: Vec<Value> = ids
        .iter()
        .map(|id| json!({"id": id, "fullName": format!("Patient {id}")}))
        .collect();
    json!({"data": data, "totalPages": 1})
}

fn client(server: &MockServer) -> ResourceClient {
    let http = HttpClient::builder().allow_insecure_http().build().unwrap();
    let config = ResourceClientConfig {
        base_url: format!("{}/api", server.base_url()),
        ..ResourceClientConfig::default()
    };
    ResourceClient::new(http, &config).unwrap()
}

fn ids(list: &ListController<Patient>) -> Vec<String> {
    list.snapshot()
        .data()
        .map(|page| page.items.iter().map(|p| p.id.clone()).collect())
        .unwrap_or_default()
}

/// Collects phases published by `list` until it settles in `Loaded`.
fn record_phases(list: &ListController<Patient>) -> tokio::task::JoinHandle<Vec<ListPhase>> {
    let mut rx = list.subscribe();
    rx.borrow_and_update();
    tokio::spawn(async move {
        let mut phases = Vec::new();
        while rx.changed().await.is_ok() {
            let phase = rx.borrow_and_update().phase();
            phases.push(phase);
            if phase == ListPhase::Loaded {
                break;
            }
        }
        phases
    })
}

#[tokio::test]
async fn remove_refetches_every_subscribed_list() {
    let server = MockServer::start();
    let mut page_one = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/patients")
            .query_param("page", "1");
        then.status(200).json_body(patients_json(&["p1", "p2"]));
    });
    let mut searched = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/patients")
            .query_param("filters[search]", "p");
        then.status(200).json_body(patients_json(&["p2"]));
    });

    let client = client(&server);
    let coordinator = Coordinator::new();
    let all = Arc::new(ListController::<Patient>::for_resource(
        client.clone(),
        "patients",
        QuerySpec::new(),
    ));
    let filtered = Arc::new(ListController::<Patient>::for_resource(
        client.clone(),
        "patients",
        QuerySpec::new().filter("search", "p").page(3),
    ));
    let _all_sub = coordinator.register("patients", &all);
    let _filtered_sub = coordinator.register("patients", &filtered);

    all.refetch().await;
    filtered.refetch().await;
    assert_eq!(ids(&all), ["p1", "p2"]);
    assert_eq!(ids(&filtered), ["p2"]);

    page_one.delete();
    searched.delete();
    let _after_all = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/patients")
            .query_param("page", "1");
        then.status(200)
            .delay(Duration::from_millis(100))
            .json_body(patients_json(&["p1"]));
    });
    let _after_filtered = server.mock(|when, then| {
        when.method(Method::GET)
            .path("/api/patients")
            .query_param("filters[search]", "p");
        then.status(200)
            .delay(Duration::from_millis(100))
            .json_body(patients_json(&[]));
    });
    let delete = server.mock(|when, then| {
        when.method(Method::DELETE).path("/api/patients/p2");
        then.status(200).json_body(json!({"message": "Patient deleted"}));
    });

    let all_phases = record_phases(&all);
    let filtered_phases = record_phases(&filtered);

    let mutations = MutationExecutor::new(client).with_coordinator(coordinator);
    mutations.remove("patients", "p2").await.unwrap();

    assert_eq!(all_phases.await.unwrap(), [ListPhase::Loading, ListPhase::Loaded]);
    assert_eq!(filtered_phases.await.unwrap(), [ListPhase::Loading, ListPhase::Loaded]);
    assert_eq!(ids(&all), ["p1"]);
    assert!(ids(&filtered).is_empty());
    assert_eq!(filtered.query().page, 3);
    delete.assert();
}

#[tokio::test]
async fn rejected_update_does_not_invalidate() {
    let server = MockServer::start();
    let list_mock = server.mock(|when, then| {
        when.method(Method::GET).path("/api/patients");
        then.status(200).json_body(patients_json(&["p1"]));
    });
    let update = server.mock(|when, then| {
        when.method(Method::PUT)
            .path("/api/patients/p1")
            .json_body(json!({"fullName": ""}));
        then.status(400).json_body(json!({"error": "fullName is required"}));
    });

    let client = client(&server);
    let coordinator = Coordinator::new();
    let list = Arc::new(ListController::<Patient>::for_resource(
        client.clone(),
        "patients",
        QuerySpec::new(),
    ));
    let _sub = coordinator.register("patients", &list);
    list.refetch().await;
    let before = list.snapshot();

    let mutations = MutationExecutor::new(client).with_coordinator(coordinator);
    let err = mutations
        .update::<_, Patient>("patients", "p1", &json!({"fullName": ""}))
        .await
        .unwrap_err();

    assert_eq!(err.status().map(|s| s.as_u16()), Some(400));
    let after = list.snapshot();
    assert_eq!(after.phase(), ListPhase::Loaded);
    assert!(Arc::ptr_eq(
        match &before {
            clinic_resource::ListState::Loaded(page) => page,
            other => panic!("unexpected {other:?}"),
        },
        match &after {
            clinic_resource::ListState::Loaded(page) => page,
            other => panic!("unexpected {other:?}"),
        },
    ));
    update.assert();
    list_mock.assert_calls(1);
}

#[tokio::test]
async fn removing_missing_id_surfaces_not_found() {
    let server = MockServer::start();
    let list_mock = server.mock(|when, then| {
        when.method(Method::GET).path("/api/patients");
        then.status(200).json_body(patients_json(&["p1"]));
    });
    let _missing = server.mock(|when, then| {
        when.method(Method::DELETE).path("/api/patients/nope");
        then.status(404).json_body(json!({"error": "Patient not found"}));
    });

    let client = client(&server);
    let coordinator = Coordinator::new();
    let list = Arc::new(ListController::<Patient>::for_resource(
        client.clone(),
        "patients",
        QuerySpec::new(),
    ));
    let _sub = coordinator.register("patients", &list);
    list.refetch().await;

    let mutations = MutationExecutor::new(client).with_coordinator(coordinator);
    let err = mutations.remove("patients", "nope").await.unwrap_err();

    assert!(err.is_not_found());
    match &err {
        ResourceError::HttpStatus { body, .. } => {
            assert!(body.as_deref().unwrap_or_default().contains("Patient not found"));
        }
        other => panic!("unexpected {other:?}"),
    }
    list_mock.assert_calls(1);
    assert_eq!(ids(&list), ["p1"]);
}

#[tokio::test]
async fn create_unwraps_named_envelope() {
    let server = MockServer::start();
    let create = server.mock(|when, then| {
        when.method(Method::POST)
            .path("/api/patients")
            .json_body(json!({"fullName": "Siti Aminah"}));
        then.status(201).json_body(json!({
            "message": "Patient created",
            "patient": {"id": "pat-010", "fullName": "Siti Aminah"}
        }));
    });

    let mutations = MutationExecutor::new(client(&server));
    let created: Patient = mutations
        .create("patients", &json!({"fullName": "Siti Aminah"}))
        .await
        .unwrap();

    assert_eq!(created.id, "pat-010");
    create.assert();
}

#[tokio::test]
async fn patch_targets_sub_path() {
    let server = MockServer::start();
    let patch = server.mock(|when, then| {
        when.method(Method::PATCH)
            .path("/api/appointments/apt-7/statusAppoinment")
            .json_body(json!({"status": "done"}));
        then.status(200).json_body(json!({"message": "Status updated"}));
    });

    let mutations = MutationExecutor::new(client(&server));
    let ack: MutationAck = mutations
        .patch("appointments", "apt-7", Some("statusAppoinment"), &json!({"status": "done"}))
        .await
        .unwrap();

    assert_eq!(ack.message, "Status updated");
    patch.assert();
}
