use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;
use clinic_http::HttpClient;
use clinic_resource::{
    Coordinator, ListController, MutationAck, MutationExecutor, PageFetcher, PageResult,
    QueryBuilder, QuerySpec, ResourceClient, ResourceClientConfig, ResourceError, Subscription,
};
use futures::FutureExt;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::api::ClinicApi;
use crate::models::{Appointment, AppointmentStatus, Assessment, PatientAppointment, Prediction};
use crate::requests::StatusChange;
use crate::resource::{APPOINTMENTS, ASSESSMENTS, PREDICTIONS, Resource};

/// A list controller kept in sync with mutations made through the same
/// [`ClinicClient`]. Dropping it unsubscribes.
pub struct WatchedList<R> {
    controller: Arc<ListController<R>>,
    _subscription: Subscription,
}

impl<R> WatchedList<R> {
    #[must_use]
    pub fn controller(&self) -> &Arc<ListController<R>> {
        &self.controller
    }
}

impl<R> Deref for WatchedList<R> {
    type Target = ListController<R>;

    fn deref(&self) -> &Self::Target {
        &self.controller
    }
}

/// Typed client for the clinic REST API.
///
/// Every mutation made through it refetches the watched lists of the
/// mutated resource.
#[derive(Debug, Clone)]
pub struct ClinicClient {
    resources: ResourceClient,
    mutations: MutationExecutor,
    coordinator: Coordinator,
}

impl ClinicClient {
    /// `http` should carry the credential layer; see
    /// `clinic_auth::HttpClientBuilderExt::with_credentials`.
    ///
    /// # Errors
    /// Returns `InvalidBaseUrl`/`InvalidPath` for an unusable `config.base_url`.
    pub fn new(http: HttpClient, config: &ResourceClientConfig) -> Result<Self, ResourceError> {
        let resources = ResourceClient::new(http, config)?;
        let coordinator = Coordinator::new();
        let mutations = MutationExecutor::new(resources.clone()).with_coordinator(coordinator.clone());
        Ok(Self {
            resources,
            mutations,
            coordinator,
        })
    }

    #[must_use]
    pub fn resources(&self) -> &ResourceClient {
        &self.resources
    }

    #[must_use]
    pub fn mutations(&self) -> &MutationExecutor {
        &self.mutations
    }

    #[must_use]
    pub fn coordinator(&self) -> &Coordinator {
        &self.coordinator
    }

    fn query_builder<R: Resource>(&self) -> QueryBuilder {
        self.resources
            .query_builder()
            .clone()
            .with_flat_keys(R::flat_keys())
    }

    /// # Errors
    /// Transport, status and decoding errors.
    pub async fn list<R: Resource>(&self, spec: &QuerySpec) -> Result<PageResult<R>, ResourceError> {
        self.resources
            .list_with(&self.query_builder::<R>(), R::NAME, spec)
            .await
    }

    /// # Errors
    /// `HttpStatus{404}` for an unknown id, plus transport and decoding errors.
    pub async fn get<R: Resource>(&self, id: &str) -> Result<R, ResourceError> {
        self.resources.get(R::NAME, id).await
    }

    /// # Errors
    /// Validation failures come back as `HttpStatus{400}`.
    pub async fn create<R, P>(&self, payload: &P) -> Result<R, ResourceError>
    where
        R: Resource,
        P: Serialize + Sync + ?Sized,
    {
        self.mutations.create(R::NAME, payload).await
    }

    /// # Errors
    /// `HttpStatus{404}` for an unknown id, `HttpStatus{400}` for invalid input.
    pub async fn update<R, P>(&self, id: &str, payload: &P) -> Result<R::Updated, ResourceError>
    where
        R: Resource,
        P: Serialize + Sync + ?Sized,
    {
        self.mutations.update(R::NAME, id, payload).await
    }

    /// # Errors
    /// `HttpStatus{404}` for an unknown id.
    pub async fn remove<R: Resource>(&self, id: &str) -> Result<(), ResourceError> {
        self.mutations.remove(R::NAME, id).await
    }

    /// Idle list controller for `R`, refetched after every successful
    /// mutation of `R` made through this client.
    #[must_use]
    pub fn watch<R: Resource>(&self, initial: QuerySpec) -> WatchedList<R> {
        let resources = self.resources.clone();
        let builder = self.query_builder::<R>();
        let page_size = builder.default_page_size();
        let fetcher: PageFetcher<R> = Arc::new(move |spec: QuerySpec| {
            let resources = resources.clone();
            let builder = builder.clone();
            async move { resources.list_with::<R>(&builder, R::NAME, &spec).await }.boxed()
        });

        let controller = Arc::new(ListController::with_page_size(
            R::NAME,
            initial,
            page_size,
            fetcher,
        ));
        let subscription = self.coordinator.register(R::NAME, &controller);
        WatchedList {
            controller,
            _subscription: subscription,
        }
    }

    async fn get_array<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<Vec<T>, ResourceError> {
        // nil slices arrive as `null`
        let rows: Option<Vec<T>> = self.resources.get_nested(segments).await?;
        Ok(rows.unwrap_or_default())
    }
}

#[async_trait]
impl ClinicApi for ClinicClient {
    async fn change_appointment_status(
        &self,
        appointment_id: &str,
        status: AppointmentStatus,
    ) -> Result<MutationAck, ResourceError> {
        self.mutations
            .patch(
                APPOINTMENTS,
                appointment_id,
                Some("statusAppoinment"),
                &StatusChange { status },
            )
            .await
    }

    async fn appointments_for_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<PatientAppointment>, ResourceError> {
        self.get_array(&[APPOINTMENTS, "appoinmentPatient", patient_id])
            .await
    }

    async fn appointments_for_user(&self, user_id: &str) -> Result<Vec<Appointment>, ResourceError> {
        self.get_array(&[APPOINTMENTS, "appoinmentUser", user_id]).await
    }

    async fn assessments_for_patient(&self, patient_id: &str) -> Result<Vec<Assessment>, ResourceError> {
        self.get_array(&[ASSESSMENTS, "byPatient", patient_id]).await
    }

    async fn run_prediction(&self, assessment_id: &str) -> Result<Prediction, ResourceError> {
        let prediction: Prediction = self
            .mutations
            .create_at::<Value, _>(PREDICTIONS, &[assessment_id], None)
            .await?;
        // assessments embed their prediction
        let refreshed = self.coordinator.after_mutation(ASSESSMENTS).await;
        debug!(refreshed, "assessment lists refreshed after prediction");
        Ok(prediction)
    }

    async fn prediction_for_assessment(&self, assessment_id: &str) -> Result<Prediction, ResourceError> {
        self.resources
            .get_nested(&[PREDICTIONS, "assessment", assessment_id])
            .await
    }
}
