use http::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{info, instrument};

use crate::client::ResourceClient;
use crate::coordinator::Coordinator;
use crate::error::ResourceError;
use crate::page::decode_item;

/// Stateless create/update/delete executor.
///
/// With a [`Coordinator`] attached, every successful mutation refetches the
/// lists subscribed to the mutated resource before returning. Failed
/// mutations leave lists alone. No list is ever patched locally.
#[derive(Debug, Clone)]
pub struct MutationExecutor {
    client: ResourceClient,
    coordinator: Option<Coordinator>,
}

impl MutationExecutor {
    #[must_use]
    pub fn new(client: ResourceClient) -> Self {
        Self {
            client,
            coordinator: None,
        }
    }

    #[must_use]
    pub fn with_coordinator(mut self, coordinator: Coordinator) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    #[must_use]
    pub fn client(&self) -> &ResourceClient {
        &self.client
    }

    /// `POST <base>/<resource>`
    ///
    /// # Errors
    /// Transport and status errors from the backend; `Encoding` if `payload`
    /// cannot be serialized; `Decoding` if the created item has another shape.
    pub async fn create<P, T>(&self, resource: &str, payload: &P) -> Result<T, ResourceError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(payload)?;
        let created = self
            .execute(Method::POST, resource, &[], Some(&body))
            .await?;
        decode_item(created)
    }

    /// `POST <base>/<resource>/<segments...>` for actions such as running a
    /// prediction on an assessment.
    ///
    /// # Errors
    /// See [`create`](Self::create).
    pub async fn create_at<P, T>(
        &self,
        resource: &str,
        segments: &[&str],
        payload: Option<&P>,
    ) -> Result<T, ResourceError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = payload.map(encode).transpose()?;
        let created = self
            .execute(Method::POST, resource, segments, body.as_ref())
            .await?;
        decode_item(created)
    }

    /// `PUT <base>/<resource>/<id>`
    ///
    /// # Errors
    /// See [`create`](Self::create).
    pub async fn update<P, T>(&self, resource: &str, id: &str, payload: &P) -> Result<T, ResourceError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(payload)?;
        let updated = self
            .execute(Method::PUT, resource, &[id], Some(&body))
            .await?;
        decode_item(updated)
    }

    /// `PATCH <base>/<resource>/<id>[/<sub_path>]`, a targeted partial update.
    ///
    /// # Errors
    /// See [`create`](Self::create).
    pub async fn patch<P, T>(
        &self,
        resource: &str,
        id: &str,
        sub_path: Option<&str>,
        payload: &P,
    ) -> Result<T, ResourceError>
    where
        P: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = encode(payload)?;
        let segments: Vec<&str> = std::iter::once(id).chain(sub_path).collect();
        let patched = self
            .execute(Method::PATCH, resource, &segments, Some(&body))
            .await?;
        decode_item(patched)
    }

    /// `DELETE <base>/<resource>/<id>`. A missing id surfaces the backend's
    /// status (typically 404) and invalidates nothing.
    ///
    /// # Errors
    /// Transport and status errors from the backend.
    pub async fn remove(&self, resource: &str, id: &str) -> Result<(), ResourceError> {
        self.execute(Method::DELETE, resource, &[id], None)
            .await
            .map(drop)
    }

    #[instrument(skip_all, fields(method = %method, resource = %resource))]
    async fn execute(
        &self,
        method: Method,
        resource: &str,
        tail: &[&str],
        body: Option<&Value>,
    ) -> Result<Value, ResourceError> {
        let segments: Vec<&str> = std::iter::once(resource).chain(tail.iter().copied()).collect();
        let send = self.client.request(method, &segments, body, None);
        let response = match &self.coordinator {
            Some(coordinator) => coordinator.apply(resource, send).await?,
            None => send.await?,
        };
        info!("mutation succeeded");
        Ok(response)
    }
}

fn encode<P: Serialize + ?Sized>(payload: &P) -> Result<Value, ResourceError> {
    serde_json::to_value(payload).map_err(ResourceError::Encoding)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    struct NotJson;

    impl Serialize for NotJson {
        fn serialize<S: serde::Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("not representable"))
        }
    }

    #[test]
    fn encode_reports_serialization_failure() {
        let err = encode(&NotJson).unwrap_err();
        assert!(matches!(err, ResourceError::Encoding(_)));
    }

    #[test]
    fn encode_passes_maps_through() {
        let mut payload = BTreeMap::new();
        payload.insert("status", "done");
        assert_eq!(encode(&payload).unwrap(), serde_json::json!({"status": "done"}));
    }
}
