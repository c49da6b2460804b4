#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![warn(warnings)]

//! Paginated resource client for the clinic REST backend.
//!
//! - [`QueryBuilder`] turns a [`QuerySpec`] into a deterministic query string
//! - [`ResourceClient`] executes JSON requests under the configured base URL
//! - [`ListController`] owns the fetch lifecycle of one list and publishes
//!   [`ListState`] snapshots; the latest issued fetch always wins
//! - [`MutationExecutor`] creates, updates and removes items
//! - [`Coordinator`] refetches the affected lists after a successful mutation
//!
//! ```ignore
//! let http = HttpClient::builder().with_credentials(session).build()?;
//! let client = ResourceClient::new(http, &ResourceClientConfig::clinic_backend(base))?;
//! let coordinator = Coordinator::new();
//!
//! let patients = Arc::new(ListController::<Patient>::for_resource(
//!     client.clone(), "patients", QuerySpec::new().filter("gender", "female"),
//! ));
//! let _sub = coordinator.register("patients", &patients);
//! patients.refetch().await;
//!
//! let mutations = MutationExecutor::new(client).with_coordinator(coordinator);
//! mutations.remove("patients", "pat-001").await?; // `patients` refetches
//! ```

pub mod client;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod list;
pub mod mutation;
pub mod page;
pub mod query;

pub use client::ResourceClient;
pub use config::ResourceClientConfig;
pub use coordinator::{Coordinator, Invalidate, Subscription};
pub use error::ResourceError;
pub use list::{FetchOutcome, ListController, ListPhase, ListState, PageFetcher};
pub use mutation::MutationExecutor;
pub use page::{MutationAck, PageResult, decode_item, decode_list};
pub use query::{
    DEFAULT_PAGE_SIZE, FilterValue, FlatKeys, QueryBuilder, QuerySpec, QueryString, QueryStyle,
    SortDirection,
};
