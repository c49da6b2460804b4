use std::fmt;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

use crate::client::ResourceClient;
use crate::error::ResourceError;
use crate::page::PageResult;
use crate::query::{DEFAULT_PAGE_SIZE, QuerySpec};

/// Lifecycle phase of a [`ListState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListPhase {
    Idle,
    Loading,
    Loaded,
    Failed,
}

/// What a list controller currently shows.
///
/// Pages are shared behind `Arc`, so snapshots are cheap and `T` does not
/// have to be `Clone`.
pub enum ListState<T> {
    Idle,
    /// A fetch is in flight; `previous` is the last successful page, if any
    Loading {
        previous: Option<Arc<PageResult<T>>>,
    },
    Loaded(Arc<PageResult<T>>),
    /// The latest fetch failed; `previous` stays visible
    Failed {
        error: Arc<ResourceError>,
        previous: Option<Arc<PageResult<T>>>,
    },
}

impl<T> Clone for ListState<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Idle => Self::Idle,
            Self::Loading { previous } => Self::Loading {
                previous: previous.clone(),
            },
            Self::Loaded(page) => Self::Loaded(Arc::clone(page)),
            Self::Failed { error, previous } => Self::Failed {
                error: Arc::clone(error),
                previous: previous.clone(),
            },
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for ListState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => f.write_str("Idle"),
            Self::Loading { previous } => f.debug_struct("Loading").field("previous", previous).finish(),
            Self::Loaded(page) => f.debug_tuple("Loaded").field(page).finish(),
            Self::Failed { error, previous } => f
                .debug_struct("Failed")
                .field("error", error)
                .field("previous", previous)
                .finish(),
        }
    }
}

impl<T> ListState<T> {
    #[must_use]
    pub fn phase(&self) -> ListPhase {
        match self {
            Self::Idle => ListPhase::Idle,
            Self::Loading { .. } => ListPhase::Loading,
            Self::Loaded(_) => ListPhase::Loaded,
            Self::Failed { .. } => ListPhase::Failed,
        }
    }

    /// The page to display: the loaded one, or the retained previous one.
    #[must_use]
    pub fn data(&self) -> Option<&PageResult<T>> {
        match self {
            Self::Idle => None,
            Self::Loaded(page) => Some(page),
            Self::Loading { previous } | Self::Failed { previous, .. } => previous.as_deref(),
        }
    }

    #[must_use]
    pub fn error(&self) -> Option<&ResourceError> {
        match self {
            Self::Failed { error, .. } => Some(error),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }
}

/// Result of one fetch cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The response was the latest issued and is now `Loaded`
    Applied,
    /// The response was the latest issued and is now `Failed`
    Failed,
    /// A newer fetch was issued meanwhile; this response was dropped
    Superseded,
    /// The query did not change and its page is already loaded
    Unchanged,
}

/// Loads one page for a query. Usually [`ResourceClient::list`].
pub type PageFetcher<T> =
    Arc<dyn Fn(QuerySpec) -> BoxFuture<'static, Result<PageResult<T>, ResourceError>> + Send + Sync>;

struct Inner<T> {
    query: QuerySpec,
    issued: u64,
    last_success: Option<Arc<PageResult<T>>>,
    /// Query behind the current `Loaded` state
    applied: Option<QuerySpec>,
    /// Last non-`Loading` state, shown again if a fetch is abandoned
    settled: ListState<T>,
}

/// Puts back the settled state when a fetch future is dropped before its
/// response arrives, so `Loading` never outlives the request.
struct AbandonGuard<'a, T> {
    controller: &'a ListController<T>,
    seq: u64,
    armed: bool,
}

impl<T> Drop for AbandonGuard<'_, T> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let inner = self.controller.inner.lock();
        if inner.issued == self.seq {
            debug!(resource = %self.controller.resource, seq = self.seq, "fetch abandoned");
            self.controller.state.send_replace(inner.settled.clone());
        }
    }
}

/// Owns the fetch lifecycle and [`ListState`] of one resource list.
///
/// Every fetch is tagged with a sequence number; only the response of the
/// most recently issued fetch may change the state. Older requests are not
/// cancelled, their results are discarded.
///
/// Share it as `Arc<ListController<T>>`; all methods take `&self`.
pub struct ListController<T> {
    resource: String,
    fetcher: PageFetcher<T>,
    default_page_size: u32,
    inner: Mutex<Inner<T>>,
    state: watch::Sender<ListState<T>>,
}

impl<T> fmt::Debug for ListController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListController")
            .field("resource", &self.resource)
            .field("phase", &self.state.borrow().phase())
            .finish_non_exhaustive()
    }
}

impl<T> ListController<T>
where
    T: Send + Sync + 'static,
{
    /// Create an idle controller. Nothing is fetched until
    /// [`refetch`](Self::refetch) or [`set_query`](Self::set_query).
    #[must_use]
    pub fn new(resource: impl Into<String>, initial: QuerySpec, fetcher: PageFetcher<T>) -> Self {
        Self::with_page_size(resource, initial, DEFAULT_PAGE_SIZE, fetcher)
    }

    #[must_use]
    pub fn with_page_size(
        resource: impl Into<String>,
        initial: QuerySpec,
        default_page_size: u32,
        fetcher: PageFetcher<T>,
    ) -> Self {
        let default_page_size = default_page_size.max(1);
        let (state, _) = watch::channel(ListState::Idle);
        Self {
            resource: resource.into(),
            fetcher,
            default_page_size,
            inner: Mutex::new(Inner {
                query: initial.into_normalized(default_page_size),
                issued: 0,
                last_success: None,
                applied: None,
                settled: ListState::Idle,
            }),
            state,
        }
    }

    /// Controller that pages `resource` through `client`.
    #[must_use]
    pub fn for_resource(client: ResourceClient, resource: impl Into<String>, initial: QuerySpec) -> Self
    where
        T: DeserializeOwned,
    {
        let resource = resource.into();
        let page_size = client.query_builder().default_page_size();
        let name = resource.clone();
        let fetcher: PageFetcher<T> = Arc::new(move |spec: QuerySpec| {
            let client = client.clone();
            let name = name.clone();
            async move { client.list::<T>(&name, &spec).await }.boxed()
        });
        Self::with_page_size(resource, initial, page_size, fetcher)
    }

    #[must_use]
    pub fn resource(&self) -> &str {
        &self.resource
    }

    /// Current query, normalized.
    #[must_use]
    pub fn query(&self) -> QuerySpec {
        self.inner.lock().query.clone()
    }

    #[must_use]
    pub fn snapshot(&self) -> ListState<T> {
        self.state.borrow().clone()
    }

    /// Observe every state transition.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ListState<T>> {
        self.state.subscribe()
    }

    /// Switch to `spec` and fetch it.
    ///
    /// A spec equal to the one already loaded (after normalization) is a
    /// no-op.
    ///
    /// Dropping the returned future before it resolves abandons the fetch:
    /// the state goes back to what it was before, and a later call for the
    /// same spec fetches again.
    pub async fn set_query(&self, spec: QuerySpec) -> FetchOutcome {
        let spec = spec.into_normalized(self.default_page_size);
        let seq = {
            let mut inner = self.inner.lock();
            let loaded = self.state.borrow().phase() == ListPhase::Loaded;
            if loaded && inner.applied.as_ref() == Some(&spec) {
                return FetchOutcome::Unchanged;
            }
            inner.query = spec.clone();
            self.begin(&mut inner)
        };
        self.complete(seq, spec).await
    }

    /// Re-run the current query, keeping the displayed page until it lands.
    pub async fn refetch(&self) -> FetchOutcome {
        let (seq, spec) = {
            let mut inner = self.inner.lock();
            let seq = self.begin(&mut inner);
            (seq, inner.query.clone())
        };
        self.complete(seq, spec).await
    }

    fn begin(&self, inner: &mut Inner<T>) -> u64 {
        inner.issued += 1;
        self.state.send_replace(ListState::Loading {
            previous: inner.last_success.clone(),
        });
        inner.issued
    }

    #[instrument(skip_all, fields(resource = %self.resource, seq = seq, page = spec.page))]
    async fn complete(&self, seq: u64, spec: QuerySpec) -> FetchOutcome {
        let mut guard = AbandonGuard {
            controller: self,
            seq,
            armed: true,
        };
        let result = (self.fetcher)(spec.clone()).await;
        guard.armed = false;

        let mut inner = self.inner.lock();
        if seq != inner.issued {
            debug!(latest = inner.issued, "discarding superseded response");
            return FetchOutcome::Superseded;
        }

        match result {
            Ok(page) => {
                let page = Arc::new(page);
                inner.last_success = Some(Arc::clone(&page));
                inner.applied = Some(spec);
                inner.settled = ListState::Loaded(Arc::clone(&page));
                self.state.send_replace(ListState::Loaded(page));
                FetchOutcome::Applied
            }
            Err(error) => {
                warn!(error = %error, "list fetch failed");
                let failed = ListState::Failed {
                    error: Arc::new(error),
                    previous: inner.last_success.clone(),
                };
                inner.settled = failed.clone();
                self.state.send_replace(failed);
                FetchOutcome::Failed
            }
        }
    }
}
