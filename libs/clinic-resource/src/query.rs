//! Structured list queries and their query-string encodings.
//!
//! [`QuerySpec`] is what a list view asks for; [`QueryBuilder`] turns it into
//! a deterministic [`QueryString`]. Two encodings exist:
//!
//! - [`QueryStyle::Canonical`]: `filters[k]=v&page=..&pageSize=..&sortDirection=..&sortField=..`
//! - [`QueryStyle::Flat`]: the clinic backend's `page`, `limit`, `sort`, `order`
//!   and bare filter keys
//!
//! Both omit empty filters, clamp `page` and `pageSize`, and order keys
//! lexicographically, so structurally equal specs always encode identically.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Page size used when a spec carries none (or a non-positive one).
pub const DEFAULT_PAGE_SIZE: u32 = 10;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortDirection {
    #[default]
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDirection {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Asc => "asc",
            Self::Desc => "desc",
        }
    }

    #[must_use]
    pub fn reverse(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

impl fmt::Display for SortDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Scalar filter value. An empty `Text` means "no filter".
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl FilterValue {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Text(s) if s.is_empty())
    }
}

impl fmt::Display for FilterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<i64> for FilterValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for FilterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// What one list view asks the backend for.
///
/// `page` and `page_size` are signed so out-of-range input can be clamped
/// instead of rejected. Filter keys are passed through opaquely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QuerySpec {
    pub page: i64,
    pub page_size: i64,
    pub filters: BTreeMap<String, FilterValue>,
    pub sort_field: Option<String>,
    pub sort_direction: SortDirection,
}

impl Default for QuerySpec {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: i64::from(DEFAULT_PAGE_SIZE),
            filters: BTreeMap::new(),
            sort_field: None,
            sort_direction: SortDirection::Asc,
        }
    }
}

impl QuerySpec {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(mut self, page: i64) -> Self {
        self.page = page;
        self
    }

    #[must_use]
    pub fn page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set a filter; an empty text value clears it at encoding time.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<FilterValue>) -> Self {
        self.filters.insert(field.into(), value.into());
        self
    }

    #[must_use]
    pub fn sort_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.sort_field = Some(field.into());
        self.sort_direction = direction;
        self
    }

    /// Same spec pointed at another page.
    #[must_use]
    pub fn with_page(&self, page: i64) -> Self {
        self.clone().page(page)
    }

    /// `page` clamped to `>= 1`.
    #[must_use]
    pub fn effective_page(&self) -> u32 {
        u32::try_from(self.page.max(1)).unwrap_or(u32::MAX)
    }

    /// `page_size`, or `default` when it is below 1.
    #[must_use]
    pub fn effective_page_size(&self, default: u32) -> u32 {
        if self.page_size < 1 {
            default.max(1)
        } else {
            u32::try_from(self.page_size).unwrap_or(u32::MAX)
        }
    }

    /// Clamped copy with empty filters dropped. Two specs that encode to the
    /// same query string normalize to equal values.
    #[must_use]
    pub fn normalized(&self, default_page_size: u32) -> Self {
        self.clone().into_normalized(default_page_size)
    }

    /// Consuming form of [`normalized`](Self::normalized).
    #[must_use]
    pub fn into_normalized(self, default_page_size: u32) -> Self {
        let page = i64::from(self.effective_page());
        let page_size = i64::from(self.effective_page_size(default_page_size));
        let sort_field = self.sort_field.filter(|f| !f.is_empty());
        Self {
            page,
            page_size,
            filters: self
                .filters
                .into_iter()
                .filter(|(_, v)| !v.is_empty())
                .collect(),
            sort_direction: if sort_field.is_some() {
                self.sort_direction
            } else {
                SortDirection::Asc
            },
            sort_field,
        }
    }

    fn active_filters(&self) -> impl Iterator<Item = (&str, &FilterValue)> {
        self.filters
            .iter()
            .filter(|(_, v)| !v.is_empty())
            .map(|(k, v)| (k.as_str(), v))
    }

    fn active_sort_field(&self) -> Option<&str> {
        self.sort_field.as_deref().filter(|f| !f.is_empty())
    }
}

/// Encoded query string, without the leading `?`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QueryString(String);

impl QueryString {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for QueryString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for QueryString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryStyle {
    #[default]
    Canonical,
    Flat,
}

/// Parameter names used by [`QueryStyle::Flat`].
///
/// The clinic backend uses `sort`/`order` for most collections and
/// `sortBy`/`sortOrder` for predictions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlatKeys {
    pub page: String,
    pub page_size: String,
    pub sort_field: String,
    pub sort_direction: String,
}

impl Default for FlatKeys {
    fn default() -> Self {
        Self {
            page: "page".to_owned(),
            page_size: "limit".to_owned(),
            sort_field: "sort".to_owned(),
            sort_direction: "order".to_owned(),
        }
    }
}

impl FlatKeys {
    #[must_use]
    pub fn with_sort_keys(mut self, field: impl Into<String>, direction: impl Into<String>) -> Self {
        self.sort_field = field.into();
        self.sort_direction = direction.into();
        self
    }
}

/// Deterministic `QuerySpec` → `QueryString` encoder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryBuilder {
    style: QueryStyle,
    default_page_size: u32,
    flat_keys: FlatKeys,
}

impl Default for QueryBuilder {
    fn default() -> Self {
        Self::canonical()
    }
}

impl QueryBuilder {
    #[must_use]
    pub fn new(style: QueryStyle) -> Self {
        Self {
            style,
            default_page_size: DEFAULT_PAGE_SIZE,
            flat_keys: FlatKeys::default(),
        }
    }

    #[must_use]
    pub fn canonical() -> Self {
        Self::new(QueryStyle::Canonical)
    }

    #[must_use]
    pub fn flat() -> Self {
        Self::new(QueryStyle::Flat)
    }

    /// Fallback for non-positive page sizes; 0 keeps [`DEFAULT_PAGE_SIZE`].
    #[must_use]
    pub fn with_default_page_size(mut self, size: u32) -> Self {
        if size > 0 {
            self.default_page_size = size;
        }
        self
    }

    #[must_use]
    pub fn with_flat_keys(mut self, keys: FlatKeys) -> Self {
        self.flat_keys = keys;
        self
    }

    #[must_use]
    pub fn style(&self) -> QueryStyle {
        self.style
    }

    #[must_use]
    pub fn default_page_size(&self) -> u32 {
        self.default_page_size
    }

    /// Encode `spec`. Never fails: out-of-range paging is clamped.
    #[must_use]
    pub fn build(&self, spec: &QuerySpec) -> QueryString {
        // BTreeMap gives the lexicographic key order
        let mut pairs: BTreeMap<String, String> = BTreeMap::new();

        match self.style {
            QueryStyle::Canonical => {
                for (field, value) in spec.active_filters() {
                    pairs.insert(
                        format!("filters[{}]", urlencoding::encode(field)),
                        value.to_string(),
                    );
                }
                pairs.insert("page".to_owned(), spec.effective_page().to_string());
                pairs.insert(
                    "pageSize".to_owned(),
                    spec.effective_page_size(self.default_page_size).to_string(),
                );
                if let Some(field) = spec.active_sort_field() {
                    pairs.insert("sortField".to_owned(), field.to_owned());
                    pairs.insert(
                        "sortDirection".to_owned(),
                        spec.sort_direction.as_str().to_owned(),
                    );
                }
            }
            QueryStyle::Flat => {
                let keys = &self.flat_keys;
                for (field, value) in spec.active_filters() {
                    pairs.insert(urlencoding::encode(field).into_owned(), value.to_string());
                }
                // Paging and sort keys win over a filter of the same name
                pairs.insert(keys.page.clone(), spec.effective_page().to_string());
                pairs.insert(
                    keys.page_size.clone(),
                    spec.effective_page_size(self.default_page_size).to_string(),
                );
                if let Some(field) = spec.active_sort_field() {
                    pairs.insert(keys.sort_field.clone(), field.to_owned());
                    pairs.insert(
                        keys.sort_direction.clone(),
                        spec.sort_direction.as_str().to_owned(),
                    );
                }
            }
        }

        let encoded = pairs
            .iter()
            .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");
        QueryString(encoded)
    }
}

/// Canonical encoding with the default page size.
#[must_use]
pub fn build(spec: &QuerySpec) -> QueryString {
    QueryBuilder::canonical().build(spec)
}
