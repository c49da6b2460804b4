use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::ResourceError;

/// One page of a collection as the backend reported it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageResult<T> {
    pub items: Vec<T>,
    /// Always `>= 1`, even for an empty collection
    pub total_pages: u32,
    /// Always `>= 1`
    pub current_page: u32,
    /// Total item count, when the backend reports it
    pub total: Option<u64>,
}

impl<T> PageResult<T> {
    /// A complete, unpaginated collection presented as page 1 of 1.
    #[must_use]
    pub fn single_page(items: Vec<T>) -> Self {
        Self {
            total: u64::try_from(items.len()).ok(),
            items,
            total_pages: 1,
            current_page: 1,
        }
    }

    #[must_use]
    pub fn has_next(&self) -> bool {
        self.current_page < self.total_pages
    }

    #[must_use]
    pub fn has_previous(&self) -> bool {
        self.current_page > 1
    }
}

fn positive_u32(value: Option<&Value>) -> Option<u32> {
    value
        .and_then(Value::as_i64)
        .filter(|n| *n >= 1)
        .and_then(|n| u32::try_from(n).ok())
}

/// Decode a list envelope `{data, totalPages, page?, total?, limit?}`.
///
/// `data: null` is an empty page. A missing or zero `totalPages` is 1.
/// `currentPage` comes from `page` when present, else `requested_page`.
///
/// # Errors
/// Returns `ResourceError::Decoding` when the body is not an object, `data`
/// is missing or not an array, or an item does not match `T`.
pub fn decode_list<T: DeserializeOwned>(
    body: Value,
    requested_page: u32,
) -> Result<PageResult<T>, ResourceError> {
    let Value::Object(mut obj) = body else {
        return Err(ResourceError::Decoding(format!(
            "list response is not an object: {}",
            json_kind(&body)
        )));
    };

    let items = match obj.remove("data") {
        None => {
            return Err(ResourceError::Decoding(
                "list response has no `data` field".to_owned(),
            ));
        }
        Some(Value::Null) => Vec::new(),
        Some(data @ Value::Array(_)) => serde_json::from_value(data)?,
        Some(other) => {
            return Err(ResourceError::Decoding(format!(
                "list `data` is {}, expected array",
                json_kind(&other)
            )));
        }
    };

    Ok(PageResult {
        items,
        total_pages: positive_u32(obj.get("totalPages")).unwrap_or(1),
        current_page: positive_u32(obj.get("page")).unwrap_or(requested_page.max(1)),
        total: obj.get("total").and_then(Value::as_u64),
    })
}

/// Decode a single-item response that may or may not be wrapped.
///
/// Tried in order: the bare body, its `data` field, then the only
/// object-valued field other than `message` (`{message, patient: {...}}`).
///
/// # Errors
/// Returns `ResourceError::Decoding` with the bare-body error when no
/// candidate matches `T`.
pub fn decode_item<T: DeserializeOwned>(body: Value) -> Result<T, ResourceError> {
    let bare_err = match serde_json::from_value::<T>(body.clone()) {
        Ok(item) => return Ok(item),
        Err(e) => e,
    };

    if let Value::Object(mut obj) = body {
        if let Some(data) = obj.remove("data") {
            return serde_json::from_value(data).map_err(Into::into);
        }

        let mut wrapped = obj
            .into_iter()
            .filter(|(key, value)| key != "message" && value.is_object());
        if let (Some((_, inner)), None) = (wrapped.next(), wrapped.next()) {
            return serde_json::from_value(inner).map_err(Into::into);
        }
    }

    Err(bare_err.into())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Acknowledgement-only mutation response, e.g. `{"message": "Status updated"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MutationAck {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: String,
    }

    #[test]
    fn list_envelope_full() {
        let body = json!({
            "data": [{"id": "p1"}, {"id": "p2"}],
            "total": 12, "page": 2, "limit": 10, "totalPages": 2
        });
        let page: PageResult<Item> = decode_list(body, 1).unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.total, Some(12));
        assert!(!page.has_next());
        assert!(page.has_previous());
    }

    #[test]
    fn list_null_data_is_empty() {
        let page: PageResult<Item> = decode_list(json!({"data": null, "totalPages": 0}), 3).unwrap();
        assert!(page.items.is_empty());
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 3);
    }

    #[test]
    fn list_missing_total_pages_is_one() {
        let page: PageResult<Item> = decode_list(json!({"data": []}), 0).unwrap();
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.current_page, 1);
        assert_eq!(page.total, None);
    }

    #[test]
    fn list_missing_data_is_decoding_error() {
        let err = decode_list::<Item>(json!({"items": []}), 1).unwrap_err();
        assert!(matches!(err, ResourceError::Decoding(_)));
        let err = decode_list::<Item>(json!({"data": {"id": "x"}}), 1).unwrap_err();
        assert!(matches!(err, ResourceError::Decoding(_)));
        let err = decode_list::<Item>(json!([{"id": "x"}]), 1).unwrap_err();
        assert!(matches!(err, ResourceError::Decoding(_)));
    }

    #[test]
    fn list_item_shape_mismatch_is_decoding_error() {
        let err = decode_list::<Item>(json!({"data": [{"name": "x"}]}), 1).unwrap_err();
        assert!(matches!(err, ResourceError::Decoding(_)));
    }

    #[test]
    fn item_bare_and_wrapped() {
        let bare: Item = decode_item(json!({"id": "u1"})).unwrap();
        assert_eq!(bare.id, "u1");

        let data: Item = decode_item(json!({"data": {"id": "a1"}})).unwrap();
        assert_eq!(data.id, "a1");

        let named: Item = decode_item(json!({
            "message": "Appointment created",
            "appointment": {"id": "apt-1"}
        }))
        .unwrap();
        assert_eq!(named.id, "apt-1");
    }

    #[test]
    fn item_ambiguous_wrapper_fails() {
        let err = decode_item::<Item>(json!({
            "message": "x", "patient": {"id": "p"}, "user": {"id": "u"}
        }))
        .unwrap_err();
        assert!(matches!(err, ResourceError::Decoding(_)));
    }

    #[test]
    fn ack_decodes_message_only_bodies() {
        let ack: MutationAck = decode_item(json!({"message": "Status updated"})).unwrap();
        assert_eq!(ack.message, "Status updated");
        let empty: MutationAck = decode_item(Value::Null).unwrap_or_default();
        assert_eq!(empty, MutationAck::default());
    }

    #[test]
    fn single_page_wraps_plain_array() {
        let page = PageResult::single_page(vec![1, 2, 3]);
        assert_eq!(page.total_pages, 1);
        assert_eq!(page.total, Some(3));
        assert!(!page.has_next());
    }
}
