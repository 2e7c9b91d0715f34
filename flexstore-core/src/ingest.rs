//! Normalization of uploaded payloads into bulk insert batches.

use serde_json::value::RawValue;

use crate::error::{DocumentStoreError, DocumentStoreResult};

/// Splits a raw upload into the individual JSON payloads to insert.
///
/// A JSON array yields one item per element, each element kept exactly as it appears
/// in the upload. A single JSON object yields a batch of one. Anything else, including
/// a bare scalar, is rejected.
///
/// # Errors
///
/// Returns `InvalidPayload` if the upload is neither a JSON array nor a JSON object.
pub fn normalize(raw: &[u8]) -> DocumentStoreResult<Vec<Vec<u8>>> {
    if let Ok(items) = serde_json::from_slice::<Vec<Box<RawValue>>>(raw) {
        return Ok(items
            .into_iter()
            .map(|item| item.get().as_bytes().to_vec())
            .collect());
    }

    let not_a_batch = || {
        DocumentStoreError::InvalidPayload(
            "upload must be a JSON array or a JSON object".to_string(),
        )
    };
    let object = serde_json::from_slice::<Box<RawValue>>(raw).map_err(|_| not_a_batch())?;
    // A well-formed raw value is an object exactly when it opens with a brace.
    if !object.get().starts_with('{') {
        return Err(not_a_batch());
    }

    Ok(vec![object.get().as_bytes().to_vec()])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arrays_become_one_item_per_element() {
        let items = normalize(br#"[{"a":1}, {"b": 2}, 3]"#).unwrap();

        assert_eq!(items, vec![br#"{"a":1}"#.to_vec(), br#"{"b": 2}"#.to_vec(), b"3".to_vec()]);
    }

    #[test]
    fn a_single_object_is_a_batch_of_one() {
        let items = normalize(br#"{"a":1}"#).unwrap();

        assert_eq!(items, vec![br#"{"a":1}"#.to_vec()]);
    }

    #[test]
    fn a_single_object_is_kept_verbatim() {
        let raw = br#"{"z":1,"a":12345678901234567890123,"f":1.10}"#;
        let items = normalize(raw).unwrap();

        assert_eq!(items, vec![raw.to_vec()]);
    }

    #[test]
    fn surrounding_whitespace_is_dropped_from_a_single_object() {
        let items = normalize(b"  {\"b\": 2, \"a\": 1}\n").unwrap();

        assert_eq!(items, vec![br#"{"b": 2, "a": 1}"#.to_vec()]);
    }

    #[test]
    fn an_empty_array_is_an_empty_batch() {
        assert!(normalize(b"[]").unwrap().is_empty());
    }

    #[test]
    fn other_inputs_are_rejected() {
        for raw in [&b"not json"[..], b"42", b"\"text\"", b"", b"[{\"a\":1},"] {
            let err = normalize(raw).unwrap_err();
            assert!(matches!(err, DocumentStoreError::InvalidPayload(_)));
        }
    }
}
