use super::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Serializes a value to bytes.
///
/// The wire format is hidden behind this function so callers never depend
/// on it directly.
///
/// # Errors
/// Returns `Error::Serialization` if the value cannot be serialized.
pub fn serialize_value<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    serde_json::to_vec(value).map_err(Error::Serialization)
}

/// Deserializes bytes to a value.
///
/// # Errors
/// Returns `Error::Deserialization` if the bytes cannot be deserialized.
pub fn deserialize_value<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    serde_json::from_slice(bytes).map_err(Error::Deserialization)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let value = vec!["hello".to_string(), "world".to_string()];
        let bytes = serialize_value(&value).unwrap();
        let decoded: Vec<String> = deserialize_value(&bytes).unwrap();
        assert_eq!(value, decoded);
    }

    #[test]
    fn test_decode_garbage() {
        let result: Result<Vec<String>> = deserialize_value(b"not a payload");
        assert!(matches!(result, Err(Error::Deserialization(_))));
    }
}
