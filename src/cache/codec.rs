//! Value Codec Module
//!
//! Converts application values to the bytes stored by the transport and back.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::CodecError;

// == Codec ==
/// Encode/decode contract between application values and stored bytes.
pub trait Codec: Send + Sync + 'static {
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>, CodecError>;

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, CodecError>;
}

// == Json Codec ==
/// Stores values as JSON documents.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(Box::new(e)))
    }

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(Box::new(e)))
    }
}

// == String Codec ==
/// Stores string values as their raw UTF-8 bytes, readable by clients that
/// write plain strings with `SET`. Values that do not serialize to a string
/// are refused.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringCodec;

impl Codec for StringCodec {
    fn encode<V: Serialize + ?Sized>(&self, value: &V) -> Result<Vec<u8>, CodecError> {
        match serde_json::to_value(value) {
            Ok(Value::String(s)) => Ok(s.into_bytes()),
            Ok(other) => Err(CodecError::Encode(
                format!("expected a string value, got {}", kind(&other)).into(),
            )),
            Err(e) => Err(CodecError::Encode(Box::new(e))),
        }
    }

    fn decode<V: DeserializeOwned>(&self, bytes: &[u8]) -> Result<V, CodecError> {
        let s = std::str::from_utf8(bytes).map_err(|e| CodecError::Decode(Box::new(e)))?;
        serde_json::from_value(Value::String(s.to_owned()))
            .map_err(|e| CodecError::Decode(Box::new(e)))
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::{Deserialize, Serializer};

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Profile {
        name: String,
        visits: u32,
    }

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _: S) -> Result<S::Ok, S::Error> {
            Err(S::Error::custom("refusing to serialize"))
        }
    }

    #[test]
    fn test_json_structured_value() {
        let profile = Profile {
            name: "ada".to_string(),
            visits: 3,
        };
        let bytes = JsonCodec.encode(&profile).unwrap();
        assert_eq!(bytes, br#"{"name":"ada","visits":3}"#.to_vec());
        let decoded: Profile = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, profile);
    }

    #[test]
    fn test_json_empty_string() {
        let bytes = JsonCodec.encode("").unwrap();
        assert_eq!(bytes, b"\"\"".to_vec());
        let decoded: String = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, "");
    }

    #[test]
    fn test_encode_failure() {
        let err = JsonCodec.encode(&Unserializable).unwrap_err();
        assert!(matches!(err, CodecError::Encode(_)));
    }

    #[test]
    fn test_decode_failure() {
        let err = JsonCodec.decode::<Profile>(b"testvalue").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }

    #[test]
    fn test_string_codec_is_raw() {
        let bytes = StringCodec.encode("testvalue").unwrap();
        assert_eq!(bytes, b"testvalue".to_vec());
        let decoded: String = StringCodec.decode(b"testvalue").unwrap();
        assert_eq!(decoded, "testvalue");

        let empty: String = StringCodec.decode(b"").unwrap();
        assert_eq!(empty, "");
    }

    #[test]
    fn test_string_codec_refuses_non_strings() {
        let err = StringCodec.encode(&42u32).unwrap_err();
        assert!(matches!(err, CodecError::Encode(_)));
        assert!(err.to_string().contains("a number"));

        let err = StringCodec.decode::<String>(&[0xff, 0xfe]).unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
        let err = StringCodec.decode::<u64>(b"12").unwrap_err();
        assert!(matches!(err, CodecError::Decode(_)));
    }
}
