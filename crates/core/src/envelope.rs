//! Backend response envelope.
//!
//! Both backend generations wrap payloads as
//! `{ status, message, data, total }`, and a response can be HTTP 200 while
//! still carrying `status: false`. [`Envelope::into_result`] is the single
//! place that shape is inspected; everything downstream works with
//! `Result<Payload<T>, EnvelopeError>`.

use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;

/// Message used when the backend reports a failure without saying why.
pub const GENERIC_FAILURE: &str = "Something went wrong, please try again";

/// Raw response wrapper as sent by the backend.
///
/// `data` stays untyped until `status` has been checked: failed responses
/// often carry a `data` of some other shape.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    /// Logical success flag; v2 responses call it `success`.
    #[serde(alias = "success")]
    pub status: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
    #[serde(default)]
    pub total: Option<u64>,
}

/// Successful envelope contents.
#[derive(Debug, Clone, PartialEq)]
pub struct Payload<T> {
    pub data: Option<T>,
    pub total: Option<u64>,
    pub message: Option<String>,
}

/// Logical failures carried inside a transport-level success.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnvelopeError {
    /// The backend set `status: false`.
    #[error("{0}")]
    Logical(String),
    /// The backend reported success but sent no payload where one is required.
    #[error("response did not include any data")]
    MissingData,
    /// `data` of a successful response did not match the expected type.
    #[error("{0}")]
    Decode(String),
}

impl Envelope {
    /// Convert the envelope into a discriminated result, decoding `data`
    /// only once `status` says the call succeeded.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::Logical`] when `status` is false, using the
    /// backend's message or [`GENERIC_FAILURE`] when the message is blank,
    /// and [`EnvelopeError::Decode`] when `data` is not a `T`.
    pub fn into_result<T: DeserializeOwned>(self) -> Result<Payload<T>, EnvelopeError> {
        if !self.status {
            let message = self
                .message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(EnvelopeError::Logical(message));
        }

        let data = match self.data {
            None | Some(Value::Null) => None,
            Some(value) => Some(
                serde_json::from_value(value).map_err(|e| EnvelopeError::Decode(e.to_string()))?,
            ),
        };

        Ok(Payload {
            data,
            total: self.total,
            message: self.message,
        })
    }
}

impl<T> Payload<T> {
    /// Take the payload data, failing if the backend omitted it.
    ///
    /// # Errors
    ///
    /// Returns [`EnvelopeError::MissingData`] if `data` was absent or null.
    pub fn require_data(self) -> Result<T, EnvelopeError> {
        self.data.ok_or(EnvelopeError::MissingData)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_true_is_ok() {
        let envelope: Envelope =
            serde_json::from_value(json!({"status": true, "data": [1, 2], "total": 9})).unwrap();
        let payload = envelope.into_result::<Vec<u32>>().unwrap();
        assert_eq!(payload.data, Some(vec![1, 2]));
        assert_eq!(payload.total, Some(9));
    }

    #[test]
    fn test_status_false_is_logical_error() {
        let envelope: Envelope =
            serde_json::from_value(json!({"status": false, "message": "not found"})).unwrap();
        assert_eq!(
            envelope.into_result::<Value>(),
            Err(EnvelopeError::Logical("not found".to_string()))
        );
    }

    #[test]
    fn test_blank_message_falls_back_to_generic() {
        let envelope: Envelope =
            serde_json::from_value(json!({"status": false, "message": "  "})).unwrap();
        assert_eq!(
            envelope.into_result::<Value>(),
            Err(EnvelopeError::Logical(GENERIC_FAILURE.to_string()))
        );
    }

    #[test]
    fn test_success_alias_for_v2() {
        let envelope: Envelope =
            serde_json::from_value(json!({"success": true, "data": {"accessToken": "t"}}))
                .unwrap();
        assert!(envelope.into_result::<Value>().is_ok());
    }

    #[test]
    fn test_require_data() {
        let envelope: Envelope =
            serde_json::from_value(json!({"status": true, "data": null})).unwrap();
        assert_eq!(
            envelope.into_result::<String>().unwrap().require_data(),
            Err(EnvelopeError::MissingData)
        );
    }

    #[test]
    fn test_failure_message_survives_mismatched_data() {
        let envelope: Envelope = serde_json::from_value(json!({
            "status": false,
            "message": "Token invalid for tenant",
            "data": {}
        }))
        .unwrap();
        assert_eq!(
            envelope.into_result::<Vec<u32>>(),
            Err(EnvelopeError::Logical("Token invalid for tenant".to_string()))
        );
    }

    #[test]
    fn test_success_with_wrong_data_shape_is_decode_error() {
        let envelope: Envelope =
            serde_json::from_value(json!({"status": true, "data": {"id": 1}})).unwrap();
        assert!(matches!(
            envelope.into_result::<Vec<u32>>(),
            Err(EnvelopeError::Decode(_))
        ));
    }
}
