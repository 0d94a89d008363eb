use http::StatusCode;
use serde::{Serialize, Serializer};
use serde_json::Value;

/// Antwort einer Invocation im Lambda-Proxy Format
/// (`statusCode` plus JSON-Body als String)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvocationResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    #[serde(serialize_with = "body_as_string")]
    pub body: Value,
}

impl InvocationResponse {
    pub fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status_code: status.as_u16(),
            body,
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::new(StatusCode::OK, body)
    }

    pub fn bad_request(body: Value) -> Self {
        Self::new(StatusCode::BAD_REQUEST, body)
    }

    pub fn server_error(body: Value) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, body)
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Shortcut für `body["status"]`
    pub fn body_status(&self) -> Option<&str> {
        self.body.get("status").and_then(Value::as_str)
    }
}

fn body_as_string<S: Serializer>(body: &Value, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&body.to_string())
}
