use serde::{Deserialize, Serialize};
use serde_json::Value;

/// `code` value the server uses for a successful call
pub const SUCCESS_CODE: i64 = 1;

/// Body every endpoint wraps its payload in.
///
/// Rejections issued before a handler runs (e.g. a missing credential) may
/// come back with an empty body, so every field is optional on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    #[serde(default)]
    pub code: i64,
    #[serde(default)]
    pub msg: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ResponseEnvelope {
    pub fn success(data: Value) -> Self {
        Self {
            code: SUCCESS_CODE,
            msg: Some("success".to_string()),
            data: Some(data),
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            code: 0,
            msg: Some(msg.into()),
            data: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }

    /// Server-provided message, ignoring blanks
    pub fn message(&self) -> Option<&str> {
        self.msg.as_deref().map(str::trim).filter(|m| !m.is_empty())
    }
}
