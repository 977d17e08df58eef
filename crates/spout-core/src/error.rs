//! Command errors and their blame classification.

use std::fmt;

use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};

/// Who is at fault for a failed invocation.
///
/// The classification decides the response status when the failure is
/// known before any byte goes out: client faults map to 400, engine
/// faults to 500.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The engine's fault.
    Internal,
    /// The caller's fault — bad arguments, unknown command.
    Client,
}

// Wire codes predate this codebase: 0 is internal, 1 is client.
impl Serialize for ErrorClass {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let code: u8 = match self {
            ErrorClass::Internal => 0,
            ErrorClass::Client => 1,
        };
        serializer.serialize_u8(code)
    }
}

impl<'de> Deserialize<'de> for ErrorClass {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match u8::deserialize(deserializer)? {
            0 => Ok(ErrorClass::Internal),
            1 => Ok(ErrorClass::Client),
            other => Err(de::Error::custom(format!("unknown error code {other}"))),
        }
    }
}

/// Terminal error carried inside an [`Outcome`](crate::Outcome).
///
/// This is the command's own failure report, not a transport error. It
/// rides the outcome so the pipeline can marshal it as the response
/// body with the matching status code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandError {
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "Code")]
    pub class: ErrorClass,
}

impl CommandError {
    pub fn client(message: impl Into<String>) -> Self {
        Self { message: message.into(), class: ErrorClass::Client }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self { message: message.into(), class: ErrorClass::Internal }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for CommandError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape_uses_message_and_code() {
        let err = CommandError::client("no such file");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"Message":"no such file","Code":1}"#);

        let err = CommandError::internal("store offline");
        let json = serde_json::to_string(&err).unwrap();
        assert_eq!(json, r#"{"Message":"store offline","Code":0}"#);
    }

    #[test]
    fn deserializes_known_codes_only() {
        let err: CommandError =
            serde_json::from_str(r#"{"Message":"bad arg","Code":1}"#).unwrap();
        assert_eq!(err.class, ErrorClass::Client);

        let bad = serde_json::from_str::<CommandError>(r#"{"Message":"x","Code":7}"#);
        assert!(bad.is_err());
    }

    #[test]
    fn displays_as_bare_message() {
        assert_eq!(CommandError::internal("boom").to_string(), "boom");
    }
}
