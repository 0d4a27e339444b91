use serde::Serialize;
use serde_json::Value;

use crate::API_VERSION;
use crate::error::{ClientError, ClientResult};

/// Every command answers with this shape; `data` is the command's payload.
#[derive(Debug, Clone, Serialize)]
pub struct SuccessEnvelope {
    pub ok: bool,
    pub command: String,
    pub version: String,
    pub data: Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct FailureEnvelope {
    pub ok: bool,
    pub error: ErrorBody,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    pub recovery_steps: Vec<String>,
}

pub fn success<T>(command: &str, data: T) -> ClientResult<SuccessEnvelope>
where
    T: Serialize,
{
    let data = serde_json::to_value(data)
        .map_err(|error| ClientError::internal_serialization(&error.to_string()))?;
    Ok(SuccessEnvelope {
        ok: true,
        command: command.to_string(),
        version: API_VERSION.to_string(),
        data,
    })
}

impl From<&ClientError> for FailureEnvelope {
    fn from(error: &ClientError) -> Self {
        Self {
            ok: false,
            error: ErrorBody {
                code: error.code.clone(),
                message: error.message.clone(),
                recovery_steps: error.recovery_steps.clone(),
            },
            data: error.data.clone(),
        }
    }
}

pub fn failure_from_error(error: &ClientError) -> FailureEnvelope {
    FailureEnvelope::from(error)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::{failure_from_error, success};
    use crate::ClientError;

    #[test]
    fn success_carries_command_and_crate_version() {
        let envelope = success("dash", json!({"total_members": 0}));
        assert!(envelope.is_ok());
        if let Ok(envelope) = envelope {
            assert!(envelope.ok);
            assert_eq!(envelope.command, "dash");
            assert_eq!(envelope.version, crate::API_VERSION);
            assert_eq!(envelope.data["total_members"], 0);
        }
    }

    #[test]
    fn failure_omits_data_when_the_error_has_none() {
        let envelope = failure_from_error(&ClientError::invalid_credentials());
        let value = serde_json::to_value(&envelope);
        assert!(value.is_ok());
        if let Ok(value) = value {
            assert_eq!(value["ok"], false);
            assert_eq!(value["error"]["code"], "invalid_credentials");
            assert!(value.get("data").is_none());
        }
    }
}
