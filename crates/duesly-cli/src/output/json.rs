use std::io;

use duesly_client::contracts::envelope::failure_from_error;
use duesly_client::{ClientError, SuccessEnvelope};
use serde::Serialize;

pub fn render_success_json(success: &SuccessEnvelope) -> io::Result<String> {
    serialize_json_pretty(success)
}

pub fn render_error_json(error: &ClientError) -> io::Result<String> {
    serialize_json_pretty(&failure_from_error(error))
}

fn serialize_json_pretty<T: Serialize>(value: &T) -> io::Result<String> {
    serde_json::to_string_pretty(value).map_err(io::Error::other)
}

#[cfg(test)]
mod tests {
    use duesly_client::ClientError;
    use duesly_client::contracts::envelope::success;
    use serde_json::{Value, json};

    use super::{render_error_json, render_success_json};

    #[test]
    fn success_keeps_the_envelope() {
        let envelope = success("dash", json!({"total_members": 3}));
        assert!(envelope.is_ok());
        if let Ok(envelope) = envelope {
            let rendered = render_success_json(&envelope);
            assert!(rendered.is_ok());
            if let Ok(text) = rendered {
                let parsed: Result<Value, _> = serde_json::from_str(&text);
                assert!(parsed.is_ok());
                if let Ok(value) = parsed {
                    assert_eq!(value["ok"], true);
                    assert_eq!(value["command"], "dash");
                    assert_eq!(value["data"]["total_members"], 3);
                }
            }
        }
    }

    #[test]
    fn failure_carries_code_steps_and_data() {
        let rendered = render_error_json(&ClientError::contribution_not_found("ctb_9"));
        assert!(rendered.is_ok());
        if let Ok(text) = rendered {
            let parsed: Result<Value, _> = serde_json::from_str(&text);
            assert!(parsed.is_ok());
            if let Ok(value) = parsed {
                assert_eq!(value["ok"], false);
                assert_eq!(value["error"]["code"], "contribution_not_found");
                assert!(value["error"]["recovery_steps"].as_array().is_some_and(|s| !s.is_empty()));
                assert_eq!(value["data"]["contribution_id"], "ctb_9");
            }
        }
    }
}
