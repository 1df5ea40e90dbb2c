//! `TEST`: echo the parameters back, for end-to-end checks of a deployment.

use std::sync::Arc;

use async_trait::async_trait;
use courier_queue::{CommandHandler, HandlerError};

/// Returns the parameters serialized as compact JSON. A `fail` string
/// parameter makes the handler fail with that message instead, which lets
/// an operator exercise the failure path too.
pub struct EchoHandler;

#[async_trait]
impl CommandHandler for EchoHandler {
    async fn execute(
        &self,
        _target_id: &str,
        parameters: Option<&serde_json::Value>,
    ) -> Result<String, HandlerError> {
        let Some(parameters) = parameters else {
            return Ok("null".to_string());
        };
        if let Some(message) = parameters.get("fail").and_then(|v| v.as_str()) {
            return Err(HandlerError::new(message));
        }
        Ok(serde_json::to_string(parameters)?)
    }
}

pub fn handler() -> Arc<dyn CommandHandler> {
    Arc::new(EchoHandler)
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn echoes_parameters() {
        let result = EchoHandler
            .execute("test-target", Some(&json!({"message": "hi"})))
            .await
            .unwrap();
        assert_eq!(result, r#"{"message":"hi"}"#);
    }

    #[tokio::test]
    async fn missing_parameters_echo_null() {
        assert_eq!(EchoHandler.execute("t", None).await.unwrap(), "null");
    }

    #[tokio::test]
    async fn fail_parameter_fails_the_command() {
        let err = EchoHandler
            .execute("t", Some(&json!({"fail": "boom"})))
            .await
            .unwrap_err();
        assert_matches!(err.message(), "boom");
    }
}
