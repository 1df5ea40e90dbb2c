//! The handler contract: an opaque, possibly slow, possibly failing
//! function of `(target_id, parameters) -> result`.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

/// Error returned by a [`CommandHandler`]. Its message is what gets stored
/// in the job's `result` column.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self { message }
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for HandlerError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(format!("invalid parameters: {err}"))
    }
}

/// Executes one kind of command against the external platform.
///
/// The queue never inspects `parameters`; validating them is the handler's
/// job. Returning `Err` marks the job `failed`; it never crashes the
/// dispatcher.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn execute(
        &self,
        target_id: &str,
        parameters: Option<&serde_json::Value>,
    ) -> Result<String, HandlerError>;
}

/// Adapter turning an async closure into a [`CommandHandler`].
struct FnHandler<F>(F);

#[async_trait]
impl<F, Fut> CommandHandler for FnHandler<F>
where
    F: Fn(String, Option<serde_json::Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, HandlerError>> + Send + 'static,
{
    async fn execute(
        &self,
        target_id: &str,
        parameters: Option<&serde_json::Value>,
    ) -> Result<String, HandlerError> {
        (self.0)(target_id.to_string(), parameters.cloned()).await
    }
}

/// Wrap an async closure as a shareable handler.
///
/// ```ignore
/// registry.register(
///     CommandKind::Test,
///     handler_fn(|_target, params| async move {
///         Ok(params.map(|p| p.to_string()).unwrap_or_default())
///     }),
/// );
/// ```
pub fn handler_fn<F, Fut>(f: F) -> Arc<dyn CommandHandler>
where
    F: Fn(String, Option<serde_json::Value>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<String, HandlerError>> + Send + 'static,
{
    Arc::new(FnHandler(f))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn closure_handler_receives_owned_arguments() {
        let handler = handler_fn(|target, params| async move {
            Ok(format!("{target}:{}", params.unwrap_or_default()))
        });
        let params = serde_json::json!({"n": 1});
        let out = handler.execute("abc", Some(&params)).await.unwrap();
        assert_eq!(out, r#"abc:{"n":1}"#);
    }

    #[tokio::test]
    async fn closure_handler_propagates_errors() {
        let handler = handler_fn(|_, _| async { Err(HandlerError::new("member not found")) });
        let err = handler.execute("12345", None).await.unwrap_err();
        assert_eq!(err.message(), "member not found");
        assert_eq!(err.to_string(), "member not found");
    }
}
