//! Worker side: map command kinds to handlers.
//!
//! Populated once at worker start, then shared read-only with the
//! dispatcher behind an `Arc`.

use std::collections::HashMap;
use std::sync::Arc;

use courier_core::commands::CommandKind;

use crate::error::QueueError;
use crate::handler::CommandHandler;

/// Mapping from [`CommandKind`] to the handler that executes it.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`.
    ///
    /// Registering a kind twice replaces the earlier handler (last write
    /// wins). The replaced handler is returned so callers can detect it.
    pub fn register(
        &mut self,
        kind: CommandKind,
        handler: Arc<dyn CommandHandler>,
    ) -> Option<Arc<dyn CommandHandler>> {
        let previous = self.handlers.insert(kind.clone(), handler);
        if previous.is_some() {
            tracing::warn!(command_type = %kind, "Handler re-registered, replacing previous");
        } else {
            tracing::debug!(command_type = %kind, "Handler registered");
        }
        previous
    }

    /// Builder-style [`register`](Self::register).
    pub fn with(mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) -> Self {
        self.register(kind, handler);
        self
    }

    /// Look up the handler for `kind`.
    pub fn resolve(&self, kind: &CommandKind) -> Result<Arc<dyn CommandHandler>, QueueError> {
        self.handlers
            .get(kind)
            .cloned()
            .ok_or_else(|| QueueError::UnknownCommandType(kind.to_string()))
    }

    pub fn contains(&self, kind: &CommandKind) -> bool {
        self.handlers.contains_key(kind)
    }

    /// Registered kinds, sorted by tag.
    pub fn kinds(&self) -> Vec<CommandKind> {
        let mut kinds: Vec<CommandKind> = self.handlers.keys().cloned().collect();
        kinds.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        kinds
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Well-known kinds that have no handler yet.
    pub fn missing_builtin_kinds(&self) -> Vec<CommandKind> {
        CommandKind::BUILTIN
            .into_iter()
            .filter(|kind| !self.contains(kind))
            .collect()
    }

    /// Fail unless every kind in `required` has a handler.
    pub fn validate(&self, required: &[CommandKind]) -> Result<(), QueueError> {
        let missing: Vec<String> = required
            .iter()
            .filter(|kind| !self.contains(kind))
            .map(ToString::to_string)
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(QueueError::MissingHandlers(missing))
        }
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("kinds", &self.kinds())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::handler::handler_fn;

    fn constant(value: &'static str) -> Arc<dyn CommandHandler> {
        handler_fn(move |_, _| async move { Ok(value.to_string()) })
    }

    #[tokio::test]
    async fn resolves_registered_handler() {
        let registry = HandlerRegistry::new().with(CommandKind::Test, constant("echo"));
        let handler = registry.resolve(&CommandKind::Test).unwrap();
        assert_eq!(handler.execute("x", None).await.unwrap(), "echo");
    }

    #[test]
    fn unknown_kind_is_an_error() {
        let registry = HandlerRegistry::new();
        let err = registry
            .resolve(&CommandKind::Custom("SLOW".into()))
            .err()
            .unwrap();
        assert_matches!(err, QueueError::UnknownCommandType(tag) if tag == "SLOW");
    }

    #[tokio::test]
    async fn re_registration_replaces_previous_handler() {
        let mut registry = HandlerRegistry::new();
        assert!(registry
            .register(CommandKind::KickUser, constant("first"))
            .is_none());

        let replaced = registry.register(CommandKind::KickUser, constant("second"));
        assert!(replaced.is_some(), "second registration must report the replacement");
        assert_eq!(replaced.unwrap().execute("t", None).await.unwrap(), "first");

        let current = registry.resolve(&CommandKind::KickUser).unwrap();
        assert_eq!(current.execute("t", None).await.unwrap(), "second");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn validate_lists_missing_kinds() {
        let registry = HandlerRegistry::new().with(CommandKind::Diagnostic, constant("ok"));

        assert!(registry.validate(&[CommandKind::Diagnostic]).is_ok());

        let err = registry
            .validate(&[CommandKind::Diagnostic, CommandKind::BanUser])
            .unwrap_err();
        assert_matches!(err, QueueError::MissingHandlers(missing) if missing == vec!["BAN_USER".to_string()]);
    }

    #[test]
    fn missing_builtin_kinds_excludes_registered() {
        let registry = HandlerRegistry::new()
            .with(CommandKind::Diagnostic, constant("ok"))
            .with(CommandKind::Custom("SLOW".into()), constant("ok"));

        let missing = registry.missing_builtin_kinds();
        assert_eq!(missing.len(), CommandKind::BUILTIN.len() - 1);
        assert!(!missing.contains(&CommandKind::Diagnostic));
        assert!(missing.contains(&CommandKind::KickUser));
    }

    #[test]
    fn kinds_are_sorted_by_tag() {
        let registry = HandlerRegistry::new()
            .with(CommandKind::Test, constant("a"))
            .with(CommandKind::BanUser, constant("b"));
        assert_eq!(
            registry.kinds(),
            vec![CommandKind::BanUser, CommandKind::Test]
        );
    }
}
