//! Unified error handling
//!
//! Provides structured error types with context and recovery suggestions,
//! so callers can tell skip-and-continue failures (a single bad page during
//! a scrape) from failures that end the operation in progress.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type BotResult<T> = Result<T, BotError>;

/// Additional information attached to an error for debugging and recovery
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Timestamp when the error occurred
    pub timestamp: DateTime<Utc>,
    /// Component where the error originated
    pub component: String,
    /// Operation being performed when the error occurred
    pub operation: Option<String>,
    /// Recovery suggestions
    pub recovery_suggestions: Vec<String>,
}

impl ErrorContext {
    pub fn new(component: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.to_string(),
            operation: None,
            recovery_suggestions: Vec::new(),
        }
    }

    pub fn with_operation(mut self, operation: &str) -> Self {
        self.operation = Some(operation.to_string());
        self
    }

    pub fn with_suggestion(mut self, suggestion: &str) -> Self {
        self.recovery_suggestions.push(suggestion.to_string());
        self
    }
}

/// Main error type shared across the workspace
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Parse error: {message}")]
    Parse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Chunking error: {message}")]
    Chunking {
        message: String,
        context: ErrorContext,
    },

    #[error("Embedding error: {message}")]
    Embedding {
        message: String,
        provider: Option<String>,
        context: ErrorContext,
    },

    #[error("LLM error: {message}")]
    Llm {
        message: String,
        provider: Option<String>,
        context: ErrorContext,
    },

    #[error("Storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
        context: ErrorContext,
    },

    #[error("Configuration error: {message}")]
    Config {
        message: String,
        context: ErrorContext,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl BotError {
    /// Get the error context, if the variant carries one
    pub fn context(&self) -> Option<&ErrorContext> {
        match self {
            BotError::Network { context, .. } => Some(context),
            BotError::Parse { context, .. } => Some(context),
            BotError::Chunking { context, .. } => Some(context),
            BotError::Embedding { context, .. } => Some(context),
            BotError::Llm { context, .. } => Some(context),
            BotError::Storage { context, .. } => Some(context),
            BotError::Config { context, .. } => Some(context),
            _ => None,
        }
    }

    /// Whether a caller iterating over many items may skip past this error
    /// and continue (as opposed to aborting the whole operation).
    pub fn is_recoverable(&self) -> bool {
        matches!(self, BotError::Network { .. } | BotError::Parse { .. })
    }

    /// Shorthand constructors keep call sites readable.
    pub fn network(message: impl Into<String>, component: &str) -> Self {
        BotError::Network {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component),
        }
    }

    pub fn network_with_source(
        message: impl Into<String>,
        component: &str,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        BotError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
            context: ErrorContext::new(component),
        }
    }

    pub fn parse(message: impl Into<String>, component: &str) -> Self {
        BotError::Parse {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component),
        }
    }

    pub fn embedding(message: impl Into<String>, provider: Option<String>) -> Self {
        BotError::Embedding {
            message: message.into(),
            provider,
            context: ErrorContext::new("embeddings"),
        }
    }

    pub fn llm(message: impl Into<String>, provider: Option<String>) -> Self {
        BotError::Llm {
            message: message.into(),
            provider,
            context: ErrorContext::new("llm"),
        }
    }

    pub fn storage(message: impl Into<String>, component: &str) -> Self {
        BotError::Storage {
            message: message.into(),
            source: None,
            context: ErrorContext::new(component),
        }
    }

    pub fn config(message: impl Into<String>, component: &str) -> Self {
        BotError::Config {
            message: message.into(),
            context: ErrorContext::new(component)
                .with_suggestion("Check your configuration file")
                .with_suggestion("Required API keys can also be set via environment variables"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recoverable_classification() {
        assert!(BotError::network("timeout", "scraper").is_recoverable());
        assert!(BotError::parse("bad markup", "parser").is_recoverable());
        assert!(!BotError::llm("quota exceeded", None).is_recoverable());
        assert!(!BotError::config("missing key", "core").is_recoverable());
    }

    #[test]
    fn context_builder() {
        let err = BotError::Storage {
            message: "cannot open collection".to_string(),
            source: None,
            context: ErrorContext::new("store")
                .with_operation("open")
                .with_suggestion("Verify the data directory is writable"),
        };
        let ctx = err.context().unwrap();
        assert_eq!(ctx.component, "store");
        assert_eq!(ctx.operation.as_deref(), Some("open"));
        assert_eq!(ctx.recovery_suggestions.len(), 1);
    }
}
