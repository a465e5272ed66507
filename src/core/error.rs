//! Error handling for envgen
//!
//! The error system follows two principles:
//! 1. **Strongly-typed errors** for precise handling in code
//! 2. **User-friendly messages** with actionable suggestions for CLI users
//!
//! # Architecture
//!
//! - [`EnvgenError`] - typed failures of the repository client and template
//!   resolver
//! - [`InvalidTemplateReason`] - which template invariant was violated
//! - [`ErrorContext`] - a rendered message plus optional details and suggestion
//!
//! Lower layers return `Result<T, EnvgenError>`. The generation pipeline and
//! the CLI work with [`anyhow::Result`] and attach context as they go; at the
//! top, [`user_friendly_error`] inspects the chain and produces an
//! [`ErrorContext`] for display.
//!
//! # Examples
//!
//! ```rust,no_run
//! use envgen_cli::core::{EnvgenError, user_friendly_error};
//! use anyhow::Context;
//!
//! fn fetch() -> anyhow::Result<()> {
//!     Err(EnvgenError::EmptyOwner).context("Failed to create repository client")
//! }
//!
//! if let Err(e) = fetch() {
//!     user_friendly_error(e).display();
//! }
//! ```

use crate::generate::RenderError;
use crate::http::{CancelCause, TransportError};
use crate::schema::SchemaError;
use crate::template::TemplateSource;
use colored::Colorize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// The main error type for repository and template operations.
///
/// Every variant carries the operation and the path or URL involved, so the
/// message alone identifies what failed.
#[derive(Error, Debug)]
pub enum EnvgenError {
    /// Repository client constructed with an empty owner.
    #[error("repository owner cannot be empty")]
    EmptyOwner,

    /// Repository client constructed with an empty repository name.
    #[error("repository name cannot be empty")]
    EmptyRepo,

    /// The base HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    /// A request URL could not be parsed.
    #[error("invalid URL {url}: {reason}")]
    InvalidUrl {
        /// The offending URL
        url: String,
        /// Why parsing failed
        reason: String,
    },

    /// The request never produced a response.
    #[error("failed to {operation}: {source}")]
    Transport {
        /// What the client was doing
        operation: String,
        /// The transport failure
        #[source]
        source: TransportError,
    },

    /// The server answered with something other than 200.
    #[error("unexpected status code: {status} (url: {url})")]
    UnexpectedStatus {
        /// HTTP status code
        status: u16,
        /// Requested URL
        url: String,
    },

    /// The client-level timeout elapsed before the round trip finished.
    #[error("request to {url} timed out after {}s", .timeout.as_secs())]
    Timeout {
        /// Requested URL
        url: String,
        /// The timeout that elapsed
        timeout: Duration,
    },

    /// A 200 response body was not the expected JSON.
    #[error("failed to decode response from {url}: {source}")]
    Decode {
        /// Requested URL
        url: String,
        /// The JSON error
        #[source]
        source: serde_json::Error,
    },

    /// A template failed validation.
    #[error("invalid template: {path}: {reason}")]
    InvalidTemplate {
        /// Reference or name of the template
        path: String,
        /// The violated invariant
        reason: InvalidTemplateReason,
    },

    /// A template could not be loaded from its source.
    #[error("{}: {}", .origin.load_failure(), .path)]
    TemplateNotFound {
        /// The reference as given by the user
        path: String,
        /// Where the resolver looked
        origin: TemplateSource,
        /// Why loading failed
        #[source]
        source: Box<EnvgenError>,
    },

    /// The request context was cancelled or its deadline passed.
    #[error("{0}")]
    Cancelled(CancelCause),

    /// A local file operation failed.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        /// What was being done
        operation: String,
        /// The file involved
        path: String,
        /// The I/O error
        #[source]
        source: std::io::Error,
    },
}

/// The template invariant that validation found broken.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidTemplateReason {
    /// The reference passed to the resolver was empty.
    #[error("template path is empty")]
    EmptyReference,
    /// The resolved template has no name.
    #[error("template name is empty")]
    EmptyName,
    /// The resolved template has no content.
    #[error("template content is empty")]
    EmptyContent,
    /// The resolved template has no resolved path.
    #[error("resolved path is empty")]
    EmptyResolvedPath,
}

impl EnvgenError {
    /// Whether the failure was caused by cancellation or a context deadline.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        match self {
            Self::Cancelled(_) => true,
            Self::Transport {
                source,
                ..
            } => source.is_cancelled(),
            Self::TemplateNotFound {
                source,
                ..
            } => source.is_cancelled(),
            _ => false,
        }
    }

    /// Whether the failure means the requested template or resource does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::TemplateNotFound {
                ..
            } => true,
            Self::UnexpectedStatus {
                status,
                ..
            } => *status == 404,
            Self::Io {
                source,
                ..
            } => source.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }

    /// Whether the failure happened talking to the network.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        match self {
            Self::Transport {
                source,
                ..
            } => !source.is_cancelled(),
            Self::UnexpectedStatus {
                ..
            }
            | Self::Timeout {
                ..
            } => true,
            _ => false,
        }
    }
}

/// A user-facing error message with optional details and suggestion.
#[derive(Debug, Clone)]
pub struct ErrorContext {
    /// The error message, including its cause chain
    pub message: String,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a context with only a message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    ///
    /// Suggestions are actionable steps and are shown in green.
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add details explaining the error, shown in yellow.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Print the error, details and suggestion to stderr with colors.
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.message);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] ready for display.
///
/// The message always includes the full cause chain. Details and a suggestion
/// are chosen from the most specific known error found in the chain.
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    let context = ErrorContext::new(format_chain(&error));

    if let Some(envgen_error) = error.chain().find_map(|e| e.downcast_ref::<EnvgenError>()) {
        return describe(envgen_error, context);
    }

    if error.chain().any(|e| e.is::<SchemaError>()) {
        return context
            .with_suggestion("Fix the schema file: every group needs a name and at least one field, and every field needs a name and a type")
            .with_details("The schema is read as YAML with top-level 'options', 'types' and 'groups' keys");
    }

    if error.chain().any(|e| e.is::<RenderError>()) {
        return context
            .with_suggestion(
                "Check template syntax: variables use {{ var }}, comments use {# #}, control flow uses {% %}. \
                 The context provides 'config', 'imports', 'config_path', 'output_path' and 'template_path'",
            )
            .with_details(
                "Template errors occur when the template cannot be parsed or rendered. Common issues:\n\
                 - Undefined variables\n\
                 - Unclosed {{ or {% delimiters\n\
                 - Unknown filters (available: camel, pascal, snake, kebab and the built-in ones)",
            );
    }

    if let Some(io_error) = error.chain().find_map(|e| e.downcast_ref::<std::io::Error>()) {
        return match io_error.kind() {
            std::io::ErrorKind::PermissionDenied => context
                .with_suggestion("Check file ownership and permissions of the output directory"),
            std::io::ErrorKind::NotFound => context
                .with_suggestion("Check that the file or directory exists and the path is correct"),
            _ => context,
        };
    }

    context
}

fn format_chain(error: &anyhow::Error) -> String {
    let mut message = error.to_string();

    let chain: Vec<String> = error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    message
}

fn describe(error: &EnvgenError, context: ErrorContext) -> ErrorContext {
    match error {
        EnvgenError::EmptyOwner | EnvgenError::EmptyRepo => context
            .with_suggestion("Set both 'owner' and 'name' in the [repository] section of the envgen settings file")
            .with_details("Standard templates are fetched from a repository identified by owner and name"),

        EnvgenError::HttpClient(_) => context
            .with_details("The HTTP client could not be initialised, usually because of a TLS backend problem"),

        EnvgenError::InvalidUrl { .. } => context
            .with_suggestion("Check 'api_base' and 'raw_base' in the [repository] section of the settings file"),

        EnvgenError::Transport { .. } | EnvgenError::Timeout { .. } => context
            .with_suggestion("Check your internet connection, or pass a local template path to work offline")
            .with_details("Requests are retried with exponential backoff before giving up"),

        EnvgenError::UnexpectedStatus { status, .. } => match status {
            403 | 429 => context
                .with_suggestion("The repository API rate limit may be exhausted. Wait a few minutes and try again")
                .with_details("Unauthenticated API requests are rate limited per IP address"),
            404 => context
                .with_suggestion("Run 'envgen ls' to see the available standard templates"),
            _ => context
                .with_suggestion("The repository host may be having problems. Try again later"),
        },

        EnvgenError::Decode { .. } => context
            .with_details("The repository API returned a response in an unexpected format"),

        EnvgenError::InvalidTemplate { reason, .. } => match reason {
            InvalidTemplateReason::EmptyReference => context
                .with_suggestion("Pass a template name, file path or URL with --template"),
            _ => context
                .with_suggestion("Check that the template exists and is not empty"),
        },

        EnvgenError::TemplateNotFound { origin, source, .. } => {
            if source.is_cancelled() {
                return context.with_details("The operation was interrupted before the template was loaded");
            }
            match origin {
                TemplateSource::Local => context
                    .with_suggestion("Check the template path, or run 'envgen ls' to see the standard templates")
                    .with_details("References that are neither URLs nor standard template names are read from disk"),
                TemplateSource::Url => context
                    .with_suggestion("Check that the URL is reachable and returns the template text"),
                TemplateSource::Standard => context
                    .with_suggestion("Check your internet connection and try again"),
            }
        }

        EnvgenError::Cancelled(_) => context
            .with_details("The operation was interrupted before it completed"),

        EnvgenError::Io { source, .. } => match source.kind() {
            std::io::ErrorKind::PermissionDenied => context
                .with_suggestion("Check file ownership and permissions"),
            _ => context,
        },
    }
}
