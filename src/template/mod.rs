//! Resolved templates and where they came from.
//!
//! A template reference given on the command line can be:
//!
//! - a URL (`http://` or `https://`), fetched as-is
//! - the name of a standard template published in the `templates` directory
//!   of the template repository, fetched at the repository's head commit
//! - anything else, read as a local file path
//!
//! The [`Resolver`] decides which one applies and produces a [`Template`].
//! Templates are only built by the resolver and are validated once right
//! after loading, so a `Template` in hand always has a name, content and
//! resolved path.

pub mod resolver;

pub use resolver::Resolver;

use crate::core::{EnvgenError, InvalidTemplateReason};
use std::fmt;

/// Where a template was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateSource {
    /// A file on the local filesystem.
    Local,
    /// An arbitrary URL.
    Url,
    /// The standard template repository.
    Standard,
}

impl TemplateSource {
    /// Prefix of the error reported when loading from this source fails.
    #[must_use]
    pub const fn load_failure(self) -> &'static str {
        match self {
            Self::Local => "failed to read local template",
            Self::Url => "failed to fetch template from URL",
            Self::Standard => "failed to fetch standard template",
        }
    }
}

impl fmt::Display for TemplateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Url => write!(f, "url"),
            Self::Standard => write!(f, "standard"),
        }
    }
}

/// Check whether a reference or path is an HTTP(S) URL.
#[must_use]
pub fn is_url(reference: &str) -> bool {
    reference.starts_with("http://") || reference.starts_with("https://")
}

/// A loaded, validated template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    name: String,
    source: TemplateSource,
    content: String,
    resolved_path: String,
}

impl Template {
    pub(crate) fn new(
        name: impl Into<String>,
        source: TemplateSource,
        content: impl Into<String>,
        resolved_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            source,
            content: content.into(),
            resolved_path: resolved_path.into(),
        }
    }

    /// Display name, the last component of the reference.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub const fn source(&self) -> TemplateSource {
        self.source
    }

    /// Raw template text.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Absolute local path, the original URL, or the commit-pinned raw URL.
    pub fn resolved_path(&self) -> &str {
        &self.resolved_path
    }

    /// Whether the resolved path is a URL rather than a local file.
    pub fn is_url(&self) -> bool {
        is_url(&self.resolved_path)
    }

    /// Check that name, content and resolved path are all non-empty.
    ///
    /// The first violation is reported, in that order.
    pub fn validate(&self) -> Result<(), EnvgenError> {
        let invalid = |path: &str, reason: InvalidTemplateReason| -> Result<(), EnvgenError> {
            Err(EnvgenError::InvalidTemplate {
                path: path.to_string(),
                reason,
            })
        };

        if self.name.is_empty() {
            return invalid(&self.resolved_path, InvalidTemplateReason::EmptyName);
        }
        if self.content.is_empty() {
            return invalid(&self.resolved_path, InvalidTemplateReason::EmptyContent);
        }
        if self.resolved_path.is_empty() {
            return invalid(&self.name, InvalidTemplateReason::EmptyResolvedPath);
        }

        Ok(())
    }
}
