//! Template rendering engine with Tera.
//!
//! [`TemplateRenderer`] renders resolved template text against a Tera context
//! with the case filters from [`super::filters`] registered. A fresh `Tera`
//! instance is created per render, so no state leaks between renders.

use super::filters;
use tera::{Context as TeraContext, Tera};
use thiserror::Error;

/// A template failed to parse or render.
#[derive(Error, Debug)]
#[error("failed to render template {template}: {message}")]
pub struct RenderError {
    /// Name of the template being rendered
    pub template: String,
    /// Cleaned-up Tera cause chain
    pub message: String,
}

/// Renders template text with envgen's filters.
#[derive(Debug, Default, Clone, Copy)]
pub struct TemplateRenderer;

impl TemplateRenderer {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Render `content` as the template named `name`.
    pub fn render(
        &self,
        name: &str,
        content: &str,
        context: &TeraContext,
    ) -> Result<String, RenderError> {
        tracing::debug!("Rendering template '{}' ({} bytes)", name, content.len());

        let mut tera = Tera::default();
        filters::register(&mut tera);

        tera.render_str(content, context).map_err(|e| RenderError {
            template: name.to_string(),
            message: Self::format_tera_error(&e),
        })
    }

    /// Flatten a Tera error chain into one readable message.
    ///
    /// Drops the internal one-off template name Tera uses for `render_str`.
    pub fn format_tera_error(error: &tera::Error) -> String {
        use std::error::Error;

        let mut messages = Vec::new();
        let mut current: Option<&dyn Error> = Some(error);
        while let Some(err) = current {
            let cleaned = err
                .to_string()
                .replace("while rendering '__tera_one_off'", "")
                .replace("Failed to render '__tera_one_off'", "")
                .replace("Failed to parse '__tera_one_off'", "")
                .replace("'__tera_one_off'", "template")
                .trim()
                .to_string();

            if !cleaned.is_empty() {
                messages.push(cleaned);
            }
            current = err.source();
        }

        if messages.is_empty() {
            "template syntax error".to_string()
        } else {
            messages.join("\n  → ")
        }
    }
}
