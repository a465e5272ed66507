//! The generation pipeline.
//!
//! [`generate`] turns a schema file and a template reference into an output
//! file:
//!
//! 1. load the schema, drop ignored types and groups, validate what remains
//! 2. resolve the template through the [`Resolver`]
//! 3. render it with [`TemplateRenderer`] against the template context
//! 4. create the output directory and write the result
//!
//! # Template context
//!
//! | Variable        | Content                                              |
//! |-----------------|------------------------------------------------------|
//! | `config`        | the schema: `options`, `types`, `groups`             |
//! | `imports`       | sorted imports of the custom types fields use        |
//! | `config_path`   | schema path                                          |
//! | `output_path`   | output path                                          |
//! | `template_path` | the template's path or URL                           |
//!
//! Relative paths are rewritten relative to the output file's directory so
//! generated code can reference its inputs; absolute paths and URLs are kept.

pub mod filters;
pub mod renderer;

pub use renderer::{RenderError, TemplateRenderer};

use crate::http::RequestContext;
use crate::schema::Config;
use crate::template::{Resolver, Template, TemplateSource, is_url};
use anyhow::{Context, Result};
use std::path::{Component, Path, PathBuf};
use tera::Context as TeraContext;
use thiserror::Error;
use tracing::info;

/// A required generation option is missing.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionsError {
    #[error("config path is required")]
    MissingConfigPath,
    #[error("output path is required")]
    MissingOutputPath,
    #[error("template path is required")]
    MissingTemplate,
}

/// Inputs of one generation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateOptions {
    /// Schema file.
    pub config_path: PathBuf,
    /// File to write.
    pub output_path: PathBuf,
    /// Template name, path or URL.
    pub template: String,
    /// Type definitions to drop before validation.
    pub ignore_types: Vec<String>,
    /// Groups to drop before validation.
    pub ignore_groups: Vec<String>,
}

impl GenerateOptions {
    /// Check that every required option is present.
    pub fn validate(&self) -> Result<(), OptionsError> {
        if self.config_path.as_os_str().is_empty() {
            return Err(OptionsError::MissingConfigPath);
        }
        if self.output_path.as_os_str().is_empty() {
            return Err(OptionsError::MissingOutputPath);
        }
        if self.template.is_empty() {
            return Err(OptionsError::MissingTemplate);
        }
        Ok(())
    }
}

/// Run the whole pipeline and return the path written.
pub async fn generate(
    ctx: &RequestContext,
    resolver: &Resolver,
    options: &GenerateOptions,
) -> Result<PathBuf> {
    options.validate().context("Invalid options")?;

    let mut config = Config::load(&options.config_path).context("Failed to load schema")?;
    config.filter_types(&options.ignore_types);
    config.filter_groups(&options.ignore_groups);
    config.validate().context("Invalid schema")?;

    let template = resolver
        .resolve(ctx, &options.template)
        .await
        .with_context(|| format!("Failed to resolve template '{}'", options.template))?;

    let context = template_context(&config, &template, options);
    let rendered = TemplateRenderer::new().render(template.name(), template.content(), &context)?;

    if let Some(parent) = options.output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create output directory {}", parent.display()))?;
    }

    tokio::fs::write(&options.output_path, rendered)
        .await
        .with_context(|| format!("Failed to write {}", options.output_path.display()))?;

    info!("Generated {} from {} template '{}'", options.output_path.display(), template.source(), template.name());
    Ok(options.output_path.clone())
}

/// Build the Tera context a template is rendered with.
pub fn template_context(config: &Config, template: &Template, options: &GenerateOptions) -> TeraContext {
    let output_path = options.output_path.to_string_lossy();
    let template_path = match template.source() {
        TemplateSource::Local => options.template.as_str(),
        TemplateSource::Url | TemplateSource::Standard => template.resolved_path(),
    };

    let mut context = TeraContext::new();
    context.insert("config", config);
    context.insert("imports", &config.imports());
    context.insert(
        "config_path",
        &relative_to_output(&options.config_path.to_string_lossy(), &options.output_path),
    );
    context.insert("output_path", &relative_to_output(&output_path, &options.output_path));
    context.insert("template_path", &relative_to_output(template_path, &options.output_path));
    context
}

/// Rewrite a relative `path` relative to the directory of `output_path`.
///
/// URLs and absolute paths are returned unchanged, as is any path that cannot
/// be made absolute.
pub fn relative_to_output(path: &str, output_path: &Path) -> String {
    if is_url(path) || Path::new(path).is_absolute() {
        return path.to_string();
    }

    let output_dir = match output_path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    relative_path(output_dir, Path::new(path))
        .map_or_else(|| path.to_string(), |relative| relative.to_string_lossy().into_owned())
}

fn relative_path(from_dir: &Path, to: &Path) -> Option<PathBuf> {
    let from_abs = std::path::absolute(from_dir).ok()?;
    let to_abs = std::path::absolute(to).ok()?;
    let from: Vec<Component<'_>> = from_abs.components().filter(|c| *c != Component::CurDir).collect();
    let to: Vec<Component<'_>> = to_abs.components().filter(|c| *c != Component::CurDir).collect();

    let common = from.iter().zip(&to).take_while(|(a, b)| a == b).count();

    let mut relative = PathBuf::new();
    for _ in common..from.len() {
        relative.push("..");
    }
    for component in &to[common..] {
        relative.push(component.as_os_str());
    }

    if relative.as_os_str().is_empty() {
        relative.push(".");
    }
    Some(relative)
}
