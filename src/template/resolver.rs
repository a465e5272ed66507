//! Classifies template references and loads them from the right source.
//!
//! Classification takes the first match of:
//!
//! 1. an `http://` or `https://` prefix → [`TemplateSource::Url`]
//! 2. an exact name match in the repository's `templates` listing →
//!    [`TemplateSource::Standard`]
//! 3. anything else → [`TemplateSource::Local`]
//!
//! The listing in step 2 is best effort: if it cannot be fetched, the reference
//! is treated as a local path. The listing is fetched fresh for every
//! resolution.
//!
//! The resolver never retries on its own; remote retries happen in the
//! repository client's transport, and local failures are final.

use super::{Template, TemplateSource, is_url};
use crate::constants::{STANDARD_REPO_NAME, STANDARD_REPO_OWNER, TEMPLATES_DIR};
use crate::core::{EnvgenError, InvalidTemplateReason};
use crate::http::RequestContext;
use crate::repository::{RepositoryClient, RepositoryContent};
use reqwest::Url;
use std::path::Path;
use tracing::{debug, info};

/// Turns template references into validated [`Template`]s.
#[derive(Debug, Clone)]
pub struct Resolver {
    client: RepositoryClient,
}

impl Resolver {
    /// Resolver backed by the standard template repository.
    pub fn new() -> Result<Self, EnvgenError> {
        Self::with_repository(STANDARD_REPO_OWNER, STANDARD_REPO_NAME)
    }

    /// Resolver backed by `owner/repo` with default client settings.
    pub fn with_repository(owner: &str, repo: &str) -> Result<Self, EnvgenError> {
        Ok(Self::from_client(RepositoryClient::new(owner, repo)?))
    }

    /// Resolver using an already configured client.
    #[must_use]
    pub const fn from_client(client: RepositoryClient) -> Self {
        Self {
            client,
        }
    }

    pub const fn client(&self) -> &RepositoryClient {
        &self.client
    }

    /// Resolve `reference` into a validated template.
    ///
    /// # Errors
    ///
    /// - [`EnvgenError::InvalidTemplate`] with
    ///   [`InvalidTemplateReason::EmptyReference`] for an empty reference
    /// - [`EnvgenError::Cancelled`] when `ctx` ends during classification
    /// - [`EnvgenError::TemplateNotFound`] when the selected source fails,
    ///   wrapping the underlying error
    /// - [`EnvgenError::InvalidTemplate`] when the loaded template is incomplete
    pub async fn resolve(&self, ctx: &RequestContext, reference: &str) -> Result<Template, EnvgenError> {
        if reference.is_empty() {
            return Err(EnvgenError::InvalidTemplate {
                path: String::new(),
                reason: InvalidTemplateReason::EmptyReference,
            });
        }

        let source = self.detect_source(ctx, reference).await;
        if let Some(cause) = ctx.err() {
            return Err(EnvgenError::Cancelled(cause));
        }
        debug!("Template '{}' classified as {}", reference, source);

        let template = match source {
            TemplateSource::Url => self.load_url(ctx, reference).await,
            TemplateSource::Standard => self.load_standard(ctx, reference).await,
            TemplateSource::Local => load_local(reference).await,
        }
        .map_err(|err| EnvgenError::TemplateNotFound {
            path: reference.to_string(),
            origin: source,
            source: Box::new(err),
        })?;

        template.validate()?;

        info!("Resolved {} template '{}' ({})", source, template.name(), template.resolved_path());
        Ok(template)
    }

    /// Decide where `reference` should be loaded from.
    pub async fn detect_source(&self, ctx: &RequestContext, reference: &str) -> TemplateSource {
        if is_url(reference) {
            return TemplateSource::Url;
        }

        match self.list_templates(ctx).await {
            Ok(entries) if entries.iter().any(|entry| entry.name == reference) => {
                TemplateSource::Standard
            }
            Ok(_) => TemplateSource::Local,
            Err(err) => {
                debug!("Standard template listing unavailable, treating '{}' as local: {}", reference, err);
                TemplateSource::Local
            }
        }
    }

    /// Every entry of the repository's `templates` directory.
    pub async fn list_templates(
        &self,
        ctx: &RequestContext,
    ) -> Result<Vec<RepositoryContent>, EnvgenError> {
        self.client.list_directory(ctx, TEMPLATES_DIR).await
    }

    /// Names of the standard templates (file entries only).
    pub async fn list_template_names(&self, ctx: &RequestContext) -> Result<Vec<String>, EnvgenError> {
        Ok(self
            .list_templates(ctx)
            .await?
            .into_iter()
            .filter(RepositoryContent::is_file)
            .map(|entry| entry.name)
            .collect())
    }

    async fn load_url(&self, ctx: &RequestContext, url: &str) -> Result<Template, EnvgenError> {
        let content = self.client.download_from_url(ctx, url).await?;
        Ok(Template::new(url_name(url), TemplateSource::Url, content, url))
    }

    async fn load_standard(&self, ctx: &RequestContext, name: &str) -> Result<Template, EnvgenError> {
        let content = self.client.download_file(ctx, &format!("{TEMPLATES_DIR}/{name}")).await?;
        let resolved = self.client.standard_template_url(ctx, name).await?;
        Ok(Template::new(name, TemplateSource::Standard, content, resolved))
    }
}

async fn load_local(reference: &str) -> Result<Template, EnvgenError> {
    let content = tokio::fs::read_to_string(reference).await.map_err(|source| EnvgenError::Io {
        operation: "read".to_string(),
        path: reference.to_string(),
        source,
    })?;

    let path = Path::new(reference);
    let name = path
        .file_name()
        .map_or_else(|| reference.to_string(), |name| name.to_string_lossy().into_owned());
    let resolved = std::path::absolute(path)
        .map_or_else(|_| reference.to_string(), |absolute| absolute.display().to_string());

    Ok(Template::new(name, TemplateSource::Local, content, resolved))
}

/// Last non-empty path segment of `url`, or its host when the path is empty.
fn url_name(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.trim_end_matches('/').rsplit('/').next().unwrap_or_default().to_string();
    };

    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|segment| !segment.is_empty()).last())
        .map(str::to_string)
        .or_else(|| parsed.host_str().map(str::to_string))
        .unwrap_or_default()
}
