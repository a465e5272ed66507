//! List the standard templates.

use anyhow::{Context, Result};
use clap::Args;

use crate::config::GlobalConfig;
use crate::http::RequestContext;

/// Command to print the names of the templates in the standard repository.
#[derive(Args, Debug)]
pub struct TemplatesCommand {}

impl TemplatesCommand {
    pub async fn execute(self, ctx: &RequestContext, settings: &GlobalConfig) -> Result<()> {
        let resolver = settings.resolver()?;
        let names = resolver
            .list_template_names(ctx)
            .await
            .context("Failed to list standard templates")?;

        print!("{}", format_listing(&names));
        Ok(())
    }
}

fn format_listing(names: &[String]) -> String {
    if names.is_empty() {
        return "No standard templates available\n".to_string();
    }

    let mut out = String::from("Available standard templates:\n");
    for name in names {
        out.push_str("  ");
        out.push_str(name);
        out.push('\n');
    }
    out
}
