//! Generate code from a schema and a template.

use anyhow::Result;
use clap::Args;
use std::path::PathBuf;

use crate::config::GlobalConfig;
use crate::generate::{GenerateOptions, generate};
use crate::http::RequestContext;

/// Command to render a template against a schema file.
///
/// ```bash
/// envgen gen -c env.yaml -o config.go -t go-env
/// envgen gen -c env.yaml -o config.go -t https://example.com/go.tmpl --ignore-types Duration
/// ```
#[derive(Args, Debug)]
pub struct GenerateCommand {
    /// Schema file (YAML).
    #[arg(short = 'c', long = "config", value_name = "PATH")]
    config: PathBuf,

    /// Output file.
    #[arg(short = 'o', long = "out", value_name = "PATH")]
    out: PathBuf,

    /// Template name, local path or URL.
    #[arg(short = 't', long = "template", value_name = "TEMPLATE")]
    template: String,

    /// Types to skip, comma separated.
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    ignore_types: Vec<String>,

    /// Groups to skip, comma separated.
    #[arg(long, value_delimiter = ',', value_name = "NAMES")]
    ignore_groups: Vec<String>,
}

impl GenerateCommand {
    pub async fn execute(self, ctx: &RequestContext, settings: &GlobalConfig) -> Result<()> {
        let resolver = settings.resolver()?;
        let options = self.into_options();

        let written = generate(ctx, &resolver, &options).await?;
        println!("Generated {}", written.display());
        Ok(())
    }

    fn into_options(self) -> GenerateOptions {
        GenerateOptions {
            config_path: self.config,
            output_path: self.out,
            template: self.template,
            ignore_types: self.ignore_types,
            ignore_groups: self.ignore_groups,
        }
    }
}
