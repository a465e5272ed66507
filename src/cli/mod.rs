//! Command-line interface for envgen.
//!
//! # Available Commands
//!
//! - `gen` (alias `generate`) - render a template against a schema file
//! - `ls` (aliases `templates`, `list`) - list the standard templates
//! - `version` - print the envgen version
//!
//! # Global Options
//!
//! - `-v, --verbose` - debug logging
//! - `-q, --quiet` - errors only
//! - `--settings <PATH>` - settings file, also read from `ENVGEN_CONFIG_PATH`
//!
//! Logs go to stderr; command output goes to stdout.
//!
//! ```bash
//! envgen gen -c env.yaml -o internal/config/config.go -t go-env
//! envgen gen -c env.yaml -o config.go -t ./templates/custom.tmpl --ignore-groups db
//! envgen ls
//! ```
//!
//! Pressing Ctrl-C cancels the request context shared by the running command,
//! which aborts in-flight requests and retry waits.

mod generate;
mod templates;
mod version;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::config::GlobalConfig;
use crate::constants::CONFIG_PATH_ENV;
use crate::http::RequestContext;

/// Main CLI structure for envgen.
#[derive(Parser, Debug)]
#[command(
    name = "envgen",
    about = "Generate configuration code from a YAML schema",
    version,
    long_about = "envgen renders a local, remote or standard template against a YAML schema \
                  describing environment variables."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Only log errors.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the settings file (default: ~/.envgen/config.toml).
    #[arg(long, global = true, env = CONFIG_PATH_ENV, value_name = "PATH")]
    settings: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate code from a schema and a template.
    #[command(alias = "generate")]
    Gen(generate::GenerateCommand),

    /// List the standard templates.
    #[command(aliases = ["templates", "list"])]
    Ls(templates::TemplatesCommand),

    /// Print the version.
    Version(version::VersionCommand),
}

impl Cli {
    /// Initialize logging and run the selected command.
    ///
    /// Ctrl-C cancels the command's [`RequestContext`].
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let ctx = RequestContext::background();
        let token = ctx.token();
        let interrupt = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, cancelling pending requests");
                token.cancel();
            }
        });

        let result = self.execute_with_context(&ctx).await;
        interrupt.abort();
        result
    }

    /// Run the selected command under `ctx`.
    pub async fn execute_with_context(self, ctx: &RequestContext) -> Result<()> {
        match self.command {
            Commands::Gen(cmd) => {
                let settings = GlobalConfig::load_with_optional(self.settings).await?;
                cmd.execute(ctx, &settings).await
            }
            Commands::Ls(cmd) => {
                let settings = GlobalConfig::load_with_optional(self.settings).await?;
                cmd.execute(ctx, &settings).await
            }
            Commands::Version(cmd) => {
                cmd.execute();
                Ok(())
            }
        }
    }

    fn log_filter(&self) -> EnvFilter {
        if self.verbose {
            EnvFilter::new("debug")
        } else if self.quiet {
            EnvFilter::new("error")
        } else {
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        }
    }

    fn init_logging(&self) {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(self.log_filter())
            .with_writer(std::io::stderr)
            .with_target(false)
            .try_init();
    }
}
