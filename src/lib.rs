//! envgen - configuration code generation from YAML schemas
//!
//! envgen reads a YAML schema describing environment variables (groups of
//! typed fields plus custom types) and renders it through a template into
//! source code. Templates come from one of three places:
//!
//! - a local file
//! - an `http://` / `https://` URL
//! - the standard template repository, addressed by bare name
//!
//! # Architecture Overview
//!
//! Remote access is layered so that every request made on behalf of the
//! template resolver goes through the same resilient transport:
//!
//! ```text
//! cli ─► generate ─► template::Resolver ─► repository::RepositoryClient
//!                                             │
//!                                             ▼
//!                             http::RetryTransport<ReqwestTransport>
//! ```
//!
//! - [`http`] - the [`Transport`](http::Transport) abstraction, the reqwest
//!   transport, the retry decorator and the cancellable
//!   [`RequestContext`](http::RequestContext)
//! - [`repository`] - hosted-repository API client (latest commit, directory
//!   listings, raw downloads)
//! - [`template`] - template reference classification and loading
//! - [`schema`] - schema model, filtering and validation
//! - [`generate`] - the generation pipeline and template rendering
//! - [`config`] - the optional user settings file
//! - [`core`] - error types and user-facing error formatting
//! - [`cli`] - command-line interface
//!
//! # Schema Example
//!
//! ```yaml
//! options:
//!   go_package: config
//! types:
//!   - name: LogLevel
//!     type: zerolog.Level
//!     import: github.com/rs/zerolog
//! groups:
//!   - name: app
//!     prefix: APP_
//!     fields:
//!       - name: http_port
//!         type: int
//!         default: "8080"
//!       - name: log_level
//!         type: LogLevel
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod generate;
pub mod http;
pub mod repository;
pub mod schema;
pub mod template;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
