//! Core types for envgen
//!
//! This module holds the error system shared by every layer:
//! - [`EnvgenError`] - strongly-typed failures of the repository client and
//!   template resolver
//! - [`InvalidTemplateReason`] - the template invariant a validation failure broke
//! - [`ErrorContext`] and [`user_friendly_error`] - turn any error into a
//!   colored, actionable message for the CLI
//!
//! # Error Handling Pattern
//!
//! ```rust,no_run
//! use envgen_cli::core::user_friendly_error;
//!
//! fn run() -> anyhow::Result<()> {
//!     anyhow::bail!("nothing to do")
//! }
//!
//! if let Err(e) = run() {
//!     user_friendly_error(e).display();
//!     std::process::exit(1);
//! }
//! ```

pub mod error;

pub use error::{EnvgenError, ErrorContext, InvalidTemplateReason, user_friendly_error};
