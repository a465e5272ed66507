//! Configuration management for envgen
//!
//! envgen reads one optional, user-wide TOML settings file. It controls which
//! repository standard templates come from and how requests to it are retried.
//! See [`global`] for the file location and format.
//!
//! Defaults live in [`crate::constants`]; a missing file or missing keys fall
//! back to them, so envgen works without any settings file.

pub mod global;

pub use global::{GlobalConfig, RepositoryConfig, RetryConfig};
