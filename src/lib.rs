//! Deployment script runner.
//!
//! Replays an ordered run file of SQL and API directives against a
//! PostgreSQL database or a JSON administrative API, with explicit
//! transaction blocks and fail-fast error handling.
//!
//! The public API is organised into these layers:
//!
//! - **[`directive`]**: run-file grammar (comments, `kind: content` lines, file references)
//! - **[`resolve`]**: expansion of file, directory, and glob references into leaves
//! - **[`engine`]**: sequential execution and the transaction state machine
//! - **[`backend`]**: database, API, and dry-run adapters
//! - **[`commands`]**: top-level orchestration used by the binary
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod directive;
pub mod engine;
pub mod error;
pub mod logging;
pub mod operations;
pub mod resolve;
