//! erd CLI - Command-line interface for the erd migration tracker.
//!
//! This crate provides the `erd` binary: migration status, ordered up/down
//! runs, and scaffolding of new migration files.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
