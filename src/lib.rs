//! dune-export - Run Dune queries and build PostgreSQL migration scripts.
//!
//! This library exposes the core modules for use in integration tests.

pub mod cli;
pub mod config;
pub mod dune;
pub mod error;
pub mod logging;
pub mod migration;
pub mod output;
pub mod runner;
pub mod sql;
