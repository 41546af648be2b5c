//! Integration tests for dune-export pipelines.

pub mod migration_test;
pub mod runner_test;
