//! End-to-end tests for the fetch → plan → commit pipeline.

mod common;
mod config_tests;
mod upgrade_tests;
