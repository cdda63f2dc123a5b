//! wpm-lib: Core types and logic for wpm
//!
//! This crate provides the addon installation pipeline:
//! - `AddonSpec`: a configured addon and the directories it owns
//! - `PackageIndex`: where archives come from
//! - `FetchedPackage`: an addon's contents for the current run
//! - `Change`: a single filesystem mutation, produced by the planner
//! - `upgrade`: the fetch → plan → commit orchestrator

pub mod addon;
pub mod archive;
pub mod change;
pub mod config;
pub mod consts;
pub mod fetch;
pub mod index;
pub mod plan;
pub mod platform;
pub mod upgrade;

#[cfg(test)]
mod testutil;
