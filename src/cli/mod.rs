//! CLI subcommand implementations for the Surfacer binary.

pub mod doctor;
pub mod output;
pub mod plan_cmd;
pub mod run_cmd;
