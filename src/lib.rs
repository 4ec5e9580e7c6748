// Copyright 2026 Surfacer Contributors
// SPDX-License-Identifier: Apache-2.0

//! Surfacer library — survey a web application's pages and report on
//! structure, feature coverage, and design-token drift.
//!
//! This library crate exposes the core modules for integration testing.

pub mod cli;
pub mod config;
pub mod error;
pub mod gaps;
pub mod probe;
pub mod progress;
pub mod recommend;
pub mod renderer;
pub mod report;
pub mod survey;
