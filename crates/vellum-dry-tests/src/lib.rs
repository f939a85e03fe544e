// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared test doubles and fixtures for Vellum crates.
//!
//! # Modules
//!
//! - [`config`] - In-memory config store fake for testing without filesystem
//! - [`gate`] - Authorization gate that records which visibilities it saw
//! - [`rows`] - Fluent builder for the cells of one element row
//! - [`scenarios`] - Canonical rows used across the test suites

#![forbid(unsafe_code)]

pub mod config;
pub mod gate;
pub mod rows;
pub mod scenarios;

pub use config::InMemoryConfigStore;
pub use gate::CountingGate;
pub use rows::RowBuilder;
