// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Shared application services for Vellum tools (config, reader prefs).
//! Keeps the CLI and other adapters thin.

pub mod config;
pub mod prefs;
